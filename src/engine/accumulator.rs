//! Line accumulation.
//!
//! Build tools write their output in arbitrarily sized chunks: a single
//! `write` can carry half a line, several lines, or end between the `\r` and
//! `\n` of a CRLF pair. `LineAccumulator` turns that byte stream back into
//! logical lines.
//!
//! ## Terminators
//!
//! - `\n` ends a line.
//! - `\r\n` ends a line (one terminator, not two).
//! - `\r` not followed by `\n` ends a line.
//!
//! A `\r` at the very end of the buffered bytes is ambiguous until the next
//! byte arrives, so it is held back. This is what makes the output independent
//! of chunk boundaries:
//!
//! ```text
//! write("a\r")  write("\nb")  close()   -> ["a", "b"]
//! write("a\r\nb")             close()   -> ["a", "b"]
//! ```
//!
//! Bytes are decoded per line (lossily), so a UTF-8 sequence split across two
//! writes is decoded once both halves are buffered. Terminator bytes never
//! occur inside a multi-byte sequence.

use memchr::memchr2;
use std::io;

#[derive(Debug, Default)]
pub(crate) struct LineAccumulator {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no terminator.
    scanned: usize,
}

impl LineAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Buffer `bytes` and hand every completed line to `on_line`.
    ///
    /// If `on_line` fails, the failing line counts as consumed, the remaining
    /// complete lines stay buffered, and the error is returned.
    pub(crate) fn push<F>(&mut self, bytes: &[u8], mut on_line: F) -> io::Result<()>
    where
        F: FnMut(&str) -> io::Result<()>,
    {
        self.buf.extend_from_slice(bytes);

        let mut start = 0;
        let mut search_from = self.scanned;
        let mut outcome = Ok(());

        loop {
            let Some(rel) = memchr2(b'\n', b'\r', &self.buf[search_from..]) else {
                search_from = self.buf.len();
                break;
            };
            let end = search_from + rel;
            let next = if self.buf[end] == b'\r' {
                match self.buf.get(end + 1) {
                    Some(b'\n') => end + 2,
                    Some(_) => end + 1,
                    None => {
                        // Lone trailing '\r': decide once more bytes arrive.
                        search_from = end;
                        break;
                    }
                }
            } else {
                end + 1
            };

            let line = String::from_utf8_lossy(&self.buf[start..end]);
            let result = on_line(&line);
            start = next;
            search_from = next;
            if let Err(err) = result {
                outcome = Err(err);
                break;
            }
        }

        self.buf.drain(..start);
        self.scanned = search_from - start;
        outcome
    }

    /// Flush every buffered line, including a final line without terminator.
    pub(crate) fn finish<F>(&mut self, mut on_line: F) -> io::Result<()>
    where
        F: FnMut(&str) -> io::Result<()>,
    {
        self.push(&[], &mut on_line)?;

        let mut rest = std::mem::take(&mut self.buf);
        self.scanned = 0;

        let had_cr = rest.last() == Some(&b'\r');
        if had_cr {
            rest.pop();
        }
        if had_cr || !rest.is_empty() {
            on_line(&String::from_utf8_lossy(&rest))?;
        }
        Ok(())
    }

    /// Number of bytes waiting for a terminator.
    pub(crate) fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn feed(chunks: &[&[u8]]) -> Vec<String> {
        let mut acc = LineAccumulator::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            acc.push(chunk, |l| {
                lines.push(l.to_string());
                Ok(())
            })
            .unwrap();
        }
        acc.finish(|l| {
            lines.push(l.to_string());
            Ok(())
        })
        .unwrap();
        lines
    }

    #[test]
    fn splits_on_all_terminators() {
        assert_eq!(feed(&[b"a\nb\r\nc\rd"]), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn crlf_split_across_writes_is_one_terminator() {
        assert_eq!(feed(&[b"a\r", b"\nb"]), vec!["a", "b"]);
        assert_eq!(feed(&[b"a\r", b"b"]), vec!["a", "b"]);
    }

    #[test]
    fn partial_line_waits_for_more_bytes() {
        let mut acc = LineAccumulator::new();
        let mut lines: Vec<String> = Vec::new();
        acc.push(b"main.c:6: err", |l| {
            lines.push(l.to_string());
            Ok(())
        })
        .unwrap();
        assert!(lines.is_empty());
        assert_eq!(acc.buffered(), 13);

        acc.push(b"or: x\n", |l| {
            lines.push(l.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(lines, vec!["main.c:6: error: x"]);
        assert_eq!(acc.buffered(), 0);
    }

    #[test]
    fn finish_flushes_trailing_carriage_return() {
        assert_eq!(feed(&[b"x\r"]), vec!["x"]);
        assert_eq!(feed(&[b"\r"]), vec![""]);
        assert_eq!(feed(&[b""]), Vec::<String>::new());
    }

    #[test]
    fn empty_lines_are_kept() {
        assert_eq!(feed(&[b"\n\na\n"]), vec!["", "", "a"]);
    }

    #[test]
    fn utf8_sequence_split_across_writes() {
        let text = "foo.c:1: warning: ‘x’ unused\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xe2).unwrap() + 1;
        assert_eq!(feed(&[&text[..split], &text[split..]]), vec!["foo.c:1: warning: ‘x’ unused"]);
    }

    #[test]
    fn failing_callback_keeps_remaining_lines() {
        let mut acc = LineAccumulator::new();
        let err = acc.push(b"a\nb\n", |l| if l == "a" { Err(io::Error::other("sink closed")) } else { Ok(()) });
        assert!(err.is_err());

        let mut rest = Vec::new();
        acc.finish(|l| {
            rest.push(l.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(rest, vec!["b"]);
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_lines(
            text in "[a-z: \r\n‘’]{0,64}",
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let bytes = text.as_bytes();
            let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            offsets.sort_unstable();
            offsets.dedup();

            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut prev = 0;
            for off in offsets {
                chunks.push(&bytes[prev..off]);
                prev = off;
            }
            chunks.push(&bytes[prev..]);

            prop_assert_eq!(feed(&chunks), feed(&[bytes]));
        }
    }
}
