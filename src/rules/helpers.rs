use crate::engine::base_name;

/// Parse a captured line number; anything unparsable means "no line".
pub fn parse_line_number(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// Text between the first opening quote and its closing quote.
///
/// Accepts the quote styles GNU tools have used over the years: `` `x' ``,
/// `'x'`, `"x"` and `‘x’`.
pub fn first_quoted(text: &str) -> Option<&str> {
    let caps = regex!(r#"[`'‘"]([^`'‘’"]+)['’"]"#).captures(text)?;
    caps.get(1).map(|m| m.as_str())
}

/// More opening quotes (`` ` `` or `‘`) than closing ones.
pub fn has_open_quote(text: &str) -> bool {
    let opening = text.chars().filter(|c| matches!(c, '`' | '‘')).count();
    let closing = text.chars().filter(|c| matches!(c, '\'' | '’')).count();
    opening > closing
}

/// `Makefile`, `GNUmakefile`, `makefile`, `*.mk`.
pub fn is_makefile(token: &str) -> bool {
    let name = base_name(token);
    name.to_ascii_lowercase().ends_with("makefile") || name.ends_with(".mk")
}

/// Drive letter or backslash separators.
pub fn is_windows_path(token: &str) -> bool {
    let b = token.as_bytes();
    token.contains('\\') || (b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':')
}

/// The part after the last colon that is not a drive-letter colon.
///
/// `a.o:src.c` → `src.c`, `C:/w/a.o` → `C:/w/a.o`.
pub fn last_file_segment(loc: &str) -> &str {
    let split = loc.char_indices().filter(|&(i, c)| c == ':' && !(i == 1 && is_windows_path(loc))).last();
    match split {
        Some((i, _)) if i + 1 < loc.len() => &loc[i + 1..],
        _ => loc,
    }
}
