//! Back-reference templates for regex sub-patterns.
//!
//! A template is literal text with references into the match:
//!
//! ```text
//! $0        whole line
//! $1 .. $N  numbered group; digits are read greedily while the number is
//!           still a group of the expression ("$12" with 3 groups is $1 + "2")
//! ${name}   named (or numbered) group
//! \x        literal x (so "\$1" is the text "$1")
//! ```
//!
//! A group that exists but did not take part in the match expands to nothing.
//! A reference to a group the expression does not have is an authoring error,
//! reported as [`TemplateError`] so the caller can ignore that sub-pattern.

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TemplateError {
    #[error("template refers to group {0}, which the expression does not have")]
    MissingGroup(usize),
    #[error("template refers to group `{0}`, which the expression does not have")]
    MissingName(String),
    #[error("unterminated `${{` in template")]
    Unterminated,
}

pub(crate) fn expand(template: &str, regex: &Regex, caps: &Captures<'_>) -> Result<String, TemplateError> {
    let groups = caps.len();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['$', '\\']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix('\\') {
            let mut chars = after.chars();
            match chars.next() {
                Some(c) => out.push(c),
                None => out.push('\\'),
            }
            rest = chars.as_str();
            continue;
        }

        let after = &tail[1..];
        if let Some(braced) = after.strip_prefix('{') {
            let end = braced.find('}').ok_or(TemplateError::Unterminated)?;
            out.push_str(named(regex, caps, &braced[..end])?);
            rest = &braced[end + 1..];
            continue;
        }

        let digits = after.as_bytes().iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let bytes = after.as_bytes();
        let mut group = usize::from(bytes[0] - b'0');
        let mut used = 1;
        while used < digits {
            let next = group * 10 + usize::from(bytes[used] - b'0');
            if next >= groups {
                break;
            }
            group = next;
            used += 1;
        }
        if group >= groups {
            return Err(TemplateError::MissingGroup(group));
        }
        out.push_str(caps.get(group).map_or("", |m| m.as_str()));
        rest = &after[used..];
    }

    out.push_str(rest);
    Ok(out)
}

fn named<'h>(regex: &Regex, caps: &Captures<'h>, name: &str) -> Result<&'h str, TemplateError> {
    if let Ok(index) = name.parse::<usize>() {
        if index >= caps.len() {
            return Err(TemplateError::MissingGroup(index));
        }
        return Ok(caps.get(index).map_or("", |m| m.as_str()));
    }
    if !regex.capture_names().flatten().any(|n| n == name) {
        return Err(TemplateError::MissingName(name.to_string()));
    }
    Ok(caps.name(name).map_or("", |m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expr: &str, line: &str, template: &str) -> Result<String, TemplateError> {
        let regex = Regex::new(expr).unwrap();
        let caps = regex.captures(line).unwrap();
        expand(template, &regex, &caps)
    }

    #[test]
    fn numbered_and_whole_line_references() {
        assert_eq!(run(r"([\w.]+):(\d+): (.*)", "x.c:3: oops", "$1@$2 [$3]").unwrap(), "x.c@3 [oops]");
        assert_eq!(run(r".*", "whole line", "$0").unwrap(), "whole line");
    }

    #[test]
    fn digits_stop_at_group_count() {
        assert_eq!(run(r"(a)(b)(c)", "abc", "$12").unwrap(), "a2");
    }

    #[test]
    fn named_groups_and_escapes() {
        assert_eq!(run(r"(?P<file>\S+) (?P<opt>x)?", "f.c ", "${file}|${opt}|\\$1").unwrap(), "f.c||$1");
        assert_eq!(run(r"(a)", "a", "${1}0").unwrap(), "a0");
        assert_eq!(run(r"(a)", "a", "cost: $ 5").unwrap(), "cost: $ 5");
    }

    #[test]
    fn missing_groups_are_errors() {
        assert_eq!(run(r"(a)", "a", "$3"), Err(TemplateError::MissingGroup(3)));
        assert_eq!(run(r"(a)", "a", "${nope}"), Err(TemplateError::MissingName("nope".into())));
        assert_eq!(run(r"(a)", "a", "${1"), Err(TemplateError::Unterminated));
    }
}
