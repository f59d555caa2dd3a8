//! Whitespace and comment helpers used when splicing inserted code into
//! existing source text.

/// Characters Python treats as insignificant indentation whitespace.
const INDENT_CHARS: [char; 3] = [' ', '\t', '\x0c'];

/// Splits `text` into its leading and trailing whitespace.
///
/// Text made only of whitespace is reported entirely as leading.
#[must_use]
pub fn extract_whitespaces(text: &str) -> (&str, &str) {
    let body = text.trim_start();
    let leading = &text[..text.len() - body.len()];
    let trailing = &body[body.trim_end().len()..];
    (leading, trailing)
}

/// Iterates over the lines of `text`, each keeping its line terminator
/// (`\n`, `\r\n` or a lone `\r`).
fn lines_inclusive(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let mut end = start;
        while end < bytes.len() {
            match bytes[end] {
                b'\n' => {
                    end += 1;
                    break;
                }
                b'\r' => {
                    end += 1;
                    if bytes.get(end) == Some(&b'\n') {
                        end += 1;
                    }
                    break;
                }
                _ => end += 1,
            }
        }
        let line = &text[start..end];
        start = end;
        Some(line)
    })
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_terminated(line: &str) -> bool {
    line.ends_with(['\n', '\r'])
}

fn is_blank(line: &str) -> bool {
    strip_terminator(line).trim_matches(INDENT_CHARS).is_empty()
}

fn is_comment_or_blank(line: &str) -> bool {
    let content = strip_terminator(line).trim_start_matches(INDENT_CHARS);
    content.is_empty() || content.starts_with('#')
}

/// Splits `text` into a prefix of blank and comment-only lines and the code
/// that follows.
///
/// The split happens at a line start, so the first code line keeps its own
/// indentation.
#[must_use]
pub fn split_comments(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in lines_inclusive(text) {
        if !is_comment_or_blank(line) {
            break;
        }
        offset += line.len();
    }
    text.split_at(offset)
}

/// Number of complete blank lines at the end of `text`.
fn trailing_blank_lines(text: &str) -> usize {
    let lines: Vec<&str> = lines_inclusive(text).collect();
    let complete = match lines.last() {
        Some(last) if !is_terminated(last) => &lines[..lines.len() - 1],
        _ => &lines[..],
    };
    complete.iter().rev().take_while(|line| is_blank(line)).count()
}

/// Number of complete blank lines at the start of `text`.
fn leading_blank_lines(text: &str) -> usize {
    lines_inclusive(text)
        .take_while(|line| is_terminated(line) && is_blank(line))
        .count()
}

/// How many more blank lines must go between `prefix` and `suffix` so that
/// at least `expected` separate them.
#[must_use]
pub fn missing_newlines(prefix: &str, suffix: &str, expected: usize) -> usize {
    expected.saturating_sub(trailing_blank_lines(prefix) + leading_blank_lines(suffix))
}

/// Indentation of the line containing byte `offset`.
pub(crate) fn line_indent(source: &str, offset: usize) -> &str {
    let before = source.get(..offset).unwrap_or(source);
    let line_start = before.rfind(['\n', '\r']).map_or(0, |i| i + 1);
    let line = &source[line_start..];
    &line[..line.len() - line.trim_start_matches(INDENT_CHARS).len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_around_text() {
        assert_eq!(extract_whitespaces("  x := 1\n"), ("  ", "\n"));
        assert_eq!(extract_whitespaces("x"), ("", ""));
        assert_eq!(extract_whitespaces(" \n "), (" \n ", ""));
    }

    #[test]
    fn comments_split_at_first_code_line() {
        let text = "\n  # note\n\n    x = 1\n    # tail\n";
        assert_eq!(split_comments(text), ("\n  # note\n\n", "    x = 1\n    # tail\n"));
        assert_eq!(split_comments("y = 2"), ("", "y = 2"));
        assert_eq!(split_comments("# only\r\n"), ("# only\r\n", ""));
    }

    #[test]
    fn blank_line_accounting() {
        assert_eq!(missing_newlines("import os\n", "def f(): pass\n", 2), 2);
        assert_eq!(missing_newlines("import os\n\n", "def f(): pass\n", 2), 1);
        assert_eq!(missing_newlines("import os\n\n", "\n\ndef f(): pass\n", 2), 0);
        assert_eq!(missing_newlines("x = 1\r\n\r\n\r\n", "y\r\n", 1), 0);
        assert_eq!(missing_newlines("", "x = 1\n", 1), 1);
    }

    #[test]
    fn partial_last_line_is_not_blank() {
        assert_eq!(missing_newlines("x = 1\n    ", "y", 1), 1);
    }

    #[test]
    fn indentation_of_line() {
        let source = "if x:\n    y = 1\n";
        assert_eq!(line_indent(source, source.find('y').unwrap()), "    ");
        assert_eq!(line_indent(source, 0), "");
    }
}
