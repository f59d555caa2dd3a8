//! Newline and indentation detection for files converted without forced values.

use walrus::{Indentation, LineSeparator};

/// The newline sequence used most often in `text`; LF when there is none.
pub fn linesep(text: &str) -> LineSeparator {
    let bytes = text.as_bytes();
    let (mut lf, mut crlf, mut cr) = (0usize, 0usize, 0usize);
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => {
                crlf += 1;
                index += 1;
            }
            b'\r' => cr += 1,
            b'\n' => lf += 1,
            _ => {}
        }
        index += 1;
    }
    if crlf > lf && crlf >= cr {
        LineSeparator::CrLf
    } else if cr > lf && cr > crlf {
        LineSeparator::Cr
    } else {
        LineSeparator::Lf
    }
}

/// Indentation of the first indented code line in `text`; four spaces when
/// nothing is indented.
pub fn indentation(text: &str) -> Indentation {
    let mut continued = false;
    for line in text.lines() {
        let content = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - content.len()];
        let skip = continued || content.is_empty() || content.starts_with('#');
        continued = content.ends_with('\\');
        if skip || indent.is_empty() {
            continue;
        }
        if indent.starts_with('\t') {
            return Indentation::tab();
        }
        return Indentation::spaces(indent.len());
    }
    Indentation::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_newline_wins() {
        assert_eq!(linesep("a\nb\n"), LineSeparator::Lf);
        assert_eq!(linesep("a\r\nb\r\nc\n"), LineSeparator::CrLf);
        assert_eq!(linesep("a\rb\r"), LineSeparator::Cr);
        assert_eq!(linesep("no newline"), LineSeparator::Lf);
    }

    #[test]
    fn first_indented_line_sets_unit() {
        assert_eq!(indentation("if x:\n  y = 1\n"), Indentation::spaces(2));
        assert_eq!(indentation("def f():\n\treturn 1\n"), Indentation::tab());
        assert_eq!(indentation("x = 1\n"), Indentation::default());
    }

    #[test]
    fn comments_and_continuations_are_ignored() {
        let text = "x = 1 + \\\n        2\n# c\n   # indented comment\nif x:\n   pass\n";
        assert_eq!(indentation(text), Indentation::spaces(3));
    }
}
