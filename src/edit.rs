//! Line-based edits applied to a whole file.
//!
//! Addressing differs per operation and is kept that way:
//! * replace and delete use 1-based line numbers;
//! * insert takes the line to insert *after*, where `0` means the beginning.

use crate::error::{AssistantError, Result};
use similar::TextDiff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    Replace { line: usize, text: String },
    InsertAfter { after: usize, lines: Vec<String> },
    Delete { start: usize, end: usize },
}

impl LineEdit {
    /// Validate against `content` and return the new full text.
    pub fn apply(&self, content: &str) -> Result<String> {
        let mut lines: Vec<&str> = content.split('\n').collect();
        let count = lines.len();

        match self {
            LineEdit::Replace { line, text } => {
                if *line < 1 || *line > count {
                    return Err(AssistantError::validation(format!(
                        "Invalid line number {line}: file has {count} lines"
                    )));
                }
                lines[line - 1] = text.as_str();
            }
            LineEdit::InsertAfter { after, lines: new_lines } => {
                if *after > count {
                    return Err(AssistantError::validation(format!(
                        "Invalid line number {after}: file has {count} lines"
                    )));
                }
                lines.splice(*after..*after, new_lines.iter().map(String::as_str));
            }
            LineEdit::Delete { start, end } => {
                if *start < 1 || start > end || *end > count {
                    return Err(AssistantError::validation(format!(
                        "Invalid line range {start}-{end}: file has {count} lines"
                    )));
                }
                lines.drain(start - 1..*end);
            }
        }

        Ok(lines.join("\n"))
    }

    pub fn describe(&self) -> String {
        match self {
            LineEdit::Replace { line, .. } => format!("replace line {line}"),
            LineEdit::InsertAfter { after, lines } => {
                format!("insert {} line(s) after line {after}", lines.len())
            }
            LineEdit::Delete { start, end } => format!("delete lines {start}-{end}"),
        }
    }
}

/// Unified diff of two full texts, for display only.
pub fn unified_diff(old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header("before", "after")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "one\ntwo\nthree";

    #[test]
    fn test_replace_is_one_based() {
        let edit = LineEdit::Replace {
            line: 2,
            text: "TWO".into(),
        };
        assert_eq!(edit.apply(SOURCE).unwrap(), "one\nTWO\nthree");
    }

    #[test]
    fn test_replace_out_of_range() {
        for line in [0, 4] {
            let edit = LineEdit::Replace {
                line,
                text: "x".into(),
            };
            assert!(matches!(
                edit.apply(SOURCE),
                Err(AssistantError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_insert_after_zero_is_beginning() {
        let edit = LineEdit::InsertAfter {
            after: 0,
            lines: vec!["zero".into()],
        };
        assert_eq!(edit.apply(SOURCE).unwrap(), "zero\none\ntwo\nthree");

        let edit = LineEdit::InsertAfter {
            after: 3,
            lines: vec!["four".into(), "five".into()],
        };
        assert_eq!(edit.apply(SOURCE).unwrap(), "one\ntwo\nthree\nfour\nfive");

        let edit = LineEdit::InsertAfter {
            after: 4,
            lines: vec!["x".into()],
        };
        assert!(edit.apply(SOURCE).is_err());
    }

    #[test]
    fn test_delete_inclusive_range() {
        let edit = LineEdit::Delete { start: 1, end: 2 };
        assert_eq!(edit.apply(SOURCE).unwrap(), "three");

        let edit = LineEdit::Delete { start: 3, end: 2 };
        assert!(edit.apply(SOURCE).is_err());
        let edit = LineEdit::Delete { start: 0, end: 1 };
        assert!(edit.apply(SOURCE).is_err());
        let edit = LineEdit::Delete { start: 2, end: 4 };
        assert!(edit.apply(SOURCE).is_err());
    }

    #[test]
    fn test_trailing_newline_counts_as_line() {
        let edit = LineEdit::Replace {
            line: 2,
            text: "b".into(),
        };
        assert_eq!(edit.apply("a\n").unwrap(), "a\nb");
    }

    #[test]
    fn test_unified_diff_marks_changes() {
        let diff = unified_diff("one\ntwo\n", "one\n2\n");
        assert!(diff.contains("--- before"));
        assert!(diff.contains("+++ after"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+2"));
    }
}
