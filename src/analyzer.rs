use crate::error::{AssistantError, Result};
use crate::index::ProjectIndex;
use crate::indexer::{detect_language, index_file};
use crate::models::{FileRecord, Language};
use crate::parser::python::PythonExtractor;
use std::fs;

/// Marker files at the project root and the project type they suggest.
const PROJECT_MARKERS: &[(&[&str], &str)] = &[
    (&["package.json"], "JavaScript/Node.js"),
    (&["requirements.txt", "setup.py"], "Python"),
    (&["Gemfile"], "Ruby"),
    (&["Cargo.toml"], "Rust"),
];

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub root: String,
    pub language_counts: Vec<(Language, usize)>,
    pub project_types: Vec<&'static str>,
}

impl std::fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![format!("Project in {}", self.root)];
        if !self.language_counts.is_empty() {
            let langs: Vec<String> = self
                .language_counts
                .iter()
                .map(|(lang, count)| format!("{} {} files", count, lang.as_str()))
                .collect();
            parts.push(format!("Contains {}", langs.join(", ")));
        }
        if !self.project_types.is_empty() {
            parts.push(format!(
                "Appears to be a {} project",
                self.project_types.join("/")
            ));
        }
        write!(f, "{}", parts.join(". "))
    }
}

pub fn summarize_project(index: &ProjectIndex) -> ProjectSummary {
    let root = index.root();
    let project_types = PROJECT_MARKERS
        .iter()
        .filter(|(files, _)| {
            files
                .iter()
                .any(|name| index.contains(name) || root.join(name).is_file())
        })
        .map(|(_, kind)| *kind)
        .collect();

    ProjectSummary {
        root: root.display().to_string(),
        language_counts: index.language_counts(),
        project_types,
    }
}

#[derive(Debug, Clone)]
pub enum FileAnalysis<'a> {
    /// Record already in the index; its cached structure is reported.
    Indexed(&'a FileRecord),
    /// File read and extracted on demand, not inserted into the index.
    AdHoc {
        record: FileRecord,
        size: usize,
        lines: usize,
        parse_error: Option<String>,
    },
}

pub fn analyze_file<'a>(index: &'a ProjectIndex, user_path: &str) -> Result<FileAnalysis<'a>> {
    let (full_path, key) = index.resolve(user_path)?;
    if !full_path.is_file() {
        return Err(AssistantError::NotFound { path: full_path });
    }

    if let Some(record) = index.get(&key) {
        return Ok(FileAnalysis::Indexed(record));
    }

    let content = fs::read_to_string(&full_path).map_err(|e| AssistantError::io(&full_path, e))?;
    let language = detect_language(&full_path);
    let parse_error = match language {
        Language::Python => PythonExtractor::new()
            .check_syntax(&content)
            .err()
            .map(|e| e.to_string()),
        _ => None,
    };

    let size = content.len();
    let record = index_file(&key, content, language);
    Ok(FileAnalysis::AdHoc {
        lines: record.line_count(),
        record,
        size,
        parse_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index_directory;
    use tempfile::TempDir;

    #[test]
    fn test_summary_detects_project_types() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("requirements.txt"), "requests").unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        fs::write(temp.path().join("app.py"), "").unwrap();
        fs::write(temp.path().join("util.py"), "").unwrap();

        let (index, _) = index_directory(temp.path()).unwrap();
        let summary = summarize_project(&index);
        assert_eq!(summary.project_types, vec!["JavaScript/Node.js", "Python"]);
        assert_eq!(
            summary.language_counts,
            vec![(Language::Python, 2), (Language::Json, 1)]
        );

        let text = summary.to_string();
        assert!(text.contains("Contains 2 python files, 1 json files"));
        assert!(text.ends_with("Appears to be a JavaScript/Node.js/Python project"));
    }

    #[test]
    fn test_analyze_uses_cached_record() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("m.py"), "def f(x):\n    pass\n").unwrap();
        let (index, _) = index_directory(temp.path()).unwrap();

        match analyze_file(&index, "m.py").unwrap() {
            FileAnalysis::Indexed(record) => assert_eq!(record.functions[0].name, "f"),
            other => panic!("expected cached record, got {other:?}"),
        }
    }

    #[test]
    fn test_analyze_ad_hoc_does_not_insert() {
        let temp = TempDir::new().unwrap();
        let (index, _) = index_directory(temp.path()).unwrap();
        fs::write(temp.path().join("late.py"), "import os\nclass K:\n    pass\n").unwrap();

        match analyze_file(&index, "late.py").unwrap() {
            FileAnalysis::AdHoc {
                record,
                size,
                lines,
                parse_error,
            } => {
                assert_eq!(record.classes[0].name, "K");
                assert_eq!(record.imports, vec!["import os".to_string()]);
                assert_eq!(size, 28);
                assert_eq!(lines, 4);
                assert!(parse_error.is_none());
            }
            other => panic!("expected ad-hoc analysis, got {other:?}"),
        }
        assert!(!index.contains("late.py"));
    }

    #[test]
    fn test_analyze_ad_hoc_reports_parse_error() {
        let temp = TempDir::new().unwrap();
        let (index, _) = index_directory(temp.path()).unwrap();
        fs::write(temp.path().join("bad.py"), "def broken(:\n").unwrap();

        match analyze_file(&index, "bad.py").unwrap() {
            FileAnalysis::AdHoc {
                record,
                parse_error,
                ..
            } => {
                assert!(parse_error.is_some());
                assert!(record.functions.is_empty());
            }
            other => panic!("expected ad-hoc analysis, got {other:?}"),
        }
    }

    #[test]
    fn test_analyze_missing_file() {
        let temp = TempDir::new().unwrap();
        let (index, _) = index_directory(temp.path()).unwrap();
        assert!(matches!(
            analyze_file(&index, "nope.py"),
            Err(AssistantError::NotFound { .. })
        ));
    }
}
