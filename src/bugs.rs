//! Bug heuristics: syntax check, external analyzer, anti-pattern scan.

use crate::error::{AssistantError, Result};
use crate::index::ProjectIndex;
use crate::models::Language;
use crate::parser::python::PythonExtractor;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

const HIGH_SEVERITY: &[&str] = &[
    "syntax-error",
    "undefined-variable",
    "undefined-name",
    "used-before-assignment",
    "not-callable",
    "no-member",
    "no-name-in-module",
    "import-error",
];

const MEDIUM_SEVERITY: &[&str] = &[
    "unused-import",
    "unused-variable",
    "redefined-outer-name",
    "redefined-builtin",
    "unsubscriptable-object",
    "arguments-differ",
    "duplicate-code",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn from_symbol(symbol: &str) -> Self {
        if HIGH_SEVERITY.contains(&symbol) {
            Severity::High
        } else if MEDIUM_SEVERITY.contains(&symbol) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One entry of the analyzer's JSON report.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AnalyzerIssue {
    pub line: usize,
    pub message: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerReport {
    Clean,
    Issues(Vec<AnalyzerIssue>),
    /// Non-zero exit with output that is not the expected JSON.
    Unparsable,
}

#[derive(Debug, Clone)]
pub struct SyntaxProblem {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub source_line: String,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub message: String,
}

/// Outcome of `fix <path>` on one file.
#[derive(Debug)]
pub enum FileCheck {
    Unsupported(Language),
    SyntaxError(SyntaxProblem),
    Checked {
        analyzer: Result<AnalyzerReport>,
        antipatterns: Vec<Finding>,
    },
}

#[derive(Debug, Clone)]
pub struct ProjectIssue {
    pub file: String,
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Default)]
pub struct ProjectScan {
    pub python_files: usize,
    pub analyzer_missing: bool,
    pub issues: Vec<ProjectIssue>,
    /// Files that could not be checked, with the reason.
    pub errors: Vec<(String, String)>,
}

impl ProjectScan {
    pub fn by_severity(&self, severity: Severity) -> Vec<&ProjectIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Availability {
    Unknown,
    Available(PathBuf),
    Unavailable,
}

/// Optional lint-style program invoked as `<program> --output-format=json <file>`.
/// A missing program disables it for the rest of the session.
#[derive(Debug, Clone)]
pub struct ExternalAnalyzer {
    program: String,
    state: Availability,
}

impl ExternalAnalyzer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            state: Availability::Unknown,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn locate(&mut self) -> Result<PathBuf> {
        if let Availability::Unknown = self.state {
            self.state = match which::which(&self.program) {
                Ok(path) => Availability::Available(path),
                Err(err) => {
                    tracing::debug!("{} not on PATH: {}", self.program, err);
                    Availability::Unavailable
                }
            };
        }

        match &self.state {
            Availability::Available(path) => Ok(path.clone()),
            _ => Err(AssistantError::ExternalToolUnavailable {
                tool: self.program.clone(),
            }),
        }
    }

    pub fn is_available(&mut self) -> bool {
        self.locate().is_ok()
    }

    pub fn run(&mut self, file: &Path) -> Result<AnalyzerReport> {
        let program = self.locate()?;
        tracing::debug!("running {} on {}", program.display(), file.display());

        let output = Command::new(&program)
            .arg("--output-format=json")
            .arg(file)
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.state = Availability::Unavailable;
                return Err(AssistantError::ExternalToolUnavailable {
                    tool: self.program.clone(),
                });
            }
            Err(err) => return Err(AssistantError::io(program, err)),
        };

        if output.status.success() {
            return Ok(AnalyzerReport::Clean);
        }
        Ok(parse_report(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub fn parse_report(stdout: &str) -> AnalyzerReport {
    match serde_json::from_str::<Vec<AnalyzerIssue>>(stdout) {
        Ok(issues) => AnalyzerReport::Issues(issues),
        Err(err) => {
            tracing::debug!("analyzer output is not a JSON issue list: {}", err);
            AnalyzerReport::Unparsable
        }
    }
}

fn mutable_default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"def\s+\w+\s*\(.*=\s*(\[\]|\{\}|\(\))").expect("valid mutable default regex")
    })
}

fn bare_except_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*except\s*:").expect("valid bare except regex"))
}

/// Line-level Python anti-patterns, in line order per check.
pub fn check_antipatterns(content: &str) -> Vec<Finding> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut findings = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if mutable_default_re().is_match(line) {
            findings.push(Finding {
                line: i + 1,
                message: "Possible mutable default argument (can cause unexpected behavior)"
                    .to_string(),
            });
        }
    }
    for (i, line) in lines.iter().enumerate() {
        if bare_except_re().is_match(line) {
            findings.push(Finding {
                line: i + 1,
                message: "Bare except clause (should specify exceptions to catch)".to_string(),
            });
        }
    }
    for (i, line) in lines.iter().enumerate() {
        if line.contains("== None") {
            findings.push(Finding {
                line: i + 1,
                message: "Using '== None' instead of 'is None'".to_string(),
            });
        }
    }

    findings
}

fn suggest_fix(line: &str) -> &'static str {
    let single = line.matches('\'').count();
    let double = line.matches('"').count();
    if single % 2 == 1 || double % 2 == 1 {
        return "You might be missing a closing quote for a string";
    }

    let opened = line.matches(['(', '[', '{']).count();
    let closed = line.matches([')', ']', '}']).count();
    if opened != closed {
        return "You might be missing a closing parenthesis, bracket, or brace";
    }

    let trimmed = line.trim();
    let keyword = trimmed.split_whitespace().next().unwrap_or_default();
    let block_keywords = [
        "if", "elif", "else", "for", "while", "def", "class", "try", "except", "finally", "with",
    ];
    if block_keywords
        .iter()
        .any(|k| keyword == *k || keyword.starts_with(&format!("{k}:")))
        && !trimmed.ends_with(':')
    {
        return "Check if you're missing a colon or have incorrect indentation";
    }

    "Check for missing commas, operators, or incorrect syntax"
}

pub fn syntax_problem(content: &str) -> Result<Option<SyntaxProblem>> {
    match PythonExtractor::new().check_syntax(content) {
        Ok(()) => Ok(None),
        Err(AssistantError::Parse {
            line,
            column,
            message,
        }) => {
            let source_line = content
                .split('\n')
                .nth(line.saturating_sub(1))
                .unwrap_or_default()
                .to_string();
            Ok(Some(SyntaxProblem {
                line,
                column,
                message,
                suggestion: suggest_fix(&source_line),
                source_line,
            }))
        }
        Err(err) => Err(err),
    }
}

pub struct BugFinder {
    analyzer: ExternalAnalyzer,
}

impl BugFinder {
    pub fn new(analyzer: ExternalAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.program()
    }

    /// Syntax check, analyzer pass and anti-pattern scan of one file.
    pub fn check_file(&mut self, index: &ProjectIndex, user_path: &str) -> Result<FileCheck> {
        let (full_path, _) = index.resolve(user_path)?;
        if !full_path.is_file() {
            return Err(AssistantError::NotFound { path: full_path });
        }

        let language = crate::indexer::detect_language(&full_path);
        if language != Language::Python {
            return Ok(FileCheck::Unsupported(language));
        }

        let content =
            std::fs::read_to_string(&full_path).map_err(|e| AssistantError::io(&full_path, e))?;
        if let Some(problem) = syntax_problem(&content)? {
            return Ok(FileCheck::SyntaxError(problem));
        }

        Ok(FileCheck::Checked {
            analyzer: self.analyzer.run(&full_path),
            antipatterns: check_antipatterns(&content),
        })
    }

    /// Check the first `limit` Python records of the index.
    pub fn scan_project(&mut self, index: &ProjectIndex, limit: usize) -> ProjectScan {
        let python: Vec<_> = index
            .records()
            .filter(|record| record.language == Language::Python)
            .collect();

        let mut scan = ProjectScan {
            python_files: python.len(),
            analyzer_missing: !self.analyzer.is_available(),
            ..Default::default()
        };

        for record in python.into_iter().take(limit) {
            let full_path = index.root().join(&record.path);
            let content = match std::fs::read_to_string(&full_path) {
                Ok(content) => content,
                Err(err) => {
                    scan.errors.push((record.path.clone(), err.to_string()));
                    continue;
                }
            };

            match syntax_problem(&content) {
                Ok(Some(problem)) => {
                    scan.issues.push(ProjectIssue {
                        file: record.path.clone(),
                        line: problem.line,
                        message: format!("Syntax error: {}", problem.message),
                        severity: Severity::High,
                    });
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    scan.errors.push((record.path.clone(), err.to_string()));
                    continue;
                }
            }

            if scan.analyzer_missing {
                continue;
            }
            match self.analyzer.run(&full_path) {
                Ok(AnalyzerReport::Issues(issues)) => {
                    scan.issues.extend(issues.into_iter().map(|issue| ProjectIssue {
                        file: record.path.clone(),
                        line: issue.line,
                        severity: Severity::from_symbol(&issue.symbol),
                        message: format!("{} ({})", issue.message, issue.symbol),
                    }));
                }
                Ok(_) => {}
                Err(AssistantError::ExternalToolUnavailable { .. }) => {
                    scan.analyzer_missing = true;
                }
                Err(err) => scan.errors.push((record.path.clone(), err.to_string())),
            }
        }

        scan
    }
}
