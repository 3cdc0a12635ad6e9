use crate::analyzer::{FileAnalysis, ProjectSummary};
use crate::bugs::{AnalyzerReport, FileCheck, ProjectScan, Severity};
use crate::error::AssistantError;
use crate::index::SearchHit;
use crate::indexer::ScanFailure;
use crate::models::{FileRecord, FunctionInfo};
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::collections::BTreeMap;

pub const HELP: &str = "\
  find <query>              - Search for code or files in the project
  fix <file_path>           - Analyze and fix bugs in a file
  run <command>             - Execute a command in the project directory
  edit <file_path> <instr>  - Edit a file based on instructions
  analyze <file_path>       - Analyze a specific file
  help                      - Show this help message
  exit                      - Exit the assistant";

pub fn format_help() -> String {
    format!(
        "\n{} Available commands:\n{}\n\nYou can also ask general questions about the codebase.",
        "📚",
        HELP
    )
}

pub fn format_error(err: &AssistantError) -> String {
    format!("{} {}", "❌", err.to_string().red())
}

pub fn format_scan_failures(failures: &[ScanFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} Error indexing {}: {}", "⚠️".yellow(), f.path, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_summary(summary: &ProjectSummary) -> String {
    let mut output = format!("{} {}", "📊", summary);

    if !summary.language_counts.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Language", "Files"]);
        for (language, count) in &summary.language_counts {
            table.add_row(vec![language.as_str().to_string(), count.to_string()]);
        }
        output.push_str(&format!("\n{table}"));
    }

    output
}

pub fn format_search(query: &str, hits: &[SearchHit], limit: usize) -> String {
    let mut output = format!("{} Searching for '{}'...\n", "🔍", query);
    if hits.is_empty() {
        output.push_str("No matches found");
        return output;
    }

    output.push_str(&format!("Found {} matches:\n", hits.len()));
    for hit in hits.iter().take(limit) {
        let line = match hit {
            SearchHit::Path(_) => hit.to_string().cyan().to_string(),
            SearchHit::Line { .. } => hit.to_string(),
        };
        output.push_str(&format!("  {line}\n"));
    }
    if hits.len() > limit {
        output.push_str(&format!("  ... and {} more matches\n", hits.len() - limit));
    }
    output.trim_end().to_string()
}

fn format_function(func: &FunctionInfo, indent: &str) -> String {
    let mut line = format!(
        "{indent}{}({}) - line {}",
        func.name.bold(),
        func.params.join(", "),
        func.line
    );
    if let Some(first) = func.docstring.lines().next().filter(|l| !l.is_empty()) {
        line.push_str(&format!("\n{indent}  {}", first.dimmed()));
    }
    line
}

pub fn format_record(record: &FileRecord) -> String {
    let mut output = format!(
        "\nFile: {}\nLanguage: {}",
        record.path.bold(),
        record.language.as_str()
    );

    if !record.imports.is_empty() {
        output.push_str("\n\nImports:");
        for import in &record.imports {
            output.push_str(&format!("\n  {import}"));
        }
    }

    if !record.functions.is_empty() {
        output.push_str("\n\nFunctions:");
        for func in &record.functions {
            output.push_str(&format!("\n{}", format_function(func, "  ")));
        }
    }

    if !record.classes.is_empty() {
        output.push_str("\n\nClasses:");
        for class in &record.classes {
            output.push_str(&format!("\n  {} - line {}", class.name.bold(), class.line));
            if let Some(first) = class.docstring.lines().next().filter(|l| !l.is_empty()) {
                output.push_str(&format!("\n    {}", first.dimmed()));
            }
            if !class.methods.is_empty() {
                output.push_str("\n    Methods:");
                for method in &class.methods {
                    output.push_str(&format!("\n{}", format_function(method, "      ")));
                }
            }
        }
    }

    output
}

pub fn format_analysis(analysis: &FileAnalysis) -> String {
    match analysis {
        FileAnalysis::Indexed(record) => format_record(record),
        FileAnalysis::AdHoc {
            record,
            size,
            lines,
            parse_error,
        } => {
            let mut output = format_record(record);
            output.push_str(&format!("\nSize: {size} bytes\nLines: {lines}"));
            if let Some(err) = parse_error {
                output.push_str(&format!(
                    "\n{} Could not parse Python file ({err})",
                    "⚠️".yellow()
                ));
            }
            output.push_str(&format!("\n{} not in the index (ad-hoc analysis)", "→".cyan()));
            output
        }
    }
}

pub fn format_structure(tree: &BTreeMap<String, Vec<String>>) -> String {
    let mut output = format!("\n{} Project Structure:", "📁");
    for (dir, files) in tree {
        if dir == "." {
            output.push_str("\n📂 (root)");
        } else {
            output.push_str(&format!("\n📂 {}", dir.bold()));
        }
        for file in files {
            output.push_str(&format!("\n  📄 {file}"));
        }
    }
    output
}

pub fn format_numbered(content: &str) -> String {
    let mut output = String::from("---------------------");
    for (i, line) in content.split('\n').enumerate() {
        output.push_str(&format!("\n{:4} | {}", i + 1, line));
    }
    output.push_str("\n---------------------");
    output
}

/// Green additions, red deletions; headers and context unchanged.
pub fn format_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            if line.starts_with('+') && !line.starts_with("+++") {
                line.green().to_string()
            } else if line.starts_with('-') && !line.starts_with("---") {
                line.red().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_file_check(path: &str, check: &FileCheck, analyzer: &str) -> String {
    let mut output = format!("{} Analyzing {} for bugs...", "🔍", path);

    match check {
        FileCheck::Unsupported(language) => {
            output.push_str(&format!(
                "\nBug analysis for {} files is not yet implemented",
                language.as_str()
            ));
        }
        FileCheck::SyntaxError(problem) => {
            output.push_str(&format!(
                "\n{} Syntax error at line {}, column {}: {}",
                "❌",
                problem.line,
                problem.column,
                problem.message.red()
            ));
            output.push_str(&format!("\n\nError line: {}", problem.source_line));
            output.push_str(&format!("\n🔧 Suggestion: {}", problem.suggestion));
        }
        FileCheck::Checked {
            analyzer: report,
            antipatterns,
        } => {
            output.push_str(&format!("\n{} No syntax errors found", "✅"));
            match report {
                Ok(AnalyzerReport::Clean) => {
                    output.push_str(&format!("\n{} No issues found by {analyzer}", "✅"));
                }
                Ok(AnalyzerReport::Issues(issues)) => {
                    output.push_str(&format!("\nFound {} potential issues:", issues.len()));
                    for issue in issues {
                        output.push_str(&format!(
                            "\n  Line {}: {} ({})",
                            issue.line, issue.message, issue.symbol
                        ));
                    }
                }
                Ok(AnalyzerReport::Unparsable) => {
                    output.push_str(&format!(
                        "\n{} {analyzer} output could not be parsed",
                        "⚠️".yellow()
                    ));
                }
                Err(err) => {
                    output.push_str(&format!("\n{} {}", "⚠️".yellow(), err));
                }
            }

            if antipatterns.is_empty() {
                output.push_str(&format!("\n{} No common anti-patterns found", "✅"));
            } else {
                output.push_str(&format!(
                    "\n\n{} Potential code quality issues:",
                    "⚠️".yellow()
                ));
                for finding in antipatterns {
                    output.push_str(&format!("\n  Line {}: {}", finding.line, finding.message));
                }
            }
        }
    }

    output
}

pub fn format_project_scan(scan: &ProjectScan, analyzer: &str) -> String {
    let mut output = format!("{} Analyzing project for bugs...", "🔍");
    if scan.python_files == 0 {
        output.push_str("\nNo Python files found in the project");
        return output;
    }

    output.push_str(&format!(
        "\nFound {} Python files to analyze",
        scan.python_files
    ));
    if scan.analyzer_missing {
        output.push_str(&format!(
            "\n{} {analyzer} not found. Install it for better analysis",
            "⚠️".yellow()
        ));
    }
    for (file, reason) in &scan.errors {
        output.push_str(&format!("\n{} Error analyzing {file}: {reason}", "❌"));
    }

    if scan.issues.is_empty() {
        output.push_str(&format!("\n{} No issues found in the analyzed files", "✅"));
        return output;
    }

    output.push_str(&format!("\n\n🐛 Found {} potential issues:", scan.issues.len()));

    let high = scan.by_severity(Severity::High);
    if !high.is_empty() {
        output.push_str(&format!("\n\n{} {} high severity issues:", "❌", high.len()));
        for issue in high {
            output.push_str(&format!("\n  {}:{} - {}", issue.file, issue.line, issue.message));
        }
    }

    let medium = scan.by_severity(Severity::Medium);
    if !medium.is_empty() {
        output.push_str(&format!(
            "\n\n{} {} medium severity issues:",
            "⚠️".yellow(),
            medium.len()
        ));
        for issue in medium.iter().take(5) {
            output.push_str(&format!("\n  {}:{} - {}", issue.file, issue.line, issue.message));
        }
        if medium.len() > 5 {
            output.push_str(&format!(
                "\n  ... and {} more medium severity issues",
                medium.len() - 5
            ));
        }
    }

    let low = scan.by_severity(Severity::Low);
    if !low.is_empty() {
        output.push_str(&format!("\n\n📝 {} low severity issues", low.len()));
        output.push_str("\n  Use 'analyze <file_path>' to see details for specific files");
    }

    output
}
