mod analyzer;
mod assistant;
mod bugs;
mod command;
mod config;
mod console;
mod edit;
mod error;
mod executor;
mod index;
mod indexer;
mod logging;
mod models;
mod output;
mod parser;

use anyhow::{Context, Result};
use assistant::Assistant;
use clap::Parser;
use colored::*;
use config::{
    AssistantConfig, DEFAULT_ANALYZER, DEFAULT_LOG_FILTER, DEFAULT_MAX_RESULTS,
    DEFAULT_SCAN_LIMIT,
};
use console::StdinPrompt;
use std::path::PathBuf;
use std::time::Instant;

#[derive(clap::Parser)]
#[command(name = "codeassist")]
#[command(
    version,
    about = "codeassist - interactive assistant for a local code project",
    long_about = "codeassist - interactive assistant for a local code project

Indexes every recognized source file under TARGET_DIR, extracts Python
structure with tree-sitter, then reads commands from the console:

  find <query>              search paths and lines
  fix <file_path>           syntax check, external analyzer, anti-patterns
  run <command>             run a shell command in the project root
  edit <file_path> <instr>  interactive line editor with diff preview
  analyze <file_path>       structural report for one file

Free text mentioning bugs, file creation or the project structure is routed
to the matching action. Type 'exit' to quit."
)]
struct Cli {
    /// Project directory to index
    #[arg(default_value = ".")]
    target_dir: PathBuf,

    /// External Python analyzer looked up on PATH
    #[arg(long, env = "CODEASSIST_ANALYZER", default_value = DEFAULT_ANALYZER)]
    analyzer: String,

    /// Number of search hits to show
    #[arg(long, env = "CODEASSIST_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Python files checked by the project-wide bug scan
    #[arg(long, env = "CODEASSIST_SCAN_LIMIT", default_value_t = DEFAULT_SCAN_LIMIT)]
    scan_limit: usize,

    /// Diagnostic log filter (RUST_LOG takes precedence)
    #[arg(long, env = "CODEASSIST_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if !cli.target_dir.is_dir() {
        eprintln!(
            "{} {} is not a valid directory",
            "✗".red(),
            cli.target_dir.display()
        );
        std::process::exit(1);
    }
    let root = cli
        .target_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", cli.target_dir.display()))?;

    let config = AssistantConfig {
        root: root.clone(),
        analyzer: cli.analyzer,
        max_results: cli.max_results,
        scan_limit: cli.scan_limit,
    };

    println!("{} Indexing {}...", "→".cyan(), root.display());
    let start = Instant::now();
    let (index, failures) = indexer::index_directory(&config.root)
        .with_context(|| format!("Failed to index {}", root.display()))?;
    if !failures.is_empty() {
        println!("{}", output::format_scan_failures(&failures));
    }
    if index.is_empty() {
        println!(
            "{} No recognized source files under {}",
            "→".cyan(),
            root.display()
        );
    } else {
        println!(
            "{} Indexed {} files in {:.2}s",
            "✓".green(),
            index.len(),
            start.elapsed().as_secs_f64()
        );
    }
    println!(
        "{}",
        output::format_summary(&analyzer::summarize_project(&index))
    );
    println!("\n{}", output::format_help());

    Assistant::new(index, config, StdinPrompt).run()?;
    Ok(())
}
