use crate::analyzer::analyze_file;
use crate::bugs::{BugFinder, ExternalAnalyzer};
use crate::command::{Command, Intent};
use crate::config::AssistantConfig;
use crate::console::Prompt;
use crate::edit::LineEdit;
use crate::error::{AssistantError, Result};
use crate::executor::CommandExecutor;
use crate::index::ProjectIndex;
use crate::output;
use colored::*;
use std::fs;
use std::path::PathBuf;

const MAIN_PROMPT: &str =
    "\n🧑‍💻 What would you like me to help with? (type 'exit' to quit): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive session over one project. Owns the index; every command
/// reads or mutates it through `&self`/`&mut self`.
pub struct Assistant<P: Prompt> {
    index: ProjectIndex,
    config: AssistantConfig,
    bugs: BugFinder,
    executor: CommandExecutor,
    prompt: P,
}

fn stdin_error(err: std::io::Error) -> AssistantError {
    AssistantError::io(PathBuf::from("<stdin>"), err)
}

fn parse_number(input: &str, what: &str) -> Result<usize> {
    input
        .trim()
        .parse()
        .map_err(|_| AssistantError::validation(format!("Invalid {what}: '{}'", input.trim())))
}

impl<P: Prompt> Assistant<P> {
    pub fn new(index: ProjectIndex, config: AssistantConfig, prompt: P) -> Self {
        let bugs = BugFinder::new(ExternalAnalyzer::new(config.analyzer.clone()));
        let executor = CommandExecutor::new(index.root());
        Self {
            index,
            config,
            bugs,
            executor,
            prompt,
        }
    }

    #[cfg(test)]
    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    /// Read-dispatch loop. Ends on `exit`/`quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let line = match self.prompt.read_line(MAIN_PROMPT).map_err(stdin_error)? {
                Some(line) => line,
                None => break,
            };
            if self.handle_line(&line) == Flow::Exit {
                return Ok(());
            }
        }
        println!("\nGoodbye! 👋");
        Ok(())
    }

    /// Parse and run one line of input. Errors are reported here and never
    /// end the session.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }

        match Command::parse(line).and_then(|command| self.execute(command)) {
            Ok(flow) => flow,
            Err(err) => {
                tracing::debug!("command failed: {err:?}");
                println!("{}", output::format_error(&err));
                Flow::Continue
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Exit => {
                println!("Goodbye! 👋");
                return Ok(Flow::Exit);
            }
            Command::Help => println!("{}", output::format_help()),
            Command::Find(query) => {
                let hits = self.index.find(&query);
                println!(
                    "{}",
                    output::format_search(&query, &hits, self.config.max_results)
                );
            }
            Command::Fix(path) => {
                let check = self.bugs.check_file(&self.index, &path)?;
                println!(
                    "{}",
                    output::format_file_check(&path, &check, self.bugs.analyzer_name())
                );
            }
            Command::Run(command) => self.run_command(&command)?,
            Command::Edit { path, instructions } => self.edit_file(&path, &instructions)?,
            Command::Analyze(path) => {
                let analysis = analyze_file(&self.index, &path)?;
                println!("{}", output::format_analysis(&analysis));
            }
            Command::Freeform(Intent::FindBugs) => {
                let scan = self.bugs.scan_project(&self.index, self.config.scan_limit);
                println!(
                    "{}",
                    output::format_project_scan(&scan, self.bugs.analyzer_name())
                );
            }
            Command::Freeform(Intent::CreateFile) => self.create_file()?,
            Command::Freeform(Intent::ShowStructure) => {
                println!("{}", output::format_structure(&self.index.structure()));
            }
            Command::Freeform(Intent::Unknown) => {
                println!("I'm not sure how to help with that. Try one of these commands:");
                println!("{}", output::HELP);
            }
        }
        Ok(Flow::Continue)
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.prompt
            .read_line(prompt)
            .map_err(stdin_error)?
            .ok_or_else(|| AssistantError::validation("Input ended"))
    }

    /// Lines until `terminator` or end of input.
    fn read_block(&mut self, terminator: &str) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.prompt.read_line("").map_err(stdin_error)? {
            if line == terminator {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }

    fn run_command(&mut self, command: &str) -> Result<()> {
        println!("{} Running: {}", "🚀", command.bold());
        let outcome = self.executor.execute(command, |line| println!("{line}"))?;

        if outcome.success() {
            println!("{} Command completed successfully", "✓".green());
        } else {
            match outcome.exit_code {
                Some(code) => println!("{} Command failed with exit code {code}", "✗".red()),
                None => println!("{} Command terminated by signal", "✗".red()),
            }
            if !outcome.stderr.trim().is_empty() {
                println!("{}", outcome.stderr.trim_end().red());
            }
        }
        Ok(())
    }

    fn edit_file(&mut self, path: &str, instructions: &str) -> Result<()> {
        let (full_path, key) = self.index.resolve(path)?;
        if !full_path.is_file() {
            return Err(AssistantError::NotFound { path: full_path });
        }
        let content =
            fs::read_to_string(&full_path).map_err(|e| AssistantError::io(&full_path, e))?;

        println!("{} Editing {}", "📝", key.bold());
        println!("Instructions: {instructions}");
        println!("{}", output::format_numbered(&content));
        println!("\nEdit options:");
        println!("  1. Replace a line");
        println!("  2. Add new lines");
        println!("  3. Delete lines");
        println!("  4. Cancel");

        let choice = self.ask("Choose an option (1-4): ")?;
        let edit = match parse_number(&choice, "option")? {
            1 => {
                let line = self.ask("Line number to replace: ")?;
                let line = parse_number(&line, "line number")?;
                let text = self.ask("New content: ")?;
                LineEdit::Replace { line, text }
            }
            2 => {
                let after = self.ask("Add after line number (0 for beginning): ")?;
                let after = parse_number(&after, "line number")?;
                println!("Enter new lines (empty line to finish):");
                let lines = self.read_block("")?;
                LineEdit::InsertAfter { after, lines }
            }
            3 => {
                let start = self.ask("Start line: ")?;
                let start = parse_number(&start, "line number")?;
                let end = self.ask("End line: ")?;
                let end = parse_number(&end, "line number")?;
                LineEdit::Delete { start, end }
            }
            4 => {
                println!("Edit cancelled");
                return Ok(());
            }
            other => {
                return Err(AssistantError::validation(format!(
                    "Invalid option {other}: choose 1-4"
                )))
            }
        };

        let outcome = self.index.apply_edit(&key, &edit)?;
        println!("{}", output::format_diff(&outcome.diff));
        println!(
            "{} {} ({}, {} -> {} lines)",
            "✓".green(),
            format!("Updated {}", outcome.path).green(),
            edit.describe(),
            outcome.old_content.split('\n').count(),
            outcome.new_content.split('\n').count()
        );
        Ok(())
    }

    fn create_file(&mut self) -> Result<()> {
        let path = self.ask("Enter file path (relative to project root): ")?;
        let path = path.trim().to_string();
        if path.is_empty() {
            return Err(AssistantError::validation("File path cannot be empty"));
        }

        let (full_path, _) = self.index.resolve(&path)?;
        if full_path.exists() {
            let answer = self.ask(&format!("File {path} already exists. Overwrite? (yes/no): "))?;
            if !matches!(answer.trim().to_lowercase().as_str(), "yes" | "y") {
                println!("File creation cancelled");
                return Ok(());
            }
        }

        println!("Enter file content (type 'EOF' on a new line to finish):");
        let content = self.read_block("EOF")?.join("\n");

        let outcome = self.index.create_file(&path, &content)?;
        println!(
            "{} Created {} ({})",
            "✓".green(),
            outcome.path.bold(),
            outcome.language.as_str()
        );
        if !outcome.indexed {
            println!(
                "{} Unrecognized file type; {} was not added to the index",
                "→".cyan(),
                outcome.path
            );
        }
        Ok(())
    }
}
