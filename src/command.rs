use crate::error::{AssistantError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Find(String),
    Fix(String),
    Run(String),
    Edit { path: String, instructions: String },
    Analyze(String),
    Help,
    Exit,
    /// Free text, routed by keyword.
    Freeform(Intent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    FindBugs,
    CreateFile,
    ShowStructure,
    Unknown,
}

impl Intent {
    pub fn sniff(request: &str) -> Self {
        let lower = request.to_lowercase();
        if ["bug", "error", "fix"].iter().any(|k| lower.contains(k)) {
            Intent::FindBugs
        } else if lower.contains("create") || lower.contains("new file") {
            Intent::CreateFile
        } else if lower.contains("structure") || lower.contains("overview") {
            Intent::ShowStructure
        } else {
            Intent::Unknown
        }
    }
}

fn required(arg: &str, usage: &str) -> Result<String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(AssistantError::validation(format!("Usage: {usage}")));
    }
    Ok(arg.to_string())
}

impl Command {
    /// Keywords are case-sensitive and must be followed by a space; `help`,
    /// `exit` and `quit` are matched case-insensitively.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim_start();
        let lower = input.trim_end().to_lowercase();
        if lower == "exit" || lower == "quit" {
            return Ok(Command::Exit);
        }
        if lower == "help" {
            return Ok(Command::Help);
        }

        if let Some(query) = input.strip_prefix("find ") {
            return Ok(Command::Find(required(query, "find <query>")?));
        }
        if let Some(path) = input.strip_prefix("fix ") {
            return Ok(Command::Fix(required(path, "fix <file_path>")?));
        }
        if let Some(command) = input.strip_prefix("run ") {
            return Ok(Command::Run(required(command, "run <command>")?));
        }
        if let Some(rest) = input.strip_prefix("edit ") {
            return match rest.trim().split_once(' ') {
                Some((path, instructions)) if !instructions.trim().is_empty() => Ok(Command::Edit {
                    path: path.to_string(),
                    instructions: instructions.trim().to_string(),
                }),
                _ => Err(AssistantError::validation(
                    "Usage: edit <file_path> <instructions>",
                )),
            };
        }
        if let Some(path) = input.strip_prefix("analyze ") {
            return Ok(Command::Analyze(required(path, "analyze <file_path>")?));
        }

        Ok(Command::Freeform(Intent::sniff(input.trim_end())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("find Foo Bar").unwrap(),
            Command::Find("Foo Bar".into())
        );
        assert_eq!(
            Command::parse("fix src/app.py").unwrap(),
            Command::Fix("src/app.py".into())
        );
        assert_eq!(
            Command::parse("run ls -la").unwrap(),
            Command::Run("ls -la".into())
        );
        assert_eq!(
            Command::parse("edit a.py rename the helper").unwrap(),
            Command::Edit {
                path: "a.py".into(),
                instructions: "rename the helper".into(),
            }
        );
        assert_eq!(
            Command::parse("analyze a.py").unwrap(),
            Command::Analyze("a.py".into())
        );
        assert_eq!(Command::parse("HELP").unwrap(), Command::Help);
        assert_eq!(Command::parse("Quit").unwrap(), Command::Exit);
        assert_eq!(Command::parse("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn test_missing_arguments_are_validation_errors() {
        assert!(matches!(
            Command::parse("edit a.py"),
            Err(AssistantError::Validation(_))
        ));
        assert!(matches!(
            Command::parse("find    "),
            Err(AssistantError::Validation(_))
        ));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            Command::parse("Find something").unwrap(),
            Command::Freeform(Intent::Unknown)
        );
    }

    #[test]
    fn test_intent_sniffing() {
        assert_eq!(Intent::sniff("any BUGS here?"), Intent::FindBugs);
        assert_eq!(Intent::sniff("please fix things"), Intent::FindBugs);
        assert_eq!(Intent::sniff("create a module"), Intent::CreateFile);
        assert_eq!(Intent::sniff("I need a new file"), Intent::CreateFile);
        assert_eq!(Intent::sniff("show the overview"), Intent::ShowStructure);
        assert_eq!(Intent::sniff("hello"), Intent::Unknown);
    }
}
