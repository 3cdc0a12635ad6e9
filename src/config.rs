use std::path::PathBuf;

pub const DEFAULT_ANALYZER: &str = "pylint";
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_SCAN_LIMIT: usize = 10;
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings for one assistant session, fixed at startup.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Project root; every operator path is resolved against it.
    pub root: PathBuf,
    /// External analyzer looked up on PATH.
    pub analyzer: String,
    /// Search hits shown before "... and N more".
    pub max_results: usize,
    /// Python files checked by the project-wide bug scan.
    pub scan_limit: usize,
}

impl AssistantConfig {
    #[cfg(test)]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            analyzer: DEFAULT_ANALYZER.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}
