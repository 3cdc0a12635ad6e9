use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    Ruby,
    Php,
    Bash,
    Markdown,
    Json,
    Xml,
    Yaml,
    Unknown,
}

/// Extension (without the dot, lowercase) to language. Every component that
/// needs a language tag goes through this table.
const EXTENSION_TABLE: &[(&str, Language)] = &[
    ("py", Language::Python),
    ("js", Language::JavaScript),
    ("ts", Language::TypeScript),
    ("html", Language::Html),
    ("css", Language::Css),
    ("java", Language::Java),
    ("c", Language::C),
    ("h", Language::C),
    ("cpp", Language::Cpp),
    ("hpp", Language::Cpp),
    ("go", Language::Go),
    ("rs", Language::Rust),
    ("rb", Language::Ruby),
    ("php", Language::Php),
    ("sh", Language::Bash),
    ("md", Language::Markdown),
    ("json", Language::Json),
    ("xml", Language::Xml),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
];

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, language)| *language)
            .unwrap_or(Language::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Bash => "bash",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Xml => "xml",
            Language::Yaml => "yaml",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_indexable(&self) -> bool {
        *self != Language::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// 1-based line of the `def`
    pub line: usize,
    pub params: Vec<String>,
    /// Cleaned docstring, empty when the function has none
    pub docstring: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    pub docstring: String,
    pub methods: Vec<FunctionInfo>,
}

/// Structural summary of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub imports: Vec<String>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Root-relative, `/` separated
    pub path: String,
    pub content: String,
    pub language: Language,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
}

impl FileRecord {
    pub fn new(path: String, content: String, language: Language) -> Self {
        Self {
            path,
            content,
            language,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Replace every structural field at once.
    pub fn set_structure(&mut self, structure: Structure) {
        self.imports = structure.imports;
        self.functions = structure.functions;
        self.classes = structure.classes;
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension(".PY"), Language::Python);
        assert_eq!(Language::from_extension("h"), Language::C);
        assert_eq!(Language::from_extension("hpp"), Language::Cpp);
        assert_eq!(Language::from_extension("yml"), Language::Yaml);
        assert_eq!(Language::from_extension("unknownext"), Language::Unknown);
        assert!(!Language::Unknown.is_indexable());
        assert_eq!(Language::Bash.as_str(), "bash");
    }

    #[test]
    fn test_set_structure_replaces_fields() {
        let mut record = FileRecord::new("a.py".into(), String::new(), Language::Python);
        record.imports.push("import stale".into());
        record.set_structure(Structure {
            imports: vec!["import os".into()],
            ..Default::default()
        });
        assert_eq!(record.imports, vec!["import os".to_string()]);
        assert!(record.functions.is_empty());
    }

    #[test]
    fn test_line_count_counts_trailing_segment() {
        let record = FileRecord::new("a.py".into(), "a\nb\n".into(), Language::Python);
        assert_eq!(record.line_count(), 3);
        let empty = FileRecord::new("b.py".into(), String::new(), Language::Python);
        assert_eq!(empty.line_count(), 1);
    }
}
