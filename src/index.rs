use crate::edit::{unified_diff, LineEdit};
use crate::error::{AssistantError, Result};
use crate::indexer::{detect_language, index_file, is_excluded_key, relative_key};
use crate::models::{FileRecord, Language};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    Path(String),
    Line {
        path: String,
        line: usize,
        text: String,
    },
}

impl std::fmt::Display for SearchHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchHit::Path(path) => write!(f, "File: {path}"),
            SearchHit::Line { path, line, text } => write!(f, "{path}:{line}: {text}"),
        }
    }
}

/// Result of a committed edit. The diff is for display only.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub path: String,
    pub old_content: String,
    pub new_content: String,
    pub diff: String,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub path: String,
    pub language: Language,
    /// False when the extension has no language and the file stays out of the index.
    pub indexed: bool,
}

/// In-memory model of the project, keyed by root-relative POSIX path in
/// insertion order. The on-disk files are the source of truth.
pub struct ProjectIndex {
    root: PathBuf,
    files: IndexMap<String, FileRecord>,
}

impl ProjectIndex {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: IndexMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert or replace the record with the same path.
    pub fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    pub fn get(&self, rel_path: &str) -> Option<&FileRecord> {
        self.files.get(rel_path)
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.files.contains_key(rel_path)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Map an operator-supplied path to (absolute path, record key). Absolute
    /// paths must lie under the root; `..` is rejected.
    pub fn resolve(&self, user_path: &str) -> Result<(PathBuf, String)> {
        let trimmed = user_path.trim();
        if trimmed.is_empty() {
            return Err(AssistantError::validation("File path cannot be empty"));
        }

        let candidate = Path::new(trimmed);
        let relative = if candidate.is_absolute() {
            candidate.strip_prefix(&self.root).map_err(|_| {
                AssistantError::validation(format!(
                    "Path is outside the project: {}",
                    candidate.display()
                ))
            })?
        } else {
            candidate
        };

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(AssistantError::validation(format!(
                "Path must stay inside the project: {trimmed}"
            )));
        }

        let key = relative_key(Path::new(""), relative);
        if key.is_empty() {
            return Err(AssistantError::validation(format!(
                "Not a file path: {trimmed}"
            )));
        }
        Ok((self.root.join(relative), key))
    }

    /// Case-insensitive substring search over paths and content lines.
    pub fn find(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for (path, record) in &self.files {
            if path.to_lowercase().contains(&needle) {
                hits.push(SearchHit::Path(path.clone()));
            }

            if !record.content.to_lowercase().contains(&needle) {
                continue;
            }
            for (i, line) in record.content.split('\n').enumerate() {
                if line.to_lowercase().contains(&needle) {
                    hits.push(SearchHit::Line {
                        path: path.clone(),
                        line: i + 1,
                        text: line.trim().to_string(),
                    });
                }
            }
        }

        hits
    }

    /// Indexed files grouped by parent directory (`.` for the root), both
    /// levels sorted.
    pub fn structure(&self) -> BTreeMap<String, Vec<String>> {
        let mut dirs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in self.files.keys() {
            let (dir, name) = match path.rsplit_once('/') {
                Some((dir, name)) => (dir.to_string(), name.to_string()),
                None => (".".to_string(), path.clone()),
            };
            dirs.entry(dir).or_default().push(name);
        }
        for names in dirs.values_mut() {
            names.sort();
        }
        dirs
    }

    /// File counts per language, most common first.
    pub fn language_counts(&self) -> Vec<(Language, usize)> {
        let mut counts: BTreeMap<Language, usize> = BTreeMap::new();
        for record in self.files.values() {
            *counts.entry(record.language).or_insert(0) += 1;
        }
        let mut counts: Vec<(Language, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        counts
    }

    /// Apply one line edit to a file on disk, then refresh its record.
    pub fn apply_edit(&mut self, user_path: &str, edit: &LineEdit) -> Result<EditOutcome> {
        let (full_path, key) = self.resolve(user_path)?;
        if !full_path.is_file() {
            return Err(AssistantError::NotFound { path: full_path });
        }

        let old_content =
            fs::read_to_string(&full_path).map_err(|e| AssistantError::io(&full_path, e))?;
        let new_content = edit.apply(&old_content)?;

        write_atomically(&full_path, &new_content)?;
        tracing::info!("{} in {}", edit.describe(), key);

        self.refresh(&key, new_content.clone());

        Ok(EditOutcome {
            diff: unified_diff(&old_content, &new_content),
            path: key,
            old_content,
            new_content,
        })
    }

    /// Write a new file (creating parent directories) and index it when its
    /// extension has a language. An existing file is overwritten.
    pub fn create_file(&mut self, user_path: &str, content: &str) -> Result<CreateOutcome> {
        let (full_path, key) = self.resolve(user_path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| AssistantError::io(parent, e))?;
        }
        write_atomically(&full_path, content)?;
        tracing::info!("created {}", key);

        let language = detect_language(&full_path);
        let indexed = self.refresh(&key, content.to_string());

        Ok(CreateOutcome {
            path: key,
            language,
            indexed,
        })
    }

    /// Replace content and re-derive structure from scratch. Files without a
    /// language, and paths the scanner skips, stay out of the index. Returns
    /// whether a record exists afterwards.
    fn refresh(&mut self, key: &str, content: String) -> bool {
        let language = match self.files.get(key) {
            Some(record) => record.language,
            None if is_excluded_key(key) => return false,
            None => detect_language(Path::new(key)),
        };
        if !language.is_indexable() {
            return false;
        }

        let record = index_file(key, content, language);
        match self.files.get_mut(key) {
            Some(existing) => *existing = record,
            None => {
                self.files.insert(key.to_string(), record);
            }
        }
        true
    }
}

/// Write through a sibling temp file renamed over `path`; on failure the
/// previous file is left as it was.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent).map_err(|e| AssistantError::io(parent, e))?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| AssistantError::io(path, e))?;

    // Temp files are created 0600; keep the mode the target had.
    let permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| AssistantError::io(path, e))?;
    }

    temp.persist(path).map_err(|e| AssistantError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
