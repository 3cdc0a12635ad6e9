use crate::error::{AssistantError, Result};
use crate::index::ProjectIndex;
use crate::models::{FileRecord, Language};
use crate::parser::extract_structure;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Version-control metadata directories. Hidden entries are skipped anyway;
/// the list keeps the rule explicit for the path check.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub rel_path: String,
    pub content: String,
    pub language: Language,
}

#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<ScannedFile>,
    pub failures: Vec<ScanFailure>,
}

pub fn detect_language(path: &Path) -> Language {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(Language::from_extension)
        .unwrap_or(Language::Unknown)
}

/// Root-relative path with `/` separators, the identity of a record.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn in_vcs_dir(rel_path: &str) -> bool {
    rel_path.split('/').any(|part| VCS_DIRS.contains(&part))
}

/// Whether the scanner would skip this root-relative key: a hidden component
/// or a VCS directory anywhere on the path.
pub fn is_excluded_key(rel_path: &str) -> bool {
    in_vcs_dir(rel_path) || rel_path.split('/').any(|part| part.starts_with('.'))
}

fn read_file_content(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AssistantError::io(path, e))
}

/// Build a record for one file, running the extractor when the language has one.
pub fn index_file(rel_path: &str, content: String, language: Language) -> FileRecord {
    let structure = extract_structure(rel_path, language, &content);
    let mut record = FileRecord::new(rel_path.to_string(), content, language);
    record.set_structure(structure);
    record
}

/// Walk `root` and read every file whose extension is in the language table.
pub fn scan_directory(root: &Path) -> Result<ScanOutcome> {
    if !root.exists() {
        return Err(AssistantError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(AssistantError::validation(format!(
            "Path is not a directory: {}",
            root.display()
        )));
    }

    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| relative_key(root, p))
                    .unwrap_or_default();
                tracing::warn!("skipping unreadable entry {}: {}", path, err);
                outcome.failures.push(ScanFailure {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = relative_key(root, entry.path());
        if in_vcs_dir(&rel_path) {
            continue;
        }

        let language = detect_language(entry.path());
        if !language.is_indexable() {
            continue;
        }

        match read_file_content(entry.path()) {
            Ok(content) => outcome.files.push(ScannedFile {
                rel_path,
                content,
                language,
            }),
            Err(err) => {
                tracing::warn!("skipping {}: {}", rel_path, err);
                let reason = match &err {
                    AssistantError::Io { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                outcome.failures.push(ScanFailure {
                    path: rel_path,
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        "scanned {}: {} files, {} failures",
        root.display(),
        outcome.files.len(),
        outcome.failures.len()
    );
    Ok(outcome)
}

/// Scan `root` and build the index. Failures are returned for the operator.
pub fn index_directory(root: &Path) -> Result<(ProjectIndex, Vec<ScanFailure>)> {
    let outcome = scan_directory(root)?;

    let mut index = ProjectIndex::new(PathBuf::from(root));
    for file in outcome.files {
        index.insert(index_file(&file.rel_path, file.content, file.language));
    }

    tracing::info!("indexed {} files under {}", index.len(), root.display());
    Ok((index, outcome.failures))
}
