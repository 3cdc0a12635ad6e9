pub mod python;

use crate::error::Result;
use crate::models::{Language, Structure};

/// Turns source text into a structural summary. Implementations must be pure:
/// the same text always yields the same structure.
pub trait StructureExtractor {
    fn extract(&self, source: &str) -> Result<Structure>;
}

pub fn extractor_for(language: Language) -> Option<Box<dyn StructureExtractor>> {
    match language {
        Language::Python => Some(Box::new(python::PythonExtractor::new())),
        _ => None,
    }
}

/// Best-effort extraction used by indexing and by every mutation.
/// Unsupported languages and unparsable sources both yield an empty structure.
pub fn extract_structure(path: &str, language: Language, source: &str) -> Structure {
    let Some(extractor) = extractor_for(language) else {
        return Structure::default();
    };

    match extractor.extract(source) {
        Ok(structure) => structure,
        Err(err) => {
            tracing::debug!("structure extraction skipped for {}: {}", path, err);
            Structure::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_python_has_an_extractor() {
        assert!(extractor_for(Language::Python).is_some());
        assert!(extractor_for(Language::Rust).is_none());
        assert!(extractor_for(Language::Unknown).is_none());
    }

    #[test]
    fn test_extract_structure_is_best_effort() {
        let broken = extract_structure("bad.py", Language::Python, "def broken(:\n");
        assert_eq!(broken, Structure::default());

        let other = extract_structure("lib.rs", Language::Rust, "fn main() {}");
        assert_eq!(other, Structure::default());

        let ok = extract_structure("ok.py", Language::Python, "import os\n");
        assert_eq!(ok.imports, vec!["import os".to_string()]);
    }
}
