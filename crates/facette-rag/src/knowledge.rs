//! Knowledge-base loading.
//!
//! The knowledge folder holds JSON files, each carrying one technique
//! entry or an array of them. Entries missing a feature, variant, or
//! step list are skipped with a warning; feature and variant are
//! normalized at load time so index filters match retrieval intents.

use facette_core::normalize;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("cannot read knowledge directory {path}: {source}")]
    UnreadableDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One record of the on-disk knowledge base.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub technique: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KnowledgeFile {
    One(KnowledgeEntry),
    Many(Vec<KnowledgeEntry>),
}

/// Load and validate every `*.json` file under `dir`, in path order.
pub fn load_knowledge(dir: &Path) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| KnowledgeError::UnreadableDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths: Vec<_> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable knowledge file");
                continue;
            }
        };
        let file: KnowledgeFile = match serde_json::from_str(&text) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping malformed knowledge file");
                continue;
            }
        };
        let raw = match file {
            KnowledgeFile::One(entry) => vec![entry],
            KnowledgeFile::Many(list) => list,
        };

        for mut entry in raw {
            entry.feature = normalize(&entry.feature);
            entry.variant = normalize(&entry.variant);
            if entry.feature.is_empty() || entry.variant.is_empty() || entry.steps.is_empty() {
                tracing::warn!(
                    path = %path.display(),
                    feature = %entry.feature,
                    variant = %entry.variant,
                    "skipping knowledge entry with missing feature, variant, or steps"
                );
                continue;
            }
            entries.push(entry);
        }
    }

    tracing::info!(count = entries.len(), dir = %dir.display(), "loaded knowledge entries");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_single_and_array_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a_lips.json"),
            r#"{"feature":"Lips","variant":"Full","technique":"overlining","steps":["line outer edge","blend center"]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b_eyes.json"),
            r#"[
                {"feature":"eyes","variant":"almond","technique":"winged liner","steps":["draw wing"]},
                {"feature":"eyes","variant":"round","technique":"smudge","steps":["smudge lash line"]}
            ]"#,
        )
        .unwrap();

        let entries = load_knowledge(dir.path()).unwrap();
        assert_eq!(entries.len(), 3);
        // Normalized at load time, in path order
        assert_eq!(entries[0].feature, "lips");
        assert_eq!(entries[0].variant, "full");
        assert_eq!(entries[1].technique, "winged liner");
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("mixed.json"),
            r#"[
                {"feature":"nose","variant":"rounded","technique":"contour","steps":["shade sides"]},
                {"feature":"nose","variant":"","technique":"contour","steps":["shade sides"]},
                {"feature":"nose","variant":"wide","technique":"contour","steps":[]},
                {"variant":"wide","technique":"contour","steps":["shade sides"]}
            ]"#,
        )
        .unwrap();

        let entries = load_knowledge(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].variant, "rounded");
    }

    #[test]
    fn test_non_json_and_malformed_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not knowledge").unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(
            dir.path().join("ok.json"),
            r#"{"feature":"brows","variant":"soft arch","technique":"brushing","steps":["brush up"]}"#,
        )
        .unwrap();

        let entries = load_knowledge(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].variant, "soft_arch");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(matches!(
            load_knowledge(&missing),
            Err(KnowledgeError::UnreadableDir { .. })
        ));
    }
}
