//! Bulk loading of documents from JSON and JSONL files.

use crate::document::{DocId, DocumentStatus};
use crate::index::SearchEngine;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

/// Loads every `.json`/`.jsonl` file at `path` (a file, or a directory walked recursively).
/// Returns the number of documents added.
///
/// JSONL lines that do not parse as a document are logged and skipped. A
/// document the engine rejects aborts the load with its file and line.
pub fn load_documents(engine: &mut SearchEngine, path: &Path) -> Result<usize> {
    let mut added = 0;
    for file in collect_input_files(path)? {
        let n = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            load_jsonl(engine, &file)?
        } else {
            load_json(engine, &file)?
        };
        tracing::info!(file = %file.display(), documents = n, "loaded input file");
        added += n;
    }
    Ok(added)
}

pub fn collect_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("input path {} does not exist", path.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    Ok(files)
}

fn load_jsonl(engine: &mut SearchEngine, file: &Path) -> Result<usize> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let mut added = 0;
    for (line_no, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(file = %file.display(), line = line_no + 1, error = %err, "skipping malformed document");
                continue;
            }
        };
        add(engine, doc).with_context(|| format!("{}:{}", file.display(), line_no + 1))?;
        added += 1;
    }
    Ok(added)
}

fn load_json(engine: &mut SearchEngine, file: &Path) -> Result<usize> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing {}", file.display()))?;
    let docs: Vec<InputDoc> = match json {
        serde_json::Value::Array(_) => serde_json::from_value(json)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => {
            tracing::warn!(file = %file.display(), "skipping file without document objects");
            Vec::new()
        }
    };
    let n = docs.len();
    for doc in docs {
        add(engine, doc).with_context(|| file.display().to_string())?;
    }
    Ok(n)
}

fn add(engine: &mut SearchEngine, doc: InputDoc) -> Result<()> {
    engine.add_document(doc.id, &doc.text, doc.status, &doc.ratings)?;
    Ok(())
}
