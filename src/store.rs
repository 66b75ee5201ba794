//! In-memory document store.
//!
//! Loads every matching plain-text file directly inside the configured
//! directory at startup and caches the contents for the process lifetime.
//! The scan is non-recursive and sorted by filename so load order (and
//! therefore retrieval tie-breaking) is deterministic across runs.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DocsConfig;
use crate::models::Document;

/// Cache of documents loaded from a directory.
///
/// Populated once at construction; never mutated afterwards except through
/// the explicit [`DocumentStore::reload`] invalidation hook.
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    include: GlobSet,
    docs: Vec<Document>,
}

impl DocumentStore {
    /// Scan the configured directory and cache one [`Document`] per file.
    ///
    /// A missing directory yields an empty store rather than an error.
    /// Individual unreadable files are skipped with a warning.
    pub fn load(config: &DocsConfig) -> Result<Self> {
        let include = build_globset(&config.include_globs)?;
        let mut store = Self {
            dir: config.dir.clone(),
            include,
            docs: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-scan the directory, replacing the cached documents.
    pub fn reload(&mut self) -> Result<()> {
        self.docs = scan_dir(&self.dir, &self.include);
        Ok(())
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn scan_dir(dir: &Path, include: &GlobSet) -> Vec<Document> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "docs directory not found, starting with an empty store");
        return Vec::new();
    }

    let mut paths = Vec::new();

    // Depth 1: only files directly inside the directory.
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !include.is_match(&name) {
            continue;
        }
        paths.push((name, entry.into_path()));
    }

    // Sort by filename for deterministic load order.
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let mut docs = Vec::with_capacity(paths.len());
    for (name, path) in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => docs.push(Document::new(text)),
            Err(err) => {
                tracing::warn!(file = %name, %err, "skipping unreadable document");
            }
        }
    }

    docs
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
