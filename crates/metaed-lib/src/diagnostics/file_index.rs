//! Maps lines of the concatenated model source back to individual files.
//!
//! Model files are loaded in order and numbered as one continuous text, so
//! source spans carry run-wide line numbers. The index remembers where each
//! file starts and recovers per-file locations for reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::failure::ValidationFailure;

/// Lightweight handle to a file in the index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct FileId(u32);

/// A position inside one model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub file_path: String,
    /// 1-based line within the file.
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path, self.line, self.column)
    }
}

#[derive(Clone, Debug)]
struct FileEntry {
    path: String,
    content: String,
    /// Run-wide line number of the file's first line.
    start_line: u32,
    line_count: u32,
}

/// Registry of loaded model files.
#[derive(Clone, Debug, Default)]
pub struct FileIndex {
    entries: Vec<FileEntry>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file after all previously added files.
    pub fn add_file(&mut self, path: &str, content: &str) -> FileId {
        let start_line = self
            .entries
            .last()
            .map_or(1, |last| last.start_line + last.line_count);
        let line_count = content.lines().count().max(1) as u32;
        let id = FileId(self.entries.len() as u32);
        self.entries.push(FileEntry {
            path: path.to_owned(),
            content: content.to_owned(),
            start_line,
            line_count,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self, id: FileId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|e| e.path.as_str())
    }

    /// Content of the file registered under `path`.
    pub fn content_for(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.content.as_str())
    }

    /// Converts a run-wide line and column into a per-file location.
    pub fn locate(&self, line: u32, column: u32) -> Option<FileLocation> {
        let entry = self
            .entries
            .iter()
            .find(|e| line >= e.start_line && line < e.start_line + e.line_count)?;
        Some(FileLocation {
            file_path: entry.path.clone(),
            line: line - entry.start_line + 1,
            column,
        })
    }
}

/// Backfills `file_map` from `source_map` for every failure that lacks one.
pub fn file_map_for_validation_failure(failures: &mut [ValidationFailure], index: &FileIndex) {
    for failure in failures {
        if failure.file_map.is_some() {
            continue;
        }
        if let Some(span) = &failure.source_map {
            failure.file_map = index.locate(span.line, span.column);
        }
    }
}
