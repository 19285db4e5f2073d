//! Input file sets.
//!
//! A run analyses one or more labelled sets of files. Plain file lists form a
//! single set; in directory mode every directory becomes a set named after it.

use std::fs;
use std::path::{Path, PathBuf};

use es_core::{Error, Result};

/// Files analysed together into one histogram set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    /// Display label.
    pub label: String,
    /// Files in analysis order.
    pub files: Vec<PathBuf>,
}

impl FileSet {
    /// Set of explicitly listed files, kept in the given order.
    pub fn from_files(label: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self { label: label.into(), files }
    }

    /// Regular files directly inside `dir`, sorted by path, labelled with the
    /// directory's base name. Hidden files and subdirectories are skipped.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let open_err = |source| Error::Open { path: dir.to_path_buf(), source };
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(open_err)? {
            let entry = entry.map_err(open_err)?;
            let ft = entry.file_type().map_err(open_err)?;
            let path = entry.path();
            if ft.is_file()
                && let Some(name) = path.file_name().and_then(|s| s.to_str())
                && !name.starts_with('.')
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(Self { label: dir_label(dir), files })
    }
}

/// Build file sets from command-line inputs.
///
/// With `dirs` unset all inputs are files of one set labelled `label`;
/// otherwise each input is a directory and yields its own set.
pub fn collect_sets(inputs: &[PathBuf], dirs: bool, label: &str) -> Result<Vec<FileSet>> {
    if inputs.is_empty() {
        return Err(Error::Validation("no input files given".into()));
    }
    if !dirs {
        return Ok(vec![FileSet::from_files(label, inputs.to_vec())]);
    }
    inputs.iter().map(|d| FileSet::from_dir(d)).collect()
}

fn dir_label(dir: &Path) -> String {
    // `Path::file_name` is None for "." and "..", fall back to the full path.
    match dir.file_name().and_then(|s| s.to_str()) {
        Some(name) => name.to_string(),
        None => dir.display().to_string(),
    }
}
