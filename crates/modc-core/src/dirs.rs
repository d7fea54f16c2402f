use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Total names tried per allocation: the bare suggestion plus `_1` ..= `_99`.
pub const MAX_ATTEMPTS: usize = 100;

/// Longest segment `sanitize_segment` produces, leaving room for `_NN`.
pub const MAX_SEGMENT_BYTES: usize = 200;

/// Creates uniquely named subdirectories below a fixed base path.
#[derive(Debug, Clone)]
pub struct DirectoryAllocator {
    base: PathBuf,
    reserved: Vec<String>,
}

impl DirectoryAllocator {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            reserved: Vec::new(),
        }
    }

    /// Names treated as already taken in every directory, compared
    /// ASCII case-insensitively. They still count towards the attempt cap.
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.reserved.iter().any(|r| r.eq_ignore_ascii_case(name))
    }

    /// Creates `parent/suggestion`, or the first free `parent/suggestion_n`,
    /// and returns the name actually used. `parent` is relative to the base
    /// and is created if missing.
    pub fn allocate(&self, parent: &Path, suggestion: &str) -> Result<String> {
        if !is_valid_segment(suggestion) {
            return Err(Error::InvalidDirName {
                name: suggestion.to_string(),
            });
        }
        let parent_abs = self.base.join(parent);
        fs::create_dir_all(&parent_abs).map_err(|e| Error::storage(&parent_abs, e))?;

        for attempt in 0..MAX_ATTEMPTS {
            let name = if attempt == 0 {
                suggestion.to_string()
            } else {
                format!("{}_{}", suggestion, attempt)
            };
            let candidate = parent_abs.join(&name);
            if self.is_reserved(&name) {
                log::debug!("{} is reserved, trying next suffix", candidate.display());
                continue;
            }
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    log::debug!("created {}", candidate.display());
                    return Ok(name);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} taken, trying next suffix", candidate.display());
                }
                Err(e) => return Err(Error::storage(candidate, e)),
            }
        }
        Err(Error::AllocationExhausted {
            parent: parent_abs,
            suggestion: suggestion.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Direct children of `relpath` as `(files, folders)`, each relative to
    /// the base and sorted by name.
    pub fn list_entries(&self, relpath: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let dir = self.base.join(relpath);
        let mut files = Vec::new();
        let mut folders = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                Error::storage(path, io::Error::from(e))
            })?;
            let rel = relpath.join(entry.file_name());
            if entry.file_type().is_dir() {
                folders.push(rel);
            } else {
                files.push(rel);
            }
        }
        Ok((files, folders))
    }
}

fn is_illegal_char(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// True when `name` can be used verbatim as one path segment on any
/// platform we write to.
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.ends_with(['.', ' '])
        && !name.chars().any(is_illegal_char)
}

/// Maps an arbitrary object name to a valid segment of at most
/// [`MAX_SEGMENT_BYTES`], falling back to `fallback` when nothing usable is
/// left.
pub fn sanitize_segment(name: &str, fallback: &str) -> String {
    let mut replaced = String::with_capacity(name.len().min(MAX_SEGMENT_BYTES));
    for c in name.chars().map(|c| if is_illegal_char(c) { '_' } else { c }) {
        if replaced.len() + c.len_utf8() > MAX_SEGMENT_BYTES {
            break;
        }
        replaced.push(c);
    }
    let trimmed = replaced.trim_end_matches(['.', ' ']);
    if is_valid_segment(trimmed) {
        trimmed.to_string()
    } else {
        fallback.to_string()
    }
}
