use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const TERMINATOR: char = '\n';

/// Reads text assets from an ordered list of roots and writes them under a
/// single root.
///
/// Files on disk always end in one line terminator: `write` adds it when
/// missing and `read` strips exactly one. Content written with two or more
/// trailing terminators therefore reads back with one fewer.
#[derive(Debug, Clone)]
pub struct TextAssetStore {
    read_roots: Vec<PathBuf>,
    write_root: PathBuf,
}

impl TextAssetStore {
    /// Store reading from and writing to the same root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::with_roots(vec![root.clone()], root)
    }

    pub fn with_roots(read_roots: Vec<PathBuf>, write_root: impl Into<PathBuf>) -> Self {
        Self {
            read_roots,
            write_root: write_root.into(),
        }
    }

    /// Content of `name` from the first read root that has it.
    pub fn read(&self, name: &Path) -> Result<String> {
        for root in &self.read_roots {
            let p = root.join(name);
            let mut content = match fs::read_to_string(&p) {
                Ok(s) => s,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::storage(p, e)),
            };
            if content.ends_with(TERMINATOR) {
                content.pop();
            }
            log::debug!("read {}", p.display());
            return Ok(content);
        }
        Err(Error::NotFound {
            name: name.to_path_buf(),
        })
    }

    /// Writes `content` under the write root, appending a terminator only
    /// if `content` does not already end with one.
    pub fn write(&self, name: &Path, content: &str) -> Result<()> {
        if content.ends_with(TERMINATOR) {
            self.write_raw(name, content.to_string())
        } else {
            self.write_raw(name, format!("{}{}", content, TERMINATOR))
        }
    }

    /// Writes `content` so that `read` returns it byte for byte, whatever
    /// its trailing terminators.
    pub fn write_exact(&self, name: &Path, content: &str) -> Result<()> {
        self.write_raw(name, format!("{}{}", content, TERMINATOR))
    }

    fn write_raw(&self, name: &Path, data: String) -> Result<()> {
        let p = self.write_root.join(name);
        if let Some(dir) = p.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;
        }
        fs::write(&p, data).map_err(|e| Error::storage(&p, e))?;
        log::debug!("wrote {}", p.display());
        Ok(())
    }
}
