use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};

/// Skeleton written by a reverse run.
pub const CONFIG_FILE: &str = "config.json";
/// Recomposed save written by a build run.
pub const OUTPUT_FILE: &str = "output.json";

pub fn parse_json_bytes(path: &Path, data: &[u8]) -> Result<Value> {
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::MalformedDocument {
            node: path.display().to_string(),
            message: "empty file".to_string(),
        });
    }
    serde_json::from_slice(data).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_json_file(path: &Path) -> Result<Value> {
    let data = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound {
            name: path.to_path_buf(),
        },
        _ => Error::storage(path, e),
    })?;
    parse_json_bytes(path, &data)
}

pub fn write_json_file(path: &Path, value: &Value) -> Result<()> {
    let mut s = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    s.push('\n');
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;
    }
    fs::write(path, s).map_err(|e| Error::storage(path, e))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Top-level JSON documents kept directly under a transcoding root.
#[derive(Debug, Clone)]
pub struct RootDocs {
    root: PathBuf,
}

impl RootDocs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn read_doc(&self, name: &str) -> Result<Value> {
        read_json_file(&self.path_of(name))
    }

    pub fn write_doc(&self, name: &str, value: &Value) -> Result<()> {
        write_json_file(&self.path_of(name), value)
    }
}
