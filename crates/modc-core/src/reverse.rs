use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::dirs::DirectoryAllocator;
use crate::error::{Error, Result};
use crate::json::{CONFIG_FILE, OUTPUT_FILE, RootDocs};
use crate::model::{
    OBJECT_STATES, TextField, child_label, children, display_label, name_hint, path_to_token,
};
use crate::text::TextAssetStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseOptions {
    /// Keep `""` payloads in the skeleton instead of dropping the key.
    /// Neither setting ever writes a zero-length asset file.
    pub keep_empty: bool,
}

/// Splits a save document into a skeleton plus one directory per object
/// holding that object's script, script state and UI markup.
#[derive(Debug, Clone)]
pub struct Reverser {
    dirs: DirectoryAllocator,
    text: TextAssetStore,
    docs: RootDocs,
    opts: ReverseOptions,
}

impl Reverser {
    pub fn new(root: impl Into<PathBuf>, opts: ReverseOptions) -> Self {
        let root = root.into();
        Self {
            // Object folders share a directory with that node's asset files
            // and, at the root, with the top-level documents.
            dirs: DirectoryAllocator::new(root.clone()).with_reserved(
                TextField::ALL
                    .iter()
                    .map(|f| f.file_name())
                    .chain([CONFIG_FILE, OUTPUT_FILE]),
            ),
            text: TextAssetStore::new(root.clone()),
            docs: RootDocs::new(root),
            opts,
        }
    }

    /// Writes every asset of `doc` and returns the skeleton. Nothing is
    /// persisted for the skeleton itself; see [`Reverser::reverse_to_root`].
    pub fn reverse(&self, doc: &Value) -> Result<Value> {
        let root = doc.as_object().ok_or_else(|| Error::MalformedDocument {
            node: display_label("").to_string(),
            message: "save document is not a JSON object".to_string(),
        })?;
        let skeleton = self.walk(root, Path::new(""), "")?;
        Ok(Value::Object(skeleton))
    }

    /// [`Reverser::reverse`] followed by writing the skeleton as `config.json`.
    pub fn reverse_to_root(&self, doc: &Value) -> Result<Value> {
        let skeleton = self.reverse(doc)?;
        self.docs.write_doc(CONFIG_FILE, &skeleton)?;
        log::info!(
            "reversed save into {}",
            self.docs.path_of(CONFIG_FILE).display()
        );
        Ok(skeleton)
    }

    fn walk(&self, node: &Map<String, Value>, dir: &Path, label: &str) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(node.len());
        for (key, value) in node {
            if let Some(field) = TextField::ALL.iter().find(|f| f.key() == key) {
                self.externalize(*field, value, dir, label, &mut out)?;
            } else if key == OBJECT_STATES {
                out.insert(key.clone(), self.walk_children(node, dir, label)?);
            } else if TextField::ALL.iter().any(|f| f.path_key() == key) {
                return Err(Error::MalformedDocument {
                    node: display_label(label).to_string(),
                    message: format!("key {:?} is reserved for asset references", key),
                });
            } else {
                out.insert(key.clone(), value.clone());
            }
        }
        Ok(out)
    }

    fn externalize(
        &self,
        field: TextField,
        value: &Value,
        dir: &Path,
        label: &str,
        out: &mut Map<String, Value>,
    ) -> Result<()> {
        match value {
            Value::String(s) if s.is_empty() => {
                if self.opts.keep_empty {
                    out.insert(field.key().to_string(), value.clone());
                }
            }
            Value::String(s) => {
                let rel = dir.join(field.file_name());
                self.text.write_exact(&rel, s)?;
                out.insert(field.path_key().to_string(), Value::String(path_to_token(&rel)));
            }
            Value::Null => {
                out.insert(field.key().to_string(), Value::Null);
            }
            other => {
                log::warn!(
                    "{} at {} is not a string; copying it unchanged",
                    field.key(),
                    display_label(label)
                );
                out.insert(field.key().to_string(), other.clone());
            }
        }
        Ok(())
    }

    fn walk_children(&self, node: &Map<String, Value>, dir: &Path, label: &str) -> Result<Value> {
        let items = children(node, label)
            .map_err(|message| Error::MalformedDocument {
                node: display_label(label).to_string(),
                message,
            })?
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let child = item.as_object().ok_or_else(|| Error::MalformedDocument {
                node: child_label(label, i, "?"),
                message: "object state is not a JSON object".to_string(),
            })?;
            let hint = name_hint(child);
            let node = child_label(label, i, &hint);
            let name = self.dirs.allocate(dir, &hint)?;
            log::debug!("{} -> {}", node, dir.join(&name).display());
            out.push(Value::Object(self.walk(child, &dir.join(&name), &node)?));
        }
        Ok(Value::Array(out))
    }
}
