use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::json::{CONFIG_FILE, OUTPUT_FILE, RootDocs};
use crate::model::{OBJECT_STATES, TextField, child_label, children, display_label, name_hint, token_to_path};
use crate::text::TextAssetStore;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Searched after the transcoding root, in order, for referenced assets.
    pub extra_read_roots: Vec<PathBuf>,
}

/// Recomposes a save document from a skeleton and its asset tree.
#[derive(Debug, Clone)]
pub struct Builder {
    text: TextAssetStore,
    docs: RootDocs,
}

impl Builder {
    pub fn new(root: impl Into<PathBuf>, opts: BuildOptions) -> Self {
        let root = root.into();
        let mut read_roots = vec![root.clone()];
        read_roots.extend(opts.extra_read_roots);
        Self {
            text: TextAssetStore::with_roots(read_roots, root.clone()),
            docs: RootDocs::new(root),
        }
    }

    /// Substitutes every asset reference in `skeleton` with the asset's text.
    pub fn build(&self, skeleton: &Value) -> Result<Value> {
        let root = skeleton.as_object().ok_or_else(|| Error::MalformedSkeleton {
            node: display_label("").to_string(),
            message: "skeleton is not a JSON object".to_string(),
        })?;
        Ok(Value::Object(self.walk(root, "")?))
    }

    /// Builds from the `config.json` kept under the root.
    pub fn build_from_root(&self) -> Result<Value> {
        let skeleton = self.docs.read_doc(CONFIG_FILE)?;
        self.build(&skeleton)
    }

    /// [`Builder::build_from_root`] followed by writing `output.json`. The
    /// output document is only written once every asset has been read.
    pub fn build_to_root(&self) -> Result<Value> {
        let doc = self.build_from_root()?;
        self.docs.write_doc(OUTPUT_FILE, &doc)?;
        log::info!("built save into {}", self.docs.path_of(OUTPUT_FILE).display());
        Ok(doc)
    }

    fn walk(&self, node: &Map<String, Value>, label: &str) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(node.len());
        for (key, value) in node {
            if let Some(field) = TextField::ALL.iter().find(|f| f.path_key() == key) {
                if node.contains_key(field.key()) {
                    return Err(Error::MalformedSkeleton {
                        node: display_label(label).to_string(),
                        message: format!("both {} and {} are present", field.key(), key),
                    });
                }
                let content = self.inline(value, key, label)?;
                out.insert(field.key().to_string(), Value::String(content));
            } else if key == OBJECT_STATES {
                out.insert(key.clone(), self.walk_children(node, label)?);
            } else {
                out.insert(key.clone(), value.clone());
            }
        }
        Ok(out)
    }

    fn inline(&self, reference: &Value, key: &str, label: &str) -> Result<String> {
        let malformed = |message: String| Error::MalformedSkeleton {
            node: display_label(label).to_string(),
            message,
        };
        let token = reference
            .as_str()
            .ok_or_else(|| malformed(format!("{} is not a string", key)))?;
        let rel = token_to_path(token).map_err(malformed)?;
        self.text.read(&rel)
    }

    fn walk_children(&self, node: &Map<String, Value>, label: &str) -> Result<Value> {
        let items = children(node, label)
            .map_err(|message| Error::MalformedSkeleton {
                node: display_label(label).to_string(),
                message,
            })?
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let child = item.as_object().ok_or_else(|| Error::MalformedSkeleton {
                node: child_label(label, i, "?"),
                message: "object state is not a JSON object".to_string(),
            })?;
            let node = child_label(label, i, &name_hint(child));
            out.push(Value::Object(self.walk(child, &node)?));
        }
        Ok(Value::Array(out))
    }
}
