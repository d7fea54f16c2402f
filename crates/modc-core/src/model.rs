use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::dirs::sanitize_segment;

/// Recursion point: objects placed on the table, or held by a container.
pub const OBJECT_STATES: &str = "ObjectStates";
/// Directory name used when an object has no usable name.
pub const FALLBACK_DIR_NAME: &str = "Object";

/// Embedded text payloads that get moved out into their own files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Script,
    ScriptState,
    XmlUi,
}

impl TextField {
    pub const ALL: [TextField; 3] = [TextField::Script, TextField::ScriptState, TextField::XmlUi];

    /// Key holding the payload inside a save document.
    pub fn key(self) -> &'static str {
        match self {
            TextField::Script => "LuaScript",
            TextField::ScriptState => "LuaScriptState",
            TextField::XmlUi => "XmlUI",
        }
    }

    /// Key holding the asset reference inside a skeleton.
    pub fn path_key(self) -> &'static str {
        match self {
            TextField::Script => "LuaScript_path",
            TextField::ScriptState => "LuaScriptState_path",
            TextField::XmlUi => "XmlUI_path",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            TextField::Script => "script.lua",
            TextField::ScriptState => "script_state.txt",
            TextField::XmlUi => "ui.xml",
        }
    }
}

/// Directory name suggestion for an object: its nickname, else its name,
/// made safe for use as a path segment.
pub fn name_hint(obj: &Map<String, Value>) -> String {
    let raw = ["Nickname", "Name"]
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or(FALLBACK_DIR_NAME);
    sanitize_segment(raw, FALLBACK_DIR_NAME)
}

/// Human readable location of a node, used in error context.
pub(crate) fn child_label(parent: &str, index: usize, hint: &str) -> String {
    if parent.is_empty() {
        format!("{}[{}]({})", OBJECT_STATES, index, hint)
    } else {
        format!("{}/{}[{}]({})", parent, OBJECT_STATES, index, hint)
    }
}

pub(crate) fn display_label(label: &str) -> &str {
    if label.is_empty() { "<root>" } else { label }
}

/// The node's `ObjectStates` children, if present.
pub(crate) fn children<'a>(obj: &'a Map<String, Value>, label: &str) -> Result<Option<&'a Vec<Value>>, String> {
    match obj.get(OBJECT_STATES) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(format!(
            "{} at {} is not an array",
            OBJECT_STATES,
            display_label(label)
        )),
    }
}

/// Reference token for an asset: its path relative to the transcoding root,
/// always `/`-separated.
pub(crate) fn path_to_token(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`path_to_token`]; rejects tokens that would leave the root.
pub(crate) fn token_to_path(token: &str) -> Result<PathBuf, String> {
    if token.is_empty() {
        return Err("empty asset reference".to_string());
    }
    let mut out = PathBuf::new();
    for seg in token.split('/') {
        if seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\') || seg.contains(':') {
            return Err(format!("asset reference {:?} is not a relative path inside the root", token));
        }
        out.push(seg);
    }
    Ok(out)
}
