use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::dirs::DirectoryAllocator;
use crate::error::{Error, Result};
use crate::json::{CONFIG_FILE, RootDocs};
use crate::model::{OBJECT_STATES, TextField, token_to_path};

/// Mismatches between a skeleton's references and the asset files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub referenced: usize,
    /// Asset files no reference points at.
    pub orphaned: Vec<PathBuf>,
    /// References whose file is missing.
    pub dangling: Vec<PathBuf>,
    /// Files referenced more than once.
    pub shared: Vec<PathBuf>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.dangling.is_empty() && self.shared.is_empty()
    }
}

/// Checks that every asset under `root` is referenced exactly once by its
/// `config.json`, and that every reference resolves.
pub fn audit_root(root: &Path) -> Result<AuditReport> {
    let skeleton = RootDocs::new(root).read_doc(CONFIG_FILE)?;
    let mut refs = BTreeMap::new();
    collect_refs(&skeleton, &mut refs)?;

    let dirs = DirectoryAllocator::new(root);
    let mut assets = Vec::new();
    collect_assets(&dirs, Path::new(""), &mut assets)?;

    let mut report = AuditReport {
        referenced: refs.len(),
        ..Default::default()
    };
    for (path, count) in &refs {
        if *count > 1 {
            report.shared.push(path.clone());
        }
        if !root.join(path).is_file() {
            report.dangling.push(path.clone());
        }
    }
    report.orphaned = assets
        .into_iter()
        .filter(|p| !refs.contains_key(p))
        .collect();
    if !report.is_clean() {
        log::warn!(
            "{}: {} orphaned, {} dangling, {} shared",
            root.display(),
            report.orphaned.len(),
            report.dangling.len(),
            report.shared.len()
        );
    }
    Ok(report)
}

fn collect_refs(node: &Value, refs: &mut BTreeMap<PathBuf, usize>) -> Result<()> {
    let Some(obj) = node.as_object() else {
        return Ok(());
    };
    for field in TextField::ALL {
        if let Some(reference) = obj.get(field.path_key()) {
            let path = reference_path(obj, field, reference)?;
            *refs.entry(path).or_default() += 1;
        }
    }
    if let Some(Value::Array(items)) = obj.get(OBJECT_STATES) {
        for item in items {
            collect_refs(item, refs)?;
        }
    }
    Ok(())
}

fn reference_path(obj: &Map<String, Value>, field: TextField, reference: &Value) -> Result<PathBuf> {
    let malformed = |message: String| Error::MalformedSkeleton {
        node: obj
            .get("GUID")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string(),
        message,
    };
    let token = reference
        .as_str()
        .ok_or_else(|| malformed(format!("{} is not a string", field.path_key())))?;
    token_to_path(token).map_err(malformed)
}

fn collect_assets(dirs: &DirectoryAllocator, rel: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let (files, folders) = dirs.list_entries(rel)?;
    out.extend(files.into_iter().filter(|f| {
        f.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| TextField::ALL.iter().any(|field| field.file_name() == n))
    }));
    for folder in folders {
        collect_assets(dirs, &folder, out)?;
    }
    Ok(())
}
