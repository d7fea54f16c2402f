//! modc-core: reverse a tabletop save document into an editable mod tree,
//! and build the tree back into a save.
//!
//! This crate focuses on a small, well-factored surface:
//! - Collision-safe directory allocation and trailing-newline text assets
//! - Reverse: save JSON → `config.json` skeleton + per-object asset folders
//! - Build: skeleton + asset folders → save JSON
//! - Audit of skeleton references against files on disk, and zip backups
//!
pub mod audit;
pub mod backup;
pub mod builder;
pub mod dirs;
pub mod error;
pub mod json;
pub mod model;
pub mod reverse;
pub mod text;

pub use audit::{AuditReport, audit_root};
pub use backup::{is_fresh_root, replace_with_backup, zip_backup_tree};
pub use builder::{BuildOptions, Builder};
pub use dirs::{DirectoryAllocator, MAX_ATTEMPTS};
pub use error::{Error, Result};
pub use json::{CONFIG_FILE, OUTPUT_FILE, RootDocs, read_json_file, write_json_file};
pub use model::TextField;
pub use reverse::{ReverseOptions, Reverser};
pub use text::TextAssetStore;
