use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Error, Result};
use crate::model::path_to_token;

/// Zips `dir` into `<dir>_<timestamp>.zip` next to it. `dir` is left as is.
pub fn zip_backup_tree(dir: &Path) -> Result<PathBuf> {
    let dir = canonical_dir(dir)?;
    let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) else {
        return Err(Error::storage(
            &dir,
            io::Error::new(io::ErrorKind::InvalidInput, "cannot back up a filesystem root"),
        ));
    };
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_{}.zip", name.to_string_lossy(), ts));

    let archived = write_zip(&dir, &dest).map_err(|e| Error::storage(&dest, e))?;
    log::info!(
        "backed up {} ({} files) to {}",
        dir.display(),
        archived,
        dest.display()
    );
    Ok(dest)
}

/// Backs `dir` up, then removes it so the next reverse run starts from an
/// empty root. Returns the archive path, or `None` if there was nothing to
/// replace.
pub fn replace_with_backup(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }
    let dir = canonical_dir(dir)?;
    let dest = zip_backup_tree(&dir)?;
    fs::remove_dir_all(&dir).map_err(|e| Error::storage(&dir, e))?;
    Ok(Some(dest))
}

/// True if `dir` is missing or has no entries.
pub fn is_fresh_root(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut rd) => Ok(rd.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(Error::storage(dir, e)),
    }
}

fn canonical_dir(dir: &Path) -> Result<PathBuf> {
    let dir = fs::canonicalize(dir).map_err(|e| Error::storage(dir, e))?;
    if !dir.is_dir() {
        return Err(Error::storage(
            &dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    Ok(dir)
}

/// Archives everything below `base` with `/`-separated entry names and
/// returns the number of files written.
fn write_zip(base: &Path, dest: &Path) -> io::Result<usize> {
    let mut zip = zip::ZipWriter::new(fs::File::create(dest)?);
    let dir_opts = FileOptions::default().unix_permissions(0o755);
    let file_opts = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut archived = 0;
    for entry in WalkDir::new(base).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry.path().strip_prefix(base).map_err(io::Error::other)?;
        let name = path_to_token(rel);
        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_opts)?;
            continue;
        }
        zip.start_file(name, file_opts)?;
        io::copy(&mut fs::File::open(entry.path())?, &mut zip)?;
        archived += 1;
    }
    zip.finish()?;
    Ok(archived)
}
