//! Whole-file replacement for saved workbooks.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Replace `dest` with `bytes` so that readers see either the previous
/// workbook or the new one, never a partial file.
///
/// Missing parent directories are created. The bytes are staged in a temp
/// file next to `dest`, synced, then renamed over it. Until the rename the
/// destination is untouched; the staged file is removed on any failure.
pub fn replace_file_contents(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = containing_dir(dest);
    fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|err| err.error)?;

    // The new contents are in place at this point.
    if let Err(err) = sync_dir(dir) {
        log::debug!("could not sync directory {}: {err}", dir.display());
    }
    Ok(())
}

/// `Path::parent` is `Some("")` for a bare file name.
fn containing_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
