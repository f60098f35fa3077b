use std::io::ErrorKind;
use std::path::Path;

use crate::prelude::{GrapeError, GrapeResult};

/// Create `path` and its parents. With `clear`, an existing tree is removed first.
pub fn ensure_dir(path: &Path, clear: bool) -> GrapeResult<()> {
    let directory_error = |source| GrapeError::Directory {
        path: path.to_path_buf(),
        source,
    };

    if clear {
        match std::fs::remove_dir_all(path) {
            Ok(()) => log::debug!("cleared {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(directory_error(err)),
        }
    }

    std::fs::create_dir_all(path).map_err(directory_error)?;
    if !path.is_dir() {
        return Err(directory_error(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "path exists and is not a directory",
        )));
    }
    Ok(())
}
