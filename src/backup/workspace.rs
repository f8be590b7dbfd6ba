use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use getset::Getters;
use std::path::{Path, PathBuf};

/// Name of the workspace directory created under a caller supplied root
pub static WORKSPACE_DIR_NAME: &str = "backup-job-temp";

/// Per-run scratch directory holding database dumps and the archive.
///
/// The directory is created on first use. Creating it again is a no-op, so
/// every accessor that hands out a path inside it can ensure it exists.
/// [`remove`](Self::remove) deletes the whole directory, so it must not hold
/// anything the run did not put there.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Workspace at [`WORKSPACE_DIR_NAME`] inside `root`.
    pub fn under<P: Into<PathBuf>>(root: P) -> Self {
        Self::new(root.into().join(WORKSPACE_DIR_NAME))
    }

    pub fn ensure(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.path)
            .map_err(|e| Error::workspace(self.path.clone(), Error::from(e)))?;
        Ok(&self.path)
    }

    /// Path of `file_name` inside the workspace, creating the workspace if needed.
    pub fn file_path<S: AsRef<Path>>(&self, file_name: S) -> Result<PathBuf> {
        Ok(self.ensure()?.join(file_name))
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    pub fn remove(&self) -> Result<()> {
        tracing::debug!("Removing workspace {:?}", self.path);
        match std::fs::remove_dir_all(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::workspace(self.path.clone(), Error::from(e))),
        }
    }
}
