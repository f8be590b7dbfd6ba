pub mod tarball;

use crate::backup::file_ext::FileExtProvider;
use crate::backup::result_error::result::Result;
use derive_more::Display;
use getset::Getters;
use std::path::{Component, Path, PathBuf};

/// Directory inside the archive that receives database dumps
pub static DB_DUMP_DIR: &str = "db-dumps";

/// Why a file was staged for the archive.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum FileRole {
    #[display("selected-file")]
    SelectedFile,
    #[display("db-dump")]
    DbDump,
}

/// A path that goes into the archive, tagged with its role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct StagedFile {
    path: PathBuf,
    role: FileRole,
}

impl StagedFile {
    pub fn selected<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            role: FileRole::SelectedFile,
        }
    }

    pub fn db_dump<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            role: FileRole::DbDump,
        }
    }

    /// Relative path the file is stored under inside the archive.
    ///
    /// Selected files keep their path with root and prefix removed and `.`
    /// and `..` resolved lexically. A `..` that would climb above the start
    /// of the path is dropped. Dumps are flattened into [`DB_DUMP_DIR`].
    pub fn archive_name(&self) -> PathBuf {
        match self.role {
            FileRole::SelectedFile => {
                let mut name = PathBuf::new();
                for component in self.path.components() {
                    match component {
                        Component::Normal(part) => name.push(part),
                        Component::ParentDir => {
                            name.pop();
                        }
                        Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                    }
                }
                name
            }
            FileRole::DbDump => {
                let name = self.path.file_name().unwrap_or(self.path.as_os_str());
                Path::new(DB_DUMP_DIR).join(name)
            }
        }
    }
}

/// Packs staged files into a single archive file.
pub trait Archiver: FileExtProvider {
    /// Creates `output` from `inputs`, in order.
    ///
    /// An empty `inputs` still produces a valid, empty archive. Fails when any
    /// input cannot be read.
    fn create(&self, output: &Path, inputs: &[StagedFile]) -> Result<()>;
}
