pub mod walkdir_globset;

use crate::backup::result_error::result::Result;
use std::path::PathBuf;

/// Decides which filesystem paths go into the archive.
///
/// Implementations only read the filesystem. For the same configuration and
/// filesystem state they return the same paths in the same order.
pub trait FileSelector {
    fn selected_files(&self) -> Result<Vec<PathBuf>>;
}

/// Selects nothing; used when filesystem backup is disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoFiles;

impl FileSelector for NoFiles {
    fn selected_files(&self) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// A fixed list, returned as is.
impl FileSelector for Vec<PathBuf> {
    fn selected_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_files() {
        assert!(NoFiles.selected_files().unwrap().is_empty());
    }

    #[test]
    fn test_fixed_list_keeps_order() {
        let list = vec![PathBuf::from("b.txt"), PathBuf::from("a.txt")];
        assert_eq!(list.selected_files().unwrap(), list);
    }
}
