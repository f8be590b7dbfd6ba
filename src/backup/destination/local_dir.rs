use crate::backup::destination::DestinationWriter;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::validate::validate_dir_if_exists;
use bon::Builder;
use function_name::named;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use validator::Validate;

static DEFAULT_STORE_TYPE: &str = "local";

/// Copies the archive into a directory, e.g. a mounted network share.
///
/// The copy is written to a temporary file inside `dir` and renamed into place,
/// so a partially written archive never shows up under its final name.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct LocalDirDestination {
    #[validate(custom(function = validate_dir_if_exists))]
    #[builder(into)]
    dir: PathBuf,
    #[builder(into)]
    label: Option<String>,
}

impl DestinationWriter for LocalDirDestination {
    fn store_type(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_STORE_TYPE)
    }

    #[named]
    fn write(&self, local_path: &Path) -> Result<()> {
        let file_name = local_path.file_name().ok_or_else(|| {
            Error::invalid_input(format!("{local_path:?} has no file name"))
                .add_fn_name(function_path!())
        })?;
        let target = self.dir.join(file_name);
        tracing::info!("Copying {:?} to {:?}", local_path, target);

        std::fs::create_dir_all(&self.dir)
            .map_err(Error::from)
            .add_msg(format!("Creating destination directory {:?} failed", self.dir))
            .add_fn_name(function_path!())?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        let mut src = File::open(local_path)?;
        let copied = std::io::copy(&mut src, &mut tmp)
            .map_err(Error::from)
            .add_msg(format!("Copying {local_path:?} failed"))
            .add_fn_name(function_path!())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target)
            .map_err(|e| Error::from(e.error))
            .add_msg(format!("Moving copy into {target:?} failed"))
            .add_fn_name(function_path!())?;

        tracing::debug!("Copied {copied} bytes to {:?}", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_type_label() {
        let destination = LocalDirDestination::builder().dir("/mnt/backups").build();
        assert_eq!(destination.store_type(), "local");

        let destination = LocalDirDestination::builder()
            .dir("/mnt/nas")
            .label("nas")
            .build();
        assert_eq!(destination.store_type(), "nas");
    }

    #[test]
    fn test_write_creates_dir_and_copies() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("20240102030405.tar");
        std::fs::write(&archive, "archive bytes").unwrap();
        let target_dir = temp_dir.path().join("remote/nested");

        let destination = LocalDirDestination::builder().dir(&target_dir).build();
        destination.write(&archive).unwrap();

        assert_eq!(
            std::fs::read_to_string(target_dir.join("20240102030405.tar")).unwrap(),
            "archive bytes"
        );
        assert_eq!(std::fs::read_dir(&target_dir).unwrap().count(), 1);
        assert!(archive.is_file());
    }

    #[test]
    fn test_write_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let destination = LocalDirDestination::builder()
            .dir(temp_dir.path().join("remote"))
            .build();

        assert!(destination.write(&temp_dir.path().join("missing.tar")).is_err());
    }

    #[test]
    fn test_dir_that_is_a_file_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();

        let destination = LocalDirDestination::builder().dir(&file).build();
        assert!(destination.validate().is_err());
        assert!(destination.write(&file).is_err());
    }
}
