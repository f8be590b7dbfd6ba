use crate::backup::archive::tarball::TarArchiver;
use crate::backup::compress::CompressorConfig;
use crate::backup::destination::{DestinationConfig, DestinationWriter};
use crate::backup::dump::{DatabaseConfig, DatabaseDumper};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use crate::backup::run_config::{BackupRunConfig, CleanupPolicy};
use crate::backup::select::walkdir_globset::PathSelection;
use crate::backup::validate::validate_dir_if_exists;
use bon::Builder;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Backup job as declared in the YAML configuration file.
#[skip_serializing_none]
#[derive(Clone, Serialize, Deserialize, Debug, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct BackupConfig {
    /// Root under which the run keeps its workspace directory
    #[validate(custom(function = validate_dir_if_exists))]
    #[builder(into)]
    temp_dir: PathBuf,
    #[serde(default)]
    #[builder(default)]
    cleanup: CleanupPolicy,
    #[serde(default)]
    #[builder(default)]
    compressor: CompressorConfig,
    files: Option<PathSelection>,
    #[serde(default)]
    #[builder(default)]
    databases: Vec<DatabaseConfig>,
    #[serde(default)]
    #[builder(default)]
    destinations: Vec<DestinationConfig>,
}

impl BackupConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(Error::from)
            .add_msg(format!("Opening config {path:?} failed"))?;
        serde_yml::from_reader(file)
            .map_err(Error::from)
            .add_msg(format!("Parse YAML config failed: {path:?}"))
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Validates this config and every nested section, reporting the first
    /// invalid one.
    pub fn validate_all(&self) -> Result<()> {
        self.validate()
            .map_err(Error::from)
            .add_msg("Invalid backup config")?;
        self.compressor
            .validate()
            .map_err(Error::from)
            .add_msg("Invalid compressor")?;
        if let Some(files) = &self.files {
            files
                .validate()
                .map_err(Error::from)
                .add_msg("Invalid files selection")?;
        }
        for (i, database) in self.databases.iter().enumerate() {
            database
                .validate()
                .map_err(Error::from)
                .add_msg(format!("Invalid databases[{i}]"))?;
        }
        for (i, destination) in self.destinations.iter().enumerate() {
            destination
                .validate()
                .map_err(Error::from)
                .add_msg(format!("Invalid destinations[{i}]"))?;
        }
        Ok(())
    }

    pub fn run_config(&self) -> BackupRunConfig {
        let config = match &self.files {
            Some(files) => BackupRunConfig::new().with_file_selector(files.clone()),
            None => BackupRunConfig::new().without_filesystem(),
        };

        config
            .with_dumpers(
                self.databases
                    .iter()
                    .map(|d| Box::new(d.clone()) as Box<dyn DatabaseDumper>),
            )
            .with_destinations(
                self.destinations
                    .iter()
                    .map(|d| Box::new(d.clone()) as Box<dyn DestinationWriter>),
            )
            .with_archiver(
                TarArchiver::builder()
                    .compressor(self.compressor.clone())
                    .build(),
            )
            .with_cleanup(self.cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::result_error::error::ErrorKind;
    use tempfile::TempDir;

    fn write_config(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("backup.yml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_parse_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("app.db");
        rusqlite::Connection::open(&db)
            .unwrap()
            .execute_batch("CREATE TABLE t (v TEXT);")
            .unwrap();
        let yaml = format!(
            r#"
temp_dir: {tmp}/work
cleanup: always
compressor:
  compressor_type: xz
  level: 6
files:
  include: ["{tmp}"]
  exclude: ["{tmp}/work"]
databases:
  - type: sqlite
    name: app
    path: {db}
destinations:
  - type: local_dir
    dir: {tmp}/remote
"#,
            tmp = temp_dir.path().display(),
            db = db.display()
        );

        let config = BackupConfig::from_yaml_file(write_config(temp_dir.path(), &yaml)).unwrap();
        config.validate_all().unwrap();
        assert_eq!(config.cleanup(), &CleanupPolicy::Always);
        assert_eq!(config.databases().len(), 1);

        let run_config = config.run_config();
        assert_eq!(run_config.cleanup(), CleanupPolicy::Always);
        assert_eq!(run_config.archiver().file_ext().as_deref(), Some("tar.xz"));
        assert_eq!(run_config.dumpers()[0].database_name(), "app");
        assert_eq!(run_config.destinations()[0].store_type(), "local");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: BackupConfig = serde_yml::from_str("temp_dir: /tmp/backup-job\n").unwrap();
        config.validate_all().unwrap();

        let run_config = config.run_config();
        assert!(run_config.selector().selected_files().unwrap().is_empty());
        assert!(run_config.dumpers().is_empty());
        assert!(run_config.destinations().is_empty());
        assert_eq!(run_config.cleanup(), CleanupPolicy::OnSuccess);
        assert_eq!(run_config.archiver().file_ext().as_deref(), Some("tar"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_yml::from_str::<BackupConfig>("temp_dir: /tmp\nschedule: daily\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_nested_section_reported() {
        let yaml = r#"
temp_dir: /tmp/backup-job
databases:
  - type: command
    name: "bad/name"
    program: pg_dump
"#;
        let config: BackupConfig = serde_yml::from_str(yaml).unwrap();
        let error = config.validate_all().unwrap_err().to_string();
        assert!(error.contains("Invalid databases[0]"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let error = BackupConfig::from_yaml_file(temp_dir.path().join("missing.yml")).unwrap_err();
        assert!(error.to_string().contains("Opening config"));
        assert_eq!(error.kind(), None::<ErrorKind>);
    }

    #[test]
    fn test_temp_dir_override() {
        let config = BackupConfig::builder()
            .temp_dir("/tmp/a")
            .build()
            .with_temp_dir("/tmp/b");
        assert_eq!(config.temp_dir(), &PathBuf::from("/tmp/b"));
    }
}
