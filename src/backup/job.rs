//! The backup pipeline: stage inputs, build one archive, copy it to every
//! destination in order, then drop the workspace.
//!
//! Every step blocks until done and the first failure ends the run. Later
//! dumpers and destinations are not attempted after a failure.

use crate::backup::archive::StagedFile;
use crate::backup::function_path;
use crate::backup::progress::{human_readable_size, Progress, ProgressObserver, TracingObserver};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use crate::backup::run_config::{BackupRunConfig, CleanupPolicy};
use crate::backup::workspace::Workspace;
use chrono::{DateTime, Utc};
use function_name::named;
use sanitize_filename::is_sanitized;
use std::path::{Path, PathBuf};

static TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
static DUMP_FILE_EXT: &str = "sql";

/// Runs backups inside a workspace directory owned by the job.
///
/// The workspace is a dedicated child of the root passed to the constructor;
/// nothing else under the root is touched. At most one run may use a given
/// root at a time.
#[derive(Debug)]
pub struct BackupJob<O: ProgressObserver = TracingObserver> {
    workspace: Workspace,
    observer: O,
}

impl BackupJob<TracingObserver> {
    pub fn with_tracing<P: Into<PathBuf>>(workspace_root: P) -> Self {
        Self::new(workspace_root, TracingObserver)
    }
}

impl<O: ProgressObserver> BackupJob<O> {
    pub fn new<P: Into<PathBuf>>(workspace_root: P, observer: O) -> Self {
        Self {
            workspace: Workspace::under(workspace_root),
            observer,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn run(&self, config: &BackupRunConfig) -> Result<()> {
        self.run_at(config, Utc::now())
    }

    /// Same as [`run`](Self::run) with an explicit start time, which names the archive.
    #[named]
    pub fn run_at(&self, config: &BackupRunConfig, started_at: DateTime<Utc>) -> Result<()> {
        tracing::info!("Starting backup run with {config:?}");
        let error = match self.run_steps(config, started_at) {
            Ok(()) => {
                self.workspace.remove().add_fn_name(function_path!())?;
                tracing::info!("Backup run finished");
                return Ok(());
            }
            Err(e) => e.add_fn_name(function_path!()),
        };

        match config.cleanup() {
            CleanupPolicy::OnSuccess => {
                tracing::warn!(
                    "Backup run failed, leaving workspace {:?} in place",
                    self.workspace.path()
                );
                Err(error)
            }
            CleanupPolicy::Always => match self.workspace.remove() {
                Ok(()) => Err(error),
                Err(cleanup_error) => Err(error.chain(cleanup_error)),
            },
        }
    }

    fn run_steps(&self, config: &BackupRunConfig, started_at: DateTime<Utc>) -> Result<()> {
        self.observer.notify(&Progress::DeterminingFiles);
        let staged = self.stage_inputs(config)?;

        self.observer.notify(&Progress::Archiving {
            count: staged.len(),
        });
        let archive = self.create_archive(config, &staged, started_at)?;

        self.replicate(config, &archive)
    }

    fn stage_inputs(&self, config: &BackupRunConfig) -> Result<Vec<StagedFile>> {
        let mut staged: Vec<StagedFile> = config
            .selector()
            .selected_files()
            .map_err(Error::selection)?
            .into_iter()
            .map(StagedFile::selected)
            .collect();
        tracing::info!("Selected {} files", staged.len());

        for dumper in config.dumpers() {
            let name = dumper.database_name();
            let path = self.dump_path(name)?;
            tracing::info!("Dumping database {name:?} to {path:?}");
            dumper
                .dump_to_file(&path)
                .map_err(|e| Error::dump(name, e))?;
            staged.push(StagedFile::db_dump(path));
        }

        Ok(staged)
    }

    fn dump_path(&self, database_name: &str) -> Result<PathBuf> {
        if database_name.is_empty() || !is_sanitized(database_name) {
            return Err(Error::dump(
                database_name,
                Error::invalid_input(format!(
                    "database name {database_name:?} cannot be used as a file name"
                )),
            ));
        }
        self.workspace
            .file_path(format!("{database_name}.{DUMP_FILE_EXT}"))
    }

    fn create_archive(
        &self,
        config: &BackupRunConfig,
        staged: &[StagedFile],
        started_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let archiver = config.archiver();
        let stem = started_at.format(TIMESTAMP_FORMAT).to_string();
        let file_name = match archiver.file_ext() {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        };
        let path = self.workspace.file_path(file_name)?;

        archiver.create(&path, staged).map_err(Error::archive)?;
        tracing::info!("Created archive {path:?}");
        Ok(path)
    }

    fn replicate(&self, config: &BackupRunConfig, archive: &Path) -> Result<()> {
        for destination in config.destinations() {
            let store_type = destination.store_type();
            let size = std::fs::metadata(archive)
                .map_err(|e| Error::destination_write(store_type, Error::from(e)))?
                .len();
            self.observer.notify(&Progress::Copying {
                size: human_readable_size(size),
                store_type: store_type.to_string(),
            });
            destination
                .write(archive)
                .map_err(|e| Error::destination_write(store_type, e))?;
        }
        Ok(())
    }
}
