use crate::backup::archive::tarball::TarArchiver;
use crate::backup::archive::Archiver;
use crate::backup::destination::DestinationWriter;
use crate::backup::dump::DatabaseDumper;
use crate::backup::select::{FileSelector, NoFiles};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// When the workspace is removed at the end of a run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Remove only after every destination was written. A failed run leaves
    /// its dumps and archive behind for inspection.
    #[default]
    OnSuccess,
    /// Remove on every exit path, failed runs included.
    Always,
}

/// Everything one backup run works from.
///
/// Built up front by value and then only borrowed by
/// [`BackupJob::run`](crate::backup::job::BackupJob::run), so it cannot change
/// while a run is in progress. The default backs up no files and no databases
/// and copies the resulting empty archive nowhere.
pub struct BackupRunConfig {
    selector: Box<dyn FileSelector>,
    dumpers: Vec<Box<dyn DatabaseDumper>>,
    destinations: Vec<Box<dyn DestinationWriter>>,
    archiver: Box<dyn Archiver>,
    cleanup: CleanupPolicy,
}

impl Default for BackupRunConfig {
    fn default() -> Self {
        Self {
            selector: Box::new(NoFiles),
            dumpers: Vec::new(),
            destinations: Vec::new(),
            archiver: Box::new(TarArchiver::default()),
            cleanup: CleanupPolicy::default(),
        }
    }
}

impl Debug for BackupRunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupRunConfig")
            .field(
                "dumpers",
                &self.dumpers.iter().map(|d| d.database_name()).collect::<Vec<_>>(),
            )
            .field(
                "destinations",
                &self.destinations.iter().map(|d| d.store_type()).collect::<Vec<_>>(),
            )
            .field("archive_ext", &self.archiver.file_ext())
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}

impl BackupRunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_filesystem(mut self) -> Self {
        self.selector = Box::new(NoFiles);
        self
    }

    pub fn without_databases(mut self) -> Self {
        self.dumpers.clear();
        self
    }

    pub fn with_file_selector<S: FileSelector + 'static>(mut self, selector: S) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Replaces the dumper list. Dumps run in iteration order.
    pub fn with_dumpers<I>(mut self, dumpers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn DatabaseDumper>>,
    {
        self.dumpers = dumpers.into_iter().collect();
        self
    }

    /// Replaces the destination list. Destinations are written in iteration order.
    pub fn with_destinations<I>(mut self, destinations: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn DestinationWriter>>,
    {
        self.destinations = destinations.into_iter().collect();
        self
    }

    pub fn with_archiver<A: Archiver + 'static>(mut self, archiver: A) -> Self {
        self.archiver = Box::new(archiver);
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn selector(&self) -> &dyn FileSelector {
        self.selector.as_ref()
    }

    pub fn dumpers(&self) -> &[Box<dyn DatabaseDumper>] {
        &self.dumpers
    }

    pub fn destinations(&self) -> &[Box<dyn DestinationWriter>] {
        &self.destinations
    }

    pub fn archiver(&self) -> &dyn Archiver {
        self.archiver.as_ref()
    }

    pub fn cleanup(&self) -> CleanupPolicy {
        self.cleanup
    }
}
