//! # backup_job
//!
//! One-shot backups of files and databases into a single archive that is
//! then copied to every configured destination.
//!
//! ## Features
//!
//! - **File Selection**: include/exclude paths plus glob filters
//! - **Database Dumps**: SQLite and arbitrary dump commands (`pg_dump`, `mysqldump`...)
//! - **Compression**: tar, optionally XZ (LZMA) compressed
//! - **Destinations**: local directories and external upload commands
//! - **Progress Reporting**: pluggable observer, logged through `tracing` by default
//!
//! ## Quick Start
//!
//! ```no_run
//! use backup_job::backup::backup_config::BackupConfig;
//! use backup_job::backup::job::BackupJob;
//!
//! let config = BackupConfig::from_yaml_file("config.yml")?;
//! config.validate_all()?;
//!
//! BackupJob::with_tracing(config.temp_dir()).run(&config.run_config())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
