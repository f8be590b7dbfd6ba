pub mod command;
pub mod local_dir;

use crate::backup::destination::command::CommandDestination;
use crate::backup::destination::local_dir::LocalDirDestination;
use crate::backup::result_error::result::Result;
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::result;
use validator::{Validate, ValidationErrors};

/// A store that receives a copy of the finished archive.
pub trait DestinationWriter {
    /// Short label of the kind of store, shown in progress messages.
    fn store_type(&self) -> &str;

    /// Copies `local_path` to the store. Failures are returned, never retried.
    fn write(&self, local_path: &Path) -> Result<()>;
}

#[derive(Clone, From, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DestinationConfig {
    LocalDir(LocalDirDestination),
    Command(CommandDestination),
}

impl Validate for DestinationConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            DestinationConfig::LocalDir(inner) => inner.validate(),
            DestinationConfig::Command(inner) => inner.validate(),
        }
    }
}

impl DestinationWriter for DestinationConfig {
    fn store_type(&self) -> &str {
        match self {
            DestinationConfig::LocalDir(inner) => inner.store_type(),
            DestinationConfig::Command(inner) => inner.store_type(),
        }
    }

    fn write(&self, local_path: &Path) -> Result<()> {
        match self {
            DestinationConfig::LocalDir(inner) => inner.write(local_path),
            DestinationConfig::Command(inner) => inner.write(local_path),
        }
    }
}
