pub mod command;
pub mod sqlite;

use crate::backup::dump::command::CommandDumper;
use crate::backup::dump::sqlite::SqliteDumper;
use crate::backup::result_error::result::Result;
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::result;
use validator::{Validate, ValidationErrors};

/// Produces a database snapshot file on demand.
pub trait DatabaseDumper {
    /// Logical name of the database. The dump file is named after it.
    fn database_name(&self) -> &str;

    /// Writes a complete dump to `path`, blocking until it is done.
    fn dump_to_file(&self, path: &Path) -> Result<()>;
}

/// Database sources that can be declared in the configuration file
#[derive(Clone, From, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// SQL text dump of a SQLite database file
    Sqlite(SqliteDumper),
    /// Output of an external dump program such as `pg_dump` or `mysqldump`
    Command(CommandDumper),
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            DatabaseConfig::Sqlite(inner) => inner.validate(),
            DatabaseConfig::Command(inner) => inner.validate(),
        }
    }
}

impl DatabaseDumper for DatabaseConfig {
    fn database_name(&self) -> &str {
        match self {
            DatabaseConfig::Sqlite(inner) => inner.database_name(),
            DatabaseConfig::Command(inner) => inner.database_name(),
        }
    }

    fn dump_to_file(&self, path: &Path) -> Result<()> {
        match self {
            DatabaseConfig::Sqlite(inner) => inner.dump_to_file(path),
            DatabaseConfig::Command(inner) => inner.dump_to_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_configs() {
        let yaml = r#"
- type: sqlite
  name: app
  path: /srv/app/app.db
- type: command
  name: shop
  program: pg_dump
  args: ["--no-owner", "shop"]
"#;
        let configs: Vec<DatabaseConfig> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].database_name(), "app");
        assert!(matches!(configs[0], DatabaseConfig::Sqlite(_)));
        assert_eq!(configs[1].database_name(), "shop");
        assert!(matches!(configs[1], DatabaseConfig::Command(_)));
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let yaml = "type: command\nname: shop\nprogram: pg_dump\nhost: db\n";
        assert!(serde_yml::from_str::<DatabaseConfig>(yaml).is_err());
    }
}
