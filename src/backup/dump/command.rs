use crate::backup::dump::DatabaseDumper;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::validate::{validate_file_name, validate_program};
use bon::Builder;
use function_name::named;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use validator::Validate;

/// Runs an external dump program and stores its stdout as the dump file.
///
/// Credentials are usually passed through `env`, e.g. `PGPASSWORD` for
/// `pg_dump` or `MYSQL_PWD` for `mysqldump`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct CommandDumper {
    #[validate(custom(function = validate_file_name))]
    #[builder(into)]
    name: String,
    #[validate(custom(function = validate_program))]
    #[builder(into)]
    program: String,
    #[serde(default)]
    #[builder(default, into)]
    args: Vec<String>,
    #[serde(default, skip_serializing)]
    #[builder(default, into)]
    env: BTreeMap<String, String>,
}

impl DatabaseDumper for CommandDumper {
    fn database_name(&self) -> &str {
        &self.name
    }

    #[named]
    fn dump_to_file(&self, path: &Path) -> Result<()> {
        tracing::info!(
            "Dumping database {:?} with {:?} {:?}",
            self.name,
            self.program,
            self.args
        );
        let out = File::create(path)
            .map_err(Error::from)
            .add_msg(format!("Creating dump file {path:?} failed"))
            .add_fn_name(function_path!())?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::piped())
            .output()
            .map_err(Error::from)
            .add_msg(format!("Executing {:?} failed", self.program))
            .add_fn_name(function_path!())?;

        if !output.status.success() {
            return Err(Error::command_failed(
                self.program.clone(),
                output.status,
                String::from_utf8_lossy(&output.stderr),
            )
            .add_fn_name(function_path!()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validation() {
        let dumper = CommandDumper::builder().name("shop").program("pg_dump").build();
        assert!(dumper.validate().is_ok());

        let dumper = CommandDumper::builder().name("a/b").program("pg_dump").build();
        assert!(dumper.validate().is_err());

        let dumper = CommandDumper::builder().name("shop").program("").build();
        assert!(dumper.validate().is_err());
    }

    #[test]
    fn test_env_is_not_serialized() {
        let dumper = CommandDumper::builder()
            .name("shop")
            .program("pg_dump")
            .env(BTreeMap::from([("PGPASSWORD".to_string(), "secret".to_string())]))
            .build();
        let serialized = serde_json::to_string(&dumper).unwrap();
        assert!(!serialized.contains("secret"));
    }

    #[test]
    #[cfg(unix)]
    fn test_stdout_becomes_dump_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("shop.sql");
        let dumper = CommandDumper::builder()
            .name("shop")
            .program("sh")
            .args(vec!["-c".to_string(), "printf 'CREATE TABLE %s;' \"$TABLE\"".to_string()])
            .env(BTreeMap::from([("TABLE".to_string(), "orders".to_string())]))
            .build();

        dumper.dump_to_file(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "CREATE TABLE orders;");
    }

    #[test]
    #[cfg(unix)]
    fn test_non_zero_exit_reports_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let dumper = CommandDumper::builder()
            .name("shop")
            .program("sh")
            .args(vec!["-c".to_string(), "echo 'access denied' >&2; exit 3".to_string()])
            .build();

        let error = dumper
            .dump_to_file(&temp_dir.path().join("shop.sql"))
            .unwrap_err()
            .to_string();
        assert!(error.contains("access denied"));
        assert!(error.contains("\"sh\""));
    }

    #[test]
    fn test_missing_program_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dumper = CommandDumper::builder()
            .name("shop")
            .program("definitely-not-a-dump-program")
            .build();

        assert!(dumper.dump_to_file(&temp_dir.path().join("shop.sql")).is_err());
    }
}
