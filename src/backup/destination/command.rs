use crate::backup::destination::DestinationWriter;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::validate::validate_program;
use bon::Builder;
use function_name::named;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use validator::Validate;

static FILE_PLACEHOLDER: &str = "{file}";

/// Hands the archive to an external upload tool (`rclone`, `aws s3 cp`, `scp`...).
///
/// Every `{file}` in `args` is replaced by the archive path. Without a
/// placeholder the path is appended as the last argument.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct CommandDestination {
    #[validate(length(min = 1))]
    #[builder(into)]
    label: String,
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

impl CommandDestination {
    fn command_args(&self, local_path: &Path) -> Vec<OsString> {
        let file = local_path.as_os_str().to_string_lossy();
        let mut args: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| OsString::from(arg.replace(FILE_PLACEHOLDER, &file)))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(FILE_PLACEHOLDER)) {
            args.push(local_path.as_os_str().to_owned());
        }
        args
    }
}

impl DestinationWriter for CommandDestination {
    fn store_type(&self) -> &str {
        &self.label
    }

    #[named]
    fn write(&self, local_path: &Path) -> Result<()> {
        let args = self.command_args(local_path);
        tracing::info!("Uploading {:?} with {:?} {:?}", local_path, self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .output()
            .map_err(Error::from)
            .add_msg(format!("Executing {:?} failed", self.program))
            .add_fn_name(function_path!())?;
        tracing::debug!("{:?} stdout: {}", self.program, String::from_utf8_lossy(&output.stdout));

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
