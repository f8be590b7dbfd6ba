//! Validation functions for configuration values.

use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use std::path::{Path, PathBuf};

pub fn validate_file_name<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if name.is_empty() || !is_sanitized(name) {
        return Err(ValidationError::new("InvalidFileName").with_message(
            format!(
                "{name:?} cannot be used as a file name, try sanitizing like {:?}",
                sanitize(name)
            )
            .into(),
        ));
    }

    Ok(())
}

pub fn validate_dir_if_exists<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() && !dir.is_dir() {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} is not a directory", dir).into()));
    }

    Ok(())
}

pub fn validate_file_exist<P: AsRef<Path>>(file: P) -> Result<(), ValidationError> {
    let file = file.as_ref();
    if !file.is_file() {
        return Err(ValidationError::new("InvalidFile")
            .with_message(format!("{:?} not found or not a file", file).into()));
    }

    Ok(())
}

pub fn validate_paths_exist(paths: &Vec<PathBuf>) -> Result<(), ValidationError> {
    match paths.iter().find(|p| !p.exists()) {
        Some(missing) => Err(ValidationError::new("PathNotFound")
            .with_message(format!("{:?} not found", missing).into())),
        None => Ok(()),
    }
}

pub fn validate_program<S: AsRef<str>>(program: S) -> Result<(), ValidationError> {
    if program.as_ref().trim().is_empty() {
        return Err(ValidationError::new("InvalidProgram")
            .with_message("program must not be empty".into()));
    }

    Ok(())
}
