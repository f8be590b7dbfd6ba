use crate::backup::result_error::{AddFunctionName, AddMsg};
use derive_more::Display;
use itertools::Itertools;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;
use thiserror_ext::Construct;

/// Pipeline step an error originated from.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[display("selection")]
    Selection,
    #[display("dump")]
    Dump,
    #[display("archive")]
    Archive,
    #[display("destination write")]
    DestinationWrite,
    #[display("workspace")]
    Workspace,
}

#[derive(Error, Debug, Construct)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    LiblzmaStream(#[from] liblzma::stream::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error(transparent)]
    Globset(#[from] globset::Error),
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{program:?} exited with {status}:\n{}", indent::indent_all_with("  ", stderr))]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFunctionName { fn_name: String, error: Box<Error> },
    #[error("File selection failed:\n{}", indent::indent_all_with("  ", .0.to_string()))]
    Selection(Box<Error>),
    #[error("Dump of database {database:?} failed:\n{}", indent::indent_all_with("  ", error.to_string()))]
    Dump { database: String, error: Box<Error> },
    #[error("Archive creation failed:\n{}", indent::indent_all_with("  ", .0.to_string()))]
    Archive(Box<Error>),
    #[error("Write to {store_type}-destination failed:\n{}", indent::indent_all_with("  ", error.to_string()))]
    DestinationWrite { store_type: String, error: Box<Error> },
    #[error("Workspace {path:?} failed:\n{}", indent::indent_all_with("  ", error.to_string()))]
    Workspace { path: PathBuf, error: Box<Error> },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Self::WithFunctionName {
            fn_name: fn_name.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    /// Step the error was raised in, looking through message and function name layers.
    ///
    /// For chained errors the kind of the first one is reported.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Selection(_) => Some(ErrorKind::Selection),
            Error::Dump { .. } => Some(ErrorKind::Dump),
            Error::Archive(_) => Some(ErrorKind::Archive),
            Error::DestinationWrite { .. } => Some(ErrorKind::DestinationWrite),
            Error::Workspace { .. } => Some(ErrorKind::Workspace),
            Error::WithMsg { error, .. } | Error::WithFunctionName { error, .. } => error.kind(),
            Error::LotsOfError(errors) => errors.first().and_then(Error::kind),
            _ => None,
        }
    }

    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(|e| e.into_iter())),
            e => Box::new(std::iter::once(e)),
        }
    }

    pub fn chain(self, other: Error) -> Error {
        Error::LotsOfError(self.into_iter().chain(other.into_iter()).collect_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> Error {
        Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ))
    }

    #[test]
    fn test_error_from_io_error() {
        match not_found() {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_add_msg() {
        match not_found().add_msg("Custom message") {
            Error::WithMsg { msg, .. } => assert_eq!(msg, "Custom message"),
            _ => panic!("Expected WithMsg error"),
        }
    }

    #[test]
    fn test_error_add_fn_name_display() {
        let error_str = not_found().add_fn_name("test_function").to_string();
        assert!(error_str.contains("test_function failed"));
        assert!(error_str.contains("  file not found"));
    }

    #[test]
    fn test_kind_of_plain_error_is_none() {
        assert_eq!(not_found().kind(), None);
    }

    #[test]
    fn test_kind_through_layers() {
        let error = Error::destination_write("local", not_found())
            .add_msg("Replication aborted")
            .add_fn_name("run");
        assert_eq!(error.kind(), Some(ErrorKind::DestinationWrite));

        let error = Error::dump("app", not_found()).add_msg("Staging aborted");
        assert_eq!(error.kind(), Some(ErrorKind::Dump));
    }

    #[test]
    fn test_chain_flattens_and_keeps_first_kind() {
        let first = Error::archive(not_found());
        let second = Error::workspace("/tmp/ws", not_found());
        let third = Error::selection(not_found());

        let chained = first.chain(second).chain(third);
        assert_eq!(chained.kind(), Some(ErrorKind::Archive));
        match chained {
            Error::LotsOfError(errors) => assert_eq!(errors.len(), 3),
            _ => panic!("Expected LotsOfError"),
        }
    }

    #[test]
    fn test_step_error_display() {
        let error_str = Error::dump("app", not_found()).to_string();
        assert!(error_str.contains("Dump of database \"app\" failed"));
        assert!(error_str.contains("file not found"));

        let error_str = Error::destination_write("s3", not_found()).to_string();
        assert!(error_str.starts_with("Write to s3-destination failed"));
    }
}
