use crate::backup::archive::{Archiver, StagedFile};
use crate::backup::compress::{CompressorBuilder, CompressorConfig};
use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use bon::Builder;
use function_name::named;
use getset::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, IntoInnerError};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static TAR_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();

/// Tar archive, optionally compressed. Symlinks are followed.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct TarArchiver {
    #[serde(default)]
    #[builder(default, into)]
    compressor: CompressorConfig,
}

impl FileExtProvider for TarArchiver {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some(
            std::iter::once(TAR_FILE_EXT.get_or_init(|| "tar".into()).clone())
                .chain(self.compressor.file_ext())
                .join(".")
                .into(),
        )
    }
}

impl Archiver for TarArchiver {
    #[named]
    fn create(&self, output: &Path, inputs: &[StagedFile]) -> Result<()> {
        tracing::info!("Writing {} entries to {:?}", inputs.len(), output);
        let file = File::create_new(output)
            .map_err(Error::from)
            .add_msg(format!("Creating archive file {output:?} failed"))
            .add_fn_name(function_path!())?;

        let mut builder = self
            .compressor
            .build_compressor(BufWriter::new(file))
            .map(BufWriter::new)
            .map(::tar::Builder::new)
            .add_fn_name(function_path!())?;
        builder.follow_symlinks(true);

        for input in inputs {
            let name = input.archive_name();
            tracing::debug!("Adding {:?} as {:?}", input.path(), name);
            builder
                .append_path_with_name(input.path(), &name)
                .map_err(Error::from)
                .add_msg(format!("Adding {:?} to archive failed", input.path()))
                .add_fn_name(function_path!())?;
        }

        builder
            .into_inner()?
            .into_inner()
            .map_err(IntoInnerError::into_error)?
            .finish()?
            .into_inner()
            .map_err(IntoInnerError::into_error)?
            .sync_all()?;

        Ok(())
    }
}
