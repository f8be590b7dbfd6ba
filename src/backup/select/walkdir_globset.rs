use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::select::FileSelector;
use crate::backup::validate::validate_paths_exist;

use bon::Builder;
use derive_more::{Display, From};
use dyn_iter::{DynIter, IntoDynIterator};
use function_name::named;
use getset::Getters;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use itertools::Itertools;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;
use walkdir::WalkDir;

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::result;

/// Files and directories to back up, minus excluded subtrees.
///
/// Every `include` entry is either a file, taken as is, or a directory that is
/// walked recursively in file name order. Files inside a walked directory are
/// kept when their path relative to that directory matches `globset`.
/// Anything at or below an `exclude` path is skipped. Paths are compared as
/// written, without canonicalization.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct PathSelection {
    #[validate(custom(function = validate_paths_exist))]
    #[builder(into)]
    include: Vec<PathBuf>,
    #[serde(default)]
    #[builder(default, into)]
    exclude: Vec<PathBuf>,
    #[serde(default = "default_globset")]
    #[builder(default = default_globset(), into)]
    globset: Vec<CustomDeserializedGlob>,
    #[serde(default = "default_follow_links")]
    #[builder(default = default_follow_links())]
    follow_links: bool,
}

fn default_globset() -> Vec<CustomDeserializedGlob> {
    vec![CustomDeserializedGlob::default()]
}

fn default_follow_links() -> bool {
    true
}

/// Glob deserialized from a plain string, with `literal_separator` enabled so
/// `*` never crosses a `/`.
#[derive(Clone, Debug, From, Display, Serialize, Builder, PartialEq, Eq, Getters)]
#[serde(transparent)]
#[getset(get = "pub")]
pub struct CustomDeserializedGlob {
    #[builder(into)]
    glob: Glob,
}

impl CustomDeserializedGlob {
    pub fn new<S: AsRef<str>>(pattern: S) -> Result<Self> {
        Ok(GlobBuilder::new(pattern.as_ref())
            .literal_separator(true)
            .build()?
            .into())
    }
}

impl Default for CustomDeserializedGlob {
    fn default() -> Self {
        GlobBuilder::new("**/*")
            .literal_separator(true)
            .build()
            .expect("static glob pattern")
            .into()
    }
}

struct CustomGlobVisitor;

impl Visitor<'_> for CustomGlobVisitor {
    type Value = CustomDeserializedGlob;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a glob pattern")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        GlobBuilder::new(v)
            .literal_separator(true)
            .build()
            .map(CustomDeserializedGlob::from)
            .map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for CustomDeserializedGlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_str(CustomGlobVisitor)
    }
}

impl PathSelection {
    fn build_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        if self.globset.is_empty() {
            builder.add(CustomDeserializedGlob::default().glob);
        } else {
            self.globset.iter().for_each(|g| {
                builder.add(g.glob.clone());
            });
        }
        Ok(builder.build()?)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|excluded| path.starts_with(excluded))
    }

    fn walk_root<'a>(&'a self, root: &'a Path, globset: &'a GlobSet) -> DynIter<'a, Result<PathBuf>> {
        if self.is_excluded(root) {
            tracing::trace!("Skipping excluded include path {:?}", root);
            return std::iter::empty().into_dyn_iter();
        }

        if !root.is_dir() {
            let res = if root.is_file() {
                Ok(root.to_path_buf())
            } else {
                Err(Error::from(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{root:?} is neither a file nor a directory"),
                )))
            };
            return std::iter::once(res).into_dyn_iter();
        }

        WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |de| !self.is_excluded(de.path()))
            .filter_map(move |res| match res {
                Ok(de) => match_dir_entry(de.into_path(), root, globset),
                Err(e) => Some(Err(Error::from(e))),
            })
            .into_dyn_iter()
    }
}

fn match_dir_entry(path: PathBuf, root: &Path, globset: &GlobSet) -> Option<Result<PathBuf>> {
    if !path.is_file() {
        tracing::trace!("Skipping {:?} not a file", path);
        return None;
    }

    match path.strip_prefix(root) {
        Ok(relative) if globset.is_match(relative) => {
            tracing::trace!("Including file: {:?}", path);
            Some(Ok(path))
        }
        Ok(_) => {
            tracing::trace!("Skipping {:?}, glob not match", path);
            None
        }
        Err(e) => Some(Err(
            Error::from(e).add_msg(format!("Stripping {root:?} from {path:?} failed"))
        )),
    }
}

impl FileSelector for PathSelection {
    #[named]
    fn selected_files(&self) -> Result<Vec<PathBuf>> {
        tracing::info!(
            "Selecting files from {} include path(s), {} exclude path(s)",
            self.include.len(),
            self.exclude.len()
        );
        let globset = self.build_globset().add_fn_name(function_path!())?;

        let files: Vec<PathBuf> = self
            .include
            .iter()
            .flat_map(|root| self.walk_root(root, &globset))
            .process_results(|iter| iter.unique().collect())
            .add_fn_name(function_path!())?;

        tracing::debug!("Selected {} files", files.len());
        Ok(files)
    }
}
