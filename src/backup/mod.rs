pub mod archive;
pub mod backup_config;
pub mod compress;
pub mod destination;
pub mod dump;
pub mod file_ext;
pub mod finish;
pub mod job;
pub mod progress;
pub mod result_error;
pub mod run_config;
pub mod select;
pub mod validate;
pub mod workspace;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
