use backup_job::backup::backup_config::BackupConfig;
use backup_job::backup::job::BackupJob;
use backup_job::backup::result_error::result::Result;
use backup_job::backup::result_error::AddMsg;
use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;

/// Back up files and databases into one archive and copy it to every destination
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short, long)]
    config: PathBuf,
    /// Overrides `temp_dir` from the config file
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

fn run(args: &Args) -> Result<()> {
    let mut config = BackupConfig::from_yaml_file(&args.config)?;
    if let Some(temp_dir) = &args.temp_dir {
        config = config.with_temp_dir(temp_dir);
    }
    config
        .validate_all()
        .add_msg(format!("Config validation failed: {:?}", &args.config))?;

    BackupJob::with_tracing(config.temp_dir()).run(&config.run_config())
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        exit(1);
    }
}
