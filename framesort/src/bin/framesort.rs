use std::{ffi::OsString, io::Write, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use framesort::{
    job::JobArgs,
    rank::{rank, SortKey},
    runner::{JobEvent, JobRunner, RecordStore, Target, DEFAULT_PREFIX},
};
use framesort_common::{
    bin_common::init::{init_eyre, init_logger},
    utils::fsutils::read_optional_file,
};

#[derive(Parser, Debug)]
#[command()]
/// Samples frames from videos, writes a thumbnail of each and prints them ranked by how
/// varied they are.
///
/// Without any arguments, the flags are read from `./.framesortrc` instead.
struct Cli {
    #[command(flatten)]
    job_args: JobArgs,

    /// Where to place the thumbnails
    #[arg(long, short = 'o')]
    out_dir: PathBuf,

    /// What to rank the frames by
    #[arg(long, short = 'k', value_enum, default_value_t = SortKey::HueSpread)]
    key: SortKey,

    /// Thumbnail name prefix when `input` is a single file. Each video in a directory is
    /// prefixed with its own file name instead.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// A file to additionally write all logs to
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Only log this much to stdout, which also holds the results
    #[arg(long, default_value_t = log::LevelFilter::Warn)]
    log_level: log::LevelFilter,

    /// A video file, or a directory of them
    input: PathBuf,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".framesortrc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(flags.split_whitespace().map(OsString::from));
        }
    }

    Ok(Cli::parse_from(args))
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref(), cli.log_level)?;
    log::debug!("CLI arguments: {cli:#?}");

    if !cli.out_dir.is_dir() {
        std::fs::create_dir_all(&cli.out_dir).wrap_err_with(|| {
            format!("failed to create the output dir at: {}", cli.out_dir.display())
        })?;
    }

    let store = RecordStore::new();
    store.observe(|event| match event {
        JobEvent::Finished(report) => log::info!(
            "{} finished as {:?} with {} records",
            report.source.display(),
            report.state,
            report.records.len()
        ),
        JobEvent::Failed { source, error } => {
            log::warn!("{} was skipped: {}", source.display(), error)
        }
    });

    let target = Target::from_path(&cli.input, cli.prefix);
    let runner = JobRunner::new(cli.out_dir, cli.job_args);
    let summary = runner
        .run(&target, &store)
        .wrap_err_with(|| format!("failed to find the videos in: {}", cli.input.display()))?;
    log::info!("Ran {} jobs", summary.launched);

    if summary.panicked > 0 {
        log::error!("{} jobs panicked", summary.panicked);
    }

    let failed = store.failed();
    if summary.launched > 0 && failed.len() == summary.launched {
        eyre::bail!("none of the {} videos could be opened", failed.len());
    }

    let records = store.into_records();
    let view = rank(&records, cli.key);

    let mut stdout = std::io::stdout().lock();
    ron::ser::to_writer_pretty(&mut stdout, &view, ron::ser::PrettyConfig::default())
        .wrap_err("failed to print the results")?;
    writeln!(stdout)?;

    Ok(())
}
