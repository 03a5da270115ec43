use std::{io::IsTerminal, path::Path};

use color_eyre::{
    config::{HookBuilder, Theme},
    eyre::{self, Context},
};
use fern::Dispatch;
use fern_format::{Format, Stream};

/// Installs the eyre report hooks. Panics are printed to stderr and also logged, so that
/// a panicking worker thread ends up in the log file.
pub fn init_eyre() -> eyre::Result<()> {
    let theme = if std::io::stderr().is_terminal() {
        Theme::dark()
    } else {
        Theme::new()
    };

    let (stderr_panic_hook, eyre_hook) = HookBuilder::default().theme(theme).into_hooks();
    eyre_hook
        .install()
        .wrap_err("failed to install eyre hook")?;

    // the log file should not be full of escape codes
    let (log_panic_hook, _) = HookBuilder::default().theme(Theme::new()).into_hooks();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("{}", stderr_panic_hook.panic_report(info));
        log::error!(target: "panic", "{}", log_panic_hook.panic_report(info));
    }));

    Ok(())
}

/// Logs to stdout up to `stdout_level`, and everything to `logfile` if there is one.
pub fn init_logger(logfile: Option<&Path>, stdout_level: log::LevelFilter) -> eyre::Result<()> {
    let mut dispatch = Dispatch::new()
        .level(log::LevelFilter::Trace)
        .chain(stdout_dispatch(stdout_level));

    if let Some(logfile) = logfile {
        dispatch = dispatch.chain(file_dispatch(logfile)?);
    }

    dispatch.apply().wrap_err("failed to set the logger")
}

fn stdout_dispatch(level: log::LevelFilter) -> Dispatch {
    let format = Format::new()
        .color_if_supported(Stream::Stdout)
        .uniquely_color_threads();
    Dispatch::new()
        .level(level)
        .format(format.callback())
        .chain(std::io::stdout())
}

fn file_dispatch(logfile: &Path) -> eyre::Result<Dispatch> {
    let file = fern::log_file(logfile)
        .wrap_err_with(|| format!("failed to open the log file at: {}", logfile.display()))?;
    Ok(Dispatch::new()
        .format(Format::new().thread_names().callback())
        .chain(file))
}
