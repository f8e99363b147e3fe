mod config;
mod device;
mod error;
mod export;
mod frame;
mod messages;
mod orchestrator;
mod pdf_builder;
mod preview;
mod sane;
mod scan;
#[cfg(test)]
mod testing;
mod window;

use argh::FromArgs;
use config::Config;
use libsane::Backend;
use log::Level;
use orchestrator::{Dialogs, Orchestrator};
use std::{path::PathBuf, process};
use window::NativeDialogs;

#[derive(FromArgs)]
/// Scan a page and save it as PNG or PDF
struct Args {
    /// path to config
    #[argh(option)]
    config: Option<PathBuf>,

    /// enable extra logs
    #[argh(switch)]
    verbose: bool,
}

fn main() {
    let args: Args = argh::from_env();

    simple_logger::init_with_level(if args.verbose {
        Level::Trace
    } else {
        Level::Info
    })
    .expect("logger should be initialized once");

    hello(&args);

    let config = match &args.config {
        Some(path) => match Config::read_from(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to read config: {err:#}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    if args.verbose {
        log::debug!("Use config {config:#?}");
    }

    let orchestrator = match Orchestrator::initialize(Backend::new, config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            log::error!("{err}");
            NativeDialogs.error(messages::ERROR_TITLE, &messages::INIT_FAILED(&err));
            process::exit(1);
        }
    };

    log::info!("Open scanner window");
    if let Err(err) = window::run(orchestrator) {
        log::error!("Window error: {err}");
        process::exit(1);
    }
}

fn hello(args: &Args) {
    log::info!(
        "{bin} version {version}, commit {commit}, config from {config_path}, verbose {verbose}",
        bin = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_HASH"),
        config_path = args
            .config
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "defaults".to_owned()),
        verbose = if args.verbose { "on" } else { "off" },
    );
}
