#[macro_use]
extern crate log;

mod app;
mod check;
mod configuration;
mod connection;
mod error;
mod scenario;
mod sut;
mod time;

use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT};
use std::path::PathBuf;
use std::process::exit;
use std::sync::{Arc, Mutex};
use std::thread;
use structopt::StructOpt;

use self::app::App;
use self::configuration::command_line::{LogLevel, Opt};
use self::configuration::settings::Settings;
use self::sut::SharedChild;

fn main() {
    let options = Opt::from_args();

    init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    );

    let slot: SharedChild = Arc::new(Mutex::new(None));
    let signals = Signals::new(&[SIGINT]).unwrap();
    let guard = Arc::clone(&slot);
    thread::spawn(move || {
        for sig in signals.forever() {
            info!("Received signal {:?}, stopping", sig);
            // the server must not outlive the run, Ctrl-C included
            sut::kill_shared(&guard);
            exit(130);
        }
    });

    let settings = match Settings::load(options.settings.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings file: {}", e);
            exit(2);
        }
    };
    debug!("Effective settings {:#?}", settings);

    let app = App::new(options, settings);
    if let Err(e) = app.run(slot) {
        error!("{}", e);
        exit(1);
    }
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) {
    let mut dispatcher = fern::Dispatch::new()
        // Perform allocation-free log formatting
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file).unwrap())
    }
    dispatcher.apply().unwrap();
    info!("Logging level {} enabled", level);
}
