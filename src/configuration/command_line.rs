use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = CARGO_PKG_NAME)]
pub struct Opt {
    /// Path to the server executable under test
    #[structopt(parse(from_os_str), long, short = "s")]
    pub server: Option<PathBuf>,

    /// Run a single test by name instead of the full grading pipeline
    #[structopt(long, short = "t")]
    pub test: Option<String>,

    /// List the available tests and exit
    #[structopt(long, short = "l")]
    pub list: bool,

    /// Redirect the server's stdout and stderr to this file
    #[structopt(parse(from_os_str), long, short = "o")]
    pub output: Option<PathBuf>,

    /// Port the server will be asked to listen on; defaults to a
    /// pid-derived port in the 20000-29999 range
    #[structopt(long, short = "p")]
    pub port: Option<u16>,

    /// Hostname the IPv4 suites connect to
    #[structopt(long, default_value = "localhost")]
    pub host: String,

    /// Hostname the IPv6 suite connects to
    #[structopt(long, default_value = "localhost6")]
    pub host6: String,

    /// Timing and iteration settings file. Supported: YAML, JSON, TOML, HJSON
    #[structopt(parse(from_os_str), long)]
    pub settings: Option<PathBuf>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE")]
    pub log_output_file: Option<PathBuf>,
}

impl Into<LevelFilter> for LogLevel {
    fn into(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
