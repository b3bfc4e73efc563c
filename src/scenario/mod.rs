//! The scenario library: each scenario is one self-contained protocol or
//! robustness check against the server under test, producing a single
//! outcome.

pub(crate) mod bad;
pub(crate) mod good;
pub(crate) mod malicious;
pub(crate) mod multi;
pub(crate) mod protocol;

use crate::check;
use crate::configuration::settings::Settings;
use crate::connection::raw::RawConnection;
use crate::connection::Exchange;
use crate::error::CheckError;
use derivative::Derivative;
use reqwest::StatusCode;

/// Where the server under test listens.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_owned(),
            port,
        }
    }

    pub fn url(&self, path: &str) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}{}", self.host, self.port, path)
        } else {
            format!("http://{}:{}{}", self.host, self.port, path)
        }
    }
}

/// Shared per-run context handed to every scenario.
pub struct ScenarioCx<'a> {
    pub settings: &'a Settings,
    pub client: &'a dyn Exchange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Pass,
    Fail(String),
    Error(String),
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, TestOutcome::Pass)
    }
}

type RunFn = Box<dyn Fn(&ScenarioCx) -> Result<(), CheckError>>;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Scenario {
    pub name: &'static str,
    /// Human-readable procedure description, surfaced with the outcome.
    pub doc: String,
    /// Connection-count expectation, e.g. "1" or "2000, one at a time".
    pub connections: &'static str,
    #[derivative(Debug = "ignore")]
    run: RunFn,
}

impl Scenario {
    pub fn new<F>(name: &'static str, connections: &'static str, doc: String, run: F) -> Self
    where
        F: Fn(&ScenarioCx) -> Result<(), CheckError> + 'static,
    {
        Self {
            name,
            doc,
            connections,
            run: Box::new(run),
        }
    }

    pub fn execute(&self, cx: &ScenarioCx) -> TestOutcome {
        info!("Running {} (connections: {})", self.name, self.connections);
        debug!("Procedure: {}", self.doc);
        match (self.run)(cx) {
            Ok(()) => {
                info!("{} passed", self.name);
                TestOutcome::Pass
            }
            Err(error) if error.is_engine_side() => {
                error!("{} errored: {}", self.name, error);
                TestOutcome::Error(error.to_string())
            }
            Err(error) => {
                error!("{} failed: {}", self.name, error);
                TestOutcome::Fail(error.to_string())
            }
        }
    }
}

pub(crate) fn expect_status(found: StatusCode, want: StatusCode) -> Result<(), CheckError> {
    if found == want {
        Ok(())
    } else {
        Err(CheckError::Protocol(format!(
            "expected status {}, server answered {}",
            want, found
        )))
    }
}

/// One keep-alive `GET /loadavg` over an already-open raw connection,
/// response validated. Shared by the multi-connection groups and the
/// leak probe.
pub(crate) fn fetch_loadavg(
    connection: &mut RawConnection,
    target: &Target,
    settings: &Settings,
) -> Result<(), CheckError> {
    connection.send(format!("GET /loadavg HTTP/1.1\r\nHost: {}\r\n\r\n", target.host).as_bytes())?;
    let response = connection.read_response(settings.read_timeout)?;
    if response.status != 200 {
        return Err(CheckError::Protocol(format!(
            "expected 200 for /loadavg, server answered {}",
            response.status
        )));
    }
    check::check_loadavg(&response.body_str())?;
    Ok(())
}
