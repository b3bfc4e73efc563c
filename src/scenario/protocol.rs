//! HTTP version contract checks that need byte-level control: a 1.0
//! request must not be answered before its terminating blank line and
//! the connection must close after the response; a 1.1 connection must
//! persist across requests.

use super::{Scenario, Target};
use crate::check;
use crate::connection::raw::RawConnection;
use crate::error::CheckError;
use std::thread;

pub fn http_1_0_compliance(target: Target) -> Scenario {
    Scenario::new(
        "test_http_1_0_compliance",
        "1",
        "Writes 'GET /loadavg HTTP/1.0' and headers without the blank line, checks \
         nothing has been returned, then finishes the request and checks the data \
         sent back by the server, which must close the connection afterwards."
            .to_owned(),
        move |cx| {
            let settings = cx.settings;
            let mut connection = RawConnection::open(&target.host, target.port, settings)?;
            connection.send(b"GET /loadavg HTTP/1.0\r\n")?;
            connection.send(format!("Host: {}\r\n", target.host).as_bytes())?;
            thread::sleep(settings.settle_delay);
            let early = connection.peek(settings.peek_timeout)?;
            if !early.is_empty() {
                return Err(CheckError::Protocol(
                    "the response was returned too early, before the extra \\r\\n line".to_owned(),
                ));
            }

            connection.send(b"\r\n")?;
            thread::sleep(settings.settle_delay);
            // HTTP/1.0 connections close after the response, so reaching
            // EOF must not time out
            let data = connection
                .read_until_eof(settings.read_timeout)
                .map_err(|error| match error {
                    CheckError::TimedOut(_) => CheckError::Protocol(
                        "the server did not respond and close the connection in sufficient time"
                            .to_owned(),
                    ),
                    other => other,
                })?;

            let text = String::from_utf8_lossy(&data);
            let body = text.splitn(2, "\r\n\r\n").nth(1).ok_or_else(|| {
                CheckError::Protocol(
                    "the response could not be parsed; check the use of \\r\\n".to_owned(),
                )
            })?;
            check::check_loadavg(body)?;
            Ok(())
        },
    )
}

pub fn http_1_1_persistence(target: Target) -> Scenario {
    Scenario::new(
        "test_http_1_1_persistence",
        "1",
        "Ensures a persistent connection by sending two consecutive requests to \
         the server over one connection."
            .to_owned(),
        move |cx| {
            let settings = cx.settings;
            let mut connection = RawConnection::open(&target.host, target.port, settings)?;
            for round in 1u32..=2 {
                connection
                    .send(format!("GET /loadavg HTTP/1.1\r\nHost: {}\r\n\r\n", target.host).as_bytes())
                    .map_err(|error| persistence_violation(round, error))?;
                let response = connection
                    .read_response(settings.read_timeout)
                    .map_err(|error| persistence_violation(round, error))?;
                if response.status != 200 {
                    return Err(CheckError::Protocol(format!(
                        "request {} over the persistent connection answered {}",
                        round, response.status
                    )));
                }
                check::check_loadavg(&response.body_str())?;
            }
            Ok(())
        },
    )
}

fn persistence_violation(round: u32, error: CheckError) -> CheckError {
    if round > 1 {
        CheckError::Protocol(format!(
            "the connection was not kept alive for request {}: {}",
            round, error
        ))
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::NoopExchange;
    use crate::scenario::testutil::{quick_settings, spawn, Manner};
    use crate::scenario::{ScenarioCx, TestOutcome};

    fn run(scenario: Scenario) -> TestOutcome {
        let settings = quick_settings();
        let cx = ScenarioCx {
            settings: &settings,
            client: &NoopExchange,
        };
        scenario.execute(&cx)
    }

    #[test]
    fn test_1_0_passes_against_a_well_behaved_server() {
        let addr = spawn(Manner::Http10);
        let outcome = run(http_1_0_compliance(Target::new("127.0.0.1", addr.port())));
        assert_eq!(outcome, TestOutcome::Pass);
    }

    #[test]
    fn test_1_0_fails_when_the_response_comes_early() {
        let addr = spawn(Manner::EagerResponder);
        let outcome = run(http_1_0_compliance(Target::new("127.0.0.1", addr.port())));
        assert!(matches!(outcome, TestOutcome::Fail(_)));
    }

    #[test]
    fn test_1_0_fails_when_the_connection_stays_open() {
        let addr = spawn(Manner::Http11);
        let outcome = run(http_1_0_compliance(Target::new("127.0.0.1", addr.port())));
        assert!(matches!(outcome, TestOutcome::Fail(_)));
    }

    #[test]
    fn test_1_1_passes_against_a_persistent_server() {
        let addr = spawn(Manner::Http11);
        let outcome = run(http_1_1_persistence(Target::new("127.0.0.1", addr.port())));
        assert_eq!(outcome, TestOutcome::Pass);
    }

    #[test]
    fn test_1_1_fails_when_the_server_drops_the_connection() {
        let addr = spawn(Manner::NonPersistent);
        let outcome = run(http_1_1_persistence(Target::new("127.0.0.1", addr.port())));
        assert!(matches!(outcome, TestOutcome::Fail(_)));
    }
}
