//! Several connections held open at once, driven sequentially. The first
//! round of requests runs in reverse opening order, which catches servers
//! that pair responses with the wrong connection; the second round runs
//! in opening order and tolerates servers that closed after one exchange
//! by reconnecting once.

use super::{fetch_loadavg, Scenario, ScenarioCx, Target};
use crate::connection::raw::RawConnection;
use crate::error::CheckError;

pub fn scenarios(target: &Target) -> Vec<Scenario> {
    vec![
        two_connections(target),
        four_connections(target),
        eight_connections(target),
    ]
}

pub fn two_connections(target: &Target) -> Scenario {
    sequential("test_two_connections", "2", 2, target.clone())
}

pub fn four_connections(target: &Target) -> Scenario {
    sequential("test_four_connections", "4", 4, target.clone())
}

pub fn eight_connections(target: &Target) -> Scenario {
    sequential("test_eight_connections", "8", 8, target.clone())
}

fn sequential(name: &'static str, connections: &'static str, count: usize, target: Target) -> Scenario {
    Scenario::new(
        name,
        connections,
        format!(
            "Open {} connections, request GET /loadavg HTTP/1.1 on each in reverse \
             opening order, then again in opening order, validating every response.",
            count
        ),
        move |cx| run_round_trips(cx, &target, count),
    )
}

fn run_round_trips(cx: &ScenarioCx, target: &Target, count: usize) -> Result<(), CheckError> {
    let settings = cx.settings;
    let mut connections = Vec::with_capacity(count);
    for _ in 0..count {
        connections.push(RawConnection::open(&target.host, target.port, settings)?);
    }

    for connection in connections.iter_mut().rev() {
        fetch_loadavg(connection, target, settings)?;
    }

    for connection in connections.iter_mut() {
        match fetch_loadavg(connection, target, settings) {
            Ok(()) => {}
            // schema problems are real failures; only transport-level
            // trouble earns the one reconnect a non-persistent server
            // is entitled to
            Err(CheckError::Schema(error)) => return Err(error.into()),
            Err(first) => {
                debug!("Reopening a connection for the second round after: {}", first);
                *connection = RawConnection::open(&target.host, target.port, settings)?;
                fetch_loadavg(connection, target, settings)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::NoopExchange;
    use crate::scenario::testutil::{quick_settings, spawn, Manner};
    use crate::scenario::TestOutcome;

    fn run(scenario: Scenario) -> TestOutcome {
        let settings = quick_settings();
        let cx = ScenarioCx {
            settings: &settings,
            client: &NoopExchange,
        };
        scenario.execute(&cx)
    }

    #[test]
    fn test_two_connections_pass_against_a_persistent_server() {
        let addr = spawn(Manner::Http11);
        let target = Target::new("127.0.0.1", addr.port());
        assert_eq!(run(two_connections(&target)), TestOutcome::Pass);
    }

    #[test]
    fn test_second_round_reconnects_when_the_server_closes_each_time() {
        let addr = spawn(Manner::NonPersistent);
        let target = Target::new("127.0.0.1", addr.port());
        assert_eq!(run(four_connections(&target)), TestOutcome::Pass);
    }

    #[test]
    fn test_connections_error_when_nothing_listens() {
        let target = Target::new("127.0.0.1", 1);
        assert!(matches!(run(two_connections(&target)), TestOutcome::Error(_)));
    }
}
