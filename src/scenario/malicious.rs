//! Requests designed to surface descriptor leaks, buffer mishandling,
//! and other robustness gaps. Connect failures inside the leak probes
//! are failures, not engine errors: running out of connections is the
//! very signal these scenarios exist to catch.

use super::{expect_status, fetch_loadavg, Scenario, ScenarioCx, Target};
use crate::check;
use crate::connection::raw::RawConnection;
use crate::error::CheckError;
use reqwest::{Method, StatusCode};
use std::thread;
use std::time::Instant;

pub fn scenarios(target: &Target) -> Vec<Scenario> {
    vec![
        file_descriptor_leak(target.clone()),
        early_disconnect_one_terminator(target.clone()),
        early_disconnect_no_terminator(target.clone()),
        oversized_uri(target.clone()),
        byte_wise_request(target.clone()),
    ]
}

fn file_descriptor_leak(target: Target) -> Scenario {
    Scenario::new(
        "test_file_descriptor_leak",
        "2000, one at a time",
        "Repeats connect, GET /loadavg, validate, close. A server leaking \
         descriptors or threads slows down and blows the wall-clock ceiling, \
         which fails the whole probe."
            .to_owned(),
        move |cx| {
            let settings = cx.settings;
            let started = Instant::now();
            for cycle in 0..settings.leak_iterations {
                let mut connection = RawConnection::open(&target.host, target.port, settings)
                    .map_err(|error| leak_failure(cycle, error))?;
                fetch_loadavg(&mut connection, &target, settings)
                    .map_err(|error| leak_failure(cycle, error))?;
                drop(connection);
                check_ceiling(&started, cycle, cx)?;
            }
            Ok(())
        },
    )
}

fn early_disconnect_one_terminator(target: Target) -> Scenario {
    Scenario::new(
        "test_file_descriptor_early_disco_leak_1",
        "2000, one at a time",
        "Repeats connect, send 'GET /loadavg HTTP/1.1' and a Host header with \
         single \\r\\n line endings but no terminating blank line, then close \
         abruptly. Afterwards one full exchange must still succeed."
            .to_owned(),
        move |cx| {
            let host_header = format!("Host: {}\r\n", target.host);
            run_early_disconnect(cx, &target, |connection| {
                connection.send(b"GET /loadavg HTTP/1.1\r\n")?;
                connection.send(host_header.as_bytes())?;
                Ok(())
            })
        },
    )
}

fn early_disconnect_no_terminator(target: Target) -> Scenario {
    Scenario::new(
        "test_file_descriptor_early_disco_leak_2",
        "2000, one at a time",
        "Repeats connect, send 'GET /loadavg HTTP/1.1' with no line ending at \
         all, then close abruptly. Afterwards one full exchange must still \
         succeed."
            .to_owned(),
        move |cx| {
            run_early_disconnect(cx, &target, |connection| {
                connection.send(b"GET /loadavg HTTP/1.1")
            })
        },
    )
}

fn run_early_disconnect<F>(cx: &ScenarioCx, target: &Target, send_fragment: F) -> Result<(), CheckError>
where
    F: Fn(&mut RawConnection) -> Result<(), CheckError>,
{
    let settings = cx.settings;
    let started = Instant::now();
    for cycle in 0..settings.leak_iterations {
        let mut connection = RawConnection::open(&target.host, target.port, settings)
            .map_err(|error| leak_failure(cycle, error))?;
        send_fragment(&mut connection).map_err(|error| leak_failure(cycle, error))?;
        drop(connection);
        check_ceiling(&started, cycle, cx)?;
    }
    // the abandoned fragments must not have cost the server its ability
    // to serve a real request
    let mut connection = RawConnection::open(&target.host, target.port, settings)
        .map_err(|error| leak_failure(settings.leak_iterations, error))?;
    fetch_loadavg(&mut connection, target, settings)?;
    Ok(())
}

fn leak_failure(cycle: u32, error: CheckError) -> CheckError {
    CheckError::Protocol(format!("leak probe cycle {}: {}", cycle, error))
}

fn check_ceiling(started: &Instant, cycle: u32, cx: &ScenarioCx) -> Result<(), CheckError> {
    if started.elapsed() > cx.settings.leak_ceiling {
        Err(CheckError::Protocol(format!(
            "leak probe exceeded its {:?} ceiling after {} cycles",
            cx.settings.leak_ceiling,
            cycle + 1
        )))
    } else {
        Ok(())
    }
}

fn oversized_uri(target: Target) -> Scenario {
    Scenario::new(
        "test_80_kb_uri",
        "2",
        "Sends a GET request for a URI roughly 80 KB long. Any disposition is \
         acceptable except answering with a valid loadavg payload, and a fresh \
         connection afterwards must still serve a normal request."
            .to_owned(),
        move |cx| {
            let settings = cx.settings;
            let mut connection = RawConnection::open(&target.host, target.port, settings)?;

            let mut uri = String::with_capacity(8 * settings.oversize_repeats as usize);
            for _ in 1..settings.oversize_repeats {
                uri.push_str("/loadavg");
            }
            let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", uri, target.host);
            // a server closing mid-request chose a permitted disposition
            if let Err(error) = connection.send(request.as_bytes()) {
                debug!("Oversized request cut short by the server: {}", error);
            }

            let data = connection.drain(settings.peek_timeout)?;
            let text = String::from_utf8_lossy(&data);
            if let Some(body) = text.splitn(2, "\r\n\r\n").nth(1) {
                if check::check_loadavg(body).is_ok() {
                    return Err(CheckError::Protocol(
                        "a valid loadavg object was returned for an invalid request".to_owned(),
                    ));
                }
            }
            drop(connection);

            // the assertion that gives this scenario meaning: the server
            // must still be standing
            let response = cx
                .client
                .exchange(Method::GET, &target.url("/loadavg"))
                .map_err(|error| {
                    CheckError::Protocol(format!(
                        "a fresh connection after the oversized request failed: {}",
                        error
                    ))
                })?;
            expect_status(response.status, StatusCode::OK)?;
            check::check_loadavg(&response.body_str())?;
            Ok(())
        },
    )
}

fn byte_wise_request(target: Target) -> Scenario {
    Scenario::new(
        "test_byte_wise_request",
        "1",
        "Sends GET /loadavg HTTP/1.0 one byte at a time with a pause between \
         bytes; nothing may come back before the final terminator, then exactly \
         one correct response must."
            .to_owned(),
        move |cx| {
            let settings = cx.settings;
            let mut connection = RawConnection::open(&target.host, target.port, settings)?;
            let head = format!("GET /loadavg HTTP/1.0\r\nHost: {}\r\n", target.host);
            for byte in head.bytes() {
                connection.send(&[byte])?;
                thread::sleep(settings.byte_gap);
            }

            let early = connection.peek(settings.peek_timeout)?;
            if !early.is_empty() {
                return Err(CheckError::Protocol(
                    "data was returned before the final \\r\\n of a byte-wise request".to_owned(),
                ));
            }

            connection.send(b"\r")?;
            connection.send(b"\n")?;
            thread::sleep(settings.settle_delay);
            let data = connection.read_until_eof(settings.read_timeout)?;
            let text = String::from_utf8_lossy(&data);
            let body = text.splitn(2, "\r\n\r\n").nth(1).ok_or_else(|| {
                CheckError::Protocol("the server did not return parseable loadavg data".to_owned())
            })?;
            check::check_loadavg(body)?;
            Ok(())
        },
    )
}
