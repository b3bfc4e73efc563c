//! Well-formed single-connection requests. These are the minimum bar and
//! double as the IPv6 suite when bound to an IPv6-capable hostname.

use super::{expect_status, Scenario, Target};
use crate::check::{self, ResourceKind};
use reqwest::{Method, StatusCode};

pub fn scenarios(target: &Target) -> Vec<Scenario> {
    vec![
        loadavg_no_callback(target.clone()),
        meminfo_no_callback(target.clone()),
        loadavg_callback(target.clone()),
        meminfo_callback(target.clone()),
    ]
}

fn loadavg_no_callback(target: Target) -> Scenario {
    Scenario::new(
        "test_loadavg_no_callback",
        "1",
        format!("Simple GET request: GET /loadavg HTTP/1.1 against {}", target.host),
        move |cx| {
            let response = cx.client.exchange(Method::GET, &target.url("/loadavg"))?;
            expect_status(response.status, StatusCode::OK)?;
            check::check_loadavg(&response.body_str())?;
            Ok(())
        },
    )
}

fn meminfo_no_callback(target: Target) -> Scenario {
    Scenario::new(
        "test_meminfo_no_callback",
        "1",
        format!("Simple GET request: GET /meminfo HTTP/1.1 against {}", target.host),
        move |cx| {
            let response = cx.client.exchange(Method::GET, &target.url("/meminfo"))?;
            expect_status(response.status, StatusCode::OK)?;
            check::check_meminfo(&response.body_str())?;
            Ok(())
        },
    )
}

fn loadavg_callback(target: Target) -> Scenario {
    Scenario::new(
        "test_loadavg_callback",
        "1",
        "GET request with callback: GET /loadavg?callback=callbackmethod HTTP/1.1".to_owned(),
        move |cx| {
            let response = cx
                .client
                .exchange(Method::GET, &target.url("/loadavg?callback=callbackmethod"))?;
            expect_status(response.status, StatusCode::OK)?;
            check::check_callback(&response.body_str(), "callbackmethod", ResourceKind::LoadAvg)?;
            Ok(())
        },
    )
}

fn meminfo_callback(target: Target) -> Scenario {
    Scenario::new(
        "test_meminfo_callback",
        "1",
        "GET request with callback: GET /meminfo?callback=callbackmethod HTTP/1.1".to_owned(),
        move |cx| {
            let response = cx
                .client
                .exchange(Method::GET, &target.url("/meminfo?callback=callbackmethod"))?;
            expect_status(response.status, StatusCode::OK)?;
            check::check_callback(&response.body_str(), "callbackmethod", ResourceKind::MemInfo)?;
            Ok(())
        },
    )
}
