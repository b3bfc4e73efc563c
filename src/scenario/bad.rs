//! Well-formed but erroneous requests: unknown resources, noisy query
//! strings, and an unsupported method. The server must answer all of
//! them gracefully.

use super::{expect_status, Scenario, Target};
use crate::check::{self, ResourceKind};
use crate::error::CheckError;
use reqwest::{Method, StatusCode};

const NOT_FOUND_CHECKS: [(&str, &str); 7] = [
    ("test_404_not_found_1", "/junk"),
    ("test_404_not_found_2", "/loadavg/junk"),
    ("test_404_not_found_3", "/meminfo/junk"),
    ("test_404_not_found_4", "/junk/meminfo"),
    ("test_404_not_found_5", "/junk/loadavg"),
    ("test_404_not_found_6", "/loadavgjunk"),
    ("test_404_not_found_7", "/meminfojunk"),
];

/// The shape of a query string around the one parameter that matters.
/// Only `callback` is semantically recognized; everything else is noise
/// the server must ignore, whatever its position or size.
#[derive(Clone, Copy)]
enum QueryShape {
    Irrelevant,
    CallbackFirst,
    CallbackLast,
    CallbackMiddle,
    PaddedPlain,
    PaddedCallback,
}

impl QueryShape {
    fn render(&self, padding: usize) -> String {
        match self {
            QueryShape::Irrelevant => "?notcallback=false".to_owned(),
            QueryShape::CallbackFirst => "?callback=true&notcallback=false".to_owned(),
            QueryShape::CallbackLast => "?notcallback=false&callback=true".to_owned(),
            QueryShape::CallbackMiddle => {
                "?notcallback=false&callback=true&alsonotcallback=false".to_owned()
            }
            QueryShape::PaddedPlain => format!("?aaaa{}aa=false", "a".repeat(padding)),
            QueryShape::PaddedCallback => {
                format!("?aaa{}aa=false&callback=true", "a".repeat(padding))
            }
        }
    }

    fn callback(&self) -> Option<&'static str> {
        match self {
            QueryShape::Irrelevant | QueryShape::PaddedPlain => None,
            _ => Some("true"),
        }
    }
}

const QUERY_CHECKS: [(&str, ResourceKind, QueryShape); 12] = [
    ("test_query_string_1", ResourceKind::LoadAvg, QueryShape::Irrelevant),
    ("test_query_string_2", ResourceKind::LoadAvg, QueryShape::CallbackFirst),
    ("test_query_string_3", ResourceKind::LoadAvg, QueryShape::CallbackLast),
    ("test_query_string_4", ResourceKind::LoadAvg, QueryShape::CallbackMiddle),
    ("test_query_string_5", ResourceKind::LoadAvg, QueryShape::PaddedPlain),
    ("test_query_string_6", ResourceKind::LoadAvg, QueryShape::PaddedCallback),
    ("test_query_string_7", ResourceKind::MemInfo, QueryShape::Irrelevant),
    ("test_query_string_8", ResourceKind::MemInfo, QueryShape::CallbackFirst),
    ("test_query_string_9", ResourceKind::MemInfo, QueryShape::CallbackLast),
    ("test_query_string_10", ResourceKind::MemInfo, QueryShape::CallbackMiddle),
    ("test_query_string_11", ResourceKind::MemInfo, QueryShape::PaddedPlain),
    ("test_query_string_12", ResourceKind::MemInfo, QueryShape::PaddedCallback),
];

pub fn scenarios(target: &Target) -> Vec<Scenario> {
    let mut scenarios = Vec::with_capacity(NOT_FOUND_CHECKS.len() + QUERY_CHECKS.len() + 1);
    for &(name, path) in NOT_FOUND_CHECKS.iter() {
        scenarios.push(not_found(target.clone(), name, path));
    }
    for &(name, kind, shape) in QUERY_CHECKS.iter() {
        scenarios.push(query_string(target.clone(), name, kind, shape));
    }
    scenarios.push(method_check(target.clone()));
    scenarios
}

fn not_found(target: Target, name: &'static str, path: &'static str) -> Scenario {
    Scenario::new(
        name,
        "1",
        format!("GET request for an illegal object URL: GET {} HTTP/1.1", path),
        move |cx| {
            let response = cx.client.exchange(Method::GET, &target.url(path))?;
            // the body may be anything; the client drains it either way
            expect_status(response.status, StatusCode::NOT_FOUND)?;
            Ok(())
        },
    )
}

fn query_string(target: Target, name: &'static str, kind: ResourceKind, shape: QueryShape) -> Scenario {
    Scenario::new(
        name,
        "1",
        format!("GET request for /{} with a complex query string", kind),
        move |cx| {
            let path = format!("/{}{}", kind, shape.render(cx.settings.query_padding));
            let response = cx.client.exchange(Method::GET, &target.url(&path))?;
            expect_status(response.status, StatusCode::OK)?;
            let body = response.body_str();
            match shape.callback() {
                Some(callback) => check::check_callback(&body, callback, kind)?,
                None => match kind {
                    ResourceKind::LoadAvg => check::check_loadavg(&body)?,
                    ResourceKind::MemInfo => check::check_meminfo(&body)?,
                },
            }
            Ok(())
        },
    )
}

fn method_check(target: Target) -> Scenario {
    Scenario::new(
        "test_method_check",
        "1",
        "Request with a method the server does not implement: ASD /loadavg HTTP/1.1".to_owned(),
        move |cx| {
            let method = Method::from_bytes(b"ASD").expect("static method token");
            let response = cx.client.exchange(method, &target.url("/loadavg"))?;
            if response.status == StatusCode::METHOD_NOT_ALLOWED
                || response.status == StatusCode::NOT_IMPLEMENTED
            {
                Ok(())
            } else {
                Err(CheckError::Protocol(format!(
                    "expected METHOD NOT ALLOWED or NOT IMPLEMENTED for method ASD, server answered {}",
                    response.status
                )))
            }
        },
    )
}
