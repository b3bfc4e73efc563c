use super::group::{Liveness, TestGroup};
use crate::scenario::{ScenarioCx, TestOutcome};
use std::fmt;

/// An exact pass fraction. Kept as integers so repeated aggregation and
/// weighting never accumulate rounding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    passed: u32,
    total: u32,
}

impl Score {
    pub fn new(passed: u32, total: u32) -> Self {
        Self { passed, total }
    }

    pub fn zero() -> Self {
        Self { passed: 0, total: 0 }
    }

    /// Scales the fraction against a point weight, rounding down.
    pub fn points(&self, weight: u32) -> u32 {
        if self.total == 0 {
            0
        } else {
            weight * self.passed / self.total
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.passed, self.total)
    }
}

#[derive(Debug)]
pub struct SuiteResult {
    pub total: u32,
    pub failed: u32,
    pub errored: u32,
}

impl SuiteResult {
    pub fn score(&self) -> Score {
        // clamped at zero by construction
        Score::new(
            self.total.saturating_sub(self.failed + self.errored),
            self.total,
        )
    }

    pub fn flawless(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// An ordered, named collection of test groups scored together.
pub struct Suite {
    pub name: &'static str,
    groups: Vec<TestGroup>,
}

impl Suite {
    pub fn new(name: &'static str, groups: Vec<TestGroup>) -> Self {
        Self { name, groups }
    }

    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn run(&self, cx: &ScenarioCx, sut: &mut dyn Liveness) -> SuiteResult {
        info!("Beginning the {} tests", self.name);
        let mut records = Vec::new();
        for group in &self.groups {
            records.extend(group.run(cx, sut));
        }
        let mut failed = 0;
        let mut errored = 0;
        for record in &records {
            match &record.outcome {
                TestOutcome::Pass => {}
                TestOutcome::Fail(reason) => {
                    failed += 1;
                    warn!("FAIL {}: {}", record.name, reason);
                }
                TestOutcome::Error(reason) => {
                    errored += 1;
                    warn!("ERROR {}: {}", record.name, reason);
                }
            }
        }
        let result = SuiteResult {
            total: records.len() as u32,
            failed,
            errored,
        };
        info!(
            "{} tests: {} of {} passed ({} failed, {} errored)",
            self.name,
            result.total - failed - errored,
            result.total,
            failed,
            errored
        );
        result
    }
}
