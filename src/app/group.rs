use crate::error::CheckError;
use crate::scenario::{Scenario, ScenarioCx, TestOutcome};

/// Whatever can answer "is the server process still running".
pub trait Liveness {
    fn is_alive(&mut self) -> bool;
}

#[derive(Debug)]
pub struct ScenarioRecord {
    pub name: &'static str,
    pub outcome: TestOutcome,
}

/// An ordered set of scenarios sharing teardown semantics: after every
/// scenario, pass or fail, the server gets a liveness probe; a server
/// found dead beforehand turns the scenario into a crash report instead
/// of a misleading failure.
pub struct TestGroup {
    pub name: &'static str,
    scenarios: Vec<Scenario>,
}

impl TestGroup {
    pub fn new(name: &'static str, scenarios: Vec<Scenario>) -> Self {
        Self { name, scenarios }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn run(&self, cx: &ScenarioCx, sut: &mut dyn Liveness) -> Vec<ScenarioRecord> {
        let mut records = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            if !sut.is_alive() {
                error!(
                    "The server has exited; reporting {} without running it",
                    scenario.name
                );
                records.push(ScenarioRecord {
                    name: scenario.name,
                    outcome: TestOutcome::Error(CheckError::SutCrashed.to_string()),
                });
                continue;
            }
            let outcome = scenario.execute(cx);
            // teardown: the liveness probe runs exactly once per
            // scenario, whatever the outcome was
            if !sut.is_alive() {
                warn!(
                    "The server has crashed after servicing {}. Please investigate.",
                    scenario.name
                );
            }
            records.push(ScenarioRecord {
                name: scenario.name,
                outcome,
            });
        }
        records
    }
}

#[cfg(test)]
pub(crate) struct AlwaysAlive;

#[cfg(test)]
impl Liveness for AlwaysAlive {
    fn is_alive(&mut self) -> bool {
        true
    }
}
