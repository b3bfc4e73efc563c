use super::group::{Liveness, TestGroup};
use super::suite::{Score, Suite};
use crate::scenario::{bad, good, malicious, multi, protocol, ScenarioCx, Target};

/// The four ordered gates. Extra and Malicious run only when Minimum is
/// flawless; IPv6 is informational and never gates anything; a Minimum
/// failure ends the pipeline immediately with whatever partial score it
/// earned.
pub struct GradingPipeline {
    pub(crate) minimum: Suite,
    pub(crate) ipv6: Suite,
    pub(crate) extra: Suite,
    pub(crate) malicious: Suite,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PipelineReport {
    pub minimum: Score,
    pub ipv6: Score,
    pub extra: Score,
    pub malicious: Score,
}

impl GradingPipeline {
    pub fn build(target: &Target, target6: &Target) -> Self {
        let minimum = Suite::new(
            "Minimum Requirement",
            vec![
                TestGroup::new("single_conn_good", good::scenarios(target)),
                TestGroup::new("multi_conn_sequential", vec![multi::two_connections(target)]),
                TestGroup::new(
                    "single_conn_protocol",
                    vec![protocol::http_1_0_compliance(target.clone())],
                ),
            ],
        );
        let ipv6 = Suite::new(
            "IPv6",
            vec![TestGroup::new("single_conn_good", good::scenarios(target6))],
        );
        let extra = Suite::new(
            "Extra",
            vec![
                TestGroup::new("multi_conn_sequential", multi::scenarios(target)),
                TestGroup::new("single_conn_bad", bad::scenarios(target)),
                TestGroup::new(
                    "single_conn_protocol",
                    vec![protocol::http_1_1_persistence(target.clone())],
                ),
            ],
        );
        let malicious = Suite::new(
            "Malicious",
            vec![TestGroup::new("single_conn_malicious", malicious::scenarios(target))],
        );
        GradingPipeline {
            minimum,
            ipv6,
            extra,
            malicious,
        }
    }

    pub fn suites(&self) -> [&Suite; 4] {
        [&self.minimum, &self.ipv6, &self.extra, &self.malicious]
    }

    pub fn run(&self, cx: &ScenarioCx, sut: &mut dyn Liveness) -> PipelineReport {
        let minimum = self.minimum.run(cx, sut);
        if !minimum.flawless() {
            error!(
                "The minimum requirement tests did not pass; the remaining suites will not be run"
            );
            return PipelineReport {
                minimum: minimum.score(),
                ipv6: Score::zero(),
                extra: Score::zero(),
                malicious: Score::zero(),
            };
        }
        info!("The minimum requirements passed");

        let ipv6 = self.ipv6.run(cx, sut);
        if ipv6.flawless() {
            info!("IPv6 support appears to work");
        } else {
            warn!(
                "IPv6 tests did not pass; check that the server binds protocol-independently. \
                 The remaining suites still run."
            );
        }

        let extra = self.extra.run(cx, sut);
        let malicious = self.malicious.run(cx, sut);

        PipelineReport {
            minimum: minimum.score(),
            ipv6: ipv6.score(),
            extra: extra.score(),
            malicious: malicious.score(),
        }
    }
}
