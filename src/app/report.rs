use super::pipeline::PipelineReport;
use crate::configuration::constants::grading;

/// The final points table, on stdout rather than the log: this is the
/// one artifact graders consume.
pub fn print_points(report: &PipelineReport) {
    println!(
        "Minimum Requirements:         \t{:2}/{:2}",
        report.minimum.points(grading::MINIMUM_POINTS),
        grading::MINIMUM_POINTS
    );
    println!(
        "IPv6 Functionality:           \t{:2}/{:2}",
        report.ipv6.points(grading::IPV6_POINTS),
        grading::IPV6_POINTS
    );
    println!(
        "Extra Tests:                  \t{:2}/{:2}",
        report.extra.points(grading::EXTRA_POINTS),
        grading::EXTRA_POINTS
    );
    println!(
        "Robustness:                   \t{:2}/{:2}",
        report.malicious.points(grading::MALICIOUS_POINTS),
        grading::MALICIOUS_POINTS
    );
}
