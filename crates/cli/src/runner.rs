/// Suite runner: one resource suite per configured target, strictly in order.
///
/// Output is TAP v14 in text mode or an array of suite reports in JSON mode.
use crudcheck_conformance::{ResourceSuite, ResourceTarget, SuiteConfig, SuiteReport};

use crate::tap::Tap;
use crate::OutputFormat;

pub struct RunResult {
    pub failed: usize,
}

pub async fn run_suites(
    config: &SuiteConfig,
    targets: &[ResourceTarget],
    output: OutputFormat,
) -> RunResult {
    let mut reports: Vec<SuiteReport> = Vec::with_capacity(targets.len());
    for target in targets {
        let suite = ResourceSuite::new(&target.endpoint, &target.name, config.clone());
        reports.push(suite.run_http().await);
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();

    match output {
        OutputFormat::Text => {
            let mut tap = Tap::new();
            for report in &reports {
                tap.add_report(report);
            }
            tap.finish();
        }
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&reports)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
            println!("{}", pretty);
        }
    }

    RunResult { failed }
}
