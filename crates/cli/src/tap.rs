use crudcheck_conformance::{Outcome, SuiteReport};

/// TAP (Test Anything Protocol) v14 output for a sequence of suite reports.
pub struct Tap {
    tests: Vec<TapTest>,
    comments: Vec<String>,
}

struct TapTest {
    ok: bool,
    desc: String,
    diagnostics: Option<String>,
}

impl Tap {
    pub fn new() -> Self {
        Tap {
            tests: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn ok(&mut self, desc: impl Into<String>) {
        self.tests.push(TapTest {
            ok: true,
            desc: desc.into(),
            diagnostics: None,
        });
    }

    pub fn not_ok(&mut self, desc: impl Into<String>, diagnostics: impl Into<String>) {
        self.tests.push(TapTest {
            ok: false,
            desc: desc.into(),
            diagnostics: Some(diagnostics.into()),
        });
    }

    /// A case that never ran: `not ok` with the reason as a diagnostic, never a SKIP.
    pub fn not_run(&mut self, desc: impl Into<String>, reason: impl Into<String>) {
        self.not_ok(desc, format!("not run: {}", reason.into()));
    }

    pub fn comment(&mut self, line: impl Into<String>) {
        self.comments.push(line.into());
    }

    /// Add every scenario of a suite, then its setup and teardown notes.
    pub fn add_report(&mut self, report: &SuiteReport) {
        if let Some(ref error) = report.setup_error {
            self.comment(format!("{}: setup failed: {}", report.endpoint, error));
        }
        for scenario in &report.scenarios {
            let desc = format!("{} > {}", scenario.group.title(&report.endpoint), scenario.title);
            match &scenario.outcome {
                Outcome::Passed => self.ok(desc),
                Outcome::Failed { kind, message } => {
                    self.not_ok(desc, format!("{} failure: {}", kind, message))
                }
                Outcome::NotRun { reason } => self.not_run(desc, reason.clone()),
            }
        }
        if let Some(ref teardown) = report.teardown {
            self.comment(format!(
                "{}: teardown deleted {} of {} listed objects",
                report.endpoint,
                teardown.deleted.len(),
                teardown.listed
            ));
            if let Some(ref error) = teardown.list_error {
                self.comment(format!("{}: teardown listing failed: {}", report.endpoint, error));
            }
            for failure in &teardown.failed {
                let id = failure
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "?".to_string());
                self.comment(format!(
                    "{}: teardown could not delete {}: {}",
                    report.endpoint, id, failure.reason
                ));
            }
        }
    }

    pub fn failure_count(&self) -> usize {
        self.tests.iter().filter(|t| !t.ok).count()
    }

    pub fn render(&self) -> String {
        let mut out = Vec::new();
        out.push("TAP version 14".to_string());
        out.push(format!("1..{}", self.tests.len()));
        for (i, t) in self.tests.iter().enumerate() {
            let n = i + 1;
            let status = if t.ok { "ok" } else { "not ok" };
            out.push(format!("{} {} - {}", status, n, t.desc));
            if let Some(diag) = &t.diagnostics {
                // TAP diagnostics are prefixed with "# "
                for line in diag.lines() {
                    out.push(format!("  # {}", line));
                }
            }
        }
        for comment in &self.comments {
            out.push(format!("# {}", comment));
        }
        let fail = self.failure_count();
        out.push(format!("# tests {}", self.tests.len()));
        out.push(format!("# pass  {}", self.tests.len() - fail));
        out.push(format!("# fail  {}", fail));
        out.join("\n")
    }

    pub fn finish(self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crudcheck_conformance::{FailureKind, ScenarioId};

    fn report() -> SuiteReport {
        let mut report = SuiteReport::new("widgets", "widget");
        report.record(ScenarioId::CreateOne, Outcome::Passed);
        report.record(
            ScenarioId::ListAll,
            Outcome::Failed {
                kind: FailureKind::Assertion,
                message: "object #0 has extra keys\nsecond line".to_string(),
            },
        );
        report
    }

    #[test]
    fn renders_plan_and_results() {
        let mut tap = Tap::new();
        tap.add_report(&report());
        let out = tap.render();

        assert!(out.starts_with("TAP version 14\n1..2\n"));
        assert!(out.contains(
            "ok 1 - widgets: authorized requests > creates a new widget on POST /widgets"
        ));
        assert!(out.contains("not ok 2 - widgets: authorized requests > lists all widgets"));
        assert!(out.contains("  # assertion failure: object #0 has extra keys"));
        assert!(out.contains("  # second line"));
        assert!(out.ends_with("# tests 2\n# pass  1\n# fail  1"));
        assert_eq!(tap.failure_count(), 1);
    }

    #[test]
    fn not_run_cases_are_plain_failures_without_skip() {
        let mut report = SuiteReport::new("widgets", "widget");
        report.setup_error = Some("token endpoint down".to_string());
        report.record(
            ScenarioId::CreateOne,
            Outcome::NotRun {
                reason: "no credential".to_string(),
            },
        );
        let mut tap = Tap::new();
        tap.add_report(&report);
        let out = tap.render();

        assert!(out.contains("not ok 1 - widgets: authorized requests > creates a new widget on POST /widgets\n"));
        assert!(out.contains("  # not run: no credential"));
        assert!(!out.contains("SKIP"));
        assert!(out.contains("# widgets: setup failed: token endpoint down"));
        assert_eq!(tap.failure_count(), 1);
    }
}
