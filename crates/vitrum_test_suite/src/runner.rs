//! Runs glass suites through the harness and collects a report
//!
//! Cases are addressed as `suite::case`; that name picks the reference PNG
//! and is what `--filter` matches against.

use std::time::{Duration, Instant};

use crate::harness::{TestContext, TestHarness, TestResult};

type SceneSetup = Box<dyn FnOnce(&mut TestContext) + Send>;

/// One scenario: paints the frame and places the glass
pub struct TestCase {
    pub name: String,
    /// Viewport override; `None` renders at the harness default
    pub viewport: Option<(u32, u32)>,
    setup: SceneSetup,
}

/// Cases sharing a name prefix
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, name: &str, setup: F) -> &mut Self
    where
        F: FnOnce(&mut TestContext) + Send + 'static,
    {
        self.push(name, None, setup)
    }

    /// Add a case rendered at `width`x`height` instead of the default viewport
    pub fn add_sized<F>(&mut self, name: &str, width: u32, height: u32, setup: F) -> &mut Self
    where
        F: FnOnce(&mut TestContext) + Send + 'static,
    {
        self.push(name, Some((width, height)), setup)
    }

    fn push<F>(&mut self, name: &str, viewport: Option<(u32, u32)>, setup: F) -> &mut Self
    where
        F: FnOnce(&mut TestContext) + Send + 'static,
    {
        self.cases.push(TestCase {
            name: name.to_string(),
            viewport,
            setup: Box::new(setup),
        });
        self
    }

    /// `suite::case` names, in insertion order
    pub fn qualified_names(&self) -> impl Iterator<Item = String> + '_ {
        self.cases
            .iter()
            .map(move |case| format!("{}::{}", self.name, case.name))
    }
}

/// Outcome of one case
#[derive(Debug)]
pub struct CaseReport {
    pub suite: String,
    pub name: String,
    pub viewport: (u32, u32),
    pub result: TestResult,
    pub elapsed: Duration,
}

impl CaseReport {
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }
}

pub struct TestRunner {
    harness: TestHarness,
    filter: Option<String>,
}

impl TestRunner {
    pub fn new(harness: TestHarness) -> Self {
        Self {
            harness,
            filter: None,
        }
    }

    /// Only run cases whose `suite::case` name contains `pattern`
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    pub fn harness(&self) -> &TestHarness {
        &self.harness
    }

    fn selects(&self, qualified: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |pattern| qualified.contains(pattern))
    }

    pub fn run(&self, suites: Vec<TestSuite>) -> RunReport {
        let started = Instant::now();
        let mut cases = Vec::new();
        for suite in suites {
            for case in suite.cases {
                let qualified = format!("{}::{}", suite.name, case.name);
                if self.selects(&qualified) {
                    cases.push(self.run_case(&suite.name, &qualified, case));
                }
            }
        }
        RunReport {
            cases,
            elapsed: started.elapsed(),
        }
    }

    fn run_case(&self, suite: &str, qualified: &str, case: TestCase) -> CaseReport {
        let viewport = case.viewport.unwrap_or(self.harness.default_size());
        let started = Instant::now();
        let result = self
            .harness
            .run_test_with_size(qualified, viewport.0, viewport.1, case.setup)
            .unwrap_or_else(|err| TestResult::Errored {
                message: format!("{:#}", err),
            });
        let elapsed = started.elapsed();

        match &result {
            TestResult::Errored { message } => {
                tracing::error!(case = qualified, "{}", message)
            }
            TestResult::Failed { difference, .. } => {
                tracing::warn!(case = qualified, difference, ?elapsed, "mismatch")
            }
            _ => tracing::debug!(case = qualified, ?elapsed, "ok"),
        }

        CaseReport {
            suite: suite.to_string(),
            name: case.name,
            viewport,
            result,
            elapsed,
        }
    }
}

/// Pass counts of one suite
#[derive(Debug, PartialEq, Eq)]
pub struct SuiteSummary {
    pub name: String,
    pub passed: usize,
    pub total: usize,
    pub new_references: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|c| c.result.is_passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.result.is_passed())
    }

    /// Per-suite counts in the order suites were run
    pub fn suites(&self) -> Vec<SuiteSummary> {
        let mut out: Vec<SuiteSummary> = Vec::new();
        for case in &self.cases {
            let index = match out.iter().position(|s| s.name == case.suite) {
                Some(index) => index,
                None => {
                    out.push(SuiteSummary {
                        name: case.suite.clone(),
                        passed: 0,
                        total: 0,
                        new_references: 0,
                    });
                    out.len() - 1
                }
            };
            let summary = &mut out[index];
            summary.total += 1;
            match case.result {
                TestResult::Passed => summary.passed += 1,
                TestResult::PassedWithNewReference => {
                    summary.passed += 1;
                    summary.new_references += 1;
                }
                _ => {}
            }
        }
        out
    }

    pub fn print(&self) {
        println!();
        for suite in self.suites() {
            print!("{:<10} {:>3}/{:<3}", suite.name, suite.passed, suite.total);
            if suite.new_references > 0 {
                print!("  ({} new references)", suite.new_references);
            }
            println!();
        }

        let mut failures = self.failures().peekable();
        if failures.peek().is_some() {
            println!();
        }
        for case in failures {
            let (w, h) = case.viewport;
            match &case.result {
                TestResult::Failed {
                    difference,
                    diff_path,
                } => println!(
                    "FAIL  {} [{}x{}] off by {:.3}%, diff at {}",
                    case.qualified_name(),
                    w,
                    h,
                    difference * 100.0,
                    diff_path.display()
                ),
                TestResult::Errored { message } => {
                    println!("ERROR {} [{}x{}] {}", case.qualified_name(), w, h, message)
                }
                _ => {}
            }
        }

        let passed = self.cases.iter().filter(|c| c.result.is_passed()).count();
        println!(
            "\n{} of {} glass cases passed in {:.2?}",
            passed,
            self.cases.len(),
            self.elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestHarnessConfig;
    use vitrum_core::{Color, GlassSettings, ShapeDescriptor, Size, Vec2};

    fn runner(tag: &str) -> TestRunner {
        let root = std::env::temp_dir().join(format!("vitrum_runner_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let harness = TestHarness::with_config(TestHarnessConfig {
            output_dir: root.clone(),
            reference_dir: root.join("references"),
            default_size: (24, 16),
            threshold: 0.001,
        })
        .unwrap();
        TestRunner::new(harness)
    }

    fn suites() -> Vec<TestSuite> {
        let mut plain = TestSuite::new("plain");
        plain.add("grey", |ctx| ctx.fill_background(Color::rgb(0.5, 0.5, 0.5)));
        plain.add_sized("strip", 32, 8, |ctx| ctx.fill_background(Color::WHITE));

        let mut glass = TestSuite::new("glass");
        glass.add("lens", |ctx| {
            ctx.checkerboard(4, Color::BLACK, Color::WHITE);
            ctx.settings = GlassSettings::clear();
            ctx.add_shape(ShapeDescriptor::ellipse(Vec2::new(12.0, 8.0), Size::new(16.0, 12.0)));
        });
        vec![plain, glass]
    }

    #[test]
    fn test_first_run_creates_references() {
        let report = runner("first").run(suites());

        assert_eq!(report.cases.len(), 3);
        assert!(report.all_passed());
        let summaries = report.suites();
        assert_eq!(summaries[0].name, "plain");
        assert_eq!(summaries[0].total, 2);
        assert_eq!(summaries[0].new_references, 2);
        assert_eq!(summaries[1].name, "glass");
    }

    #[test]
    fn test_second_run_matches_references() {
        let runner = runner("second");
        runner.run(suites());
        let report = runner.run(suites());

        assert!(report.all_passed());
        assert!(report
            .cases
            .iter()
            .all(|c| matches!(c.result, TestResult::Passed)));
    }

    #[test]
    fn test_filter_matches_qualified_name() {
        let report = runner("filter").with_filter("plain::st").run(suites());

        assert_eq!(report.cases.len(), 1);
        assert_eq!(report.cases[0].qualified_name(), "plain::strip");
        assert_eq!(report.cases[0].viewport, (32, 8));
    }

    #[test]
    fn test_render_error_is_reported() {
        let mut suite = TestSuite::new("broken");
        suite.add("negative_size", |ctx| {
            ctx.add_shape(ShapeDescriptor::rounded_rect(
                Vec2::new(4.0, 4.0),
                Size::new(-1.0, 4.0),
                0.0,
            ));
        });
        let report = runner("error").run(vec![suite]);

        assert!(!report.all_passed());
        assert!(matches!(
            report.cases[0].result,
            TestResult::Errored { .. }
        ));
        assert_eq!(report.failures().count(), 1);
    }
}
