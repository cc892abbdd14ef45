//! Named per-response predicates
//!
//! A failing check is recorded in the `checks` rate and never stops the
//! virtual user that evaluated it.

use crate::models::{CheckResult, CheckRule, CheckSpec, RequestSample};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type Predicate = Arc<dyn Fn(&RequestSample) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Check {
    name: String,
    predicate: Predicate,
}

impl Check {
    pub fn new<S, F>(name: S, predicate: F) -> Self
    where
        S: Into<String>,
        F: Fn(&RequestSample) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn from_spec(spec: &CheckSpec) -> Self {
        match spec.rule.clone() {
            CheckRule::Status(code) => Self::new(spec.name.clone(), move |s: &RequestSample| {
                s.has_response() && s.status_code == code
            }),
            CheckRule::StatusRange { min, max } => Self::new(spec.name.clone(), move |s: &RequestSample| {
                s.has_response() && (min..=max).contains(&s.status_code)
            }),
            CheckRule::MaxLatencyMs(limit) => {
                let limit = Duration::from_millis(limit);
                Self::new(spec.name.clone(), move |s: &RequestSample| {
                    s.has_response() && s.latency <= limit
                })
            }
            CheckRule::BodyNotEmpty => Self::new(spec.name.clone(), |s: &RequestSample| {
                s.has_response() && s.body_size > 0
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, sample: &RequestSample) -> CheckResult {
        CheckResult {
            name: self.name.clone(),
            passed: (self.predicate)(sample),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Evaluate every check and attach the results to the sample
pub fn run_checks(checks: &[Check], sample: &mut RequestSample) {
    let results: Vec<CheckResult> = checks.iter().map(|c| c.evaluate(sample)).collect();
    sample.check_results.extend(results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, SampleError};
    use chrono::Utc;

    fn response(status: u16, latency_ms: u64, body: usize) -> RequestSample {
        RequestSample::response(0, Utc::now(), Duration::from_millis(latency_ms), status, body)
    }

    fn errored() -> RequestSample {
        RequestSample::failed(
            0,
            Utc::now(),
            Duration::from_millis(3),
            SampleError::new(ErrorKind::Connect, "refused"),
        )
    }

    #[test]
    fn test_status_check() {
        let check = Check::from_spec(&CheckSpec::status_is(200));
        assert_eq!(check.name(), "status is 200");
        assert!(check.evaluate(&response(200, 5, 0)).passed);
        assert!(!check.evaluate(&response(500, 5, 0)).passed);
        assert!(!check.evaluate(&errored()).passed);
    }

    #[test]
    fn test_status_range_check() {
        let check = Check::from_spec(&CheckSpec::new("2xx", CheckRule::StatusRange { min: 200, max: 299 }));
        assert!(check.evaluate(&response(204, 5, 0)).passed);
        assert!(!check.evaluate(&response(301, 5, 0)).passed);
    }

    #[test]
    fn test_latency_and_body_checks() {
        let fast = Check::from_spec(&CheckSpec::new("fast", CheckRule::MaxLatencyMs(100)));
        assert!(fast.evaluate(&response(200, 100, 0)).passed);
        assert!(!fast.evaluate(&response(200, 101, 0)).passed);
        assert!(!fast.evaluate(&errored()).passed);

        let body = Check::from_spec(&CheckSpec::new("body", CheckRule::BodyNotEmpty));
        assert!(body.evaluate(&response(200, 1, 12)).passed);
        assert!(!body.evaluate(&response(200, 1, 0)).passed);
    }

    #[test]
    fn test_run_checks_appends_in_order() {
        let checks = vec![
            Check::from_spec(&CheckSpec::status_is(200)),
            Check::new("custom", |s: &RequestSample| s.vu_id == 0),
        ];
        let mut sample = response(404, 5, 0);
        run_checks(&checks, &mut sample);

        assert_eq!(
            sample.check_results,
            vec![
                CheckResult { name: "status is 200".to_string(), passed: false },
                CheckResult { name: "custom".to_string(), passed: true },
            ]
        );
    }

    #[test]
    fn test_debug_shows_name() {
        let check = Check::from_spec(&CheckSpec::status_is(200));
        assert!(format!("{:?}", check).contains("status is 200"));
    }
}
