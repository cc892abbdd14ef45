//! Threshold expressions and the metric catalogue they refer to

use crate::error::{AppError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// How a metric accumulates values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// Distribution of values (milliseconds), queried by percentile
    Trend,
    /// Fraction of events that were "true"
    Rate,
    /// Monotonic count
    Counter,
}

/// Metrics recorded by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    /// Latency of requests that received a response
    HttpReqDuration,
    /// Requests that errored or answered outside 200-399
    HttpReqFailed,
    /// Check evaluations that passed
    Checks,
    /// Total requests issued
    HttpReqs,
    /// Completed iterations
    Iterations,
}

impl MetricName {
    pub const ALL: [MetricName; 5] = [
        MetricName::HttpReqDuration,
        MetricName::HttpReqFailed,
        MetricName::Checks,
        MetricName::HttpReqs,
        MetricName::Iterations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HttpReqDuration => "http_req_duration",
            MetricName::HttpReqFailed => "http_req_failed",
            MetricName::Checks => "checks",
            MetricName::HttpReqs => "http_reqs",
            MetricName::Iterations => "iterations",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::HttpReqDuration => MetricKind::Trend,
            MetricName::HttpReqFailed | MetricName::Checks => MetricKind::Rate,
            MetricName::HttpReqs | MetricName::Iterations => MetricKind::Counter,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        MetricName::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = MetricName::ALL.iter().map(|m| m.as_str()).collect();
                AppError::config(format!(
                    "Unknown metric '{}' (known metrics: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Statistic computed from a metric before comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// `p(N)`, N in 0..=100
    Percentile(f64),
    Rate,
    Avg,
    Min,
    Max,
    Med,
    Count,
}

impl Aggregation {
    /// Whether this aggregation can be computed for a metric kind
    pub fn applies_to(&self, kind: MetricKind) -> bool {
        match self {
            Aggregation::Percentile(_)
            | Aggregation::Avg
            | Aggregation::Min
            | Aggregation::Max
            | Aggregation::Med => kind == MetricKind::Trend,
            Aggregation::Rate => matches!(kind, MetricKind::Rate | MetricKind::Counter),
            Aggregation::Count => true,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Count => f.write_str("count"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

impl Comparator {
    pub fn apply(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparator::Lt => observed < bound,
            Comparator::Le => observed <= bound,
            Comparator::Gt => observed > bound,
            Comparator::Ge => observed >= bound,
            Comparator::Eq => (observed - bound).abs() < f64::EPSILON,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
        }
    }
}

impl FromStr for Comparator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "==" => Ok(Comparator::Eq),
            other => Err(AppError::config(format!("Unknown comparator '{}'", other))),
        }
    }
}

/// A pass/fail condition over an aggregated metric, e.g. `http_req_duration: p(95)<500`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdExpr {
    pub metric: MetricName,
    pub aggregation: Aggregation,
    pub comparator: Comparator,
    pub bound: f64,
    /// Expression as written by the user
    pub source: String,
}

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\s*(?P<agg>p\(\s*(?P<pct>\d+(?:\.\d+)?)\s*\)|rate|avg|min|max|med|count)\s*(?P<op><=|>=|==|<|>)\s*(?P<bound>-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*$",
        )
        .expect("threshold expression pattern is valid")
    })
}

impl ThresholdExpr {
    /// Parse an expression such as `p(95)<500` for the given metric
    pub fn parse(metric: &str, expression: &str) -> Result<Self> {
        let metric = MetricName::from_str(metric)?;

        let caps = expression_pattern().captures(expression).ok_or_else(|| {
            AppError::config(format!(
                "Invalid threshold '{}' for {}: expected e.g. 'p(95)<500' or 'rate<0.01'",
                expression, metric
            ))
        })?;

        let aggregation = match &caps["agg"] {
            "rate" => Aggregation::Rate,
            "avg" => Aggregation::Avg,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "med" => Aggregation::Med,
            "count" => Aggregation::Count,
            _ => {
                let pct: f64 = caps["pct"].parse()?;
                if !(0.0..=100.0).contains(&pct) {
                    return Err(AppError::config(format!(
                        "Percentile in '{}' must be between 0 and 100",
                        expression
                    )));
                }
                Aggregation::Percentile(pct)
            }
        };

        if !aggregation.applies_to(metric.kind()) {
            return Err(AppError::config(format!(
                "Aggregation '{}' is not available for {} ({:?} metric)",
                aggregation,
                metric,
                metric.kind()
            )));
        }

        let comparator = Comparator::from_str(&caps["op"])?;
        let bound: f64 = caps["bound"]
            .parse()
            .map_err(|_| AppError::config(format!("Invalid bound in threshold '{}'", expression)))?;

        Ok(Self {
            metric,
            aggregation,
            comparator,
            bound,
            source: expression.trim().to_string(),
        })
    }

    /// Parse the command-line form `metric:expression`
    pub fn parse_pair(pair: &str) -> Result<Self> {
        let (metric, expression) = pair.split_once(':').ok_or_else(|| {
            AppError::config(format!(
                "Invalid threshold '{}': expected METRIC:EXPR, e.g. http_req_duration:p(95)<500",
                pair
            ))
        })?;
        Self::parse(metric, expression)
    }

    /// Apply the comparator to an observed value
    pub fn holds_for(&self, observed: f64) -> bool {
        self.comparator.apply(observed, self.bound)
    }
}

impl fmt::Display for ThresholdExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.source)
    }
}

/// Serde adapter for the scenario-file form `{ "metric": ["expr", ...] }`, keeping document order
pub mod threshold_map_serde {
    use super::ThresholdExpr;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(thresholds: &[ThresholdExpr], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Group consecutive expressions per metric in first-seen order
        let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
        for threshold in thresholds {
            let name = threshold.metric.as_str();
            match grouped.iter_mut().find(|(metric, _)| *metric == name) {
                Some((_, exprs)) => exprs.push(&threshold.source),
                None => grouped.push((name, vec![&threshold.source])),
            }
        }

        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (metric, exprs) in grouped {
            map.serialize_entry(metric, &exprs)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<ThresholdExpr>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ThresholdMapVisitor;

        impl<'de> Visitor<'de> for ThresholdMapVisitor {
            type Value = Vec<ThresholdExpr>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of metric names to lists of threshold expressions")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut thresholds = Vec::new();
                while let Some((metric, exprs)) = access.next_entry::<String, Vec<String>>()? {
                    for expr in exprs {
                        let parsed = ThresholdExpr::parse(&metric, &expr)
                            .map_err(serde::de::Error::custom)?;
                        thresholds.push(parsed);
                    }
                }
                Ok(thresholds)
            }
        }

        deserializer.deserialize_map(ThresholdMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percentile() {
        let t = ThresholdExpr::parse("http_req_duration", "p(95)<500").unwrap();
        assert_eq!(t.metric, MetricName::HttpReqDuration);
        assert_eq!(t.aggregation, Aggregation::Percentile(95.0));
        assert_eq!(t.comparator, Comparator::Lt);
        assert_eq!(t.bound, 500.0);
        assert_eq!(t.source, "p(95)<500");
    }

    #[test]
    fn test_parse_rate_with_spaces() {
        let t = ThresholdExpr::parse("http_req_failed", " rate <= 0.01 ").unwrap();
        assert_eq!(t.aggregation, Aggregation::Rate);
        assert_eq!(t.comparator, Comparator::Le);
        assert!((t.bound - 0.01).abs() < f64::EPSILON);
        assert_eq!(t.source, "rate <= 0.01");
    }

    #[test]
    fn test_parse_fractional_percentile_and_other_aggregations() {
        let t = ThresholdExpr::parse("http_req_duration", "p(99.9)>=1e3").unwrap();
        assert_eq!(t.aggregation, Aggregation::Percentile(99.9));
        assert_eq!(t.bound, 1000.0);

        for (expr, agg) in [
            ("avg<200", Aggregation::Avg),
            ("min<1", Aggregation::Min),
            ("max<2000", Aggregation::Max),
            ("med<100", Aggregation::Med),
            ("count>10", Aggregation::Count),
        ] {
            assert_eq!(ThresholdExpr::parse("http_req_duration", expr).unwrap().aggregation, agg);
        }
    }

    #[test]
    fn test_unknown_metric_is_config_error() {
        let err = ThresholdExpr::parse("http_req_latency", "p(95)<500").unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("http_req_latency"));
    }

    #[test]
    fn test_invalid_aggregation_for_metric_kind() {
        assert!(ThresholdExpr::parse("http_req_failed", "p(95)<500").is_err());
        assert!(ThresholdExpr::parse("http_req_duration", "rate<0.01").is_err());
        assert!(ThresholdExpr::parse("http_reqs", "avg<3").is_err());
        assert!(ThresholdExpr::parse("http_reqs", "count>100").is_ok());
        assert!(ThresholdExpr::parse("iterations", "rate>1").is_ok());
        assert!(ThresholdExpr::parse("checks", "rate>0.99").is_ok());
    }

    #[test]
    fn test_malformed_expressions() {
        for bad in ["p95<500", "p(95)", "<500", "p(95)<", "p(101)<5", "rate!=0", "rate<abc"] {
            assert!(
                ThresholdExpr::parse("http_req_duration", bad).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
        assert!(ThresholdExpr::parse("http_req_failed", "rate!=0").is_err());
    }

    #[test]
    fn test_parse_pair() {
        let t = ThresholdExpr::parse_pair("http_req_failed:rate<0.01").unwrap();
        assert_eq!(t.metric, MetricName::HttpReqFailed);
        assert!(ThresholdExpr::parse_pair("rate<0.01").is_err());
    }

    #[test]
    fn test_comparators() {
        assert!(Comparator::Lt.apply(1.0, 2.0));
        assert!(!Comparator::Lt.apply(2.0, 2.0));
        assert!(Comparator::Le.apply(2.0, 2.0));
        assert!(Comparator::Gt.apply(3.0, 2.0));
        assert!(Comparator::Ge.apply(2.0, 2.0));
        assert!(Comparator::Eq.apply(0.5, 0.5));
        assert!(!Comparator::Eq.apply(0.5, 0.6));
    }

    #[test]
    fn test_threshold_map_keeps_document_order() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            #[serde(with = "threshold_map_serde")]
            thresholds: Vec<ThresholdExpr>,
        }

        let json = r#"{"thresholds": {
            "http_req_failed": ["rate<0.01"],
            "http_req_duration": ["p(95)<500", "p(99)<1500"]
        }}"#;
        let holder: Holder = serde_json::from_str(json).unwrap();
        let sources: Vec<String> = holder.thresholds.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            sources,
            vec![
                "http_req_failed: rate<0.01",
                "http_req_duration: p(95)<500",
                "http_req_duration: p(99)<1500",
            ]
        );

        let back = serde_json::to_string(&holder).unwrap();
        assert_eq!(
            back,
            r#"{"thresholds":{"http_req_failed":["rate<0.01"],"http_req_duration":["p(95)<500","p(99)<1500"]}}"#
        );
    }

    #[test]
    fn test_threshold_map_rejects_bad_entries() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(with = "threshold_map_serde")]
            #[allow(dead_code)]
            thresholds: Vec<ThresholdExpr>,
        }

        let err = serde_json::from_str::<Holder>(r#"{"thresholds": {"http_req_duration": ["p95<500"]}}"#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Invalid threshold"));
    }
}
