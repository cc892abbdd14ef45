//! Per-request measurement records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Broad class of a transport-level failure
///
/// The set is closed so per-kind error counts stay bounded no matter how
/// many distinct messages a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request exceeded its timeout
    Timeout,
    /// Could not connect to the target
    Connect,
    /// Response body could not be read
    Body,
    /// Request cancelled by the hard stop
    Cancelled,
    /// Any other client-side failure
    Request,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connect => "connect",
            ErrorKind::Body => "body",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Request => "request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SampleError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            ErrorKind::Timeout
        } else if error.is_connect() {
            ErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            ErrorKind::Body
        } else {
            ErrorKind::Request
        };
        Self::new(kind, error.to_string())
    }
}

/// Outcome of a named check against one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

/// One request issued by one virtual user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSample {
    pub vu_id: usize,
    /// Wall-clock time the request was issued
    pub started_at: DateTime<Utc>,
    pub latency: Duration,
    /// HTTP status, 0 when no response was received
    pub status_code: u16,
    pub body_size: usize,
    pub errored: bool,
    pub error: Option<SampleError>,
    pub check_results: Vec<CheckResult>,
}

impl RequestSample {
    /// A request that received a response (any status)
    pub fn response(
        vu_id: usize,
        started_at: DateTime<Utc>,
        latency: Duration,
        status_code: u16,
        body_size: usize,
    ) -> Self {
        Self {
            vu_id,
            started_at,
            latency,
            status_code,
            body_size,
            errored: false,
            error: None,
            check_results: Vec::new(),
        }
    }

    /// A request that produced no response
    pub fn failed(vu_id: usize, started_at: DateTime<Utc>, latency: Duration, error: SampleError) -> Self {
        Self {
            vu_id,
            started_at,
            latency,
            status_code: 0,
            body_size: 0,
            errored: true,
            error: Some(error),
            check_results: Vec::new(),
        }
    }

    /// A request abandoned when the grace period ran out
    pub fn cancelled(vu_id: usize, started_at: DateTime<Utc>, latency: Duration) -> Self {
        Self::failed(
            vu_id,
            started_at,
            latency,
            SampleError::new(ErrorKind::Cancelled, "request cancelled after grace period"),
        )
    }

    /// Counted by `http_req_failed`: errored, or status outside 200-399
    pub fn is_failed(&self) -> bool {
        self.errored || !(200..400).contains(&self.status_code)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(&self.error, Some(e) if e.kind == ErrorKind::Cancelled)
    }

    pub fn has_response(&self) -> bool {
        !self.errored
    }

    pub fn latency_ms(&self) -> f64 {
        crate::types::duration_ms(self.latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_classification() {
        let now = Utc::now();
        let ok = RequestSample::response(0, now, Duration::from_millis(5), 200, 10);
        assert!(!ok.is_failed());
        assert!(ok.has_response());

        let redirect = RequestSample::response(0, now, Duration::from_millis(5), 302, 0);
        assert!(!redirect.is_failed());

        let server_error = RequestSample::response(0, now, Duration::from_millis(5), 500, 0);
        assert!(server_error.is_failed());
        assert!(server_error.has_response());

        let info = RequestSample::response(0, now, Duration::from_millis(5), 101, 0);
        assert!(info.is_failed());
    }

    #[test]
    fn test_errored_sample() {
        let sample = RequestSample::failed(
            2,
            Utc::now(),
            Duration::from_secs(10),
            SampleError::new(ErrorKind::Timeout, "timed out"),
        );
        assert!(sample.errored);
        assert!(sample.is_failed());
        assert!(!sample.has_response());
        assert!(!sample.is_cancelled());
        assert_eq!(sample.status_code, 0);
    }

    #[test]
    fn test_cancelled_sample() {
        let sample = RequestSample::cancelled(1, Utc::now(), Duration::from_secs(7));
        assert!(sample.is_cancelled());
        assert!(sample.is_failed());
        assert_eq!(sample.error.as_ref().unwrap().kind, ErrorKind::Cancelled);
    }

    #[test]
    fn test_sample_serializes_error_kind() {
        let sample = RequestSample::failed(
            0,
            Utc::now(),
            Duration::from_millis(1),
            SampleError::new(ErrorKind::Connect, "refused"),
        );
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["error"]["kind"], "connect");
        assert_eq!(json["status_code"], 0);
    }
}
