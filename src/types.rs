use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;

/// Whether the query names each object or a contiguous range of objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingKind {
    ListOfObjects,
    RangeOfObjects,
}

impl TrackingKind {
    /// One-letter code sent on the wire
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::ListOfObjects => "L",
            Self::RangeOfObjects => "F",
        }
    }
}

impl FromStr for TrackingKind {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "l" => Ok(Self::ListOfObjects),
            "range" | "f" => Ok(Self::RangeOfObjects),
            _ => Err(TrackingError::validation(format!(
                "invalid tracking kind '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for TrackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListOfObjects => write!(f, "LIST"),
            Self::RangeOfObjects => write!(f, "RANGE"),
        }
    }
}

/// Whether only the latest event or the full history is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    LastEventOnly,
    AllEvents,
}

impl ResultKind {
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::LastEventOnly => "U",
            Self::AllEvents => "T",
        }
    }
}

impl FromStr for ResultKind {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "u" => Ok(Self::LastEventOnly),
            "all" | "t" => Ok(Self::AllEvents),
            _ => Err(TrackingError::validation(format!(
                "invalid result kind '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastEventOnly => write!(f, "LAST_EVENT"),
            Self::AllEvents => write!(f, "ALL_EVENTS"),
        }
    }
}

/// Service account used to authenticate tracking queries
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// A tracking query as built by the caller
#[derive(Debug, Clone)]
pub struct TrackingQuery {
    pub tracking_kind: TrackingKind,
    pub result_kind: ResultKind,
    pub credentials: Credentials,
    /// Codes already in their check-digit form (see [`crate::label`])
    pub object_codes: Vec<String>,
}

impl TrackingQuery {
    /// List query over the given codes, requesting every event
    pub fn list(credentials: Credentials, object_codes: Vec<String>) -> Self {
        Self {
            tracking_kind: TrackingKind::ListOfObjects,
            result_kind: ResultKind::AllEvents,
            credentials,
            object_codes,
        }
    }

    pub fn with_result_kind(mut self, result_kind: ResultKind) -> Self {
        self.result_kind = result_kind;
        self
    }

    pub fn with_tracking_kind(mut self, tracking_kind: TrackingKind) -> Self {
        self.tracking_kind = tracking_kind;
        self
    }
}

/// A single classified tracking event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub event_type: String,
    pub status: i32,
    pub timestamp: NaiveDateTime,
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

/// Events reported for one tracked object, in the order the service sent them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedObjectResult {
    object_code: String,
    #[serde(default)]
    events: Vec<TrackingEvent>,
}

impl TrackedObjectResult {
    pub fn new(object_code: impl Into<String>, events: Vec<TrackingEvent>) -> Self {
        Self {
            object_code: object_code.into(),
            events,
        }
    }

    pub fn object_code(&self) -> &str {
        &self.object_code
    }

    pub fn events(&self) -> &[TrackingEvent] {
        &self.events
    }
}

/// Outcome of one tracking call. Every exit of
/// [`TrackingService::track`](crate::service::TrackingService::track) is one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success(Vec<TrackedObjectResult>),
    RemoteFault { code: i32, message: String },
    ValidationError(String),
    ParseError(String),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert into a `Result` so callers can use `?`
    pub fn into_result(self) -> Result<Vec<TrackedObjectResult>, TrackingError> {
        match self {
            Self::Success(objects) => Ok(objects),
            Self::RemoteFault { code, message } => {
                Err(crate::error::RemoteFault { code, message }.into())
            }
            Self::ValidationError(msg) => Err(TrackingError::Validation(msg)),
            Self::ParseError(msg) => Err(TrackingError::Parse(msg)),
        }
    }
}

impl From<TrackingError> for OperationOutcome {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Validation(msg) => Self::ValidationError(msg),
            TrackingError::RemoteFault(fault) => Self::RemoteFault {
                code: fault.code,
                message: fault.message,
            },
            TrackingError::Parse(msg) => Self::ParseError(msg),
        }
    }
}

impl From<Result<Vec<TrackedObjectResult>, TrackingError>> for OperationOutcome {
    fn from(result: Result<Vec<TrackedObjectResult>, TrackingError>) -> Self {
        match result {
            Ok(objects) => Self::Success(objects),
            Err(err) => err.into(),
        }
    }
}
