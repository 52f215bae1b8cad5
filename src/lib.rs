pub mod classifier;
pub mod client;
pub mod error;
pub mod label;
pub mod parser;
pub mod request;
pub mod service;
pub mod types;

pub use client::{SoapClient, SroConfig};
pub use error::{RemoteFault, TrackingError};
pub use label::with_check_digit;
pub use parser::RemoteResponse;
pub use request::TrackingParams;
pub use service::{RemoteTracker, TrackingService};
pub use types::{
    Credentials, OperationOutcome, ResultKind, TrackedObjectResult, TrackingEvent, TrackingKind,
    TrackingQuery,
};
