//! Orchestration of a tracking call: build the request, invoke the remote
//! collaborator, parse what comes back.

use async_trait::async_trait;

use crate::error::RemoteFault;
use crate::parser::{self, RemoteResponse};
use crate::request::{self, TrackingParams};
use crate::types::{OperationOutcome, TrackingQuery};

/// Code attached to faults synthesized from unusable responses
pub const GENERIC_FAULT_CODE: i32 = 0;

/// The remote tracking operation.
///
/// Implementations must be safe to share across tasks; the service calls
/// `invoke` once per [`TrackingService::track`] and never retries.
#[async_trait]
pub trait RemoteTracker: Send + Sync {
    async fn invoke(&self, params: &TrackingParams) -> Result<RemoteResponse, RemoteFault>;

    /// Clean up text coming from the service before it reaches the caller
    fn normalize_text(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Tracking entry point. Stateless across calls.
#[derive(Debug, Clone)]
pub struct TrackingService<T> {
    remote: T,
}

impl<T: RemoteTracker> TrackingService<T> {
    pub fn new(remote: T) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &T {
        &self.remote
    }

    /// Run one tracking query
    pub async fn track(&self, query: &TrackingQuery) -> OperationOutcome {
        let params = match request::build_params(query) {
            Ok(params) => params,
            Err(err) => {
                tracing::debug!("Rejected tracking query: {}", err);
                return err.into();
            }
        };

        tracing::debug!(
            "Tracking {} object(s), kind {} result {}",
            query.object_codes.len(),
            params.kind,
            params.result
        );

        let response = match self.remote.invoke(&params).await {
            Ok(response) => response,
            Err(fault) => {
                tracing::warn!("Remote fault {}: {}", fault.code, fault.message);
                return OperationOutcome::RemoteFault {
                    code: fault.code,
                    message: self.remote.normalize_text(&fault.message),
                };
            }
        };

        if let Some(problem) = response.shape_problem() {
            tracing::warn!("Unusable tracking response: {}", problem);
            return OperationOutcome::RemoteFault {
                code: GENERIC_FAULT_CODE,
                message: format!(
                    "Error querying tracking data. Response: \"{}\"",
                    response.raw_text()
                ),
            };
        }

        match parser::parse(response) {
            Ok(objects) => {
                tracing::debug!("Parsed {} tracked object(s)", objects.len());
                OperationOutcome::Success(objects)
            }
            Err(err) => {
                tracing::warn!("Failed to parse tracking response: {}", err);
                err.into()
            }
        }
    }
}
