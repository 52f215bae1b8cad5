//! Translation of a [`TrackingQuery`] into the flat parameters of a remote call.

use crate::error::TrackingError;
use crate::types::TrackingQuery;

/// Locale id the service expects for every query
pub const LANGUAGE: u32 = 101;

/// Flat parameter map for the `buscaEventos` remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingParams {
    pub user: String,
    pub password: String,
    pub kind: &'static str,
    pub result: &'static str,
    pub language: u32,
    /// All object codes concatenated, no delimiter
    pub objects: String,
}

impl TrackingParams {
    /// Key/value pairs in wire order
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user", self.user.clone()),
            ("password", self.password.clone()),
            ("kind", self.kind.to_string()),
            ("result", self.result.to_string()),
            ("language", self.language.to_string()),
            ("objects", self.objects.clone()),
        ]
    }
}

/// Validate a query and serialize it into [`TrackingParams`]
pub fn build_params(query: &TrackingQuery) -> Result<TrackingParams, TrackingError> {
    if query.object_codes.is_empty() {
        return Err(TrackingError::validation(
            "Error tracking objects. No objects informed.",
        ));
    }
    if query.object_codes.iter().any(|code| code.trim().is_empty()) {
        return Err(TrackingError::validation("empty object code"));
    }

    Ok(TrackingParams {
        user: query.credentials.user.clone(),
        password: query.credentials.password.clone(),
        kind: query.tracking_kind.wire_code(),
        result: query.result_kind.wire_code(),
        language: LANGUAGE,
        objects: query.object_codes.concat(),
    })
}
