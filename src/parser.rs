//! Normalization of remote responses into [`TrackedObjectResult`]s.

use serde::Deserialize;

use crate::classifier::{self, RawEvent};
use crate::error::TrackingError;
use crate::types::TrackedObjectResult;

/// Member of a structured response that carries the result
pub const RESULT_FIELD: &str = "return";

/// Raw response handed back by the remote collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse {
    /// Object graph from the primary call path. Holds one consolidated result
    /// under [`RESULT_FIELD`].
    Structured(serde_json::Value),
    /// Raw XML document
    Xml(String),
}

impl RemoteResponse {
    /// Describe why this response cannot be parsed at all, if it can't
    pub fn shape_problem(&self) -> Option<&'static str> {
        match self {
            Self::Structured(serde_json::Value::Object(map)) => match map.get(RESULT_FIELD) {
                None | Some(serde_json::Value::Null) => Some("missing result field"),
                Some(_) => None,
            },
            Self::Structured(serde_json::Value::Null) => Some("empty response"),
            Self::Structured(_) => Some("response is not an object"),
            Self::Xml(body) if body.trim().is_empty() => Some("empty response"),
            Self::Xml(_) => None,
        }
    }

    /// Raw text of the response for error messages
    pub fn raw_text(&self) -> String {
        match self {
            Self::Structured(serde_json::Value::String(s)) => s.clone(),
            Self::Structured(value) => value.to_string(),
            Self::Xml(body) => body.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SroDocument {
    #[serde(default)]
    error: Option<String>,
    #[serde(rename = "qtd", default)]
    declared_count: Option<String>,
    #[serde(rename = "objeto", default)]
    objects: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(rename = "numero")]
    code: String,
    #[serde(rename = "evento", default)]
    events: Vec<RawEvent>,
}

/// Parse a remote response into per-object results
pub fn parse(raw: RemoteResponse) -> Result<Vec<TrackedObjectResult>, TrackingError> {
    match raw {
        RemoteResponse::Structured(value) => parse_structured(value),
        RemoteResponse::Xml(body) => parse_xml(&body),
    }
}

fn parse_structured(mut value: serde_json::Value) -> Result<Vec<TrackedObjectResult>, TrackingError> {
    let payload = value
        .get_mut(RESULT_FIELD)
        .map(serde_json::Value::take)
        .ok_or_else(|| TrackingError::parse("structured response has no result field"))?;
    let result: TrackedObjectResult = serde_json::from_value(payload)?;
    Ok(vec![result])
}

/// Parse an XML tracking document
pub fn parse_xml(body: &str) -> Result<Vec<TrackedObjectResult>, TrackingError> {
    let doc: SroDocument = quick_xml::de::from_str(body)?;

    if let Some(error) = doc.error.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        return Err(TrackingError::parse(format!(
            "Error tracking objects. Service response: \"{}\"",
            error
        )));
    }

    if doc.objects.is_empty() {
        return Ok(Vec::new());
    }

    // A missing count reads nothing.
    let declared = match doc.declared_count.as_deref().map(str::trim) {
        Some(count) => count
            .parse::<usize>()
            .map_err(|_| TrackingError::parse(format!("invalid object count '{}'", count)))?,
        None => 0,
    };
    if declared != doc.objects.len() {
        tracing::warn!(
            "Declared object count {} differs from {} object entries",
            declared,
            doc.objects.len()
        );
    }

    doc.objects
        .into_iter()
        .take(declared)
        .map(|object| {
            let events = object
                .events
                .into_iter()
                .map(classifier::classify)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TrackedObjectResult::new(object.code.trim(), events))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_xml(tipo: &str, status: &str, hora: &str) -> String {
        format!(
            "<evento><tipo>{tipo}</tipo><status>{status}</status><data>15/03/2024</data>\
             <hora>{hora}</hora><descricao>Objeto postado</descricao><local>AGF CENTRO</local>\
             <codigo>01001000</codigo><cidade>SAO PAULO</cidade><uf>SP</uf></evento>"
        )
    }

    #[test]
    fn test_error_field_fails_whole_parse() {
        let body = "<sroxml><versao>1.0</versao><error>Usuario invalido</error></sroxml>";
        let err = parse_xml(body).unwrap_err();
        assert_eq!(
            err,
            TrackingError::Parse(
                "Error tracking objects. Service response: \"Usuario invalido\"".to_string()
            )
        );
    }

    #[test]
    fn test_events_kept_in_document_order() {
        let body = format!(
            "<sroxml><qtd>1</qtd><objeto><numero>SS123456785BR</numero>{}{}{}</objeto></sroxml>",
            event_xml("BDE", "1", "18:00"),
            event_xml("OEC", "1", "09:00"),
            event_xml("PO", "9", "12:00"),
        );
        let objects = parse_xml(&body).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].object_code(), "SS123456785BR");

        let types: Vec<&str> = objects[0].events().iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, ["BDE", "OEC", "PO"]);
        assert!(objects[0].events()[2].details.is_some());
    }

    #[test]
    fn test_declared_count_clamped_to_entries() {
        let body = format!(
            "<sroxml><qtd>2</qtd><objeto><numero>SS123456785BR</numero>{}</objeto></sroxml>",
            event_xml("DO", "1", "10:00")
        );
        assert_eq!(parse_xml(&body).unwrap().len(), 1);

        let body = "<sroxml><qtd>1</qtd>\
            <objeto><numero>AA000000005BR</numero></objeto>\
            <objeto><numero>BB000000005BR</numero></objeto></sroxml>";
        let objects = parse_xml(body).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].object_code(), "AA000000005BR");
    }

    #[test]
    fn test_missing_count_reads_no_objects() {
        let body = "<sroxml>\
            <objeto><numero>AA000000005BR</numero></objeto>\
            <objeto><numero>BB000000005BR</numero></objeto></sroxml>";
        assert!(parse_xml(body).unwrap().is_empty());
    }

    #[test]
    fn test_short_year_is_parse_error() {
        let body = "<sroxml><qtd>1</qtd><objeto><numero>SS123456785BR</numero><evento>\
            <tipo>DO</tipo><status>1</status><data>15/03/24</data><hora>10:00</hora>\
            </evento></objeto></sroxml>";
        assert!(matches!(parse_xml(body), Err(TrackingError::Parse(_))));
    }

    #[test]
    fn test_no_error_no_objects_is_empty() {
        assert!(parse_xml("<sroxml><versao>1.0</versao><qtd>0</qtd></sroxml>").unwrap().is_empty());
    }

    #[test]
    fn test_destination_block_feeds_details() {
        let body = "<sroxml><qtd>1</qtd><objeto><numero>SS123456785BR</numero><evento>\
            <tipo>DO</tipo><status>01</status><data>15/03/2024</data><hora>10:00</hora>\
            <descricao>Objeto encaminhado</descricao><local>CTE</local><codigo>01001000</codigo>\
            <cidade>SAO PAULO</cidade><uf>SP</uf>\
            <destino><local>CTE BENFICA</local><codigo>20000000</codigo><cidade>RIO DE JANEIRO</cidade>\
            <bairro>BENFICA</bairro><uf>RJ</uf></destino></evento></objeto></sroxml>";
        let objects = parse_xml(body).unwrap();
        assert_eq!(
            objects[0].events()[0].details.as_deref(),
            Some("Object forwarded to RIO DE JANEIRO/RJ - Neighborhood: BENFICA - Location: CTE BENFICA")
        );
    }

    #[test]
    fn test_bad_event_aborts_parse() {
        let body = format!(
            "<sroxml><qtd>1</qtd><objeto><numero>SS123456785BR</numero>{}{}</objeto></sroxml>",
            event_xml("DO", "1", "10:00"),
            event_xml("DO", "1", "10h00"),
        );
        assert!(matches!(parse_xml(&body), Err(TrackingError::Parse(_))));
    }

    #[test]
    fn test_invalid_count_and_malformed_xml() {
        let body = "<sroxml><qtd>two</qtd><objeto><numero>SS123456785BR</numero></objeto></sroxml>";
        assert!(matches!(parse_xml(body), Err(TrackingError::Parse(_))));
        assert!(matches!(parse_xml("<sroxml><qtd>"), Err(TrackingError::Parse(_))));
    }

    #[test]
    fn test_structured_payload_wrapped() {
        let value = serde_json::json!({
            "return": {
                "object_code": "SS123456785BR",
                "events": [{
                    "event_type": "BDE",
                    "status": 1,
                    "timestamp": "2024-03-15T14:30:00",
                    "description": "Objeto entregue",
                    "details": null,
                    "location": "CDD CENTRO",
                    "location_code": "01001000",
                    "city": "SAO PAULO",
                    "state": "SP"
                }]
            }
        });
        let objects = parse(RemoteResponse::Structured(value)).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].events().len(), 1);
        assert_eq!(objects[0].events()[0].event_type, "BDE");
    }

    #[test]
    fn test_shape_problems() {
        assert!(RemoteResponse::Structured(serde_json::Value::Null).shape_problem().is_some());
        assert!(RemoteResponse::Structured(serde_json::json!("oops")).shape_problem().is_some());
        assert!(RemoteResponse::Structured(serde_json::json!({"other": 1})).shape_problem().is_some());
        assert!(RemoteResponse::Structured(serde_json::json!({"return": {}})).shape_problem().is_none());
        assert!(RemoteResponse::Xml("  ".to_string()).shape_problem().is_some());
        assert!(RemoteResponse::Xml("<a/>".to_string()).shape_problem().is_none());
    }
}
