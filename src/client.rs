use std::borrow::Cow;

use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use reqwest::{Client, header};

use crate::error::RemoteFault;
use crate::parser::RemoteResponse;
use crate::request::TrackingParams;
use crate::service::RemoteTracker;

const DEFAULT_ENDPOINT: &str = "https://webservice.correios.com.br/service/rastro";
const SOAP_NAMESPACE: &str = "http://resource.webservice.correios.com.br/";
const SOAP_ACTION: &str = "buscaEventos";

/// Configuration for SoapClient
#[derive(Debug, Clone)]
pub struct SroConfig {
    /// Tracking web service endpoint
    pub endpoint: String,
}

impl Default for SroConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl SroConfig {
    /// Read `SRO_ENDPOINT`, falling back to the public endpoint
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("SRO_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

/// SOAP-over-HTTP implementation of the remote tracking operation.
///
/// Cloning is cheap; the underlying HTTP client is reference counted.
#[derive(Debug, Clone)]
pub struct SoapClient {
    http_client: Client,
    config: SroConfig,
}

impl SoapClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(SroConfig::default())
    }

    pub fn with_config(config: SroConfig) -> anyhow::Result<Self> {
        let http_client = Client::builder().build()?;
        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl RemoteTracker for SoapClient {
    async fn invoke(&self, params: &TrackingParams) -> Result<RemoteResponse, RemoteFault> {
        let envelope = build_envelope(params);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(envelope)
            .send()
            .await
            .map_err(transport_fault)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_fault)?;

        interpret_body(status.as_u16(), &body)
    }

    fn normalize_text(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn transport_fault(err: reqwest::Error) -> RemoteFault {
    let code = err.status().map(|s| i32::from(s.as_u16())).unwrap_or(0);
    RemoteFault::new(code, err.to_string())
}

/// Element name the service uses for each parameter key
fn wire_element(key: &'static str) -> &'static str {
    match key {
        "user" => "usuario",
        "password" => "senha",
        "kind" => "tipo",
        "result" => "resultado",
        "language" => "lingua",
        "objects" => "objetos",
        other => other,
    }
}

/// Build the `buscaEventos` SOAP 1.1 envelope
fn build_envelope(params: &TrackingParams) -> String {
    let mut envelope = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:res="{}">"#,
            "<soapenv:Header/><soapenv:Body><res:buscaEventos>"
        ),
        SOAP_NAMESPACE
    );
    for (key, value) in params.pairs() {
        let element = wire_element(key);
        envelope.push_str(&format!("<{0}>{1}</{0}>", element, escape(value.as_str())));
    }
    envelope.push_str("</res:buscaEventos></soapenv:Body></soapenv:Envelope>");
    envelope
}

/// Map an HTTP response body onto the collaborator contract
fn interpret_body(status: u16, body: &str) -> Result<RemoteResponse, RemoteFault> {
    if body.trim().is_empty() {
        if !(200..300).contains(&status) {
            return Err(RemoteFault::new(
                i32::from(status),
                format!("HTTP {} with empty body", status),
            ));
        }
        return Ok(RemoteResponse::Xml(String::new()));
    }

    if let Ok(Some(fault)) = element_inner(body, b"faultstring") {
        let message = unescape(&fault)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| fault.clone());
        return Err(RemoteFault::new(i32::from(status), message));
    }

    match element_inner(body, b"return") {
        Ok(Some(inner)) => Ok(RemoteResponse::Xml(format!("<return>{}</return>", inner))),
        Ok(None) if !(200..300).contains(&status) => Err(RemoteFault::new(
            i32::from(status),
            format!("HTTP {}: {}", status, body),
        )),
        // Not object-shaped: the service turns this into a generic fault.
        _ => Ok(RemoteResponse::Structured(serde_json::Value::String(
            body.to_string(),
        ))),
    }
}

/// Raw content of the first element with the given local name, markup included
fn element_inner(xml: &str, local_name: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(start) if start.local_name().as_ref() == local_name => {
                let end = start.to_end().into_owned();
                let inner = reader.read_text(end.name())?;
                return Ok(Some(inner.into_owned()));
            }
            Event::Empty(empty) if empty.local_name().as_ref() == local_name => {
                return Ok(Some(String::new()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
