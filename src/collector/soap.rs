//! Legacy Sansay SOAP web service
//!
//! Only the two operations the exporter needs are modelled:
//! `DoRealTimeStats` and `DoDownloadXmlFile`. Both return the statistics
//! document as escaped XML inside an `xmlfile` element.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::ResourcePath;
use crate::error::TransportError;

/// Namespace of the Sansay web service messages
pub const SANSAY_NAMESPACE: &str = "http://ws.sansay.com";

const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Table requested by the configuration download
const DOWNLOAD_TABLE: &str = "resource";

/// A SOAP operation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapRequest {
    /// `DoRealTimeStats(username, password, statName)`
    RealTimeStats {
        username: String,
        password: String,
        stat_name: String,
    },
    /// `DoDownloadXmlFile(username, password, page, table)`
    DownloadXmlFile {
        username: String,
        password: String,
        page: u32,
        table: String,
    },
}

impl SoapRequest {
    /// Request equivalent to the REST resource `path`
    pub fn for_path(path: ResourcePath, username: &str, password: &str) -> Self {
        if path.is_download() {
            SoapRequest::DownloadXmlFile {
                username: username.to_string(),
                password: password.to_string(),
                page: 0,
                table: DOWNLOAD_TABLE.to_string(),
            }
        } else {
            SoapRequest::RealTimeStats {
                username: username.to_string(),
                password: password.to_string(),
                stat_name: path.stat_name().to_string(),
            }
        }
    }

    /// Message element name
    pub fn element(&self) -> &'static str {
        match self {
            SoapRequest::RealTimeStats { .. } => "realTimeStatsParams",
            SoapRequest::DownloadXmlFile { .. } => "downloadParams",
        }
    }

    /// Serialize into a SOAP 1.1 envelope
    pub fn envelope(&self) -> String {
        let mut params = String::new();
        match self {
            SoapRequest::RealTimeStats {
                username,
                password,
                stat_name,
            } => {
                push_element(&mut params, "username", username);
                push_element(&mut params, "password", password);
                push_element(&mut params, "statName", stat_name);
            }
            SoapRequest::DownloadXmlFile {
                username,
                password,
                page,
                table,
            } => {
                push_element(&mut params, "table", table);
                push_element(&mut params, "username", username);
                push_element(&mut params, "password", password);
                if *page > 0 {
                    push_element(&mut params, "page", &page.to_string());
                }
            }
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><soap:Envelope xmlns:soap="{env}"><soap:Body><{el} xmlns="{ns}">{params}</{el}></soap:Body></soap:Envelope>"#,
            env = SOAP_ENVELOPE_NAMESPACE,
            el = self.element(),
            ns = SANSAY_NAMESPACE,
            params = params,
        )
    }
}

fn push_element(out: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Minimal SOAP caller bound to one endpoint
pub(crate) struct SoapClient<'a> {
    http: &'a Client,
    endpoint: Url,
}

impl<'a> SoapClient<'a> {
    pub(crate) fn new(http: &'a Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Perform one call and return the `xmlfile` payload
    #[instrument(
        skip(self, request),
        fields(endpoint = %self.endpoint, operation = request.element())
    )]
    pub(crate) async fn call(&self, request: &SoapRequest) -> Result<String, TransportError> {
        debug!("Sending SOAP request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", "\"\"")
            .body(request.envelope())
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(TransportError::HttpResponse)?;

        debug!(status_code = status.as_u16(), "Received SOAP response");

        // Faults come back as 500 with a fault body; prefer the fault text.
        match parse_soap_response(&body) {
            Err(fault @ TransportError::SoapFault { .. }) => Err(fault),
            _ if !status.is_success() => Err(TransportError::HttpStatus(status.as_u16())),
            result => result,
        }
    }
}

/// Extract the `xmlfile` payload from a SOAP response envelope
///
/// A `Fault` element takes precedence over any payload.
pub fn parse_soap_response(body: &str) -> Result<String, TransportError> {
    let mut reader = Reader::from_str(body);

    let mut text = String::new();
    let mut payload: Option<String> = None;
    let mut fault_code = String::new();
    let mut fault_string: Option<String> = None;
    let mut in_fault = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"Fault" {
                    in_fault = true;
                }
                text.clear();
            }
            Ok(Event::Text(e)) => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| TransportError::SoapResponse(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) => {
                let inner = e.into_inner();
                let cdata = std::str::from_utf8(&inner)
                    .map_err(|e| TransportError::SoapResponse(e.to_string()))?;
                text.push_str(cdata);
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"xmlfile" => payload = Some(std::mem::take(&mut text)),
                    b"faultcode" if in_fault => fault_code = std::mem::take(&mut text),
                    b"faultstring" if in_fault => fault_string = Some(std::mem::take(&mut text)),
                    b"Fault" => in_fault = false,
                    _ => {}
                }
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"xmlfile" {
                    payload = Some(String::new());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TransportError::SoapResponse(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if let Some(message) = fault_string {
        return Err(TransportError::SoapFault {
            code: fault_code,
            message,
        });
    }

    payload.ok_or_else(|| TransportError::SoapResponse("missing xmlfile element".to_string()))
}
