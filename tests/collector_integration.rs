//! Collector integration tests
//!
//! HTTP mocking of the Sansay REST and SOAP interfaces with wiremock.

use sansay_exporter::collector::{
    build_http_client, decode, Decoded, ResourcePath, SansayClient, ScrapeRequest, TransportMode,
};
use sansay_exporter::config::SansayConfig;
use sansay_exporter::error::TransportError;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REALTIME_DUMP: &str = r#"<?xml version="1.0"?>
<mysqldump>
  <database name="SSConfig">
    <table name="system_stat">
      <row><field name="numActiveCalls">12</field></row>
    </table>
  </database>
</mysqldump>"#;

fn client(server: &MockServer, mode: TransportMode) -> SansayClient {
    let config = SansayConfig {
        timeout_ms: 2000,
        ..SansayConfig::default()
    };
    let http = build_http_client(&config).unwrap();
    let request = ScrapeRequest::new(
        "http",
        &server.address().to_string(),
        "admin",
        "secret",
        mode,
    );
    SansayClient::new(http, &config, request)
}

fn soap_response(payload: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body><ns2:realTimeStatsResult xmlns:ns2="http://ws.sansay.com"><xmlfile>{}</xmlfile></ns2:realTimeStatsResult></S:Body></S:Envelope>"#,
        payload
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    )
}

#[tokio::test]
async fn test_rest_fetch_with_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SSConfig/webresources/stats/stats/realtime"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REALTIME_DUMP))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client(&mock_server, TransportMode::RestWithSoapFallback)
        .fetch(ResourcePath::RealtimeStats)
        .await
        .unwrap();

    let decoded = decode("stats/realtime", &body).unwrap();
    assert!(matches!(decoded, Decoded::Tabular(_)));
}

#[tokio::test]
async fn test_rest_not_found_falls_back_to_soap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SSConfig/webresources/stats/stats/realtime"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/SSConfig/SansayWS"))
        .and(body_string_contains("<statName>realtime</statName>"))
        .and(body_string_contains("<username>admin</username>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response(REALTIME_DUMP)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client(&mock_server, TransportMode::RestWithSoapFallback)
        .fetch(ResourcePath::RealtimeStats)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(body).unwrap(), REALTIME_DUMP);
}

#[tokio::test]
async fn test_rest_server_error_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SSConfig/webresources/stats/stats/resource"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, TransportMode::RestWithSoapFallback)
        .fetch(ResourcePath::ResourceStats)
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::HttpStatus(500)));
    assert_eq!(err.to_string(), "Invalid response from server: 500");
}

#[tokio::test]
async fn test_redirect_status_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SSConfig/webresources/stats/stats/realtime"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let body = client(&mock_server, TransportMode::RestWithSoapFallback)
        .fetch(ResourcePath::RealtimeStats)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_soap_only_mode_skips_rest() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/SSConfig/SansayWS"))
        .and(header("SOAPAction", "\"\""))
        .and(body_string_contains("<downloadParams"))
        .and(body_string_contains("<table>resource</table>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(soap_response("<XBResourceList/>")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client(&mock_server, TransportMode::SoapOnly)
        .fetch(ResourcePath::ResourceConfigDownload)
        .await
        .unwrap();

    let decoded = decode("download/resource", &body).unwrap();
    assert_eq!(decoded, Decoded::ResourceConfigs(vec![]));
}

#[tokio::test]
async fn test_soap_fault_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/SSConfig/SansayWS"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body><S:Fault><faultcode>S:Server</faultcode><faultstring>Invalid credentials</faultstring></S:Fault></S:Body></S:Envelope>"#,
        ))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, TransportMode::SoapOnly)
        .fetch(ResourcePath::MediaServerStats)
        .await
        .unwrap_err();

    match err {
        TransportError::SoapFault { message, .. } => assert_eq!(message, "Invalid credentials"),
        other => panic!("Expected SoapFault, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let mock_server = MockServer::start().await;
    let c = client(&mock_server, TransportMode::RestWithSoapFallback);
    drop(mock_server);

    let err = c.fetch(ResourcePath::RealtimeStats).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::ConnectionFailed(_) | TransportError::HttpRequest(_)
    ));
}
