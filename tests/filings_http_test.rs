//! Filings client against a mock HTTP server

use serde_json::json;
use stability_oracle::metrics::{FetchError, FilingsConfig, FilingsSource, MetricSource, Reading};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EIN: &str = "530196605";

fn source(server: &MockServer) -> FilingsSource {
    FilingsSource::new(FilingsConfig {
        base_url: server.uri(),
        ein: EIN.to_string(),
    })
    .unwrap()
}

async fn mount_body(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/organizations/{}.json", EIN)))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_health_from_latest_filing() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "organization": {"ein": 530196605, "name": "Example Charities"},
            "filings_with_data": [
                {"tax_prd_yr": 2023, "totrevenue": 1000000, "totfuncexpns": 800000},
                {"tax_prd_yr": 2022, "totrevenue": 10, "totfuncexpns": 1000}
            ]
        })),
    )
    .await;

    let reading = source(&server).read().await;

    match reading {
        Reading::Measured(health) => assert!((health - 20.0).abs() < 1e-9),
        other => panic!("unexpected reading {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_revenue_measures_zero() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "filings_with_data": [{"totrevenue": 0, "totfuncexpns": 5000}]
        })),
    )
    .await;

    assert_eq!(source(&server).read().await, Reading::Measured(0.0));
}

#[tokio::test]
async fn test_missing_filings_defaults_to_zero() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"filings_with_data": []})),
    )
    .await;

    let source = source(&server);
    assert!(matches!(source.fetch().await, Err(FetchError::NoFilings(_))));

    let reading = source.read().await;
    assert!(reading.is_defaulted());
    assert_eq!(reading.value(), 0.0);
}

#[tokio::test]
async fn test_server_error_defaults_to_zero() {
    let server = MockServer::start().await;
    mount_body(&server, ResponseTemplate::new(500)).await;

    let source = source(&server);
    assert!(matches!(
        source.fetch().await,
        Err(FetchError::Status { status: 500, .. })
    ));
    assert_eq!(source.read().await.value(), 0.0);
}

#[tokio::test]
async fn test_malformed_body_defaults_to_zero() {
    let server = MockServer::start().await;
    mount_body(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let source = source(&server);
    assert!(matches!(source.fetch().await, Err(FetchError::Parse(_))));
    assert!(source.read().await.is_defaulted());
}

#[tokio::test]
async fn test_unreachable_host_defaults_to_zero() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    drop(server);

    let source = FilingsSource::new(FilingsConfig {
        base_url,
        ein: EIN.to_string(),
    })
    .unwrap();

    let reading = source.read().await;
    assert!(reading.is_defaulted());
    assert_eq!(reading.value(), 0.0);
}
