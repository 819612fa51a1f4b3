use hydro_client::error::{AuthError, ClientError, FetchError};
use hydro_client::session::SessionCookie;
use hydro_client::{DateRange, PortalClient, PortalConfig};
use time::macros::{date, datetime};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CSV_BODY: &str = "\
Date,Hour,Usage (kWh),Rate Period,Cost ($)
2024-01-01,1,1.5,off-peak,0.11
2024-01-01,2,0,off-peak,0.00
2024-01-01,3,2.0,on-peak,0.60
";

fn config(server: &MockServer, dir: &tempfile::TempDir) -> PortalConfig {
    PortalConfig {
        base_url: server.uri(),
        username: "12345".to_string(),
        password: "hunter2".to_string(),
        cookie_file: dir.path().join("cookies.json"),
    }
}

fn seed_session(dir: &tempfile::TempDir) {
    let cookies = vec![SessionCookie {
        name: "JSESSIONID".to_string(),
        value: "abc123".to_string(),
        domain: None,
        path: Some("/".to_string()),
        expires: None,
    }];
    std::fs::write(
        dir.path().join("cookies.json"),
        serde_json::to_string(&cookies).unwrap(),
    )
    .unwrap();
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/AccountOnlineCommand"))
        .and(query_param("command", "login"))
        .and(query_param("TokenID", "null"))
        .and(query_param("Reset", "null"))
        .and(body_string_contains("acn=12345"))
        .and(body_string_contains("Submit=Sign-On"))
        .respond_with(
            ResponseTemplate::new(302)
                .append_header("set-cookie", "JSESSIONID=abc123; Path=/")
                .append_header("set-cookie", "AWSALB=token; Path=/"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_logs_in_and_persists_cookies() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;

    let client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    assert!(client.session().is_authenticated());

    let saved = std::fs::read_to_string(dir.path().join("cookies.json")).unwrap();
    let cookies: Vec<SessionCookie> = serde_json::from_str(&saved).unwrap();
    assert!(cookies.iter().any(|c| c.name == "JSESSIONID" && c.value == "abc123"));
    assert!(cookies.iter().any(|c| c.name == "AWSALB"));
}

#[tokio::test]
async fn connect_reuses_persisted_session_without_logging_in() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_session(&dir);
    // No login mock mounted: an attempted login would 404 and fail connect.

    Mock::given(method("POST"))
        .and(path("/ChartServlet"))
        .and(query_param("UsageType", "DownloadRawDataVertical"))
        .and(query_param("DownloadRawDataVertical", "true"))
        .and(header("cookie", "JSESSIONID=abc123"))
        .and(body_string_contains("StartDate=2024-01-01"))
        .and(body_string_contains("EndDate=2024-01-02"))
        .and(body_string_contains("framing=TOU"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .mount(&server)
        .await;

    let client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    let records = client
        .fetch_usage(DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02)))
        .await
        .unwrap();

    // The zero-usage row is dropped; the rest come back in provider order.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].ts, datetime!(2024-01-01 01:00:00 -5));
    assert_eq!(records[1].peak, "on-peak");
}

#[tokio::test]
async fn rejected_login_surfaces_invalid_status() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/AccountOnlineCommand"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = PortalClient::connect(config(&server, &dir)).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Auth(AuthError::InvalidStatus(s)) if s.as_u16() == 500
    ));
    // No session file is written for a failed login.
    assert!(!dir.path().join("cookies.json").exists());
}

#[tokio::test]
async fn rejected_fetch_surfaces_invalid_status_without_parsing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_session(&dir);

    Mock::given(method("POST"))
        .and(path("/ChartServlet"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>not csv</html>"))
        .mount(&server)
        .await;

    let client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    let err = client
        .fetch_usage(DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidStatus(s) if s.as_u16() == 404));
}

#[tokio::test]
async fn fetch_all_usage_issues_one_request_per_chunk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_session(&dir);

    // 95 days entirely in the past: 30 + 30 + 30 + 5.
    Mock::given(method("POST"))
        .and(path("/ChartServlet"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(4)
        .mount(&server)
        .await;

    let client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    let records = client
        .fetch_all_usage(DateRange::new(date!(2024 - 01 - 01), date!(2024 - 04 - 05)))
        .await
        .unwrap();

    // Two non-zero rows per chunk, concatenated in chunk order.
    assert_eq!(records.len(), 8);
}

#[tokio::test]
async fn fetch_all_usage_aborts_on_first_failing_chunk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_session(&dir);

    Mock::given(method("POST"))
        .and(path("/ChartServlet"))
        .and(body_string_contains("StartDate=2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ChartServlet"))
        .and(body_string_contains("StartDate=2024-01-31"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    let err = client
        .fetch_all_usage(DateRange::new(date!(2024 - 01 - 01), date!(2024 - 04 - 05)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidStatus(_)));
}

#[tokio::test]
async fn relogin_replaces_the_persisted_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_session(&dir);
    mount_login(&server).await;

    let mut client = PortalClient::connect(config(&server, &dir)).await.unwrap();
    client.login().await.unwrap();

    let saved = std::fs::read_to_string(dir.path().join("cookies.json")).unwrap();
    let cookies: Vec<SessionCookie> = serde_json::from_str(&saved).unwrap();
    assert_eq!(cookies.len(), 2);
}
