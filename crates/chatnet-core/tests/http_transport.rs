//! `HttpTransport` against a local wiremock server


use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chatnet_core::{
    AuthInterceptor, CachePolicy, HttpTransport, InterceptorChain, NetworkConfig, NetworkError,
    NetworkManager, Request, Response, Result, Transport, TransportConfig,
};
use serde_json::json;
use test_support::{fast_retry, init_tracing, sample_user, User};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer, chain: InterceptorChain) -> HttpTransport {
    HttpTransport::new(TransportConfig::new().with_base_url(server.uri()), chain).unwrap()
}

#[tokio::test]
async fn get_with_query_against_base_url() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "ada"}])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    let response = transport
        .execute(Request::get("/users").with_query_parameter("page", "1"))
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    let users: Vec<User> = response.decode().unwrap();
    assert_eq!(users, vec![sample_user()]);
    assert_eq!(response.request().unwrap().path(), "/users");
}

#[tokio::test]
async fn default_headers_are_merged_under_request_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("x-client", "desktop"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = TransportConfig::new()
        .with_base_url(server.uri())
        .with_default_header("X-Client", "desktop")
        .with_default_header("Accept", "text/plain");
    let transport = HttpTransport::new(config, InterceptorChain::new()).unwrap();

    transport
        .execute(Request::get("/me").with_header("accept", "application/json"))
        .await
        .unwrap();
}

#[tokio::test]
async fn bearer_token_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthInterceptor::bearer(Arc::new(|| -> Result<Option<String>> {
        Ok(Some("abc".to_string()))
    }));
    let chain = InterceptorChain::new().with_request_interceptor(Arc::new(auth));
    let transport = transport_for(&server, chain);

    transport.execute(Request::get("/me")).await.unwrap();
}

#[tokio::test]
async fn post_json_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"id": 1, "name": "ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    let request = Request::post_json("/users", &sample_user()).unwrap();
    let response = transport.execute(request).await.unwrap();

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.decode::<User>().unwrap(), sample_user());
}

#[tokio::test]
async fn error_statuses_are_mapped() {
    let server = MockServer::start().await;
    for (route, status) in [("/401", 401), ("/403", 403), ("/404", 404), ("/503", 503)] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }
    Mock::given(path("/422"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid"))
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    let cases = [
        ("/401", NetworkError::Unauthorized),
        ("/403", NetworkError::Forbidden),
        ("/404", NetworkError::NotFound),
        ("/503", NetworkError::ServerError { status_code: 503 }),
        (
            "/422",
            NetworkError::HttpError {
                status_code: 422,
                data: Bytes::from_static(b"invalid"),
            },
        ),
    ];
    for (route, expected) in cases {
        let err = transport.execute(Request::get(route)).await.unwrap_err();
        assert_eq!(err, expected, "status for {route}");
    }
}

#[tokio::test]
async fn error_status_skips_response_interceptors() {
    let server = MockServer::start().await;
    Mock::given(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let chain = InterceptorChain::new().with_response_interceptor(Arc::new(
        |_: Response| -> Result<Response> { Err(NetworkError::Unknown("ran".to_string())) },
    ));
    let transport = transport_for(&server, chain);

    let err = transport.execute(Request::get("/gone")).await.unwrap_err();
    assert_eq!(err, NetworkError::NotFound);
}

#[tokio::test]
async fn response_interceptor_sees_server_headers() {
    let server = MockServer::start().await;
    Mock::given(path("/ping"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Request-Id", "req-42"))
        .mount(&server)
        .await;

    let chain = InterceptorChain::new().with_response_interceptor(Arc::new(
        |response: Response| -> Result<Response> {
            let id = response.header("x-request-id").unwrap_or("missing").to_string();
            Ok(response.with_header("X-Seen", id))
        },
    ));
    let transport = transport_for(&server, chain);

    let response = transport.execute(Request::get("/ping")).await.unwrap();
    assert_eq!(response.header("x-seen"), Some("req-42"));
}

#[tokio::test]
async fn cache_policy_sets_cache_control() {
    let server = MockServer::start().await;
    Mock::given(path("/feed"))
        .and(header("cache-control", "no-cache"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    transport
        .execute(Request::get("/feed").with_cache_policy(CachePolicy::ReloadIgnoringLocalCacheData))
        .await
        .unwrap();
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    let err = transport
        .execute(Request::get("/slow").with_timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert_eq!(err, NetworkError::Timeout);
}

#[tokio::test]
async fn refused_connection_is_no_connection() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = TransportConfig::new().with_base_url(format!("http://127.0.0.1:{port}"));
    let transport = HttpTransport::new(config, InterceptorChain::new()).unwrap();

    let err = transport.execute(Request::get("/x")).await.unwrap_err();
    assert_eq!(err, NetworkError::NoConnection);
}

#[tokio::test]
async fn relative_path_without_base_url_is_invalid() {
    let server = MockServer::start().await;
    let transport = HttpTransport::new(TransportConfig::new(), InterceptorChain::new()).unwrap();

    let err = transport.execute(Request::get("/users")).await.unwrap_err();
    assert_eq!(err, NetworkError::InvalidUrl);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn absolute_url_bypasses_base_url() {
    let server = MockServer::start().await;
    Mock::given(path("/avatar.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89u8, 0x50, 0x4E, 0x47]))
        .expect(1)
        .mount(&server)
        .await;

    let config = TransportConfig::new().with_base_url("http://127.0.0.1:9/api");
    let transport = HttpTransport::new(config, InterceptorChain::new()).unwrap();

    let response = transport
        .execute(Request::get(format!("{}/avatar.png", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.data().len(), 4);
}

#[tokio::test]
async fn manager_retries_real_transport() {
    let server = MockServer::start().await;
    Mock::given(path("/rooms"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(path("/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server, InterceptorChain::new());
    let manager = NetworkManager::with_retry_handler(Arc::new(transport), fast_retry(3));

    let user: User = manager
        .execute_with_retry_decoded(Request::get("/rooms"))
        .await
        .unwrap();
    assert_eq!(user, sample_user());
}

#[tokio::test]
async fn manager_from_config_uses_base_url_and_headers() {
    let server = MockServer::start().await;
    Mock::given(path("/users/1"))
        .and(header("x-client", "desktop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = NetworkConfig::from_json_str(&format!(
        r#"{{"base_url": "{}", "default_headers": {{"X-Client": "desktop"}}, "log_level": "headers"}}"#,
        server.uri()
    ))
    .unwrap();
    let manager = NetworkManager::from_config(&config, InterceptorChain::new()).unwrap();

    let user: User = manager.execute_decoded(Request::get("/users/1")).await.unwrap();
    assert_eq!(user, sample_user());
}
