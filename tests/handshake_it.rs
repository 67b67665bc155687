use std::time::Duration;

use httpmock::prelude::*;
use khan_oauth1::{
    AccessToken, AuthorizationError, Config, ConfigurationError, Error, OAuthSession,
    RequestToken, SessionState, TokenFetchError,
};

const CONSUMER_KEY: &str = "CK";
const CONSUMER_SECRET: &str = "CS";
const CALLBACK: &str = "https://app.example/cb";

fn config(server: &MockServer) -> Config {
    Config::new()
        .base_url(&server.base_url())
        .expect("Mock server base URL should parse.")
}

fn anonymous_session(server: &MockServer) -> OAuthSession {
    OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .config(config(server))
        .build()
        .expect("Session should build against the mock server.")
}

fn headless_session(server: &MockServer) -> OAuthSession {
    OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .credentials("student@example.org", "hunter2")
        .config(config(server))
        .build()
        .expect("Session should build against the mock server.")
}

#[tokio::test]
async fn interactive_flow_exchanges_verifier_for_access_token() {
    let server = MockServer::start_async().await;
    let request_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth2/request_token")
                .query_param("oauth_callback", CALLBACK)
                .query_param("oauth_consumer_key", CONSUMER_KEY)
                .query_param("oauth_signature_method", "HMAC-SHA1")
                .query_param("oauth_version", "1.0")
                .query_param_exists("oauth_signature");
            then.status(200).body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    let access_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth2/access_token")
                .query_param("oauth_token", "rt")
                .query_param("oauth_verifier", "v1")
                .query_param_exists("oauth_signature");
            then.status(200)
                .body("oauth_token=at&oauth_token_secret=ats&user_id=kaid_42");
        })
        .await;
    let mut session = anonymous_session(&server);

    let request_token = session.request_token(Some(CALLBACK)).await.unwrap();
    assert_eq!(request_token, RequestToken::new("rt", "rts"));
    assert_eq!(session.state(), SessionState::RequestTokenObtained);

    let authorize_url = session.authorize_interactive(&request_token);
    assert_eq!(
        authorize_url.as_str(),
        format!("{}?oauth_token=rt", server.url("/api/auth2/authorize"))
    );

    let callback = session
        .accept_callback("?oauth_token=rt&oauth_token_secret=rts&oauth_verifier=v1")
        .unwrap();
    assert_eq!(session.state(), SessionState::UserAuthorized);

    let access_token = session
        .access_token(callback.request_token, callback.verifier.as_deref())
        .await
        .unwrap();
    assert_eq!(access_token, AccessToken::new("at", "ats"));
    assert_eq!(session.state(), SessionState::Authenticated);

    request_mock.assert_calls_async(1).await;
    access_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn headless_flow_submits_credentials_to_authorize() {
    let server = MockServer::start_async().await;
    let request_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth2/request_token")
                .query_param_missing("oauth_callback")
                .query_param_exists("oauth_signature");
            then.status(200).body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    let authorize_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth2/authorize")
                .query_param("identifier", "student@example.org")
                .query_param("password", "hunter2")
                .query_param("oauth_token", "rt");
            then.status(200).body("<html>authorized</html>");
        })
        .await;
    let access_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth2/access_token")
                .query_param("oauth_token", "rt")
                .query_param_missing("oauth_verifier")
                .query_param_exists("oauth_signature");
            then.status(200).body("oauth_token=at&oauth_token_secret=ats");
        })
        .await;
    let mut session = headless_session(&server);

    let access_token = session.authorize_self().await.unwrap();

    assert_eq!(access_token, AccessToken::new("at", "ats"));
    assert_eq!(session.state(), SessionState::Authenticated);
    request_mock.assert_calls_async(1).await;
    authorize_mock.assert_calls_async(1).await;
    access_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn headless_flow_without_credentials_makes_no_request() {
    let server = MockServer::start_async().await;
    let request_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(200).body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    let mut session = anonymous_session(&server);

    let err = session.authorize_self().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::MissingCredentials)
    ));
    assert_eq!(session.state(), SessionState::Unauthenticated);
    request_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn empty_password_counts_as_missing() {
    let server = MockServer::start_async().await;
    let mut session = OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .credentials("student@example.org", "")
        .config(config(&server))
        .build()
        .unwrap();

    let err = session.authorize_self().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::MissingCredentials)
    ));
}

#[tokio::test]
async fn malformed_token_body_is_a_token_fetch_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(200).body("not_a_valid_response");
        })
        .await;
    let mut session = anonymous_session(&server);

    let err = session.request_token(None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TokenFetch(TokenFetchError::TokenKeyNotFound(_, ref body)) if body == "not_a_valid_response"
    ));
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn rejected_token_request_reports_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(401).body("invalid consumer");
        })
        .await;
    let mut session = anonymous_session(&server);

    let err = session.request_token(None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TokenFetch(TokenFetchError::Status(401, ref body)) if body == "invalid consumer"
    ));
}

#[tokio::test]
async fn rejected_authorization_stops_the_handshake() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(200).body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/authorize");
            then.status(403).body("bad credentials");
        })
        .await;
    let access_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/access_token");
            then.status(200).body("oauth_token=at&oauth_token_secret=ats");
        })
        .await;
    let mut session = headless_session(&server);

    let err = session.authorize_self().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Authorization(AuthorizationError::Status(403, _))
    ));
    assert_eq!(session.state(), SessionState::RequestTokenObtained);
    access_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    let mut session = OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .config(Config::new().base_url("http://127.0.0.1:1").unwrap())
        .build()
        .unwrap();

    let err = session.request_token(None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TokenFetch(TokenFetchError::Transport(_))
    ));
}

#[tokio::test]
async fn slow_token_endpoint_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(200)
                .delay(Duration::from_secs(2))
                .body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    let mut session = OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .config(config(&server).timeout(Duration::from_millis(200)))
        .build()
        .unwrap();

    let err = session.request_token(None).await.unwrap_err();

    assert!(matches!(
        err,
        Error::TokenFetch(TokenFetchError::Transport(ref e)) if e.is_timeout()
    ));
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn slow_authorize_endpoint_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/request_token");
            then.status(200).body("oauth_token=rt&oauth_token_secret=rts");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth2/authorize");
            then.status(200).delay(Duration::from_secs(2));
        })
        .await;
    let mut session = OAuthSession::builder(CONSUMER_KEY, CONSUMER_SECRET)
        .credentials("student@example.org", "hunter2")
        .config(config(&server).timeout(Duration::from_millis(200)))
        .build()
        .unwrap();

    let err = session.authorize_self().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Authorization(AuthorizationError::Transport(ref e)) if e.is_timeout()
    ));
}
