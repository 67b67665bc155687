/*!
khan-oauth1: OAuth 1.0a for the Khan Academy API, built on reqwest and oauth1-request.

# Overview

This library runs the three-legged OAuth 1.0a handshake against Khan Academy
(`/api/auth2/request_token`, `/api/auth2/authorize`, `/api/auth2/access_token`)
and signs API requests with HMAC-SHA1. The signature is computed with the
[oauth1-request](https://crates.io/crates/oauth1-request) crate; requests are
sent with [reqwest](https://crates.io/crates/reqwest).

# How to use

## Basic usecase 1 - headless authorization with account credentials

```rust,no_run
use khan_oauth1::{ApiClient, Auth, Config, OAuthSession};
use http::Method;

# async fn run() -> khan_oauth1::Result<()> {
let mut session = OAuthSession::builder("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .credentials("[IDENTIFIER]", "[PASSWORD]")
    .build()?;

// request token, consent, access token
let access_token = session.authorize_self().await?;

let api = ApiClient::new(session, Some(access_token), &Config::new())?;
let resp = api
    .fetch_resource::<_, ()>("/api/v1/user", Auth::Required, Method::GET, &[("casing", "camel")], None)
    .await?;
println!("{}", resp.text().await?);
# Ok(())
# }
```

## Basic usecase 2 - interactive authorization through a callback

```rust,no_run
use khan_oauth1::OAuthSession;

# async fn run(callback_query: &str) -> khan_oauth1::Result<()> {
let mut session = OAuthSession::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");

// step 1: acquire request token & token secret
let request_token = session
    .request_token(Some("https://app.example/oauth/callback"))
    .await?;

// step 2: send the user to the provider
println!("please access to: {}", session.authorize_interactive(&request_token));

// ... the provider redirects to the callback route with the token and verifier
let callback = session.accept_callback(callback_query)?;

// step 3: acquire access token
let access_token = session
    .access_token(callback.request_token, callback.verifier.as_deref())
    .await?;
# let _ = access_token;
# Ok(())
# }
```

## Reusing an access token across runs

```rust,no_run
use khan_oauth1::cache::{cached_or_authorize, FileTokenCache, DEFAULT_MAX_AGE};
use khan_oauth1::OAuthSession;

# async fn run() -> khan_oauth1::Result<()> {
let mut session = OAuthSession::from_env()?;
let cache = FileTokenCache::new("khan-token.json");
let access_token = cached_or_authorize(&cache, &mut session, DEFAULT_MAX_AGE).await?;
# let _ = access_token;
# Ok(())
# }
```
*/
pub mod cache;
mod client;
mod config;
mod error;
mod request;
mod secrets;
mod session;
mod signer;
mod token_reader;

// exposed to external program
pub use client::{ApiClient, Auth, RequestSigner};
pub use config::{
    Config, Credentials, Endpoints, BASE_URL_ENV, CONSUMER_KEY_ENV, CONSUMER_SECRET_ENV,
    DEFAULT_BASE_URL, IDENTIFIER_ENV, PASSWORD_ENV,
};
pub use error::{
    AuthorizationError, AuthorizationResult, CacheError, ConfigurationError, Error, Result,
    SignError, SignResult, TokenFetchError, TokenFetchResult,
};
pub use request::RequestBuilder;
pub use secrets::{AccessToken, ConsumerCredentials, OAuthToken, RequestToken, Secrets, SecretsProvider};
pub use session::{CallbackParams, OAuthSession, SessionBuilder, SessionState};
pub use signer::{OAuthParameters, SignedParameters, Signer};
pub use token_reader::{
    parse_token_response, serialize_token_response, TokenReader, TokenReaderFuture,
    TokenResponse,
};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_token_secret`.
pub const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
