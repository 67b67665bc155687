use std::{collections::HashMap, future::Future};

use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;

use crate::{OAuthToken, TokenFetchError, TokenFetchResult, OAUTH_TOKEN_KEY, OAUTH_TOKEN_SECRET_KEY};

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Parse a `key=value&key=value` body by field name.
    pub fn parse(text: &str) -> TokenFetchResult<Self> {
        let mut destructured = url::form_urlencoded::parse(text.as_bytes())
            .into_owned()
            .collect::<HashMap<String, String>>();
        let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
        let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
        match (oauth_token, oauth_token_secret) {
            (Some(t), Some(s)) => Ok(TokenResponse {
                oauth_token: t,
                oauth_token_secret: s,
                remain: destructured,
            }),
            (None, _) => Err(TokenFetchError::TokenKeyNotFound(
                OAUTH_TOKEN_KEY,
                text.to_string(),
            )),
            (_, _) => Err(TokenFetchError::TokenKeyNotFound(
                OAUTH_TOKEN_SECRET_KEY,
                text.to_string(),
            )),
        }
    }

    /// Serialize back into the provider's body format.
    pub fn serialize(&self) -> String {
        let mut remain: Vec<_> = self.remain.iter().collect();
        remain.sort();
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(OAUTH_TOKEN_KEY, &self.oauth_token)
            .append_pair(OAUTH_TOKEN_SECRET_KEY, &self.oauth_token_secret)
            .extend_pairs(remain)
            .finish()
    }
}

/// Parse a token endpoint body straight into a request or access token.
pub fn parse_token_response<T: OAuthToken>(text: &str) -> TokenFetchResult<T> {
    let resp = TokenResponse::parse(text)?;
    Ok(T::from_pair(resp.oauth_token, resp.oauth_token_secret))
}

/// Render a token the way the provider's token endpoints do.
pub fn serialize_token_response<T: OAuthToken>(token: &T) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair(OAUTH_TOKEN_KEY, token.token())
        .append_pair(OAUTH_TOKEN_SECRET_KEY, token.secret())
        .finish()
}

/// Add parse_oauth_token feature to reqwest::Response.
// this trait is sealed
#[async_trait]
pub trait TokenReader: private::Sealed {
    async fn parse_oauth_token(self) -> TokenFetchResult<TokenResponse>;
}

#[async_trait]
impl TokenReader for Response {
    async fn parse_oauth_token(self) -> TokenFetchResult<TokenResponse> {
        let status = self.status();
        let text = self.text().await?;
        if !status.is_success() {
            return Err(TokenFetchError::Status(status.as_u16(), text));
        }
        TokenResponse::parse(&text)
    }
}

/// Add parse_oauth_token feature to Future of reqwest::Response.
// this trait is also sealed
#[async_trait]
pub trait TokenReaderFuture: private::SealedWrapper {
    async fn parse_oauth_token(self) -> TokenFetchResult<TokenResponse>;
}

#[async_trait]
impl<T> TokenReaderFuture for T
where
    T: Future<Output = reqwest::Result<Response>> + Send,
{
    async fn parse_oauth_token(self) -> TokenFetchResult<TokenResponse> {
        self.await?.parse_oauth_token().await
    }
}

mod private {
    use std::future::Future;

    use reqwest::Response;

    pub trait Sealed {}
    impl Sealed for Response {}
    pub trait SealedWrapper {}
    impl<T> SealedWrapper for T where T: Future<Output = reqwest::Result<Response>> {}
}
