use std::sync::Arc;

use http::Method;
use reqwest::{Client as ReqwestClient, Response};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::{
    AccessToken, Config, ConfigurationError, Error, OAuthSession, RequestBuilder, Result,
    SignResult, SignedParameters,
};

/// Capability shared by everything that can sign outgoing requests with the
/// application's consumer credentials.
pub trait RequestSigner {
    fn sign_request(
        &self,
        method: &Method,
        url: &Url,
        params: &[(String, String)],
        access_token: Option<&AccessToken>,
    ) -> SignResult<SignedParameters>;
}

impl<T: RequestSigner + ?Sized> RequestSigner for &T {
    fn sign_request(
        &self,
        method: &Method,
        url: &Url,
        params: &[(String, String)],
        access_token: Option<&AccessToken>,
    ) -> SignResult<SignedParameters> {
        (**self).sign_request(method, url, params, access_token)
    }
}

impl<T: RequestSigner + ?Sized> RequestSigner for Arc<T> {
    fn sign_request(
        &self,
        method: &Method,
        url: &Url,
        params: &[(String, String)],
        access_token: Option<&AccessToken>,
    ) -> SignResult<SignedParameters> {
        (**self).sign_request(method, url, params, access_token)
    }
}

/// Whether an endpoint needs an OAuth-signed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    None,
    Required,
}

/// Calls API endpoints relative to the provider's base URL, signing the
/// ones that need it with an access token.
///
/// Endpoint groups are expected to be thin functions over
/// [`ApiClient::fetch_resource`].
#[derive(Debug)]
pub struct ApiClient<S = OAuthSession> {
    inner: ReqwestClient,
    signer: S,
    access_token: Option<AccessToken>,
    base: Url,
}

impl<S> ApiClient<S>
where
    S: RequestSigner,
{
    /// Constructs a new `ApiClient` against `config`'s base URL.
    pub fn new(
        signer: S,
        access_token: Option<AccessToken>,
        config: &Config,
    ) -> std::result::Result<Self, ConfigurationError> {
        Ok(ApiClient {
            inner: config.http_client()?,
            signer,
            access_token,
            base: config.get_endpoints().base.clone(),
        })
    }

    /// Constructs a new `ApiClient` with specifying inner `reqwest::Client`.
    pub fn new_with_client(
        client: ReqwestClient,
        signer: S,
        access_token: Option<AccessToken>,
        base: Url,
    ) -> Self {
        ApiClient {
            inner: client,
            signer,
            access_token,
            base,
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn set_access_token(&mut self, access_token: Option<AccessToken>) {
        self.access_token = access_token;
    }

    fn endpoint_url(&self, endpoint: &str) -> std::result::Result<Url, ConfigurationError> {
        self.base
            .join(endpoint)
            .map_err(|e| ConfigurationError::InvalidUrl(endpoint.to_string(), e))
    }

    /// Start building a request to `endpoint`, relative to the base URL.
    ///
    /// # Errors
    ///
    /// Fails when the URL cannot be built or when `auth` is
    /// [`Auth::Required`] and no access token is set.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        auth: Auth,
    ) -> Result<RequestBuilder<'_, S>> {
        let url = self.endpoint_url(endpoint)?;
        let signing = match auth {
            Auth::None => None,
            Auth::Required => match self.access_token {
                Some(ref token) => Some((&self.signer, token)),
                None => return Err(ConfigurationError::MissingAccessToken.into()),
            },
        };
        Ok(RequestBuilder::new(&self.inner, method, url, signing))
    }

    /// Convenience method to make a `GET` request to an endpoint.
    pub fn get(&self, endpoint: &str, auth: Auth) -> Result<RequestBuilder<'_, S>> {
        self.request(Method::GET, endpoint, auth)
    }

    /// Convenience method to make a `POST` request to an endpoint.
    pub fn post(&self, endpoint: &str, auth: Auth) -> Result<RequestBuilder<'_, S>> {
        self.request(Method::POST, endpoint, auth)
    }

    /// Fetch `endpoint` with `params` on the query string.
    ///
    /// `GET` and `POST` are supported; a `POST` may carry a JSON `body` (the
    /// GraphQL endpoint takes one). Non-success statuses are returned as
    /// [`Error::Status`].
    pub async fn fetch_resource<P, B>(
        &self,
        endpoint: &str,
        auth: Auth,
        method: Method,
        params: &P,
        body: Option<&B>,
    ) -> Result<Response>
    where
        P: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        if method != Method::GET && method != Method::POST {
            return Err(ConfigurationError::UnsupportedMethod(method).into());
        }
        let mut builder = self.request(method.clone(), endpoint, auth)?.query(params);
        if let Some(body) = body.filter(|_| method == Method::POST) {
            builder = builder.json(body);
        }

        debug!(%method, endpoint, ?auth, "fetching resource");
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), endpoint, "resource request rejected");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}
