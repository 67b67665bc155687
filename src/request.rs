// ----------------------------------------------------------------------------
// This source code contains derived artifacts from seanmonstar's `reqwest`.
// for further information(including license information),
// please visit their repository: https://github.com/seanmonstar/reqwest .
// ----------------------------------------------------------------------------
use std::{convert::TryFrom, time::Duration};

use http::Method;
use reqwest::{
    header::HeaderName, header::HeaderValue, header::CONTENT_TYPE,
    RequestBuilder as ReqwestRequestBuilder, Response, Url,
};
use serde::Serialize;
use tracing::debug;

use crate::{AccessToken, Error, RequestSigner, Result};

/// Request under construction; the OAuth signature is computed when the
/// request is finalized, over the URL query and the form body collected so
/// far.
pub struct RequestBuilder<'a, TSigner: ?Sized> {
    method: Method,
    inner: ReqwestRequestBuilder,
    url: Url,
    form: Vec<(String, String)>,
    signing: Option<(&'a TSigner, &'a AccessToken)>,
    error: Option<Error>,
}

impl<'a, TSigner> RequestBuilder<'a, TSigner>
where
    TSigner: RequestSigner + ?Sized,
{
    pub(crate) fn new(
        client: &reqwest::Client,
        method: Method,
        url: Url,
        signing: Option<(&'a TSigner, &'a AccessToken)>,
    ) -> Self {
        RequestBuilder {
            inner: client.request(method.clone(), url.clone()),
            method,
            url,
            form: Vec::new(),
            signing,
            error: None,
        }
    }

    /// Modify the query string of the URL.
    ///
    /// Appends the parameters provided; existing pairs with the same key are
    /// kept. The pairs are part of the signed parameter set.
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        let result = {
            let mut pairs = self.url.query_pairs_mut();
            let serializer = serde_urlencoded::Serializer::new(&mut pairs);
            query.serialize(serializer).map(|_| ())
        };
        if let Err(e) = result {
            self.error.get_or_insert(Error::Parameters(e));
        }
        if let Some("") = self.url.query() {
            self.url.set_query(None);
        }
        self.inner = self.inner.query(query);
        self
    }

    /// Send a form body. The pairs are part of the signed parameter set.
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        match serde_urlencoded::to_string(form) {
            Ok(body) => {
                self.form = url::form_urlencoded::parse(body.as_bytes())
                    .into_owned()
                    .collect();
                self.inner = self.inner.form(form);
            }
            Err(e) => {
                self.error.get_or_insert(Error::Parameters(e));
            }
        }
        self
    }

    /// Send a JSON body. JSON bodies are not covered by OAuth 1.0a signatures.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(body) => {
                self.inner = self
                    .inner
                    .header(CONTENT_TYPE, "application/json")
                    .body(body);
            }
            Err(e) => {
                self.error.get_or_insert(Error::Body(e));
            }
        }
        self
    }

    /// Add a `Header` to this Request.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    /// Enables a request timeout.
    ///
    /// Overrides the timeout configured on the session's client for this
    /// request only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Sign the request, if a signer is attached, and return the reqwest's
    /// `RequestBuilder` with the `oauth_*` parameters on its query string.
    pub fn build(self) -> Result<ReqwestRequestBuilder> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self.signing {
            Some((signer, access_token)) => {
                let signed =
                    signer.sign_request(&self.method, &self.url, &self.form, Some(access_token))?;
                debug!(method = %self.method, url = %self.url, "signed resource request");
                Ok(self.inner.query(signed.pairs()))
            }
            None => Ok(self.inner),
        }
    }

    /// Constructs the Request and sends it to the target URL.
    ///
    /// # Errors
    ///
    /// This method fails if the request cannot be signed or if there was an
    /// error while sending request.
    pub async fn send(self) -> Result<Response> {
        Ok(self.build()?.send().await?)
    }
}
