use std::fmt;

use http::Method;
use tracing::{debug, warn};
use url::Url;

use crate::{
    AccessToken, AuthorizationError, Config, ConfigurationError, ConsumerCredentials, Credentials,
    OAuthParameters, OAuthToken, RequestSigner, RequestToken, Result, SignResult,
    SignedParameters, Signer, TokenFetchError, TokenReaderFuture, TokenResponse,
    OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY,
};

const IDENTIFIER_KEY: &str = "identifier";
const PASSWORD_KEY: &str = "password";

/// Progress of the three-legged handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    RequestTokenObtained,
    UserAuthorized,
    Authenticated,
}

/// Values the provider delivers to the registered callback route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub request_token: RequestToken,
    pub verifier: Option<String>,
}

impl CallbackParams {
    /// Parse the callback's query string (`oauth_token`, `oauth_token_secret`,
    /// `oauth_verifier`). A leading `?` is accepted.
    pub fn parse(query: &str) -> std::result::Result<Self, TokenFetchError> {
        let mut resp = TokenResponse::parse(query.trim_start_matches('?'))?;
        let verifier = resp.remain.remove(OAUTH_VERIFIER_KEY);
        Ok(CallbackParams {
            request_token: resp.into(),
            verifier,
        })
    }
}

/// Drives the OAuth 1.0a handshake against the provider and signs requests
/// with the application's consumer credentials.
pub struct OAuthSession {
    consumer: ConsumerCredentials,
    identifier: Option<String>,
    password: Option<String>,
    config: Config,
    http: reqwest::Client,
    state: SessionState,
}

impl fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSession")
            .field("consumer", &self.consumer)
            .field("identifier", &self.identifier)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

pub struct SessionBuilder {
    consumer: ConsumerCredentials,
    identifier: Option<String>,
    password: Option<String>,
    config: Config,
    http: Option<reqwest::Client>,
}

impl SessionBuilder {
    /// Account credentials used by [`OAuthSession::authorize_self`].
    pub fn credentials<TId, TPass>(self, identifier: TId, password: TPass) -> Self
    where
        TId: Into<String>,
        TPass: Into<String>,
    {
        SessionBuilder {
            identifier: Some(identifier.into()),
            password: Some(password.into()),
            ..self
        }
    }

    pub fn config(self, config: Config) -> Self {
        SessionBuilder { config, ..self }
    }

    /// Use a preconfigured client instead of building one from the config.
    /// The config's timeout is not applied to it.
    pub fn client(self, client: reqwest::Client) -> Self {
        SessionBuilder {
            http: Some(client),
            ..self
        }
    }

    pub fn build(self) -> std::result::Result<OAuthSession, ConfigurationError> {
        let http = match self.http {
            Some(client) => client,
            None => self.config.http_client()?,
        };
        Ok(OAuthSession {
            consumer: self.consumer,
            identifier: self.identifier,
            password: self.password,
            config: self.config,
            http,
            state: SessionState::Unauthenticated,
        })
    }
}

impl OAuthSession {
    pub fn builder<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> SessionBuilder
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        SessionBuilder {
            consumer: ConsumerCredentials::new(consumer_key, consumer_secret),
            identifier: None,
            password: None,
            config: Config::default(),
            http: None,
        }
    }

    /// Session with the default configuration and no account credentials.
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        OAuthSession {
            consumer: ConsumerCredentials::new(consumer_key, consumer_secret),
            identifier: None,
            password: None,
            config: Config::default(),
            http: reqwest::Client::new(),
            state: SessionState::Unauthenticated,
        }
    }

    /// Session configured from the `KHAN_*` environment variables.
    pub fn from_env() -> std::result::Result<Self, ConfigurationError> {
        let credentials = Credentials::from_env()?;
        let mut builder = OAuthSession::builder(credentials.consumer_key, credentials.consumer_secret)
            .config(Config::from_env()?);
        if let (Some(identifier), Some(password)) = (credentials.identifier, credentials.password) {
            builder = builder.credentials(identifier, password);
        }
        builder.build()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn consumer(&self) -> &ConsumerCredentials {
        &self.consumer
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "oauth session transition");
        self.state = next;
    }

    fn parameters(&self) -> OAuthParameters<'static> {
        OAuthParameters::new().version(self.config.get_oauth_version())
    }

    /// Step 1: obtain a request token.
    ///
    /// With a callback the provider redirects the user there after consent;
    /// without one the provider falls back to out-of-band handling, which is
    /// what the headless flow relies on.
    pub async fn request_token(&mut self, callback: Option<&str>) -> Result<RequestToken> {
        let endpoint = self.config.get_endpoints().request_token.clone();
        let mut parameters = self.parameters();
        if let Some(callback) = callback {
            parameters = parameters.callback(callback.to_string());
        }
        let signed = {
            let secrets = self.consumer.secrets();
            Signer::new(&secrets, parameters).sign(&Method::POST, &endpoint, NO_PARAMS)?
        };

        debug!(endpoint = %endpoint, interactive = callback.is_some(), "requesting request token");
        let token: RequestToken = self
            .http
            .post(endpoint)
            .query(signed.pairs())
            .send()
            .parse_oauth_token()
            .await
            .map_err(|e| {
                warn!(error = %e, "request token acquisition failed");
                e
            })?
            .into();

        self.transition(SessionState::RequestTokenObtained);
        Ok(token)
    }

    /// Step 2 (interactive): the URL the end user must be redirected to.
    pub fn authorize_interactive(&self, request_token: &RequestToken) -> Url {
        let mut url = self.config.get_endpoints().authorize.clone();
        url.query_pairs_mut()
            .append_pair(OAUTH_TOKEN_KEY, request_token.token());
        url
    }

    /// Step 2 (interactive, resumed): read the provider's callback query.
    pub fn accept_callback(&mut self, query: &str) -> Result<CallbackParams> {
        let params = CallbackParams::parse(query)?;
        self.transition(SessionState::UserAuthorized);
        Ok(params)
    }

    /// Step 2 (headless): grant consent by submitting the account credentials.
    pub async fn authorize_headless(
        &mut self,
        request_token: &RequestToken,
        identifier: &str,
        password: &str,
    ) -> Result<()> {
        let endpoint = self.config.get_endpoints().authorize.clone();
        debug!(endpoint = %endpoint, identifier, "authorizing request token");

        let resp = self
            .http
            .post(endpoint)
            .query(&[
                (IDENTIFIER_KEY, identifier),
                (PASSWORD_KEY, password),
                (OAUTH_TOKEN_KEY, request_token.token()),
            ])
            .send()
            .await
            .map_err(AuthorizationError::from)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "authorize endpoint rejected credentials");
            return Err(AuthorizationError::Status(status.as_u16(), body).into());
        }

        self.transition(SessionState::UserAuthorized);
        Ok(())
    }

    /// Step 3: exchange the request token for an access token.
    ///
    /// The request token is consumed. The interactive flow passes the verifier
    /// received on the callback; the headless flow has none.
    pub async fn access_token(
        &mut self,
        request_token: RequestToken,
        verifier: Option<&str>,
    ) -> Result<AccessToken> {
        let endpoint = self.config.get_endpoints().access_token.clone();
        let mut parameters = self.parameters();
        if let Some(verifier) = verifier {
            parameters = parameters.verifier(verifier.to_string());
        }
        let signed = {
            let secrets = self.consumer.secrets().with(&request_token);
            Signer::new(&secrets, parameters).sign(&Method::POST, &endpoint, NO_PARAMS)?
        };

        debug!(endpoint = %endpoint, verified = verifier.is_some(), "exchanging request token");
        let token: AccessToken = self
            .http
            .post(endpoint)
            .query(signed.pairs())
            .send()
            .parse_oauth_token()
            .await
            .map_err(|e| {
                warn!(error = %e, "access token exchange failed");
                e
            })?
            .into();

        self.transition(SessionState::Authenticated);
        Ok(token)
    }

    /// Run the whole handshake with the account credentials given at
    /// construction.
    pub async fn authorize_self(&mut self) -> Result<AccessToken> {
        let (identifier, password) = match (&self.identifier, &self.password) {
            (Some(identifier), Some(password)) if !identifier.is_empty() && !password.is_empty() => {
                (identifier.clone(), password.clone())
            }
            _ => return Err(ConfigurationError::MissingCredentials.into()),
        };

        let request_token = self.request_token(None).await?;
        self.authorize_headless(&request_token, &identifier, &password)
            .await?;
        self.access_token(request_token, None).await
    }

    /// Sign an arbitrary request with the consumer credentials and, when given,
    /// the access token.
    pub fn sign_request<K, V>(
        &self,
        method: &Method,
        url: &Url,
        params: &[(K, V)],
        access_token: Option<&AccessToken>,
    ) -> SignResult<SignedParameters>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parameters = self.parameters();
        let secrets = self.consumer.secrets();
        match access_token {
            Some(token) => Signer::new(&secrets.with(token), parameters).sign(method, url, params),
            None => Signer::new(&secrets, parameters).sign(method, url, params),
        }
    }
}

impl RequestSigner for OAuthSession {
    fn sign_request(
        &self,
        method: &Method,
        url: &Url,
        params: &[(String, String)],
        access_token: Option<&AccessToken>,
    ) -> SignResult<SignedParameters> {
        OAuthSession::sign_request(self, method, url, params, access_token)
    }
}

const NO_PARAMS: &[(&str, &str)] = &[];
