use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenFetchResult<T> = std::result::Result<T, TokenFetchError>;
pub type AuthorizationResult<T> = std::result::Result<T, AuthorizationError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error : {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("token acquisition failed : {0}")]
    TokenFetch(#[from] TokenFetchError),
    #[error("authorization failed : {0}")]
    Authorization(#[from] AuthorizationError),
    #[error("OAuth sign failed : {0}")]
    Signature(#[from] SignError),
    #[error("token cache failed : {0}")]
    Cache(#[from] CacheError),
    #[error("request failed : {0}")]
    Request(#[from] reqwest::Error),
    #[error("request body cannot be serialized : {0}")]
    Body(serde_json::Error),
    #[error("request parameters cannot be url-encoded : {0}")]
    Parameters(serde_urlencoded::ser::Error),
    #[error("request rejected with status {status} : {body}")]
    Status { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("no identifier or password was provided when the session was constructed")]
    MissingCredentials,
    #[error("an access token is required to call an authenticated endpoint")]
    MissingAccessToken,
    #[error("invalid url {0} : {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("HTTP client could not be constructed : {0}")]
    HttpClient(reqwest::Error),
    #[error("{0} is not implemented")]
    UnsupportedMethod(http::Method),
}

#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("parameter {0} is reserved for the OAuth protocol")]
    ReservedParameter(String),
    #[error("{0} cannot be used as a signature base URL")]
    InvalidUrl(String),
    #[error("generated authorization header is malformed : {0}")]
    MalformedAuthorization(String),
}

#[derive(Error, Debug)]
pub enum TokenFetchError {
    #[error("token endpoint unreachable : {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint responded with status {0} : {1}")]
    Status(u16, String),
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("authorize endpoint unreachable : {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authorize endpoint responded with status {0} : {1}")]
    Status(u16, String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to access {0} : {1}")]
    Io(String, std::io::Error),
    #[error("failed to (de)serialize cached token : {0}")]
    Serialization(#[from] serde_json::Error),
}
