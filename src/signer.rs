use std::borrow::Cow;
use std::fmt::Write;

use http::Method;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{
    SecretsProvider, SignError, SignResult, OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY, OAUTH_TIMESTAMP_KEY,
};

const AUTHORIZATION_SCHEME: &str = "OAuth ";

// RFC 5849 section 3.6: everything but ALPHA, DIGIT, '-', '.', '_' and '~'
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn oauth_encode(raw: &str) -> String {
    utf8_percent_encode(raw, OAUTH_ENCODE_SET).to_string()
}

/// Computes OAuth 1.0a HMAC-SHA1 signatures for one outgoing request.
#[derive(Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign `method url` together with `params`.
    ///
    /// Query pairs already present on `url` are part of the signed set and the
    /// signature base URL is `url` without its query and fragment. `params` are
    /// the query or form parameters that travel with the request; protocol
    /// parameters (`oauth_*`) must be set through [`OAuthParameters`] instead.
    pub fn sign<K, V>(
        self,
        method: &Method,
        url: &Url,
        params: &[(K, V)],
    ) -> SignResult<SignedParameters>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(SignError::InvalidUrl(url.to_string()));
        }
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        let (token, token_secret) = self.secrets.get_token_option_pair();
        let options = self.parameters.build_options(token);

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let mut collected: Vec<(Cow<str>, Cow<str>)> = url.query_pairs().collect();
        collected.extend(
            params
                .iter()
                .map(|(k, v)| (Cow::from(k.as_ref()), Cow::from(v.as_ref()))),
        );
        if let Some((key, _)) = collected
            .iter()
            .find(|(k, _)| k.starts_with(OAUTH_KEY_PREFIX))
        {
            return Err(SignError::ReservedParameter(key.to_string()));
        }

        // the base string orders pairs by their encoded form
        let mut sorted: Vec<(String, String)> = collected
            .iter()
            .map(|(k, v)| (oauth_encode(k), oauth_encode(v)))
            .chain(std::iter::once((OAUTH_KEY_PREFIX.to_string(), String::new())))
            .collect();
        sorted.sort();
        // the oauth_* block is inserted at the position of the bare prefix
        let mut divided = sorted.splitn(2, |(k, _)| k == OAUTH_KEY_PREFIX);
        let before_oauth = divided.next().unwrap_or_default();
        let after_oauth = divided.next().unwrap_or_default();

        // `Sign::parameter` hashes the key verbatim and encodes the value once
        // more, so both halves go in already encoded and the key twice
        let mut signer = OAuthSigner::with_signature_method(
            HmacSha1,
            method.as_str(),
            base_url,
            consumer_secret,
            token_secret,
        );
        for (key, value) in before_oauth {
            signer.parameter_encoded(&oauth_encode(key), value);
        }
        let mut signer = signer.oauth_parameters(consumer_key, &options);
        for (key, value) in after_oauth {
            signer.parameter_encoded(&oauth_encode(key), value);
        }

        let authorization = signer.finish().authorization;
        SignedParameters::from_authorization(authorization)
    }
}

/// Protocol parameters pinned for a single signature.
///
/// Unset nonce and timestamp are generated freshly on every signature.
#[derive(Debug, Clone, Default)]
pub struct OAuthParameters<'a> {
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_callback value
    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// When `true`, `oauth_version=1.0` is included in the signed set.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }

    fn build_options(&'a self, token: Option<&'a str>) -> Options<'a> {
        let mut opt = Options::new();

        // NOTE: items must be added by alphabetical order
        if let Some(ref callback) = self.callback {
            opt.callback(callback.as_ref());
        }
        if let Some(ref nonce) = self.nonce {
            opt.nonce(nonce.as_ref());
        }
        if let Some(timestamp) = self.timestamp {
            opt.timestamp(timestamp);
        }
        if let Some(token) = token {
            opt.token(token);
        }
        if let Some(ref verifier) = self.verifier {
            opt.verifier(verifier.as_ref());
        }
        opt.version(self.version);

        opt
    }
}

/// The `oauth_*` parameter set produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParameters {
    pairs: Vec<(String, String)>,
}

impl SignedParameters {
    fn from_authorization(authorization: String) -> SignResult<Self> {
        let content = authorization
            .strip_prefix(AUTHORIZATION_SCHEME)
            .ok_or_else(|| SignError::MalformedAuthorization(authorization.clone()))?;
        let mut pairs = Vec::new();
        for item in content.split(',') {
            let mut kv = item.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some(key), Some(value)) => {
                    let value = percent_decode_str(value.trim_matches('"'))
                        .decode_utf8()
                        .map_err(|_| SignError::MalformedAuthorization(authorization.clone()))?;
                    pairs.push((key.trim().to_string(), value.into_owned()));
                }
                _ => return Err(SignError::MalformedAuthorization(authorization.clone())),
            }
        }
        if !pairs.iter().any(|(k, _)| k == OAUTH_SIGNATURE_KEY) {
            return Err(SignError::MalformedAuthorization(authorization));
        }
        pairs.sort();
        Ok(SignedParameters { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn signature(&self) -> &str {
        self.get(OAUTH_SIGNATURE_KEY).unwrap_or_default()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.get(OAUTH_NONCE_KEY)
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.get(OAUTH_TIMESTAMP_KEY).and_then(|t| t.parse().ok())
    }

    /// Name/value pairs, sorted by name, ready to be appended as a query
    /// string or form body.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Render the set as an `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        let mut header = String::from(AUTHORIZATION_SCHEME);
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                header.push(',');
            }
            write!(header, "{}=\"{}\"", key, oauth_encode(value)).unwrap();
        }
        header
    }

    /// Append the set to the query string of `url`.
    pub fn append_to(&self, url: &mut Url) {
        url.query_pairs_mut().extend_pairs(self.pairs.iter());
    }
}
