//! OAuth 1.0a request signing (HMAC-SHA1), as required by the v2 tweet
//! endpoint for user-context writes.
//!
//! JSON request bodies are not part of the signature base string; only the
//! `oauth_*` parameters and any query parameters are.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Result, XError};

type HmacSha1 = Hmac<Sha1>;

/// The four user-context secrets. The consumer key is what the developer
/// portal also calls the "API key".
#[derive(Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// HMAC-SHA1 signature over the method, base url and sorted parameters.
pub(crate) fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| XError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization: OAuth ...` header value for one request.
pub(crate) fn authorization_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    nonce: &str,
    timestamp: i64,
) -> Result<String> {
    let mut oauth_params = vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];

    let signature = sign(
        method,
        url,
        &oauth_params,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    )?;
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}
