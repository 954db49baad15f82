//! Destination URI resolver.
//!
//! Classifies a destination/source string as an object-store locator or
//! a local filesystem path. Anything starting with `s3://` or `s3n://`
//! is object-store; any other `scheme://` is an error; everything else
//! is a local path.
//!
//! Credentials are pulled out of the URI *before* it reaches the general
//! URL parser. Secret keys may legitimately contain `/`, which a generic
//! parser mis-splits into host and path, so the `user:pass@` segment is
//! located by literal index search instead.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use tracing::warn;
use url::Url;

use kvault_core::{KvaultError, KvaultResult};

/// Static credentials carried in a URI. When absent, the ambient
/// provider chain (environment variables etc.) supplies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCredentials {
    pub access_key: String,
    pub secret_key: String,
}

/// A resolved object-store locator. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTarget {
    pub bucket: String,
    /// Object key as parsed from the URI path, leading `/` included.
    pub key: String,
    /// Region override; `None` defers to the ambient provider chain.
    pub region: Option<String>,
    /// Custom S3-compatible endpoint; `None` means stock AWS S3.
    pub endpoint: Option<String>,
    pub credentials: Option<ObjectCredentials>,
    /// Force path-style bucket addressing (`?pathstyle=true`).
    pub force_path_style: bool,
    /// Plaintext HTTP (`?secure=false`). Default is TLS.
    pub tls_disabled: bool,
}

/// A resolved destination or source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Local(PathBuf),
    Object(ObjectTarget),
}

/// Resolve a destination/source string into a [`StorageTarget`].
pub fn resolve(uri_or_path: &str) -> KvaultResult<StorageTarget> {
    let Some(scheme_end) = uri_or_path.find("://") else {
        return Ok(StorageTarget::Local(PathBuf::from(uri_or_path)));
    };
    let scheme = &uri_or_path[..scheme_end];
    if !scheme.eq_ignore_ascii_case("s3") && !scheme.eq_ignore_ascii_case("s3n") {
        return Err(KvaultError::UnknownScheme(scheme.to_string()));
    }

    let (remainder, credentials) = split_credentials(&uri_or_path[scheme_end + 3..]);
    let parsed = Url::parse(&format!("{scheme}://{remainder}"))
        .with_context(|| format!("parsing object-store URI {uri_or_path:?}"))?;

    let bucket = match parsed.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(KvaultError::MissingBucketOrKey),
    };
    // the parser hands back the percent-encoded path; the object key is
    // the decoded form
    let key = urlencoding::decode(parsed.path())
        .with_context(|| format!("percent-decoding object key in {uri_or_path:?}"))?
        .into_owned();
    if key.is_empty() || key == "/" {
        return Err(KvaultError::MissingBucketOrKey);
    }

    let mut target = ObjectTarget {
        bucket,
        key,
        region: None,
        endpoint: None,
        credentials,
        force_path_style: false,
        tls_disabled: false,
    };
    for (name, value) in parsed.query_pairs() {
        match name.as_ref() {
            "region" => target.region = Some(value.into_owned()),
            "endpoint" => target.endpoint = Some(value.into_owned()),
            "secure" => target.tls_disabled = !parse_bool("secure", &value)?,
            "pathstyle" => target.force_path_style = parse_bool("pathstyle", &value)?,
            other => warn!(parameter = other, "ignoring unknown URI query parameter"),
        }
    }

    Ok(StorageTarget::Object(target))
}

/// Extract a `user:pass@` credential segment by literal index search.
///
/// Returns the remainder of the URI (everything past the `@`) and the
/// credentials, if an unambiguous segment is present: the text before
/// the first `@` must split on `:` into a non-empty user free of `/`
/// and a non-empty secret. The secret itself may contain `/`, which is
/// the whole reason this runs before the general URL parser.
fn split_credentials(rest: &str) -> (&str, Option<ObjectCredentials>) {
    if let Some(at) = rest.find('@') {
        if let Some((user, pass)) = rest[..at].split_once(':') {
            if !user.is_empty() && !user.contains('/') && !pass.is_empty() {
                return (
                    &rest[at + 1..],
                    Some(ObjectCredentials {
                        access_key: user.to_string(),
                        secret_key: pass.to_string(),
                    }),
                );
            }
        }
    }
    (rest, None)
}

fn parse_bool(name: &str, value: &str) -> KvaultResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(anyhow!("invalid boolean for {name:?}: {value:?}").into()),
    }
}
