use thiserror::Error;

pub type KvaultResult<T> = Result<T, KvaultError>;

#[derive(Debug, Error)]
pub enum KvaultError {
    /// HMAC validation failed on fetch. Always fatal: the decoded
    /// plaintext is discarded, never returned.
    #[error("signature validation failed: check the backup blob and its .sig companion")]
    BadSignature,

    /// The path transformation list had an odd number of entries.
    #[error("path transformation list is not even: transformations must be from,to pairs")]
    BadTransform,

    /// The destination string carried a scheme that is neither `s3` nor `s3n`.
    #[error("unknown scheme {0:?}: use an s3:// or s3n:// URI, or a local path")]
    UnknownScheme(String),

    /// An object-store URI was missing its bucket or object key.
    #[error("missing bucket or object key: expected s3://bucket/path/to/object")]
    MissingBucketOrKey,

    /// Bucket creation failed in a way that is neither success nor a
    /// recognized benign failure, and the bucket is not reachable.
    #[error("failed to create bucket {0:?} and it is not reachable")]
    CreateUnknown(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
