use std::io;
use thiserror::Error;

/// Errors surfaced by key generation and PEM encoding.
#[derive(Debug, Error)]
pub enum KeyMgtError {
    /// The requested modulus size is below the accepted minimum.
    #[error("RSA key length of {bits} bits is below the minimum of {minimum} bits")]
    InvalidKeyLength { bits: usize, minimum: usize },

    /// The random source could not be read. Generation is not retried.
    #[error("Random source unavailable: {0}")]
    EntropyFailure(#[source] rand::Error),

    /// The RSA backend failed to produce or validate a key.
    #[error("RSA key generation failed: {0}")]
    KeyGeneration(#[from] rsa::Error),

    /// A value that is neither an RSA public nor private key was handed to the encoder.
    #[error("Unsupported key type {0}")]
    UnsupportedKeyType(String),

    /// DER serialization of the key failed.
    #[error("Failed to encode key: {0}")]
    Encoding(String),

    /// The sink rejected the PEM text.
    #[error("Failed to write {name}: {source}")]
    IoWriteFailed {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, KeyMgtError>;
