//! RSA key pair generation and PKCS#1 PEM encoding into any byte sink.

pub mod common;
pub mod error;
pub mod test_utils;

pub use common::keygen::{generate, generate_with_rng, DEFAULT_KEY_BITS, MIN_KEY_BITS};
pub use common::pem::{artifact_for, encode, encode_any, PemEncodable, PUBLIC_KEY_ENCODING};
pub use common::types::{EncodedArtifact, KeyPair, KeyRef, KeyRole};
pub use error::{KeyMgtError, Result};
