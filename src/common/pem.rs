//! PEM armoring of RSA keys.
//!
//! Both roles use the PKCS#1 DER layouts: `RSAPrivateKey` under
//! `RSA PRIVATE KEY` and `RSAPublicKey` under `RSA PUBLIC KEY`. The
//! subject-public-key-info layout is never emitted; it belongs under a plain
//! `PUBLIC KEY` label and mixing the two breaks OpenSSL-style consumers.

use std::any::{type_name, Any};
use std::io::Write;

use rsa::pkcs1::der::pem;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, warn};

use crate::common::types::{EncodedArtifact, KeyRef, KeyRole};
use crate::error::{KeyMgtError, Result};

/// The DER convention used for public keys.
pub const PUBLIC_KEY_ENCODING: &str = "PKCS#1 RSAPublicKey";

mod private {
    pub trait Sealed {}
}

/// A key the encoder knows how to armor.
///
/// Sealed: only the RSA public key, the RSA private key and [`KeyRef`]
/// implement it.
pub trait PemEncodable: private::Sealed {
    fn role(&self) -> KeyRole;

    fn to_der(&self) -> Result<Vec<u8>>;
}

impl private::Sealed for RsaPublicKey {}
impl private::Sealed for RsaPrivateKey {}
impl private::Sealed for KeyRef<'_> {}

impl PemEncodable for RsaPublicKey {
    fn role(&self) -> KeyRole {
        KeyRole::Public
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        let document = EncodeRsaPublicKey::to_pkcs1_der(self)
            .map_err(|e| KeyMgtError::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }
}

impl PemEncodable for RsaPrivateKey {
    fn role(&self) -> KeyRole {
        KeyRole::Private
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        let document = EncodeRsaPrivateKey::to_pkcs1_der(self)
            .map_err(|e| KeyMgtError::Encoding(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }
}

impl PemEncodable for KeyRef<'_> {
    fn role(&self) -> KeyRole {
        KeyRef::role(self)
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        match self {
            KeyRef::Public(key) => key.to_der(),
            KeyRef::Private(key) => key.to_der(),
        }
    }
}

/// Builds the artifact for `key` without touching any sink.
pub fn artifact_for<K>(key: &K) -> Result<EncodedArtifact>
where
    K: PemEncodable + ?Sized,
{
    Ok(EncodedArtifact::new(key.role(), key.to_der()?))
}

impl EncodedArtifact {
    /// Renders the RFC 7468 text form with LF line endings.
    pub fn to_pem(&self) -> Result<String> {
        pem::encode_string(self.pem_block_type(), LineEnding::LF, self.der_bytes())
            .map_err(|e| KeyMgtError::Encoding(e.to_string()))
    }
}

/// Armors `key` into PEM, writes it to `sink` and returns the canonical
/// artifact name (`rsa_public.pem` or `rsa_private.pem`).
///
/// Nothing is written if DER encoding fails. A rejected write is reported as
/// [`KeyMgtError::IoWriteFailed`] and not retried.
pub fn encode<K, W>(key: &K, sink: &mut W) -> Result<&'static str>
where
    K: PemEncodable + ?Sized,
    W: Write + ?Sized,
{
    let artifact = artifact_for(key)?;
    let name = artifact.canonical_name();
    let pem = artifact.to_pem()?;

    sink.write_all(pem.as_bytes())
        .map_err(|source| KeyMgtError::IoWriteFailed { name, source })?;

    debug!(
        role = %artifact.role(),
        artifact = name,
        der_len = artifact.der_bytes().len(),
        "PEM block written"
    );
    Ok(name)
}

/// Entry point for callers that only hold an untyped value.
///
/// Accepts an [`RsaPublicKey`] or [`RsaPrivateKey`], owned, as a `'static`
/// reference or wrapped in a `KeyRef<'static>`. Anything else yields
/// [`KeyMgtError::UnsupportedKeyType`] naming the supplied type, and the sink
/// is left untouched.
pub fn encode_any<T, W>(value: &T, sink: &mut W) -> Result<&'static str>
where
    T: Any,
    W: Write + ?Sized,
{
    let value = value as &dyn Any;
    if let Some(key) = value.downcast_ref::<RsaPublicKey>() {
        return encode(key, sink);
    }
    if let Some(key) = value.downcast_ref::<RsaPrivateKey>() {
        return encode(key, sink);
    }
    if let Some(key) = value.downcast_ref::<&'static RsaPublicKey>() {
        return encode(*key, sink);
    }
    if let Some(key) = value.downcast_ref::<&'static RsaPrivateKey>() {
        return encode(*key, sink);
    }
    if let Some(key) = value.downcast_ref::<KeyRef<'static>>() {
        return encode(key, sink);
    }

    let supplied = type_name::<T>();
    warn!(supplied, "Refusing to PEM encode a non-key value");
    Err(KeyMgtError::UnsupportedKeyType(supplied.to_string()))
}
