use std::fmt;

use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// A freshly generated RSA key pair.
///
/// The private key is authoritative; the public half is derived from it once
/// and kept alongside for convenience.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    pub fn from_private(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.n().bits()
    }

    pub fn into_parts(self) -> (RsaPrivateKey, RsaPublicKey) {
        (self.private_key, self.public_key)
    }
}

/// Which half of a key pair a key is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Public,
    Private,
}

impl KeyRole {
    pub const fn suffix(self) -> &'static str {
        match self {
            KeyRole::Public => "_public",
            KeyRole::Private => "_private",
        }
    }

    pub const fn pem_label(self) -> &'static str {
        match self {
            KeyRole::Public => "RSA PUBLIC KEY",
            KeyRole::Private => "RSA PRIVATE KEY",
        }
    }

    /// `rsa_public.pem` or `rsa_private.pem`. Depends on nothing but the role.
    pub const fn canonical_name(self) -> &'static str {
        match self {
            KeyRole::Public => "rsa_public.pem",
            KeyRole::Private => "rsa_private.pem",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Public => write!(f, "public"),
            KeyRole::Private => write!(f, "private"),
        }
    }
}

/// A borrowed key of either role.
#[derive(Clone, Copy, Debug)]
pub enum KeyRef<'a> {
    Public(&'a RsaPublicKey),
    Private(&'a RsaPrivateKey),
}

impl KeyRef<'_> {
    pub fn role(&self) -> KeyRole {
        match self {
            KeyRef::Public(_) => KeyRole::Public,
            KeyRef::Private(_) => KeyRole::Private,
        }
    }
}

impl<'a> From<&'a RsaPublicKey> for KeyRef<'a> {
    fn from(key: &'a RsaPublicKey) -> Self {
        KeyRef::Public(key)
    }
}

impl<'a> From<&'a RsaPrivateKey> for KeyRef<'a> {
    fn from(key: &'a RsaPrivateKey) -> Self {
        KeyRef::Private(key)
    }
}

/// DER bytes of one key together with the PEM label and name it is emitted under.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    role: KeyRole,
    der: Vec<u8>,
}

impl EncodedArtifact {
    pub(crate) fn new(role: KeyRole, der: Vec<u8>) -> Self {
        Self { role, der }
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn pem_block_type(&self) -> &'static str {
        self.role.pem_label()
    }

    pub fn der_bytes(&self) -> &[u8] {
        &self.der
    }

    pub fn canonical_name(&self) -> &'static str {
        self.role.canonical_name()
    }
}

// Private key material must not end up in logs.
impl fmt::Debug for EncodedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedArtifact")
            .field("pem_block_type", &self.pem_block_type())
            .field("der_len", &self.der.len())
            .field("canonical_name", &self.canonical_name())
            .finish()
    }
}
