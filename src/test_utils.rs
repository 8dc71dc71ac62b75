//! Fixtures shared by the unit tests and the `keygen` binary's tests.
//!
//! These helpers panic on failure. Only tests call them.

use std::io::{self, Write};
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rsa::pkcs1::der::pem;

use crate::common::keygen::generate;
use crate::common::types::KeyPair;

/// Size of the shared test key. Small enough to generate quickly in debug builds.
pub const TEST_KEY_BITS: usize = 1024;

/// Returns a key pair generated once per test binary.
pub fn small_key_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate(TEST_KEY_BITS).expect("test key generation"))
}

/// Decodes the DER body of a single PEM block.
pub fn pem_body(text: &str) -> Vec<u8> {
    let (_label, der) = pem::decode_vec(text.as_bytes()).expect("well-formed PEM");
    der
}

/// A sink that rejects every write.
pub struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A random source that is never available.
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        panic!("FailingRng has no entropy")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("FailingRng has no entropy")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("FailingRng has no entropy")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}

impl CryptoRng for FailingRng {}

/// A deterministic source that serves `reads` successful reads, then fails.
pub struct ExhaustingRng {
    inner: StdRng,
    reads: usize,
}

impl ExhaustingRng {
    pub fn new(reads: usize) -> Self {
        Self {
            inner: StdRng::seed_from_u64(7),
            reads,
        }
    }
}

impl RngCore for ExhaustingRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(e) = self.try_fill_bytes(dest) {
            panic!("{}", e)
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        if self.reads == 0 {
            return Err(rand::Error::new("entropy source exhausted"));
        }
        self.reads -= 1;
        self.inner.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for ExhaustingRng {}
