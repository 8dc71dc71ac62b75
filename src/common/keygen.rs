use std::panic::{self, AssertUnwindSafe};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::RsaPrivateKey;
use tracing::{debug, warn};

use crate::common::types::KeyPair;
use crate::error::{KeyMgtError, Result};

/// Smallest modulus accepted. Anything below is refused rather than generated weak.
pub const MIN_KEY_BITS: usize = 512;

pub const DEFAULT_KEY_BITS: usize = 2048;

/// Generates an RSA key pair (public exponent 65537) from the OS random source.
pub fn generate(bits: usize) -> Result<KeyPair> {
    generate_with_rng(&mut OsRng, bits)
}

/// Same as [`generate`] with a caller-supplied CSPRNG.
///
/// Every read goes through the source's fallible path. The first failed read
/// abandons the prime search and is reported as
/// [`KeyMgtError::EntropyFailure`]; generation is not retried.
pub fn generate_with_rng<R>(rng: &mut R, bits: usize) -> Result<KeyPair>
where
    R: RngCore + CryptoRng,
{
    check_key_bits(bits)?;

    let mut rng = CheckedRng::new(rng);
    let mut probe = [0u8; 32];
    rng.try_fill_bytes(&mut probe)
        .map_err(KeyMgtError::EntropyFailure)?;

    debug!(bits, "Generating RSA key pair");
    let generated =
        panic::catch_unwind(AssertUnwindSafe(|| RsaPrivateKey::new(&mut rng, bits)));
    if let Some(e) = rng.failure.take() {
        warn!(bits, error = %e, "Random source failed during key generation");
        return Err(KeyMgtError::EntropyFailure(e));
    }
    let private_key = match generated {
        Ok(result) => result?,
        Err(payload) => panic::resume_unwind(payload),
    };
    private_key.validate()?;
    debug!(bits, "RSA key pair generated");

    Ok(KeyPair::from_private(private_key))
}

/// Unwind payload used to leave the backend's prime search after a failed read.
struct EntropyLost;

/// Routes every read through `try_fill_bytes` and remembers the first failure.
///
/// The backend only uses the infallible `fill_bytes`, so a failure unwinds with
/// [`EntropyLost`] and [`generate_with_rng`] turns the recorded error into a
/// typed result.
struct CheckedRng<'a, R> {
    inner: &'a mut R,
    failure: Option<rand::Error>,
}

impl<'a, R: RngCore> CheckedRng<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            failure: None,
        }
    }
}

impl<R: RngCore> RngCore for CheckedRng<'_, R> {
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
        if self.try_fill_bytes(dest).is_err() {
            panic::resume_unwind(Box::new(EntropyLost));
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        if self.failure.is_some() {
            return Err(rand::Error::new("random source already failed"));
        }
        self.inner.try_fill_bytes(dest).map_err(|e| {
            let message = e.to_string();
            self.failure = Some(e);
            rand::Error::new(message)
        })
    }
}

impl<R: CryptoRng> CryptoRng for CheckedRng<'_, R> {}

pub fn check_key_bits(bits: usize) -> Result<()> {
    if bits < MIN_KEY_BITS {
        warn!(bits, minimum = MIN_KEY_BITS, "Refusing to generate undersized RSA key");
        return Err(KeyMgtError::InvalidKeyLength {
            bits,
            minimum: MIN_KEY_BITS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{small_key_pair, ExhaustingRng, FailingRng, TEST_KEY_BITS};
    use assert_matches::assert_matches;
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};
    use rsa::BigUint;

    #[test]
    fn test_generated_public_matches_private() {
        let pair = small_key_pair();
        let derived = pair.private_key().to_public_key();
        assert_eq!(derived.n(), pair.public_key().n());
        assert_eq!(derived.e(), pair.public_key().e());
        assert_eq!(pair.public_key().e(), &BigUint::from(65537u32));
        assert_eq!(pair.bits(), TEST_KEY_BITS);
    }

    #[test]
    fn test_generated_key_is_consistent() {
        let pair = small_key_pair();
        let private_key = pair.private_key();
        assert!(private_key.validate().is_ok());
        let product = private_key
            .primes()
            .iter()
            .fold(BigUint::from(1u32), |acc, p| acc * p);
        assert_eq!(&product, private_key.n());
    }

    #[test]
    fn test_minimum_size_is_accepted() -> Result<()> {
        let pair = generate(MIN_KEY_BITS)?;
        assert_eq!(pair.bits(), MIN_KEY_BITS);
        Ok(())
    }

    #[test]
    fn test_undersized_key_is_rejected() {
        assert_matches!(
            generate(256),
            Err(KeyMgtError::InvalidKeyLength { bits: 256, minimum: MIN_KEY_BITS })
        );
        assert_matches!(generate(0), Err(KeyMgtError::InvalidKeyLength { .. }));
        assert_matches!(
            generate(MIN_KEY_BITS - 1),
            Err(KeyMgtError::InvalidKeyLength { .. })
        );
    }

    #[test]
    fn test_entropy_failure_aborts_generation() {
        let mut rng = FailingRng;
        assert_matches!(
            generate_with_rng(&mut rng, DEFAULT_KEY_BITS),
            Err(KeyMgtError::EntropyFailure(_))
        );
    }

    #[test]
    fn test_entropy_lost_mid_generation_is_reported() {
        for reads in [1, 2, 5] {
            let mut rng = ExhaustingRng::new(reads);
            assert_matches!(
                generate_with_rng(&mut rng, 1024),
                Err(KeyMgtError::EntropyFailure(e)) if e.to_string().contains("exhausted")
            );
        }
    }

    #[test]
    fn test_checked_rng_passes_reads_through() -> Result<()> {
        let mut rng = ExhaustingRng::new(usize::MAX);
        let pair = generate_with_rng(&mut rng, MIN_KEY_BITS)?;
        assert_eq!(pair.bits(), MIN_KEY_BITS);
        Ok(())
    }

    #[test]
    fn test_length_checked_before_entropy() {
        let mut rng = FailingRng;
        assert_matches!(
            generate_with_rng(&mut rng, 128),
            Err(KeyMgtError::InvalidKeyLength { .. })
        );
    }

    #[test]
    fn test_pairs_are_independent() -> Result<()> {
        let first = generate(MIN_KEY_BITS)?;
        let second = generate(MIN_KEY_BITS)?;
        assert_ne!(first.public_key().n(), second.public_key().n());
        Ok(())
    }
}
