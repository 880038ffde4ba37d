//! Property-based invariants, grounded on the `proptest` usage in
//! `adust09-sig-agg`'s test suite (arbitrary inputs over a small domain,
//! `proptest!` macro, explicit `ProptestConfig` to bound case count since
//! every case here pays a full `key_gen`).

use koala_xmss::{key_gen, sign, verify, ParameterSet, PublicKey, RetentionMode, SecretKey, Signature, XmssError};
use proptest::prelude::*;
use rand_core::RngCore;

struct SeededRng(u64);
impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn keypair(seed: u64) -> (PublicKey, SecretKey) {
    let (pk, mut sk) = key_gen(&mut SeededRng(seed), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let params = sk.parameters();
    while !sk.prepared.is_exhausted() {
        let (_, window_end) = sk.prepared.get_prepared_interval();
        let subtree_size = 1u64 << sk.prepared.subtree_height();
        let leaves: Vec<_> = (window_end..window_end + subtree_size)
            .map(|e| koala_xmss::wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e))
            .collect();
        sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();
    }
    (pk, sk)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Invariant 1: every epoch in range signs and verifies.
    #[test]
    fn signing_verifies_at_any_active_epoch(seed in any::<u64>(), epoch in 0u64..256, msg in proptest::array::uniform32(any::<u8>())) {
        let (pk, sk) = keypair(seed);
        let signature = sign(&sk, epoch, &msg).unwrap();
        prop_assert!(verify(&pk, epoch, &msg, &signature).unwrap());
    }

    /// Invariant 2: signing is a deterministic function of (key, epoch, message).
    #[test]
    fn signing_is_deterministic(seed in any::<u64>(), epoch in 0u64..256, msg in proptest::array::uniform32(any::<u8>())) {
        let (_, sk) = keypair(seed);
        let a = sign(&sk, epoch, &msg).unwrap();
        let b = sign(&sk, epoch, &msg).unwrap();
        prop_assert_eq!(a.to_bytes(), b.to_bytes());
    }

    /// Invariant 3: a signature for epoch e does not verify against a
    /// different in-range epoch e'.
    #[test]
    fn signature_does_not_verify_at_a_different_epoch(seed in any::<u64>(), epoch in 0u64..255, msg in proptest::array::uniform32(any::<u8>())) {
        let (pk, sk) = keypair(seed);
        let other = epoch + 1;
        let signature = sign(&sk, epoch, &msg).unwrap();
        prop_assert!(!verify(&pk, other, &msg, &signature).unwrap());
    }

    /// Invariant 3 (out-of-range half): verifying beyond the lifetime is a
    /// hard error, not a false result.
    #[test]
    fn verify_beyond_lifetime_is_an_error(seed in any::<u64>(), msg in proptest::array::uniform32(any::<u8>())) {
        let (pk, sk) = keypair(seed);
        let signature = sign(&sk, 0, &msg).unwrap();
        let err = verify(&pk, 1u64 << 8, &msg, &signature);
        prop_assert!(matches!(err, Err(XmssError::EpochTooLarge { .. })));
    }

    /// Invariant 4: flipping a bit anywhere in a serialized signature
    /// breaks verification (sampling a handful of bit positions per case
    /// rather than exhausting every bit, which would dominate runtime).
    #[test]
    fn tampering_any_sampled_bit_breaks_verification(seed in any::<u64>(), epoch in 0u64..256, msg in proptest::array::uniform32(any::<u8>()), bit_positions in proptest::collection::vec(0usize..64, 1..6)) {
        let (pk, sk) = keypair(seed);
        let signature = sign(&sk, epoch, &msg).unwrap();
        let bytes = signature.to_bytes();

        for bit in bit_positions {
            let byte_index = bit / 8 % bytes.len();
            let mut tampered = bytes.clone();
            tampered[byte_index] ^= 1 << (bit % 8);
            if let Ok(decoded) = Signature::from_bytes(&tampered) {
                if decoded.epoch == epoch {
                    prop_assert!(!verify(&pk, epoch, &msg, &decoded).unwrap_or(false));
                }
            }
        }
    }

    /// Invariant 5: round-tripping a public key and a signature through
    /// their wire encodings is lossless.
    #[test]
    fn public_key_and_signature_round_trip(seed in any::<u64>(), epoch in 0u64..256, msg in proptest::array::uniform32(any::<u8>())) {
        let (pk, sk) = keypair(seed);
        let signature = sign(&sk, epoch, &msg).unwrap();

        let pk_bytes = pk.to_bytes();
        prop_assert_eq!(PublicKey::from_bytes(&pk_bytes).unwrap(), pk);

        let sig_bytes = signature.to_bytes();
        prop_assert_eq!(Signature::from_bytes(&sig_bytes).unwrap(), signature);
    }
}

/// Invariant 7: `advance` strictly grows `window_end`, and only grows
/// `window_start` in `Minimal` mode.
#[test]
fn advance_is_monotone_in_both_retention_modes() {
    for retention in [RetentionMode::Full, RetentionMode::Minimal] {
        let (_, mut sk) = key_gen(&mut SeededRng(99), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, retention).unwrap();
        let params = sk.parameters();
        let mut prev = sk.prepared.get_prepared_interval();

        while !sk.prepared.is_exhausted() {
            let (_, window_end) = sk.prepared.get_prepared_interval();
            let subtree_size = 1u64 << sk.prepared.subtree_height();
            let leaves: Vec<_> = (window_end..window_end + subtree_size)
                .map(|e| koala_xmss::wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e))
                .collect();
            sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();

            let next = sk.prepared.get_prepared_interval();
            assert!(next.1 > prev.1);
            match retention {
                RetentionMode::Full => assert_eq!(next.0, prev.0),
                RetentionMode::Minimal => assert!(next.0 >= prev.0),
            }
            prev = next;
        }
    }
}
