//! End-to-end scenarios over the public `key_gen`/`sign`/`verify` surface,
//! grounded on the integration-test style of
//! `adust09-OpenVM-XMSS/tests/integration_test.rs` (one `#[test]` per
//! user-visible scenario, asserting on the wrapper API rather than
//! internals).

use koala_xmss::{key_gen, sign, verify, MESSAGE_LENGTH, ParameterSet, RetentionMode, XmssError};
use p3_field::PrimeCharacteristicRing;
use rand_core::RngCore;

/// Every byte `0x42`, used for scenarios pinning a fixed seed.
struct ConstantRng;
impl RngCore for ConstantRng {
    fn next_u32(&mut self) -> u32 {
        0x4242_4242
    }
    fn next_u64(&mut self) -> u64 {
        0x4242_4242_4242_4242
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0x42);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

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

fn message_with_tail(prefix: &[u8]) -> [u8; MESSAGE_LENGTH] {
    let mut msg = [0u8; MESSAGE_LENGTH];
    msg[..prefix.len()].copy_from_slice(prefix);
    msg
}

fn fully_prepare(sk: &mut koala_xmss::SecretKey, params: &koala_xmss::Parameters) {
    while !sk.prepared.is_exhausted() {
        let (_, window_end) = sk.prepared.get_prepared_interval();
        let subtree_size = 1u64 << sk.prepared.subtree_height();
        let leaves: Vec<_> = (window_end..window_end + subtree_size)
            .map(|e| koala_xmss::wots::epoch_leaf(&sk.parameter, params, &sk.prf_key, e))
            .collect();
        sk.prepared.advance(&sk.parameter, params, &leaves).unwrap();
    }
}

/// S1 — a fixed seed and message verify true; the root is a deterministic
/// function of the seed (the reference's cross-implementation fixture
/// value isn't available in this pack, so this checks the determinism the
/// fixture comparison depends on rather than a hardcoded hash).
#[test]
fn s1_fixed_seed_verifies_and_root_is_deterministic() {
    let (pk_a, mut sk_a) = key_gen(&mut ConstantRng, ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let (pk_b, _) = key_gen(&mut ConstantRng, ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    assert_eq!(pk_a.root, pk_b.root);

    let params = pk_a.parameters();
    fully_prepare(&mut sk_a, &params);

    let message = message_with_tail(b"Hello World!");
    let signature = sign(&sk_a, 0, &message).unwrap();
    assert!(verify(&pk_a, 0, &message, &signature).unwrap());
}

/// S2 — signing the same (key, epoch, message) twice is byte-identical.
#[test]
fn s2_signing_is_deterministic() {
    let (_, mut sk) = key_gen(&mut SeededRng(2), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let params = sk.parameters();
    fully_prepare(&mut sk, &params);

    let message = message_with_tail(b"second test message");
    let sig_a = sign(&sk, 13, &message).unwrap();
    let sig_b = sign(&sk, 13, &message).unwrap();
    assert_eq!(sig_a.to_bytes(), sig_b.to_bytes());
}

/// S3 — tampering with the revealed randomness breaks verification.
#[test]
fn s3_tampered_rho_fails_verification() {
    let (pk, mut sk) = key_gen(&mut SeededRng(3), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let params = sk.parameters();
    fully_prepare(&mut sk, &params);

    let message = message_with_tail(b"first test message");
    let mut signature = sign(&sk, 29, &message).unwrap();
    signature.rho[0] += koala_xmss::F::ONE;
    assert!(!verify(&pk, 29, &message, &signature).unwrap());
}

/// S4 — an epoch beyond the lifetime is rejected at verify, not folded.
#[test]
fn s4_epoch_beyond_lifetime_is_rejected() {
    let (pk, mut sk) = key_gen(&mut SeededRng(4), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let params = sk.parameters();
    fully_prepare(&mut sk, &params);

    let message = message_with_tail(b"irrelevant");
    // 999 is outside the activation range too, so signing itself fails;
    // what S4 actually exercises is verify() rejecting an epoch past the
    // declared lifetime.
    let signature = sign(&sk, 5, &message).unwrap();
    let err = verify(&pk, 999, &message, &signature);
    assert!(matches!(err, Err(XmssError::EpochTooLarge { epoch: 999, .. })));
}

/// S5 — every auth path in a fully active lifetime has length
/// `lifetime_log2` and verifies standalone against the public root.
#[test]
fn s5_auth_paths_have_lifetime_log2_length() {
    let (pk, mut sk) = key_gen(&mut SeededRng(5), ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
    let params = sk.parameters();
    fully_prepare(&mut sk, &params);

    let message = message_with_tail(b"fixed message for S5");
    for epoch in [0u64, 1, 2, 13, 31, 127, 255] {
        let signature = sign(&sk, epoch, &message).unwrap();
        assert_eq!(signature.auth_path.len(), params.lifetime_log2 as usize);
        assert!(verify(&pk, epoch, &message, &signature).unwrap());
    }
}

/// S6 — a lifetime far too large to fully materialise still signs and
/// verifies once enough of the window has been prepared, and refuses to
/// sign an unprepared epoch.
#[test]
fn s6_partial_preparation_reaches_a_distant_epoch() {
    let (pk, mut sk) = key_gen(&mut SeededRng(6), ParameterSet::Lifetime18WinternitzW16, 0, 1 << 18, RetentionMode::Minimal).unwrap();
    let params = sk.parameters();

    let message = message_with_tail(b"S6 message");
    let unprepared = sign(&sk, 2047, &message);
    assert!(matches!(unprepared, Err(XmssError::EpochNotPrepared { .. })));

    while !sk.prepared.contains(2047) {
        let (_, window_end) = sk.prepared.get_prepared_interval();
        let subtree_size = 1u64 << sk.prepared.subtree_height();
        let leaves: Vec<_> = (window_end..window_end + subtree_size)
            .map(|e| koala_xmss::wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e))
            .collect();
        sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();
    }

    let signature = sign(&sk, 2047, &message).unwrap();
    assert!(verify(&pk, 2047, &message, &signature).unwrap());
}

/// S7 — a partial activation window (`num_active_epochs < 2^lifetime_log2`,
/// `activation_epoch == 0`) still signs and verifies at both the first and
/// last active epoch. `num_active_epochs` is chosen so the active interval
/// is strictly shorter than the full lifetime, which exercises the bridge
/// tree above it and its placeholder leaves at a nonzero global level — a
/// path no other scenario here reaches, since every other `ParameterSet`
/// is used at its full lifetime.
#[test]
fn s7_partial_activation_window_round_trips() {
    let num_active = 100u64;
    let (pk, mut sk) = key_gen(&mut SeededRng(7), ParameterSet::Lifetime8TargetSumW4, 0, num_active, RetentionMode::Full).unwrap();
    let params = sk.parameters();

    while !sk.prepared.is_exhausted() {
        let (_, window_end) = sk.prepared.get_prepared_interval();
        let subtree_size = 1u64 << sk.prepared.subtree_height();
        let end = (window_end + subtree_size).min(num_active);
        let leaves: Vec<_> = (window_end..end).map(|e| koala_xmss::wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e)).collect();
        sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();
    }

    let message = message_with_tail(b"S7 message");
    for epoch in [0u64, 50, num_active - 1] {
        let signature = sign(&sk, epoch, &message).unwrap();
        assert_eq!(signature.auth_path.len(), params.lifetime_log2 as usize);
        assert!(verify(&pk, epoch, &message, &signature).unwrap());
    }
}
