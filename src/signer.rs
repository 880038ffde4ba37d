//! Top-level orchestration: `key_gen`, `sign`, `verify`.
//!
//! Shaped after OpenVM-XMSS's `wrapper.rs::XmssWrapper<S: SignatureScheme>`
//! (a thin struct composing `key_gen`/`sign`/`verify` over a scheme's
//! primitives, checking preconditions before delegating), generalized to
//! this crate's own `Parameters`/`PublicKey`/`SecretKey`/`Signature`
//! instead of wrapping an external scheme trait.

use alloc::vec::Vec;
use rand_core::RngCore;

use crate::encoding::{self, Encoded};
use crate::error::XmssError;
use crate::field::MESSAGE_LENGTH;
use crate::keys::{PublicKey, SecretKey};
use crate::merkle::{self, MerkleTree};
use crate::params::ParameterSet;
use crate::preparation::{self, PreparationState, RetentionMode};
use crate::signature::Signature;
use crate::wots;

#[cfg(feature = "std")]
use tracing::{debug, trace, warn};

/// Generate a keypair: sample a fresh PRF key, fix the tweakable-hash
/// parameter to the one `parameter_set` derives from its tag (shared by
/// every keypair under that variant — see `ParameterSet::tweak_parameter`
/// — rather than sampled per key), then walk every chain in
/// `[activation_epoch, activation_epoch + num_active_epochs)` once to fix
/// the public root.
///
/// This is the scheme's one unavoidably `O(num_active_epochs)` operation
/// — every other operation in the crate is either `O(1)` (verify, given a
/// prepared signer) or bounded by a single subtree (`advance`). Real
/// deployments keep `num_active_epochs` in the low millions for exactly
/// this reason.
///
/// Only `activation_epoch == 0` or `num_active_epochs == 2^lifetime_log2`
/// are supported: anything in between would need a root that bridges a
/// partially-active interval sitting at a non-zero offset inside the full
/// lifetime tree, which would need per-position placeholder subtree roots
/// all the way up to `lifetime_log2` — exactly the `O(2^lifetime_log2)`
/// cost the preparation engine exists to avoid. See `DESIGN.md`.
pub fn key_gen<R: RngCore>(rng: &mut R, parameter_set: ParameterSet, activation_epoch: u64, num_active_epochs: u64, retention: RetentionMode) -> Result<(PublicKey, SecretKey), XmssError> {
    let params = parameter_set.to_parameters();
    params.validate()?;

    let lifetime = 1u64 << params.lifetime_log2;
    if activation_epoch + num_active_epochs > lifetime {
        return Err(XmssError::ParameterError {
            reason: alloc::format!("activation_epoch + num_active_epochs ({}) exceeds 2^lifetime_log2 ({})", activation_epoch + num_active_epochs, lifetime),
        });
    }
    if num_active_epochs < lifetime && activation_epoch != 0 {
        return Err(XmssError::ParameterError {
            reason: "a partial activation window must start at epoch 0".into(),
        });
    }
    if num_active_epochs == 0 {
        return Err(XmssError::ParameterError {
            reason: "num_active_epochs must be nonzero".into(),
        });
    }

    let mut prf_key = [0u8; 32];
    rng.fill_bytes(&mut prf_key);
    let parameter = parameter_set.tweak_parameter();

    #[cfg(feature = "std")]
    debug!(lifetime_log2 = params.lifetime_log2, num_active_epochs, "key_gen: materialising active interval");

    let subtree_roots = preparation::compute_subtree_roots(&parameter, &params, &prf_key, activation_epoch, num_active_epochs);
    let (subtree_height, _) = PreparationState::subtree_layout(num_active_epochs);
    let active_root = preparation::combine_subtree_roots(&parameter, params.hash_variant, subtree_height, &subtree_roots);

    let root = if num_active_epochs == lifetime {
        active_root
    } else {
        let active_height = PreparationState::active_height(num_active_epochs);
        let bridge_height = params.lifetime_log2 - active_height;
        MerkleTree::build_at(&parameter, params.hash_variant, bridge_height, &[active_root], 0, active_height).root()
    };

    let public_key = PublicKey { root, parameter, parameter_set };
    let secret_key = SecretKey::new(prf_key, activation_epoch, num_active_epochs, parameter, parameter_set, retention, subtree_roots);

    Ok((public_key, secret_key))
}

/// Sign `message` at `epoch`. The epoch must be both within the secret
/// key's activation interval and currently prepared (see
/// [`PreparationState::advance`]) — this function never advances the
/// window itself.
pub fn sign(sk: &SecretKey, epoch: u64, message: &[u8; MESSAGE_LENGTH]) -> Result<Signature, XmssError> {
    if !sk.epoch_in_activation_range(epoch) {
        #[cfg(feature = "std")]
        warn!(epoch, activation_epoch = sk.activation_epoch, "sign: epoch outside activation range");
        return Err(XmssError::EpochOutOfRange {
            epoch,
            activation_epoch: sk.activation_epoch,
            end_epoch: sk.activation_epoch + sk.num_active_epochs,
        });
    }

    if !sk.prepared.contains(epoch) {
        let (window_start, window_end) = sk.prepared.get_prepared_interval();
        #[cfg(feature = "std")]
        warn!(epoch, window_start, window_end, "sign: epoch not in prepared window");
        return Err(XmssError::EpochNotPrepared { epoch, window_start, window_end });
    }

    let params = sk.parameters();
    let Encoded { rho, chunks } = encoding::encode_for_signing(&params, &sk.parameter, &sk.prf_key, epoch, message)?;

    let heads = wots::chain_heads(&sk.prf_key, epoch, params.num_chains);
    let chain_outputs: Vec<_> = chunks.iter().zip(heads.iter()).enumerate().map(|(i, (&k_i, &head))| wots::chain_walk(&sk.parameter, epoch, i as u32, 0, k_i, head)).collect();

    let mut auth_path = sk.prepared.auth_path(&sk.parameter, params.hash_variant, epoch).ok_or_else(|| {
        let (window_start, window_end) = sk.prepared.get_prepared_interval();
        XmssError::EpochNotPrepared { epoch, window_start, window_end }
    })?;

    if sk.num_active_epochs < (1u64 << params.lifetime_log2) {
        let active_root = sk.prepared.active_root(&sk.parameter, params.hash_variant);
        let active_height = PreparationState::active_height(sk.num_active_epochs);
        let bridge_height = params.lifetime_log2 - active_height;
        let bridge = MerkleTree::build_at(&sk.parameter, params.hash_variant, bridge_height, &[active_root], 0, active_height);
        auth_path.extend(bridge.auth_path(0));
    }

    #[cfg(feature = "std")]
    trace!(epoch, chunks = chunks.len(), "sign: signature assembled");

    Ok(Signature { epoch, rho, chain_outputs, auth_path })
}

/// Verify `signature` over `message` at `epoch` against `public_key`.
/// Returns `Ok(false)` for a cryptographic mismatch (wrong message, wrong
/// key, tampered signature); `Err` only for malformed preconditions
/// (epoch beyond the lifetime, mismatched signature/epoch).
pub fn verify(public_key: &PublicKey, epoch: u64, message: &[u8; MESSAGE_LENGTH], signature: &Signature) -> Result<bool, XmssError> {
    let params = public_key.parameters();

    if epoch >= (1u64 << params.lifetime_log2) {
        return Err(XmssError::EpochTooLarge { epoch, lifetime_log2: params.lifetime_log2 });
    }
    if signature.epoch != epoch {
        return Err(XmssError::ParameterMismatch {
            reason: alloc::format!("signature epoch {} does not match requested epoch {}", signature.epoch, epoch),
        });
    }
    if signature.chain_outputs.len() != params.num_chains as usize {
        return Ok(false);
    }
    if signature.auth_path.len() != params.lifetime_log2 as usize {
        return Ok(false);
    }

    let chunks = encoding::chunks_from_rho(&params, &public_key.parameter, epoch, &signature.rho, message);
    if chunks.len() != signature.chain_outputs.len() {
        return Ok(false);
    }

    let tails = wots::complete_chains(&public_key.parameter, &params, epoch, &chunks, &signature.chain_outputs);
    let leaf = wots::leaf_from_tails(&public_key.parameter, &params, epoch, &tails);

    let position = epoch as u32;
    let ok = merkle::verify_path(&public_key.parameter, params.hash_variant, &public_key.root, position, leaf, &signature.auth_path);

    #[cfg(feature = "std")]
    trace!(epoch, ok, "verify: path folded to candidate root");

    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRng(u64);
    impl RngCore for TestRng {
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

    #[test]
    fn sign_and_verify_round_trip_small_lifetime() {
        let mut rng = TestRng(1);
        let (pk, mut sk) = key_gen(&mut rng, ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();

        let params = pk.parameters();
        let leaves: Vec<_> = (0..(1u64 << 8)).map(|e| wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e)).collect();
        sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();

        let message = [7u8; MESSAGE_LENGTH];
        let signature = sign(&sk, 42, &message).unwrap();
        assert!(verify(&pk, 42, &message, &signature).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let mut rng = TestRng(2);
        let (pk, mut sk) = key_gen(&mut rng, ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
        let params = pk.parameters();
        let leaves: Vec<_> = (0..(1u64 << 8)).map(|e| wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e)).collect();
        sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();

        let message = [7u8; MESSAGE_LENGTH];
        let other = [8u8; MESSAGE_LENGTH];
        let signature = sign(&sk, 1, &message).unwrap();
        assert!(!verify(&pk, 1, &other, &signature).unwrap());
    }

    #[test]
    fn sign_without_preparation_is_rejected() {
        let mut rng = TestRng(3);
        let (_, sk) = key_gen(&mut rng, ParameterSet::Lifetime18WinternitzW16, 0, 1 << 18, RetentionMode::Minimal).unwrap();
        let message = [0u8; MESSAGE_LENGTH];
        let err = sign(&sk, 2047, &message);
        assert!(matches!(err, Err(XmssError::EpochNotPrepared { .. })));
    }

    #[test]
    fn sign_outside_activation_range_is_rejected() {
        let mut rng = TestRng(4);
        let (_, sk) = key_gen(&mut rng, ParameterSet::Lifetime8TargetSumW4, 0, 1 << 8, RetentionMode::Full).unwrap();
        let message = [0u8; MESSAGE_LENGTH];
        let err = sign(&sk, 1 << 8, &message);
        assert!(matches!(err, Err(XmssError::EpochOutOfRange { .. })));
    }

    #[test]
    fn multi_subtree_lifetime_round_trips_after_partial_preparation() {
        let mut rng = TestRng(5);
        let (pk, mut sk) = key_gen(&mut rng, ParameterSet::Lifetime18WinternitzW16, 0, 1 << 18, RetentionMode::Minimal).unwrap();
        let params = pk.parameters();

        let target_epoch = 2047u64;
        while !sk.prepared.contains(target_epoch) {
            let (_, window_end) = sk.prepared.get_prepared_interval();
            let subtree_size = 1u64 << sk.prepared.subtree_height();
            let leaves: Vec<_> = (window_end..window_end + subtree_size).map(|e| wots::epoch_leaf(&sk.parameter, &params, &sk.prf_key, e)).collect();
            sk.prepared.advance(&sk.parameter, &params, &leaves).unwrap();
        }

        let message = [3u8; MESSAGE_LENGTH];
        let signature = sign(&sk, target_epoch, &message).unwrap();
        assert!(verify(&pk, target_epoch, &message, &signature).unwrap());
    }
}
