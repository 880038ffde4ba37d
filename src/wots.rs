//! W-OTS chain layer: PRF-derived heads, the chain walk, and leaf
//! compression.
//!
//! `chain_walk` is grounded on `risc0/.../tweak_hash.rs::chain`, already
//! generic over start-position/steps; it is carried over essentially
//! unchanged. Head derivation and leaf compression are new, composing
//! [`crate::prf`] and [`crate::tweak`].

use alloc::vec::Vec;

use crate::constants::{HASH_LEN, PARAMETER_LEN};
use crate::field::F;
use crate::params::{HashVariant, Parameters};
use crate::prf::prf_chain_head;
use crate::tweak::{apply, Tweak};

/// Walk the chain for `(epoch, chain_index)` starting from `start` at
/// position `start_pos_in_chain`, applying the chain-hash tweak `steps`
/// times.
pub fn chain_walk(
    parameter: &[F; PARAMETER_LEN],
    epoch: u64,
    chain_index: u32,
    start_pos_in_chain: u32,
    steps: u32,
    start: [F; HASH_LEN],
) -> [F; HASH_LEN] {
    let mut current = start;
    for step in 0..steps {
        let pos = start_pos_in_chain + step;
        let tweak = Tweak::chain_tweak(epoch as u32, chain_index as u8, pos as u8);
        current = apply(parameter, &tweak, &[current], HashVariant::Poseidon2W16);
    }
    current
}

/// The `v` chain heads `CH_0^{epoch,i}` for `i in [0, v)`.
pub fn chain_heads(k: &[u8; 32], epoch: u64, num_chains: u32) -> Vec<[F; HASH_LEN]> {
    (0..num_chains).map(|i| prf_chain_head(k, epoch, i)).collect()
}

/// The `v` chain tails `CH_{w-1}^{epoch,i}`, i.e. each head walked forward
/// `w - 1` steps. This is the OTS public vector.
pub fn chain_tails(parameter: &[F; PARAMETER_LEN], params: &Parameters, epoch: u64, heads: &[[F; HASH_LEN]]) -> Vec<[F; HASH_LEN]> {
    heads
        .iter()
        .enumerate()
        .map(|(i, &head)| chain_walk(parameter, epoch, i as u32, 0, params.chain_length - 1, head))
        .collect()
}

/// Derive heads, walk each chain to its tail, and compress to the leaf
/// for one epoch — the full per-epoch keypair derivation used by keygen
/// and the preparation engine to materialise a subtree's leaves.
pub fn epoch_leaf(parameter: &[F; PARAMETER_LEN], params: &Parameters, k: &[u8; 32], epoch: u64) -> [F; HASH_LEN] {
    let heads = chain_heads(k, epoch, params.num_chains);
    let tails = chain_tails(parameter, params, epoch, &heads);
    leaf_from_tails(parameter, params, epoch, &tails)
}

/// Compress the OTS public vector (chain tails) into the Merkle leaf for
/// this epoch, tagged with [`Tweak::Leaf`] so the leaf commits to the
/// epoch even though `apply`'s generic sponge branch carries no epoch of
/// its own.
pub fn leaf_from_tails(parameter: &[F; PARAMETER_LEN], params: &Parameters, epoch: u64, tails: &[[F; HASH_LEN]]) -> [F; HASH_LEN] {
    let tweak = Tweak::leaf_tweak(epoch as u32);
    apply(parameter, &tweak, tails, params.hash_variant)
}

/// Complete each chain from the signer's revealed `chain_outputs[i]`
/// (stopped at position `k_i`) forward to the tail at `w - 1`, the inverse
/// of the signer's partial walk. Used by the verifier before leaf
/// recomputation.
pub fn complete_chains(
    parameter: &[F; PARAMETER_LEN],
    params: &Parameters,
    epoch: u64,
    chunks: &[u32],
    chain_outputs: &[[F; HASH_LEN]],
) -> Vec<[F; HASH_LEN]> {
    chunks
        .iter()
        .zip(chain_outputs.iter())
        .enumerate()
        .map(|(i, (&k_i, &out))| {
            let remaining = params.chain_length - 1 - k_i;
            chain_walk(parameter, epoch, i as u32, k_i, remaining, out)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;
    use p3_field::PrimeCharacteristicRing;

    #[test]
    fn walking_then_completing_recovers_tail() {
        let params = ParameterSet::Lifetime8TargetSumW4.to_parameters();
        let parameter = [F::ZERO; PARAMETER_LEN];
        let k = [0x9u8; 32];
        let epoch = 3u64;

        let heads = chain_heads(&k, epoch, params.num_chains);
        let tails = chain_tails(&parameter, &params, epoch, &heads);

        let k_i = 2u32;
        let chain_output = chain_walk(&parameter, epoch, 0, 0, k_i, heads[0]);
        let completed = chain_walk(&parameter, epoch, 0, k_i, params.chain_length - 1 - k_i, chain_output);
        assert_eq!(completed, tails[0]);
    }

    #[test]
    fn leaf_is_deterministic_and_epoch_bound() {
        let params = ParameterSet::Lifetime8TargetSumW4.to_parameters();
        let parameter = [F::ZERO; PARAMETER_LEN];
        let k = [0x5u8; 32];

        let heads_a = chain_heads(&k, 1, params.num_chains);
        let tails_a = chain_tails(&parameter, &params, 1, &heads_a);
        let leaf_a = leaf_from_tails(&parameter, &params, 1, &tails_a);

        let heads_b = chain_heads(&k, 2, params.num_chains);
        let tails_b = chain_tails(&parameter, &params, 2, &heads_b);
        let leaf_b = leaf_from_tails(&parameter, &params, 2, &tails_b);

        assert_ne!(leaf_a, leaf_b);
    }
}
