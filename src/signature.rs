//! Signature type.
//!
//! Field order and naming follow `risc0/.../types.rs::Signature`
//! (`path`, `rho`, `hashes`, `leaf_index`), generalized from fixed-size
//! arrays to runtime-length vectors since `v` and `ℓ` vary per
//! [`crate::params::Parameters`] rather than being crate-wide constants.

use alloc::vec::Vec;

use crate::constants::{HASH_LEN, RANDOMNESS_LEN};
use crate::field::F;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub epoch: u64,
    pub rho: [F; RANDOMNESS_LEN],
    /// The `v` chain outputs `chain_outputs[i] = H^{k_i}(CH_0^{epoch,i})`.
    pub chain_outputs: Vec<[F; HASH_LEN]>,
    /// The `ℓ` sibling nodes from the leaf up to the root.
    pub auth_path: Vec<[F; HASH_LEN]>,
}
