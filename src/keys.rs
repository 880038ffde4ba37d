//! Public and secret key types.
//!
//! Shaped after `risc0/.../types.rs::PublicKey` (root + parameter) and
//! OpenVM-XMSS's `xmss-types::Signature`/`PublicKey` pairing of crypto
//! material with the `Parameters`/`TslParams` that produced it, generalized
//! here to the Full/Minimal secret-key split spec.md §3 calls for.

use alloc::vec::Vec;

use crate::constants::{HASH_LEN, PARAMETER_LEN};
use crate::field::F;
use crate::params::{ParameterSet, Parameters};
use crate::preparation::{PreparationState, RetentionMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub root: [F; HASH_LEN],
    pub parameter: [F; PARAMETER_LEN],
    pub parameter_set: ParameterSet,
}

impl PublicKey {
    pub fn parameters(&self) -> Parameters {
        self.parameter_set.to_parameters()
    }
}

/// A secret key, either `Full` (carries the materialised subtrees for
/// O(log n) signing at any prepared epoch) or `Minimal` (carries only the
/// preparation state, re-materialising on demand).
#[derive(Debug, Clone)]
pub struct SecretKey {
    pub prf_key: [u8; 32],
    pub activation_epoch: u64,
    pub num_active_epochs: u64,
    pub parameter: [F; PARAMETER_LEN],
    pub parameter_set: ParameterSet,
    pub prepared: PreparationState,
}

impl SecretKey {
    pub fn new(
        prf_key: [u8; 32],
        activation_epoch: u64,
        num_active_epochs: u64,
        parameter: [F; PARAMETER_LEN],
        parameter_set: ParameterSet,
        retention: RetentionMode,
        subtree_roots: Vec<[F; HASH_LEN]>,
    ) -> Self {
        Self {
            prf_key,
            activation_epoch,
            num_active_epochs,
            parameter,
            parameter_set,
            prepared: PreparationState::fresh(activation_epoch, num_active_epochs, retention, subtree_roots),
        }
    }

    /// Assemble a secret key around a [`PreparationState`] built directly
    /// (e.g. [`wire.rs`](crate::wire)'s deserializer reconstructing one
    /// from persisted subtree data) rather than starting `Fresh` via
    /// [`Self::new`].
    pub(crate) fn from_prepared(prf_key: [u8; 32], activation_epoch: u64, num_active_epochs: u64, parameter: [F; PARAMETER_LEN], parameter_set: ParameterSet, prepared: PreparationState) -> Self {
        Self { prf_key, activation_epoch, num_active_epochs, parameter, parameter_set, prepared }
    }

    pub fn parameters(&self) -> Parameters {
        self.parameter_set.to_parameters()
    }

    pub fn epoch_in_activation_range(&self, epoch: u64) -> bool {
        epoch >= self.activation_epoch && epoch < self.activation_epoch + self.num_active_epochs
    }

    pub fn retention(&self) -> RetentionMode {
        self.prepared.retention()
    }
}
