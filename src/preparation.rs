//! Key preparation engine: a two-level sliding window of materialised
//! Merkle subtrees over the active epoch interval.
//!
//! No example in the pack precedes this state machine (every leanSig
//! variant in the pack assumes the whole tree already exists). It is
//! grounded on the range-validation style of OpenVM-XMSS's
//! `xmss/epoch.rs::EpochValidator` — an explicit struct with range checks
//! returning `Result<_, XmssError>` rather than panicking — generalized
//! from a single activation-interval check into the window-advancement
//! state machine spec.md §4.F calls for.
//!
//! The active interval (`num_active_epochs` leaves) is cut into
//! `SUBTREE_SIZE`-leaf subtrees. The roots of every subtree are fixed at
//! construction time (key_gen already touched every leaf once to commit
//! to the public root, so the roots come for free); what `advance` adds
//! or drops, depending on [`RetentionMode`], is the *full* per-leaf data
//! of one subtree at a time, which is what signing actually needs to
//! produce an auth path without re-deriving every chain from the PRF
//! key. A signature's full auth path is the signed epoch's subtree-local
//! path followed by the path through the small tree of subtree roots.

use alloc::vec::Vec;

use crate::constants::{HASH_LEN, PARAMETER_LEN};
use crate::error::XmssError;
use crate::field::F;
use crate::merkle::MerkleTree;
use crate::params::Parameters;

/// Leaves per materialised subtree. Fixed at `2^12`, a size the design
/// notes call an implementation choice: small enough that one subtree's
/// worth of leaf hashing fits comfortably in memory, large enough that
/// `advance` isn't called on every single signature at large lifetimes.
pub const SUBTREE_SIZE_LOG2: u32 = 12;
pub const SUBTREE_SIZE: u64 = 1 << SUBTREE_SIZE_LOG2;

/// Whether a full secret key retains every materialised subtree (for
/// O(log n) signing at any prepared epoch) or keeps only the most recent
/// one (minimal-memory signing, discarding old subtrees on advance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionMode {
    Full,
    Minimal,
}

fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        64 - (n - 1).leading_zeros()
    }
}

/// `Fresh -> Prepared[start,end) -> Advanced[start,end+W) -> ... ->
/// Exhausted[activation+num_active_epochs]`. The terminal state rejects
/// further advancement.
#[derive(Debug, Clone)]
pub struct PreparationState {
    activation_epoch: u64,
    num_active_epochs: u64,
    retention: RetentionMode,
    subtree_height: u32,
    num_subtrees: u32,
    /// Root of every subtree in the active interval, known from
    /// construction regardless of how many subtrees are actually
    /// materialised below.
    subtree_roots: Vec<[F; HASH_LEN]>,
    /// Full per-leaf data for a subtree, present only where advanced
    /// (and, in `Minimal` mode, only for the most recently advanced one).
    subtrees: Vec<Option<MerkleTree>>,
    next_to_advance: u32,
    exhausted: bool,
}

impl PreparationState {
    /// Height of the tree spanning exactly the active interval (ignoring
    /// any further bridge up to `lifetime_log2`).
    pub fn active_height(num_active_epochs: u64) -> u32 {
        ceil_log2(num_active_epochs)
    }

    pub(crate) fn subtree_layout(num_active_epochs: u64) -> (u32, u32) {
        let active_height = Self::active_height(num_active_epochs);
        let subtree_height = SUBTREE_SIZE_LOG2.min(active_height);
        let num_subtrees = 1u32 << (active_height - subtree_height);
        (subtree_height, num_subtrees)
    }

    /// `Fresh` state, constructed from the subtree roots computed once at
    /// key generation (see `signer::key_gen`).
    pub fn fresh(
        activation_epoch: u64,
        num_active_epochs: u64,
        retention: RetentionMode,
        subtree_roots: Vec<[F; HASH_LEN]>,
    ) -> Self {
        let (subtree_height, num_subtrees) = Self::subtree_layout(num_active_epochs);
        debug_assert_eq!(subtree_roots.len(), num_subtrees as usize);
        Self {
            activation_epoch,
            num_active_epochs,
            retention,
            subtree_height,
            num_subtrees,
            subtree_roots,
            subtrees: alloc::vec![None; num_subtrees as usize],
            next_to_advance: 0,
            exhausted: num_subtrees == 0,
        }
    }

    fn subtree_start(&self, index: u32) -> u64 {
        self.activation_epoch + index as u64 * (1u64 << self.subtree_height)
    }

    fn subtree_len(&self, index: u32) -> u64 {
        let start = self.subtree_start(index);
        let active_end = self.activation_epoch + self.num_active_epochs;
        (1u64 << self.subtree_height).min(active_end - start)
    }

    pub fn get_prepared_interval(&self) -> (u64, u64) {
        match self.retention {
            RetentionMode::Full => {
                let end = if self.next_to_advance == 0 {
                    self.activation_epoch
                } else {
                    self.subtree_start(self.next_to_advance - 1) + self.subtree_len(self.next_to_advance - 1)
                };
                (self.activation_epoch, end)
            }
            RetentionMode::Minimal => {
                if self.next_to_advance == 0 {
                    (self.activation_epoch, self.activation_epoch)
                } else {
                    let i = self.next_to_advance - 1;
                    (self.subtree_start(i), self.subtree_start(i) + self.subtree_len(i))
                }
            }
        }
    }

    fn index_for(&self, epoch: u64) -> Option<u32> {
        if epoch < self.activation_epoch || epoch >= self.activation_epoch + self.num_active_epochs {
            return None;
        }
        Some(((epoch - self.activation_epoch) >> self.subtree_height) as u32)
    }

    pub fn contains(&self, epoch: u64) -> bool {
        self.index_for(epoch)
            .map(|i| self.subtrees.get(i as usize).map(Option::is_some).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Materialise the next subtree and extend the window. `leaves`
    /// supplies the leaf hashes for the new subtree range (computed by
    /// the caller via [`crate::wots::epoch_leaf`]); its length must equal
    /// the subtree size actually materialised (the final subtree in the
    /// active range may be short).
    pub fn advance(&mut self, parameter: &[F; PARAMETER_LEN], params: &Parameters, leaves: &[[F; HASH_LEN]]) -> Result<(), XmssError> {
        if self.exhausted {
            return Err(XmssError::LifetimeExhausted {
                activation_epoch: self.activation_epoch,
                num_active_epochs: self.num_active_epochs,
            });
        }

        let index = self.next_to_advance;
        let expected_len = self.subtree_len(index);
        if leaves.len() as u64 != expected_len {
            return Err(XmssError::ParameterError {
                reason: alloc::format!("advance expected {} leaves, got {}", expected_len, leaves.len()),
            });
        }

        let start = self.subtree_start(index);
        let tree = MerkleTree::build_at(parameter, params.hash_variant, self.subtree_height, leaves, start, 0);
        if tree.root() != self.subtree_roots[index as usize] {
            return Err(XmssError::ParameterError {
                reason: alloc::format!("advanced subtree {} does not match the root fixed at key generation", index),
            });
        }

        match self.retention {
            RetentionMode::Full => self.subtrees[index as usize] = Some(tree),
            RetentionMode::Minimal => {
                for slot in self.subtrees.iter_mut() {
                    *slot = None;
                }
                self.subtrees[index as usize] = Some(tree);
            }
        }

        self.next_to_advance = index + 1;
        if self.next_to_advance == self.num_subtrees {
            self.exhausted = true;
        }
        Ok(())
    }

    /// The subtree covering `epoch`, and `epoch`'s index within it, if
    /// prepared.
    pub fn subtree_for(&self, epoch: u64) -> Option<(&MerkleTree, u32)> {
        let index = self.index_for(epoch)?;
        let tree = self.subtrees.get(index as usize)?.as_ref()?;
        let start = self.subtree_start(index);
        Some((tree, (epoch - start) as u32))
    }

    /// Root of the active interval: the single subtree root if the whole
    /// interval fits in one subtree, otherwise the root of the small
    /// upper tree built over every subtree's root (always known).
    pub fn active_root(&self, parameter: &[F; PARAMETER_LEN], variant: crate::params::HashVariant) -> [F; HASH_LEN] {
        if self.num_subtrees == 1 {
            self.subtree_roots[0]
        } else {
            let upper_height = self.num_subtrees.trailing_zeros();
            MerkleTree::build_at(parameter, variant, upper_height, &self.subtree_roots, 0, self.subtree_height).root()
        }
    }

    /// The `ℓ_active` siblings from `epoch`'s leaf up to [`Self::active_root`]:
    /// the subtree-local path followed by the path through the tree of
    /// subtree roots. `None` if `epoch`'s subtree isn't currently
    /// materialised.
    pub fn auth_path(&self, parameter: &[F; PARAMETER_LEN], variant: crate::params::HashVariant, epoch: u64) -> Option<Vec<[F; HASH_LEN]>> {
        let (tree, local_index) = self.subtree_for(epoch)?;
        let mut path = tree.auth_path(local_index);
        if self.num_subtrees > 1 {
            let subtree_index = self.index_for(epoch)?;
            let upper_height = self.num_subtrees.trailing_zeros();
            let upper = MerkleTree::build_at(parameter, variant, upper_height, &self.subtree_roots, 0, self.subtree_height);
            path.extend(upper.auth_path(subtree_index));
        }
        Some(path)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn num_subtrees(&self) -> u32 {
        self.num_subtrees
    }

    pub fn subtree_height(&self) -> u32 {
        self.subtree_height
    }

    pub fn retention(&self) -> RetentionMode {
        self.retention
    }

    /// Roots of every subtree in the active interval, fixed since
    /// construction — the state a serialized key needs to resume
    /// preparation without re-deriving them from the PRF key.
    pub fn subtree_roots(&self) -> &[[F; HASH_LEN]] {
        &self.subtree_roots
    }

    /// Index of the first not-yet-materialised subtree. In `Full`
    /// retention every subtree below this index is present in
    /// [`Self::materialized_subtree`]; in `Minimal` retention only the
    /// one at `next_to_advance - 1` (if any) is.
    pub fn next_to_advance(&self) -> u32 {
        self.next_to_advance
    }

    /// Full node table for the subtree at `index`, if it's currently
    /// materialised. What a `Full` secret key persists on the wire (see
    /// `wire.rs`) to avoid re-deriving a subtree's chains from the PRF
    /// key after loading.
    pub fn materialized_subtree(&self, index: u32) -> Option<&MerkleTree> {
        self.subtrees.get(index as usize)?.as_ref()
    }

    /// Reconstruct a `Full` state from a deserialized secret key: the
    /// subtree roots fixed at key generation (recomputed from the PRF key
    /// on load, since they're not themselves on the wire — see
    /// `wire.rs`), plus however many of the leading subtrees were
    /// persisted with their full per-leaf data. Each materialised
    /// subtree's root is checked against `subtree_roots` before being
    /// accepted, the same guarantee `advance` gives a freshly-materialised
    /// one.
    pub(crate) fn from_materialized(activation_epoch: u64, num_active_epochs: u64, subtree_roots: Vec<[F; HASH_LEN]>, materialized: Vec<MerkleTree>) -> Result<Self, XmssError> {
        let (subtree_height, num_subtrees) = Self::subtree_layout(num_active_epochs);
        if materialized.len() as u32 > num_subtrees {
            return Err(XmssError::Deserialization {
                reason: alloc::format!("{} materialised subtrees exceeds the {} the active interval holds", materialized.len(), num_subtrees),
            });
        }

        for (index, tree) in materialized.iter().enumerate() {
            if tree.root() != subtree_roots[index] {
                return Err(XmssError::Deserialization {
                    reason: alloc::format!("materialised subtree {index} does not match its root fixed at key generation"),
                });
            }
        }

        let next_to_advance = materialized.len() as u32;
        let mut subtrees = alloc::vec![None; num_subtrees as usize];
        for (index, tree) in materialized.into_iter().enumerate() {
            subtrees[index] = Some(tree);
        }

        Ok(Self {
            activation_epoch,
            num_active_epochs,
            retention: RetentionMode::Full,
            subtree_height,
            num_subtrees,
            subtree_roots,
            subtrees,
            next_to_advance,
            exhausted: next_to_advance == num_subtrees,
        })
    }
}

/// Root of every subtree in `[activation_epoch, activation_epoch +
/// num_active_epochs)`, computed once by walking every chain in the
/// active interval via [`crate::wots::epoch_leaf`]. This is the one-time,
/// `O(num_active_epochs)` cost `key_gen` pays to fix a root over the
/// whole active interval; everything [`PreparationState::advance`] does
/// afterward only re-derives the full per-leaf data of one subtree at a
/// time, which this function's output lets it check against.
pub fn compute_subtree_roots(parameter: &[F; PARAMETER_LEN], params: &Parameters, k: &[u8; 32], activation_epoch: u64, num_active_epochs: u64) -> Vec<[F; HASH_LEN]> {
    let (subtree_height, num_subtrees) = PreparationState::subtree_layout(num_active_epochs);
    let subtree_size = 1u64 << subtree_height;
    let indices: Vec<u32> = (0..num_subtrees).collect();
    crate::workers::map_chunks(&indices, |&i| {
        let start = activation_epoch + i as u64 * subtree_size;
        let len = subtree_size.min(activation_epoch + num_active_epochs - start);
        let leaves: Vec<_> = (0..len).map(|j| crate::wots::epoch_leaf(parameter, params, k, start + j)).collect();
        MerkleTree::build_at(parameter, params.hash_variant, subtree_height, &leaves, start, 0).root()
    })
}

/// Combine subtree roots into the root of the active interval alone (no
/// further bridge up to `lifetime_log2`). `subtree_height` is the level
/// each subtree root sits at in the global tree's numbering.
pub fn combine_subtree_roots(parameter: &[F; PARAMETER_LEN], variant: crate::params::HashVariant, subtree_height: u32, subtree_roots: &[[F; HASH_LEN]]) -> [F; HASH_LEN] {
    if subtree_roots.len() == 1 {
        subtree_roots[0]
    } else {
        let upper_height = (subtree_roots.len() as u32).trailing_zeros();
        MerkleTree::build_at(parameter, variant, upper_height, subtree_roots, 0, subtree_height).root()
    }
}
