//! Merkle tree: full materialisation, authentication-path extraction, and
//! standalone path verification.
//!
//! The folding logic (`verify_path`) is grounded on
//! `risc0/.../verify.rs::verify_merkle_path`, kept essentially as-is.
//! Construction (`MerkleTree::build`) is new: it reuses the exact same
//! `Tweak::tree_tweak(level, pos)` + `apply()` calls as verification, so
//! the two are provably consistent — recomputing the path from a built
//! tree is the same operation as folding it during verification.

use alloc::vec;
use alloc::vec::Vec;

use crate::constants::{HASH_LEN, PARAMETER_LEN};
use crate::field::F;
use crate::params::HashVariant;
use crate::tweak::{apply, Tweak};

/// A fully materialised binary tree of height `height` over `2^height`
/// leaves. `nodes[level]` holds `2^(height - level)` hashes, with
/// `nodes[0]` the leaves and `nodes[height]` the single root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    height: u32,
    nodes: Vec<Vec<[F; HASH_LEN]>>,
}

impl MerkleTree {
    /// Build the full tree from `leaves`. Leaves beyond `leaves.len()` up
    /// to `2^height` are filled with the deterministic placeholder
    /// `apply(parameter, Tweak::tree_tweak(0, index), &[[F::ZERO; HASH_LEN]])`.
    pub fn build(parameter: &[F; PARAMETER_LEN], variant: HashVariant, height: u32, leaves: &[[F; HASH_LEN]]) -> Self {
        Self::build_at(parameter, variant, height, leaves, 0, 0)
    }

    /// Build a tree that forms part of a larger tree: `leaf_offset` is
    /// this tree's first leaf's absolute index in the larger tree, and
    /// `level_offset` is the larger tree's level number at this tree's
    /// own level 0. Used by the preparation engine to assemble a subtree,
    /// the tree of subtree roots, and the bridge above the active
    /// interval as pieces of one globally-addressed tree, so that a path
    /// recomputed by [`verify_path`] from the true epoch position folds
    /// identically regardless of which piece produced each sibling.
    pub fn build_at(parameter: &[F; PARAMETER_LEN], variant: HashVariant, height: u32, leaves: &[[F; HASH_LEN]], leaf_offset: u64, level_offset: u32) -> Self {
        let width = 1usize << height;
        debug_assert!(leaves.len() <= width);

        let mut level0 = Vec::with_capacity(width);
        for i in 0..width {
            if i < leaves.len() {
                level0.push(leaves[i]);
            } else {
                level0.push(placeholder_leaf(parameter, level_offset, (leaf_offset + i as u64) as u32));
            }
        }

        let mut nodes = vec![level0];
        for level in 1..=height {
            let prev = &nodes[(level - 1) as usize];
            let mut next = Vec::with_capacity(prev.len() / 2);
            let base_pos = leaf_offset >> level;
            for (pos, pair) in prev.chunks_exact(2).enumerate() {
                let tweak = Tweak::tree_tweak((level_offset + level) as u8, base_pos as u32 + pos as u32);
                next.push(apply(parameter, &tweak, &[pair[0], pair[1]], variant));
            }
            nodes.push(next);
        }

        Self { height, nodes }
    }

    pub fn root(&self) -> [F; HASH_LEN] {
        self.nodes[self.height as usize][0]
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn leaf(&self, index: u32) -> [F; HASH_LEN] {
        self.nodes[0][index as usize]
    }

    /// Every level's node table, leaves first. What a `Full` secret key
    /// persists for an already-materialised subtree, to skip re-deriving
    /// its chains from the PRF key after loading (see `wire.rs`).
    pub(crate) fn nodes(&self) -> &[Vec<[F; HASH_LEN]>] {
        &self.nodes
    }

    /// Reconstruct a tree directly from a previously-persisted node
    /// table, skipping the hashing `build_at` does. Trusts the caller
    /// that `nodes` is internally consistent;
    /// `PreparationState::from_materialized` re-checks the root against
    /// the value fixed at key generation before accepting it.
    pub(crate) fn from_nodes(height: u32, nodes: Vec<Vec<[F; HASH_LEN]>>) -> Self {
        Self { height, nodes }
    }

    /// The `height` sibling nodes from `leaf(index)` up to the root.
    pub fn auth_path(&self, index: u32) -> Vec<[F; HASH_LEN]> {
        let mut path = Vec::with_capacity(self.height as usize);
        let mut idx = index as usize;
        for level in 0..self.height as usize {
            let sibling_idx = idx ^ 1;
            path.push(self.nodes[level][sibling_idx]);
            idx >>= 1;
        }
        path
    }
}

/// Deterministic placeholder for a leaf position with no materialised
/// one-time keypair: the tree hash of an all-zero tweak input, tagged at
/// `level` (this piece's own absolute level in the larger tree it's part
/// of — see `build_at`), so `public_key.root` still commits to the whole
/// epoch space even when `num_active_epochs < 2^height`. Tagging by the
/// piece's true global level, not a hardcoded `0`, keeps a placeholder
/// filled in at one level (e.g. an absent subtree root in the upper tree,
/// or an absent active root in the bridge tree above a partial activation
/// window) from colliding in domain tag with a genuine level-0 leaf
/// placeholder elsewhere in the tree.
fn placeholder_leaf(parameter: &[F; PARAMETER_LEN], level: u32, index: u32) -> [F; HASH_LEN] {
    let tweak = Tweak::tree_tweak(level as u8, index);
    apply(parameter, &tweak, &[[F::ZERO; HASH_LEN]], HashVariant::Poseidon2W16)
}

/// Fold a leaf and its authentication path up to a candidate root,
/// choosing left/right at each level by bit `level` of `position`.
pub fn verify_path(
    parameter: &[F; PARAMETER_LEN],
    variant: HashVariant,
    root: &[F; HASH_LEN],
    position: u32,
    leaf: [F; HASH_LEN],
    path: &[[F; HASH_LEN]],
) -> bool {
    let mut current = leaf;
    let mut idx = position;

    for (level, sibling) in path.iter().enumerate() {
        let children = if idx & 1 == 0 {
            [current, *sibling]
        } else {
            [*sibling, current]
        };
        idx >>= 1;

        let tweak = Tweak::tree_tweak(level as u8 + 1, idx);
        current = apply(parameter, &tweak, &children, variant);
    }

    current == *root
}

use p3_field::PrimeCharacteristicRing;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_tree_auth_path_verifies() {
        let parameter = [F::ZERO; PARAMETER_LEN];
        let variant = HashVariant::Poseidon2W16;
        let height = 4;
        let leaves: Vec<[F; HASH_LEN]> = (0..(1u32 << height))
            .map(|i| {
                let tweak = Tweak::leaf_tweak(i);
                apply(&parameter, &tweak, &[[F::from_u64(i as u64); HASH_LEN]], variant)
            })
            .collect();

        let tree = MerkleTree::build(&parameter, variant, height, &leaves);
        for index in [0u32, 1, 7, 15] {
            let path = tree.auth_path(index);
            assert_eq!(path.len(), height as usize);
            assert!(verify_path(&parameter, variant, &tree.root(), index, tree.leaf(index), &path));
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let parameter = [F::ZERO; PARAMETER_LEN];
        let variant = HashVariant::Poseidon2W16;
        let height = 3;
        let leaves: Vec<[F; HASH_LEN]> = (0..(1u32 << height)).map(|i| [F::from_u64(i as u64 + 1); HASH_LEN]).collect();
        let tree = MerkleTree::build(&parameter, variant, height, &leaves);

        let path = tree.auth_path(2);
        let wrong_leaf = [F::from_u64(999); HASH_LEN];
        assert!(!verify_path(&parameter, variant, &tree.root(), 2, wrong_leaf, &path));
    }
}
