//! Byte-exact wire serialization for [`PublicKey`], [`SecretKey`], and
//! [`Signature`].
//!
//! Every field element is packed as 4 little-endian bytes of its
//! canonical `u32` representative — KoalaBear's modulus is just under
//! `2^31`, so this is the tight encoding rather than the PRF layer's
//! 16-bytes-per-element convention (see `prf.rs`). Manual byte layout
//! rather than a `serde`/`postcard` derive, matching how `risc0/.../
//! types.rs` keeps its `Hash`/`Parameter` newtypes serde-derived for
//! structural (de)serialization but leaves the actual on-wire byte
//! layout of a full key or signature to an explicit format, since the
//! layout here (variable-length vectors, a parameter-set tag gating
//! which fixed-size fields follow) isn't expressible as a derive.

use alloc::vec::Vec;

use crate::constants::HASH_LEN;
use crate::error::XmssError;
use crate::field::F;
use crate::keys::{PublicKey, SecretKey};
use crate::merkle::MerkleTree;
use crate::params::ParameterSet;
use crate::preparation::{PreparationState, RetentionMode};
use crate::signature::Signature;
use p3_field::{PrimeCharacteristicRing, PrimeField32};

const FIELD_BYTES: usize = 4;

fn write_field(buf: &mut Vec<u8>, f: F) {
    buf.extend_from_slice(&f.as_canonical_u32().to_le_bytes());
}

fn write_field_array<const N: usize>(buf: &mut Vec<u8>, arr: &[F; N]) {
    for &f in arr {
        write_field(buf, f);
    }
}

fn read_field(bytes: &[u8], cursor: &mut usize) -> Result<F, XmssError> {
    let slice = bytes.get(*cursor..*cursor + FIELD_BYTES).ok_or_else(too_short)?;
    let mut raw = [0u8; FIELD_BYTES];
    raw.copy_from_slice(slice);
    *cursor += FIELD_BYTES;
    Ok(F::new(u32::from_le_bytes(raw)))
}

fn read_field_array<const N: usize>(bytes: &[u8], cursor: &mut usize) -> Result<[F; N], XmssError> {
    let mut out = [F::ZERO; N];
    for slot in out.iter_mut() {
        *slot = read_field(bytes, cursor)?;
    }
    Ok(out)
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, XmssError> {
    let slice = bytes.get(*cursor..*cursor + 4).ok_or_else(too_short)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(slice);
    *cursor += 4;
    Ok(u32::from_le_bytes(raw))
}

fn read_u64(bytes: &[u8], cursor: &mut usize) -> Result<u64, XmssError> {
    let slice = bytes.get(*cursor..*cursor + 8).ok_or_else(too_short)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(slice);
    *cursor += 8;
    Ok(u64::from_le_bytes(raw))
}

fn read_byte(bytes: &[u8], cursor: &mut usize) -> Result<u8, XmssError> {
    let b = *bytes.get(*cursor).ok_or_else(too_short)?;
    *cursor += 1;
    Ok(b)
}

fn too_short() -> XmssError {
    XmssError::Deserialization {
        reason: "input truncated".into(),
    }
}

impl PublicKey {
    /// `root (HASH_LEN field elements) || parameter_set tag (1 byte)`.
    ///
    /// The tweakable-hash parameter itself never touches the wire: every
    /// key under a given `ParameterSet` shares the same one (see
    /// `ParameterSet::tweak_parameter`), so a loader reconstructs it from
    /// the tag instead of carrying a redundant copy.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HASH_LEN * FIELD_BYTES + 1);
        write_field_array(&mut buf, &self.root);
        buf.push(self.parameter_set.tag());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmssError> {
        let mut cursor = 0;
        let root = read_field_array(bytes, &mut cursor)?;
        let parameter_set = ParameterSet::from_tag(read_byte(bytes, &mut cursor)?)?;
        let parameter = parameter_set.tweak_parameter();
        Ok(Self { root, parameter, parameter_set })
    }
}

impl Signature {
    /// `epoch (u64 LE) || auth_path_len (u32 LE) || auth_path ||
    /// rho (RANDOMNESS_LEN field elements) || hashes_len (u32 LE) ||
    /// hashes (chain_outputs)`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.epoch.to_le_bytes());
        buf.extend_from_slice(&(self.auth_path.len() as u32).to_le_bytes());
        for h in &self.auth_path {
            write_field_array(&mut buf, h);
        }
        write_field_array(&mut buf, &self.rho);
        buf.extend_from_slice(&(self.chain_outputs.len() as u32).to_le_bytes());
        for h in &self.chain_outputs {
            write_field_array(&mut buf, h);
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmssError> {
        let mut cursor = 0;
        let epoch = read_u64(bytes, &mut cursor)?;

        let path_len = read_u32(bytes, &mut cursor)? as usize;
        let mut auth_path = Vec::with_capacity(path_len);
        for _ in 0..path_len {
            auth_path.push(read_field_array::<HASH_LEN>(bytes, &mut cursor)?);
        }

        let rho = read_field_array(bytes, &mut cursor)?;

        let chain_len = read_u32(bytes, &mut cursor)? as usize;
        let mut chain_outputs = Vec::with_capacity(chain_len);
        for _ in 0..chain_len {
            chain_outputs.push(read_field_array::<HASH_LEN>(bytes, &mut cursor)?);
        }

        Ok(Self { epoch, rho, chain_outputs, auth_path })
    }
}

impl SecretKey {
    /// `prf_key(32) || activation_epoch (u64 LE) || num_active_epochs (u64
    /// LE) || parameter_set tag (1 byte)`, followed — for a `Full` key
    /// only — by `next_to_advance (u32 LE)` and that many materialised
    /// subtrees' full node tables (every level, leaves first, widest level
    /// first). A `Minimal` key's bytes end at the tag.
    ///
    /// The two forms aren't told apart by an extra tag: spec.md §6 gives
    /// Full a `tree_nodes` field and Minimal none, so a loader treats any
    /// bytes remaining after the parameter tag as that section and their
    /// absence as Minimal.
    ///
    /// Neither form carries `subtree_roots` or the raw `parameter`: both
    /// are recomputed on load — `parameter` from the tag via
    /// `ParameterSet::tweak_parameter`, `subtree_roots` via
    /// `preparation::compute_subtree_roots`, the same `O(num_active_epochs)`
    /// walk `key_gen` already pays for. For subtrees a `Full` key already
    /// has node data for, this repeats PRF-chain work for nothing beyond
    /// reproducing the root — a disclosed inefficiency (see DESIGN.md)
    /// rather than inventing an extra wire field spec.md §6 doesn't
    /// define.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.prf_key);
        buf.extend_from_slice(&self.activation_epoch.to_le_bytes());
        buf.extend_from_slice(&self.num_active_epochs.to_le_bytes());
        buf.push(self.parameter_set.tag());

        if self.retention() == RetentionMode::Full {
            let next_to_advance = self.prepared.next_to_advance();
            buf.extend_from_slice(&next_to_advance.to_le_bytes());
            for index in 0..next_to_advance {
                let tree = self
                    .prepared
                    .materialized_subtree(index)
                    .expect("Full retention keeps every subtree below next_to_advance materialised");
                for level in tree.nodes() {
                    for node in level {
                        write_field_array(&mut buf, node);
                    }
                }
            }
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmssError> {
        let mut cursor = 0;
        let mut prf_key = [0u8; 32];
        prf_key.copy_from_slice(bytes.get(cursor..cursor + 32).ok_or_else(too_short)?);
        cursor += 32;

        let activation_epoch = read_u64(bytes, &mut cursor)?;
        let num_active_epochs = read_u64(bytes, &mut cursor)?;
        let parameter_set = ParameterSet::from_tag(read_byte(bytes, &mut cursor)?)?;
        let parameter = parameter_set.tweak_parameter();
        let params = parameter_set.to_parameters();

        let subtree_roots = crate::preparation::compute_subtree_roots(&parameter, &params, &prf_key, activation_epoch, num_active_epochs);

        let prepared = if cursor == bytes.len() {
            PreparationState::fresh(activation_epoch, num_active_epochs, RetentionMode::Minimal, subtree_roots)
        } else {
            let next_to_advance = read_u32(bytes, &mut cursor)?;
            let (subtree_height, _) = PreparationState::subtree_layout(num_active_epochs);

            let mut materialized = Vec::with_capacity(next_to_advance as usize);
            for _ in 0..next_to_advance {
                let mut levels = Vec::with_capacity(subtree_height as usize + 1);
                let mut width = 1usize << subtree_height;
                for _ in 0..=subtree_height {
                    let mut level = Vec::with_capacity(width);
                    for _ in 0..width {
                        level.push(read_field_array::<HASH_LEN>(bytes, &mut cursor)?);
                    }
                    levels.push(level);
                    width /= 2;
                }
                materialized.push(MerkleTree::from_nodes(subtree_height, levels));
            }

            PreparationState::from_materialized(activation_epoch, num_active_epochs, subtree_roots, materialized)?
        };

        Ok(SecretKey::from_prepared(prf_key, activation_epoch, num_active_epochs, parameter, parameter_set, prepared))
    }
}
