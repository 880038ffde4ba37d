//! Tweakable hash function: domain-separated Poseidon2 compression/sponge.
//!
//! Three of the four tweak kinds below mirror the reference's chain/tree
//! separators; `Msg` and `Leaf` are this crate's generalisation of the
//! reference's inline, per-call tweak construction (`build_message_tweak`
//! in the reference encoder, and an implicit epoch-absorption during leaf
//! compression) into the same `Tweak` enum used everywhere else.

use alloc::vec::Vec;

use crate::constants::{HASH_LEN, PARAMETER_LEN, TWEAK_LEN};
use crate::field::F;
use crate::params::HashVariant;
use crate::poseidon::{
    poseidon2_16, poseidon2_24, poseidon_compress, poseidon_safe_domain_separator, poseidon_sponge,
    CHAIN_COMPRESSION_WIDTH, MERGE_COMPRESSION_WIDTH,
};
use p3_field::PrimeField64;

/// Tweak separators, one per hash use, for domain separation within a
/// single Poseidon2 instantiation.
const TWEAK_SEPARATOR_FOR_CHAIN_HASH: u8 = 0x00;
const TWEAK_SEPARATOR_FOR_TREE_HASH: u8 = 0x01;
const TWEAK_SEPARATOR_FOR_MESSAGE_HASH: u8 = 0x02;
const TWEAK_SEPARATOR_FOR_LEAF_HASH: u8 = 0x03;

/// Domain-separation tweak for the four hash contexts in the scheme.
#[derive(Debug, Clone, Copy)]
pub enum Tweak {
    /// Merkle tree internal node: `(level, position within level)`.
    Tree { level: u8, pos_in_level: u32 },
    /// W-OTS chain step: `(epoch, chain index, position within chain)`.
    Chain {
        epoch: u32,
        chain_index: u8,
        pos_in_chain: u8,
    },
    /// Message-to-encoding hash: `epoch` only (rho/message/parameter are
    /// absorbed as the sponge payload, not folded into the tweak).
    Msg { epoch: u32 },
    /// Leaf compression of a one-time public key: `epoch` only.
    Leaf { epoch: u32 },
}

impl Tweak {
    pub fn tree_tweak(level: u8, pos_in_level: u32) -> Self {
        Self::Tree { level, pos_in_level }
    }

    pub fn chain_tweak(epoch: u32, chain_index: u8, pos_in_chain: u8) -> Self {
        Self::Chain {
            epoch,
            chain_index,
            pos_in_chain,
        }
    }

    pub fn msg_tweak(epoch: u32) -> Self {
        Self::Msg { epoch }
    }

    pub fn leaf_tweak(epoch: u32) -> Self {
        Self::Leaf { epoch }
    }

    /// Pack the tweak into a single big integer, then decompose base-p.
    pub fn to_field_elements(&self) -> [F; TWEAK_LEN] {
        let acc: u128 = match self {
            Self::Tree { level, pos_in_level } => {
                ((*level as u128) << 40)
                    | ((*pos_in_level as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_TREE_HASH as u128)
            }
            Self::Chain {
                epoch,
                chain_index,
                pos_in_chain,
            } => {
                ((*epoch as u128) << 24)
                    | ((*chain_index as u128) << 16)
                    | ((*pos_in_chain as u128) << 8)
                    | (TWEAK_SEPARATOR_FOR_CHAIN_HASH as u128)
            }
            Self::Msg { epoch } => ((*epoch as u128) << 8) | (TWEAK_SEPARATOR_FOR_MESSAGE_HASH as u128),
            Self::Leaf { epoch } => ((*epoch as u128) << 8) | (TWEAK_SEPARATOR_FOR_LEAF_HASH as u128),
        };

        let mut val = acc;
        let p = F::ORDER_U64 as u128;
        core::array::from_fn(|_| {
            let digit = (val % p) as u64;
            val /= p;
            F::from_u64(digit)
        })
    }
}

/// Apply the tweakable hash to `parameter`, `tweak`, and a variable number
/// of hash-sized messages. One message uses width-16 compression, two use
/// width-24 compression, more than two use a width-16 or width-24 sponge
/// (per `variant`).
pub fn apply(parameter: &[F; PARAMETER_LEN], tweak: &Tweak, messages: &[[F; HASH_LEN]], variant: HashVariant) -> [F; HASH_LEN] {
    let tweak_fe = tweak.to_field_elements();

    match messages.len() {
        1 => {
            let perm = poseidon2_16();
            let combined: Vec<F> = parameter
                .iter()
                .chain(tweak_fe.iter())
                .chain(messages[0].iter())
                .copied()
                .collect();
            poseidon_compress::<F, _, CHAIN_COMPRESSION_WIDTH, HASH_LEN>(&perm, &combined)
        }
        2 => {
            let perm = poseidon2_24();
            let combined: Vec<F> = parameter
                .iter()
                .chain(tweak_fe.iter())
                .chain(messages[0].iter())
                .chain(messages[1].iter())
                .copied()
                .collect();
            poseidon_compress::<F, _, MERGE_COMPRESSION_WIDTH, HASH_LEN>(&perm, &combined)
        }
        n => {
            let combined: Vec<F> = parameter
                .iter()
                .chain(tweak_fe.iter())
                .chain(messages.iter().flat_map(|m| m.iter()))
                .copied()
                .collect();
            let lengths: [u32; 4] = [PARAMETER_LEN as u32, TWEAK_LEN as u32, n as u32, HASH_LEN as u32];

            match variant {
                HashVariant::Poseidon2W16 => {
                    let perm = poseidon2_16();
                    let cap = poseidon_safe_domain_separator::<CHAIN_COMPRESSION_WIDTH, HASH_LEN>(&perm, &lengths);
                    poseidon_sponge::<CHAIN_COMPRESSION_WIDTH, HASH_LEN>(&perm, &cap, &combined)
                }
                HashVariant::Poseidon2W24 => {
                    let perm = poseidon2_24();
                    let cap = poseidon_safe_domain_separator::<MERGE_COMPRESSION_WIDTH, HASH_LEN>(&perm, &lengths);
                    poseidon_sponge::<MERGE_COMPRESSION_WIDTH, HASH_LEN>(&perm, &cap, &combined)
                }
            }
        }
    }
}

/// Hash an arbitrary-length field-element payload down to `MSG_HASH_LEN`
/// elements for the message encoder, using the width-24 sponge tagged with
/// [`Tweak::Msg`]. Kept distinct from [`apply`] because the encoder's
/// payload (parameter, rho, tweak, message-as-field-elements) is not
/// itself a list of hash-sized chunks.
pub fn hash_message<const OUT_LEN: usize>(
    parameter: &[F; PARAMETER_LEN],
    tweak: &Tweak,
    payload: &[F],
) -> [F; OUT_LEN] {
    let tweak_fe = tweak.to_field_elements();
    let combined: Vec<F> = parameter.iter().chain(tweak_fe.iter()).chain(payload.iter()).copied().collect();

    let perm = poseidon2_24();
    let lengths: [u32; 4] = [
        PARAMETER_LEN as u32,
        TWEAK_LEN as u32,
        payload.len() as u32,
        OUT_LEN as u32,
    ];
    let cap = poseidon_safe_domain_separator::<MERGE_COMPRESSION_WIDTH, OUT_LEN>(&perm, &lengths);
    poseidon_sponge::<MERGE_COMPRESSION_WIDTH, OUT_LEN>(&perm, &cap, &combined)
}
