//! PRF-based secret derivation: chain heads and signature randomness.
//!
//! No example in the pack implements key generation (every leanSig variant
//! is a verify-only zkVM guest), so this module is new, grounded on the
//! `sha3::Shake128` usage pattern in `zisk-leanSig/leansig-minimal/src/
//! encoding.rs::generate_chunks` (domain tag byte, `Update::update` calls,
//! `finalize_xof` + `XofReader::read`).

use p3_field::{PrimeCharacteristicRing, PrimeField64};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake128;

use crate::constants::{HASH_LEN, RANDOMNESS_LEN};
use crate::field::F;

const PRF_DOMAIN_CHAIN_HEAD: u8 = 0x10;
const PRF_DOMAIN_RHO: u8 = 0x11;
const PRF_DOMAIN_TWEAK_PARAMETER: u8 = 0x12;

/// 16 bytes per field element, little-endian, reduced mod p. Preserved
/// verbatim as a cross-implementation compatibility fixture even though
/// 4 bytes would information-theoretically suffice.
fn bytes_to_field_elements<const N: usize>(bytes: &[u8]) -> [F; N] {
    debug_assert_eq!(bytes.len(), N * 16);
    core::array::from_fn(|i| {
        let window = &bytes[i * 16..(i + 1) * 16];
        let mut buf = [0u8; 16];
        buf.copy_from_slice(window);
        let v = u128::from_le_bytes(buf);
        F::from_u64((v % (F::ORDER_U64 as u128)) as u64)
    })
}

/// Derive the W-OTS chain head for `(K, epoch, chain_index)`. Pure function
/// of its inputs.
pub fn prf_chain_head(k: &[u8; 32], epoch: u64, chain_index: u32) -> [F; HASH_LEN] {
    let mut hasher = Shake128::default();
    hasher.update(&[PRF_DOMAIN_CHAIN_HEAD]);
    hasher.update(k);
    hasher.update(&epoch.to_le_bytes());
    hasher.update(&chain_index.to_le_bytes());

    let mut reader = hasher.finalize_xof();
    let mut out = alloc::vec![0u8; HASH_LEN * 16];
    reader.read(&mut out);
    bytes_to_field_elements::<HASH_LEN>(&out)
}

/// Derive signature randomness `rho` for `(K, epoch, message, counter)`.
/// `counter` is incremented by the target-sum rejection sampler and is
/// always `0` for Winternitz-w encoding, which makes the Winternitz path a
/// pure function of `(K, epoch, message)`.
pub fn prf_rho(k: &[u8; 32], epoch: u64, message: &[u8], counter: u32) -> [F; RANDOMNESS_LEN] {
    let mut hasher = Shake128::default();
    hasher.update(&[PRF_DOMAIN_RHO]);
    hasher.update(k);
    hasher.update(&epoch.to_le_bytes());
    hasher.update(message);
    hasher.update(&counter.to_le_bytes());

    let mut reader = hasher.finalize_xof();
    let mut out = alloc::vec![0u8; RANDOMNESS_LEN * 16];
    reader.read(&mut out);
    bytes_to_field_elements::<RANDOMNESS_LEN>(&out)
}

/// The fixed tweakable-hash parameter for a `ParameterSet` tag, expanded
/// the same way a chain head or `rho` is — a public, non-secret value
/// derived from the tag alone so every keypair under that variant shares
/// it and a deserialized `PublicKey` can reconstruct it without the
/// parameter ever touching the wire (see `wire.rs`).
pub fn derive_tweak_parameter<const N: usize>(parameter_set_tag: u8) -> [F; N] {
    let mut hasher = Shake128::default();
    hasher.update(&[PRF_DOMAIN_TWEAK_PARAMETER]);
    hasher.update(&[parameter_set_tag]);

    let mut reader = hasher.finalize_xof();
    let mut out = alloc::vec![0u8; N * 16];
    reader.read(&mut out);
    bytes_to_field_elements::<N>(&out)
}
