//! Scheme-wide width constants.
//!
//! These widths are fixed by the choice of Poseidon2 instantiation, not by
//! the per-keypair [`crate::params::Parameters`] (lifetime, chain length,
//! number of chains, encoding) which vary per key. Varying these constants
//! would require different compile-time array sizes throughout the crate;
//! the reference implementation holds them fixed too.

/// Hash output length in field elements.
pub const HASH_LEN: usize = 7;

/// Tweakable-hash public parameter length in field elements.
pub const PARAMETER_LEN: usize = 5;

/// Encoding randomness (rho) length in field elements.
pub const RANDOMNESS_LEN: usize = 6;

/// Tweak length in field elements.
pub const TWEAK_LEN: usize = 2;

/// Message-hash output length in field elements (feeds the encoder).
pub const MSG_HASH_LEN: usize = 5;

/// Message-as-field-elements length used as sponge input.
pub const MSG_LEN_FE: usize = 9;
