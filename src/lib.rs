//! Generalized XMSS: hash-based, stateful, epoch-indexed signatures over
//! the KoalaBear field with a Poseidon2 tweakable hash.
//!
//! `no_std` by default (`alloc` required); the `std` feature pulls in
//! `tracing` instrumentation and `std`-backed `serde`/`thiserror`. The
//! `parallel` feature fans subtree-root computation out across `rayon`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod constants;
pub mod encoding;
pub mod error;
pub mod field;
pub mod keys;
pub mod merkle;
pub mod params;
pub mod poseidon;
pub mod prf;
pub mod preparation;
pub mod signature;
pub mod signer;
pub mod tweak;
pub mod wire;
pub mod workers;
pub mod wots;

pub use constants::{HASH_LEN, MSG_HASH_LEN, MSG_LEN_FE, PARAMETER_LEN, RANDOMNESS_LEN, TWEAK_LEN};
pub use error::XmssError;
pub use field::{FieldArray, F, MESSAGE_LENGTH};
pub use keys::{PublicKey, SecretKey};
pub use params::{Encoding, HashVariant, ParameterSet, Parameters};
pub use preparation::{PreparationState, RetentionMode, SUBTREE_SIZE, SUBTREE_SIZE_LOG2};
pub use signature::Signature;
pub use signer::{key_gen, sign, verify};
