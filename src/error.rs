//! Crate-wide error type.
//!
//! Shaped after OpenVM-XMSS's `WrapperError` (`xmss/error.rs`): one
//! `thiserror`-derived enum covering every failure kind, `no_std`-friendly,
//! with owned `alloc::string::String` payloads instead of `&'static str`
//! where the message is built from runtime values.

use alloc::string::String;

#[derive(Debug, Clone, thiserror::Error)]
pub enum XmssError {
    #[error("parameter mismatch: {reason}")]
    ParameterMismatch { reason: String },

    #[error("parameter error: {reason}")]
    ParameterError { reason: String },

    #[error("epoch {epoch} out of range [{activation_epoch}, {end_epoch})")]
    EpochOutOfRange {
        epoch: u64,
        activation_epoch: u64,
        end_epoch: u64,
    },

    #[error("epoch {epoch} exceeds lifetime 2^{lifetime_log2}")]
    EpochTooLarge { epoch: u64, lifetime_log2: u32 },

    #[error("epoch {epoch} not in prepared window [{window_start}, {window_end})")]
    EpochNotPrepared {
        epoch: u64,
        window_start: u64,
        window_end: u64,
    },

    #[error("preparation window exhausted at {activation_epoch} + {num_active_epochs}")]
    LifetimeExhausted {
        activation_epoch: u64,
        num_active_epochs: u64,
    },

    #[error("target-sum encoding rejected after {tries} tries")]
    EncodingRejected { tries: u32 },

    #[error("deserialization failed: {reason}")]
    Deserialization { reason: String },
}
