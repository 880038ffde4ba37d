//! Field element type and fixed-width field-element arrays.
//!
//! `F` is the KoalaBear prime field (p = 2^31 - 2^24 + 1), taken verbatim
//! from `p3-koala-bear` so that the Poseidon2 round constants and MDS
//! matrices match the reference bit-for-bit.

use p3_field::PrimeCharacteristicRing;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use p3_field::{Field, PrimeField32, PrimeField64};
pub use p3_koala_bear::KoalaBear;

/// The prime field element type used throughout the scheme.
pub type F = KoalaBear;

/// Message length in bytes for signed messages.
pub const MESSAGE_LENGTH: usize = 32;

/// A fixed-width tuple of field elements, used for hash outputs and
/// tweakable-hash parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldArray<const N: usize>(pub [F; N]);

impl<const N: usize> FieldArray<N> {
    pub const fn new(arr: [F; N]) -> Self {
        Self(arr)
    }

    pub const fn inner(&self) -> &[F; N] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut F> {
        self.0.iter_mut()
    }
}

impl<const N: usize> Default for FieldArray<N> {
    fn default() -> Self {
        Self([F::ZERO; N])
    }
}

impl<const N: usize> AsRef<[F]> for FieldArray<N> {
    fn as_ref(&self) -> &[F] {
        &self.0
    }
}

impl<const N: usize> From<[F; N]> for FieldArray<N> {
    fn from(arr: [F; N]) -> Self {
        Self(arr)
    }
}

impl<const N: usize> Serialize for FieldArray<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut seq = serializer.serialize_tuple(N)?;
        for elem in &self.0 {
            seq.serialize_element(&elem.as_canonical_u32())?;
        }
        seq.end()
    }
}

impl<'de, const N: usize> Deserialize<'de> for FieldArray<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use alloc::vec::Vec;
        use serde::de::Error;

        let values: Vec<u32> = Vec::deserialize(deserializer)?;
        if values.len() != N {
            return Err(D::Error::custom(alloc::format!(
                "expected {} field elements, got {}",
                N,
                values.len()
            )));
        }

        let mut arr = [F::ZERO; N];
        for (i, &val) in values.iter().enumerate() {
            arr[i] = F::new(val);
        }
        Ok(FieldArray(arr))
    }
}
