//! Worker-pool abstraction: "map chunks in parallel, preserve order."
//!
//! Sequential by default; under the `parallel` feature, fans out over
//! `rayon`'s global thread pool. Several pack repos (pqstrate-Plonky3,
//! Steake-BitCell) reach for `rayon` for exactly this data-parallel shape,
//! which is why it's the crate's parallelism dependency rather than a
//! hand-rolled thread pool. Message-passing style: no shared-mutable state
//! crosses between workers, each closure owns its input and returns its
//! output by value.

/// Apply `f` to every element of `items`, preserving order. Sequential
/// under the default feature set.
#[cfg(not(feature = "parallel"))]
pub fn map_chunks<T, R, F>(items: &[T], f: F) -> alloc::vec::Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    items.iter().map(|item| f(item)).collect()
}

/// Apply `f` to every element of `items`, preserving order, fanned out
/// across `rayon`'s thread pool.
#[cfg(feature = "parallel")]
pub fn map_chunks<T, R, F>(items: &[T], f: F) -> alloc::vec::Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    use rayon::prelude::*;
    items.par_iter().map(|item| f(item)).collect()
}
