//! Shrink candidate functions.
//!
//! These produce the *first-level* candidate sequences that
//! [`Shrinkable::unfold`](crate::shrinkable::Shrinkable::unfold) expands into
//! full trees: integers halve their distance to a destination, containers
//! enumerate contiguous-run removals.

use num_traits::PrimInt;

use crate::sequence::{self, Sequence};

/// Candidates for an integer, halving the distance towards `destination`.
///
/// The first candidate is the destination itself, then values progressively
/// closer to `x`, ending with the immediate neighbour of `x`. Empty when `x`
/// already equals the destination. For unsigned types `destination` must not
/// exceed `x`.
pub fn towards<T>(destination: T, x: T) -> Sequence<T>
where
    T: PrimInt + 'static,
{
    if destination == x {
        return Sequence::empty();
    }
    let two = T::one() + T::one();
    // State is the remaining distance; x - distance walks from the
    // destination towards x as the distance halves.
    sequence::unfold(x - destination, move |diff| {
        if *diff == T::zero() {
            None
        } else {
            Some((x - *diff, *diff / two))
        }
    })
}

/// Candidates for an integer, shrinking towards zero.
pub fn towards_zero<T>(x: T) -> Sequence<T>
where
    T: PrimInt + 'static,
{
    towards(T::zero(), x)
}

/// Enumerate every contiguous run that can be removed from a container of
/// `len` elements, as `(start, run_length)` pairs.
///
/// Run lengths are tried from `len` down to 1, and within each length every
/// position from the front. Removing any enumerated run yields a strictly
/// smaller container, and together the runs cover every possible contiguous
/// removal exactly once.
pub fn chunks(len: usize) -> Sequence<(usize, usize)> {
    if len == 0 {
        return Sequence::empty();
    }
    // State: (run_length, start).
    sequence::unfold((len, 0usize), move |&(run, start)| {
        if run == 0 {
            return None;
        }
        let next = if start + run < len {
            (run, start + 1)
        } else {
            (run - 1, 0)
        };
        Some(((start, run), next))
    })
}

/// A copy of `xs` with the run `[start, start + run)` removed.
pub fn remove_chunk<T: Clone>(xs: &[T], start: usize, run: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(xs.len() - run);
    out.extend_from_slice(&xs[..start]);
    out.extend_from_slice(&xs[start + run..]);
    out
}
