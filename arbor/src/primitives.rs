//! Generators for primitive values.
//!
//! These are plain instances of the [`Gen`](crate::gen::Gen) contract: numbers
//! drawn through the size-scaled bit stream, characters from explicit ranges,
//! strings and options assembled from the combinators. Kept deliberately thin;
//! domain-specific generators belong next to the properties that use them.

use num_traits::{AsPrimitive, PrimInt};

use crate::bits::BitStream;
use crate::container::vec_of;
use crate::error::GenerationError;
use crate::gen::Gen;
use crate::sequence::Sequence;
use crate::shrink::towards;
use crate::shrinkable::Shrinkable;

/// Any integer of type `T`, with magnitude scaled by the size hint.
///
/// At size 0 this always generates zero; at the nominal size it draws the full
/// bit width. Shrinks towards zero.
pub fn any_int<T>() -> Gen<T>
where
    T: PrimInt + Clone + 'static,
    u64: AsPrimitive<T>,
{
    Gen::new(|source, size| {
        let mut bits = BitStream::new(source);
        let value: T = bits.next_with_size(size);
        Ok(Shrinkable::unfold(value, |&v| towards(T::zero(), v)))
    })
}

/// An integer drawn uniformly from `[lo, hi]`, shrinking towards `lo`.
///
/// The size hint does not narrow the range: a range is a contract, not a
/// magnitude.
///
/// # Panics
///
/// Panics if `lo > hi`.
pub fn int_range<T>(lo: T, hi: T) -> Gen<T>
where
    T: PrimInt + Clone + 'static,
{
    assert!(lo <= hi, "int_range requires lo <= hi");
    Gen::new(move |mut source, _size| {
        let lo_wide = lo.to_i128().expect("range bound does not fit in 128 bits");
        let hi_wide = hi.to_i128().expect("range bound does not fit in 128 bits");
        let span = (hi_wide - lo_wide) as u128 + 1;
        let offset = next_below_u128(&mut source, span);
        let value = T::from(lo_wide + offset as i128)
            .expect("drawn value lies inside the range by construction");
        Ok(Shrinkable::unfold(value, move |&v| towards(lo, v)))
    })
}

fn next_below_u128(source: &mut crate::rng::Source, bound: u128) -> u128 {
    debug_assert!(bound > 0);
    if bound <= u64::MAX as u128 {
        return source.next_below(bound as u64) as u128;
    }
    let zone = u128::MAX - (u128::MAX % bound);
    loop {
        let draw = ((source.next() as u128) << 64) | source.next() as u128;
        if draw < zone {
            return draw % bound;
        }
    }
}

/// A boolean; `true` shrinks to `false`.
pub fn any_bool() -> Gen<bool> {
    Gen::new(|source, _size| {
        let mut bits = BitStream::new(source);
        let value: u64 = bits.next(1);
        if value == 1 {
            Ok(Shrinkable::with_shrinks(
                true,
                Sequence::singleton(Shrinkable::singleton(false)),
            ))
        } else {
            Ok(Shrinkable::singleton(false))
        }
    })
}

/// A character drawn uniformly from an inclusive ASCII range, shrinking
/// towards the low end.
fn ascii_range(lo: u8, hi: u8) -> Gen<char> {
    int_range(lo, hi).map(|b| b as char)
}

/// A lowercase ASCII letter, shrinking towards `'a'`.
pub fn ascii_lowercase() -> Gen<char> {
    ascii_range(b'a', b'z')
}

/// An ASCII letter or digit.
pub fn ascii_alphanumeric() -> Gen<char> {
    Gen::one_of(vec![
        ascii_range(b'a', b'z'),
        ascii_range(b'A', b'Z'),
        ascii_range(b'0', b'9'),
    ])
}

/// Any printable ASCII character, shrinking towards space.
pub fn ascii_printable() -> Gen<char> {
    ascii_range(0x20u8, 0x7e)
}

/// A string of up to `size` characters from the given character generator.
pub fn string_of(chars: Gen<char>) -> Gen<String> {
    vec_of(chars).map(|cs| cs.into_iter().collect())
}

/// An optional value: `None` roughly a quarter of the time.
///
/// `Some` values offer `None` as their first shrink, then shrink the inner
/// value.
pub fn option_of<T: Clone + 'static>(inner: Gen<T>) -> Gen<Option<T>> {
    Gen::new(move |source, size| {
        let (mut choice_source, value_source) = source.split();
        if choice_source.next_below(4) == 0 {
            Ok(Shrinkable::singleton(None))
        } else {
            let value = inner.run(value_source, size)?;
            Ok(value
                .map(Some)
                .map_shrinks(|shrinks| Sequence::cons(Shrinkable::singleton(None), shrinks)))
        }
    })
}

/// One of the given values, uniformly. Does not shrink.
pub fn element_of<T: Clone + 'static>(values: Vec<T>) -> Gen<T> {
    Gen::new(move |mut source, _size| {
        if values.is_empty() {
            return Err(GenerationError::no_choices("element_of"));
        }
        let index = source.next_below(values.len() as u64) as usize;
        Ok(Shrinkable::singleton(values[index].clone()))
    })
}
