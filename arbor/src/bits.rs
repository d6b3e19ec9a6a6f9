//! Bit-level slicing of a random stream.
//!
//! Numeric generators rarely need a full 64-bit draw per value. A [`BitStream`]
//! buffers the words produced by a [`Source`] and hands out exactly the number
//! of bits requested, carrying leftover bits across calls so no randomness is
//! wasted.

use num_traits::{AsPrimitive, PrimInt};

use crate::rng::Source;

/// The reference size against which generators scale their output magnitude.
///
/// A size hint equal to `NOMINAL_SIZE` yields full-width draws; size 0 yields
/// zero-width (deterministically zero) draws.
pub const NOMINAL_SIZE: u32 = 100;

/// A buffered bit reader over a [`Source`].
pub struct BitStream {
    source: Source,
    buf: u64,
    avail: u32,
}

impl BitStream {
    /// Wrap a source. The stream takes ownership; recover it with
    /// [`into_source`](BitStream::into_source).
    pub fn new(source: Source) -> Self {
        BitStream {
            source,
            buf: 0,
            avail: 0,
        }
    }

    /// Return the underlying source, discarding any buffered bits.
    pub fn into_source(self) -> Source {
        self.source
    }

    /// Read `nbits` bits into an integer of type `T`.
    ///
    /// For signed `T` the result is sign-extended from bit `nbits - 1`, so a
    /// 3-bit draw of a signed type ranges over `[-4, 3]`. Draws only as many
    /// source words as the cumulative bit demand requires.
    ///
    /// # Panics
    ///
    /// Panics if `nbits` exceeds 64.
    pub fn next<T>(&mut self, nbits: u32) -> T
    where
        T: PrimInt + 'static,
        u64: AsPrimitive<T>,
    {
        assert!(nbits <= 64, "cannot read more than 64 bits at once");
        let mut raw: u64 = 0;
        let mut got = 0u32;
        while got < nbits {
            if self.avail == 0 {
                self.buf = self.source.next();
                self.avail = 64;
            }
            let take = (nbits - got).min(self.avail);
            raw |= (self.buf & low_mask(take)) << got;
            self.buf = if take == 64 { 0 } else { self.buf >> take };
            self.avail -= take;
            got += take;
        }
        if nbits > 0 && nbits < 64 && is_signed::<T>() && (raw >> (nbits - 1)) & 1 == 1 {
            raw |= !0u64 << nbits;
        }
        raw.as_()
    }

    /// Read a size-scaled value of type `T`.
    ///
    /// The bit width is `width(T) * min(size, NOMINAL_SIZE) / NOMINAL_SIZE`,
    /// so small sizes produce small magnitudes and size 0 always produces
    /// zero.
    pub fn next_with_size<T>(&mut self, size: u32) -> T
    where
        T: PrimInt + 'static,
        u64: AsPrimitive<T>,
    {
        let width = bit_width::<T>();
        let nbits = width * size.min(NOMINAL_SIZE) / NOMINAL_SIZE;
        self.next(nbits)
    }
}

fn low_mask(bits: u32) -> u64 {
    if bits >= 64 { !0 } else { (1u64 << bits) - 1 }
}

fn bit_width<T: PrimInt>() -> u32 {
    T::zero().count_zeros()
}

fn is_signed<T: PrimInt>() -> bool {
    T::min_value() < T::zero()
}
