//! Composable generators.
//!
//! A [`Gen`] is a pure function from a random [`Source`] and a size hint to a
//! [`Shrinkable`] value. Generators own no mutable state and are combined by
//! value; every independent sub-generation receives its own split of the
//! source, so regenerating or shrinking one part of a value never disturbs the
//! draws of its siblings.

use std::rc::Rc;

use crate::error::GenerationError;
use crate::rng::Source;
use crate::sequence::Sequence;
use crate::shrinkable::{self, Shrinkable};

/// Magnitude hint passed to generators. Nominally in `[0, 100]`; never a hard
/// bound on generated values.
pub type Size = u32;

/// Retry budget for filtered generation before giving up with a
/// [`GenerationError`].
pub const MAX_FILTER_RETRIES: u32 = 100;

/// A composable generator of shrinkable values.
pub struct Gen<T> {
    run: Rc<dyn Fn(Source, Size) -> Result<Shrinkable<T>, GenerationError>>,
}

impl<T> Clone for Gen<T> {
    fn clone(&self) -> Self {
        Gen {
            run: self.run.clone(),
        }
    }
}

impl<T: Clone + 'static> Gen<T> {
    /// Build a generator from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Source, Size) -> Result<Shrinkable<T>, GenerationError> + 'static,
    {
        Gen { run: Rc::new(f) }
    }

    /// Generate a shrinkable value.
    pub fn run(&self, source: Source, size: Size) -> Result<Shrinkable<T>, GenerationError> {
        (self.run)(source, size)
    }

    /// A generator that always produces the same value, with no shrinks.
    pub fn constant(value: T) -> Self {
        Gen::new(move |_source, _size| Ok(Shrinkable::singleton(value.clone())))
    }

    /// Transform generated values, preserving the shrink tree's shape.
    pub fn map<U, F>(self, f: F) -> Gen<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        let f = Rc::new(f);
        Gen::new(move |source, size| {
            let f = f.clone();
            Ok(self.run(source, size)?.map(move |v| f(v)))
        })
    }

    /// Dependent generation: feed the generated value into a follow-up
    /// generator.
    ///
    /// The outer and inner draws use independent splits of the source.
    /// Shrinking tries outer candidates first (regenerating the inner value
    /// for each), then the inner value's own candidates.
    pub fn and_then<U, F>(self, f: F) -> Gen<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> Gen<U> + 'static,
    {
        let f = Rc::new(f);
        Gen::new(move |source, size| {
            let (outer_source, inner_source) = source.split();
            let outer = self.run(outer_source, size)?;
            bind_shrinkable(outer, inner_source, size, f.clone())
        })
    }

    /// Keep regenerating until the predicate holds.
    ///
    /// Each failed attempt retries with the size raised by one, so a predicate
    /// that is only satisfiable at larger magnitudes still converges. After
    /// [`MAX_FILTER_RETRIES`] attempts the generator fails with a
    /// [`GenerationError`], which the check loop treats as a discarded trial.
    pub fn such_that<P>(self, pred: P) -> Gen<T>
    where
        P: Fn(&T) -> bool + 'static,
    {
        let pred = Rc::new(pred);
        Gen::new(move |source, size| {
            let mut remaining = source;
            for attempt in 0..MAX_FILTER_RETRIES {
                let (attempt_source, rest) = remaining.split();
                remaining = rest;
                let candidate = self.run(attempt_source, size + attempt)?;
                let pred = pred.clone();
                if let Some(filtered) = candidate.filter(move |v| pred(v)) {
                    return Ok(filtered);
                }
            }
            Err(GenerationError::retries_exhausted(
                "filtered value",
                MAX_FILTER_RETRIES,
            ))
        })
    }

    /// Override the size seen by this generator, leaving siblings untouched.
    pub fn resize(self, size: Size) -> Gen<T> {
        Gen::new(move |source, _ambient| self.run(source, size))
    }

    /// Multiplicatively adjust the size seen by this generator.
    pub fn scale(self, factor: f64) -> Gen<T> {
        Gen::new(move |source, size| {
            let scaled = (size as f64 * factor).max(0.0).min(u32::MAX as f64) as Size;
            self.run(source, scaled)
        })
    }

    /// Generate normally but erase the shrink candidates.
    ///
    /// Useful when an auxiliary draw (a length, a discriminant) must not be
    /// simplified independently of the value it controls.
    pub fn no_shrink(self) -> Gen<T> {
        Gen::new(move |source, size| Ok(self.run(source, size)?.without_shrinks()))
    }

    /// Pair this generator with another.
    ///
    /// Each side draws from its own split of the source, and shrink candidates
    /// alter exactly one side at a time (left side first).
    pub fn zip<U>(self, other: Gen<U>) -> Gen<(T, U)>
    where
        U: Clone + 'static,
    {
        Gen::new(move |source, size| {
            let (left_source, right_source) = source.split();
            let left = self.run(left_source, size)?;
            let right = other.run(right_source, size)?;
            Ok(shrinkable::zip(left, right))
        })
    }

    /// Choose uniformly among the given generators.
    ///
    /// One draw selects the alternative; shrinking then explores only the
    /// chosen alternative's tree. Switching to a different alternative during
    /// shrinking is deliberately not attempted.
    pub fn one_of(gens: Vec<Gen<T>>) -> Gen<T> {
        let choices = gens.into_iter().map(|g| (1, g)).collect();
        Self::frequency(choices)
    }

    /// Choose among generators with probability proportional to weight.
    ///
    /// An empty list or an all-zero weight table fails generation at run time.
    /// Like [`one_of`](Gen::one_of), shrinking stays inside the chosen
    /// alternative.
    pub fn frequency(choices: Vec<(u64, Gen<T>)>) -> Gen<T> {
        let choices = Rc::new(choices);
        Gen::new(move |source, size| {
            let total: u64 = choices.iter().map(|(w, _)| *w).sum();
            if total == 0 {
                return Err(GenerationError::no_choices("frequency"));
            }
            let (mut pick_source, gen_source) = source.split();
            let mut roll = pick_source.next_below(total);
            let mut chosen = choices.len() - 1;
            for (index, (weight, _)) in choices.iter().enumerate() {
                if roll < *weight {
                    chosen = index;
                    break;
                }
                roll -= *weight;
            }
            choices[chosen].1.run(gen_source, size)
        })
    }
}

fn bind_shrinkable<T, U>(
    outer: Shrinkable<T>,
    inner_source: Source,
    size: Size,
    f: Rc<dyn Fn(T) -> Gen<U>>,
) -> Result<Shrinkable<U>, GenerationError>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    let inner = f(outer.value()).run(inner_source.clone(), size)?;
    let rebind = f.clone();
    let outer_pass = outer.shrinks().filter_map(move |candidate: Shrinkable<T>| {
        bind_shrinkable(candidate, inner_source.clone(), size, rebind.clone()).ok()
    });
    let value = inner.value();
    let shrinks = Sequence::concat(outer_pass, inner.shrinks());
    Ok(Shrinkable::with_shrinks(value, shrinks))
}

/// Generate a triple, each component from its own split source.
///
/// Shrinks component-wise in declared order; no candidate differs from the
/// current value in more than one position.
pub fn tuple3<A, B, C>(a: Gen<A>, b: Gen<B>, c: Gen<C>) -> Gen<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    a.zip(b.zip(c)).map(|(x, (y, z))| (x, y, z))
}

/// Generate a quadruple, each component from its own split source.
pub fn tuple4<A, B, C, D>(a: Gen<A>, b: Gen<B>, c: Gen<C>, d: Gen<D>) -> Gen<(A, B, C, D)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
{
    a.zip(b.zip(c.zip(d))).map(|(w, (x, (y, z)))| (w, x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrink::towards_zero;

    fn small_int() -> Gen<i64> {
        Gen::new(|source, size| {
            let mut bits = crate::bits::BitStream::new(source);
            let value: i64 = bits.next_with_size(size.min(20));
            Ok(Shrinkable::unfold(value, |&v| towards_zero(v)))
        })
    }

    #[test]
    fn constant_generates_without_shrinks() {
        let gen = Gen::constant(42);
        let s = gen.run(Source::new(0), 50).unwrap();
        assert_eq!(s.value(), 42);
        assert!(s.shrinks().is_empty());
    }

    #[test]
    fn generation_is_deterministic() {
        let gen = small_int();
        let a = gen.run(Source::new(17), 50).unwrap();
        let b = gen.run(Source::new(17), 50).unwrap();
        assert_eq!(a.value(), b.value());
        let shrinks_a: Vec<i64> = a.shrinks().map(|s| s.value()).take(10).collect_vec();
        let shrinks_b: Vec<i64> = b.shrinks().map(|s| s.value()).take(10).collect_vec();
        assert_eq!(shrinks_a, shrinks_b);
    }

    #[test]
    fn map_transforms_value_and_shrinks() {
        let gen = small_int().map(|v| v.abs() + 1);
        let s = gen.run(Source::new(3), 50).unwrap();
        assert!(s.value() >= 1);
        for candidate in s.shrinks().take(10).iter() {
            assert!(candidate.value() >= 1);
        }
    }

    #[test]
    fn such_that_never_violates_predicate() {
        let gen = small_int().such_that(|v| v % 2 == 0);
        for seed in 0..50 {
            let s = gen.run(Source::new(seed), 30).unwrap();
            assert_eq!(s.value() % 2, 0);
            // The shrink tree is filtered too.
            for candidate in s.shrinks().take(20).iter() {
                assert_eq!(candidate.value() % 2, 0);
            }
        }
    }

    #[test]
    fn such_that_gives_up_on_impossible_predicate() {
        let gen = small_int().such_that(|_| false);
        let result = gen.run(Source::new(1), 10);
        assert!(matches!(
            result,
            Err(GenerationError::RetriesExhausted { .. })
        ));
    }

    #[test]
    fn resize_overrides_ambient_size() {
        let sizes_seen = Gen::new(|_source, size| Ok(Shrinkable::singleton(size)));
        let s = sizes_seen.clone().resize(7).run(Source::new(0), 100).unwrap();
        assert_eq!(s.value(), 7);
        let s = sizes_seen.scale(0.5).run(Source::new(0), 100).unwrap();
        assert_eq!(s.value(), 50);
    }

    #[test]
    fn no_shrink_erases_candidates() {
        let gen = small_int().no_shrink();
        let with = small_int().run(Source::new(5), 50).unwrap();
        let without = gen.run(Source::new(5), 50).unwrap();
        assert_eq!(with.value(), without.value());
        assert!(without.shrinks().is_empty());
    }

    #[test]
    fn zip_components_draw_independently() {
        // The left component's value must not depend on what is zipped on the
        // right, because each side owns its own split stream.
        let paired_a = small_int().zip(Gen::constant(0u8));
        let paired_b = small_int().zip(small_int().map(|v| v as u8));
        let a = paired_a.run(Source::new(11), 50).unwrap();
        let b = paired_b.run(Source::new(11), 50).unwrap();
        assert_eq!(a.value().0, b.value().0);
    }

    #[test]
    fn zip_shrinks_one_component_at_a_time() {
        let gen = small_int().zip(small_int());
        let s = gen.run(Source::new(23), 50).unwrap();
        let (a, b) = s.value();
        for candidate in s.shrinks().take(50).iter() {
            let (ca, cb) = candidate.value();
            assert!(ca == a || cb == b, "both components changed in one step");
        }
    }

    #[test]
    fn one_of_picks_from_all_alternatives() {
        let gen = Gen::one_of(vec![
            Gen::constant(1),
            Gen::constant(2),
            Gen::constant(3),
        ]);
        let mut seen = [false; 3];
        for seed in 0..60 {
            let v = gen.run(Source::new(seed), 50).unwrap().value();
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn one_of_shrinks_within_chosen_alternative() {
        // Alternative A shrinks through positives, alternative B is the
        // constant -1; no shrink of an A-value may ever be -1.
        let gen = Gen::one_of(vec![
            small_int().map(|v| v.abs() + 1),
            Gen::constant(-1),
        ]);
        for seed in 0..40 {
            let s = gen.run(Source::new(seed), 50).unwrap();
            if s.value() >= 1 {
                for candidate in s.shrinks().take(30).iter() {
                    assert!(candidate.value() >= 1, "shrink switched alternative");
                }
            }
        }
    }

    #[test]
    fn frequency_respects_weights() {
        let gen = Gen::frequency(vec![(9, Gen::constant(true)), (1, Gen::constant(false))]);
        let hits = (0..500)
            .filter(|&seed| gen.run(Source::new(seed), 50).unwrap().value())
            .count();
        assert!(hits > 380, "expected ~450 heavy picks, got {}", hits);
    }

    #[test]
    fn frequency_with_no_weight_fails_generation() {
        let gen = Gen::frequency(vec![(0, Gen::constant(1))]);
        assert!(matches!(
            gen.run(Source::new(0), 50),
            Err(GenerationError::NoChoices { .. })
        ));
        let empty: Gen<i32> = Gen::one_of(vec![]);
        assert!(matches!(
            empty.run(Source::new(0), 50),
            Err(GenerationError::NoChoices { .. })
        ));
    }

    #[test]
    fn and_then_threads_dependent_generation() {
        // Generate a sign, then a magnitude with that sign applied.
        let gen = Gen::one_of(vec![Gen::constant(1i64), Gen::constant(-1)])
            .and_then(|sign| small_int().map(move |v| v.abs() * sign));
        for seed in 0..30 {
            let s = gen.run(Source::new(seed), 50).unwrap();
            let v = s.value();
            for candidate in s.shrinks().take(20).iter() {
                // Inner shrinks keep the chosen sign; outer shrinks are
                // regenerations and may flip it, but never invent magnitude.
                assert!(candidate.value().abs() <= v.abs() || candidate.value() == 0);
            }
        }
    }

    #[test]
    fn tuple3_shrinks_in_field_order() {
        let gen = tuple3(small_int(), small_int(), small_int());
        let s = gen.run(Source::new(41), 50).unwrap();
        let (a, b, c) = s.value();
        for candidate in s.shrinks().take(60).iter() {
            let (ca, cb, cc) = candidate.value();
            let changed = [ca != a, cb != b, cc != c].iter().filter(|&&x| x).count();
            assert!(changed <= 1, "more than one field changed in one candidate");
        }
    }
}
