//! Shrink trees: a value paired with its lazy candidate simplifications.
//!
//! A [`Shrinkable`] bundles one concrete value with an ordered, lazily
//! evaluated sequence of simpler candidates, each of which is itself a
//! `Shrinkable`. The tree is conceptually infinite; only the path a shrink
//! search actually walks is ever materialized. Forcing the candidate sequence
//! never panics: a shrink rule that blows up forfeits further shrinking at that
//! node instead of aborting the search.

use std::rc::Rc;

use crate::sequence::Sequence;

/// A generated value together with its lazy shrink candidates.
pub struct Shrinkable<T> {
    value: T,
    shrinks: Sequence<Shrinkable<T>>,
}

impl<T: Clone> Clone for Shrinkable<T> {
    fn clone(&self) -> Self {
        Shrinkable {
            value: self.value.clone(),
            shrinks: self.shrinks.clone(),
        }
    }
}

impl<T: Clone + 'static> Shrinkable<T> {
    /// A value with no shrink candidates.
    pub fn singleton(value: T) -> Self {
        Shrinkable {
            value,
            shrinks: Sequence::empty(),
        }
    }

    /// A value with an explicit candidate sequence.
    pub fn with_shrinks(value: T, shrinks: Sequence<Shrinkable<T>>) -> Self {
        Shrinkable { value, shrinks }
    }

    /// Build an infinite-depth tree from a seed value and an expansion rule.
    ///
    /// `expand` produces the first-level candidates for a value; every
    /// candidate is recursively expanded by the same rule. Nearly all concrete
    /// shrinking strategies reduce to this constructor.
    pub fn unfold<F>(value: T, expand: F) -> Self
    where
        F: Fn(&T) -> Sequence<T> + 'static,
    {
        Self::unfold_rc(value, Rc::new(expand))
    }

    fn unfold_rc(value: T, expand: Rc<dyn Fn(&T) -> Sequence<T>>) -> Self {
        let seed = value.clone();
        let rule = expand.clone();
        let shrinks = Sequence::defer(move || {
            let child_rule = rule.clone();
            rule(&seed).map(move |candidate| Shrinkable::unfold_rc(candidate, child_rule.clone()))
        });
        Shrinkable { value, shrinks }
    }

    /// The represented value. Pure: calling it twice yields equal values.
    pub fn value(&self) -> T {
        self.value.clone()
    }

    /// Borrow the represented value.
    pub fn value_ref(&self) -> &T {
        &self.value
    }

    /// Consume the tree, keeping only the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The candidate simplifications, in order.
    ///
    /// The returned sequence is guarded: an exception while forcing any step
    /// is converted into "no further shrinks from here".
    pub fn shrinks(&self) -> Sequence<Shrinkable<T>> {
        self.shrinks.clone().guarded()
    }

    /// Transform the value and, recursively, every candidate's value.
    ///
    /// Preserves the shape and ordering of the shrink tree.
    pub fn map<U, F>(self, f: F) -> Shrinkable<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> U + 'static,
    {
        self.map_rc(Rc::new(f))
    }

    fn map_rc<U: Clone + 'static>(self, f: Rc<dyn Fn(T) -> U>) -> Shrinkable<U> {
        let value = f(self.value.clone());
        let inner = f.clone();
        let shrinks = self
            .shrinks
            .map(move |candidate: Shrinkable<T>| candidate.map_rc(inner.clone()));
        Shrinkable { value, shrinks }
    }

    /// Replace the candidate sequence, leaving the value untouched.
    pub fn map_shrinks<F>(self, f: F) -> Shrinkable<T>
    where
        F: FnOnce(Sequence<Shrinkable<T>>) -> Sequence<Shrinkable<T>>,
    {
        Shrinkable {
            value: self.value,
            shrinks: f(self.shrinks),
        }
    }

    /// Erase all shrink candidates, keeping generation untouched.
    pub fn without_shrinks(self) -> Shrinkable<T> {
        self.map_shrinks(|_| Sequence::empty())
    }

    /// Recursively prune every node whose value fails the predicate.
    ///
    /// The root itself may fail, so the result is optional. A pruned node's
    /// whole subtree is discarded with it.
    pub fn filter<F>(self, pred: F) -> Option<Shrinkable<T>>
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.filter_rc(Rc::new(pred))
    }

    fn filter_rc(self, pred: Rc<dyn Fn(&T) -> bool>) -> Option<Shrinkable<T>> {
        if !pred(&self.value) {
            return None;
        }
        let inner = pred.clone();
        let shrinks = self
            .shrinks
            .filter_map(move |candidate: Shrinkable<T>| candidate.filter_rc(inner.clone()));
        Some(Shrinkable {
            value: self.value,
            shrinks,
        })
    }
}

/// Combine two shrink trees into a tree of pairs.
///
/// Candidates shrink exactly one side at a time: the first component's full
/// candidate sequence is offered before the second component's, and no
/// candidate ever differs from the current pair in both positions at once.
pub fn zip<A, B>(left: Shrinkable<A>, right: Shrinkable<B>) -> Shrinkable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let value = (left.value(), right.value());
    let fixed_right = right.clone();
    let left_pass = left
        .shrinks()
        .map(move |candidate: Shrinkable<A>| zip(candidate, fixed_right.clone()));
    let fixed_left = left;
    let right_pass = right
        .shrinks()
        .map(move |candidate: Shrinkable<B>| zip(fixed_left.clone(), candidate));
    Shrinkable::with_shrinks(value, Sequence::concat(left_pass, right_pass))
}
