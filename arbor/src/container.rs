//! Container generation and the shared container shrink strategy.
//!
//! All container generators shrink the same way, in two concatenated passes:
//! first every chunk removal (dropping a contiguous run of elements, longest
//! runs first), then per-element shrinks in index order. Deleting structure is
//! always tried before tweaking a single value. Associative containers
//! additionally filter out shrink candidates whose key would collide with a
//! sibling's key.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use crate::error::GenerationError;
use crate::gen::Gen;
use crate::sequence::Sequence;
use crate::shrink::{chunks, remove_chunk};
use crate::shrinkable::Shrinkable;

/// Extra draws an associative generator may spend hunting for distinct keys
/// before failing generation.
pub const MAX_DISTINCT_KEY_RETRIES: u32 = 100;

/// Build the shrink tree over a list of element trees.
///
/// The value is the element values in order; candidates are every chunk
/// removal followed by every single-element shrink, and each candidate is
/// recursively expanded by the same rule.
pub fn shrink_elements<T: Clone + 'static>(elems: Vec<Shrinkable<T>>) -> Shrinkable<Vec<T>> {
    shrink_elements_rc(Rc::new(elems))
}

fn shrink_elements_rc<T: Clone + 'static>(elems: Rc<Vec<Shrinkable<T>>>) -> Shrinkable<Vec<T>> {
    let value: Vec<T> = elems.iter().map(|e| e.value()).collect();
    let shrinks = Sequence::concat(removal_pass(elems.clone()), element_pass(elems, 0));
    Shrinkable::with_shrinks(value, shrinks)
}

fn removal_pass<T: Clone + 'static>(
    elems: Rc<Vec<Shrinkable<T>>>,
) -> Sequence<Shrinkable<Vec<T>>> {
    chunks(elems.len()).map(move |(start, run)| {
        shrink_elements_rc(Rc::new(remove_chunk(&elems, start, run)))
    })
}

fn element_pass<T: Clone + 'static>(
    elems: Rc<Vec<Shrinkable<T>>>,
    index: usize,
) -> Sequence<Shrinkable<Vec<T>>> {
    if index >= elems.len() {
        return Sequence::empty();
    }
    let here = elems.clone();
    let this_element = elems[index].shrinks().map(move |candidate: Shrinkable<T>| {
        let mut replaced = (*here).clone();
        replaced[index] = candidate;
        shrink_elements_rc(Rc::new(replaced))
    });
    let rest = Sequence::defer(move || element_pass(elems.clone(), index + 1));
    Sequence::concat(this_element, rest)
}

/// Like [`shrink_elements`], but for keyed elements: any per-element shrink
/// candidate whose key collides with another element's key (in the container
/// as it stood before that shrink) is filtered out, since it would not
/// represent a distinct container.
pub fn shrink_elements_keyed<T, K, F>(elems: Vec<Shrinkable<T>>, key_of: F) -> Shrinkable<Vec<T>>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
    F: Fn(&T) -> K + 'static,
{
    shrink_elements_keyed_rc(Rc::new(elems), Rc::new(key_of))
}

fn shrink_elements_keyed_rc<T, K>(
    elems: Rc<Vec<Shrinkable<T>>>,
    key_of: Rc<dyn Fn(&T) -> K>,
) -> Shrinkable<Vec<T>>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
{
    let value: Vec<T> = elems.iter().map(|e| e.value()).collect();
    let removal_elems = elems.clone();
    let removal_key_of = key_of.clone();
    let removals = chunks(elems.len()).map(move |(start, run)| {
        shrink_elements_keyed_rc(
            Rc::new(remove_chunk(&removal_elems, start, run)),
            removal_key_of.clone(),
        )
    });
    let edits = keyed_element_pass(elems, key_of, 0);
    Shrinkable::with_shrinks(value, Sequence::concat(removals, edits))
}

fn keyed_element_pass<T, K>(
    elems: Rc<Vec<Shrinkable<T>>>,
    key_of: Rc<dyn Fn(&T) -> K>,
    index: usize,
) -> Sequence<Shrinkable<Vec<T>>>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
{
    if index >= elems.len() {
        return Sequence::empty();
    }
    let here = elems.clone();
    let keyed = key_of.clone();
    let this_element = elems[index]
        .shrinks()
        .filter(move |candidate: &Shrinkable<T>| {
            let candidate_key = keyed(candidate.value_ref());
            !here
                .iter()
                .enumerate()
                .any(|(j, sibling)| j != index && keyed(sibling.value_ref()) == candidate_key)
        });
    let here = elems.clone();
    let keyed = key_of.clone();
    let this_element = this_element.map(move |candidate: Shrinkable<T>| {
        let mut replaced = (*here).clone();
        replaced[index] = candidate;
        shrink_elements_keyed_rc(Rc::new(replaced), keyed.clone())
    });
    let rest =
        Sequence::defer(move || keyed_element_pass(elems.clone(), key_of.clone(), index + 1));
    Sequence::concat(this_element, rest)
}

/// Generate a vector of up to `size` elements.
///
/// The element count is drawn uniformly from `[0, size]` using a source split
/// that is independent of element generation; the count itself is not shrunk
/// directly - shorter vectors arise from chunk removal.
pub fn vec_of<T: Clone + 'static>(element: Gen<T>) -> Gen<Vec<T>> {
    Gen::new(move |source, size| {
        let (mut count_source, mut element_source) = source.split();
        let count = count_source.next_below(size as u64 + 1) as usize;
        let mut elems = Vec::with_capacity(count);
        for _ in 0..count {
            let (this_source, rest) = element_source.split();
            element_source = rest;
            elems.push(element.run(this_source, size)?);
        }
        Ok(shrink_elements(elems))
    })
}

/// Generate a vector of exactly `len` elements.
///
/// The length is part of the contract, so shrinking only simplifies elements
/// in place and never removes any.
pub fn vec_of_len<T: Clone + 'static>(element: Gen<T>, len: usize) -> Gen<Vec<T>> {
    Gen::new(move |source, size| {
        let mut element_source = source;
        let mut elems = Vec::with_capacity(len);
        for _ in 0..len {
            let (this_source, rest) = element_source.split();
            element_source = rest;
            elems.push(element.run(this_source, size)?);
        }
        let value: Vec<T> = elems.iter().map(|e| e.value()).collect();
        let shrinks = element_pass(Rc::new(elems), 0);
        Ok(Shrinkable::with_shrinks(value, shrinks))
    })
}

fn distinct_elements<T, K>(
    element: &Gen<T>,
    key_of: impl Fn(&T) -> K,
    source: crate::rng::Source,
    size: u32,
) -> Result<Vec<Shrinkable<T>>, GenerationError>
where
    T: Clone + 'static,
    K: PartialEq,
{
    let (mut count_source, mut element_source) = source.split();
    let count = count_source.next_below(size as u64 + 1) as usize;
    let mut elems: Vec<Shrinkable<T>> = Vec::with_capacity(count);
    let mut keys: Vec<K> = Vec::with_capacity(count);
    let budget = count as u32 + MAX_DISTINCT_KEY_RETRIES;
    let mut attempts = 0;
    while elems.len() < count {
        if attempts >= budget {
            return Err(GenerationError::DistinctKeysExhausted {
                needed: count,
                attempts,
            });
        }
        attempts += 1;
        let (this_source, rest) = element_source.split();
        element_source = rest;
        let candidate = element.run(this_source, size)?;
        let key = key_of(candidate.value_ref());
        if keys.contains(&key) {
            continue;
        }
        keys.push(key);
        elems.push(candidate);
    }
    Ok(elems)
}

/// Generate a `HashSet` of up to `size` distinct elements.
pub fn hash_set_of<T>(element: Gen<T>) -> Gen<HashSet<T>>
where
    T: Clone + Eq + Hash + 'static,
{
    Gen::new(move |source, size| {
        let elems = distinct_elements(&element, |v: &T| v.clone(), source, size)?;
        Ok(shrink_elements_keyed(elems, |v: &T| v.clone())
            .map(|values| values.into_iter().collect()))
    })
}

/// Generate a `BTreeSet` of up to `size` distinct elements.
pub fn btree_set_of<T>(element: Gen<T>) -> Gen<BTreeSet<T>>
where
    T: Clone + Ord + 'static,
{
    Gen::new(move |source, size| {
        let elems = distinct_elements(&element, |v: &T| v.clone(), source, size)?;
        Ok(shrink_elements_keyed(elems, |v: &T| v.clone())
            .map(|values| values.into_iter().collect()))
    })
}

/// Generate a `HashMap` of up to `size` entries with distinct keys.
pub fn hash_map_of<K, V>(key: Gen<K>, value: Gen<V>) -> Gen<HashMap<K, V>>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + 'static,
{
    let pairs = key.zip(value);
    Gen::new(move |source, size| {
        let elems = distinct_elements(&pairs, |(k, _): &(K, V)| k.clone(), source, size)?;
        Ok(shrink_elements_keyed(elems, |(k, _): &(K, V)| k.clone())
            .map(|entries| entries.into_iter().collect()))
    })
}

/// Generate a `BTreeMap` of up to `size` entries with distinct keys.
pub fn btree_map_of<K, V>(key: Gen<K>, value: Gen<V>) -> Gen<BTreeMap<K, V>>
where
    K: Clone + Ord + 'static,
    V: Clone + 'static,
{
    let pairs = key.zip(value);
    Gen::new(move |source, size| {
        let elems = distinct_elements(&pairs, |(k, _): &(K, V)| k.clone(), source, size)?;
        Ok(shrink_elements_keyed(elems, |(k, _): &(K, V)| k.clone())
            .map(|entries| entries.into_iter().collect()))
    })
}
