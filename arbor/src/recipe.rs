//! Recorded generation recipes for imperative, pick-based generation.
//!
//! Combinator-built generators shrink through their [`Shrinkable`] trees. When
//! generation is written imperatively instead - "pick this, then pick that,
//! then decide what to pick next" - the recording lives here: a [`Recipe`]
//! remembers every pick made at every position so that a single sub-value can
//! be shrunk and the whole generation replayed with all of its siblings held
//! fixed, without re-deriving anything unrelated.
//!
//! Position is tracked by an explicit [`Cursor`] threaded through the
//! generation closure; there is no ambient or thread-local "current node"
//! state. Recorded values are stored type-erased behind a small vtable
//! captured at insertion time; asking a slot for the wrong type is a
//! programmer error and panics.

use std::any::Any;
use std::fmt::Debug;

use crate::error::GenerationError;
use crate::gen::{Gen, Size};
use crate::rng::Source;
use crate::sequence::Sequence;
use crate::shrinkable::Shrinkable;

/// Type-erased storage for one recorded pick, including its shrink state.
///
/// Implemented only by [`TypedSlot`]; the erased surface is what the untyped
/// node tree needs: current value, shrink-cursor stepping, accept/reject.
trait Slot {
    fn current_any(&self) -> Box<dyn Any>;
    fn type_name(&self) -> &'static str;
    fn describe(&self) -> String;
    fn has_tentative(&self) -> bool;
    fn shrinking(&self) -> bool;
    fn exhausted(&self) -> bool;
    fn start_shrink(&mut self);
    fn advance(&mut self) -> bool;
    fn accept(&mut self);
    fn reject(&mut self);
}

/// Per-slot shrink state machine: a committed baseline, an optional active
/// candidate sequence, and at most one tentative (not yet committed)
/// candidate.
struct TypedSlot<T: Clone + Debug + 'static> {
    baseline: Shrinkable<T>,
    candidates: Option<Sequence<Shrinkable<T>>>,
    tentative: Option<Shrinkable<T>>,
    exhausted: bool,
}

impl<T: Clone + Debug + 'static> TypedSlot<T> {
    fn new(baseline: Shrinkable<T>) -> Self {
        TypedSlot {
            baseline,
            candidates: None,
            tentative: None,
            exhausted: false,
        }
    }

    fn current(&self) -> &Shrinkable<T> {
        self.tentative.as_ref().unwrap_or(&self.baseline)
    }
}

impl<T: Clone + Debug + 'static> Slot for TypedSlot<T> {
    fn current_any(&self) -> Box<dyn Any> {
        Box::new(self.current().value())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn describe(&self) -> String {
        format!("{:?}", self.current().value_ref())
    }

    fn has_tentative(&self) -> bool {
        self.tentative.is_some()
    }

    fn shrinking(&self) -> bool {
        self.candidates.is_some()
    }

    fn exhausted(&self) -> bool {
        self.exhausted
    }

    fn start_shrink(&mut self) {
        if self.candidates.is_none() && !self.exhausted {
            self.candidates = Some(self.baseline.shrinks());
        }
    }

    fn advance(&mut self) -> bool {
        let Some(seq) = self.candidates.as_ref() else {
            return false;
        };
        match seq.next() {
            Some((candidate, rest)) => {
                self.candidates = Some(rest);
                self.tentative = Some(candidate);
                true
            }
            None => {
                self.candidates = None;
                self.tentative = None;
                self.exhausted = true;
                false
            }
        }
    }

    fn accept(&mut self) {
        if let Some(candidate) = self.tentative.take() {
            self.baseline = candidate;
            self.candidates = None;
            self.exhausted = false;
        }
    }

    fn reject(&mut self) {
        self.tentative = None;
    }
}

/// One position in the recorded generation tree.
#[derive(Default)]
struct Node {
    slot: Option<Box<dyn Slot>>,
    source: Option<Source>,
    atoms: Vec<u64>,
    children: Vec<Node>,
}

/// One shrink attempt somewhere in the subtree. Returns true if a tentative
/// candidate was produced.
///
/// Priority at each node: an already-active candidate sequence first, then the
/// children depth-first, and only when every descendant is exhausted does the
/// node start a fresh sequence of its own. Structure held in descendants is
/// minimized before the node's own value gets fine-tuned.
fn next_shrink(node: &mut Node) -> bool {
    if let Some(slot) = node.slot.as_mut() {
        if slot.shrinking() && slot.advance() {
            return true;
        }
    }
    for child in node.children.iter_mut() {
        if next_shrink(child) {
            return true;
        }
    }
    if let Some(slot) = node.slot.as_mut() {
        if !slot.exhausted() && !slot.shrinking() {
            slot.start_shrink();
            if slot.advance() {
                return true;
            }
        }
    }
    false
}

fn accept_in(node: &mut Node) -> bool {
    if let Some(slot) = node.slot.as_mut() {
        if slot.has_tentative() {
            slot.accept();
            // Children were generated in the context of the old value.
            node.children.clear();
            return true;
        }
    }
    node.children.iter_mut().any(accept_in)
}

fn reject_in(node: &mut Node) -> bool {
    if let Some(slot) = node.slot.as_mut() {
        if slot.has_tentative() {
            slot.reject();
            return true;
        }
    }
    node.children.iter_mut().any(reject_in)
}

fn collect_descriptions(node: &Node, out: &mut Vec<String>) {
    if let Some(slot) = node.slot.as_ref() {
        out.push(slot.describe());
    }
    for atom in &node.atoms {
        out.push(format!("atom {:#018x}", atom));
    }
    for child in &node.children {
        collect_descriptions(child, out);
    }
}

/// The recorded generation tree for one test case.
///
/// Create it from the case's source and size, [`run`](Recipe::run) a
/// generation closure against it, then drive the shrink state machine with
/// [`next_shrink`](Recipe::next_shrink) /
/// [`accept_shrink`](Recipe::accept_shrink) /
/// [`reject_shrink`](Recipe::reject_shrink), re-running the closure after each
/// step. Values already recorded replay unchanged except for the one tentative
/// candidate under trial.
pub struct Recipe {
    root: Node,
    source: Source,
    size: Size,
}

impl Recipe {
    /// Start an empty recipe for one test case.
    pub fn new(source: Source, size: Size) -> Self {
        Recipe {
            root: Node::default(),
            source,
            size,
        }
    }

    /// Execute a generation closure against the recorded tree.
    ///
    /// On the first run every pick draws fresh; later runs replay the recorded
    /// values (with any tentative shrink candidate substituted) and only draw
    /// fresh for picks that did not exist before, e.g. because a shrunk value
    /// steered generation down a new path.
    pub fn run<T, F>(&mut self, generate: F) -> Result<T, GenerationError>
    where
        F: FnOnce(&mut Cursor) -> Result<T, GenerationError>,
    {
        let mut cursor = Cursor {
            node: &mut self.root,
            next_child: 0,
            next_atom: 0,
            source: self.source.clone(),
            size: self.size,
        };
        generate(&mut cursor)
    }

    /// Advance the shrink search by one candidate. Returns false when the
    /// whole tree is exhausted.
    pub fn next_shrink(&mut self) -> bool {
        next_shrink(&mut self.root)
    }

    /// Commit the pending candidate as the new baseline, clearing children
    /// that were generated in the old context and resetting that node's
    /// cursor so the search restarts from the accepted value.
    pub fn accept_shrink(&mut self) -> bool {
        accept_in(&mut self.root)
    }

    /// Drop the pending candidate, keeping the cursor position so the next
    /// [`next_shrink`](Recipe::next_shrink) tries the following sibling.
    pub fn reject_shrink(&mut self) -> bool {
        reject_in(&mut self.root)
    }

    /// Render the ordered draw log, one entry per recorded pick or atom.
    ///
    /// This is the structure a reproduction token serializes.
    pub fn draw_descriptions(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_descriptions(&self.root, &mut out);
        out
    }

    /// Greedily minimize a failing generation.
    ///
    /// Repeatedly proposes one shrink candidate, re-runs `generate`, and keeps
    /// the candidate whenever the regenerated value still satisfies `fails`.
    /// Returns the minimal value together with the number of accepted shrinks.
    ///
    /// Recorded picks that a shrunk generation no longer reaches stay in the
    /// tree and may still be offered as candidates; they cannot change the
    /// regenerated value, so accepting them is harmless, but they can inflate
    /// the accepted-shrink count.
    pub fn minimize<T, F, P>(&mut self, generate: F, fails: P) -> (Result<T, GenerationError>, usize)
    where
        F: Fn(&mut Cursor) -> Result<T, GenerationError>,
        P: Fn(&T) -> bool,
    {
        let mut accepted = 0;
        while self.next_shrink() {
            match self.run(&generate) {
                Ok(value) if fails(&value) => {
                    self.accept_shrink();
                    accepted += 1;
                }
                _ => {
                    self.reject_shrink();
                }
            }
        }
        (self.run(&generate), accepted)
    }
}

/// Explicit position in the recipe tree during one generation pass.
pub struct Cursor<'a> {
    node: &'a mut Node,
    next_child: usize,
    next_atom: usize,
    source: Source,
    size: Size,
}

impl Cursor<'_> {
    /// The ambient size hint of this test case.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Generate (or replay) a value at the current position.
    ///
    /// The first visit splits off a dedicated sub-source, runs the generator
    /// and records the result; revisits return the recorded value, or the
    /// tentative shrink candidate if this node is the one currently under
    /// trial. Values must be `Clone` so the record can be re-read; a value
    /// that cannot be cloned has to be rebuilt from [`draw_u64`] draws
    /// instead and is then simply not shrunk.
    ///
    /// # Panics
    ///
    /// Panics if a replay requests a different type than was recorded at this
    /// position, which indicates a non-deterministic generation closure.
    ///
    /// [`draw_u64`]: Cursor::draw_u64
    pub fn pick<T>(&mut self, gen: &Gen<T>) -> Result<T, GenerationError>
    where
        T: Clone + Debug + 'static,
    {
        let index = self.advance_child();
        let size = self.size;
        if self.node.children[index].slot.is_none() {
            let (sub_source, rest) = self.source.clone().split();
            self.source = rest;
            let shrinkable = gen.run(sub_source.clone(), size)?;
            let child = &mut self.node.children[index];
            child.source = Some(sub_source);
            child.slot = Some(Box::new(TypedSlot::new(shrinkable)));
        }
        let slot = self.node.children[index]
            .slot
            .as_ref()
            .expect("slot was just filled");
        let stored = slot.type_name();
        match slot.current_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => panic!(
                "recipe slot type mismatch: position holds {}, caller asked for {}",
                stored,
                std::any::type_name::<T>()
            ),
        }
    }

    /// Draw a raw 64-bit atom at the current position, cached for replay.
    pub fn draw_u64(&mut self) -> u64 {
        let index = self.next_atom;
        self.next_atom += 1;
        if index < self.node.atoms.len() {
            self.node.atoms[index]
        } else {
            let value = self.source.next();
            self.node.atoms.push(value);
            value
        }
    }

    /// Draw a cached atom uniformly below `bound`.
    pub fn draw_below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "draw_below requires a non-zero bound");
        self.draw_u64() % bound
    }

    /// Descend into a child scope and run a nested generation closure there.
    ///
    /// Picks made inside the closure are recorded as children of the nested
    /// node, so the whole scope shrinks and replays as a unit.
    pub fn nested<T, F>(&mut self, generate: F) -> Result<T, GenerationError>
    where
        F: FnOnce(&mut Cursor) -> Result<T, GenerationError>,
    {
        let index = self.advance_child();
        let (sub_source, rest) = self.source.clone().split();
        self.source = rest;
        let mut cursor = Cursor {
            node: &mut self.node.children[index],
            next_child: 0,
            next_atom: 0,
            source: sub_source,
            size: self.size,
        };
        generate(&mut cursor)
    }

    fn advance_child(&mut self) -> usize {
        let index = self.next_child;
        self.next_child += 1;
        while self.node.children.len() <= index {
            self.node.children.push(Node::default());
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{any_int, int_range};

    fn recipe(seed: u64) -> Recipe {
        Recipe::new(Source::new(seed), 50)
    }

    #[test]
    fn replay_reproduces_the_same_values() {
        let mut recipe = recipe(1);
        let gen = any_int::<i32>();
        let first = recipe.run(|cur| {
            let a = cur.pick(&gen)?;
            let b = cur.pick(&gen)?;
            Ok((a, b))
        });
        let second = recipe.run(|cur| {
            let a = cur.pick(&gen)?;
            let b = cur.pick(&gen)?;
            Ok((a, b))
        });
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn sibling_picks_use_independent_sources() {
        // The first pick's value must not change when the second pick changes.
        let int = any_int::<i64>();
        let mut with_two = recipe(7);
        let pair = with_two
            .run(|cur| Ok((cur.pick(&int)?, cur.pick(&int)?)))
            .unwrap();
        let mut with_one = recipe(7);
        let single = with_one.run(|cur| cur.pick(&int)).unwrap();
        assert_eq!(pair.0, single);
    }

    #[test]
    fn atoms_replay_identically() {
        let mut recipe = recipe(3);
        let first = recipe.run(|cur| Ok((cur.draw_u64(), cur.draw_u64()))).unwrap();
        let second = recipe.run(|cur| Ok((cur.draw_u64(), cur.draw_u64()))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shrinking_one_pick_keeps_siblings_fixed() {
        let int = int_range(0i64, 1000);
        let mut recipe = recipe(11);
        let generate = |cur: &mut Cursor| Ok((cur.pick(&int)?, cur.pick(&int)?));
        let original = recipe.run(generate).unwrap();

        // "Fails" only while the second component keeps its original value,
        // so every shrink of b is rejected; a minimizes independently and b
        // must come through untouched.
        let pinned = original.1;
        let (minimal, accepted) = recipe.minimize(generate, |&(a, b)| a >= 10 && b == pinned);
        let minimal = minimal.unwrap();
        if original.0 >= 10 {
            assert_eq!(minimal.0, 10, "local minimum of 'a >= 10' is 10");
            assert!(accepted > 0);
        }
        assert_eq!(minimal.1, original.1, "sibling pick was perturbed");
    }

    #[test]
    fn minimize_reaches_local_minimum() {
        let int = int_range(0i64, 1 << 20);
        let mut recipe = recipe(19);
        let generate = |cur: &mut Cursor| cur.pick(&int);
        let original = recipe.run(generate).unwrap();
        let (minimal, _) = recipe.minimize(generate, |&v| v >= 100);
        let minimal = minimal.unwrap();
        if original >= 100 {
            assert_eq!(minimal, 100);
        } else {
            assert_eq!(minimal, original);
        }
    }

    #[test]
    fn dependent_picks_regenerate_after_accept() {
        // The count pick controls how many element picks happen; accepting a
        // shrink of an element must keep the rest of the list stable.
        let count_gen = int_range(1usize, 5);
        let elem = int_range(0i64, 100);
        let mut recipe = recipe(23);
        let generate = |cur: &mut Cursor| {
            let count = cur.pick(&count_gen)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(cur.pick(&elem)?);
            }
            Ok(items)
        };
        let original = recipe.run(generate).unwrap();
        let total: i64 = original.iter().sum();
        let (minimal, _) = recipe.minimize(generate, |items: &Vec<i64>| {
            items.iter().sum::<i64>() >= total.min(1)
        });
        let minimal = minimal.unwrap();
        assert!(minimal.iter().sum::<i64>() >= total.min(1));
    }

    #[test]
    fn nested_scopes_record_their_own_children() {
        let int = any_int::<i32>();
        let mut recipe = recipe(31);
        let generate = |cur: &mut Cursor| {
            let outer = cur.pick(&int)?;
            let inner = cur.nested(|sub| {
                let x = sub.pick(&int)?;
                let y = sub.pick(&int)?;
                Ok(x.wrapping_add(y))
            })?;
            Ok((outer, inner))
        };
        let first = recipe.run(generate).unwrap();
        let second = recipe.run(generate).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "recipe slot type mismatch")]
    fn type_mismatch_is_fatal() {
        let ints = any_int::<i32>();
        let longs = any_int::<i64>();
        let mut recipe = recipe(5);
        recipe.run(|cur| cur.pick(&ints)).unwrap();
        let _ = recipe.run(|cur| cur.pick(&longs));
    }

    #[test]
    fn draw_descriptions_cover_all_picks() {
        let int = int_range(0i32, 9);
        let mut recipe = recipe(2);
        recipe
            .run(|cur| {
                let _ = cur.pick(&int)?;
                let _ = cur.draw_u64();
                cur.pick(&int)
            })
            .unwrap();
        let log = recipe.draw_descriptions();
        assert_eq!(log.len(), 3);
        assert!(log.iter().any(|entry| entry.starts_with("atom ")));
    }

    #[test]
    fn exhausted_recipe_stops_shrinking() {
        let int = int_range(0i32, 3);
        let mut recipe = recipe(13);
        recipe.run(|cur| cur.pick(&int)).unwrap();
        // Nothing fails, so every candidate is rejected and the tree must
        // reach exhaustion rather than loop forever.
        let mut steps = 0;
        while recipe.next_shrink() {
            recipe.reject_shrink();
            steps += 1;
            assert!(steps < 1000, "shrink cursor failed to exhaust");
        }
        assert!(!recipe.next_shrink());
    }
}
