//! Sequence-level shrinking with repair.
//!
//! Two passes, concatenated in the same order as container shrinking: first
//! chunk removal (drop a contiguous run of commands), then per-entry shrinking
//! (simplify one command in place). Either kind of edit invalidates the
//! recorded model trajectory after the edit point, so every candidate is
//! *repaired*: the tail is replayed against the new trajectory and entries
//! whose precondition no longer holds are dropped - never regenerated - with
//! the cascade continuing until the remainder is consistent. A candidate only
//! enters the shrink search if its end-to-end replay is legal.

use std::fmt::Debug;
use std::rc::Rc;

use arbor::Shrinkable;
use arbor::sequence::Sequence;
use arbor::shrink::{chunks, remove_chunk};

use crate::command::{CmdRc, CommandSequence, Entry};

/// Replay entries against `initial`, dropping any whose precondition fails
/// and recomputing the post-states of the survivors.
pub fn repair_entries<M, S>(initial: &M, entries: Vec<Entry<M, S>>) -> Vec<Entry<M, S>>
where
    M: Clone + 'static,
    S: 'static,
{
    let mut model = initial.clone();
    let mut out = Vec::with_capacity(entries.len());
    for mut entry in entries {
        let command = entry.command.value();
        if !command.precondition(&model) {
            continue;
        }
        let mut post = model.clone();
        command.apply(&mut post);
        entry.post = post.clone();
        model = post;
        out.push(entry);
    }
    out
}

/// Wrap a generated sequence in its shrink tree.
pub fn shrink_sequence<M, S>(seq: CommandSequence<M, S>) -> Shrinkable<CommandSequence<M, S>>
where
    M: Clone + Debug + 'static,
    S: 'static,
{
    Shrinkable::unfold(seq, |current| {
        expand(current).filter(|candidate: &CommandSequence<M, S>| candidate.is_valid())
    })
}

/// First-level shrink candidates for one sequence.
fn expand<M, S>(seq: &CommandSequence<M, S>) -> Sequence<CommandSequence<M, S>>
where
    M: Clone + 'static,
    S: 'static,
{
    let seq = Rc::new(seq.clone());
    let removal_seq = seq.clone();
    let removals = chunks(seq.entries.len()).map(move |(start, run)| {
        let kept = remove_chunk(&removal_seq.entries, start, run);
        CommandSequence {
            initial: removal_seq.initial.clone(),
            entries: repair_entries(&removal_seq.initial, kept),
        }
    });
    Sequence::concat(removals, edit_pass(seq, 0))
}

/// Per-entry shrinks from `index` onward: each candidate replaces exactly one
/// command (filtered by the precondition against its unchanged predecessor
/// state) and repairs everything after it.
fn edit_pass<M, S>(
    seq: Rc<CommandSequence<M, S>>,
    index: usize,
) -> Sequence<CommandSequence<M, S>>
where
    M: Clone + 'static,
    S: 'static,
{
    if index >= seq.entries.len() {
        return Sequence::empty();
    }
    let pre = if index == 0 {
        seq.initial.clone()
    } else {
        seq.entries[index - 1].post.clone()
    };

    let gate = pre.clone();
    let candidates = seq.entries[index]
        .command
        .shrinks()
        .filter(move |candidate: &Shrinkable<CmdRc<M, S>>| {
            candidate.value_ref().precondition(&gate)
        });

    let here = seq.clone();
    let edited = candidates.map(move |candidate: Shrinkable<CmdRc<M, S>>| {
        let mut entries: Vec<Entry<M, S>> = here.entries[..index].to_vec();
        let mut post = pre.clone();
        candidate.value_ref().apply(&mut post);
        entries.push(Entry {
            source: here.entries[index].source.clone(),
            command: candidate,
            post: post.clone(),
        });
        let tail = here.entries[index + 1..].to_vec();
        entries.extend(repair_entries(&post, tail));
        CommandSequence {
            initial: here.initial.clone(),
            entries,
        }
    });

    let rest = Sequence::defer(move || edit_pass(seq.clone(), index + 1));
    Sequence::concat(edited, rest)
}
