//! Commands and recorded command sequences.

use std::fmt::{self, Debug};
use std::rc::Rc;

use arbor::{Shrinkable, Source};

/// One legal operation against a modeled stateful system.
///
/// A command describes when it is legal ([`precondition`]), how it changes the
/// model ([`apply`]), and how to exercise the system under test while checking
/// the observed behavior against the model as it stood *before* the command
/// ([`run`]).
///
/// Commands are immutable values, shared by reference counting once generated.
///
/// [`precondition`]: Command::precondition
/// [`apply`]: Command::apply
/// [`run`]: Command::run
pub trait Command<M, S>: Debug {
    /// Whether this command is legal in the given model state.
    fn precondition(&self, _model: &M) -> bool {
        true
    }

    /// Advance the model state.
    fn apply(&self, model: &mut M);

    /// Exercise the system under test. `model` is the state before the
    /// command; return `Err` with a description when an assertion fails.
    fn run(&self, sut: &mut S, model: &M) -> Result<(), String>;
}

/// A shared, immutable command instance.
pub type CmdRc<M, S> = Rc<dyn Command<M, S>>;

/// One generated step: the sub-source that produced it, the command with its
/// shrink candidates, and the model state after applying it.
pub struct Entry<M, S> {
    pub source: Source,
    pub command: Shrinkable<CmdRc<M, S>>,
    pub post: M,
}

impl<M: Clone, S> Clone for Entry<M, S> {
    fn clone(&self) -> Self {
        Entry {
            source: self.source.clone(),
            command: self.command.clone(),
            post: self.post.clone(),
        }
    }
}

/// An ordered command sequence together with its initial model state and the
/// model trajectory recorded during generation.
pub struct CommandSequence<M, S> {
    pub initial: M,
    pub entries: Vec<Entry<M, S>>,
}

impl<M: Clone, S> Clone for CommandSequence<M, S> {
    fn clone(&self) -> Self {
        CommandSequence {
            initial: self.initial.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<M: 'static, S: 'static> Debug for CommandSequence<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.command.value_ref()))
            .finish()
    }
}

impl<M, S> CommandSequence<M, S>
where
    M: Clone + 'static,
    S: 'static,
{
    /// The commands in order.
    pub fn commands(&self) -> Vec<CmdRc<M, S>> {
        self.entries.iter().map(|e| e.command.value()).collect()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the sequence holds no commands.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay the sequence against the initial model, checking that every
    /// command's precondition holds at the point it is applied.
    pub fn is_valid(&self) -> bool {
        let mut model = self.initial.clone();
        for entry in &self.entries {
            let command = entry.command.value();
            if !command.precondition(&model) {
                return false;
            }
            command.apply(&mut model);
        }
        true
    }

    /// The model state after the whole sequence.
    pub fn final_model(&self) -> M {
        self.entries
            .last()
            .map(|e| e.post.clone())
            .unwrap_or_else(|| self.initial.clone())
    }
}
