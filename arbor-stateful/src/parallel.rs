//! Parallel command execution with post-hoc interleaving verification.
//!
//! A parallel program is a sequential prefix plus two short command suffixes.
//! The prefix establishes a known model state; the suffixes then run on two
//! real threads against the shared system under test. Afterwards - back on
//! one thread - the recorded traces are checked for *some* interleaving that
//! is consistent with the model: an exhaustive recursive search over the
//! two-way merge, kept tractable by capping the parallel command count.

use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::{Arc, Barrier, Mutex};

use arbor::{Gen, GenerationError, Shrinkable, Size, Source, Verdict};

use crate::generator::MAX_COMMAND_RETRIES;

/// Upper bound on commands across both parallel suffixes. The interleaving
/// search is exponential in this count; 12 keeps it in the thousands of
/// merge orders at worst.
pub const MAX_PARALLEL_COMMANDS: usize = 12;

/// A command that may run on a worker thread.
///
/// Unlike [`Command`](crate::command::Command), the run side receives the SUT
/// behind a mutex and no model state: during the parallel phase there is no
/// single model trajectory to assert against. Model-level checking happens
/// afterwards, in [`verify_interleavings`].
pub trait ParallelCommand<M, S>: Debug + Send + Sync {
    /// Whether this command is legal in the given model state.
    fn precondition(&self, _model: &M) -> bool {
        true
    }

    /// Advance the model state.
    fn apply(&self, model: &mut M);

    /// Exercise the system under test.
    fn run_concurrent(&self, sut: &Mutex<S>) -> Result<(), String>;
}

/// A shared, thread-safe command instance.
pub type ParCmd<M, S> = Arc<dyn ParallelCommand<M, S>>;

/// A sequential prefix plus two parallel suffixes.
pub struct ParallelProgram<M, S> {
    pub initial: M,
    pub prefix: Vec<ParCmd<M, S>>,
    pub left: Vec<ParCmd<M, S>>,
    pub right: Vec<ParCmd<M, S>>,
}

impl<M: Clone, S> Clone for ParallelProgram<M, S> {
    fn clone(&self) -> Self {
        ParallelProgram {
            initial: self.initial.clone(),
            prefix: self.prefix.clone(),
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl<M, S> Debug for ParallelProgram<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelProgram")
            .field("prefix", &self.prefix)
            .field("left", &self.left)
            .field("right", &self.right)
            .finish()
    }
}

/// Factory for thread-safe commands, given the current model state.
pub type ParallelFactory<M, S> =
    Rc<dyn Fn(&M, Source, Size) -> Result<ParCmd<M, S>, GenerationError>>;

/// Generate parallel programs: a legal prefix, then two suffixes that are
/// each individually legal against the post-prefix model.
///
/// Shrinking removes commands (prefix chunks, then left, then right
/// elements); a removal that leaves an illegal program is filtered out.
pub fn parallel_program_of<M, S>(
    initial: M,
    factory: ParallelFactory<M, S>,
) -> Gen<ParallelProgram<M, S>>
where
    M: Clone + 'static,
    S: 'static,
{
    Gen::new(move |source, size| {
        let (mut counts, mut rest) = source.split();
        let prefix_len = counts.next_below(size as u64 + 1) as usize;
        let branch_len = (MAX_PARALLEL_COMMANDS / 2) as u64 + 1;
        let left_len = counts.next_below(branch_len) as usize;
        let right_len = counts.next_below(branch_len) as usize;

        let mut model = initial.clone();
        let mut prefix = Vec::with_capacity(prefix_len);
        for _ in 0..prefix_len {
            let command = draw_legal(&factory, &model, &mut rest, size)?;
            command.apply(&mut model);
            prefix.push(command);
        }
        // Both suffixes are generated against the post-prefix model; whether
        // they stay legal when interleaved is exactly what the test explores.
        let mut left = Vec::with_capacity(left_len);
        for _ in 0..left_len {
            left.push(draw_legal(&factory, &model, &mut rest, size)?);
        }
        let mut right = Vec::with_capacity(right_len);
        for _ in 0..right_len {
            right.push(draw_legal(&factory, &model, &mut rest, size)?);
        }

        let program = ParallelProgram {
            initial: initial.clone(),
            prefix,
            left,
            right,
        };
        Ok(Shrinkable::unfold(program, expand_removals))
    })
}

fn draw_legal<M, S>(
    factory: &ParallelFactory<M, S>,
    model: &M,
    rest: &mut Source,
    size: Size,
) -> Result<ParCmd<M, S>, GenerationError> {
    for _ in 0..MAX_COMMAND_RETRIES {
        let (sub, next) = rest.clone().split();
        *rest = next;
        let candidate = factory(model, sub, size)?;
        if candidate.precondition(model) {
            return Ok(candidate);
        }
    }
    Err(GenerationError::retries_exhausted(
        "a legal parallel command",
        MAX_COMMAND_RETRIES,
    ))
}

/// Removal-only shrink candidates: drop one command from the prefix, the left
/// suffix, or the right suffix, keeping only programs whose prefix is still
/// legal.
fn expand_removals<M, S>(
    program: &ParallelProgram<M, S>,
) -> arbor::Sequence<ParallelProgram<M, S>>
where
    M: Clone + 'static,
    S: 'static,
{
    let mut candidates = Vec::new();
    for i in 0..program.prefix.len() {
        let mut shrunk = program.clone();
        shrunk.prefix.remove(i);
        if prefix_is_legal(&shrunk) {
            candidates.push(shrunk);
        }
    }
    for i in 0..program.left.len() {
        let mut shrunk = program.clone();
        shrunk.left.remove(i);
        candidates.push(shrunk);
    }
    for i in 0..program.right.len() {
        let mut shrunk = program.clone();
        shrunk.right.remove(i);
        candidates.push(shrunk);
    }
    arbor::Sequence::from_vec(candidates)
}

fn prefix_is_legal<M: Clone, S>(program: &ParallelProgram<M, S>) -> bool {
    let mut model = program.initial.clone();
    for command in &program.prefix {
        if !command.precondition(&model) {
            return false;
        }
        command.apply(&mut model);
    }
    true
}

/// Search for an interleaving of `left` and `right` that is legal against the
/// model from `model` onwards.
///
/// Exhaustive depth-first merge; with both suffixes bounded by
/// [`MAX_PARALLEL_COMMANDS`] the search is small.
pub fn verify_interleavings<M, S>(model: &M, left: &[ParCmd<M, S>], right: &[ParCmd<M, S>]) -> bool
where
    M: Clone,
{
    if left.is_empty() && right.is_empty() {
        return true;
    }
    if let Some((head, tail)) = left.split_first() {
        if head.precondition(model) {
            let mut next = model.clone();
            head.apply(&mut next);
            if verify_interleavings(&next, tail, right) {
                return true;
            }
        }
    }
    if let Some((head, tail)) = right.split_first() {
        if head.precondition(model) {
            let mut next = model.clone();
            head.apply(&mut next);
            if verify_interleavings(&next, left, tail) {
                return true;
            }
        }
    }
    false
}

/// Run a parallel program against one SUT instance.
///
/// The prefix runs on the calling thread; the suffixes run on two scoped
/// worker threads released together by a barrier. Afterwards the recorded
/// structure is verified single-threadedly: the run fails if any command's
/// own assertions failed, a worker panicked, or no legal interleaving of the
/// two suffixes exists.
pub fn run_parallel<M, S>(program: &ParallelProgram<M, S>, sut: S) -> Verdict
where
    M: Clone + Sync,
    S: Send,
{
    let sut = Mutex::new(sut);
    let mut model = program.initial.clone();
    for (position, command) in program.prefix.iter().enumerate() {
        if !command.precondition(&model) {
            return Verdict::discard(format!("prefix command {} became illegal", position));
        }
        if let Err(message) = command.run_concurrent(&sut) {
            return Verdict::fail(format!("prefix command {} failed: {}", position, message));
        }
        command.apply(&mut model);
    }

    let barrier = Barrier::new(2);
    let run_branch = |commands: &[ParCmd<M, S>]| -> Result<(), String> {
        barrier.wait();
        for command in commands {
            command.run_concurrent(&sut)?;
        }
        Ok(())
    };

    let outcome = crossbeam::thread::scope(|scope| {
        let left = scope.spawn(|_| run_branch(&program.left));
        let right = scope.spawn(|_| run_branch(&program.right));
        let left = left.join();
        let right = right.join();
        (left, right)
    });

    match outcome {
        Ok((Ok(Ok(())), Ok(Ok(())))) => {}
        Ok((Ok(Err(message)), _)) | Ok((_, Ok(Err(message)))) => {
            return Verdict::fail(format!("parallel command failed: {}", message));
        }
        Ok(_) | Err(_) => {
            return Verdict::fail("a parallel worker panicked".to_string());
        }
    }

    if verify_interleavings(&model, &program.left, &program.right) {
        Verdict::Pass
    } else {
        Verdict::fail("no legal interleaving of the parallel suffixes exists".to_string())
    }
}
