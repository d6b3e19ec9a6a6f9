//! Replaying command sequences against a system under test.

use std::fmt::Debug;

use arbor::{Case, Config, TestResult, Verdict, check_with_config};

use crate::command::CommandSequence;
use crate::generator::{CommandFactory, commands_of};

/// Replay a sequence against one SUT instance.
///
/// The model is threaded alongside: each command sees the model state as it
/// stood before it ran, so its assertions can compare the system's observed
/// behavior with the modeled one. The SUT is owned by this replay; callers
/// provide a fresh instance per replay.
pub fn run_sequence<M, S>(seq: &CommandSequence<M, S>, sut: &mut S) -> Verdict
where
    M: Clone + 'static,
    S: 'static,
{
    let mut model = seq.initial.clone();
    for (position, entry) in seq.entries.iter().enumerate() {
        let command = entry.command.value();
        if !command.precondition(&model) {
            // Shrink-time filtering should make this unreachable; treat a
            // slipped-through illegal step as a discard, not a failure.
            return Verdict::discard(format!(
                "command {} precondition failed during replay",
                position
            ));
        }
        if let Err(message) = command.run(sut, &model) {
            return Verdict::fail(format!(
                "command {} ({:?}) failed: {}",
                position, command, message
            ));
        }
        command.apply(&mut model);
    }
    Verdict::Pass
}

/// Check a stateful system: generate command sequences, replay each against a
/// fresh SUT, and shrink failing sequences to a minimal legal script.
pub fn check_commands<M, S, F>(
    config: &Config,
    initial: M,
    factory: CommandFactory<M, S>,
    make_sut: F,
) -> TestResult
where
    M: Clone + Debug + 'static,
    S: 'static,
    F: Fn() -> S,
{
    let gen = commands_of(initial, factory);
    check_with_config(config, &gen, |_case: &mut Case, seq| {
        let mut sut = make_sut();
        run_sequence(seq, &mut sut)
    })
}
