//! # Arbor Stateful
//!
//! Stateful command testing for Arbor: model a system as a sequence of
//! commands - each with a precondition, a model transition, and a SUT-side
//! action with assertions - then generate random legal sequences, replay them
//! against the real system, and shrink failures down to a minimal legal
//! script.
//!
//! Generation threads the model state through the sequence so only legal
//! commands are ever appended. Shrinking removes chunks of commands and
//! simplifies individual commands, *repairing* the tail after every edit:
//! commands whose precondition no longer holds under the new trajectory are
//! dropped and the rest re-validated, so every candidate the shrink search
//! sees is a legal script.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::rc::Rc;
//! use arbor::{Config, Shrinkable};
//! use arbor_stateful::prelude::*;
//!
//! // The system under test.
//! #[derive(Debug, Default)]
//! struct Stack {
//!     items: Vec<i32>,
//! }
//!
//! // Commands over a model of the stack (its expected length).
//! #[derive(Debug)]
//! enum StackOp {
//!     Push(i32),
//!     Pop,
//! }
//!
//! impl Command<usize, Stack> for StackOp {
//!     fn precondition(&self, model: &usize) -> bool {
//!         match self {
//!             StackOp::Push(_) => true,
//!             StackOp::Pop => *model > 0,
//!         }
//!     }
//!
//!     fn apply(&self, model: &mut usize) {
//!         match self {
//!             StackOp::Push(_) => *model += 1,
//!             StackOp::Pop => *model -= 1,
//!         }
//!     }
//!
//!     fn run(&self, sut: &mut Stack, model: &usize) -> Result<(), String> {
//!         match self {
//!             StackOp::Push(v) => sut.items.push(*v),
//!             StackOp::Pop => {
//!                 sut.items.pop().ok_or("popped an empty stack")?;
//!             }
//!         }
//!         let expected = match self {
//!             StackOp::Push(_) => model + 1,
//!             StackOp::Pop => model - 1,
//!         };
//!         if sut.items.len() != expected {
//!             return Err(format!("length {} != expected {}", sut.items.len(), expected));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let factory: CommandFactory<usize, Stack> = Rc::new(|model, mut source, _size| {
//!     let op: CmdRc<usize, Stack> = if *model > 0 && source.next_below(2) == 1 {
//!         Rc::new(StackOp::Pop)
//!     } else {
//!         Rc::new(StackOp::Push(source.next_below(100) as i32))
//!     };
//!     Ok(Shrinkable::singleton(op))
//! });
//!
//! let config = Config::default().with_seed(1).with_max_success(25).with_max_size(10);
//! let result = check_commands(&config, 0usize, factory, Stack::default);
//! assert!(result.is_success());
//! ```

pub mod command;
pub mod generator;
pub mod parallel;
pub mod runner;
pub mod shrinking;

pub use command::{CmdRc, Command, CommandSequence, Entry};
pub use generator::{CommandFactory, MAX_COMMAND_RETRIES, commands_of};
pub use parallel::{
    MAX_PARALLEL_COMMANDS, ParCmd, ParallelCommand, ParallelFactory, ParallelProgram,
    parallel_program_of, run_parallel, verify_interleavings,
};
pub use runner::{check_commands, run_sequence};
pub use shrinking::{repair_entries, shrink_sequence};

/// Re-exports for convenient imports.
pub mod prelude {
    pub use crate::command::{CmdRc, Command, CommandSequence, Entry};
    pub use crate::generator::{CommandFactory, commands_of};
    pub use crate::parallel::{
        ParCmd, ParallelCommand, ParallelFactory, ParallelProgram, parallel_program_of,
        run_parallel, verify_interleavings,
    };
    pub use crate::runner::{check_commands, run_sequence};
    pub use crate::shrinking::shrink_sequence;
}
