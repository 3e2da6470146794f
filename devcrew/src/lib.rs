//! Two-agent code generation pipeline with a confirmation-gated sandbox.
//!
//! A junior developer agent turns an operator requirement into Python code, a
//! CTO agent reviews it, and the code may then run once in a throwaway
//! sandbox. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure types and decisions (execution results, confirmation
//!   parsing). No I/O.
//! - **[`io`]**: Side-effecting operations (config, LLM provider, process
//!   execution, sandbox, log sinks, console).
//! - **[`agents`]**: Agent personas and the sequential crew that drives them
//!   through a [`io::provider::TextCompletionProvider`].
//!
//! [`pipeline`] wires the stages together for the `devcrew run` command.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
