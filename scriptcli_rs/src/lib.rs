//! # scriptcli
//!
//! **Declarative command trees for in-game scripts.** A script declares its
//! program once (options, positional arguments, nested sub-commands) and
//! hands the raw shell words to [`run_program`], which resolves the
//! sub-command, binds and validates values, prints help/version text, or
//! calls the bound action.
//!
//! ## Features
//!
//! - **Typed values** - `string`, `number` and `boolean` options and arguments
//!   with choices and defaults, validated at build time
//! - **Nested sub-commands** - `prog/sub/leaf` resolution with action fallback
//!   to the nearest ancestor
//! - **Friendly errors** - exact user-facing messages, with "did you mean"
//!   hints for misspelled options
//! - **Completion** - suggestions for the next word of a partial command line
//!
//! ## Quick Start
//!
//! ```rust
//! use scriptcli::{
//!     ActionTable, ArgumentSpec, CommandBuilder, Invocation, OptionSpec, Terminal, ValueType,
//!     run_program,
//! };
//!
//! #[derive(Default)]
//! struct Console(Vec<String>);
//!
//! impl Terminal for Console {
//!     fn print(&mut self, message: &str) {
//!         self.0.push(message.to_string());
//!     }
//!     fn error(&mut self, message: &str) {
//!         self.0.push(format!("ERROR: {message}"));
//!     }
//! }
//!
//! let tree = CommandBuilder::new("greet.js")
//!     .name("greet")
//!     .option(OptionSpec::new("times", ValueType::Number).default(1))
//!     .argument(ArgumentSpec::new("who", ValueType::String))
//!     .action("greet")
//!     .build()
//!     .unwrap();
//!
//! let actions = ActionTable::new().on("greet", |console: &mut Console, inv: &Invocation| {
//!     for _ in 0..inv.option_number("times").unwrap_or(1.0) as usize {
//!         console.print(&format!("hello {}", inv.arg_str(0).unwrap_or_default()));
//!     }
//!     Ok(())
//! });
//!
//! let mut console = Console::default();
//! run_program(&tree, &actions, &["world", "--times", "2"], &mut console).unwrap();
//! assert_eq!(console.0, vec!["hello world", "hello world"]);
//! ```

/// Build, parse and dispatch errors.
pub mod error;

/// Typed runtime values and shell-word inference.
pub mod value;

/// Option, argument and command descriptors; the arena [`CommandTree`].
pub mod model;

/// Fluent [`CommandBuilder`] with build-time validation.
pub mod builder;

/// Resolve, scan and validate phases.
pub mod parser;

/// [`ActionTable`], [`Terminal`] and [`run_program`].
pub mod dispatch;

/// Help and version text.
pub mod help;

/// Next-word suggestions.
pub mod completion;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use builder::CommandBuilder;
pub use completion::complete;
pub use dispatch::{ActionFn, ActionTable, Outcome, Terminal, dispatch, run_program, run_tokens};
pub use error::{BuildError, ParseError, RunError};
pub use help::{render_help, render_version};
pub use model::{
    ActionKey, ArgumentSpec, CommandNode, CommandTree, NodeId, OptionSpec, convert_option_rep,
};
pub use parser::{Invocation, SpecialFlag, infer_for_tree, parse, resolve_command};
pub use value::{Value, ValueType, infer_all};
