//! Running a program: parse, print help/version, or call the bound action.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::RunError;
use crate::help::{render_help, render_version};
use crate::model::{ActionKey, CommandTree};
use crate::parser::{Invocation, SpecialFlag, infer_for_tree, parse};
use crate::value::Value;

/// Output sink of the hosting runtime (a terminal, a log, a test buffer).
pub trait Terminal {
    fn print(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Action callback: receives the caller's context and the parsed invocation.
pub type ActionFn<C> = Box<dyn Fn(&mut C, &Invocation) -> anyhow::Result<()>>;

/// Actions keyed by the [`ActionKey`]s stored in a [`CommandTree`].
pub struct ActionTable<C> {
    actions: HashMap<ActionKey, ActionFn<C>>,
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for ActionTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&ActionKey> = self.actions.keys().collect();
        keys.sort();
        f.debug_struct("ActionTable").field("keys", &keys).finish()
    }
}

impl<C> ActionTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `key`, replacing any previous binding.
    pub fn on<F>(mut self, key: impl Into<ActionKey>, action: F) -> Self
    where
        F: Fn(&mut C, &Invocation) -> anyhow::Result<()> + 'static,
    {
        self.actions.insert(key.into(), Box::new(action));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ActionFn<C>> {
        self.actions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }
}

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Dispatched(String),
    PrintedHelp,
    PrintedVersion,
    /// The input was rejected; the message went to [`Terminal::error`].
    Rejected(String),
}

/// Parse raw shell words and run the program.
///
/// User input errors are reported through `ctx` and never returned;
/// only programming errors and action failures come back as `Err`.
pub fn run_program<C, S>(
    tree: &CommandTree,
    actions: &ActionTable<C>,
    raw_args: &[S],
    ctx: &mut C,
) -> Result<Outcome, RunError>
where
    C: Terminal,
    S: AsRef<str>,
{
    run_tokens(tree, actions, &infer_for_tree(tree, raw_args), ctx)
}

/// Same as [`run_program`] for already typed tokens.
pub fn run_tokens<C: Terminal>(
    tree: &CommandTree,
    actions: &ActionTable<C>,
    tokens: &[Value],
    ctx: &mut C,
) -> Result<Outcome, RunError> {
    let invocation = match parse(tree, tokens) {
        Ok(invocation) => invocation,
        Err(err) => {
            let message = err.to_string();
            ctx.error(&message);
            return Ok(Outcome::Rejected(message));
        }
    };

    match invocation.first_special() {
        Some(SpecialFlag::Help) => {
            ctx.print(&render_help(tree, invocation.command));
            return Ok(Outcome::PrintedHelp);
        }
        Some(SpecialFlag::Version) => {
            ctx.print(&render_version(tree, invocation.command));
            return Ok(Outcome::PrintedVersion);
        }
        None => {}
    }

    dispatch(tree, actions, &invocation, ctx)?;
    Ok(Outcome::Dispatched(invocation.path))
}

/// Call the action bound to the invocation's command, falling back to the
/// nearest ancestor's action.
pub fn dispatch<C>(
    tree: &CommandTree,
    actions: &ActionTable<C>,
    invocation: &Invocation,
    ctx: &mut C,
) -> Result<(), RunError> {
    let missing = || RunError::MissingAction {
        command: invocation.path.clone(),
    };
    let key = tree.resolve_action(invocation.command).ok_or_else(missing)?;
    let action = actions.get(key).ok_or_else(missing)?;

    debug!(command = %invocation.path, action = %key, "dispatching");
    action(ctx, invocation).map_err(|error| RunError::Action {
        command: invocation.path.clone(),
        error,
    })
}
