//! Token parsing against a [`CommandTree`].
//!
//! Parsing runs in three phases:
//!
//! 1. **Resolve** - leading tokens naming sub-commands are consumed until one
//!    does not match; the deepest match is the active command.
//! 2. **Scan** - remaining tokens are split into positional values, options,
//!    special flags (`--help`, `--version`) and reserved runtime flags
//!    (`-t`, `--ram-override`) which belong to the caller.
//! 3. **Validate** - defaults, required options, positional count, types and
//!    choices. Skipped entirely when a special flag was seen.
//!
//! The scan phase keeps whatever it managed to collect when it fails, which
//! is what [`crate::completion`] builds on.

use std::collections::BTreeMap;

use strsim::levenshtein;
use tracing::debug;

use crate::error::ParseError;
use crate::model::{CommandNode, CommandTree, NodeId, OptionSpec, convert_option_rep, strip_dashes};
use crate::value::{Value, ValueType, infer_all};

pub const HELP_FLAG: &str = "--help";
pub const VERSION_FLAG: &str = "--version";

/// Flags interpreted by the script launcher, not by the program.
pub const RESERVED_FLAGS: &[&str] = &["-t", "--ram-override"];

/// Flags that replace normal execution with printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFlag {
    Help,
    Version,
}

impl SpecialFlag {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            HELP_FLAG => Some(SpecialFlag::Help),
            VERSION_FLAG => Some(SpecialFlag::Version),
            _ => None,
        }
    }
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: NodeId,
    /// Display path of the active command, e.g. `worm/guess/path`.
    pub path: String,
    pub arguments: Vec<Value>,
    /// Option values keyed by the option's primary name.
    pub options: BTreeMap<String, Value>,
    pub special: Vec<SpecialFlag>,
    /// Reserved launcher flags with the value that followed them, if any.
    pub reserved: Vec<(String, Option<Value>)>,
}

impl Invocation {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    pub fn option_number(&self, name: &str) -> Option<f64> {
        self.option(name).and_then(Value::as_number)
    }

    /// Boolean option value; absent counts as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arg(index).and_then(Value::as_str)
    }

    pub fn arg_number(&self, index: usize) -> Option<f64> {
        self.arg(index).and_then(Value::as_number)
    }

    pub fn arg_bool(&self, index: usize) -> Option<bool> {
        self.arg(index).and_then(Value::as_bool)
    }

    pub fn first_special(&self) -> Option<SpecialFlag> {
        self.special.first().copied()
    }
}

/// Partial state of the scan phase.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub arguments: Vec<Value>,
    pub options: BTreeMap<String, Value>,
    pub special: Vec<SpecialFlag>,
    pub reserved: Vec<(String, Option<Value>)>,
    /// First error and the absolute index of the token that caused it.
    pub error: Option<(usize, ParseError)>,
}

/// Parse typed tokens against `tree`.
pub fn parse(tree: &CommandTree, tokens: &[Value]) -> Result<Invocation, ParseError> {
    let (command, consumed) = resolve_command(tree, tokens);
    let mut scan = scan_tokens(tree, command, tokens, consumed);
    if let Some((_, err)) = scan.error.take() {
        return Err(err);
    }

    if scan.special.is_empty() {
        validate(tree, command, &mut scan)?;
    }

    let path = tree.display_name(command);
    debug!(command = %path, args = scan.arguments.len(), "parsed invocation");
    Ok(Invocation {
        command,
        path,
        arguments: scan.arguments,
        options: scan.options,
        special: scan.special,
        reserved: scan.reserved,
    })
}

/// Walk sub-command names from the front of `tokens`.
///
/// Returns the active command and how many tokens named sub-commands.
pub fn resolve_command(tree: &CommandTree, tokens: &[Value]) -> (NodeId, usize) {
    let mut current = tree.root();
    let mut consumed = 0;
    while let Some(Value::String(name)) = tokens.get(consumed) {
        match tree.child(current, name) {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => break,
        }
    }
    (current, consumed)
}

/// Type raw shell words for `tree`.
///
/// Same as [`infer_all`], except that words landing in a positional
/// argument or option value declared as `string` keep their exact text, so
/// `007` or `+5` reach a string slot unchanged.
pub fn infer_for_tree<S: AsRef<str>>(tree: &CommandTree, raw: &[S]) -> Vec<Value> {
    let mut tokens = infer_all(raw);
    let (command, start) = resolve_command(tree, &tokens);
    let node = tree.node(command);
    let keep_raw = |tokens: &mut Vec<Value>, i: usize| {
        if let Some(word) = raw.get(i) {
            tokens[i] = Value::String(word.as_ref().to_string());
        }
    };

    let mut slot = 0;
    let mut i = start;
    while i < tokens.len() {
        let flag = match &tokens[i] {
            Value::String(text) if text.starts_with('-') => Some(text.clone()),
            _ => None,
        };
        let Some(text) = flag else {
            if node
                .arguments
                .get(slot)
                .is_some_and(|arg| arg.value_type == ValueType::String)
            {
                keep_raw(&mut tokens, i);
            }
            slot += 1;
            i += 1;
            continue;
        };

        if SpecialFlag::from_token(&text).is_some() {
            i += 1;
            continue;
        }
        if RESERVED_FLAGS.contains(&text.as_str()) {
            let has_value = tokens.get(i + 1).is_some_and(|v| !v.is_flag_like());
            i += if has_value { 2 } else { 1 };
            continue;
        }
        let Some(option) = node.find_option(strip_dashes(&text)) else {
            break;
        };
        match option.value_type {
            ValueType::Boolean => {
                let has_value = matches!(tokens.get(i + 1), Some(Value::Boolean(_)));
                i += if has_value { 2 } else { 1 };
            }
            ValueType::String => {
                if i + 1 < tokens.len() {
                    keep_raw(&mut tokens, i + 1);
                }
                i += 2;
            }
            ValueType::Number => i += 2,
        }
    }
    tokens
}

pub(crate) fn scan_tokens(
    tree: &CommandTree,
    command: NodeId,
    tokens: &[Value],
    start: usize,
) -> Scan {
    let node = tree.node(command);
    let mut scan = Scan::default();
    let mut i = start;

    while i < tokens.len() {
        let token = &tokens[i];
        let Value::String(text) = token else {
            scan.arguments.push(token.clone());
            i += 1;
            continue;
        };
        if !text.starts_with('-') {
            scan.arguments.push(token.clone());
            i += 1;
            continue;
        }

        if let Some(flag) = SpecialFlag::from_token(text) {
            scan.special.push(flag);
            i += 1;
            continue;
        }

        if RESERVED_FLAGS.contains(&text.as_str()) {
            let value = tokens.get(i + 1).filter(|v| !v.is_flag_like()).cloned();
            i += if value.is_some() { 2 } else { 1 };
            scan.reserved.push((text.clone(), value));
            continue;
        }

        let Some(option) = node.find_option(strip_dashes(text)) else {
            let err = ParseError::UnknownOption {
                token: text.clone(),
                command: tree.display_name(command),
                suggestion: suggest_option(node, strip_dashes(text)),
            };
            scan.error = Some((i, err));
            return scan;
        };

        let next = tokens.get(i + 1);
        if option.value_type == ValueType::Boolean && !matches!(next, Some(Value::Boolean(_))) {
            scan.options.insert(option.rep.clone(), Value::Boolean(true));
            i += 1;
            continue;
        }

        match check_option_value(tree, command, option, text, next) {
            Ok(value) => {
                scan.options.insert(option.rep.clone(), value);
                i += 2;
            }
            Err(err) => {
                let position = if next.is_some() { i + 1 } else { i };
                scan.error = Some((position, err));
                return scan;
            }
        }
    }

    scan
}

fn check_option_value(
    tree: &CommandTree,
    command: NodeId,
    option: &OptionSpec,
    token: &str,
    next: Option<&Value>,
) -> Result<Value, ParseError> {
    let value = match next {
        Some(v) if v.is_type(option.value_type) => v,
        _ => {
            return Err(ParseError::OptionType {
                token: token.to_string(),
                expected: option.value_type,
                got: next.cloned(),
            });
        }
    };
    if !option.accepts(value) {
        return Err(ParseError::OptionChoice {
            value: value.clone(),
            option: option.flag(),
            command: tree.display_name(command),
        });
    }
    Ok(value.clone())
}

fn validate(tree: &CommandTree, command: NodeId, scan: &mut Scan) -> Result<(), ParseError> {
    let node = tree.node(command);

    for option in &node.options {
        if scan.options.contains_key(&option.rep) {
            continue;
        }
        match &option.default {
            Some(default) => {
                scan.options.insert(option.rep.clone(), default.clone());
            }
            None if option.required => {
                return Err(ParseError::RequiredOption {
                    option: option.flag(),
                    command: tree.display_name(command),
                });
            }
            None => {}
        }
    }

    let expected = node.arguments.len();
    let given = scan.arguments.len();
    if given > expected {
        return Err(ParseError::TooManyArguments {
            command: tree.display_name(command),
        });
    }
    if let Some(missing) = node.arguments.get(given) {
        return Err(ParseError::MissingArgument {
            argument: missing.name.clone(),
            command: tree.display_name(command),
        });
    }

    for (spec, value) in node.arguments.iter().zip(&scan.arguments) {
        if !value.is_type(spec.value_type) {
            return Err(ParseError::ArgumentType {
                argument: spec.name.clone(),
                expected: spec.value_type,
                got: value.clone(),
            });
        }
        if !spec.accepts(value) {
            return Err(ParseError::ArgumentChoice {
                value: value.clone(),
                argument: spec.name.clone(),
                command: tree.display_name(command),
            });
        }
    }

    Ok(())
}

/// Closest option flag within edit distance 2.
fn suggest_option(node: &CommandNode, input: &str) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for option in &node.options {
        for name in option.names() {
            let distance = levenshtein(input, name);
            if distance > 2 {
                continue;
            }
            match best {
                Some((_, best_dist)) if distance >= best_dist => {}
                _ => best = Some((name, distance)),
            }
        }
    }
    best.map(|(name, _)| convert_option_rep(name))
}
