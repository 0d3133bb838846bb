//! Tab-completion suggestions.
//!
//! Runs the resolve and scan phases in a forgiving mode: validation is
//! skipped, and a scan error only suppresses suggestions when it happened
//! before the last token. An error on the last token is usually the word
//! the user is still typing.

use crate::model::CommandTree;
use crate::parser::{resolve_command, scan_tokens};
use crate::value::{Value, ValueType};

/// Suggestions for the next word after `tokens`.
///
/// Unused options of the resolved command come first, as flags. When the
/// next positional slot is a boolean argument, `true` and `false` follow.
pub fn complete(tree: &CommandTree, tokens: &[Value]) -> Vec<String> {
    let (command, consumed) = resolve_command(tree, tokens);
    let scan = scan_tokens(tree, command, tokens, consumed);

    if let Some((position, _)) = &scan.error
        && position + 1 != tokens.len()
    {
        return Vec::new();
    }

    let node = tree.node(command);
    let mut suggestions: Vec<String> = node
        .options
        .iter()
        .filter(|option| !scan.options.contains_key(&option.rep))
        .map(|option| option.flag())
        .collect();

    let next_argument = node.arguments.get(scan.arguments.len());
    if next_argument.is_some_and(|arg| arg.value_type == ValueType::Boolean) {
        suggestions.push("true".to_string());
        suggestions.push("false".to_string());
    }

    suggestions
}
