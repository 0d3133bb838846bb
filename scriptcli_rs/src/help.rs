//! Help and version text for command trees.
//!
//! Output is deterministic: a header naming the command path, then the
//! general block, `Commands:`, `Arguments:` and `Options:` sections
//! separated by blank lines. Empty sections are left out.

use crate::model::{ArgumentSpec, CommandTree, NodeId, OptionSpec, convert_option_rep};
use crate::value::Value;

const INDENT: &str = "  ";

/// Full help text for `node`.
pub fn render_help(tree: &CommandTree, node: NodeId) -> String {
    let command = tree.node(node);

    let mut general = String::new();
    if let Some(version) = &command.version {
        general.push_str(&format!("Version: v{}\n\n", version));
    }
    general.push_str(
        command
            .description
            .as_deref()
            .unwrap_or("No description provided."),
    );

    let mut sections = vec![general];

    if !command.commands.is_empty() {
        let lines: Vec<String> = command
            .commands
            .iter()
            .map(|&child| format!("{}{}", INDENT, subcommand_display(tree, child)))
            .collect();
        sections.push(format!("Commands:\n{}", lines.join("\n")));
    }

    if !command.arguments.is_empty() {
        let lines: Vec<String> = command
            .arguments
            .iter()
            .flat_map(argument_display)
            .map(|line| format!("{}{}", INDENT, line))
            .collect();
        sections.push(format!("Arguments:\n{}", lines.join("\n")));
    }

    if !command.options.is_empty() {
        let lines: Vec<String> = command
            .options
            .iter()
            .flat_map(option_display)
            .map(|line| format!("{}{}", INDENT, line))
            .collect();
        sections.push(format!("Options:\n{}", lines.join("\n")));
    }

    format!(
        "Help for {}:\n{}",
        tree.display_name(node),
        sections.join("\n\n")
    )
}

/// One-line version banner for `node`.
pub fn render_version(tree: &CommandTree, node: NodeId) -> String {
    let name = tree.display_name(node);
    match &tree.node(node).version {
        Some(version) => format!("{} v{}", name, version),
        None => format!("No version specified for {}", name),
    }
}

/// `name: description` line for a sub-command listing.
pub fn subcommand_display(tree: &CommandTree, node: NodeId) -> String {
    let command = tree.node(node);
    match &command.description {
        Some(description) => format!("{}: {}", command.name, description),
        None => command.name.clone(),
    }
}

/// Lines describing a positional argument. The first line is the
/// signature, continuation lines start with `: `.
pub fn argument_display(argument: &ArgumentSpec) -> Vec<String> {
    let mut lines = vec![format!("<{}> ({})", argument.name, argument.value_type)];
    lines.extend(
        [
            argument.description.clone(),
            choices_display(&argument.choices),
        ]
        .into_iter()
        .flatten()
        .map(|detail| format!("{}: {}", INDENT, detail)),
    );
    lines
}

/// Lines describing an option, in the same shape as [`argument_display`].
pub fn option_display(option: &OptionSpec) -> Vec<String> {
    let flags: Vec<String> = option.names().map(convert_option_rep).collect();
    let mut signature = format!("{} <{}>", flags.join(", "), option.value_type);
    if option.required {
        signature.push_str(" (required)");
    }

    let mut lines = vec![signature];
    lines.extend(
        [
            option.description.clone(),
            choices_display(&option.choices),
            option.default.as_ref().map(|d| format!("Default: {}", d)),
        ]
        .into_iter()
        .flatten()
        .map(|detail| format!("{}: {}", INDENT, detail)),
    );
    lines
}

fn choices_display(choices: &[Value]) -> Option<String> {
    if choices.is_empty() {
        return None;
    }
    let rendered: Vec<String> = choices.iter().map(Value::quoted).collect();
    Some(format!("Choices: [{}]", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CommandBuilder;
    use crate::value::ValueType;
    use pretty_assertions::assert_eq;

    fn tree() -> CommandTree {
        CommandBuilder::new("net.js")
            .name("net")
            .version("2.0")
            .description("Network utilities")
            .option(
                OptionSpec::new("mode", ValueType::String)
                    .synonyms(["m"])
                    .choices(["fast", "safe"])
                    .default("safe")
                    .description("Scan mode"),
            )
            .required_option(OptionSpec::new("tries", ValueType::Number))
            .command(|c| c.name("scan").description("Scan hosts").action("scan"))
            .command(|c| {
                c.name("ping")
                    .argument(
                        ArgumentSpec::new("host", ValueType::String).description("Target host"),
                    )
                    .argument(ArgumentSpec::new("loud", ValueType::Boolean))
                    .action("ping")
            })
            .build()
            .expect("valid tree")
    }

    #[test]
    fn test_root_help_layout() {
        let tree = tree();
        let expected = "Help for net:
Version: v2.0

Network utilities

Commands:
  scan: Scan hosts
  ping

Options:
  --mode, -m <string>
    : Scan mode
    : Choices: ['fast', 'safe']
    : Default: safe
  --tries <number> (required)";
        assert_eq!(render_help(&tree, tree.root()), expected);
    }

    #[test]
    fn test_subcommand_help_omits_empty_sections() {
        let tree = tree();
        let ping = tree.find(&["ping"]).expect("ping exists");
        let expected = "Help for net/ping:
No description provided.

Arguments:
  <host> (string)
    : Target host
  <loud> (boolean)";
        assert_eq!(render_help(&tree, ping), expected);
    }

    #[test]
    fn test_version_banner() {
        let tree = tree();
        assert_eq!(render_version(&tree, tree.root()), "net v2.0");
        let scan = tree.find(&["scan"]).expect("scan exists");
        assert_eq!(render_version(&tree, scan), "No version specified for net/scan");
    }
}
