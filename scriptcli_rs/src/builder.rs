//! Fluent construction of command trees.
//!
//! ```
//! use scriptcli::{ArgumentSpec, CommandBuilder, OptionSpec, ValueType};
//!
//! let tree = CommandBuilder::new("deploy.js")
//!     .name("deploy")
//!     .version("1.2.0")
//!     .option(OptionSpec::new("v", ValueType::Number).choices([1, 2, 3]).default(2))
//!     .command(|c| {
//!         c.name("push")
//!             .argument(ArgumentSpec::new("host", ValueType::String))
//!             .action("push")
//!     })
//!     .build()
//!     .unwrap();
//!
//! let push = tree.find(&["push"]).unwrap();
//! assert_eq!(tree.display_name(push), "deploy/push");
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::error::BuildError;
use crate::model::{
    ActionKey, ArgumentSpec, CommandNode, CommandTree, NodeId, OptionSpec, strip_dashes,
};
use crate::parser::{HELP_FLAG, RESERVED_FLAGS, VERSION_FLAG};

/// Accumulates a command definition; [`CommandBuilder::build`] validates and freezes it.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    script: String,
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    options: Vec<OptionSpec>,
    arguments: Vec<ArgumentSpec>,
    commands: Vec<CommandBuilder>,
    action: Option<ActionKey>,
}

impl CommandBuilder {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            name: None,
            description: None,
            version: None,
            options: Vec::new(),
            arguments: Vec::new(),
            commands: Vec::new(),
            action: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Same as [`CommandBuilder::option`] but the option must be supplied
    /// (or carry a default).
    pub fn required_option(mut self, mut option: OptionSpec) -> Self {
        option.required = true;
        self.options.push(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Declare a sub-command. The closure receives a fresh builder for the
    /// same script and returns it configured.
    pub fn command<F>(mut self, define: F) -> Self
    where
        F: FnOnce(CommandBuilder) -> CommandBuilder,
    {
        let child = define(CommandBuilder::new(self.script.clone()));
        self.commands.push(child);
        self
    }

    /// Bind this command to the action registered under `key`.
    pub fn action(mut self, key: impl Into<ActionKey>) -> Self {
        self.action = Some(key.into());
        self
    }

    pub fn build(self) -> Result<CommandTree, BuildError> {
        let script = self.script.clone();
        let mut nodes = Vec::new();
        let root = insert_node(&mut nodes, self, None, None)?;
        debug!(script = %script, nodes = nodes.len(), "built command tree");
        Ok(CommandTree {
            script,
            nodes,
            root,
        })
    }
}

fn insert_node(
    nodes: &mut Vec<CommandNode>,
    builder: CommandBuilder,
    parent: Option<NodeId>,
    parent_path: Option<&str>,
) -> Result<NodeId, BuildError> {
    let name = builder
        .name
        .filter(|n| !n.is_empty())
        .ok_or(BuildError::MissingName)?;
    let path = match parent_path {
        Some(p) => format!("{}/{}", p, name),
        None => name.clone(),
    };

    if builder.commands.is_empty() && builder.action.is_none() {
        return Err(BuildError::NoAction { command: path });
    }
    validate_options(&path, &builder.options)?;

    let id = NodeId(nodes.len());
    nodes.push(CommandNode {
        name,
        description: builder.description,
        version: builder.version,
        options: builder.options,
        arguments: builder.arguments,
        commands: Vec::new(),
        action: builder.action,
        parent,
    });

    let mut children = Vec::with_capacity(builder.commands.len());
    for child in builder.commands {
        children.push(insert_node(nodes, child, Some(id), Some(&path))?);
    }
    nodes[id.0].commands = children;

    Ok(id)
}

fn validate_options(path: &str, options: &[OptionSpec]) -> Result<(), BuildError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for option in options {
        for name in option.names() {
            if is_intercepted(name) {
                return Err(BuildError::ReservedOption {
                    command: path.to_string(),
                    option: name.to_string(),
                });
            }
            if !seen.insert(name) {
                return Err(BuildError::DuplicateOption {
                    command: path.to_string(),
                    option: name.to_string(),
                });
            }
        }

        let Some(default) = &option.default else {
            continue;
        };
        if !default.is_type(option.value_type) {
            return Err(BuildError::DefaultTypeMismatch {
                command: path.to_string(),
                option: option.flag(),
                expected: option.value_type,
            });
        }
        if !option.accepts(default) {
            return Err(BuildError::DefaultNotInChoices {
                command: path.to_string(),
                option: option.flag(),
                default: default.quoted(),
            });
        }
    }
    Ok(())
}

/// Names the parser consumes before option lookup.
fn is_intercepted(name: &str) -> bool {
    RESERVED_FLAGS
        .iter()
        .chain([HELP_FLAG, VERSION_FLAG].iter())
        .any(|flag| strip_dashes(flag) == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueType};

    fn leaf(name: &str) -> CommandBuilder {
        CommandBuilder::new("test.js").name(name).action(name)
    }

    #[test]
    fn test_build_requires_name() {
        let err = CommandBuilder::new("test.js").action("x").build().unwrap_err();
        assert_eq!(err, BuildError::MissingName);
    }

    #[test]
    fn test_build_requires_action_or_commands() {
        let err = CommandBuilder::new("test.js").name("prog").build().unwrap_err();
        assert_eq!(
            err,
            BuildError::NoAction {
                command: "prog".into()
            }
        );
    }

    #[test]
    fn test_nested_leaf_without_action_names_full_path() {
        let err = CommandBuilder::new("test.js")
            .name("prog")
            .command(|c| c.name("sub").command(|c| c.name("leaf")))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::NoAction {
                command: "prog/sub/leaf".into()
            }
        );
    }

    #[test]
    fn test_default_must_be_a_choice() {
        let err = leaf("prog")
            .option(
                OptionSpec::new("v", ValueType::Number)
                    .choices([1, 2, 3])
                    .default(5),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::DefaultNotInChoices { .. }));
    }

    #[test]
    fn test_default_without_choices_is_accepted() {
        let tree = leaf("prog")
            .option(OptionSpec::new("n", ValueType::Number).default(7))
            .build()
            .expect("valid tree");
        let root = tree.node(tree.root());
        assert_eq!(root.options[0].default, Some(Value::Number(7.0)));
    }

    #[test]
    fn test_default_type_checked() {
        let err = leaf("prog")
            .option(OptionSpec::new("n", ValueType::Number).default("seven"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::DefaultTypeMismatch { .. }));
    }

    #[test]
    fn test_duplicate_synonym_rejected() {
        let err = leaf("prog")
            .option(OptionSpec::new("verbose", ValueType::Boolean).synonyms(["v"]))
            .option(OptionSpec::new("v", ValueType::Number))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateOption {
                command: "prog".into(),
                option: "v".into()
            }
        );
    }

    #[test]
    fn test_parent_links_and_script_shared() {
        let tree = CommandBuilder::new("test.js")
            .name("prog")
            .command(|c| {
                c.name("a")
                    .command(|c| c.name("deep").action("deep"))
            })
            .command(|c| c.name("b").action("b"))
            .build()
            .expect("valid tree");

        assert_eq!(tree.len(), 4);
        let deep = tree.find(&["a", "deep"]).expect("deep exists");
        assert_eq!(tree.display_name(deep), "prog/a/deep");
        let a = tree.find(&["a"]).expect("a exists");
        assert_eq!(tree.node(deep).parent, Some(a));
        assert_eq!(tree.node(a).parent, Some(tree.root()));
        assert_eq!(tree.script, "test.js");
        assert!(tree.find(&["b", "deep"]).is_none());
    }

    #[test]
    fn test_required_option_sets_required_flag() {
        let tree = leaf("prog")
            .required_option(OptionSpec::new("target", ValueType::String))
            .build()
            .expect("valid tree");
        assert!(tree.node(tree.root()).options[0].required);
    }

    #[test]
    fn test_launcher_and_special_names_rejected() {
        for name in ["t", "ram-override", "help", "version"] {
            let err = leaf("prog")
                .option(OptionSpec::new(name, ValueType::Number))
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                BuildError::ReservedOption {
                    command: "prog".into(),
                    option: name.into()
                }
            );
        }
    }

    #[test]
    fn test_reserved_synonym_rejected() {
        let err = leaf("prog")
            .command(|c| {
                c.name("run").action("run").required_option(
                    OptionSpec::new("threads", ValueType::Number).synonyms(["t"]),
                )
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::ReservedOption {
                command: "prog/run".into(),
                option: "t".into()
            }
        );
    }
}
