//! Option, argument and command descriptors.
//!
//! A built program is a [`CommandTree`]: a flat arena of [`CommandNode`]s
//! where children and parents refer to each other by [`NodeId`]. The tree
//! holds no closures, only [`ActionKey`]s, so it can be serialized and
//! inspected in tests.

use serde::Serialize;

use crate::value::{Value, ValueType};

/// Index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Name under which an action is registered in an [`crate::ActionTable`].
pub type ActionKey = String;

/// Convert an option name into its flag form: `v` -> `-v`, `verbose` -> `--verbose`.
pub fn convert_option_rep(rep: &str) -> String {
    let dashes = if rep.chars().count() > 1 { "--" } else { "-" };
    format!("{}{}", dashes, rep)
}

/// Strip one or two leading dashes from a flag token.
pub(crate) fn strip_dashes(token: &str) -> &str {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token)
}

/// A named option (`-v 2`, `--name foo`, `--force`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    /// Primary name, without dashes. Also the key in the parsed option map.
    pub rep: String,
    pub synonyms: Vec<String>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub choices: Vec<Value>,
    pub default: Option<Value>,
    pub required: bool,
    pub description: Option<String>,
}

impl OptionSpec {
    pub fn new(rep: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            rep: rep.into(),
            synonyms: Vec::new(),
            value_type,
            choices: Vec::new(),
            default: None,
            required: false,
            description: None,
        }
    }

    pub fn synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True if `name` (already stripped of dashes) is the primary name or a synonym.
    pub fn matches(&self, name: &str) -> bool {
        self.rep == name || self.synonyms.iter().any(|s| s == name)
    }

    /// Every accepted name, primary first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.rep.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }

    pub fn flag(&self) -> String {
        convert_option_rep(&self.rep)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.choices.is_empty() || self.choices.contains(value)
    }
}

/// A positional argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub choices: Vec<Value>,
    pub description: Option<String>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            choices: Vec::new(),
            description: None,
        }
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.choices.is_empty() || self.choices.contains(value)
    }
}

/// One program or sub-command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandNode {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub options: Vec<OptionSpec>,
    pub arguments: Vec<ArgumentSpec>,
    pub commands: Vec<NodeId>,
    pub action: Option<ActionKey>,
    pub parent: Option<NodeId>,
}

impl CommandNode {
    pub fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches(name))
    }
}

/// A frozen command tree produced by [`crate::CommandBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandTree {
    /// Script the program belongs to. Shared by every node.
    pub script: String,
    pub(crate) nodes: Vec<CommandNode>,
    pub(crate) root: NodeId,
}

impl CommandTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct sub-command of `parent` named `name`.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .commands
            .iter()
            .copied()
            .find(|&c| self.node(c).name == name)
    }

    /// Follow a path of sub-command names from the root.
    pub fn find(&self, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root, |node, name| self.child(node, name))
    }

    /// Ancestors of `id`, starting with `id` itself and ending at the root.
    pub fn lineage(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.node(n).parent)
    }

    /// Slash-joined path used in messages, e.g. `worm/guess/path`.
    pub fn display_name(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .lineage(id)
            .map(|n| self.node(n).name.as_str())
            .collect();
        names.reverse();
        names.join("/")
    }

    /// Action of `id`, or of its nearest ancestor that has one.
    pub fn resolve_action(&self, id: NodeId) -> Option<&ActionKey> {
        self.lineage(id)
            .find_map(|n| self.node(n).action.as_ref())
    }
}
