//! The closed set of tools the agent can be configured with.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::search::{SearchConfig, WebSearchTool};
use super::tool::Tool;
use crate::provider::ToolDefinition;

/// Supported tool variants, selectable by name on the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ToolKind {
    #[strum(serialize = "ddg-search")]
    #[serde(rename = "ddg-search")]
    WebSearch,
}

impl ToolKind {
    /// Every supported tool.
    pub fn all() -> Vec<ToolKind> {
        ToolKind::iter().collect()
    }

    /// Construct the concrete tool for this variant.
    pub fn build(&self, search: &SearchConfig) -> Arc<dyn Tool> {
        match self {
            ToolKind::WebSearch => Arc::new(WebSearchTool::new(search.clone())),
        }
    }
}

/// The tools registered into one agent run.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Build the tools for each kind, skipping duplicates.
    pub fn from_kinds(kinds: &[ToolKind], search: &SearchConfig) -> Self {
        let mut seen = Vec::new();
        let tools = kinds
            .iter()
            .filter(|kind| {
                if seen.contains(*kind) {
                    false
                } else {
                    seen.push(**kind);
                    true
                }
            })
            .map(|kind| kind.build(search))
            .collect();
        Self { tools }
    }

    /// Look a tool up by the name the model used.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions sent to the provider, or `None` when there are no tools.
    pub fn definitions(&self) -> Option<Vec<ToolDefinition>> {
        if self.tools.is_empty() {
            return None;
        }
        Some(self.tools.iter().map(|t| t.definition()).collect())
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .finish()
    }
}
