//! Tool system for function calling.

pub mod arguments;
pub mod kind;
pub mod search;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use kind::{ToolKind, ToolSet};
pub use search::{SearchConfig, SearchResult, WebSearchTool};
pub use tool::{Tool, ToolExecutionContext};
pub use types::AgentToolParameters;
