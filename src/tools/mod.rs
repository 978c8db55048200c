//! Tool system: handlers, schemas, and name-based dispatch.

pub mod arguments;
pub mod citations;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use citations::CitationSink;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolExecutionContext};
pub use types::{ToolParameters, ToolSchema};
