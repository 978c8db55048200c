//! Core types for Syllabus.

pub mod citation;
pub mod generation;
pub mod message;
pub mod usage;

pub use citation::*;
pub use generation::*;
pub use message::{ContentBlock, Message, Role, ToolInvocation, ToolResult};
pub use usage::*;
