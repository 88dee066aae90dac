//! Format handlers
//!
//! One module per external tool: each owns the argument contract for its
//! tool and the validation rule appropriate to its format. Handlers never
//! retain state across entries; everything they need arrives through the
//! [`StageContext`].

pub mod codec;
pub mod container;
pub mod extract;

use crate::config::ToolNames;
use crate::invoke::ToolRunner;
use crate::workspace::Workspace;

/// Shared context for one entry's pipeline stages.
pub struct StageContext<'a> {
    pub runner: &'a ToolRunner,
    pub tools: &'a ToolNames,
    pub workspace: &'a mut Workspace,
}
