//! # agent-core
//!
//! Core agent abstractions shared by the portfolio advisor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          agent-core                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────────┐  │
//! │  │    Crew     │   │    Tools    │   │    LlmProvider      │  │
//! │  │ (task graph)│───│   Registry  │   │    (Strategy)       │  │
//! │  └─────────────┘   └─────────────┘   └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps callers independent of the generative-text
//! vendor. `Crew` runs registered tools as a sequential task graph and is
//! only usable with valid `CrewCredentials`.

pub mod provider;
pub mod tool;
pub mod crew;
pub mod message;
pub mod error;

pub use crew::{Crew, CrewBuilder, CrewCredentials, CrewOutput, Task};
pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use tool::{Tool, ToolCall, ToolResult, ToolRegistry, ToolSchema};
