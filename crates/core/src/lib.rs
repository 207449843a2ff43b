//! Core logic including the agent loop, tool dispatch, conversation
//! bookkeeping and summarization.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
pub mod model_client;
mod summarizer;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, DEFAULT_SUMMARIZE_THRESHOLD, TurnError,
};
pub use summarizer::{SummarizeError, Summarizer};
