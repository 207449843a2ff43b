//! An abstraction layer for chat-completion backends.
//!
//! This crate establishes an unified protocol for the agent to talk to
//! a model backend, so that the agent loop never depends on the wire
//! format of a concrete provider.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod request;
mod response;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use request::*;
pub use response::*;
