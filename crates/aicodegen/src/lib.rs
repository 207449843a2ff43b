//! A coding assistant that lets a chat model explore and edit the files of
//! a repository.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the assistant into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod extract;
mod session;
pub mod tools;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`aicodegen_core`] crate.
pub mod core {
    pub use aicodegen_core::*;
}
