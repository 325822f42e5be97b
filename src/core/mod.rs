//! Core application modules
//!
//! Configuration, constants, logging, the chat completion client and the
//! detached/retry helpers built on top of it.

pub mod client;
pub mod config;
pub mod constants;
pub mod detached;
pub mod invoker;
pub mod logging;
pub mod retry;
