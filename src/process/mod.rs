//! External process plumbing.
//!
//! - `runner` launches a command, captures its output and enforces a timeout.
//! - `payload` digs the JSON result record out of that captured output.

mod payload;
mod runner;

pub use payload::{extract_payload, StructuredPayload};
pub use runner::{resolve_program, ProcessResult, ProcessRunner};
