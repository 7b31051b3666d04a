//! Safe arithmetic expression evaluation with a small JSON API.
//!
//! Expressions are tokenized, parsed and interpreted against a fixed table of
//! constants and functions; nothing in the input can reach anything else.

pub mod assets;
pub mod calculator;
pub mod config;
pub mod logging;
pub mod server;

pub use calculator::{CalcError, CalcResponse, CalcResult, Limits, evaluate_expression};
pub use config::Config;
