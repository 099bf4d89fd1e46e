//! Single-terminal bookstore manager.
//!
//! Accounts with privilege levels, a book catalog and a ledger of signed
//! money movements, each kept in a flat record file that is rewritten after
//! every mutation. [`engine::Engine`] reads one command per line, checks the
//! caller's privilege against the login stack and prints `Invalid` for any
//! rejected command.

pub mod account;
pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod parser;
pub mod store;
pub mod transaction;

pub use error::{Error, Rejection, Result};
