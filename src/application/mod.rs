//! Application layer orchestrating the domain over the storage ports.
//!
//! `TransferEngine` is the core: it validates and atomically applies balance
//! transfers. `AccountService` covers the surrounding account lifecycle.

pub mod accounts;
pub mod engine;
