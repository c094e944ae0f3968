//! Domains module containing business logic organized by bounded contexts.
//!
//! Path security lives in `core`; the only domain here is error reporting,
//! which path denials feed into as SECURITY errors.

pub mod reporting;
