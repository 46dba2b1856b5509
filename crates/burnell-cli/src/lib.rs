//! # burnell
//!
//! Command line front end for `burnell-jwt`: key generation and export,
//! token issuance, verification and inspection.

pub mod commands;
pub mod config;
