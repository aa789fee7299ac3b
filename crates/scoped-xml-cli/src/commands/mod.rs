//! Command implementations for sxml
//!
//! Each command module handles the CLI interface and delegates to
//! scoped-xml for the actual work.

pub mod events;
pub mod fmt;
pub mod stats;
