//! Domain model for the single managed `records` table.
//!
//! # Responsibility
//! - Hold the naming contract (table, columns, classifier constants).
//! - Define typed records, payloads and query rows.
//!
//! # Invariants
//! - This module has no storage or routing behavior.

pub mod contract;
pub mod record;
