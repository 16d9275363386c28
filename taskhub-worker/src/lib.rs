//! # Taskhub Worker Library
//!
//! Background maintenance for Taskhub. Soft-deleted tasks become
//! permanently unrecoverable once their retention window passes; the
//! sweeper purges them from the store.
//!
//! ## Modules
//!
//! - `sweeper`: Periodic cleanup of expired soft-deleted tasks

pub mod sweeper;
