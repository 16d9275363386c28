//! # Taskhub Shared Library
//!
//! This crate contains the domain types, storage and business logic used by
//! the Taskhub API server and the cleanup worker.
//!
//! ## Module Organization
//!
//! - `models`: Users, sessions, tasks and derived categories
//! - `auth`: Password hashing and session tokens
//! - `redis`: Redis client and key naming scheme
//! - `repository`: Storage traits with Redis and in-memory implementations
//! - `services`: User and task business rules
//! - `error`: Error codes shared across crates

pub mod auth;
pub mod error;
pub mod models;
pub mod redis;
pub mod repository;
pub mod services;

/// Current version of the Taskhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
