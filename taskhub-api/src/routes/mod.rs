/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout, profile
/// - `tasks`: Task CRUD, soft delete and restore
/// - `categories`: Category listing, rename and delete

pub mod auth;
pub mod categories;
pub mod health;
pub mod tasks;
