/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
/// - Per-IP rate limiting
/// - Session cookie authentication

pub mod rate_limit;
pub mod security;
pub mod session;
