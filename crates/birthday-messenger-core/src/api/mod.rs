//! REST API client module for the Birthday Messenger backend.
//!
//! This module provides the `ApiClient` for logging in, finding birthdays,
//! sending cards and managing uploaded student spreadsheets.
//!
//! Authenticated endpoints expect an `Authorization: Bearer <token>` header
//! carrying the token returned by `/login`.

pub mod client;
pub mod error;

pub use client::{birthday_query_param, ApiClient, LoginResponse};
pub use error::ApiError;
