//! Session-gated access to the backend.
//!
//! `MessengerService` is what front ends hold instead of reaching for the
//! token themselves: it records the session on login, clears it on logout,
//! and refuses every authenticated call while the session is not valid.

pub mod error;
pub mod messenger;

pub use error::ServiceError;
pub use messenger::{validate_spreadsheet, CardOutcome, MessengerService};
