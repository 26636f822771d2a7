//! Data models exchanged with the Birthday Messenger backend.
//!
//! - `Person`, `BirthdayResults`: birthday filter results
//! - `CardRequest`: body of a "send card" request
//! - `AcademicYear`, `FileListing`: uploaded spreadsheet bookkeeping

pub mod files;
pub mod person;

pub use files::{AcademicYear, FileListing};
pub use person::{BirthdayResults, CardRequest, Person};
