//! Release artifacts offered on the download page.
//!
//! The list is static (a JSON manifest maintained by hand) and only ever
//! read. It is displayed newest first, and the "latest version" shown in
//! the page header is the highest stable release.

pub mod artifact;
pub mod catalog;
pub mod version;

pub use artifact::{Channel, DownloadArtifact};
pub use catalog::{latest_version, sorted_descending, DownloadCatalog};
pub use version::{is_prerelease, semver_compare, semver_key};
