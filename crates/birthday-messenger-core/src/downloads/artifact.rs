use std::fmt;

use serde::{Deserialize, Serialize};

use super::version::is_prerelease;
use crate::utils::short_hash;

/// Release maturity, shown as a badge on the download page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Channel {
    Stable,
    Preview,
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Stable => "Stable",
            Channel::Preview => "Preview",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One downloadable installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DownloadArtifact {
    pub file: String,
    pub version: String,
    pub arch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl DownloadArtifact {
    pub fn new(file: impl Into<String>, version: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            version: version.into(),
            arch: arch.into(),
            channel: None,
            sha256: None,
        }
    }

    pub fn is_prerelease(&self) -> bool {
        is_prerelease(&self.version)
    }

    /// Explicit channel, else preview for pre-release versions.
    pub fn channel(&self) -> Channel {
        self.channel.unwrap_or(if self.is_prerelease() {
            Channel::Preview
        } else {
            Channel::Stable
        })
    }

    /// Abbreviated checksum for tables, or an em dash when unknown.
    pub fn short_sha(&self) -> String {
        self.sha256
            .as_deref()
            .filter(|sha| !sha.is_empty())
            .map(|sha| short_hash(sha, 12))
            .unwrap_or_else(|| "—".to_string())
    }

    pub fn download_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_derived_from_version() {
        assert_eq!(DownloadArtifact::new("a.exe", "0.0.4", "x64").channel(), Channel::Stable);
        assert_eq!(DownloadArtifact::new("b.exe", "0.0.5-beta", "x64").channel(), Channel::Preview);
    }

    #[test]
    fn test_explicit_channel_wins() {
        let mut artifact = DownloadArtifact::new("a.exe", "1.0.0", "x64");
        artifact.channel = Some(Channel::Preview);
        assert_eq!(artifact.channel(), Channel::Preview);
    }

    #[test]
    fn test_parse_manifest_entry() {
        let json = r#"{"file":"birthday-messenger-0.0.4.Setup.exe","version":"0.0.4","arch":"x64","sha256":"3f786850e387550fdab836ed7e6dc881de23001b"}"#;
        let artifact: DownloadArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.channel, None);
        assert_eq!(artifact.channel(), Channel::Stable);
        assert_eq!(artifact.short_sha(), "3f786850e387…");
    }

    #[test]
    fn test_short_sha_missing() {
        assert_eq!(DownloadArtifact::new("a", "1", "x64").short_sha(), "—");

        let mut blank = DownloadArtifact::new("a", "1", "x64");
        blank.sha256 = Some(String::new());
        assert_eq!(blank.short_sha(), "—");
    }

    #[test]
    fn test_download_url() {
        let artifact = DownloadArtifact::new("setup.exe", "1.0.0", "x64");
        assert_eq!(
            artifact.download_url("https://example.com/releases/"),
            "https://example.com/releases/setup.exe"
        );
    }
}
