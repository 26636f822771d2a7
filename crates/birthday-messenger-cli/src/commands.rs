//! Command handlers. Each one corresponds to a button or form of the
//! desktop client and prints its result the way the page renders it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use tracing::info;

use birthday_messenger_core::models::{AcademicYear, BirthdayResults, Person};
use birthday_messenger_core::service::CardOutcome;
use birthday_messenger_core::utils::{format_optional, format_timestamp, truncate_string};
use birthday_messenger_core::{DownloadArtifact, DownloadCatalog, ThemeMode};

use crate::app::App;

/// Column width for file names in the downloads table
const FILE_COLUMN_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
    Dark,
    Light,
    System,
}

// ===== Session =====

pub async fn login(app: &mut App, user: Option<String>) -> Result<()> {
    let username = match user {
        Some(u) => u,
        None => App::prompt_username(app.config.last_username.as_deref())?,
    };
    if username.trim().is_empty() {
        bail!("Username required");
    }
    let password = App::prompt_password("Password: ")?;

    app.service.login(&username, &password).await?;
    app.remember_username(username.trim());

    if app.service.is_authenticated() {
        println!("Logged in as {}.", username.trim());
    } else {
        println!("Login accepted, but the server issued no token.");
    }
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.service.logout().await;
    println!("Logged out.");
    Ok(())
}

pub fn status(app: &App) -> Result<()> {
    let session = app.service.session();
    println!("Server:  {}", app.config.api_base_url);
    if session.is_authenticated() {
        let expires = session
            .expires_at()
            .map(|ts| format_timestamp(&ts))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Session: authenticated, expires {} ({} min left)",
            expires,
            session.minutes_until_expiry()
        );
    } else {
        println!("Session: not authenticated");
    }
    println!("Theme:   {}", app.theme.get());
    Ok(())
}

pub async fn change_password(app: &App) -> Result<()> {
    let old = App::prompt_password("Current password: ")?;
    let new = App::prompt_password("New password: ")?;
    let confirm = App::prompt_password("Confirm new password: ")?;
    if new.is_empty() {
        bail!("New password must not be empty");
    }
    if new != confirm {
        bail!("Passwords do not match");
    }

    let response = app.service.change_password(&old, &new).await?;
    print_response("Password changed.", &response);
    Ok(())
}

// ===== Birthdays =====

pub async fn birthdays(app: &App, date: &str, send: bool) -> Result<()> {
    let results = app.service.find_birthdays(date).await?;
    if results.is_empty() {
        println!("No birthdays found for this date.");
        return Ok(());
    }

    print!("{}", render_results(&results));

    if send {
        let outcomes = app.service.send_cards(&results.people).await?;
        print_outcomes(&outcomes);
    }
    Ok(())
}

fn render_results(results: &BirthdayResults) -> String {
    let mut out = format!("{} birthday(s) on {}\n", results.count, results.date_label());
    for person in &results.people {
        out.push_str(&render_person(person));
    }
    out
}

fn render_person(p: &Person) -> String {
    let mut line = format!("  {}", p.display_name());
    if let Some(email) = p.email.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!(" - {}", email));
    }
    if let Some(phone) = p.phone.as_deref().filter(|ph| !ph.is_empty()) {
        line.push_str(&format!(" ({})", phone));
    }
    line.push('\n');

    if let Some(email) = p.father_email.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!(
            "      Father Email: {} ({})\n",
            email,
            format_optional(&p.father_phone, "-")
        ));
    }
    if let Some(email) = p.mother_email.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!(
            "      Mother Email: {} ({})\n",
            email,
            format_optional(&p.mother_phone, "-")
        ));
    }
    line
}

fn print_outcomes(outcomes: &[CardOutcome]) {
    let sent = outcomes.iter().filter(|o| o.is_ok()).count();
    for outcome in outcomes {
        match &outcome.result {
            Ok(_) => println!("  sent   {}", outcome.name),
            Err(e) => println!("  failed {}: {}", outcome.name, e),
        }
    }
    println!("Sent {} of {} card(s).", sent, outcomes.len());
    info!(sent, total = outcomes.len(), "Card batch finished");
}

// ===== Spreadsheets =====

pub async fn upload(app: &App, year: AcademicYear, file: &Path) -> Result<()> {
    println!("Uploading {} for {} year...", file.display(), year);
    let response = app.service.upload_spreadsheet(year, file).await?;
    let mut label = year.as_str().to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    print_response(&format!("{} year upload successful!", label), &response);
    Ok(())
}

pub async fn files(app: &App) -> Result<()> {
    let listing = app.service.list_files().await?;
    if listing.total() == 0 {
        println!("No files uploaded.");
        return Ok(());
    }
    for (year, names) in &listing.files {
        println!("{}:", year);
        for name in names {
            println!("  {}", name);
        }
    }
    Ok(())
}

pub async fn delete(app: &App, name: &str) -> Result<()> {
    let response = app.service.delete_file(name).await?;
    print_response(&format!("Deleted {}.", name), &response);
    Ok(())
}

pub async fn delete_all(app: &App, yes: bool) -> Result<()> {
    if !yes && !App::confirm("Delete all uploaded files?")? {
        println!("Cancelled.");
        return Ok(());
    }
    let response = app.service.delete_all_files().await?;
    print_response("Deleted all files.", &response);
    Ok(())
}

pub async fn convert(app: &App) -> Result<()> {
    let response = app.service.convert_to_csv().await?;
    print_response("Conversion finished.", &response);
    Ok(())
}

/// Print a headline, plus the server's `message` field when it sent one
fn print_response(headline: &str, response: &Value) {
    println!("{}", headline);
    if let Some(message) = response.get("message").and_then(Value::as_str) {
        println!("{}", message);
    }
}

// ===== Theme =====

pub fn theme(app: &App, action: ThemeAction) -> Result<()> {
    let mode = match action {
        ThemeAction::Show => app.theme.get(),
        ThemeAction::Toggle => app.theme.toggle()?,
        ThemeAction::Dark => app.theme.set(ThemeMode::Dark)?,
        ThemeAction::Light => app.theme.set(ThemeMode::Light)?,
        ThemeAction::System => app.theme.use_system()?,
    };
    println!("Theme: {}", mode);
    Ok(())
}

// ===== Downloads =====

pub fn downloads(app: &App, manifest: Option<PathBuf>) -> Result<()> {
    let path = match manifest {
        Some(path) => path,
        None => app.config.downloads_manifest_path()?,
    };
    let catalog = DownloadCatalog::load(&path)?;

    println!(
        "Latest version: {}",
        catalog.latest_version().unwrap_or_else(|| "N/A".to_string())
    );
    if catalog.is_empty() {
        println!("No entries configured. Edit {}.", path.display());
        return Ok(());
    }

    print!(
        "{}",
        render_downloads(&catalog.sorted(), app.config.download_base_url.as_deref())
    );
    Ok(())
}

fn render_downloads(sorted: &[DownloadArtifact], base_url: Option<&str>) -> String {
    let mut out = format!(
        "{:<width$}  {:<12}  {:<6}  {:<8}  {}\n",
        "File",
        "Version",
        "Arch",
        "Channel",
        "SHA256",
        width = FILE_COLUMN_WIDTH
    );
    for artifact in sorted {
        out.push_str(&format!(
            "{:<width$}  {:<12}  {:<6}  {:<8}  {}\n",
            truncate_string(&artifact.file, FILE_COLUMN_WIDTH),
            artifact.version,
            artifact.arch,
            artifact.channel().label(),
            artifact.short_sha(),
            width = FILE_COLUMN_WIDTH
        ));
        if let Some(base) = base_url {
            out.push_str(&format!("    {}\n", artifact.download_url(base)));
        }
    }
    out
}

// ===== External links =====

pub fn is_external_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    (lower.starts_with("http://") && lower.len() > "http://".len())
        || (lower.starts_with("https://") && lower.len() > "https://".len())
}

pub fn open_external(url: &str) -> Result<()> {
    if !is_external_url(url) {
        bail!("Invalid external URL: {}", url);
    }
    open::that(url.trim()).with_context(|| format!("Failed to open {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use birthday_messenger_core::Channel;

    #[test]
    fn test_is_external_url() {
        assert!(is_external_url("https://github.com/Jay-Karia/birthday-messenger"));
        assert!(is_external_url("HTTP://example.com"));
        assert!(!is_external_url("file:///etc/passwd"));
        assert!(!is_external_url("javascript:alert(1)"));
        assert!(!is_external_url("https://"));
    }

    #[test]
    fn test_render_person_with_parents() {
        let person = Person {
            name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            phone: Some("919400000000".to_string()),
            father_email: Some("dad@example.com".to_string()),
            father_phone: Some("919400000001".to_string()),
            ..Default::default()
        };
        let out = render_person(&person);
        assert!(out.starts_with("  Asha - asha@example.com (919400000000)\n"));
        assert!(out.contains("Father Email: dad@example.com (919400000001)"));
        assert!(!out.contains("Mother Email"));
    }

    #[test]
    fn test_render_results_heading() {
        let results = BirthdayResults {
            count: 1,
            date: Some("10-19".to_string()),
            month_day: None,
            people: vec![Person::default()],
        };
        assert!(render_results(&results).starts_with("1 birthday(s) on 10-19\n  (No name)\n"));
    }

    #[test]
    fn test_render_downloads_order_and_urls() {
        let mut beta = DownloadArtifact::new("bm-0.0.5-beta.exe", "0.0.5-beta", "x64");
        beta.sha256 = Some("0123456789abcdef".to_string());
        let mut stable = DownloadArtifact::new("bm-0.0.4.exe", "0.0.4", "x64");
        stable.channel = Some(Channel::Stable);

        let sorted = birthday_messenger_core::downloads::sorted_descending(&[stable, beta]);
        let out = render_downloads(&sorted, Some("https://dl.example.com"));
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("File"));
        assert!(lines[1].starts_with("bm-0.0.5-beta.exe"));
        assert!(lines[1].contains("Preview"));
        assert!(lines[1].contains("0123456789ab…"));
        assert_eq!(lines[2], "    https://dl.example.com/bm-0.0.5-beta.exe");
        assert!(lines[3].contains("Stable"));
    }
}
