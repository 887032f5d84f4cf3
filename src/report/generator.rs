//! Markdown and JSON rendering.
//!
//! This module turns dashboards, connection checks and key status into the
//! text apidash prints or writes to `--output`.

use crate::models::{Card, ConnectionCheck, Dashboard, KeyStatus, Panel};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {} Dashboard\n\n", dashboard.kind));

    // Metadata section
    output.push_str(&generate_metadata_section(dashboard));

    // One section per slot, in slot order
    for card in &dashboard.cards {
        output.push_str(&generate_card_section(card));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "- **Generated:** {}\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Loaded:** {}/{}\n",
        dashboard.loaded(),
        dashboard.cards.len()
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        dashboard.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate one card.
fn generate_card_section(card: &Card) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", card.tag));

    if card.loaded {
        section.push_str(&format!("### {}\n\n", card.title));
        if let Some(ref url) = card.image_url {
            section.push_str(&format!("![{}]({})\n\n", card.title, url));
        }
        section.push_str(&format!("{}\n\n", card.caption));
    } else {
        section.push_str(&format!("{}\n\n", card.caption));
        if let Some(ref error) = card.error {
            section.push_str(&format!("> {}\n\n", error));
        }
    }

    section
}

/// Generate a Markdown listing for a single-service query.
pub fn generate_markdown_panel(panel: &Panel) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} {}\n\n", panel.service.icon(), panel.query));
    output.push_str(&format!(
        "- **Source:** {}\n- **Generated:** {}\n- **Results:** {}\n\n",
        panel.service,
        panel.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        panel.cards.len()
    ));

    if panel.cards.is_empty() {
        output.push_str("No results found.\n\n");
    }

    for card in &panel.cards {
        output.push_str(&generate_panel_item(card));
    }

    output.push_str(&generate_footer());
    output
}

fn generate_panel_item(card: &Card) -> String {
    let mut section = format!("## {}\n\n", card.title);
    if let Some(ref url) = card.image_url {
        section.push_str(&format!("![{}]({})\n\n", card.title, url));
    }
    section.push_str(&format!("{}\n\n", card.caption));
    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Generated by apidash*\n");

    footer
}

/// Generate a Markdown table of connection checks.
pub fn generate_markdown_checks(checks: &[ConnectionCheck]) -> String {
    let mut output = String::new();

    output.push_str("# Connection Check\n\n");
    output.push_str("| Service | Status | Detail |\n");
    output.push_str("|:---|:---:|:---|\n");

    for check in checks {
        let status = if check.ok { "✅" } else { "❌" };
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            check.service,
            status,
            check.detail.replace('|', "\\|")
        ));
    }

    let passed = checks.iter().filter(|c| c.ok).count();
    output.push_str(&format!("\n{}/{} services reachable\n", passed, checks.len()));

    output
}

/// Generate the key status summary.
pub fn generate_markdown_status(status: &KeyStatus) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "API Configuration: {}/{} APIs configured\n",
        status.configured.len(),
        status.total()
    ));

    for service in &status.configured {
        output.push_str(&format!("  ✅ {}\n", service));
    }
    for service in &status.missing {
        output.push_str(&format!("  ⬜ {} (no key)\n", service));
    }

    output
}

/// Generate pretty JSON for any output type.
pub fn generate_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write `content` to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
