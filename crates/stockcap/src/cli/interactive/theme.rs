//! Prompt styling and the interactive-mode banner.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Manifest fields shown under the title, in the order they are written.
const BANNER_FIELDS: &[&str] = &["Filename", "Image Name", "Descriptions", "Keywords"];

/// Prompt theme for interactive mode.
///
/// Green marks what ends up in the manifest (answers, selections), yellow
/// marks prompts waiting for input.
pub fn stockcap_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("›".to_string()).for_stderr().yellow(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style(":".to_string()).for_stderr().dim(),
        active_item_prefix: style("●".to_string()).for_stderr().green(),
        active_item_style: Style::new().for_stderr().green().bold(),
        inactive_item_prefix: style("○".to_string()).for_stderr().dim(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("→".to_string()).for_stderr().dim(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Banner text: a label card with the version and the manifest fields.
/// Every line has the same display width.
fn banner_lines() -> Vec<String> {
    let title = format!("stockcap {}", stockcap_core::VERSION);
    let fields = BANNER_FIELDS.join(" · ");
    let width = title.chars().count().max(fields.chars().count()) + 2;

    let pad = |text: &str| {
        let fill = width - text.chars().count();
        format!("│ {text}{} │", " ".repeat(fill - 1))
    };

    vec![
        format!("┌{}┐", "─".repeat(width + 1)),
        pad(&title),
        format!("├{}┤", "╌".repeat(width + 1)),
        pad(&fields),
        format!("└{}┘", "─".repeat(width + 1)),
    ]
}

/// Prints the banner to stderr so stdout stays clean.
pub fn print_banner() {
    let frame = Style::new().for_stderr().green();
    eprintln!();
    for line in banner_lines() {
        eprintln!("  {}", frame.apply_to(line));
    }
    eprintln!();
}
