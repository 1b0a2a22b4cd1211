//! Interactive mode for a bare `stockcap` invocation on a TTY.
//!
//! Menu-driven prompts that end up in the same processing path as
//! `stockcap process`.

pub mod models;
pub mod process;
pub mod theme;

use console::Style;
use dialoguer::Select;
use stockcap_core::Config;

/// Map a dialoguer result to `Ok(Some(value))`, `Ok(None)` on interrupt
/// (Ctrl+C / terminal disconnect), or `Err` for other I/O failures.
///
/// Wraps `interact_text()` calls that lack an `_opt` variant.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const MENU_ITEMS: &[&str] = &[
    "Caption a folder",
    "Download / manage models",
    "Show settings",
    "Exit",
];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();

    let theme = theme::stockcap_theme();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => process::guided_process(config).await?,
            Some(1) => models::guided_models(config).await?,
            Some(2) => show_config(config)?,
            _ => break, // Exit or Ctrl+C / Esc
        }
    }

    Ok(())
}

/// Settings summary with an option to dump the full TOML.
fn show_config(config: &Config) -> anyhow::Result<()> {
    let theme = theme::stockcap_theme();
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", cyan.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };

        eprintln!(
            "    {:<20} {} {}",
            label.apply_to("Config file:"),
            config_path.display(),
            dim.apply_to(path_note)
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Model dir:"),
            config.model_dir().display()
        );
        eprintln!(
            "    {:<20} {} workers",
            label.apply_to("Parallel:"),
            config.processing.parallel_workers
        );
        eprintln!(
            "    {:<20} {} (beams: {}, max length: {})",
            label.apply_to("Captioner:"),
            config.captioning.model,
            config.captioning.num_beams,
            config.captioning.max_length
        );
        eprintln!(
            "    {:<20} up to {} (min length: {})",
            label.apply_to("Keywords:"),
            config.keywords.max_keywords,
            config.keywords.min_length
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Manifest:"),
            config.manifest.file_name
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Log level:"),
            config.logging.level
        );
        eprintln!();

        let items = &["View full config (TOML)", "Show config file path", "Back"];

        let selection = Select::with_theme(&theme)
            .with_prompt("Configuration")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => match config.to_toml() {
                Ok(toml) => {
                    eprintln!();
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!("{toml}");
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!();
                }
                Err(e) => {
                    let err = Style::new().for_stderr().red();
                    eprintln!("  {} Failed to serialize config: {e}", err.apply_to("✗"));
                    eprintln!();
                }
            },
            Some(1) => {
                eprintln!();
                eprintln!("  {}", Config::default_path().display());
                eprintln!();
            }
            _ => break,
        }
    }

    Ok(())
}
