//! Guided captioning flow.
//!
//! Folder → categories → worker count → model check → confirmation.
//! Builds a `ProcessArgs` and hands it to `cli::process::execute()`.

use std::path::PathBuf;

use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use stockcap_core::pipeline::FileDiscovery;
use stockcap_core::{Categories, Config};

use crate::cli::models::check_installed;
use crate::cli::process::ProcessArgs;

use super::theme::stockcap_theme;

/// Walk the user through one captioning run.
pub async fn guided_process(config: &Config) -> anyhow::Result<()> {
    let theme = stockcap_theme();
    let warn = Style::new().for_stderr().yellow();
    let dim = Style::new().for_stderr().dim();

    // Re-prompts on a missing folder and on a folder with no images.
    let (input, files) = loop {
        let Some(raw_path) = super::handle_interrupt(
            Input::<String>::with_theme(&theme)
                .with_prompt("Folder with images")
                .interact_text(),
        )?
        else {
            return Ok(());
        };

        let path = match resolve_folder(&raw_path) {
            Ok(path) => path,
            Err(msg) => {
                eprintln!("  {}", warn.apply_to(msg));
                continue;
            }
        };

        let found = FileDiscovery::new(config.processing.clone()).discover(&path);
        if found.is_empty() {
            eprintln!(
                "  {}",
                warn.apply_to("No supported images found in that folder.")
            );
            continue;
        }

        break (path, found);
    };

    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "Found {} image(s) ({:.1} MB)",
            files.len(),
            FileDiscovery::total_size(&files) as f64 / 1_000_000.0
        ))
    );

    let Some(categories) = prompt_categories(&theme)? else {
        return Ok(());
    };

    let Some(parallel) = prompt_workers(&theme, config.processing.parallel_workers)? else {
        return Ok(());
    };

    let status = check_installed(config);
    if !status.can_process() {
        eprintln!("  {}", warn.apply_to("Required models not installed."));

        let install = Confirm::with_theme(&theme)
            .with_prompt("Download models now?")
            .default(true)
            .interact_opt()?;

        if !matches!(install, Some(true)) {
            return Ok(());
        }
        super::models::guided_models(config).await?;
        if !check_installed(config).can_process() {
            eprintln!("  Models still missing. Returning to menu.");
            return Ok(());
        }
    }

    eprintln!();
    let bold = Style::new().for_stderr().bold();
    eprintln!(
        "  {}",
        bold.apply_to(format!("Ready to caption {} image(s)", files.len()))
    );
    let category_label = if categories.is_empty() {
        "none".to_string()
    } else {
        categories.join(", ")
    };
    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "Categories: {category_label} | Workers: {parallel} | Manifest: ./{}",
            config.manifest.file_name
        ))
    );
    eprintln!();

    let confirm = Confirm::with_theme(&theme)
        .with_prompt("Start processing?")
        .default(true)
        .interact_opt()?;

    if !matches!(confirm, Some(true)) {
        return Ok(());
    }

    let args = ProcessArgs {
        input,
        categories,
        parallel: Some(parallel),
        ..ProcessArgs::default()
    };

    crate::cli::process::execute(args).await?;

    eprintln!();
    let post_items = &["Caption another folder", "Back to main menu"];
    let post_choice = Select::with_theme(&theme)
        .with_prompt("What next?")
        .items(post_items)
        .default(0)
        .interact_opt()?;

    if matches!(post_choice, Some(0)) {
        Box::pin(guided_process(config)).await?;
    }

    Ok(())
}

/// Ask for up to three categories. A blank answer ends the list.
/// Returns `Ok(None)` on interrupt.
fn prompt_categories(theme: &ColorfulTheme) -> anyhow::Result<Option<Vec<String>>> {
    let mut categories = Vec::new();

    for i in 1..=Categories::MAX {
        let Some(entry) = super::handle_interrupt(
            Input::<String>::with_theme(theme)
                .with_prompt(format!("Category {i} (blank to finish)"))
                .allow_empty(true)
                .interact_text(),
        )?
        else {
            return Ok(None);
        };

        let entry = entry.trim();
        if entry.is_empty() {
            break;
        }
        categories.push(entry.to_string());
    }

    Ok(Some(categories))
}

/// Ask for the worker count until a positive integer is given.
fn prompt_workers(theme: &ColorfulTheme, default: usize) -> anyhow::Result<Option<usize>> {
    let answer = super::handle_interrupt(
        Input::<String>::with_theme(theme)
            .with_prompt("Number of parallel workers")
            .default(default.to_string())
            .validate_with(|input: &String| parse_workers(input).map(|_| ()))
            .interact_text(),
    )?;

    match answer {
        Some(raw) => Ok(Some(parse_workers(&raw).map_err(anyhow::Error::msg)?)),
        None => Ok(None),
    }
}

/// Expand `~` and require an existing directory.
fn resolve_folder(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Please enter a folder path.".to_string());
    }
    let path = PathBuf::from(shellexpand::tilde(trimmed).into_owned());
    if !path.is_dir() {
        return Err(format!("Not a folder: {}", path.display()));
    }
    Ok(path)
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err("Enter a positive whole number.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_must_exist_and_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(
            resolve_folder(&format!("  {}  ", dir.path().display())).unwrap(),
            dir.path()
        );
        assert!(resolve_folder(file.to_str().unwrap()).is_err());
        assert!(resolve_folder("/definitely/not/here").is_err());
        assert!(resolve_folder("   ").is_err());
    }

    #[test]
    fn workers_must_be_positive() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert_eq!(parse_workers(" 12 "), Ok(12));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("-3").is_err());
        assert!(parse_workers("four").is_err());
    }
}
