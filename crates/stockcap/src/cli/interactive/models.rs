//! Guided model management: install status and downloads.

use console::Style;
use dialoguer::Select;
use stockcap_core::Config;

use crate::cli::models::{
    check_installed, download_all, download_model, InstalledModels, ModelSpec, CAPTIONER, TAGGER,
};

use super::theme::stockcap_theme;

enum ModelAction {
    Download(&'static ModelSpec),
    DownloadAll,
    ShowPath,
    Back,
}

/// Show installed model status and offer downloads for what is missing.
pub async fn guided_models(config: &Config) -> anyhow::Result<()> {
    let theme = stockcap_theme();

    loop {
        let status = check_installed(config);
        print_status(&status, config);

        let (items, actions) = menu_for(&status);

        let selection = Select::with_theme(&theme)
            .with_prompt("Model management")
            .items(&items)
            .default(0)
            .interact_opt()?;

        let Some(idx) = selection else { break };
        let client = reqwest::Client::new();
        match actions[idx] {
            ModelAction::Download(spec) => download_model(spec, config, &client).await?,
            ModelAction::DownloadAll => download_all(config, &client).await?,
            ModelAction::ShowPath => {
                eprintln!("  {}", config.model_dir().display());
                eprintln!();
                continue;
            }
            ModelAction::Back => break,
        }

        let done = Style::new().for_stderr().green();
        eprintln!();
        eprintln!("{}", done.apply_to("  Downloads complete."));
        eprintln!();
    }

    Ok(())
}

fn menu_for(status: &InstalledModels) -> (Vec<String>, Vec<ModelAction>) {
    let mut items = Vec::new();
    let mut actions = Vec::new();

    if !status.captioner {
        items.push(format!("Download {}", CAPTIONER.label));
        actions.push(ModelAction::Download(&CAPTIONER));
    }
    if !status.tagger {
        items.push(format!("Download {}", TAGGER.label));
        actions.push(ModelAction::Download(&TAGGER));
    }
    if !status.captioner && !status.tagger {
        items.push("Download both".to_string());
        actions.push(ModelAction::DownloadAll);
    }

    items.push("Show model directory".to_string());
    actions.push(ModelAction::ShowPath);
    items.push("Back".to_string());
    actions.push(ModelAction::Back);

    (items, actions)
}

fn print_status(status: &InstalledModels, config: &Config) {
    let ok = Style::new().for_stderr().green();
    let missing = Style::new().for_stderr().red();
    let dim = Style::new().for_stderr().dim();

    let row = |installed: bool, spec: &ModelSpec| {
        if installed {
            eprintln!(
                "  {} {:<18} {}",
                ok.apply_to("✓"),
                spec.label,
                dim.apply_to(spec.dir(config).display())
            );
        } else {
            eprintln!(
                "  {} {:<18} {}",
                missing.apply_to("✗"),
                spec.label,
                dim.apply_to("not installed")
            );
        }
    };

    eprintln!();
    eprintln!(
        "  {}",
        dim.apply_to(format!("Model directory: {}", config.model_dir().display()))
    );
    eprintln!();
    row(status.captioner, &CAPTIONER);
    row(status.tagger, &TAGGER);
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_offers_only_missing_models() {
        let status = InstalledModels {
            captioner: true,
            tagger: false,
        };
        let (items, actions) = menu_for(&status);
        assert_eq!(items.len(), actions.len());
        assert_eq!(items[0], format!("Download {}", TAGGER.label));
        assert!(!items.iter().any(|i| i == "Download both"));
    }

    #[test]
    fn menu_offers_both_when_nothing_installed() {
        let status = InstalledModels {
            captioner: false,
            tagger: false,
        };
        let (items, _) = menu_for(&status);
        assert_eq!(items.len(), 5);
        assert!(items.iter().any(|i| i == "Download both"));
    }
}
