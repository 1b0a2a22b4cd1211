//! The `stockcap models` command for managing the captioning and tagging models.

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use stockcap_core::pipeline::Hasher;
use stockcap_core::{BlipCaptioner, Config, OnnxPosTagger};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download required models (BLIP captioner + POS tagger)
    Download,

    /// List installed models
    List,

    /// Show model directory path
    Path,

    /// Re-hash installed model files against the checksums recorded at download
    Verify,
}

/// One file of a Hugging Face model repository.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
}

/// A model the pipeline needs, and where it comes from.
pub struct ModelSpec {
    pub label: &'static str,
    repo: &'static str,
    files: &'static [ModelFile],
    kind: ModelKind,
}

#[derive(Clone, Copy)]
enum ModelKind {
    Captioner,
    Tagger,
}

pub const CAPTIONER: ModelSpec = ModelSpec {
    label: "BLIP captioner",
    repo: "Xenova/blip-image-captioning-base",
    files: &[
        ModelFile {
            remote: "onnx/vision_model.onnx",
            local: stockcap_core::caption::VISION_MODEL_FILENAME,
        },
        ModelFile {
            remote: "onnx/text_decoder_model.onnx",
            local: stockcap_core::caption::DECODER_MODEL_FILENAME,
        },
        ModelFile {
            remote: "tokenizer.json",
            local: stockcap_core::caption::TOKENIZER_FILENAME,
        },
    ],
    kind: ModelKind::Captioner,
};

pub const TAGGER: ModelSpec = ModelSpec {
    label: "POS tagger",
    repo: "vblagoje/bert-english-uncased-finetuned-pos",
    files: &[
        ModelFile {
            remote: "onnx/model.onnx",
            local: stockcap_core::keywords::tagger::TAGGER_MODEL_FILENAME,
        },
        ModelFile {
            remote: "tokenizer.json",
            local: stockcap_core::keywords::tagger::TAGGER_TOKENIZER_FILENAME,
        },
        ModelFile {
            remote: "config.json",
            local: stockcap_core::keywords::tagger::TAGGER_CONFIG_FILENAME,
        },
    ],
    kind: ModelKind::Tagger,
};

impl ModelSpec {
    /// Local directory for this model.
    pub fn dir(&self, config: &Config) -> PathBuf {
        match self.kind {
            ModelKind::Captioner => config.caption_model_dir(),
            ModelKind::Tagger => config.tagger_model_dir(),
        }
    }

    pub fn is_installed(&self, config: &Config) -> bool {
        let dir = self.dir(config);
        match self.kind {
            ModelKind::Captioner => BlipCaptioner::model_exists(&dir),
            ModelKind::Tagger => OnnxPosTagger::model_exists(&dir),
        }
    }

    fn url(&self, file: &ModelFile) -> String {
        format!(
            "https://huggingface.co/{}/resolve/main/{}",
            self.repo, file.remote
        )
    }
}

// ── Reusable public API (used by both flag-based CLI and interactive module) ──

/// Status of each model on disk.
pub struct InstalledModels {
    pub captioner: bool,
    pub tagger: bool,
}

impl InstalledModels {
    /// Returns true if everything needed for processing is present.
    pub fn can_process(&self) -> bool {
        self.captioner && self.tagger
    }
}

/// Check which models are currently installed.
pub fn check_installed(config: &Config) -> InstalledModels {
    InstalledModels {
        captioner: CAPTIONER.is_installed(config),
        tagger: TAGGER.is_installed(config),
    }
}

/// Download every missing file of `spec`. Skips files already on disk.
pub async fn download_model(
    spec: &ModelSpec,
    config: &Config,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let dir = spec.dir(config);
    std::fs::create_dir_all(&dir)?;

    for file in spec.files {
        let dest = dir.join(file.local);
        if dest.exists() {
            tracing::info!("{} file {} already exists", spec.label, file.local);
            continue;
        }

        let url = spec.url(file);
        tracing::info!("Downloading {} ({})...", spec.label, file.local);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            file.local,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Download both models.
pub async fn download_all(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    download_model(&CAPTIONER, config, client).await?;
    download_model(&TAGGER, config, client).await?;
    Ok(())
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        ModelsCommand::Download => {
            println!("Downloading models into {}\n", config.model_dir().display());
            println!("  - {:16} {}", CAPTIONER.label, CAPTIONER.repo);
            println!("  - {:16} {}\n", TAGGER.label, TAGGER.repo);

            let client = reqwest::Client::new();
            download_all(&config, &client).await?;
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `stockcap models download` to download required models.");
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            for spec in [&CAPTIONER, &TAGGER] {
                let dir = spec.dir(&config);
                println!("  {} ({}):", spec.label, dir.display());
                for file in spec.files {
                    let status = if dir.join(file.local).exists() {
                        "ready"
                    } else {
                        "not installed"
                    };
                    println!("    - {:30} {}", file.local, status);
                }
                println!();
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }

        ModelsCommand::Verify => {
            let mut checked = 0usize;
            for spec in [&CAPTIONER, &TAGGER] {
                let dir = spec.dir(&config);
                for file in spec.files {
                    let path = dir.join(file.local);
                    let Some(expected) = read_checksum(&path)? else {
                        continue;
                    };
                    verify_blake3(&path, &expected)?;
                    println!("  ok  {}", path.display());
                    checked += 1;
                }
            }
            if checked == 0 {
                println!("No recorded checksums found. Download models first.");
            }
        }
    }

    Ok(())
}

/// Sidecar file holding the BLAKE3 hash recorded at download time.
fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".blake3");
    PathBuf::from(name)
}

fn read_checksum(path: &Path) -> anyhow::Result<Option<String>> {
    let sidecar = checksum_path(path);
    if !path.exists() || !sidecar.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(sidecar)?.trim().to_string()))
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// The file is written under a `.part` name and renamed once complete, and
/// its BLAKE3 hash is recorded next to it for `stockcap models verify`.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let mut partial = dest.as_os_str().to_os_string();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&partial, dest).await?;

    let hash = Hasher::content_hash(dest)?;
    std::fs::write(checksum_path(dest), format!("{hash}\n"))?;
    tracing::debug!("  BLAKE3: {}", hash);

    Ok(())
}

/// Verify a model file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next download replaces it.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let actual = Hasher::content_hash(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    if actual != expected {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(checksum_path(path));
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed. Run `stockcap models download` again.",
            path.display(),
            expected,
            actual
        );
    }

    tracing::debug!("  Checksum verified: {}…", &actual[..16]);
    Ok(())
}
