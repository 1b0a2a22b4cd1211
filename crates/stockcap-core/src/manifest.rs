//! Upload manifest for the stock-photo site.
//!
//! The manifest is a flat text file of labeled lines:
//!
//! ```text
//! Filename: a.jpg, b.png
//! Image Name: <title a> generated, <title b> generated
//! Descriptions: <desc a>, <desc b>
//! Category 1: ...
//! Category 2: ...
//! Category 3: ...
//! Keywords for a.jpg: k1, k2
//! Keywords for b.png: k1
//! Free: 0
//! W-EL: 1
//! P-EL: 1
//! SR-EL: 1
//! SR-Price: 100
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::ManifestConfig;
use crate::types::ImageAnalysis;

/// Up to three free-text categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories(Vec<String>);

impl Categories {
    pub const MAX: usize = 3;

    /// Trim each entry and stop at the first blank one. Anything past
    /// [`Categories::MAX`] is ignored.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = entries
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .take_while(|s| !s.is_empty())
            .take(Self::MAX)
            .collect();
        Self(list)
    }

    /// Category at `index`, or an empty string.
    pub fn get(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Renders and writes the upload manifest.
pub struct ManifestWriter {
    config: ManifestConfig,
}

impl ManifestWriter {
    pub fn new(config: ManifestConfig) -> Self {
        Self { config }
    }

    /// Manifest path inside `dir`.
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.file_name)
    }

    fn image_name(&self, analysis: &ImageAnalysis) -> String {
        if self.config.title_suffix.is_empty() {
            analysis.title.clone()
        } else {
            format!("{} {}", analysis.title, self.config.title_suffix)
        }
    }

    /// Render the manifest text.
    pub fn render(&self, results: &[ImageAnalysis], categories: &Categories) -> String {
        let file_names: Vec<&str> = results.iter().map(|r| r.file_name.as_str()).collect();
        let image_names: Vec<String> = results.iter().map(|r| self.image_name(r)).collect();
        let descriptions: Vec<&str> = results.iter().map(|r| r.description.as_str()).collect();

        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Filename: {}", file_names.join(", "));
        let _ = writeln!(out, "Image Name: {}", image_names.join(", "));
        let _ = writeln!(out, "Descriptions: {}", descriptions.join(", "));
        for i in 0..Categories::MAX {
            let _ = writeln!(out, "Category {}: {}", i + 1, categories.get(i));
        }
        for r in results {
            let _ = writeln!(out, "Keywords for {}: {}", r.file_name, r.keywords_line());
        }

        let license = &self.config.license;
        let _ = writeln!(out, "Free: {}", license.free);
        let _ = writeln!(out, "W-EL: {}", license.w_el);
        let _ = writeln!(out, "P-EL: {}", license.p_el);
        let _ = writeln!(out, "SR-EL: {}", license.sr_el);
        let _ = writeln!(out, "SR-Price: {}", license.sr_price);
        out
    }

    /// Write the manifest to any writer.
    pub fn write_to<W: Write>(
        &self,
        mut writer: W,
        results: &[ImageAnalysis],
        categories: &Categories,
    ) -> io::Result<()> {
        writer.write_all(self.render(results, categories).as_bytes())?;
        writer.flush()
    }

    /// Write the manifest as UTF-8 to `path`, creating parent directories.
    pub fn write_file(
        &self,
        path: &Path,
        results: &[ImageAnalysis],
        categories: &Categories,
    ) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file), results, categories)?;
        tracing::info!("Manifest written to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(name: &str, description: &str, keywords: &[&str]) -> ImageAnalysis {
        ImageAnalysis {
            file_path: PathBuf::from(format!("/photos/{name}")),
            file_name: name.to_string(),
            description: description.to_string(),
            title: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            width: Some(10),
            height: Some(10),
            format: Some("jpeg".to_string()),
            error: None,
        }
    }

    #[test]
    fn test_categories_trim_and_stop_at_blank() {
        let cats = Categories::new(["  Nature ", "", "Animals"]);
        assert_eq!(cats.as_slice(), &["Nature".to_string()]);
        assert_eq!(cats.get(1), "");
    }

    #[test]
    fn test_categories_capped_at_three() {
        let cats = Categories::new(["a", "b", "c", "d"]);
        assert_eq!(cats.len(), 3);
        assert_eq!(cats.get(2), "c");
    }

    #[test]
    fn test_render_full_layout() {
        let results = vec![
            analysis("a.jpg", "a red apple", &["red", "apple", "red apple"]),
            analysis("b.png", "a dog", &["dog"]),
        ];
        let writer = ManifestWriter::new(ManifestConfig::default());
        let text = writer.render(&results, &Categories::new(["Food", "Animals"]));

        let expected = [
            "Filename: a.jpg, b.png",
            "Image Name: a red apple generated, a dog generated",
            "Descriptions: a red apple, a dog",
            "Category 1: Food",
            "Category 2: Animals",
            "Category 3: ",
            "Keywords for a.jpg: red, apple, red apple",
            "Keywords for b.png: dog",
            "Free: 0",
            "W-EL: 1",
            "P-EL: 1",
            "SR-EL: 1",
            "SR-Price: 100",
        ]
        .map(|line| format!("{line}\n"))
        .concat();
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_placeholder_record() {
        let failed = ImageAnalysis::placeholder(
            Path::new("/photos/bad.gif"),
            "Error in description",
            "decode failed",
        );
        let writer = ManifestWriter::new(ManifestConfig::default());
        let text = writer.render(&[failed], &Categories::default());
        assert!(text.contains("Image Name: Error in description generated\n"));
        assert!(text.contains("Keywords for bad.gif: \n"));
        assert!(text.contains("Category 1: \n"));
    }

    #[test]
    fn test_render_empty_batch() {
        let writer = ManifestWriter::new(ManifestConfig::default());
        let text = writer.render(&[], &Categories::default());
        assert!(text.starts_with("Filename: \nImage Name: \nDescriptions: \n"));
        assert!(text.ends_with("SR-Price: 100\n"));
    }

    #[test]
    fn test_license_fields_from_config() {
        let mut config = ManifestConfig::default();
        config.license.sr_price = 250;
        config.title_suffix = String::new();
        let writer = ManifestWriter::new(config);
        let text = writer.render(&[analysis("x.jpg", "a cat", &[])], &Categories::default());
        assert!(text.contains("SR-Price: 250\n"));
        assert!(text.contains("Image Name: a cat\n"));
    }

    #[test]
    fn test_write_file_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(ManifestConfig::default());
        let path = writer.default_path(&dir.path().join("out"));
        writer
            .write_file(
                &path,
                &[analysis("café.jpg", "a café terrace", &["café"])],
                &Categories::new(["Travel"]),
            )
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(path.ends_with("dreamstime_upload.txt"));
        assert!(content.contains("Keywords for café.jpg: café\n"));
        assert!(content.contains("Category 1: Travel\n"));
    }
}
