//! Content hashing used to verify downloaded model files.

use blake3::Hasher as Blake3Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// BLAKE3 content hashing.
pub struct Hasher;

impl Hasher {
    /// Generate a BLAKE3 hash of file contents.
    ///
    /// Streams the file so multi-hundred-megabyte ONNX models are never held
    /// in memory at once.
    pub fn content_hash(path: &Path) -> std::io::Result<String> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Blake3Hasher::new();

        let mut buffer = [0u8; 65536];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Generate a BLAKE3 hash from an in-memory byte buffer.
    pub fn content_hash_from_bytes(data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_and_bytes_hash_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not really a model").unwrap();

        let from_file = Hasher::content_hash(&path).unwrap();
        let from_bytes = Hasher::content_hash_from_bytes(b"not really a model");
        assert_eq!(from_file, from_bytes);
        assert_eq!(from_file.len(), 64);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Hasher::content_hash(Path::new("/nonexistent/model.onnx")).is_err());
    }
}
