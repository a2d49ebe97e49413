//! Binary program images.
//!
//! An image is a flat sequence of big-endian 2-byte words, loaded into
//! memory from address 0. A trailing odd byte is kept as the high byte of
//! a final word.

use crate::word::Word;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Read a binary image from disk.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write words to disk as a binary image.
pub fn write_image<P: AsRef<Path>>(path: P, words: &[Word]) -> Result<(), ImageError> {
    let path = path.as_ref();
    let io_error = |source| ImageError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut file = std::fs::File::create(path).map_err(io_error)?;
    file.write_all(&words_to_bytes(words)).map_err(io_error)?;
    file.flush().map_err(io_error)?;

    log::info!("wrote {} words to {}", words.len(), path.display());
    Ok(())
}

/// Serialize words big-endian.
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_bytes()).collect()
}

/// Group bytes into big-endian words, zero-padding an odd tail.
pub fn bytes_to_words(bytes: &[u8]) -> Vec<Word> {
    bytes
        .chunks(2)
        .map(|chunk| Word::from_bytes([chunk[0], chunk.get(1).copied().unwrap_or(0)]))
        .collect()
}

/// Errors from image files.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_to_bytes_big_endian() {
        let words = [Word::from_bits(0x05FA), Word::from_bits(0xFF0F)];
        assert_eq!(words_to_bytes(&words), vec![0x05, 0xFA, 0xFF, 0x0F]);
    }

    #[test]
    fn test_bytes_to_words_odd_tail() {
        let words = bytes_to_words(&[0x12, 0x34, 0x56]);
        assert_eq!(words, vec![Word::from_bits(0x1234), Word::from_bits(0x5600)]);
        assert!(bytes_to_words(&[]).is_empty());
    }

    #[test]
    fn test_image_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("zedecim-image-{}.bin", std::process::id()));
        let words = vec![Word::from_bits(0x05FA), Word::new(-1), Word::ZERO];

        write_image(&path, &words).unwrap();
        let bytes = read_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes.len(), 6);
        assert_eq!(bytes_to_words(&bytes), words);
    }

    #[test]
    fn test_read_missing_image() {
        let err = read_image("/nonexistent/zedecim/program.bin").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zedecim/program.bin"));
    }
}
