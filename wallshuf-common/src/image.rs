use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ImageError;

pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "avif"];

/// Check that `path` is a readable image before handing it to a backend.
pub fn validate_image(path: &Path) -> Result<(), ImageError> {
    if !path.exists() {
        return Err(ImageError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        });
    }

    if !path.is_file() {
        return Err(ImageError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "Not a file"),
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext) => {}
        _ => {
            return Err(ImageError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }

    validate_header(path)
}

fn validate_header(path: &Path) -> Result<(), ImageError> {
    let mut file = File::open(path).map_err(|e| ImageError::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;

    let corrupted = || ImageError::CorruptedImage {
        path: path.to_path_buf(),
    };

    let mut header = [0u8; 12];
    let bytes_read = file.read(&mut header).map_err(|e| ImageError::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read < 4 {
        return Err(corrupted());
    }

    match &header[0..4] {
        [0xFF, 0xD8, 0xFF, _] => Ok(()),    // JPEG
        [0x89, 0x50, 0x4E, 0x47] => Ok(()), // PNG
        [0x47, 0x49, 0x46, 0x38] => Ok(()), // GIF
        [0x42, 0x4D, _, _] => Ok(()),       // BMP
        [0x52, 0x49, 0x46, 0x46] if bytes_read >= 12 && &header[8..12] == b"WEBP" => Ok(()),
        [0x49, 0x49, 0x2A, 0x00] | [0x4D, 0x4D, 0x00, 0x2A] => Ok(()), // TIFF
        _ if bytes_read >= 12 && &header[4..8] == b"ftyp" && &header[8..12] == b"avif" => Ok(()),
        _ => Err(corrupted()),
    }
}
