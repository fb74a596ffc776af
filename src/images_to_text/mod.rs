pub mod slideshow;

pub use slideshow::{ImageList, SlideshowError, SlideshowImages, SlideshowScraper};

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;

/// Where an image handed to the vision engine comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image from a file path
    Path(String),
    /// Image as base64-encoded data
    Base64(String),
}

impl ImageSource {
    /// Base64 payload for the engine, reading files as needed.
    pub async fn load(&self) -> Result<String, ExtractError> {
        match self {
            ImageSource::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                debug!("Read {} bytes from {}", bytes.len(), path);
                Ok(STANDARD.encode(bytes))
            }
            ImageSource::Base64(data) => Ok(data.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_path_and_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.jpg");
        std::fs::write(&path, [0xffu8, 0xd8, 0xff]).unwrap();

        let from_file = ImageSource::Path(path.to_string_lossy().into_owned())
            .load()
            .await
            .unwrap();
        assert_eq!(from_file, "/9j/");

        let inline = ImageSource::Base64(" iVBORw0KGgo= \n".to_string());
        assert_eq!(inline.load().await.unwrap(), "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = ImageSource::Path("/nonexistent/card.jpg".to_string())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
