//! Tesseract-backed recognition engine.

use super::{RecognitionConfig, Recognizer, RecognizeError, Whitelist};
use image::GrayImage;
use tesseract::Tesseract;

/// Recognition through the Tesseract C API.
///
/// The underlying API consumes itself on every configuration step, so
/// the handle is taken and put back around each call.
pub struct TesseractEngine {
    api: Option<Tesseract>,
}

impl TesseractEngine {
    /// Initializes Tesseract with the configured trained data.
    pub fn new(config: &RecognitionConfig) -> Result<Self, RecognizeError> {
        let data_path = config
            .data_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let api = Tesseract::new(data_path.as_deref(), Some(&config.language))
            .map_err(|e| RecognizeError::Unavailable(e.to_string()))?;

        tracing::info!(language = %config.language, "Tesseract initialized");
        Ok(Self { api: Some(api) })
    }

    fn run(api: Tesseract, image: &GrayImage, whitelist: &Whitelist) -> Result<(Tesseract, String), RecognizeError> {
        let mut api = api
            .set_variable("tessedit_char_whitelist", whitelist.as_str())
            .map_err(|e| RecognizeError::Failed(e.to_string()))?
            .set_frame(
                image.as_raw(),
                image.width() as i32,
                image.height() as i32,
                1,
                image.width() as i32,
            )
            .map_err(|e| RecognizeError::Failed(e.to_string()))?
            .recognize()
            .map_err(|e| RecognizeError::Failed(e.to_string()))?;

        let text = api
            .get_text()
            .map_err(|e| RecognizeError::Failed(e.to_string()))?;
        Ok((api, text))
    }
}

impl Recognizer for TesseractEngine {
    fn recognize(&mut self, image: &GrayImage, whitelist: &Whitelist) -> Result<String, RecognizeError> {
        let api = self
            .api
            .take()
            .ok_or_else(|| RecognizeError::Unavailable("engine lost after a failed call".to_string()))?;

        let (api, text) = Self::run(api, image, whitelist)?;
        self.api = Some(api);
        Ok(text)
    }
}
