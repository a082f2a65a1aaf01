use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use scanpass_core::{QrCodeError, QrCodeRenderer};

pub const DEFAULT_QR_IMAGE_SIZE: u32 = 256;

/// Renders payloads as PNG QR codes at medium error correction.
#[derive(Debug, Clone, Copy)]
pub struct PngQrCodeRenderer {
    size: u32,
}

impl PngQrCodeRenderer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }
}

impl Default for PngQrCodeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_QR_IMAGE_SIZE)
    }
}

impl QrCodeRenderer for PngQrCodeRenderer {
    fn render_data_uri(&self, payload: &str) -> Result<String, QrCodeError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|e| QrCodeError::Encoding(e.to_string()))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(self.size, self.size)
            .build();

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| QrCodeError::Rendering(e.to_string()))?;

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
    }
}
