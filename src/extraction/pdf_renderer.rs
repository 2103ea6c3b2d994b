//! PDF Rendering Module
//!
//! Converts PDF pages to PNG images for OCR.
//!
//! Note: the pdfium backend requires the `pdfium` feature and the pdfium
//! library on the host.
//! On macOS: brew install pdfium
//! On Linux: apt install libpdfium-dev
//! On Windows: Download from https://github.com/bblanchon/pdfium-binaries

use crate::error::Result;
#[cfg(not(feature = "pdfium"))]
use crate::error::LedgerError;
use std::sync::Arc;

/// Document bytes to ordered page images
pub trait Rasterizer: Send + Sync {
    /// One PNG per page, in page order
    fn rasterize(&self, pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>>;
}

/// Pick the best available backend
pub fn default_rasterizer(scale: f32) -> Arc<dyn Rasterizer> {
    #[cfg(feature = "pdfium")]
    {
        tracing::info!("[PdfRenderer] Using pdfium backend at scale {}", scale);
        Arc::new(pdfium_backend::PdfiumRasterizer::new(scale))
    }
    #[cfg(not(feature = "pdfium"))]
    {
        tracing::warn!(
            "[PdfRenderer] Built without pdfium, PDF uploads will be rejected (scale {} unused)",
            scale
        );
        Arc::new(UnavailableRasterizer)
    }
}

/// Backend used when no rendering surface exists
#[cfg(not(feature = "pdfium"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRasterizer;

#[cfg(not(feature = "pdfium"))]
impl Rasterizer for UnavailableRasterizer {
    fn rasterize(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
        Err(LedgerError::extraction(
            "no rendering surface available for PDF pages (build with the `pdfium` feature)",
        ))
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use super::Rasterizer;
    use crate::error::{LedgerError, Result};
    use image::ImageFormat;
    use pdfium_render::prelude::*;
    use std::io::Cursor;

    /// pdfium-backed renderer
    pub struct PdfiumRasterizer {
        scale: f32,
    }

    impl PdfiumRasterizer {
        pub fn new(scale: f32) -> Self {
            Self { scale }
        }

        fn bind() -> Result<Pdfium> {
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| {
                    LedgerError::extraction(format!("no rendering surface available: {}", e))
                })?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl Rasterizer for PdfiumRasterizer {
        fn rasterize(&self, pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
            let pdfium = Self::bind()?;

            let document = pdfium
                .load_pdf_from_byte_slice(pdf_bytes, None)
                .map_err(|e| LedgerError::extraction(format!("Failed to load PDF: {}", e)))?;

            let config = PdfRenderConfig::new()
                .scale_page_by_factor(self.scale)
                .render_form_data(true)
                .render_annotations(true);

            let mut pages = Vec::new();
            for (index, page) in document.pages().iter().enumerate() {
                let bitmap = page.render_with_config(&config).map_err(|e| {
                    LedgerError::extraction(format!("Failed to render page {}: {}", index + 1, e))
                })?;

                let mut buffer = Vec::new();
                bitmap
                    .as_image()
                    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                    .map_err(|e| LedgerError::extraction(format!("Failed to encode page: {}", e)))?;
                pages.push(buffer);
            }

            tracing::info!("[PdfRenderer] Rendered {} pages", pages.len());
            Ok(pages)
        }
    }
}
