//! Content extraction dispatch
//!
//! Each uploaded file is routed by media type to a strategy yielding text,
//! page images, or both. A batch is all-or-nothing.

mod document_parser;
mod pdf_renderer;

pub use document_parser::{extract_docx_text, extract_spreadsheet_csv};
pub use pdf_renderer::*;

use crate::ai::InlineImage;
use crate::config::AppConfig;
use crate::error::{LedgerError, Result};
use std::path::Path;
use std::sync::Arc;

/// Separator placed between the texts of different files
pub const STATEMENT_SEPARATOR: &str = "\n\n--- TÁCH BIỆT SAO KÊ ---\n\n";

const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const XLSX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MEDIA_TYPE: &str = "application/vnd.ms-excel";

/// An uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlob {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its media type from the extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            LedgerError::extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type, bytes))
    }
}

/// Strategy chosen for a media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Image,
    WordDocument,
    Spreadsheet,
    PlainText,
}

impl ContentKind {
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "application/pdf" => Self::Pdf,
            DOCX_MEDIA_TYPE => Self::WordDocument,
            XLSX_MEDIA_TYPE | XLS_MEDIA_TYPE => Self::Spreadsheet,
            t if t.starts_with("image/") => Self::Image,
            _ => Self::PlainText,
        }
    }
}

/// Result of extracting one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutput {
    pub text: Option<String>,
    pub images: Vec<InlineImage>,
}

/// Aggregate of a whole batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    /// Non-empty file texts joined with `STATEMENT_SEPARATOR`
    pub text: String,
    /// Every image of every file, in file order
    pub images: Vec<InlineImage>,
}

/// Routes files to extraction strategies
#[derive(Clone)]
pub struct ContentExtractor {
    rasterizer: Arc<dyn Rasterizer>,
}

impl ContentExtractor {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(default_rasterizer(config.pdf_render_scale))
    }

    /// Extract every file concurrently. Any failure fails the batch.
    pub async fn extract_batch(&self, files: Vec<FileBlob>) -> Result<ExtractedContent> {
        if files.is_empty() {
            return Err(LedgerError::extraction("no files to extract"));
        }

        tracing::info!("[Extraction] Extracting {} files", files.len());

        let tasks = files.into_iter().map(|file| {
            let rasterizer = self.rasterizer.clone();
            async move {
                let name = file.name.clone();
                tokio::task::spawn_blocking(move || extract_file(rasterizer.as_ref(), &file))
                    .await
                    .map_err(|e| LedgerError::extraction(format!("{}: task failed: {}", name, e)))?
            }
        });

        let outputs = futures::future::try_join_all(tasks).await?;
        let content = aggregate(outputs);

        tracing::info!(
            "[Extraction] Batch done: {} chars of text, {} images",
            content.text.len(),
            content.images.len()
        );
        Ok(content)
    }
}

/// Extract a single file with the strategy for its media type
pub fn extract_file(rasterizer: &dyn Rasterizer, file: &FileBlob) -> Result<ExtractionOutput> {
    if file.bytes.is_empty() {
        return Err(LedgerError::extraction(format!("{} is empty", file.name)));
    }

    let kind = ContentKind::from_media_type(&file.media_type);
    tracing::debug!("[Extraction] {} ({}) as {:?}", file.name, file.media_type, kind);

    let with_name = |e: LedgerError| match e {
        LedgerError::Extraction(msg) => LedgerError::Extraction(format!("{}: {}", file.name, msg)),
        other => other,
    };

    match kind {
        ContentKind::Pdf => {
            let pages = rasterizer.rasterize(&file.bytes).map_err(with_name)?;
            Ok(ExtractionOutput {
                text: None,
                images: pages
                    .iter()
                    .map(|png| InlineImage::from_bytes("image/png", png))
                    .collect(),
            })
        }
        ContentKind::Image => {
            if image::guess_format(&file.bytes).is_err() {
                tracing::warn!(
                    "[Extraction] {} is declared {} but its bytes are not a known image format",
                    file.name,
                    file.media_type
                );
            }
            Ok(ExtractionOutput {
                text: None,
                images: vec![InlineImage::from_bytes(file.media_type.clone(), &file.bytes)],
            })
        }
        ContentKind::WordDocument => Ok(ExtractionOutput {
            text: Some(extract_docx_text(&file.bytes).map_err(with_name)?),
            images: Vec::new(),
        }),
        ContentKind::Spreadsheet => Ok(ExtractionOutput {
            text: Some(extract_spreadsheet_csv(&file.bytes).map_err(with_name)?),
            images: Vec::new(),
        }),
        ContentKind::PlainText => Ok(ExtractionOutput {
            text: Some(String::from_utf8_lossy(&file.bytes).into_owned()),
            images: Vec::new(),
        }),
    }
}

/// Join texts in input order and flatten images
pub fn aggregate(outputs: Vec<ExtractionOutput>) -> ExtractedContent {
    let mut texts = Vec::new();
    let mut images = Vec::new();

    for output in outputs {
        if let Some(text) = output.text.filter(|t| !t.is_empty()) {
            texts.push(text);
        }
        images.extend(output.images);
    }

    ExtractedContent {
        text: texts.join(STATEMENT_SEPARATOR),
        images,
    }
}

/// Statement text handed to analysis: file text, then recognized image text
pub fn compose_statement_content(extracted_text: &str, recognized_text: Option<&str>) -> String {
    let mut content = extracted_text.to_string();
    if let Some(recognized) = recognized_text {
        content.push_str("\n\n");
        content.push_str(recognized);
    }
    content.trim().to_string()
}

/// Label shown for the current selection
pub fn display_file_name<S: AsRef<str>>(names: &[S]) -> String {
    if names.len() <= 3 {
        names
            .iter()
            .map(|n| n.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        format!("{} tệp đã chọn", names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Two fake pages per document
    struct FakeRasterizer {
        calls: AtomicUsize,
    }

    impl Rasterizer for FakeRasterizer {
        fn rasterize(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![b"page-1".to_vec(), b"page-2".to_vec()])
        }
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
            Err(LedgerError::extraction("no rendering surface"))
        }
    }

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(Arc::new(FakeRasterizer {
            calls: AtomicUsize::new(0),
        }))
    }

    fn text_file(name: &str, text: &str) -> FileBlob {
        FileBlob::new(name, "text/plain", text.as_bytes().to_vec())
    }

    #[test]
    fn test_media_type_routing() {
        assert_eq!(ContentKind::from_media_type("application/pdf"), ContentKind::Pdf);
        assert_eq!(ContentKind::from_media_type("image/jpeg"), ContentKind::Image);
        assert_eq!(ContentKind::from_media_type(DOCX_MEDIA_TYPE), ContentKind::WordDocument);
        assert_eq!(ContentKind::from_media_type(XLSX_MEDIA_TYPE), ContentKind::Spreadsheet);
        assert_eq!(ContentKind::from_media_type(XLS_MEDIA_TYPE), ContentKind::Spreadsheet);
        assert_eq!(ContentKind::from_media_type("text/csv"), ContentKind::PlainText);
        assert_eq!(
            ContentKind::from_media_type("application/octet-stream"),
            ContentKind::PlainText
        );
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_separator() {
        let content = extractor()
            .extract_batch(vec![
                text_file("a.txt", "A"),
                FileBlob::new("scan.png", "image/png", b"\x89PNG\r\n\x1a\n".to_vec()),
                text_file("b.txt", "B"),
            ])
            .await
            .unwrap();

        assert_eq!(content.text, format!("A{}B", STATEMENT_SEPARATOR));
        assert_eq!(content.images.len(), 1);
        assert_eq!(content.images[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_pdf_pages_become_png_images() {
        let content = extractor()
            .extract_batch(vec![FileBlob::new("s.pdf", "application/pdf", b"%PDF".to_vec())])
            .await
            .unwrap();

        assert_eq!(content.text, "");
        assert_eq!(content.images.len(), 2);
        assert!(content.images.iter().all(|i| i.mime_type == "image/png"));
    }

    #[tokio::test]
    async fn test_batch_fails_fast_on_any_error() {
        let extractor = ContentExtractor::new(Arc::new(FailingRasterizer));
        let err = extractor
            .extract_batch(vec![
                text_file("a.txt", "A"),
                FileBlob::new("s.pdf", "application/pdf", b"%PDF".to_vec()),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Extraction(_)));
        assert!(err.to_string().contains("s.pdf"));
    }

    #[tokio::test]
    async fn test_empty_file_and_empty_batch_rejected() {
        let err = extractor()
            .extract_batch(vec![text_file("empty.txt", "")])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Extraction(_)));

        assert!(extractor().extract_batch(vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_from_path_guesses_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.txt");
        std::fs::write(&path, "SỐ DƯ ĐẦU KỲ 1.000.000").unwrap();

        let blob = FileBlob::from_path(&path).await.unwrap();
        assert_eq!(blob.name, "statement.txt");
        assert_eq!(blob.media_type, "text/plain");
    }

    #[test]
    fn test_aggregate_skips_empty_text() {
        let content = aggregate(vec![
            ExtractionOutput {
                text: Some(String::new()),
                images: vec![],
            },
            ExtractionOutput {
                text: Some("X".to_string()),
                images: vec![],
            },
        ]);
        assert_eq!(content.text, "X");
    }

    #[test]
    fn test_plain_text_is_lossy_utf8() {
        let rasterizer = FakeRasterizer {
            calls: AtomicUsize::new(0),
        };
        let output = extract_file(&rasterizer, &FileBlob::new("x", "text/plain", vec![b'a', 0xFF]))
            .unwrap();
        assert_eq!(output.text.as_deref(), Some("a\u{FFFD}"));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_compose_statement_content() {
        assert_eq!(compose_statement_content("  text ", None), "text");
        assert_eq!(compose_statement_content("text", Some("ocr")), "text\n\nocr");
        assert_eq!(compose_statement_content("", Some("ocr")), "ocr");
    }

    #[test]
    fn test_display_file_name() {
        assert_eq!(display_file_name(&["a.pdf", "b.png"]), "a.pdf, b.png");
        assert_eq!(display_file_name(&["a", "b", "c"]), "a, b, c");
        assert_eq!(display_file_name(&["a", "b", "c", "d"]), "4 tệp đã chọn");
        assert_eq!(display_file_name::<&str>(&[]), "");
    }
}
