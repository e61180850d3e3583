use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tokio::sync::oneshot;

/// Pulls plain text out of a stored source document
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, String>;
}

/// File extensions accepted for upload, lowercase
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

pub fn is_supported_document(file_name: &str) -> bool {
    document_extension(Path::new(file_name))
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn document_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

struct ExtractRequest {
    path: PathBuf,
    reply: oneshot::Sender<Result<String, String>>,
}

/// PDF text extraction on a dedicated OS thread.
///
/// PDFium keeps global state and is not thread safe, so the library is bound
/// once, on first use, by the worker thread and never leaves it. Requests are
/// served one at a time in arrival order.
pub struct PdfTextExtractor {
    sender: mpsc::Sender<ExtractRequest>,
}

impl PdfTextExtractor {
    /// `library_dir` points at a directory holding the platform PDFium
    /// library; without it the system library search path is used
    pub fn spawn(library_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<ExtractRequest>();

        std::thread::Builder::new()
            .name("pdfium-worker".to_string())
            .spawn(move || {
                let mut pdfium: Option<Pdfium> = None;

                for request in receiver {
                    if pdfium.is_none() {
                        match bind_pdfium(library_dir.as_deref()) {
                            Ok(bound) => pdfium = Some(bound),
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to bind PDFium");
                                let _ = request.reply.send(Err(e));
                                continue;
                            }
                        }
                    }

                    let result = match pdfium.as_ref() {
                        Some(pdfium) => extract_pdf_text(pdfium, &request.path),
                        None => Err("PDFium library unavailable".to_string()),
                    };
                    // The requester may have gone away
                    let _ = request.reply.send(result);
                }

                tracing::debug!("PDFium worker shutting down");
            })?;

        Ok(Self { sender })
    }
}

fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("PDFium library unavailable: {}", e))?;

    tracing::info!(library_dir = ?library_dir, "PDFium bound");
    Ok(Pdfium::new(bindings))
}

/// Page texts joined in page order, each followed by a form feed
fn extract_pdf_text(pdfium: &Pdfium, path: &Path) -> Result<String, String> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| format!("Failed to open PDF {}: {}", path.display(), e))?;

    let mut text = String::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| format!("Failed to read text of page {}: {}", page_index + 1, e))?;
        text.push_str(&page_text.all());
        text.push_str("\n\x0c");
    }

    Ok(text)
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, String> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ExtractRequest {
                path: path.to_path_buf(),
                reply,
            })
            .map_err(|_| "PDF extraction worker is not running".to_string())?;

        response
            .await
            .map_err(|_| "PDF extraction worker dropped the request".to_string())?
    }
}

/// Routes a document to the right extractor by file extension
pub struct DocumentTextExtractor {
    pdf: Box<dyn TextExtractor>,
}

impl DocumentTextExtractor {
    pub fn new(pdf: Box<dyn TextExtractor>) -> Self {
        Self { pdf }
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String, String> {
        let start_time = std::time::Instant::now();

        let text = match document_extension(path).as_deref() {
            Some("pdf") => self.pdf.extract_text(path).await?,
            Some("txt") => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                String::from_utf8(bytes)
                    .map_err(|_| format!("{} is not valid UTF-8 text", path.display()))?
            }
            other => {
                return Err(format!(
                    "Unsupported document type: {}",
                    other.unwrap_or("(none)")
                ))
            }
        };

        tracing::debug!(
            path = %path.display(),
            text_chars = text.chars().count(),
            latency_ms = start_time.elapsed().as_millis(),
            "Document text extracted"
        );

        Ok(text)
    }
}
