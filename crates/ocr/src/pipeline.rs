use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::extract::ReceiptTextExtractor;
use crate::recognizer::OcrBackend;
use crate::types::ScannedReceipt;

pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether recognition produced the text the receipt was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Recognized,
    /// Recognition failed; the receipt is all defaults and the user should
    /// enter the expense manually.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub ocr_text: String,
    pub receipt: ScannedReceipt,
    pub status: ScanStatus,
}

impl ScanOutcome {
    pub fn recognized(&self) -> bool {
        self.status == ScanStatus::Recognized
    }
}

/// Orchestrates: OCR (blocking pool, timeout-bound) → text extraction.
///
/// Recognition problems never surface as errors: the extractor is fed an
/// empty string instead, which yields an all-default receipt.
#[derive(Clone)]
pub struct ReceiptScanner {
    backend: Arc<dyn OcrBackend>,
    timeout: Duration,
}

impl ReceiptScanner {
    pub fn new(backend: Arc<dyn OcrBackend>) -> Self {
        Self { backend, timeout: DEFAULT_OCR_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip recognition and extract from text obtained elsewhere.
    pub fn scan_text(text: &str) -> ScanOutcome {
        ScanOutcome {
            ocr_text: text.to_string(),
            receipt: ReceiptTextExtractor::extract(text),
            status: ScanStatus::Recognized,
        }
    }

    pub async fn scan_file(&self, path: &Path) -> Result<ScanOutcome, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(self.scan_bytes(bytes).await)
    }

    pub async fn scan_bytes(&self, image: Vec<u8>) -> ScanOutcome {
        let backend = Arc::clone(&self.backend);
        let task = tokio::task::spawn_blocking(move || backend.recognize(&image));

        let failure = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(text))) => return Self::scan_text(&text),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join)) => format!("recognizer task failed: {join}"),
            Err(_) => format!("recognition timed out after {:?}", self.timeout),
        };

        tracing::warn!(reason = %failure, "OCR failed, continuing with empty text");
        ScanOutcome {
            ocr_text: String::new(),
            receipt: ReceiptTextExtractor::extract(""),
            status: ScanStatus::Failed(failure),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
