pub mod extract;
pub mod pipeline;
pub mod prefill;
pub mod recognizer;
pub mod types;

pub use extract::ReceiptTextExtractor;
pub use pipeline::{PipelineError, ReceiptScanner, ScanOutcome, ScanStatus};
pub use prefill::{parse_receipt_date, ExpenseDraft};
pub use recognizer::{default_backend, MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::{ScannedReceipt, MAX_ITEMS};
