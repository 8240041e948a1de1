use serde::{Deserialize, Serialize};

/// Most item lines a single scan will suggest.
pub const MAX_ITEMS: usize = 5;

/// Best-effort reading of a receipt's OCR text.
///
/// Nothing here is validated against the actual receipt; every field is a
/// suggestion the user may overwrite before the expense is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedReceipt {
    /// Largest currency-like number in the text, as a decimal string.
    pub amount: Option<String>,
    /// Vendor guess. Empty only when the text had no lines at all.
    pub merchant: String,
    /// First date-shaped token, exactly as printed.
    pub date: Option<String>,
    /// Up to [`MAX_ITEMS`] candidate line items, in receipt order.
    pub items: Vec<String>,
}

impl ScannedReceipt {
    /// True when the scan produced nothing worth prefilling.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.merchant.is_empty()
            && self.date.is_none()
            && self.items.is_empty()
    }
}
