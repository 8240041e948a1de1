use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Prefix every uploaded object lives under.
const BUCKET: &str = "receipts";

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Object key for content with the given hash.
/// Layout: `receipts/<first_2_hex_chars>/<full_hex>.<ext>`
fn object_path(hash_hex: &str, ext: &str) -> String {
    let shard = hash_hex.get(..2).unwrap_or("00");
    format!("{BUCKET}/{shard}/{hash_hex}.{ext}")
}

fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        "bin".to_string()
    } else {
        ext
    }
}

/// Content-addressed store for receipt images.
///
/// Uploading the same bytes twice yields the same object path and leaves a
/// single file on disk.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    root: PathBuf,
    public_base_url: String,
}

impl ReceiptStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self { root, public_base_url: public_base_url.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `data` and return its object path.
    pub async fn upload_file(&self, data: &[u8], ext: &str) -> io::Result<String> {
        let hash_hex = to_hex(&sha256_bytes(data));
        let key = object_path(&hash_hex, &normalize_ext(ext));
        let dest = self.local_path(&key);

        if tokio::fs::try_exists(&dest).await? {
            tracing::debug!(%key, "receipt already stored");
            return Ok(key);
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, data).await?;
        tracing::info!(%key, bytes = data.len(), "receipt uploaded");
        Ok(key)
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            object_path.trim_start_matches('/')
        )
    }

    pub fn local_path(&self, object_path: &str) -> PathBuf {
        self.root.join(object_path)
    }
}
