use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Writes digest files under a base directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        Ok(full_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("digests");
        let storage = LocalStorage::new(base.to_string_lossy().into_owned());

        let written = storage
            .write_file("summary-2026-10-16.txt", b"TOTAL: 0\n")
            .await
            .unwrap();

        assert!(written.ends_with("summary-2026-10-16.txt"));
        assert_eq!(
            fs::read_to_string(base.join("summary-2026-10-16.txt")).unwrap(),
            "TOTAL: 0\n"
        );
    }
}
