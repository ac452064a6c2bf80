use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::application::ports::ObjectStorePort;
use crate::domain::errors::{DomainError, DomainResult};

/// Almacén de objetos en disco: `<raíz>/<YYYYMMDD>/<uuid><ext>`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn object_name(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}/{}{}", Local::now().format("%Y%m%d"), Uuid::new_v4().simple(), ext)
}

#[async_trait]
impl ObjectStorePort for LocalObjectStore {
    async fn put(&self, data: &[u8], filename: &str, content_type: &str) -> DomainResult<String> {
        let name = object_name(filename);
        let path = self.root.join(&name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::OperationFailed(format!("creando {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| DomainError::OperationFailed(format!("escribiendo {}: {e}", path.display())))?;

        info!("📦 Guardado {name} ({content_type}, {} bytes)", data.len());
        Ok(format!("file://{}", path.display()))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_under_dated_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let url = store.put(b"jpeg-bytes", "input_1.JPG", "image/jpeg").await.unwrap();

        let path = url.strip_prefix("file://").unwrap();
        assert!(path.ends_with(".jpg"));
        assert_eq!(std::fs::read(path).unwrap(), b"jpeg-bytes");
        let day = Local::now().format("%Y%m%d").to_string();
        assert!(path.contains(&day));
    }

    #[tokio::test]
    async fn consecutive_names_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let a = store.put(b"a", "x.png", "image/png").await.unwrap();
        let b = store.put(b"b", "x.png", "image/png").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn odd_extensions_are_dropped() {
        assert!(!object_name("evil.j/pg").contains('.'));
        let name = object_name("noext");
        let (_, stem) = name.split_once('/').unwrap();
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
