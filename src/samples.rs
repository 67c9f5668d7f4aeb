// src/samples.rs
//! Sample screenshots served from disk for local development

use anyhow::Result;
use std::path::PathBuf;

use crate::core::FsOps;

const SAMPLE_PREFIX: &str = "Screenshot";
const SAMPLE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Debug, Clone)]
pub struct SampleStore {
    dir: PathBuf,
}

impl SampleStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn is_sample_name(name: &str) -> bool {
        name.starts_with(SAMPLE_PREFIX)
            && FsOps::extension_lowercase(name)
                .map(|ext| SAMPLE_EXTENSIONS.contains(&ext.as_str()))
                .unwrap_or(false)
    }

    /// Sample file names, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let names = FsOps::list_file_names(&self.dir).await?;
        Ok(names
            .into_iter()
            .filter(|name| Self::is_sample_name(name))
            .collect())
    }

    /// Bytes of one file in the sample directory, `None` when it does not exist
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if !FsOps::is_plain_file_name(name) {
            return Ok(None);
        }

        let path = self.dir.join(name);
        if !path.is_file() {
            return Ok(None);
        }

        FsOps::read_bytes(&path).await.map(Some)
    }

    /// Bytes of every listed sample, in list order
    pub async fn load_all(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut samples = Vec::new();
        for name in self.list().await? {
            if let Some(bytes) = self.read(&name).await? {
                samples.push((name, bytes));
            }
        }
        Ok(samples)
    }

    /// `image/<ext>` for a sample name
    pub fn content_type(name: &str) -> String {
        match FsOps::extension_lowercase(name).as_deref() {
            Some("jpg") => "image/jpeg".to_string(),
            Some(ext) if !ext.is_empty() => format!("image/{}", ext),
            _ => "application/octet-stream".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(files: &[&str]) -> SampleStore {
        let dir = std::env::temp_dir().join(format!("redflag_samples_{}", uuid::Uuid::new_v4()));
        for name in files {
            FsOps::write_bytes(&dir.join(name), name.as_bytes()).await.unwrap();
        }
        SampleStore::new(dir)
    }

    #[tokio::test]
    async fn test_list_filters_screenshots() {
        let store = store_with(&[
            "Screenshot 2.PNG",
            "Screenshot 1.jpg",
            "image1.png",
            "Screenshot notes.txt",
            "Screenshot 3.gif",
        ])
        .await;

        let names = store.list().await.unwrap();
        assert_eq!(
            names,
            vec!["Screenshot 1.jpg", "Screenshot 2.PNG", "Screenshot 3.gif"]
        );

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_read_existing_and_missing() {
        let store = store_with(&["image1.png"]).await;

        assert_eq!(
            store.read("image1.png").await.unwrap(),
            Some(b"image1.png".to_vec())
        );
        assert_eq!(store.read("image9.png").await.unwrap(), None);
        assert_eq!(store.read("../image1.png").await.unwrap(), None);

        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn test_missing_directory_lists_nothing() {
        let store = SampleStore::new(std::env::temp_dir().join(format!(
            "redflag_none_{}",
            uuid::Uuid::new_v4()
        )));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(SampleStore::content_type("a.png"), "image/png");
        assert_eq!(SampleStore::content_type("a.JPG"), "image/jpeg");
        assert_eq!(SampleStore::content_type("a.jpeg"), "image/jpeg");
        assert_eq!(SampleStore::content_type("a"), "application/octet-stream");
    }
}
