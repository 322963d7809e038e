//! Local preview handles for image files that have not been uploaded yet.

use std::collections::HashSet;
use uuid::Uuid;

/// An image file picked locally and held until submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Source of preview handles scoped to one editing session
///
/// Every handle returned by `create` is passed back to `release` exactly once.
pub trait PreviewStore {
    fn create(&mut self, file: &LocalFile) -> String;
    fn release(&mut self, handle: &str);
}

impl<P: PreviewStore + ?Sized> PreviewStore for &mut P {
    fn create(&mut self, file: &LocalFile) -> String {
        (**self).create(file)
    }

    fn release(&mut self, handle: &str) {
        (**self).release(handle)
    }
}

/// Issues `blob:` handles and tracks which ones are still live
#[derive(Debug, Default)]
pub struct BlobPreviewStore {
    live: HashSet<String>,
}

impl BlobPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &str) -> bool {
        self.live.contains(handle)
    }
}

impl PreviewStore for BlobPreviewStore {
    fn create(&mut self, file: &LocalFile) -> String {
        let handle = format!("blob:{}", Uuid::new_v4());
        tracing::trace!(handle = %handle, file_name = %file.file_name, "preview created");
        self.live.insert(handle.clone());
        handle
    }

    fn release(&mut self, handle: &str) {
        if !self.live.remove(handle) {
            tracing::warn!(handle = %handle, "released unknown preview handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_handles_are_unique_and_tracked() {
        let mut store = BlobPreviewStore::new();
        let file = LocalFile::new("a.png", "image/png", vec![1, 2, 3]);
        let first = store.create(&file);
        let second = store.create(&file);

        assert!(first.starts_with("blob:"));
        assert_ne!(first, second);
        assert_eq!(store.live_count(), 2);

        store.release(&first);
        assert!(!store.is_live(&first));
        assert!(store.is_live(&second));
    }
}
