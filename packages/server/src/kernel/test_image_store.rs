// MockImageStore - mock image store for testing
//
// Records every upload and delete so tests can assert on the calls, and can
// be configured to fail either operation to exercise the best-effort paths.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::{ImageRef, ImageStore, ImageUpload};

#[derive(Clone, Default)]
pub struct MockImageStore {
    uploads: Arc<Mutex<Vec<String>>>,
    deletes: Arc<Mutex<Vec<String>>>,
    fail_uploads: Arc<Mutex<bool>>,
    fail_deletes: Arc<Mutex<bool>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent upload returns an error
    pub fn with_failing_uploads(self) -> Self {
        *self.fail_uploads.lock().unwrap() = true;
        self
    }

    /// Every subsequent delete returns an error
    pub fn with_failing_deletes(self) -> Self {
        *self.fail_deletes.lock().unwrap() = true;
        self
    }

    /// Filenames passed to upload, in call order
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// Public ids passed to delete, in call order (including failed calls)
    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef> {
        if *self.fail_uploads.lock().unwrap() {
            anyhow::bail!("mock image store: upload failure");
        }

        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(image.filename.clone());
        let n = uploads.len();

        Ok(ImageRef {
            url: format!("https://images.test/{}/{}", n, image.filename),
            public_id: format!("test/{}", n),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        // Record the attempt even when configured to fail, so tests can
        // assert the store was asked.
        self.deletes.lock().unwrap().push(public_id.to_string());

        if *self.fail_deletes.lock().unwrap() {
            anyhow::bail!("mock image store: delete failure");
        }

        Ok(())
    }
}
