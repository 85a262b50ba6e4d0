use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::kernel::{ImageRef, ImageStore, ImageUpload};

/// Coordinates the externally stored event image with the event lifecycle.
///
/// Uploads are load-bearing: an event cannot be created (or have its image
/// swapped) without a stored asset, so upload failures propagate. Deletes
/// are best-effort: the record mutation is the primary contract, and a
/// dangling asset in the store is preferable to a half-applied event
/// mutation, so delete failures are logged and absorbed here.
#[derive(Clone)]
pub struct AssetCoordinator {
    store: Arc<dyn ImageStore>,
}

impl AssetCoordinator {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Store the initial image for an event being created
    pub async fn attach(&self, image: ImageUpload) -> Result<ImageRef> {
        self.store.upload(image).await
    }

    /// Store a replacement image, then try to drop the old one.
    ///
    /// The new asset is uploaded before anything is destroyed; if the upload
    /// fails the event still has its previous, intact reference.
    pub async fn replace(&self, old_public_id: &str, image: ImageUpload) -> Result<ImageRef> {
        let new_ref = self.store.upload(image).await?;

        if let Err(error) = self.store.delete(old_public_id).await {
            warn!(
                public_id = old_public_id,
                %error,
                "Failed to delete replaced event image; leaving it in the store"
            );
        }

        Ok(new_ref)
    }

    /// Try to drop the image of an event being deleted
    pub async fn release(&self, public_id: &str) {
        if let Err(error) = self.store.delete(public_id).await {
            warn!(
                public_id,
                %error,
                "Failed to delete event image during cleanup; leaving it in the store"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MockImageStore;

    fn image() -> ImageUpload {
        ImageUpload {
            bytes: vec![0xFF, 0xD8],
            filename: "cover.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_replace_uploads_before_deleting() {
        let store = MockImageStore::new();
        let coordinator = AssetCoordinator::new(Arc::new(store.clone()));

        let new_ref = coordinator.replace("test/old", image()).await.unwrap();

        assert_eq!(store.uploaded(), vec!["cover.jpg"]);
        assert_eq!(store.deleted(), vec!["test/old"]);
        assert_ne!(new_ref.public_id, "test/old");
    }

    #[tokio::test]
    async fn test_replace_swallows_delete_failure() {
        let store = MockImageStore::new().with_failing_deletes();
        let coordinator = AssetCoordinator::new(Arc::new(store.clone()));

        let result = coordinator.replace("test/old", image()).await;

        assert!(result.is_ok());
        assert_eq!(store.deleted(), vec!["test/old"]);
    }

    #[tokio::test]
    async fn test_replace_fails_without_touching_old_asset() {
        let store = MockImageStore::new().with_failing_uploads();
        let coordinator = AssetCoordinator::new(Arc::new(store.clone()));

        let result = coordinator.replace("test/old", image()).await;

        assert!(result.is_err());
        // Upload failed, so the old asset was never deleted
        assert!(store.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_release_swallows_failure() {
        let store = MockImageStore::new().with_failing_deletes();
        let coordinator = AssetCoordinator::new(Arc::new(store.clone()));

        coordinator.release("test/gone").await;

        assert_eq!(store.deleted(), vec!["test/gone"]);
    }
}
