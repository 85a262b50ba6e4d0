// Trait definition for the external image store
//
// This is an INFRASTRUCTURE trait only - no business logic. Event-level
// decisions about when assets are attached, replaced or released live in
// the events domain.

use anyhow::Result;
use async_trait::async_trait;

/// Reference to an asset held by the external store.
///
/// `url` is what clients render; `public_id` is the opaque handle used to
/// delete the asset later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub public_id: String,
}

/// An image payload received from a client, ready to hand to the store.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload an image, returning the store's reference to it
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef>;

    /// Delete an image by its opaque identifier.
    ///
    /// Deleting an id the store no longer knows must succeed (idempotent).
    async fn delete(&self, public_id: &str) -> Result<()>;
}
