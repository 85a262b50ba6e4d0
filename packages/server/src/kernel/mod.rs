//! Kernel module - server infrastructure and dependencies.

pub mod cloudinary_client;
pub mod image_store;
pub mod test_image_store;

pub use cloudinary_client::CloudinaryClient;
pub use image_store::{ImageRef, ImageStore, ImageUpload};
pub use test_image_store::MockImageStore;
