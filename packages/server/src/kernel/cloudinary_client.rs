use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use super::{ImageRef, ImageStore, ImageUpload};

/// Cloudinary client implementation of ImageStore
///
/// Uploads go to the unsigned-size-limited signed upload endpoint; deletes
/// use the destroy endpoint. Both are authenticated with the account's
/// api_key plus a SHA-256 signature over the sorted request parameters.
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: Client::new(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    /// Sign request parameters: sha256 over "k1=v1&k2=v2" (keys sorted)
    /// with the api_secret appended.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud_name, action
        )
    }
}

#[async_trait]
impl ImageStore for CloudinaryClient {
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature)
            .part(
                "file",
                Part::bytes(image.bytes).file_name(image.filename.clone()),
            );

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .context("Cloudinary upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloudinary upload error {}: {}", status, body);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .context("Invalid Cloudinary upload response")?;

        info!(public_id = %uploaded.public_id, "Uploaded image to Cloudinary");

        Ok(ImageRef {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", public_id),
            ("signature_algorithm", "sha256"),
            ("timestamp", &timestamp),
        ]);

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await
            .context("Cloudinary destroy request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Cloudinary destroy error {}: {}", status, body);
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .context("Invalid Cloudinary destroy response")?;

        // "not found" means the asset is already gone, which is the state
        // we were asked to reach.
        match destroyed.result.as_str() {
            "ok" | "not found" => {
                info!(public_id, result = %destroyed.result, "Deleted image from Cloudinary");
                Ok(())
            }
            other => anyhow::bail!("Cloudinary destroy rejected {}: {}", public_id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_sorted_and_stable() {
        let client = CloudinaryClient::new(
            "demo".to_string(),
            "key".to_string(),
            "secret".to_string(),
        );

        // Parameter order must not change the signature
        let a = client.sign(&[("timestamp", "123"), ("public_id", "events/x")]);
        let b = client.sign(&[("public_id", "events/x"), ("timestamp", "123")]);
        assert_eq!(a, b);

        // sha256("public_id=events/x&timestamp=123" + "secret")
        let mut hasher = Sha256::new();
        hasher.update(b"public_id=events/x&timestamp=123secret");
        assert_eq!(a, hex::encode(hasher.finalize()));
    }
}
