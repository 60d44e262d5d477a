//! Scene store connection settings.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use audit_common::{AuditError, Result};
use object_store::{aws::AmazonS3Builder, local::LocalFileSystem, ObjectStore};
use serde::{Deserialize, Serialize};

/// Where scene objects live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SceneStoreConfig {
    /// A directory on the local filesystem.
    Local { root: PathBuf },
    /// An S3-compatible bucket (AWS or MinIO).
    S3(S3Config),
}

/// S3/MinIO connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "scene-archive".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl Default for SceneStoreConfig {
    fn default() -> Self {
        SceneStoreConfig::Local {
            root: PathBuf::from("./data/scenes"),
        }
    }
}

impl SceneStoreConfig {
    /// Read from `SCENE_STORE` (`local` or `s3`) and the matching variables.
    ///
    /// Local: `SCENE_STORE_ROOT`. S3: `S3_ENDPOINT`, `S3_BUCKET`,
    /// `S3_ACCESS_KEY`, `S3_SECRET_KEY`, `S3_REGION`.
    pub fn from_env() -> Self {
        match env::var("SCENE_STORE").as_deref() {
            Ok("s3") => {
                let defaults = S3Config::default();
                let endpoint = env::var("S3_ENDPOINT").unwrap_or(defaults.endpoint);
                SceneStoreConfig::S3(S3Config {
                    allow_http: endpoint.starts_with("http://"),
                    endpoint,
                    bucket: env::var("S3_BUCKET").unwrap_or(defaults.bucket),
                    access_key_id: env::var("S3_ACCESS_KEY").unwrap_or(defaults.access_key_id),
                    secret_access_key: env::var("S3_SECRET_KEY")
                        .unwrap_or(defaults.secret_access_key),
                    region: env::var("S3_REGION").unwrap_or(defaults.region),
                })
            }
            _ => SceneStoreConfig::Local {
                root: env::var("SCENE_STORE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data/scenes")),
            },
        }
    }

    /// Open the configured backend.
    pub fn build(&self) -> Result<Arc<dyn ObjectStore>> {
        match self {
            SceneStoreConfig::Local { root } => {
                std::fs::create_dir_all(root)?;
                let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
                    AuditError::Storage(format!(
                        "Failed to open scene store at {}: {}",
                        root.display(),
                        e
                    ))
                })?;
                Ok(Arc::new(store))
            }
            SceneStoreConfig::S3(s3) => {
                let mut builder = AmazonS3Builder::new()
                    .with_endpoint(&s3.endpoint)
                    .with_bucket_name(&s3.bucket)
                    .with_access_key_id(&s3.access_key_id)
                    .with_secret_access_key(&s3.secret_access_key)
                    .with_region(&s3.region);

                if s3.allow_http {
                    builder = builder.with_allow_http(true);
                }

                let store = builder.build().map_err(|e| {
                    AuditError::Storage(format!("Failed to create S3 client: {}", e))
                })?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config_from_yaml_shape() {
        let json = r#"{"backend": "local", "root": "/tmp/scenes"}"#;
        let config: SceneStoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            SceneStoreConfig::Local {
                root: PathBuf::from("/tmp/scenes")
            }
        );
    }

    #[test]
    fn test_s3_config_is_flattened() {
        let json = r#"{
            "backend": "s3",
            "endpoint": "http://localhost:9000",
            "bucket": "scenes",
            "access_key_id": "a",
            "secret_access_key": "b",
            "region": "us-east-1",
            "allow_http": true
        }"#;
        let config: SceneStoreConfig = serde_json::from_str(json).unwrap();
        match config {
            SceneStoreConfig::S3(s3) => assert_eq!(s3.bucket, "scenes"),
            other => panic!("expected s3, got {:?}", other),
        }
    }

    #[test]
    fn test_build_local_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("scenes");
        let config = SceneStoreConfig::Local { root: root.clone() };
        assert!(config.build().is_ok());
        assert!(root.is_dir());
    }
}
