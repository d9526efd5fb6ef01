//! 블롭 스토리지 추상화
//!
//! [`BlobStore`]는 봉인된 배치를 `put(path, bytes)` 한 번으로 넘겨받는 저장소입니다.
//! 운영 구현은 `object_store` 크레이트를 감싼 [`ObjectBlobStore`]이며,
//! `storage.platform` 설정에 따라 백엔드를 선택합니다.
//!
//! | platform | 백엔드 | bucket 의미 |
//! |---|---|---|
//! | `gcp` | Google Cloud Storage | 버킷 이름 |
//! | `aws` | Amazon S3 | 버킷 이름 |
//! | `local` | 로컬 파일시스템 | 루트 디렉토리 |
//! | `memory` | 프로세스 내 메모리 | 무시 |
//!
//! 클라우드 자격 증명은 각 SDK의 표준 환경변수(`GOOGLE_APPLICATION_CREDENTIALS`,
//! `AWS_ACCESS_KEY_ID` 등)에서 읽습니다.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use tracing::info;

use flatstore_core::config::StorageConfig;

use crate::error::SinkError;

/// 블롭 스토리지 trait
///
/// 구현체는 `Send + Sync + 'static`이어야 컨트롤러 태스크로 이동할 수 있습니다.
pub trait BlobStore: Send + Sync + 'static {
    /// `path`에 `data`를 저장합니다. 재시도하지 않습니다.
    fn put(&self, path: &str, data: Bytes) -> impl Future<Output = Result<(), SinkError>> + Send;
}

impl<T: BlobStore> BlobStore for Arc<T> {
    fn put(&self, path: &str, data: Bytes) -> impl Future<Output = Result<(), SinkError>> + Send {
        (**self).put(path, data)
    }
}

/// `object_store` 기반 블롭 스토리지
#[derive(Clone)]
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    platform: String,
    bucket: String,
    project: String,
}

impl fmt::Debug for ObjectBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBlobStore")
            .field("platform", &self.platform)
            .field("bucket", &self.bucket)
            .field("project", &self.project)
            .finish()
    }
}

impl ObjectBlobStore {
    /// 이미 만들어진 `ObjectStore`를 감쌉니다.
    pub fn new(store: Arc<dyn ObjectStore>, platform: impl Into<String>) -> Self {
        Self {
            store,
            platform: platform.into(),
            bucket: String::new(),
            project: String::new(),
        }
    }

    /// 프로세스 내 메모리 저장소를 생성합니다.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory")
    }

    /// 스토리지 설정으로 백엔드 클라이언트를 생성합니다.
    ///
    /// 클라이언트를 만들 수 없으면 에러를 반환하며, 데몬은 이를 시작 실패로 처리합니다.
    pub fn from_config(config: &StorageConfig) -> Result<Self, SinkError> {
        let init_err = |reason: String| SinkError::StorageInit {
            platform: config.platform.clone(),
            reason,
        };

        let store: Arc<dyn ObjectStore> = match config.platform.as_str() {
            "gcp" => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&config.bucket)
                    .build()
                    .map_err(|e| init_err(e.to_string()))?,
            ),
            "aws" => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(&config.bucket)
                    .build()
                    .map_err(|e| init_err(e.to_string()))?,
            ),
            "local" => {
                std::fs::create_dir_all(&config.bucket)
                    .map_err(|e| init_err(format!("{}: {e}", config.bucket)))?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&config.bucket)
                        .map_err(|e| init_err(e.to_string()))?,
                )
            }
            "memory" => Arc::new(InMemory::new()),
            other => return Err(init_err(format!("unsupported platform '{other}'"))),
        };

        info!(
            platform = config.platform.as_str(),
            bucket = config.bucket.as_str(),
            project = config.project.as_str(),
            "blob storage client initialized"
        );

        Ok(Self {
            store,
            platform: config.platform.clone(),
            bucket: config.bucket.clone(),
            project: config.project.clone(),
        })
    }

    /// 플랫폼 이름을 반환합니다.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// 내부 `ObjectStore` 핸들을 반환합니다 (조회/검증용).
    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }
}

impl BlobStore for ObjectBlobStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), SinkError> {
        let location = ObjectPath::parse(path).map_err(|e| SinkError::Upload {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        self.store
            .put(&location, data.into())
            .await
            .map_err(|e| SinkError::Upload {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(platform: &str, bucket: &str) -> StorageConfig {
        StorageConfig {
            platform: platform.to_owned(),
            bucket: bucket.to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = ObjectBlobStore::in_memory();
        store
            .put("parquet/2024-01-01/00-00/a.parquet", Bytes::from_static(b"PAR1"))
            .await
            .unwrap();

        let got = store
            .object_store()
            .get(&ObjectPath::from("parquet/2024-01-01/00-00/a.parquet"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&got[..], b"PAR1");
    }

    #[tokio::test]
    async fn local_store_writes_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("bucket");
        let store =
            ObjectBlobStore::from_config(&storage("local", root.to_str().unwrap())).unwrap();
        store
            .put("parquet/2024-01-01/12-30/b.parquet", Bytes::from_static(b"data"))
            .await
            .unwrap();

        let written = std::fs::read(root.join("parquet/2024-01-01/12-30/b.parquet")).unwrap();
        assert_eq!(written, b"data");
    }

    #[tokio::test]
    async fn invalid_path_is_upload_error() {
        let store = ObjectBlobStore::in_memory();
        let err = store
            .put("parquet//../x.parquet", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Upload { .. }));
    }

    #[test]
    fn unknown_platform_fails_init() {
        let err = ObjectBlobStore::from_config(&storage("azure", "b")).unwrap_err();
        assert!(matches!(err, SinkError::StorageInit { .. }));
    }

    #[test]
    fn debug_output_names_platform() {
        let store = ObjectBlobStore::from_config(&storage("memory", "")).unwrap();
        assert_eq!(store.platform(), "memory");
        assert!(format!("{store:?}").contains("memory"));
    }
}
