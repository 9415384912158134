//! In-process backend double that records calls instead of running yt-dlp.

use super::{
    backend::ExtractionBackend, error::BackendError, output::OutputTarget, types::RawInfo,
};
use async_trait::async_trait;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};
use url::Url;

enum Behavior {
    Metadata(serde_json::Value),
    Fail(fn() -> BackendError),
    Write { name: String, data: Vec<u8> },
    Claim(PathBuf),
}

pub struct FakeBackend {
    behavior: Behavior,
    metadata_calls: AtomicUsize,
    materialize_calls: AtomicUsize,
    last_format_id: Mutex<Option<String>>,
}

impl FakeBackend {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            metadata_calls: AtomicUsize::new(0),
            materialize_calls: AtomicUsize::new(0),
            last_format_id: Mutex::new(None),
        }
    }

    pub fn with_metadata(info: serde_json::Value) -> Self {
        Self::new(Behavior::Metadata(info))
    }

    pub fn failing(error: fn() -> BackendError) -> Self {
        Self::new(Behavior::Fail(error))
    }

    /// Materialize writes `data` to `name` inside the target directory.
    pub fn writing(name: &str, data: &[u8]) -> Self {
        Self::new(Behavior::Write {
            name: name.to_string(),
            data: data.to_vec(),
        })
    }

    /// Materialize succeeds and reports `path` without writing anything.
    pub fn claiming(path: PathBuf) -> Self {
        Self::new(Behavior::Claim(path))
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn materialize_calls(&self) -> usize {
        self.materialize_calls.load(Ordering::SeqCst)
    }

    pub fn last_format_id(&self) -> Option<String> {
        self.last_format_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

fn reported(path: PathBuf) -> RawInfo {
    RawInfo {
        filepath: Some(path.to_string_lossy().into_owned()),
        ..Default::default()
    }
}

#[async_trait]
impl ExtractionBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn resolve_metadata(&self, _url: &Url) -> Result<RawInfo, BackendError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Metadata(info) => serde_json::from_value(info.clone())
                .map_err(|e| BackendError::Unavailable(e.to_string())),
            Behavior::Fail(error) => Err(error()),
            _ => Ok(RawInfo::default()),
        }
    }

    async fn materialize(
        &self,
        _url: &Url,
        format_id: &str,
        target: &OutputTarget,
    ) -> Result<RawInfo, BackendError> {
        self.materialize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_format_id.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(format_id.to_string());

        match &self.behavior {
            Behavior::Fail(error) => Err(error()),
            Behavior::Write { name, data } => {
                let path = target.directory().join(name);
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| BackendError::Unavailable(e.to_string()))?;
                Ok(reported(path))
            }
            Behavior::Claim(path) => Ok(reported(path.clone())),
            Behavior::Metadata(_) => Ok(RawInfo::default()),
        }
    }

    async fn test_availability(&self) -> bool {
        true
    }
}
