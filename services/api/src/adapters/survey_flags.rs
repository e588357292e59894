//! services/api/src/adapters/survey_flags.rs
//!
//! Survey-completion flag stores. The file store keeps a flat JSON object of
//! `survey_{email}` keys, the server-side stand-in for browser local storage.

use async_trait::async_trait;
use lifeguard_core::ports::{
    survey_flag_key, PortError, PortResult, SurveyFlagStore, SURVEY_FLAG_VALUE,
};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

//=========================================================================================
// In-Memory Store
//=========================================================================================

#[derive(Default)]
pub struct InMemorySurveyFlags {
    flags: Mutex<HashMap<String, String>>,
}

impl InMemorySurveyFlags {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SurveyFlagStore for InMemorySurveyFlags {
    async fn mark_completed(&self, email: &str) -> PortResult<()> {
        self.flags
            .lock()
            .await
            .insert(survey_flag_key(email), SURVEY_FLAG_VALUE.to_string());
        Ok(())
    }

    async fn is_completed(&self, email: &str) -> PortResult<bool> {
        let flags = self.flags.lock().await;
        Ok(flags.get(&survey_flag_key(email)).map(String::as_str) == Some(SURVEY_FLAG_VALUE))
    }
}

//=========================================================================================
// JSON File Store
//=========================================================================================

pub struct FileSurveyFlags {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FileSurveyFlags {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> PortResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PortError::Unexpected(format!(
                    "Corrupt survey flag file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PortError::Unavailable(e.to_string())),
        }
    }
}

#[async_trait]
impl SurveyFlagStore for FileSurveyFlags {
    async fn mark_completed(&self, email: &str) -> PortResult<()> {
        let _guard = self.lock.lock().await;
        let mut flags = self.load().await?;
        flags.insert(survey_flag_key(email), SURVEY_FLAG_VALUE.to_string());
        let json = serde_json::to_vec_pretty(&flags)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        info!("Survey flag stored for {} in {}", email, self.path.display());
        Ok(())
    }

    async fn is_completed(&self, email: &str) -> PortResult<bool> {
        let _guard = self.lock.lock().await;
        let flags = self.load().await?;
        let done =
            flags.get(&survey_flag_key(email)).map(String::as_str) == Some(SURVEY_FLAG_VALUE);
        debug!("Survey flag for {}: {}", email, done);
        Ok(done)
    }
}
