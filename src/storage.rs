use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionData {
    #[serde(default)]
    pub token: Option<String>,
}

/// Bearer credential persisted across restarts.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    data: Arc<Mutex<SessionData>>,
}

impl SessionStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_session(&path).await;
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn token(&self) -> Option<String> {
        self.data.lock().await.token.clone()
    }

    pub async fn store(&self, token: String) -> io::Result<()> {
        let mut data = self.data.lock().await;
        data.token = Some(token);
        persist_session(&self.path, &data).await?;
        info!("session stored");
        Ok(())
    }

    pub async fn clear(&self) -> io::Result<()> {
        let mut data = self.data.lock().await;
        if data.token.take().is_some() {
            persist_session(&self.path, &data).await?;
            info!("session cleared");
        }
        Ok(())
    }
}

pub async fn load_session(path: &Path) -> SessionData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse session file: {err}");
                SessionData::default()
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => SessionData::default(),
        Err(err) => {
            error!("failed to read session file: {err}");
            SessionData::default()
        }
    }
}

pub async fn persist_session(path: &Path, data: &SessionData) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(data).map_err(io::Error::other)?;
    fs::write(path, payload).await
}
