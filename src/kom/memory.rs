//! In-memory session backed by a fixture file, used by `kommark replay`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ConfNo, KomSession, LocalNo, MiscInfo, PersNo, SessionError, TextNo, TextStat};

/// A mark-as-read call as the server saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkCall {
    pub recipient: ConfNo,
    pub local_nos: Vec<LocalNo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureText {
    pub no: TextNo,
    #[serde(default)]
    pub author: PersNo,
    #[serde(default)]
    pub misc: Vec<MiscInfo>,
}

/// On-disk description of a session's server state.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionFixture {
    #[serde(default = "default_true")]
    pub connected: bool,
    #[serde(default)]
    pub user: PersNo,
    /// Recipients whose mark-as-read call fails with a protocol error
    #[serde(default)]
    pub failing_recipients: Vec<ConfNo>,
    #[serde(default)]
    pub texts: Vec<FixtureText>,
}

fn default_true() -> bool {
    true
}

impl SessionFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse fixture: {}", path.display()))
    }
}

pub struct MemorySession {
    connected: AtomicBool,
    user: PersNo,
    texts: HashMap<TextNo, TextStat>,
    failing: HashSet<ConfNo>,
    calls: Mutex<Vec<MarkCall>>,
}

impl MemorySession {
    pub fn from_fixture(fixture: SessionFixture) -> Self {
        let texts = fixture
            .texts
            .into_iter()
            .map(|t| {
                (
                    t.no,
                    TextStat {
                        author: t.author,
                        misc: t.misc,
                    },
                )
            })
            .collect();

        Self {
            connected: AtomicBool::new(fixture.connected),
            user: fixture.user,
            texts,
            failing: fixture.failing_recipients.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every mark-as-read call that reached the server, in order.
    pub fn calls(&self) -> Vec<MarkCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl KomSession for MemorySession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get_text_stat(
        &self,
        text: TextNo,
        _use_cache: bool,
    ) -> Result<Option<TextStat>, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        match self.texts.get(&text) {
            Some(stat) => Ok(Some(stat.clone())),
            None => Err(SessionError::NoSuchText(text)),
        }
    }

    async fn mark_as_read(
        &self,
        recipient: ConfNo,
        local_nos: &[LocalNo],
    ) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        if self.failing.contains(&recipient) {
            return Err(SessionError::Protocol {
                code: 11,
                message: format!("undefined conference {}", recipient),
            });
        }
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(MarkCall {
                recipient,
                local_nos: local_nos.to_vec(),
            });
        Ok(())
    }

    fn current_user(&self) -> PersNo {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        user = 6
        failing_recipients = [9]

        [[texts]]
        no = 100
        misc = [
            { type = "recipient", value = 42 },
            { type = "local-no", value = 7 },
        ]
    "#;

    fn session() -> MemorySession {
        MemorySession::from_fixture(toml::from_str(FIXTURE).unwrap())
    }

    #[tokio::test]
    async fn test_fixture_defaults_to_connected() {
        let session = session();
        assert!(session.is_connected());
        assert_eq!(session.current_user(), 6);
    }

    #[tokio::test]
    async fn test_unknown_text_is_an_error() {
        let session = session();
        assert_eq!(
            session.get_text_stat(5, true).await,
            Err(SessionError::NoSuchText(5))
        );
        let stat = session.get_text_stat(100, true).await.unwrap().unwrap();
        assert_eq!(stat.misc.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_recipient_is_not_recorded() {
        let session = session();
        assert!(session.mark_as_read(9, &[1]).await.is_err());
        session.mark_as_read(42, &[7]).await.unwrap();
        assert_eq!(
            session.calls(),
            vec![MarkCall {
                recipient: 42,
                local_nos: vec![7]
            }]
        );
    }

    #[test]
    fn test_load_demo_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/session.toml");
        let fixture = SessionFixture::load(&path).unwrap();
        assert_eq!(fixture.texts.len(), 3);
        assert_eq!(fixture.failing_recipients, vec![9]);
    }

    #[tokio::test]
    async fn test_disconnected_session_rejects_calls() {
        let session = session();
        session.set_connected(false);
        assert_eq!(
            session.mark_as_read(42, &[7]).await,
            Err(SessionError::NotConnected)
        );
        assert!(session.calls().is_empty());
    }
}
