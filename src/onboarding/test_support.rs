//! Scripted `GameApi` for onboarding tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::gw2::{Account, CharacterCore, GameApi};

pub(crate) const FAKE_WORLD_ID: u32 = 2012;

/// Which call should fail, and how.
#[derive(Debug, Clone)]
pub(crate) enum FailAt {
    CharacterList { status: u16, text: &'static str },
    Account { status: u16, text: &'static str },
    World { status: u16, text: &'static str },
    Character { name: &'static str, status: u16, text: &'static str },
}

/// In-process game API returning a fixed account "Tester.1234" on world
/// "Desolation" with the configured characters.
pub(crate) struct FakeGameApi {
    characters: Vec<(String, String)>,
    failures: Vec<FailAt>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl FakeGameApi {
    pub fn with_characters(characters: &[(&str, &str)]) -> Self {
        Self {
            characters: characters
                .iter()
                .map(|(n, p)| (n.to_string(), p.to_string()))
                .collect(),
            failures: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, fail: FailAt) -> Self {
        self.failures.push(fail);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_key(&self) -> Option<String> {
        self.keys.lock().unwrap().last().cloned()
    }

    async fn record(&self, key: Option<&str>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(key) = key {
            self.keys.lock().unwrap().push(key.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure(&self, pick: impl Fn(&FailAt) -> Option<(u16, &'static str)>) -> Result<(), ApiError> {
        match self.failures.iter().find_map(pick) {
            Some((status, text)) => Err(ApiError::Status {
                status,
                text: text.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GameApi for FakeGameApi {
    async fn character_names(&self, api_key: &str) -> Result<Vec<String>, ApiError> {
        self.record(Some(api_key)).await;
        self.failure(|f| match f {
            FailAt::CharacterList { status, text } => Some((*status, *text)),
            _ => None,
        })?;
        Ok(self.characters.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn account(&self, api_key: &str) -> Result<Account, ApiError> {
        self.record(Some(api_key)).await;
        self.failure(|f| match f {
            FailAt::Account { status, text } => Some((*status, *text)),
            _ => None,
        })?;
        Ok(Account {
            id: "ABCD-1234".to_string(),
            name: "Tester.1234".to_string(),
            world: FAKE_WORLD_ID,
        })
    }

    async fn world_name(&self, world_id: u32) -> Result<String, ApiError> {
        self.record(None).await;
        self.failure(|f| match f {
            FailAt::World { status, text } => Some((*status, *text)),
            _ => None,
        })?;
        if world_id == FAKE_WORLD_ID {
            Ok("Desolation".to_string())
        } else {
            Err(ApiError::Decode(format!("world {world_id} not found")))
        }
    }

    async fn character_core(
        &self,
        api_key: &str,
        name: &str,
    ) -> Result<CharacterCore, ApiError> {
        self.record(Some(api_key)).await;
        self.failure(|f| match f {
            FailAt::Character { name: n, status, text } if *n == name => Some((*status, *text)),
            _ => None,
        })?;
        self.characters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(n, p)| CharacterCore {
                name: n.clone(),
                profession: p.clone(),
                race: None,
                level: Some(80),
            })
            .ok_or_else(|| ApiError::Status {
                status: 404,
                text: "no such character".to_string(),
            })
    }
}
