//! Runs one inbound message through the registration state machine.

use std::sync::Arc;
use std::time::Duration;

use crate::error::OnboardingError;
use crate::gw2::GameApi;
use crate::reply::{Reply, SUCCESS_COLOR, WARNING_COLOR};
use crate::store::{MemberRecord, MemberStore, MemberUpdate};

use super::ingest::ingest_api_key;
use super::prompts;
use super::session::SessionTracker;
use super::state::RegistrationStep;

/// Coordinates the registration flow: member records, API-key ingestion and
/// session bookkeeping.
pub struct OnboardingManager {
    store: Arc<dyn MemberStore>,
    api: Arc<dyn GameApi>,
    sessions: Arc<dyn SessionTracker>,
    phase_timeout: Duration,
}

impl OnboardingManager {
    pub fn new(
        store: Arc<dyn MemberStore>,
        api: Arc<dyn GameApi>,
        sessions: Arc<dyn SessionTracker>,
        phase_timeout: Duration,
    ) -> Self {
        Self {
            store,
            api,
            sessions,
            phase_timeout,
        }
    }

    /// Handle a direct message from `user_id`.
    ///
    /// `display_name` is only recorded on first contact. Never fails: store
    /// errors are logged and turned into a generic reply, and the member's
    /// step is left as it was.
    pub async fn handle_message(&self, user_id: &str, display_name: &str, content: &str) -> Reply {
        match self.process(user_id, display_name, content).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(user_id, "Onboarding failed: {}", e);
                Reply::new("Registration", prompts::INTERNAL_ERROR, WARNING_COLOR)
            }
        }
    }

    async fn process(
        &self,
        user_id: &str,
        display_name: &str,
        content: &str,
    ) -> Result<Reply, OnboardingError> {
        let member = match self.store.get_member(user_id).await? {
            Some(member) => member,
            None => {
                tracing::info!(user_id, "New member, starting registration");
                self.store.create_member(user_id, display_name).await?
            }
        };

        let step = member.registration_step;
        tracing::debug!(user_id, step = %step, "Processing registration message");

        if step.is_terminal() {
            self.sessions.clear(user_id).await;
        } else if !self.sessions.is_active(user_id).await {
            tracing::info!(user_id, step = %step, "Registration session opened");
            self.sessions.begin(user_id).await;
        }

        match step {
            RegistrationStep::Welcome => self.welcome_step(&member).await,
            RegistrationStep::ApiKey => self.api_key_step(&member, content).await,
            RegistrationStep::SelectMain => self.select_main_step(&member, content).await,
            RegistrationStep::Complete => Ok(Reply::new(
                step.title(),
                prompts::ALREADY_COMPLETED,
                SUCCESS_COLOR,
            )),
        }
    }

    /// Step 0: explain what is needed and move on to the API key step.
    async fn welcome_step(&self, member: &MemberRecord) -> Result<Reply, OnboardingError> {
        if !self
            .advance(member, RegistrationStep::Welcome, &MemberUpdate::default())
            .await?
        {
            return self.superseded(&member.id).await;
        }
        Ok(Reply::new(
            RegistrationStep::ApiKey.title(),
            prompts::WELCOME,
            SUCCESS_COLOR,
        ))
    }

    /// Step 1: treat the message as an API key and pull account data.
    async fn api_key_step(
        &self,
        member: &MemberRecord,
        api_key: &str,
    ) -> Result<Reply, OnboardingError> {
        let profile = match ingest_api_key(self.api.as_ref(), api_key, self.phase_timeout).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(
                    user_id = %member.id,
                    retryable = e.is_retryable(),
                    "API key rejected: {}",
                    e
                );
                return Ok(Reply::new(
                    RegistrationStep::ApiKey.title(),
                    prompts::ingest_failed(&e),
                    WARNING_COLOR,
                ));
            }
        };

        let update = MemberUpdate {
            characters: Some(profile.characters.clone()),
            acct_name: Some(profile.acct_name.clone()),
            server: Some(profile.server.clone()),
            main_character: None,
        };
        if !self.advance(member, RegistrationStep::ApiKey, &update).await? {
            return self.superseded(&member.id).await;
        }

        tracing::info!(
            user_id = %member.id,
            account = %profile.acct_name,
            characters = profile.characters.len(),
            "API key verified"
        );
        Ok(Reply::new(
            RegistrationStep::SelectMain.title(),
            prompts::api_verified(&profile.characters),
            SUCCESS_COLOR,
        ))
    }

    /// Step 2: record the chosen main if it is one of the member's characters.
    async fn select_main_step(
        &self,
        member: &MemberRecord,
        selection: &str,
    ) -> Result<Reply, OnboardingError> {
        let selection = selection.trim();
        if !member.characters.contains_key(selection) {
            return Ok(Reply::new(
                RegistrationStep::SelectMain.title(),
                prompts::selection_not_found(&member.characters),
                WARNING_COLOR,
            ));
        }

        let update = MemberUpdate {
            main_character: Some(selection.to_string()),
            ..Default::default()
        };
        if !self
            .advance(member, RegistrationStep::SelectMain, &update)
            .await?
        {
            return self.superseded(&member.id).await;
        }

        self.sessions.clear(&member.id).await;
        tracing::info!(user_id = %member.id, main = selection, "Registration complete");
        Ok(Reply::new(
            RegistrationStep::Complete.title(),
            prompts::main_selected(selection),
            SUCCESS_COLOR,
        ))
    }

    /// Advance `member` from `from`, returning `false` if a concurrent
    /// message got there first.
    async fn advance(
        &self,
        member: &MemberRecord,
        from: RegistrationStep,
        update: &MemberUpdate,
    ) -> Result<bool, OnboardingError> {
        debug_assert_eq!(member.registration_step, from);
        Ok(self.store.advance_step(&member.id, from, update).await?)
    }

    /// Reply for a message whose transition lost the race to another one.
    async fn superseded(&self, user_id: &str) -> Result<Reply, OnboardingError> {
        let member = self.store.get_member(user_id).await?.ok_or_else(|| {
            OnboardingError::Database(crate::error::DatabaseError::NotFound {
                entity: "member".into(),
                id: user_id.to_string(),
            })
        })?;
        let step = member.registration_step;
        tracing::info!(user_id, step = %step, "Duplicate registration message ignored");
        if step.is_terminal() {
            self.sessions.clear(user_id).await;
        }
        Ok(Reply::new(
            step.title(),
            prompts::resume(step, &member.characters),
            SUCCESS_COLOR,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use super::*;
    use crate::error::DatabaseError;
    use crate::onboarding::session::InMemorySessions;
    use crate::onboarding::test_support::{FailAt, FakeGameApi};
    use crate::store::LibSqlBackend;

    const TIMEOUT: Duration = Duration::from_secs(2);

    struct Harness {
        manager: OnboardingManager,
        store: Arc<LibSqlBackend>,
        sessions: Arc<InMemorySessions>,
    }

    async fn harness(api: FakeGameApi) -> Harness {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let sessions = Arc::new(InMemorySessions::new());
        let manager = OnboardingManager::new(
            Arc::clone(&store) as Arc<dyn MemberStore>,
            Arc::new(api),
            Arc::clone(&sessions) as Arc<dyn SessionTracker>,
            TIMEOUT,
        );
        Harness {
            manager,
            store,
            sessions,
        }
    }

    fn alice_and_bob() -> FakeGameApi {
        FakeGameApi::with_characters(&[("Alice", "Guardian"), ("Bob", "Reaper")])
    }

    impl Harness {
        async fn send(&self, content: &str) -> Reply {
            self.manager.handle_message("42", "tester#0001", content).await
        }

        async fn step(&self) -> RegistrationStep {
            self.store
                .get_member("42")
                .await
                .unwrap()
                .unwrap()
                .registration_step
        }

        async fn member(&self) -> MemberRecord {
            self.store.get_member("42").await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn first_contact_creates_member_and_welcomes() {
        let h = harness(alice_and_bob()).await;
        let reply = h.send("hello bot").await;

        assert_eq!(reply.title, "Registration Step 1 of 2");
        assert_eq!(reply.description, prompts::WELCOME);
        let member = h.member().await;
        assert_eq!(member.registration_step, RegistrationStep::ApiKey);
        assert_eq!(member.discord_name, "tester#0001");
        assert!(h.sessions.is_active("42").await);
    }

    #[tokio::test]
    async fn full_registration_walkthrough() {
        let h = harness(alice_and_bob()).await;
        h.send("hi").await;

        let reply = h.send("GOOD-KEY").await;
        assert_eq!(reply.title, "Registration Step 2 of 2");
        assert!(reply.description.contains("Alice (Guardian)"));
        assert!(reply.description.contains("Bob (Reaper)"));
        assert_eq!(h.step().await, RegistrationStep::SelectMain);

        let member = h.member().await;
        assert_eq!(member.acct_name.as_deref(), Some("Tester.1234"));
        assert_eq!(member.server.as_deref(), Some("Desolation"));
        assert_eq!(
            member.characters,
            BTreeMap::from([
                ("Alice".to_string(), "Guardian".to_string()),
                ("Bob".to_string(), "Reaper".to_string()),
            ])
        );

        let reply = h.send("  Alice ").await;
        assert_eq!(reply.title, "Registration Complete");
        assert_eq!(reply.description, "Alice Selected\nRegistration Complete!");
        let member = h.member().await;
        assert_eq!(member.registration_step, RegistrationStep::Complete);
        assert_eq!(member.main_character.as_deref(), Some("Alice"));
        assert!(!h.sessions.is_active("42").await);
    }

    #[tokio::test]
    async fn bad_key_keeps_step_and_reports_upstream_text() {
        let h = harness(
            alice_and_bob().failing(FailAt::CharacterList {
                status: 401,
                text: "Invalid access token",
            }),
        )
        .await;
        h.send("hi").await;

        let before = h.member().await;
        for _ in 0..3 {
            let reply = h.send("BAD-KEY").await;
            assert_eq!(reply.title, "Registration Step 1 of 2");
            assert_eq!(reply.color, WARNING_COLOR);
            assert!(reply.description.contains("Invalid access token"));
        }
        let after = h.member().await;
        assert_eq!(after.registration_step, RegistrationStep::ApiKey);
        assert_eq!(after.characters, before.characters);
        assert_eq!(after.acct_name, before.acct_name);
    }

    #[tokio::test]
    async fn upstream_outage_keeps_step() {
        let h = harness(alice_and_bob().failing(FailAt::Character {
            name: "Bob",
            status: 502,
            text: "bad gateway",
        }))
        .await;
        h.send("hi").await;

        let reply = h.send("KEY").await;
        assert!(reply.description.contains("bad gateway"));
        assert!(reply.description.contains("try again"));
        let member = h.member().await;
        assert_eq!(member.registration_step, RegistrationStep::ApiKey);
        assert!(member.characters.is_empty());
    }

    #[tokio::test]
    async fn slow_api_times_out_and_keeps_step() {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let manager = OnboardingManager::new(
            Arc::clone(&store) as Arc<dyn MemberStore>,
            Arc::new(alice_and_bob().with_delay(Duration::from_millis(500))),
            Arc::new(InMemorySessions::new()),
            Duration::from_millis(50),
        );
        manager.handle_message("42", "tester#0001", "hi").await;

        let reply = manager.handle_message("42", "tester#0001", "KEY").await;
        assert_eq!(reply.title, "Registration Step 1 of 2");
        assert_eq!(reply.color, WARNING_COLOR);
        assert!(reply.description.contains("too long"));

        let member = store.get_member("42").await.unwrap().unwrap();
        assert_eq!(member.registration_step, RegistrationStep::ApiKey);
        assert!(member.characters.is_empty());
        assert!(member.acct_name.is_none());
    }

    #[tokio::test]
    async fn session_reopened_for_member_mid_registration() {
        let h = harness(alice_and_bob()).await;
        h.send("hi").await;
        // Sessions are process-local; forget them as a restart would.
        h.sessions.clear("42").await;

        h.send("KEY").await;
        assert!(h.sessions.is_active("42").await);
        assert_eq!(h.step().await, RegistrationStep::SelectMain);
    }

    #[tokio::test]
    async fn unknown_selection_relists_and_keeps_step() {
        let h = harness(alice_and_bob()).await;
        h.send("hi").await;
        h.send("KEY").await;

        for attempt in ["Carol", "alice", ""] {
            let reply = h.send(attempt).await;
            assert_eq!(reply.title, "Registration Step 2 of 2");
            assert!(reply.description.starts_with("Selection not found!"));
            assert!(reply.description.contains("Alice (Guardian)\nBob (Reaper)\n"));
        }
        let member = h.member().await;
        assert_eq!(member.registration_step, RegistrationStep::SelectMain);
        assert!(member.main_character.is_none());
    }

    #[tokio::test]
    async fn completed_member_gets_fixed_reply() {
        let h = harness(alice_and_bob()).await;
        for msg in ["hi", "KEY", "Bob"] {
            h.send(msg).await;
        }
        h.sessions.begin("42").await;

        let reply = h.send("anything at all").await;
        assert_eq!(reply.description, "Registration already completed!");
        assert_eq!(h.step().await, RegistrationStep::Complete);
        assert_eq!(h.member().await.main_character.as_deref(), Some("Bob"));
        assert!(!h.sessions.is_active("42").await);
    }

    #[tokio::test]
    async fn steps_only_ever_advance_by_one() {
        let h = harness(alice_and_bob()).await;
        let script = ["hi", "bad key?", "KEY", "Zed", "Bob", "again"];
        let mut previous: Option<RegistrationStep> = None;
        for msg in script {
            h.send(msg).await;
            let step = h.step().await;
            if let Some(prev) = previous {
                assert!(
                    step == prev || prev.can_transition_to(step),
                    "{prev} -> {step} is not a single forward step"
                );
            }
            previous = Some(step);
        }
        assert_eq!(previous, Some(RegistrationStep::Complete));
    }

    #[tokio::test]
    async fn stale_transition_is_reported_not_applied() {
        let h = harness(alice_and_bob()).await;
        h.send("hi").await;
        h.send("KEY").await;

        // Simulate a concurrent message that already completed the step.
        let stale = h.member().await;
        h.store
            .advance_step(
                "42",
                RegistrationStep::SelectMain,
                &MemberUpdate {
                    main_character: Some("Bob".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reply = h.manager.select_main_step(&stale, "Alice").await.unwrap();
        assert!(reply.description.starts_with("Your previous message was already processed."));
        assert_eq!(h.member().await.main_character.as_deref(), Some("Bob"));
    }

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl MemberStore for BrokenStore {
        async fn init_schema(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
        async fn get_member(&self, _id: &str) -> Result<Option<MemberRecord>, DatabaseError> {
            Err(DatabaseError::Query("disk on fire".into()))
        }
        async fn create_member(
            &self,
            _id: &str,
            _discord_name: &str,
        ) -> Result<MemberRecord, DatabaseError> {
            Err(DatabaseError::Query("disk on fire".into()))
        }
        async fn update_member(
            &self,
            _id: &str,
            _update: &MemberUpdate,
        ) -> Result<(), DatabaseError> {
            Err(DatabaseError::Query("disk on fire".into()))
        }
        async fn advance_step(
            &self,
            _id: &str,
            _expected: RegistrationStep,
            _update: &MemberUpdate,
        ) -> Result<bool, DatabaseError> {
            Err(DatabaseError::Query("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_becomes_generic_reply() {
        let manager = OnboardingManager::new(
            Arc::new(BrokenStore),
            Arc::new(alice_and_bob()),
            Arc::new(InMemorySessions::new()),
            TIMEOUT,
        );
        let reply = manager.handle_message("42", "tester", "hi").await;
        assert_eq!(reply.description, prompts::INTERNAL_ERROR);
        assert_eq!(reply.color, WARNING_COLOR);
    }
}
