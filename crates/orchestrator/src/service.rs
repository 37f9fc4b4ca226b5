//! Session-level surface: load, run the orchestrator, save.

use std::collections::BTreeMap;
use std::time::Instant;

use capabilities::Redemption;
use common::{Revision, SessionId};
use domain::{CartSummary, CustomerId, Session, Sku};
use serde::Serialize;
use session_store::{SaveOptions, SessionRecord, SessionStore};

use crate::error::{Result, ServiceError};
use crate::orchestrator::SalesOrchestrator;
use crate::response::{AgentResponse, CartView, CheckoutOptions, PromoApplication};

/// A freshly started session and its greeting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub greeting: String,
    pub session: Session,
}

/// Points redeemed and the cart they now apply to.
#[derive(Debug, Clone, Serialize)]
pub struct PointsRedeemed {
    #[serde(flatten)]
    pub redemption: Redemption,
    pub cart: CartSummary,
}

/// Runs conversation operations against persisted sessions.
///
/// Every mutating operation:
/// 1. Loads the session and remembers the revision it was at
/// 2. Lets the orchestrator work on it
/// 3. Saves it, expecting the remembered revision
///
/// A concurrent writer makes step 3 fail with [`ServiceError::Conflict`]
/// instead of silently overwriting the other request's changes.
pub struct ConversationService<S> {
    store: S,
    orchestrator: SalesOrchestrator,
}

impl<S: SessionStore> ConversationService<S> {
    pub fn new(store: S, orchestrator: SalesOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn orchestrator(&self) -> &SalesOrchestrator {
        &self.orchestrator
    }

    async fn load(&self, session_id: SessionId) -> Result<(Session, Revision)> {
        let record = self
            .store
            .load(session_id)
            .await?
            .ok_or(ServiceError::SessionNotFound(session_id))?;
        let session: Session = record.state_as()?;
        Ok((session, record.revision))
    }

    async fn save(&self, session: &Session, loaded: Revision) -> Result<Revision> {
        let options = if loaded == Revision::initial() {
            SaveOptions::expect_new()
        } else {
            SaveOptions::expect_revision(loaded)
        };
        let record = SessionRecord::from_state(
            session.session_id,
            session.customer_id.as_str(),
            session.channel.clone(),
            session,
        )?;
        Ok(self.store.save(record, options).await?)
    }

    /// Starts a session and greets the customer.
    #[tracing::instrument(skip(self, context))]
    pub async fn start_session(
        &self,
        customer_id: CustomerId,
        channel: &str,
        context: BTreeMap<String, serde_json::Value>,
    ) -> Result<SessionStarted> {
        let mut session = Session::new(SessionId::new(), customer_id, channel);
        session.context = context;

        let greeting = self.orchestrator.greet(&session).await;
        self.save(&session, Revision::initial()).await?;

        tracing::info!(session_id = %session.session_id, "session started");
        Ok(SessionStarted {
            session_id: session.session_id,
            greeting,
            session,
        })
    }

    /// Handles one chat message.
    #[tracing::instrument(skip(self, message))]
    pub async fn chat(&self, session_id: SessionId, message: &str) -> Result<AgentResponse> {
        let started = Instant::now();
        let (mut session, revision) = self.load(session_id).await?;

        let response = self.orchestrator.handle(&mut session, message).await?;
        self.save(&session, revision).await?;

        metrics::histogram!("turn_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        session_id: SessionId,
        sku: Sku,
        quantity: u32,
    ) -> Result<AgentResponse> {
        let (mut session, revision) = self.load(session_id).await?;
        let response = self
            .orchestrator
            .add_item(&mut session, &sku, quantity)
            .await?;
        self.save(&session, revision).await?;
        Ok(response)
    }

    pub async fn cart(&self, session_id: SessionId) -> Result<CartView> {
        let (session, _) = self.load(session_id).await?;
        Ok(CartView::of(&session))
    }

    /// Validates a promo code. Only a valid code is stored on the session.
    #[tracing::instrument(skip(self))]
    pub async fn apply_promo(&self, session_id: SessionId, code: &str) -> Result<PromoApplication> {
        let (mut session, revision) = self.load(session_id).await?;
        let promo = self.orchestrator.apply_promo(&mut session, code).await?;
        if promo.success {
            self.save(&session, revision).await?;
        }
        Ok(promo)
    }

    #[tracing::instrument(skip(self))]
    pub async fn redeem_points(&self, session_id: SessionId, points: i64) -> Result<PointsRedeemed> {
        let (mut session, revision) = self.load(session_id).await?;
        let redemption = self.orchestrator.redeem_points(&mut session, points).await?;
        self.save(&session, revision).await?;
        Ok(PointsRedeemed {
            redemption,
            cart: session.cart_summary(),
        })
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn checkout(
        &self,
        session_id: SessionId,
        options: CheckoutOptions,
    ) -> Result<AgentResponse> {
        let (mut session, revision) = self.load(session_id).await?;
        let response = self.orchestrator.checkout(&mut session, &options).await?;
        // Saved on failure too: a reconciliation marker must survive
        self.save(&session, revision).await?;
        Ok(response)
    }

    #[tracing::instrument(skip(self, context))]
    pub async fn switch_channel(
        &self,
        session_id: SessionId,
        channel: &str,
        context: BTreeMap<String, serde_json::Value>,
    ) -> Result<AgentResponse> {
        let (mut session, revision) = self.load(session_id).await?;
        let response = self
            .orchestrator
            .switch_channel(&mut session, channel, context);
        self.save(&session, revision).await?;
        Ok(response)
    }

    pub async fn session(&self, session_id: SessionId) -> Result<Session> {
        Ok(self.load(session_id).await?.0)
    }

    /// Every session started by a customer, most recently updated first.
    pub async fn customer_sessions(&self, customer_id: &CustomerId) -> Result<Vec<Session>> {
        self.store
            .list_for_customer(customer_id.as_str())
            .await?
            .iter()
            .map(|record| record.state_as().map_err(ServiceError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use capabilities::{
        Capabilities, InMemoryRetailApi, SequentialIdGenerator, TemplateAssistant,
    };
    use session_store::InMemorySessionStore;

    fn service() -> ConversationService<InMemorySessionStore> {
        let ids = Arc::new(SequentialIdGenerator::new());
        let caps = Capabilities::new(
            Arc::new(InMemoryRetailApi::demo()),
            Arc::new(TemplateAssistant::new(ids.clone())),
            ids,
        );
        ConversationService::new(InMemorySessionStore::new(), SalesOrchestrator::new(caps))
    }

    #[tokio::test]
    async fn start_session_persists_at_first_revision() {
        let service = service();
        let started = service
            .start_session(CustomerId::new("CUST001"), "web", BTreeMap::new())
            .await
            .unwrap();

        assert!(started.greeting.starts_with("Welcome back, Priya!"));
        let record = service
            .store()
            .load(started.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.revision, Revision::new(1));
        assert_eq!(record.customer_id, "CUST001");
    }

    #[tokio::test]
    async fn every_chat_turn_bumps_the_revision() {
        let service = service();
        let started = service
            .start_session(CustomerId::new("CUST001"), "web", BTreeMap::new())
            .await
            .unwrap();

        service.chat(started.session_id, "hello").await.unwrap();
        service.chat(started.session_id, "hi again").await.unwrap();

        let record = service
            .store()
            .load(started.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.revision, Revision::new(3));
        let session: Session = record.state_as().unwrap();
        assert_eq!(session.conversation_history.len(), 4);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let service = service();
        let missing = SessionId::new();
        let result = service.chat(missing, "hello").await;
        assert!(matches!(result, Err(ServiceError::SessionNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn rejected_promo_is_not_saved() {
        let service = service();
        let started = service
            .start_session(CustomerId::new("CUST001"), "web", BTreeMap::new())
            .await
            .unwrap();

        let promo = service
            .apply_promo(started.session_id, "BOGUS")
            .await
            .unwrap();
        assert!(!promo.success);
        assert_eq!(promo.final_total, promo.cart_total);
        assert_eq!(service.store().save_calls().await, 1);
    }

    #[tokio::test]
    async fn customer_sessions_lists_what_was_started() {
        let service = service();
        for channel in ["web", "mobile"] {
            service
                .start_session(CustomerId::new("CUST002"), channel, BTreeMap::new())
                .await
                .unwrap();
        }
        service
            .start_session(CustomerId::new("CUST001"), "web", BTreeMap::new())
            .await
            .unwrap();

        let sessions = service
            .customer_sessions(&CustomerId::new("CUST002"))
            .await
            .unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.customer_id.as_str() == "CUST002"));
    }
}
