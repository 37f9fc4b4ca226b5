//! The uniform contract shared by worker capabilities.

use async_trait::async_trait;

use crate::error::Result;

/// A single-responsibility worker invoked by the orchestrator.
///
/// Each capability takes an explicit request type and returns an explicit
/// response type. Downstream transport failures are either folded into the
/// response (payment, loyalty) or surfaced as [`crate::CapabilityError`]
/// for the caller to degrade.
#[async_trait]
pub trait Capability: Send + Sync {
    type Request: Send + 'static;
    type Response: Send + 'static;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn execute(&self, request: Self::Request) -> Result<Self::Response>;
}
