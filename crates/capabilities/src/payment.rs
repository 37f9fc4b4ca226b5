//! Payment processing with a retry path.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{CapabilityError, RetailApiError, Result};
use crate::retail::{PaymentCharge, RetailApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    GiftCard,
    Pos,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::GiftCard,
        PaymentMethod::Pos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::GiftCard => "gift_card",
            PaymentMethod::Pos => "pos",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::GiftCard => "Gift Card",
            PaymentMethod::Pos => "In-Store POS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub card_number: Option<String>,
    /// Routes the charge to the retry endpoint.
    pub is_retry: bool,
}

impl PaymentRequest {
    pub fn new(amount: Money, method: PaymentMethod) -> Self {
        Self {
            amount,
            method,
            card_number: None,
            is_retry: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApproval {
    pub transaction_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub error: String,
    pub error_code: Option<String>,
    pub retry_available: bool,
    pub suggestion: String,
}

/// Result of a charge. Declines and transport failures are both `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Approved(PaymentApproval),
    Failed(PaymentFailure),
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Approved(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    #[serde(rename = "type")]
    pub kind: PaymentMethod,
    pub name: String,
    pub available: bool,
}

const RETRY_SUGGESTION: &str = "Would you like to try another payment method or retry?";

/// Charges the customer through the data service.
#[derive(Clone)]
pub struct PaymentCapability {
    api: Arc<dyn RetailApi>,
}

impl PaymentCapability {
    pub fn new(api: Arc<dyn RetailApi>) -> Self {
        Self { api }
    }

    /// Re-issues a charge through the retry endpoint.
    pub async fn retry(&self, mut request: PaymentRequest) -> Result<PaymentOutcome> {
        tracing::info!("retrying payment");
        request.is_retry = true;
        self.execute(request).await
    }

    /// Payment methods offered to every customer.
    pub fn payment_methods(&self) -> Vec<PaymentMethodInfo> {
        PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentMethodInfo {
                kind: method,
                name: method.display_name().to_string(),
                available: true,
            })
            .collect()
    }
}

#[async_trait]
impl Capability for PaymentCapability {
    type Request = PaymentRequest;
    type Response = PaymentOutcome;

    fn name(&self) -> &'static str {
        "payment"
    }

    #[tracing::instrument(skip(self, request), fields(amount = %request.amount, method = request.method.as_str(), retry = request.is_retry))]
    async fn execute(&self, request: PaymentRequest) -> Result<PaymentOutcome> {
        if !request.amount.is_positive() {
            return Err(CapabilityError::Validation(
                "Invalid payment amount".to_string(),
            ));
        }

        let charge = PaymentCharge {
            amount: request.amount,
            method: request.method.as_str().to_string(),
            card_number: request.card_number.clone(),
        };

        let result = if request.is_retry {
            self.api.retry_payment(&charge).await
        } else {
            self.api.process_payment(&charge).await
        };

        let outcome = match result {
            Ok(receipt) => {
                tracing::info!(transaction_id = %receipt.transaction_id, "payment approved");
                PaymentOutcome::Approved(PaymentApproval {
                    transaction_id: receipt.transaction_id,
                    amount: request.amount,
                    method: request.method,
                    timestamp: receipt.timestamp,
                })
            }
            Err(RetailApiError::Rejected {
                message,
                error_code,
                ..
            }) => {
                tracing::warn!(error = %message, "payment declined");
                PaymentOutcome::Failed(PaymentFailure {
                    error: message,
                    error_code,
                    retry_available: true,
                    suggestion: RETRY_SUGGESTION.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "payment call failed");
                PaymentOutcome::Failed(PaymentFailure {
                    error: format!("Payment processing failed: {e}"),
                    error_code: None,
                    retry_available: true,
                    suggestion: RETRY_SUGGESTION.to_string(),
                })
            }
        };

        Ok(outcome)
    }
}
