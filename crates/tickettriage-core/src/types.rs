//! Ticket request and classification data model
//!
//! These types are the wire contract for the service: `TicketRequest` is the
//! inbound body, `TicketClassification` the structured result the model must
//! produce. Enum membership is enforced by serde; the numeric bound on
//! `confidence` by [`TicketClassification::validate`].

use serde::{Deserialize, Serialize};

/// Minimum ticket text length in characters
pub const MIN_TICKET_LEN: usize = 10;

/// Maximum ticket text length in characters
pub const MAX_TICKET_LEN: usize = 1000;

/// Inbound classification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    /// Free-text customer support message
    pub text: String,
}

impl TicketRequest {
    /// Check the text length bounds.
    ///
    /// Returns the offending bound description on failure so the caller can
    /// surface it verbatim in a validation response.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let len = self.text.chars().count();
        if len < MIN_TICKET_LEN {
            return Err(format!(
                "text must be at least {} characters, got {}",
                MIN_TICKET_LEN, len
            ));
        }
        if len > MAX_TICKET_LEN {
            return Err(format!(
                "text must be at most {} characters, got {}",
                MAX_TICKET_LEN, len
            ));
        }
        Ok(())
    }
}

/// Ticket category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    OrderIssue,
    AccountAccess,
    ProductInquiry,
    TechnicalSupport,
    Billing,
    Other,
}

impl TicketCategory {
    /// Wire name of the category, for logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderIssue => "order_issue",
            Self::AccountAccess => "account_access",
            Self::ProductInquiry => "product_inquiry",
            Self::TechnicalSupport => "technical_support",
            Self::Billing => "billing",
            Self::Other => "other",
        }
    }
}

/// Ticket urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketUrgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Customer sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSentiment {
    Angry,
    Frustrated,
    Neutral,
    Satisfied,
}

/// Structured classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketClassification {
    /// Ticket category
    pub category: TicketCategory,

    /// Urgency of the issue
    pub urgency: TicketUrgency,

    /// Customer sentiment
    pub sentiment: CustomerSentiment,

    /// Model confidence in the classification (0.0-1.0)
    pub confidence: f32,

    /// Extracted key facts (order numbers, product names, account issues)
    pub key_information: Vec<String>,

    /// Suggested initial action for the support team
    pub suggested_action: String,
}

impl TicketClassification {
    /// Check the field constraints serde cannot express.
    ///
    /// Enum membership is already guaranteed by deserialization; this verifies
    /// the confidence bound. A value failing here is never surfaced to callers.
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(crate::Error::schema(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}
