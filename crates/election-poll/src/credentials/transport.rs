use super::key_pool::MailIdentity;

/// A fully rendered message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to_email: String,
    pub to_name: String,
    pub sender_email: String,
    pub sender_name: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

/// `Rejected` and `Unavailable` fail one recipient; `Revoked` stops the dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Rejected(String),
    #[error("mail provider unavailable: {0}")]
    Unavailable(String),
    #[error("identity revoked: {0}")]
    Revoked(String),
}

/// Outbound mail provider seam.
pub trait MailTransport: Send + Sync {
    fn send(
        &self,
        identity: &MailIdentity,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, TransportError>;
}
