//! Voter credential emails: rendering, key rotation, pacing and delivery.

pub mod dispatch;
pub mod key_pool;
pub mod notice;
pub mod router;
pub mod service;
pub mod throttle;
pub mod transport;

#[cfg(test)]
mod tests;

pub use dispatch::{
    CredentialDispatcher, DeliveryOutcome, DeliveryStatus, DispatchError, DispatchEvent,
    DispatchJob, DispatchReport, DispatchSummary, MailSettings,
};
pub use key_pool::{KeyLease, KeyPool, KeyPoolError, KeyUsage, MailIdentity};
pub use notice::{render_notice, NoticeContext, RenderedNotice};
pub use router::credentials_router;
pub use service::{BatchResponse, CredentialRequest, CredentialService};
pub use throttle::Throttle;
pub use transport::{DeliveryReceipt, MailTransport, OutboundEmail, TransportError};
