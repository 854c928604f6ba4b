//! Command handlers - application layer orchestration.
//!
//! Each handler is a Command struct plus a Handler struct with a `handle()`
//! method, holding its collaborators as `Arc<dyn Port>`.

pub mod connect;
pub mod payments;

/// What a webhook handler did with a verified delivery.
///
/// Either way the HTTP boundary answers 2xx; a non-2xx is reserved for
/// signature failures, where redelivery is wanted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event produced a durable write; `id` names the affected intent or
    /// gateway event.
    Recorded { id: String },

    /// The event was verified but is not one this subsystem acts on.
    Ignored { reason: String },
}
