//! Zero-sized PostgreSQL repositories, one per table group.

pub mod audit_repo;
pub mod dnm_repo;
pub mod guest_repo;
pub mod message_repo;
pub mod receipt_repo;
pub mod rsvp_repo;
pub mod run_repo;

pub use audit_repo::AuditLogRepo;
pub use dnm_repo::DoNotMessageRepo;
pub use guest_repo::GuestDirectoryRepo;
pub use message_repo::{InviteMessageRepo, LifecycleTransitionRepo};
pub use receipt_repo::WebhookReceiptRepo;
pub use rsvp_repo::{RsvpPersonResponseRepo, RsvpSessionRepo};
pub use run_repo::InviteSendRunRepo;
