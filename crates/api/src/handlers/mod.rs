pub mod do_not_message;
pub mod invites;
pub mod webhooks;
