pub mod audit;
pub mod dnm;
pub mod guest;
pub mod message;
pub mod receipt;
pub mod rsvp;
pub mod run;
