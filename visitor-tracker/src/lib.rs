//! Visit notifications: a small HTTP endpoint that turns a visitor's
//! self-description into an email, and the client that sends it.

pub mod client;
pub mod config;
pub mod email;
pub mod geo;
pub mod mailer;
pub mod record;
pub mod server;

pub use config::TrackerConfig;
pub use geo::{GeoLocator, Location};
pub use mailer::{Dispatch, Mailer};
pub use record::VisitorRecord;
pub use server::{router, AppState};
