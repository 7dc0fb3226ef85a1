//! Client-side sessions for a mental-wellbeing companion.
//!
//! The crate models what the companion's screens do with the backend: a chat with a personal
//! friend, a goal tracker, a peer board and the login flow that feeds them credentials.
//! Sessions receive their collaborators (API client, preference store, navigator) explicitly
//! through a [`SessionContext`](session::SessionContext).

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod forum;
pub mod preferences;
pub mod session;
pub mod ui;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, ErrorKind};
