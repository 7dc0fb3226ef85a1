pub mod client;
pub mod models;

pub use client::{CompanionApi, HttpApiClient};
pub use models::{Goal, LoginReply, SignupRequest};

#[cfg(test)]
pub(crate) mod fake;
