//! Thin GitHub REST client used by the reconciliation engine.

pub mod client;
pub mod link;

pub use client::{GitHubClient, Variable};
