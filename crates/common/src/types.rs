use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// Wire value GitHub reports for an acknowledged delivery.
pub const SUCCESS_STATUS: &str = "OK";

/// A GitHub repository identified as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(AppError::Config(format!(
                "repository must be given as owner/repo, got '{}'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository webhook (the endpoint deliveries are sent to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// Outcome of a delivery attempt.
///
/// Only `Success` matters for reconciliation; every other wire value is kept
/// verbatim so it can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Success,
    Other(String),
}

impl DeliveryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryStatus::Success)
    }
}

impl From<&str> for DeliveryStatus {
    fn from(value: &str) -> Self {
        if value == SUCCESS_STATUS {
            DeliveryStatus::Success
        } else {
            DeliveryStatus::Other(value.to_string())
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Success => write!(f, "{}", SUCCESS_STATUS),
            DeliveryStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

impl Serialize for DeliveryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DeliveryStatus::from(raw.as_str()))
    }
}

/// One attempt by GitHub to deliver one event to one webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Delivery id; redelivery requests target exactly this attempt.
    pub id: u64,
    /// Shared by the original delivery and every redelivery of the same event.
    pub guid: String,
    pub delivered_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub redelivery: bool,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following (older) page, if any.
    pub next: Option<String>,
}

/// Reconciliation checkpoint: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(i64);

impl Checkpoint {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis())
    }

    /// Parse a stored value. Non-numeric and non-positive values are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|millis| *millis > 0)
            .map(Self)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Decimal string form written to the store.
    pub fn to_value(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
