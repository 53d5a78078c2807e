//! Per-request context shared by every strategy.

use crate::error::{Result, SkriftError};
use crate::video::VideoIdentifier;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// A single transcript request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique id, used to keep transient files of concurrent requests apart.
    pub id: Uuid,
    /// Reference exactly as the caller supplied it.
    pub reference: String,
    /// Identifier extracted from the reference.
    pub video_id: VideoIdentifier,
    deadline: Option<Instant>,
}

impl Request {
    /// Create a request whose overall budget starts now.
    pub fn new(reference: &str, video_id: VideoIdentifier, budget: Option<Duration>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            video_id,
            deadline: budget.map(|b| Instant::now() + b),
        }
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Narrow a step's own limit to what is left of the request budget.
    ///
    /// Fails with [`SkriftError::DeadlineExceeded`] when nothing is left.
    pub fn budget(&self, limit: Option<Duration>) -> Result<Option<Duration>> {
        match (self.remaining(), limit) {
            (Some(left), _) if left.is_zero() => Err(SkriftError::DeadlineExceeded),
            (Some(left), Some(limit)) => Ok(Some(left.min(limit))),
            (Some(left), None) => Ok(Some(left)),
            (None, limit) => Ok(limit),
        }
    }

    /// Template variables describing this request.
    pub fn template_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("reference", self.reference.clone());
        vars.insert("video_id", self.video_id.to_string());
        vars.insert("request_id", self.id.to_string());
        vars
    }
}
