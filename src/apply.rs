// src/apply.rs
//! Mock application form. Nothing is delivered; the outcome is decided
//! by a `SendOutcome` after an artificial delay.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::environment::ApplyConfig;
use crate::types::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyResult {
    Delivered,
    Failed,
}

/// Decides whether a simulated send succeeds
pub trait SendOutcome: Send + Sync {
    fn succeeds(&self) -> bool;
}

/// Succeeds with probability `success_rate`
pub struct RandomOutcome {
    success_rate: f64,
}

impl RandomOutcome {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl SendOutcome for RandomOutcome {
    fn succeeds(&self) -> bool {
        // v4 uuids carry 122 random bits; the high half is enough for a roll
        let bits = (uuid::Uuid::new_v4().as_u128() >> 64) as u64;
        let roll = bits as f64 / u64::MAX as f64;
        self.success_rate >= 1.0 || roll < self.success_rate
    }
}

pub struct FixedOutcome(pub bool);

impl SendOutcome for FixedOutcome {
    fn succeeds(&self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ApplyTimings {
    pub send_delay: Duration,
    pub success_reset: Duration,
    pub error_reset: Duration,
}

impl From<&ApplyConfig> for ApplyTimings {
    fn from(config: &ApplyConfig) -> Self {
        Self {
            send_delay: config.send_delay(),
            success_reset: config.success_reset(),
            error_reset: config.error_reset(),
        }
    }
}

/// Application modal for one job
#[derive(Debug)]
pub struct ApplySession {
    job_id: String,
    company_name: String,
    message: String,
    open: bool,
    status: watch::Sender<ApplyStatus>,
}

impl ApplySession {
    pub fn new(job: &Job) -> Self {
        let (status, _) = watch::channel(ApplyStatus::Idle);
        Self {
            job_id: job.id.clone(),
            company_name: job.company_name.clone(),
            message: String::new(),
            open: true,
            status,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn status(&self) -> ApplyStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ApplyStatus> {
        self.status.subscribe()
    }

    /// The form is disabled unless the session is idle
    pub fn is_editable(&self) -> bool {
        self.open && self.status() == ApplyStatus::Idle
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> Result<()> {
        if !self.is_editable() {
            anyhow::bail!("Application form is busy");
        }
        self.message = message.into();
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.status() != ApplyStatus::Idle {
            anyhow::bail!("Cannot close while a send is in progress");
        }
        self.open = false;
        Ok(())
    }

    /// Success clears the message and closes the modal once the reset delay
    /// elapses. Failure returns to idle with the message kept and the modal open.
    pub async fn send(
        &mut self,
        outcome: &dyn SendOutcome,
        timings: &ApplyTimings,
    ) -> Result<ApplyResult> {
        if !self.is_editable() {
            anyhow::bail!("Application form is busy");
        }
        if self.message.trim().is_empty() {
            anyhow::bail!("Message is required");
        }

        let _reset = ResetOnDrop(&self.status);
        self.status.send_replace(ApplyStatus::Loading);
        tokio::time::sleep(timings.send_delay).await;

        if outcome.succeeds() {
            info!("Application to {} ({}) delivered", self.company_name, self.job_id);
            self.status.send_replace(ApplyStatus::Success);
            tokio::time::sleep(timings.success_reset).await;
            self.message.clear();
            self.status.send_replace(ApplyStatus::Idle);
            self.open = false;
            Ok(ApplyResult::Delivered)
        } else {
            warn!("Application to {} ({}) failed", self.company_name, self.job_id);
            self.status.send_replace(ApplyStatus::Error);
            tokio::time::sleep(timings.error_reset).await;
            self.status.send_replace(ApplyStatus::Idle);
            Ok(ApplyResult::Failed)
        }
    }
}

/// Returns an interrupted send to idle so the form stays usable
struct ResetOnDrop<'a>(&'a watch::Sender<ApplyStatus>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|status| {
            if *status == ApplyStatus::Idle {
                return false;
            }
            *status = ApplyStatus::Idle;
            true
        });
    }
}

/// Shared access to one job's form across requests. Only one holder may
/// edit or send at a time.
#[derive(Debug, Clone)]
pub struct ApplyHandle {
    session: Arc<Mutex<ApplySession>>,
    status: watch::Receiver<ApplyStatus>,
}

impl ApplyHandle {
    pub fn new(session: ApplySession) -> Self {
        let status = session.subscribe();
        Self {
            session: Arc::new(Mutex::new(session)),
            status,
        }
    }

    /// Readable while a send holds the form
    pub fn status(&self) -> ApplyStatus {
        *self.status.borrow()
    }

    /// None while another holder is sending
    pub fn try_claim(&self) -> Option<OwnedMutexGuard<ApplySession>> {
        self.session.clone().try_lock_owned().ok()
    }
}
