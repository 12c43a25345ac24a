// src/state.rs
//! In-memory session state. Update functions are the only mutation path.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::apply::{ApplyHandle, ApplySession, ApplyStatus};
use crate::core::location::fallback_location;
use crate::discovery::merge_external_jobs;
use crate::types::{Job, JobDraft, LocationData, UserRole};
use crate::utils::contains_ignore_case;

pub const CURRENT_USER_ID: &str = "current-user";
pub const CURRENT_USER_NAME: &str = "Siz";
pub const DEFAULT_POST_ADDRESS: &str = "Konum Seçildi";

/// Operations guarded against duplicate triggers while in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyFlag {
    Discovery,
    Description,
}

#[derive(Debug, Default)]
struct BusyFlags {
    searching_nearby: AtomicBool,
    generating_description: AtomicBool,
}

impl BusyFlags {
    fn slot(&self, flag: BusyFlag) -> &AtomicBool {
        match flag {
            BusyFlag::Discovery => &self.searching_nearby,
            BusyFlag::Description => &self.generating_description,
        }
    }
}

/// Held while a guarded operation runs. Dropping it releases the flag, so an
/// abandoned request cannot leave the operation locked.
#[derive(Debug)]
pub struct BusyGuard {
    flags: Arc<BusyFlags>,
    flag: BusyFlag,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flags.slot(self.flag).store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct AppState {
    role: UserRole,
    jobs: Vec<Job>,
    location: Option<LocationData>,
    loading_location: bool,
    busy: Arc<BusyFlags>,
    applications: HashMap<String, ApplyHandle>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(seed_jobs())
    }
}

impl AppState {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            role: UserRole::Seeker,
            jobs,
            location: None,
            loading_location: true,
            busy: Arc::new(BusyFlags::default()),
            applications: HashMap::new(),
        }
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn location(&self) -> Option<&LocationData> {
        self.location.as_ref()
    }

    pub fn loading_location(&self) -> bool {
        self.loading_location
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn toggle_role(&mut self) -> UserRole {
        self.role = self.role.toggled();
        info!("Switched role to {:?}", self.role);
        self.role
    }

    /// Resolve the session location once; later calls are ignored
    pub fn set_location(&mut self, location: LocationData) {
        if self.location.is_some() {
            warn!("Location already resolved, ignoring update");
            return;
        }
        self.location = Some(location);
        self.loading_location = false;
    }

    /// Publish an employer draft. The job lands first and the view
    /// switches back to the seeker list.
    pub fn post_job(&mut self, draft: JobDraft) -> Result<Job> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            anyhow::bail!("Missing required fields: {}", missing.join(", "));
        }

        let address = draft
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .unwrap_or(DEFAULT_POST_ADDRESS)
            .to_string();

        let coordinates = self.location.clone().unwrap_or_else(fallback_location);

        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            company_name: draft.company_name.trim().to_string(),
            description: draft.description.trim().to_string(),
            salary: draft.salary.trim().to_string(),
            location: LocationData::new(coordinates.latitude, coordinates.longitude)
                .with_address(address),
            employer_id: CURRENT_USER_ID.to_string(),
            employer_name: CURRENT_USER_NAME.to_string(),
            posted_at: Utc::now(),
            is_ai_generated: None,
            maps_uri: None,
        };

        info!("Posted job {} ({})", job.id, job.title);
        self.jobs.insert(0, job.clone());
        self.role = UserRole::Seeker;
        Ok(job)
    }

    /// Merge discovered jobs, returning the ones that were new to the session
    pub fn add_external_jobs(&mut self, jobs: Vec<Job>) -> Vec<Job> {
        let added = merge_external_jobs(&mut self.jobs, jobs);
        info!("Added {} discovered jobs", added.len());
        added
    }

    /// Jobs whose title, company or description contains `query`
    pub fn filtered_jobs(&self, query: &str) -> Vec<Job> {
        let query = query.trim();
        self.jobs
            .iter()
            .filter(|job| {
                contains_ignore_case(&job.title, query)
                    || contains_ignore_case(&job.company_name, query)
                    || contains_ignore_case(&job.description, query)
            })
            .cloned()
            .collect()
    }

    /// Claim a busy flag. Returns None when the operation is already running.
    pub fn try_begin(&self, flag: BusyFlag) -> Option<BusyGuard> {
        self.busy
            .slot(flag)
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard {
                flags: self.busy.clone(),
                flag,
            })
    }

    pub fn is_busy(&self, flag: BusyFlag) -> bool {
        self.busy.slot(flag).load(Ordering::SeqCst)
    }

    /// The open application form for a job, created on first use.
    /// None when the job does not exist.
    pub fn application(&mut self, job_id: &str) -> Option<ApplyHandle> {
        if let Some(handle) = self.applications.get(job_id) {
            return Some(handle.clone());
        }
        let job = self.jobs.iter().find(|job| job.id == job_id)?;
        let handle = ApplyHandle::new(ApplySession::new(job));
        self.applications.insert(job_id.to_string(), handle.clone());
        Some(handle)
    }

    pub fn application_status(&self, job_id: &str) -> Option<ApplyStatus> {
        self.applications.get(job_id).map(ApplyHandle::status)
    }

    /// Close a job's form. Returns false when no form is open and fails while
    /// a send holds it.
    pub fn close_application(&mut self, job_id: &str) -> Result<bool> {
        let Some(handle) = self.applications.get(job_id) else {
            return Ok(false);
        };
        let Some(mut session) = handle.try_claim() else {
            anyhow::bail!("Cannot close while a send is in progress");
        };
        session.close()?;
        info!("Closed application form for job {}", session.job_id());
        drop(session);
        self.applications.remove(job_id);
        Ok(true)
    }

    /// Forget a form that closed itself after a delivered send
    pub fn release_application(&mut self, job_id: &str) {
        self.applications.remove(job_id);
    }
}

/// Listings present when a session starts
pub fn seed_jobs() -> Vec<Job> {
    let now = Utc::now();
    vec![
        Job {
            id: "1".to_string(),
            title: "Barista".to_string(),
            company_name: "Keyif Kahvesi".to_string(),
            description: "Deneyimli veya yetiştirilmek üzere barista arıyoruz. Esnek çalışma saatleri."
                .to_string(),
            salary: "22.000 TL".to_string(),
            location: LocationData::new(41.0082, 28.9784).with_address("Taksim, İstanbul"),
            employer_id: "emp1".to_string(),
            employer_name: "Ahmet Y.".to_string(),
            posted_at: now - Duration::days(1),
            is_ai_generated: None,
            maps_uri: None,
        },
        Job {
            id: "2".to_string(),
            title: "Kurye".to_string(),
            company_name: "Hızlı Lojistik".to_string(),
            description: "A2 ehliyetli, kendi motoruyla veya şirket motoruyla çalışacak kurye."
                .to_string(),
            salary: "30.000 TL + Prim".to_string(),
            location: LocationData::new(41.0122, 28.9764).with_address("Şişli, İstanbul"),
            employer_id: "emp2".to_string(),
            employer_name: "Lojistik A.Ş.".to_string(),
            posted_at: now - Duration::days(2),
            is_ai_generated: None,
            maps_uri: None,
        },
    ]
}
