// src/discovery/opportunities.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::GenerativeService;
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse, GroundingChunk};
use crate::types::{Job, LocationData};
use crate::utils::normalize_query;

pub const NEARBY_PLACE_COUNT: usize = 5;
pub const AI_EMPLOYER_ID: &str = "ai-system";
pub const AI_EMPLOYER_NAME: &str = "İşBul Asistanı";
pub const UNSPECIFIED_SALARY: &str = "Belirtilmedi";
pub const VIEW_ON_MAP_ADDRESS: &str = "Haritada Görüntüle";

/// Turns maps-grounded search results into job listings
pub struct OpportunityFinder {
    service: Arc<dyn GenerativeService>,
}

impl OpportunityFinder {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// Only a missing location is an error; every service failure yields
    /// an empty list.
    pub async fn find_nearby(
        &self,
        query: &str,
        location: Option<&LocationData>,
    ) -> Result<Vec<Job>> {
        let location = location.context("Location is required to search nearby")?;
        let query = normalize_query(query);

        if !self.service.has_credential() {
            warn!("API key missing, returning empty list");
            return Ok(Vec::new());
        }

        let request = GenerateContentRequest::maps_grounded(
            build_prompt(&query),
            location.latitude,
            location.longitude,
        );

        match self.service.generate_content(&request).await {
            Ok(response) => {
                let jobs = jobs_from_response(&query, location, &response, Utc::now());
                info!("Found {} nearby opportunities for '{}'", jobs.len(), query);
                Ok(jobs)
            }
            Err(e) => {
                error!("Error fetching nearby opportunities: {:#}", e);
                Ok(Vec::new())
            }
        }
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        "Find {} places nearby that match the category \"{}\" (e.g. restaurants, offices, shops) that might be hiring. Return a list of places.",
        NEARBY_PLACE_COUNT, query
    )
}

/// Map the first candidate's grounding chunks to jobs located at the caller
pub fn jobs_from_response(
    query: &str,
    location: &LocationData,
    response: &GenerateContentResponse,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let Some(chunks) = response
        .candidates
        .first()
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
        .and_then(|metadata| metadata.grounding_chunks.as_ref())
    else {
        return Vec::new();
    };

    let mut jobs = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let Some(source) = chunk.source() else {
            if let GroundingChunk::Unrecognized(keys) = chunk {
                warn!("Skipping unrecognized grounding chunk with keys {:?}", keys);
            }
            continue;
        };

        let Some((uri, title)) = source.uri_and_title() else {
            debug!("Skipping {} chunk {} without uri or title", chunk.kind(), index);
            continue;
        };

        jobs.push(Job {
            id: format!("ai-job-{}-{}", index, now.timestamp_millis()),
            title: format!("{} (Potansiyel)", query),
            company_name: title.to_string(),
            description: format!(
                "Bu işletme ({}) konumunuza yakın ve \"{}\" aramanızla eşleşiyor. Açık pozisyonlar için iletişime geçebilirsiniz.",
                title, query
            ),
            salary: UNSPECIFIED_SALARY.to_string(),
            location: LocationData::new(location.latitude, location.longitude)
                .with_address(VIEW_ON_MAP_ADDRESS),
            employer_id: AI_EMPLOYER_ID.to_string(),
            employer_name: AI_EMPLOYER_NAME.to_string(),
            posted_at: now,
            is_ai_generated: Some(true),
            maps_uri: Some(uri.to_string()),
        });
    }

    jobs
}

/// Prepend jobs whose id is not already known. Returns the jobs that were added.
pub fn merge_external_jobs(existing: &mut Vec<Job>, incoming: Vec<Job>) -> Vec<Job> {
    let known: HashSet<&str> = existing.iter().map(|job| job.id.as_str()).collect();
    let unique: Vec<Job> = incoming
        .into_iter()
        .filter(|job| !known.contains(job.id.as_str()))
        .collect();

    let added = unique.clone();
    let previous = std::mem::replace(existing, unique);
    existing.extend(previous);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeService {
        credential: bool,
        response: Option<serde_json::Value>,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn returning(value: serde_json::Value) -> Self {
            Self {
                credential: true,
                response: Some(value),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                credential: true,
                response: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[rocket::async_trait]
    impl GenerativeService for FakeService {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn generate_content(
            &self,
            _request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(value) => Ok(serde_json::from_value(value.clone())?),
                None => anyhow::bail!("simulated network error"),
            }
        }
    }

    fn two_places() -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps.google.com/?cid=1", "title": "Temiz Ev" } },
                        { "maps": { "uri": "https://maps.google.com/?cid=2", "title": "Parlak Ofis" } }
                    ]
                }
            }]
        })
    }

    fn istanbul() -> LocationData {
        LocationData::new(41.0, 29.0)
    }

    fn sample_job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            title: "Kurye".to_string(),
            company_name: "Hızlı Lojistik".to_string(),
            description: String::new(),
            salary: String::new(),
            location: istanbul(),
            employer_id: "emp".to_string(),
            employer_name: "Emp".to_string(),
            posted_at: Utc::now(),
            is_ai_generated: None,
            maps_uri: None,
        }
    }

    #[tokio::test]
    async fn test_two_candidates_become_two_jobs() {
        let finder = OpportunityFinder::new(Arc::new(FakeService::returning(two_places())));
        let jobs = finder
            .find_nearby("temizlikçi", Some(&istanbul()))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 2);
        for job in &jobs {
            assert_eq!(job.title, "temizlikçi (Potansiyel)");
            assert_eq!(job.location.latitude, 41.0);
            assert_eq!(job.location.longitude, 29.0);
            assert!(job.is_ai_generated());
            assert_eq!(job.employer_id, AI_EMPLOYER_ID);
            assert_eq!(job.salary, UNSPECIFIED_SALARY);
        }
        assert_eq!(jobs[0].company_name, "Temiz Ev");
        assert_eq!(
            jobs[1].maps_uri.as_deref(),
            Some("https://maps.google.com/?cid=2")
        );
        assert!(jobs[0].description.contains("Temiz Ev"));
        assert!(jobs[0].description.contains("temizlikçi"));
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[tokio::test]
    async fn test_no_credential_returns_empty_without_calling() {
        let service = Arc::new(FakeService {
            credential: false,
            ..FakeService::returning(two_places())
        });
        let finder = OpportunityFinder::new(service.clone());

        let jobs = finder.find_nearby("garson", Some(&istanbul())).await.unwrap();
        assert!(jobs.is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_service_failure_returns_empty() {
        let finder = OpportunityFinder::new(Arc::new(FakeService::failing()));
        let jobs = finder.find_nearby("garson", Some(&istanbul())).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_location_is_an_error() {
        let service = Arc::new(FakeService::returning(two_places()));
        let finder = OpportunityFinder::new(service.clone());

        assert!(finder.find_nearby("garson", None).await.is_err());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_query_uses_default_term() {
        let finder = OpportunityFinder::new(Arc::new(FakeService::returning(two_places())));
        let jobs = finder.find_nearby("  ", Some(&istanbul())).await.unwrap();
        assert_eq!(jobs[0].title, "iş yerleri (Potansiyel)");
    }

    #[test]
    fn test_incomplete_and_unknown_chunks_are_skipped() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "uri": "https://maps/1" } },
                        { "web": { "title": "No link" } },
                        { "web": { "uri": "", "title": "Empty link" } },
                        { "retrievedContext": { "uri": "gs://doc", "title": "Doc" } },
                        { "web": { "uri": "https://web/5", "title": "Site" } }
                    ]
                }
            }]
        }))
        .unwrap();

        let now = Utc::now();
        let jobs = jobs_from_response("aşçı", &istanbul(), &response, now);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company_name, "Site");
        assert_eq!(jobs[0].maps_uri.as_deref(), Some("https://web/5"));
        assert_eq!(jobs[0].id, format!("ai-job-4-{}", now.timestamp_millis()));
    }

    #[test]
    fn test_only_first_candidate_is_read() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "no grounding" }] } },
                { "groundingMetadata": { "groundingChunks": [
                    { "maps": { "uri": "https://maps/1", "title": "Kafe" } }
                ] } }
            ]
        }))
        .unwrap();

        assert!(jobs_from_response("garson", &istanbul(), &response, Utc::now()).is_empty());
        assert!(jobs_from_response(
            "garson",
            &istanbul(),
            &GenerateContentResponse::default(),
            Utc::now()
        )
        .is_empty());
    }

    #[test]
    fn test_merge_prepends_and_existing_ids_win() {
        let mut existing = vec![sample_job("1"), sample_job("2")];
        existing[0].title = "original".to_string();

        let mut duplicate = sample_job("1");
        duplicate.title = "duplicate".to_string();
        let incoming = vec![sample_job("ai-job-0-1"), duplicate, sample_job("ai-job-2-1")];

        let added = merge_external_jobs(&mut existing, incoming);
        let added_ids: Vec<&str> = added.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(added_ids, vec!["ai-job-0-1", "ai-job-2-1"]);

        let ids: Vec<&str> = existing.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["ai-job-0-1", "ai-job-2-1", "1", "2"]);
        assert_eq!(existing[2].title, "original");
    }
}
