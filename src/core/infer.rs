//! Suspect inference pipeline
//!
//! Pages staging documents that carry both medical and pharmacy claims,
//! sends each page to the inference service, and upserts the returned
//! suspects keyed by member. An invalid service reply empties that page,
//! never the run.

use crate::adapters::inference::InferenceClient;
use crate::adapters::store::DocumentStore;
use crate::config::ClaimsyncConfig;
use crate::core::sync::flush::flush_with_retry;
use crate::domain::document::UpsertSpec;
use crate::domain::ids::MemberId;
use crate::domain::suspect::Suspect;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use uuid::Uuid;

/// Staging array fields that must be non-empty for a member to be inferred
const REQUIRED_CLAIM_FIELDS: &[&str] = &["medicalClaims", "pharmacyClaims"];

/// Fields stripped from staging documents before they are sent out
const STRIPPED_FIELDS: &[&str] = &["createdAt", "updatedAt"];

/// Summary of an inference run
#[derive(Debug, Clone)]
pub struct InferSummary {
    /// Run identifier for log correlation
    pub run_id: Uuid,

    /// Pages of staging documents processed
    pub pages: usize,

    /// Staging documents sent to the service
    pub documents: usize,

    /// Suspects returned across all pages
    pub suspects: usize,

    /// Suspect upserts applied
    pub persisted: usize,

    /// Pages or operations that failed
    pub failed: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Whether the run stopped early on a shutdown signal
    pub interrupted: bool,
}

impl InferSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pages: 0,
            documents: 0,
            suspects: 0,
            persisted: 0,
            failed: 0,
            duration: Duration::from_secs(0),
            interrupted: false,
        }
    }

    /// Check if the run completed without failures
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }
}

/// Build the upsert for one suspect
///
/// The whole suspect lands in the set portion with a refreshed
/// `updatedAt`; `createdAt` is only written on insert.
pub fn suspect_upsert(suspect: &Suspect, now: DateTime<Utc>) -> Result<UpsertSpec> {
    let member_id = MemberId::new(&suspect.member_id)
        .map_err(crate::domain::errors::SyncError::Validation)?;

    let mut set = serde_json::to_value(suspect)?;
    if let Value::Object(map) = &mut set {
        map.insert("updatedAt".to_string(), json!(now));
    }

    Ok(UpsertSpec {
        member_id,
        set,
        set_on_insert: json!({
            "memberId": suspect.member_id,
            "createdAt": now,
        }),
    })
}

/// Inference coordinator
pub struct InferCoordinator {
    config: ClaimsyncConfig,
    store: Arc<dyn DocumentStore>,
    client: InferenceClient,
    shutdown_rx: watch::Receiver<bool>,
}

impl InferCoordinator {
    /// Create a new coordinator
    ///
    /// # Errors
    ///
    /// Returns an error if inference is not configured.
    pub fn new(
        config: ClaimsyncConfig,
        store: Arc<dyn DocumentStore>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let inference = config.inference.clone().ok_or_else(|| {
            crate::domain::errors::SyncError::Configuration(
                "inference section is required for the infer command".to_string(),
            )
        })?;

        let client = InferenceClient::new(inference)?;

        Ok(Self {
            config,
            store,
            client,
            shutdown_rx,
        })
    }

    /// Execute the inference run
    pub async fn run(&mut self) -> Result<InferSummary> {
        let start_time = Instant::now();
        let mut summary = InferSummary::new();
        let dry_run = self.config.application.dry_run;
        let page_size = self
            .config
            .inference
            .as_ref()
            .map(|c| c.batch_size as u64)
            .unwrap_or(4);

        tracing::info!(
            run_id = %summary.run_id,
            model = self.client.model(),
            page_size = page_size,
            dry_run = dry_run,
            "Starting suspect inference"
        );

        self.store.test_connection().await?;

        let mut skip = 0u64;
        loop {
            if *self.shutdown_rx.borrow() {
                tracing::info!("Shutdown requested, stopping before next page");
                summary.interrupted = true;
                break;
            }

            let page = self
                .store
                .page_where_nonempty(
                    &self.config.collections.staging,
                    REQUIRED_CLAIM_FIELDS,
                    skip,
                    page_size,
                )
                .await?;

            if page.is_empty() {
                break;
            }

            skip += page.len() as u64;
            summary.pages += 1;
            summary.documents += page.len();

            let documents: Vec<Value> = page.iter().map(|doc| strip_fields(doc)).collect();

            let suspects = match self.client.infer_suspects(&documents).await {
                Ok(suspects) => suspects,
                Err(e) => {
                    tracing::error!(error = %e, "Inference request failed for page");
                    summary.failed += 1;
                    continue;
                }
            };

            if suspects.is_empty() {
                continue;
            }

            summary.suspects += suspects.len();
            self.persist(&suspects, &mut summary, dry_run).await?;
        }

        summary.duration = start_time.elapsed();
        tracing::info!(
            run_id = %summary.run_id,
            pages = summary.pages,
            documents = summary.documents,
            suspects = summary.suspects,
            persisted = summary.persisted,
            failed = summary.failed,
            interrupted = summary.interrupted,
            duration_secs = summary.duration.as_secs_f64(),
            "Inference run complete"
        );

        Ok(summary)
    }

    async fn persist(
        &self,
        suspects: &[Suspect],
        summary: &mut InferSummary,
        dry_run: bool,
    ) -> Result<()> {
        let now = Utc::now();
        let mut ops = Vec::with_capacity(suspects.len());

        for suspect in suspects {
            match suspect_upsert(suspect, now) {
                Ok(op) => ops.push(op),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping suspect with invalid member id");
                    summary.failed += 1;
                }
            }
        }

        if ops.is_empty() {
            return Ok(());
        }

        let submitted = ops.len();
        let report = flush_with_retry(
            self.store.as_ref(),
            &self.config.collections.suspects,
            ops,
            &self.config.sync.retry,
            dry_run,
        )
        .await?;

        summary.persisted += submitted - report.failures.len();
        summary.failed += report.failures.len();
        Ok(())
    }
}

/// Copy of a staging document without bookkeeping fields
fn strip_fields(doc: &Value) -> Value {
    match doc {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !STRIPPED_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
