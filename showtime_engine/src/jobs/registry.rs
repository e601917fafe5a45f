use std::{fmt::Debug, future::Future, sync::Arc};

use futures_util::{future::LocalBoxFuture, FutureExt};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{db_types::BookingId, events::DomainEvent, traits::BookingStoreError};

#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("No job with id {0} is registered")]
    UnknownJob(String),
    #[error("The triggering event carries no valid bookingId")]
    MissingBookingId,
    #[error("Booking {0} does not exist")]
    BookingNotFound(BookingId),
    #[error("Booking store error. {0}")]
    StoreError(#[from] BookingStoreError),
    #[error("{0}")]
    Failed(String),
}

/// Job handlers run on the request's worker thread, so their futures need not be `Send`.
pub type JobFn = Arc<dyn Fn(DomainEvent) -> LocalBoxFuture<'static, Result<Value, JobError>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub trigger: String,
}

impl JobDefinition {
    pub fn new(id: &str, name: &str, trigger: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string(), trigger: trigger.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTrigger {
    pub event: String,
}

/// What the event bus sees of a job when it introspects the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    pub id: String,
    pub name: String,
    pub triggers: Vec<JobTrigger>,
}

impl From<&JobDefinition> for JobDescription {
    fn from(def: &JobDefinition) -> Self {
        Self { id: def.id.clone(), name: def.name.clone(), triggers: vec![JobTrigger { event: def.trigger.clone() }] }
    }
}

struct RegisteredJob {
    definition: JobDefinition,
    handler: JobFn,
}

/// Jobs in registration order.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<RegisteredJob>,
}

impl Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids = self.jobs.iter().map(|j| j.definition.id.as_str()).collect::<Vec<_>>();
        write!(f, "JobRegistry {ids:?}")
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `definition.id`. A job registered twice under the same id replaces the first one.
    pub fn register<F, Fut>(&mut self, definition: JobDefinition, handler: F) -> &mut Self
    where
        F: Fn(DomainEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, JobError>> + 'static,
    {
        let handler: JobFn = Arc::new(move |event| handler(event).boxed_local());
        if let Some(existing) = self.jobs.iter_mut().find(|j| j.definition.id == definition.id) {
            warn!("⚙️ Job {} was registered twice. The later registration wins.", definition.id);
            *existing = RegisteredJob { definition, handler };
        } else {
            debug!("⚙️ Registered job {} (triggered by {})", definition.id, definition.trigger);
            self.jobs.push(RegisteredJob { definition, handler });
        }
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn definition(&self, id: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|j| j.definition.id == id).map(|j| &j.definition)
    }

    pub fn describe(&self) -> Vec<JobDescription> {
        self.jobs.iter().map(|j| JobDescription::from(&j.definition)).collect()
    }

    /// Run the job registered under `id` with the triggering event.
    pub async fn invoke(&self, id: &str, event: DomainEvent) -> Result<Value, JobError> {
        let job = self.jobs.iter().find(|j| j.definition.id == id).ok_or_else(|| JobError::UnknownJob(id.into()))?;
        debug!("⚙️ Running job {id} for {}", event.name);
        let handler = Arc::clone(&job.handler);
        handler(event).await
    }
}
