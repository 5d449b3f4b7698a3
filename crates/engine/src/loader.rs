//! Training session loader.
//!
//! Normalizes heterogeneous backend payloads into the uniform training
//! graph, and resolves the learner's identity from the session store once so
//! downstream calls receive it explicitly.

use std::sync::Arc;

use tracing::{debug, info};

use client::api::PortalApi;
use client::session_store::{keys, SessionStore, StoredUser};
use portal_core::model::{EmployeeId, Identity, Training, TrainingKind, UserId};

use crate::error::LoadError;

/// The normalized result of a full load.
#[derive(Debug, Clone, Default)]
pub struct TrainingGraph {
    pub assigned: Vec<Training>,
    pub mandatory: Vec<Training>,
    pub overall_completion: f64,
}

/// Loads and normalizes training data from the backend.
#[derive(Clone)]
pub struct TrainingSessionLoader {
    api: Arc<dyn PortalApi>,
}

impl TrainingSessionLoader {
    #[must_use]
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    /// Resolves the learner's identity from the session store.
    ///
    /// The employee id is taken from the direct key first, then from the
    /// stored user record; the backend user id only lives in the record.
    /// Done once at startup — call sites receive the typed identity instead
    /// of re-reading the store ambiently.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::MissingIdentity` if either id cannot be resolved.
    pub fn resolve_identity(store: &dyn SessionStore) -> Result<Identity, LoadError> {
        let record = store
            .get(keys::USER_DATA)
            .and_then(|raw| StoredUser::from_json(&raw));

        let employee_id = store
            .get(keys::EMPLOYEE_ID)
            .filter(|id| !id.trim().is_empty())
            .or_else(|| {
                record
                    .as_ref()
                    .and_then(StoredUser::resolve_employee_id)
                    .map(str::to_string)
            })
            .ok_or(LoadError::MissingIdentity)?;

        let user_id = record
            .as_ref()
            .and_then(StoredUser::resolve_user_id)
            .map(str::to_string)
            .ok_or(LoadError::MissingIdentity)?;

        debug!(%employee_id, "resolved learner identity");
        Ok(Identity::new(
            EmployeeId::new(employee_id),
            UserId::new(user_id),
        ))
    }

    /// Loads the unified assigned + mandatory listing.
    ///
    /// Normalization happens at the DTO boundary: missing module lists
    /// become empty sequences, missing due dates get the default, and the
    /// aggregate percentage is passed through as reported — never derived
    /// from module or video state.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport failure or a payload that fails
    /// domain validation.
    pub async fn load(&self, employee_id: &EmployeeId) -> Result<TrainingGraph, LoadError> {
        let payload = self.api.load_trainings(employee_id).await?;

        let assigned = payload
            .assigned_trainings
            .into_iter()
            .map(|dto| dto.into_training(TrainingKind::Assigned))
            .collect::<Result<Vec<_>, _>>()?;
        let mandatory = payload
            .mandatory_trainings
            .into_iter()
            .map(|dto| dto.into_training(TrainingKind::Mandatory))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            assigned = assigned.len(),
            mandatory = mandatory.len(),
            overall = payload.user_overall_completion_percentage,
            "loaded trainings"
        );

        Ok(TrainingGraph {
            assigned,
            mandatory,
            overall_completion: payload.user_overall_completion_percentage,
        })
    }

    /// Fetches module/video detail for a training and merges it onto the
    /// summary entry. Every module comes back expanded so nested videos
    /// render without further user action.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport failure or a payload that fails
    /// domain validation.
    pub async fn open_detail(
        &self,
        summary: &Training,
        user_id: &UserId,
    ) -> Result<Training, LoadError> {
        let detail = self.api.training_detail(summary.id(), user_id).await?;
        let modules = detail.into_modules()?;

        let mut training = Training::new(
            summary.id().clone(),
            summary.name(),
            summary.kind(),
            summary.completion_percent(),
            summary.due_date(),
            modules,
        )?;
        training.expand_all_modules();
        Ok(training)
    }
}
