// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, keyed by Firebase uid)
//! - Workouts (finished tracking sessions)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{UserProfile, WorkoutResult};
use crate::time_utils::format_utc_rfc3339;

/// Upper bound on workouts returned by a single history query.
pub const MAX_WORKOUT_PAGE: u32 = 100;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a profile.
    pub async fn upsert_user_profile(
        &self,
        uid: &str,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Load a profile, creating the default one on first login.
    pub async fn get_or_create_profile(
        &self,
        uid: &str,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        if let Some(profile) = self.get_user_profile(uid).await? {
            return Ok(profile);
        }

        let now = format_utc_rfc3339(chrono::Utc::now());
        let name = display_name
            .filter(|n| !n.is_empty())
            .or_else(|| email.and_then(|e| e.split('@').next()))
            .unwrap_or("Athlete");
        let profile =
            UserProfile::with_defaults(name.to_string(), email.map(str::to_string), &now);

        self.upsert_user_profile(uid, &profile).await?;
        tracing::info!(uid, "Created default profile");
        Ok(profile)
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// Store a finished workout. Returns the document ID.
    pub async fn save_workout(
        &self,
        workout: &WorkoutResult,
        finished_at_ms: i64,
    ) -> Result<String, AppError> {
        let doc_id = workout.document_id(finished_at_ms);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUTS)
            .document_id(&doc_id)
            .object(workout)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(doc_id = %doc_id, "Saved workout");
        Ok(doc_id)
    }

    /// Most recent workouts for a user, newest first.
    pub async fn list_workouts(&self, uid: &str, limit: u32) -> Result<Vec<WorkoutResult>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .filter(move |q| q.for_all([q.field("userId").eq(uid.clone())]))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit.clamp(1, MAX_WORKOUT_PAGE))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
