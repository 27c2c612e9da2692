// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live exercise tracking.
//!
//! A [`TrackingSession`] is a plain state machine:
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running --stop--> Stopped
//!                    \____________________stop____________________/
//! ```
//!
//! It is fed by two independent sources: location samples from the client
//! and a one-second [`SessionTicker`]. Both take the session lock, so updates
//! are serialized. All time inputs are explicit to keep the machine testable.
//!
//! [`TrackingService`] discards sessions whose client has gone quiet for
//! longer than the idle timeout, releasing their tickers.

use crate::config::DEFAULT_SESSION_IDLE_TIMEOUT_SECS;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::geo_utils::distance;
use crate::models::{ActivityType, Location, TimedLocation, UserProfile, WorkoutResult};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Position jumps larger than this between consecutive fixes are GPS noise.
pub const MAX_SAMPLE_JUMP_M: f64 = 100.0;
/// Period of the elapsed-time ticker.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const RESTING_HEART_RATE_BPM: f64 = 70.0;
/// kcal per kg per km when running.
const RUNNING_KCAL_PER_KG_KM: f64 = 1.036;
/// Metabolic equivalent of moderate cycling.
const CYCLING_MET: f64 = 7.5;

/// Lifecycle state of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Tracking errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("no active tracking session")]
    NoActiveSession,

    #[error("a tracking session is already active")]
    AlreadyActive,
}

/// What happened to a location sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// First fix of a running stretch; anchors distance accumulation.
    Anchored,
    Accepted { delta_m: f64 },
    /// Jump exceeded [`MAX_SAMPLE_JUMP_M`]; not counted, but re-anchors.
    RejectedNoise { delta_m: f64 },
    /// Session not running.
    Ignored,
}

/// Derived metrics shown on the tracking screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionMetrics {
    pub distance_km: f64,
    pub elapsed_s: f64,
    pub avg_speed_kmh: f64,
    /// Minutes per kilometer; absent until some distance is covered
    pub pace_min_per_km: Option<f64>,
    pub calories: f64,
    /// Simulated from speed; there is no sensor input
    pub heart_rate_bpm: u32,
}

/// Accumulated state of one exercise session.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    state: SessionState,
    activity_type: ActivityType,
    started_at: Option<DateTime<Utc>>,
    last_tick: Option<DateTime<Utc>>,
    distance_m: f64,
    elapsed_s: f64,
    path: Vec<TimedLocation>,
    last_fix: Option<Location>,
}

impl TrackingSession {
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            state: SessionState::Idle,
            activity_type,
            started_at: None,
            last_tick: None,
            distance_m: 0.0,
            elapsed_s: 0.0,
            path: Vec::new(),
            last_fix: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn path(&self) -> &[TimedLocation] {
        &self.path
    }

    fn transition(
        &mut self,
        allowed_from: &[SessionState],
        to: SessionState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if !allowed_from.contains(&self.state) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        tracing::debug!(from = %self.state, to = %to, "Session transition");
        self.state = to;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(&[SessionState::Idle], SessionState::Running, "start")?;
        self.started_at = Some(now);
        self.last_tick = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.tick(now);
        self.transition(&[SessionState::Running], SessionState::Paused, "pause")?;
        self.last_tick = None;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(&[SessionState::Paused], SessionState::Running, "resume")?;
        self.last_tick = Some(now);
        // Movement while paused is not counted.
        self.last_fix = None;
        Ok(())
    }

    /// Add wall-clock time since the previous tick. No-op unless running.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(last) = self.last_tick {
            let delta = (now - last).num_milliseconds();
            if delta > 0 {
                self.elapsed_s += delta as f64 / 1000.0;
                self.last_tick = Some(now);
            }
        } else {
            self.last_tick = Some(now);
        }
    }

    /// Fold a location sample into the accumulated distance.
    pub fn record_sample(&mut self, sample: TimedLocation) -> SampleOutcome {
        if self.state != SessionState::Running {
            return SampleOutcome::Ignored;
        }

        let Some(previous) = self.last_fix else {
            self.last_fix = Some(sample.location);
            self.path.push(sample);
            return SampleOutcome::Anchored;
        };

        let delta_m = distance(previous, sample.location);
        self.last_fix = Some(sample.location);

        if delta_m > MAX_SAMPLE_JUMP_M {
            tracing::debug!(delta_m, "Rejected GPS jump");
            return SampleOutcome::RejectedNoise { delta_m };
        }

        self.distance_m += delta_m;
        self.path.push(sample);
        SampleOutcome::Accepted { delta_m }
    }

    pub fn metrics(&self, profile: &UserProfile) -> SessionMetrics {
        let distance_km = self.distance_m / 1000.0;
        let hours = self.elapsed_s / 3600.0;
        let avg_speed_kmh = if hours > 0.0 { distance_km / hours } else { 0.0 };
        let pace_min_per_km = (distance_km > 0.0).then(|| (self.elapsed_s / 60.0) / distance_km);

        SessionMetrics {
            distance_km,
            elapsed_s: self.elapsed_s,
            avg_speed_kmh,
            pace_min_per_km,
            calories: calories_burned(self.activity_type, profile.weight_kg, distance_km, hours),
            heart_rate_bpm: simulated_heart_rate(
                self.activity_type,
                self.state,
                avg_speed_kmh,
                profile.age,
            ),
        }
    }

    /// Finish the session and build the workout record.
    pub fn stop(
        &mut self,
        now: DateTime<Utc>,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<WorkoutResult, SessionError> {
        self.tick(now);
        self.transition(
            &[SessionState::Running, SessionState::Paused],
            SessionState::Stopped,
            "stop",
        )?;
        self.last_tick = None;

        let metrics = self.metrics(profile);
        Ok(WorkoutResult {
            user_id: user_id.to_string(),
            activity_type: self.activity_type,
            distance_km: metrics.distance_km,
            time_seconds: metrics.elapsed_s.round() as u64,
            calories: metrics.calories,
            avg_speed_kmh: metrics.avg_speed_kmh,
            route: self.path.iter().map(|s| s.location).collect(),
            achievements: achievements(
                self.activity_type,
                metrics.distance_km,
                metrics.elapsed_s,
                metrics.avg_speed_kmh,
            ),
            timestamp: format_utc_rfc3339(now),
        })
    }
}

/// Estimated energy use in kcal.
pub fn calories_burned(activity: ActivityType, weight_kg: f64, distance_km: f64, hours: f64) -> f64 {
    match activity {
        ActivityType::Running => RUNNING_KCAL_PER_KG_KM * weight_kg * distance_km,
        ActivityType::Cycling => CYCLING_MET * weight_kg * hours,
    }
}

/// Heart rate derived from speed, capped at the age-predicted maximum.
pub fn simulated_heart_rate(
    activity: ActivityType,
    state: SessionState,
    speed_kmh: f64,
    age: u32,
) -> u32 {
    if state != SessionState::Running {
        return RESTING_HEART_RATE_BPM as u32;
    }
    let bpm_per_kmh = match activity {
        ActivityType::Running => 8.0,
        ActivityType::Cycling => 3.5,
    };
    let max_hr = 220.0 - f64::from(age.min(120));
    (RESTING_HEART_RATE_BPM + bpm_per_kmh * speed_kmh)
        .min(max_hr)
        .round() as u32
}

/// Badges earned by a finished workout.
pub fn achievements(
    activity: ActivityType,
    distance_km: f64,
    elapsed_s: f64,
    avg_speed_kmh: f64,
) -> Vec<String> {
    let speed_threshold = match activity {
        ActivityType::Running => 12.0,
        ActivityType::Cycling => 25.0,
    };

    [
        (distance_km >= 1.0, "first-steps"),
        (distance_km >= 5.0, "5k-finisher"),
        (distance_km >= 10.0, "10k-finisher"),
        (elapsed_s >= 30.0 * 60.0, "half-hour-hero"),
        (elapsed_s >= 60.0 * 60.0, "hour-of-power"),
        (distance_km >= 1.0 && avg_speed_kmh >= speed_threshold, "speedster"),
    ]
    .into_iter()
    .filter(|(earned, _)| *earned)
    .map(|(_, name)| name.to_string())
    .collect()
}

/// Background ticker bound to one session.
///
/// The task is aborted when the ticker is dropped.
pub struct SessionTicker {
    handle: JoinHandle<()>,
}

impl SessionTicker {
    pub fn spawn(session: Arc<Mutex<TrackingSession>>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                session.lock().await.tick(Utc::now());
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct ActiveSession {
    session: Arc<Mutex<TrackingSession>>,
    /// Last client request touching this session; ticks do not count
    last_activity: Instant,
    _ticker: SessionTicker,
}

type SessionMap = DashMap<String, ActiveSession>;

/// Drop sessions idle for at least `idle_timeout`. Returns how many went.
fn expire_idle(sessions: &SessionMap, idle_timeout: Duration, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|user_id, active| {
        let idle = now.saturating_duration_since(active.last_activity);
        if idle < idle_timeout {
            return true;
        }
        tracing::warn!(
            user_id = %user_id,
            idle_s = idle.as_secs(),
            "Discarding idle tracking session"
        );
        false
    });
    before.saturating_sub(sessions.len())
}

/// Periodic idle-session sweep, aborted on drop.
struct SessionReaper {
    handle: JoinHandle<()>,
}

impl SessionReaper {
    fn spawn(sessions: Arc<SessionMap>, idle_timeout: Duration) -> Self {
        let period = (idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                expire_idle(&sessions, idle_timeout, Instant::now());
            }
        });
        Self { handle }
    }
}

impl Drop for SessionReaper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Snapshot returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub activity_type: ActivityType,
    pub started_at: Option<String>,
    pub samples: usize,
    pub metrics: SessionMetrics,
}

impl SessionSnapshot {
    fn of(session: &TrackingSession, profile: &UserProfile) -> Self {
        Self {
            state: session.state(),
            activity_type: session.activity_type(),
            started_at: session.started_at().map(format_utc_rfc3339),
            samples: session.path().len(),
            metrics: session.metrics(profile),
        }
    }
}

/// Active sessions keyed by user id.
///
/// The idle sweep starts with the first session.
pub struct TrackingService {
    sessions: Arc<SessionMap>,
    tick_interval: Duration,
    idle_timeout: Duration,
    reaper: OnceLock<SessionReaper>,
}

impl Default for TrackingService {
    fn default() -> Self {
        Self::new(
            TICK_INTERVAL,
            Duration::from_secs(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
        )
    }
}

impl TrackingService {
    pub fn new(tick_interval: Duration, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            tick_interval,
            idle_timeout,
            reaper: OnceLock::new(),
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Discard sessions idle past the timeout right away.
    pub fn expire_idle_sessions(&self) -> usize {
        expire_idle(&self.sessions, self.idle_timeout, Instant::now())
    }

    /// Look up a session and record client activity on it.
    fn session(&self, user_id: &str) -> Result<Arc<Mutex<TrackingSession>>, SessionError> {
        let mut active = self
            .sessions
            .get_mut(user_id)
            .ok_or(SessionError::NoActiveSession)?;
        active.last_activity = Instant::now();
        Ok(active.session.clone())
    }

    /// Begin a new session and its ticker.
    pub fn start(
        &self,
        user_id: &str,
        activity: ActivityType,
        profile: &UserProfile,
    ) -> Result<SessionSnapshot, SessionError> {
        self.reaper
            .get_or_init(|| SessionReaper::spawn(self.sessions.clone(), self.idle_timeout));

        match self.sessions.entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(SessionError::AlreadyActive),
            Entry::Vacant(slot) => {
                let mut session = TrackingSession::new(activity);
                session.start(Utc::now())?;
                let snapshot = SessionSnapshot::of(&session, profile);

                let session = Arc::new(Mutex::new(session));
                let ticker = SessionTicker::spawn(session.clone(), self.tick_interval);
                slot.insert(ActiveSession {
                    session,
                    last_activity: Instant::now(),
                    _ticker: ticker,
                });

                tracing::info!(user_id, activity = activity.as_str(), "Tracking session started");
                Ok(snapshot)
            }
        }
    }

    pub async fn record_sample(
        &self,
        user_id: &str,
        sample: TimedLocation,
    ) -> Result<SampleOutcome, SessionError> {
        let session = self.session(user_id)?;
        let outcome = session.lock().await.record_sample(sample);
        Ok(outcome)
    }

    pub async fn pause(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.session(user_id)?;
        let mut guard = session.lock().await;
        guard.pause(Utc::now())?;
        Ok(SessionSnapshot::of(&guard, profile))
    }

    pub async fn resume(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.session(user_id)?;
        let mut guard = session.lock().await;
        guard.resume(Utc::now())?;
        Ok(SessionSnapshot::of(&guard, profile))
    }

    pub async fn snapshot(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.session(user_id)?;
        let guard = session.lock().await;
        Ok(SessionSnapshot::of(&guard, profile))
    }

    /// Stop the session, release its ticker and persist the workout.
    ///
    /// The session is discarded even if the write fails; there is no retry.
    pub async fn finish(
        &self,
        user_id: &str,
        profile: &UserProfile,
        db: &FirestoreDb,
    ) -> Result<WorkoutResult, AppError> {
        let session = self.session(user_id)?;
        let now = Utc::now();
        let result = session.lock().await.stop(now, user_id, profile)?;
        self.sessions.remove(user_id);

        tracing::info!(
            user_id,
            distance_km = result.distance_km,
            time_seconds = result.time_seconds,
            "Tracking session stopped"
        );

        db.save_workout(&result, now.timestamp_millis()).await?;
        Ok(result)
    }
}
