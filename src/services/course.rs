// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course candidate generation and scoring.
//!
//! For each target distance (a tier) the service:
//! 1. Projects turnaround points in 8 compass directions
//! 2. Requests an out-and-back route through each one
//! 3. Scores every route the vendor actually returned
//! 4. Keeps the best route per tier
//!
//! Candidates are routed with bounded concurrency but scored in generation
//! order, so ties go to the first candidate generated.

use crate::geo_utils::{destination, direction_name};
use crate::models::{ActivityType, Course, CourseTier, Difficulty, Location};
use crate::services::routing::{RouteProvider, RouteRequest, RoutedPath, TravelMode};
use futures_util::{stream, StreamExt};
use std::collections::BTreeSet;

/// Compass directions walked per tier.
const DIRECTIONS_PER_TIER: usize = 8;
/// Bearing rotation applied per tier index so tiers explore different headings.
const TIER_ROTATION_DEG: f64 = 15.0;
/// Turnaround radius as a fraction of target distance (out-and-back doubles it).
const RADIUS_FACTORS: [f64; 3] = [0.4, 0.5, 0.6];
/// Pace assumed by the duration score (km/h).
const SCORING_PACE_KMH: f64 = 6.0;
/// Routes with at most this many steps are tagged beginner-friendly.
const BEGINNER_FRIENDLY_MAX_STEPS: u32 = 10;
const MAX_CONCURRENT_ROUTE_REQUESTS: usize = 4;

const WEIGHT_DISTANCE: f64 = 0.5;
const WEIGHT_DURATION: f64 = 0.3;
const WEIGHT_COMPLEXITY: f64 = 0.2;

/// A turnaround point proposed for a tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub bearing_deg: f64,
    pub radius_km: f64,
    pub turnaround: Location,
}

impl Candidate {
    pub fn direction(&self) -> &'static str {
        direction_name(self.bearing_deg.to_radians())
    }
}

/// Turnaround candidates for a tier, in evaluation order.
pub fn generate_candidates(center: Location, tier: &CourseTier) -> Vec<Candidate> {
    (0..DIRECTIONS_PER_TIER)
        .map(|i| {
            let bearing_deg =
                (i as f64 * 360.0 / DIRECTIONS_PER_TIER as f64 + tier.index as f64 * TIER_ROTATION_DEG)
                    % 360.0;
            let radius_km = tier.distance_km * RADIUS_FACTORS[i % RADIUS_FACTORS.len()];
            Candidate {
                bearing_deg,
                radius_km,
                turnaround: destination(center, radius_km, bearing_deg),
            }
        })
        .collect()
}

/// `max(0, 100 - 20 * |target - actual|)` with distances in km.
pub fn distance_score(target_km: f64, actual_km: f64) -> f64 {
    (100.0 - 20.0 * (target_km - actual_km).abs()).max(0.0)
}

/// Penalize 2 points per minute of deviation from the 6 km/h pace.
pub fn duration_score(target_km: f64, actual_duration_s: f64) -> f64 {
    let expected_min = target_km / SCORING_PACE_KMH * 60.0;
    let actual_min = actual_duration_s / 60.0;
    (100.0 - 2.0 * (actual_min - expected_min).abs()).max(0.0)
}

/// Beginners prefer fewer turns; other tiers prefer more varied routes.
pub fn complexity_score(steps: u32, difficulty: Difficulty) -> f64 {
    let steps = steps as f64;
    match difficulty {
        Difficulty::Beginner => (100.0 - 5.0 * steps).max(0.0),
        Difficulty::Intermediate | Difficulty::Advanced => (5.0 * steps).min(100.0),
    }
}

/// Weighted score of a route against a tier's target.
pub fn evaluate_route(route: &RoutedPath, target_km: f64, difficulty: Difficulty) -> f64 {
    WEIGHT_DISTANCE * distance_score(target_km, route.distance_km())
        + WEIGHT_DURATION * duration_score(target_km, route.duration_s)
        + WEIGHT_COMPLEXITY * complexity_score(route.steps, difficulty)
}

/// Sum of positive elevation changes.
pub fn elevation_gain(profile: &[f64]) -> f64 {
    profile
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .sum()
}

/// A scored route for one candidate.
#[derive(Debug, Clone)]
struct ScoredRoute {
    candidate: Candidate,
    route: RoutedPath,
    score: f64,
}

/// Generates and ranks courses using a routing provider.
#[derive(Clone)]
pub struct CourseService<P> {
    provider: P,
}

impl<P: RouteProvider> CourseService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Best course per target distance around `center`.
    ///
    /// Tiers with no successful vendor response are omitted; the result may
    /// be empty.
    pub async fn generate_courses(
        &self,
        center: Location,
        target_distances_km: &[f64],
        activity: ActivityType,
    ) -> Vec<Course> {
        let mut courses = Vec::new();

        for (index, &distance_km) in target_distances_km.iter().enumerate() {
            let tier = CourseTier::new(index, distance_km);
            match self.best_for_tier(center, &tier, activity).await {
                Some(best) => {
                    let course = self.build_course(&tier, activity, best).await;
                    tracing::info!(
                        tier = index,
                        target_km = distance_km,
                        actual_km = course.distance_km,
                        "Selected course"
                    );
                    courses.push(course);
                }
                None => {
                    tracing::warn!(
                        tier = index,
                        target_km = distance_km,
                        "No candidate produced a route; tier omitted"
                    );
                }
            }
        }

        courses
    }

    async fn best_for_tier(
        &self,
        center: Location,
        tier: &CourseTier,
        activity: ActivityType,
    ) -> Option<ScoredRoute> {
        let mode = TravelMode::from(activity);
        let candidates = generate_candidates(center, tier);
        let provider = &self.provider;

        let results: Vec<(Candidate, Option<RoutedPath>)> = stream::iter(candidates)
            .map(|candidate| async move {
                let request = RouteRequest::round_trip(center, candidate.turnaround, mode);
                match provider.fetch_route(&request).await {
                    Ok(route) => (candidate, Some(route)),
                    Err(e) => {
                        tracing::debug!(
                            provider = provider.name(),
                            bearing = candidate.bearing_deg,
                            error = %e,
                            "Candidate route failed"
                        );
                        (candidate, None)
                    }
                }
            })
            .buffered(MAX_CONCURRENT_ROUTE_REQUESTS)
            .collect()
            .await;

        let mut best: Option<ScoredRoute> = None;
        for (candidate, route) in results {
            let Some(route) = route else { continue };
            let score = evaluate_route(&route, tier.distance_km, tier.difficulty);
            tracing::debug!(
                tier = tier.index,
                bearing = candidate.bearing_deg,
                distance_km = route.distance_km(),
                score,
                "Scored candidate"
            );
            // Strictly greater: ties keep the earlier candidate.
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ScoredRoute {
                    candidate,
                    route,
                    score,
                });
            }
        }
        best
    }

    async fn build_course(
        &self,
        tier: &CourseTier,
        activity: ActivityType,
        best: ScoredRoute,
    ) -> Course {
        let ScoredRoute {
            candidate, route, ..
        } = best;

        let elevation_gain_m = match self.provider.elevation_profile(&route.path).await {
            Ok(profile) => elevation_gain(&profile),
            Err(e) => {
                tracing::debug!(error = %e, "Elevation unavailable; reporting zero gain");
                0.0
            }
        };

        let distance_km = route.distance_km();
        let direction = candidate.direction();

        let mut features = BTreeSet::from([
            "round-trip".to_string(),
            direction.to_ascii_lowercase(),
        ]);
        if route.is_real_road {
            features.insert("real-road".to_string());
        }
        if route.steps <= BEGINNER_FRIENDLY_MAX_STEPS {
            features.insert("beginner-friendly".to_string());
        }

        Course {
            id: format!("{}-{}km-{}", activity.as_str(), tier.distance_km, tier.index),
            name: format!("{} {:.1} km {} course", direction, distance_km, activity.as_str()),
            activity_type: activity,
            difficulty: tier.difficulty,
            distance_km,
            estimated_time_sec: (distance_km / activity.nominal_speed_kmh() * 3600.0).round() as u64,
            elevation_gain_m,
            coordinates: route.path,
            color: tier.difficulty.color().to_string(),
            features,
            is_real_road: route.is_real_road,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::distance;
    use crate::services::routing::RoutingError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SEOUL: Location = Location::new(37.5665, 126.978);

    fn route(distance_km: f64, duration_s: f64, steps: u32) -> RoutedPath {
        RoutedPath {
            path: vec![SEOUL, SEOUL],
            distance_m: distance_km * 1000.0,
            duration_s,
            steps,
            is_real_road: true,
        }
    }

    /// Returns routes whose length grows with each call.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl RouteProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let one_way = distance(request.origin, request.waypoints[0]);
            Ok(RoutedPath {
                path: request.stops(),
                distance_m: 2.0 * one_way,
                duration_s: 2.0 * one_way / (6.0 / 3.6),
                steps: 4,
                is_real_road: true,
            })
        }
    }

    /// Same route for every request.
    struct ConstantProvider;

    impl RouteProvider for ConstantProvider {
        fn name(&self) -> &'static str {
            "constant"
        }

        async fn fetch_route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
            Ok(RoutedPath {
                path: request.stops(),
                distance_m: 3000.0,
                duration_s: 1800.0,
                steps: 2,
                is_real_road: true,
            })
        }

        async fn elevation_profile(&self, _path: &[Location]) -> Result<Vec<f64>, RoutingError> {
            Ok(vec![10.0, 15.0, 12.0, 20.0])
        }
    }

    #[test]
    fn test_distance_score_exact_match_is_100() {
        assert_eq!(distance_score(5.0, 5.0), 100.0);
        assert_eq!(distance_score(0.0, 0.0), 100.0);
    }

    #[test]
    fn test_distance_score_strictly_decreasing() {
        let mut previous = distance_score(5.0, 5.0);
        for i in 1..=40 {
            let deviation = i as f64 * 0.1;
            let over = distance_score(5.0, 5.0 + deviation);
            let under = distance_score(5.0, 5.0 - deviation);
            assert!(over < previous, "deviation {}", deviation);
            assert!((over - under).abs() < 1e-9, "{} vs {}", over, under);
            previous = over;
        }
        assert_eq!(distance_score(5.0, 12.0), 0.0);
    }

    #[test]
    fn test_duration_score_at_expected_pace() {
        // 3 km at 6 km/h is 30 minutes.
        assert_eq!(duration_score(3.0, 1800.0), 100.0);
        assert_eq!(duration_score(3.0, 2400.0), 80.0);
        assert_eq!(duration_score(3.0, 0.0), 40.0);
    }

    #[test]
    fn test_complexity_score_by_difficulty() {
        assert_eq!(complexity_score(0, Difficulty::Beginner), 100.0);
        assert_eq!(complexity_score(10, Difficulty::Beginner), 50.0);
        assert_eq!(complexity_score(30, Difficulty::Beginner), 0.0);
        assert_eq!(complexity_score(10, Difficulty::Advanced), 50.0);
        assert_eq!(complexity_score(40, Difficulty::Intermediate), 100.0);
    }

    #[test]
    fn test_evaluate_route_weights() {
        let perfect = route(3.0, 1800.0, 0);
        assert_eq!(evaluate_route(&perfect, 3.0, Difficulty::Beginner), 100.0);

        let off = route(4.0, 1800.0, 0);
        // distance 80 * 0.5 + 100 * 0.3 + 100 * 0.2
        assert!((evaluate_route(&off, 3.0, Difficulty::Beginner) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_candidates_cover_eight_directions() {
        let tier = CourseTier::new(0, 5.0);
        let candidates = generate_candidates(SEOUL, &tier);

        assert_eq!(candidates.len(), 8);
        let bearings: Vec<f64> = candidates.iter().map(|c| c.bearing_deg).collect();
        assert_eq!(bearings, vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]);
        for c in &candidates {
            assert!(c.radius_km >= 0.4 * 5.0 - 1e-9 && c.radius_km <= 0.6 * 5.0 + 1e-9);
            let measured = distance(SEOUL, c.turnaround) / 1000.0;
            assert!((measured - c.radius_km).abs() / c.radius_km < 0.01);
        }
        assert_eq!(candidates[0].direction(), "North");
        assert_eq!(candidates[2].direction(), "East");
    }

    #[test]
    fn test_candidates_rotate_per_tier() {
        let tier = CourseTier::new(2, 8.0);
        let candidates = generate_candidates(SEOUL, &tier);
        assert_eq!(candidates[0].bearing_deg, 30.0);
        assert_eq!(candidates[7].bearing_deg, 345.0);
    }

    #[test]
    fn test_elevation_gain_counts_only_climbs() {
        assert_eq!(elevation_gain(&[10.0, 15.0, 12.0, 20.0]), 13.0);
        assert_eq!(elevation_gain(&[]), 0.0);
        assert_eq!(elevation_gain(&[5.0]), 0.0);
    }

    #[tokio::test]
    async fn test_one_course_per_tier_closest_to_target() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let service = CourseService::new(provider);

        let courses = service
            .generate_courses(SEOUL, &[3.0, 5.0, 8.0], ActivityType::Running)
            .await;

        assert_eq!(courses.len(), 3);
        assert_eq!(service.provider().calls.load(Ordering::SeqCst), 24);

        for (course, target) in courses.iter().zip([3.0, 5.0, 8.0]) {
            // Radius factor 0.5 gives an exact out-and-back match.
            assert!((course.distance_km - target).abs() < 0.05, "{}", course.distance_km);
            assert!(course.is_real_road);
            assert!(course.features.contains("real-road"));
            assert!(course.features.contains("round-trip"));
            assert_eq!(course.elevation_gain_m, 0.0);
        }
        assert_eq!(courses[0].difficulty, Difficulty::Beginner);
        assert_eq!(courses[1].difficulty, Difficulty::Intermediate);
        assert_eq!(courses[2].difficulty, Difficulty::Advanced);
        assert_eq!(courses[0].color, "#4CAF50");
    }

    #[tokio::test]
    async fn test_ties_keep_first_candidate() {
        let service = CourseService::new(ConstantProvider);
        let courses = service
            .generate_courses(SEOUL, &[3.0], ActivityType::Running)
            .await;

        assert_eq!(courses.len(), 1);
        let course = &courses[0];
        assert!(course.name.starts_with("North "), "{}", course.name);
        assert!(course.features.contains("north"));
        assert!(course.features.contains("beginner-friendly"));
        assert_eq!(course.elevation_gain_m, 13.0);
        assert_eq!(course.estimated_time_sec, 1800);
    }

    #[tokio::test]
    async fn test_cycling_time_estimate() {
        let service = CourseService::new(ConstantProvider);
        let courses = service
            .generate_courses(SEOUL, &[3.0], ActivityType::Cycling)
            .await;
        // 3 km at 15 km/h
        assert_eq!(courses[0].estimated_time_sec, 720);
        assert_eq!(courses[0].activity_type, ActivityType::Cycling);
    }
}
