// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod course;
pub mod firebase_auth;
pub mod geolocation;
pub mod map_sdk;
pub mod rate_limit;
pub mod routing;
pub mod tracking;

pub use course::CourseService;
pub use firebase_auth::{AuthError, FirebaseAuthVerifier, FirebaseUser};
pub use geolocation::{resolve_location, ResolvedLocation, DEFAULT_LOCATION};
pub use map_sdk::MapSdkConfig;
pub use rate_limit::RateLimiter;
pub use routing::{
    GoogleDirectionsClient, GoogleRoadsClient, KakaoLocalClient, OsmClient, RouteProvider,
    RoutingBackend,
};
pub use tracking::{SessionError, TrackingService};
