// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser geolocation outcome handling.
//!
//! The browser either reports a position or a `GeolocationPositionError`
//! code. Failures are never fatal: the map centers on a default location and
//! the user sees a localized explanation.

use crate::models::Location;
use serde::{Deserialize, Serialize};

/// Seoul City Hall.
pub const DEFAULT_LOCATION: Location = Location::new(37.5665, 126.978);

/// `GeolocationPositionError` codes.
pub const PERMISSION_DENIED: u16 = 1;
pub const POSITION_UNAVAILABLE: u16 = 2;
pub const TIMEOUT: u16 = 3;

/// What the browser reported.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationReport {
    pub location: Option<Location>,
    pub error_code: Option<u16>,
}

/// Location to center on, plus a message when falling back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub location: Location,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// User-facing message for a geolocation error code.
pub fn error_message(code: u16) -> &'static str {
    match code {
        PERMISSION_DENIED => "위치 권한이 거부되었습니다. 기본 위치(서울시청)를 사용합니다.",
        POSITION_UNAVAILABLE => "위치 정보를 사용할 수 없습니다. 기본 위치(서울시청)를 사용합니다.",
        TIMEOUT => "위치 요청 시간이 초과되었습니다. 기본 위치(서울시청)를 사용합니다.",
        _ => "위치를 가져오는 중 오류가 발생했습니다. 기본 위치(서울시청)를 사용합니다.",
    }
}

/// Pick the map center from a browser geolocation result.
///
/// A reported error wins over a reported location.
pub fn resolve_location(location: Option<Location>, error_code: Option<u16>) -> ResolvedLocation {
    match (location, error_code) {
        (_, Some(code)) => {
            tracing::info!(code, "Geolocation failed; using default location");
            ResolvedLocation {
                location: DEFAULT_LOCATION,
                is_default: true,
                message: Some(error_message(code).to_string()),
            }
        }
        (Some(location), None) if location.is_valid() => ResolvedLocation {
            location,
            is_default: false,
            message: None,
        },
        _ => ResolvedLocation {
            location: DEFAULT_LOCATION,
            is_default: true,
            message: Some(error_message(0).to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_location_is_used() {
        let here = Location::new(35.1796, 129.0756);
        let resolved = resolve_location(Some(here), None);
        assert_eq!(resolved.location, here);
        assert!(!resolved.is_default);
        assert!(resolved.message.is_none());
    }

    #[test]
    fn test_each_error_code_falls_back() {
        for code in [PERMISSION_DENIED, POSITION_UNAVAILABLE, TIMEOUT] {
            let resolved = resolve_location(None, Some(code));
            assert_eq!(resolved.location, DEFAULT_LOCATION);
            assert!(resolved.is_default);
            assert_eq!(resolved.message.as_deref(), Some(error_message(code)));
        }
    }

    #[test]
    fn test_messages_are_distinct() {
        assert!(error_message(PERMISSION_DENIED).contains("권한"));
        assert!(error_message(TIMEOUT).contains("시간"));
        assert_ne!(error_message(POSITION_UNAVAILABLE), error_message(99));
    }

    #[test]
    fn test_error_takes_precedence() {
        let resolved = resolve_location(Some(Location::new(1.0, 1.0)), Some(TIMEOUT));
        assert_eq!(resolved.location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_nothing_reported() {
        let resolved = resolve_location(None, None);
        assert!(resolved.is_default);
        assert_eq!(resolved.message.as_deref(), Some(error_message(0)));
    }
}
