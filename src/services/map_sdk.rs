// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser map SDK script URLs built from the configured public keys.

use crate::config::Config;
use serde::Serialize;

const GOOGLE_MAPS_JS_URL: &str = "https://maps.googleapis.com/maps/api/js";
const KAKAO_MAPS_JS_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";
const NAVER_MAPS_JS_URL: &str = "https://oapi.map.naver.com/openapi/v3/maps.js";

/// Script URLs the SPA should inject; `None` when the key is not configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSdkConfig {
    pub google_maps: Option<String>,
    pub kakao_maps: Option<String>,
    pub naver_maps: Option<String>,
}

impl MapSdkConfig {
    pub fn from_config(config: &Config) -> Self {
        let google_maps = config.google_maps_api_key.as_deref().map(|key| {
            format!(
                "{}?key={}&libraries=geometry",
                GOOGLE_MAPS_JS_URL,
                urlencoding::encode(key)
            )
        });
        let kakao_maps = config.kakao_javascript_key.as_deref().map(|key| {
            format!(
                "{}?appkey={}&autoload=false&libraries=services",
                KAKAO_MAPS_JS_URL,
                urlencoding::encode(key)
            )
        });
        let naver_maps = config
            .naver_client_id
            .as_deref()
            .map(|id| format!("{}?ncpClientId={}", NAVER_MAPS_JS_URL, urlencoding::encode(id)));

        for (sdk, url) in [
            ("google", &google_maps),
            ("kakao", &kakao_maps),
            ("naver", &naver_maps),
        ] {
            if url.is_none() {
                tracing::warn!(sdk, "Map SDK key not configured");
            }
        }

        Self {
            google_maps,
            kakao_maps,
            naver_maps,
        }
    }

    /// True when at least one map can be rendered.
    pub fn any_available(&self) -> bool {
        self.google_maps.is_some() || self.kakao_maps.is_some() || self.naver_maps.is_some()
    }
}
