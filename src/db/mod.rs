// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by Firebase uid)
    pub const USERS: &str = "users";
    /// Finished workouts (keyed by `{uid}_{timestamp_ms}`)
    pub const WORKOUTS: &str = "workouts";
}
