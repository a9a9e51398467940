//! Doctor search: pluggable, trait-based lookup of nearby specialists.
//!
//! Default: `MockDoctorSearch` when no Places API key is configured.
//! `GooglePlacesSearch` otherwise. Failures never propagate: they are
//! logged and treated as an empty result list.

use async_trait::async_trait;

use crate::models::doctor::DoctorResult;

pub mod google_places;
pub mod handlers;
pub mod mock;

pub use google_places::GooglePlacesSearch;
pub use mock::MockDoctorSearch;

/// Carried in `AppState` as `Arc<dyn DoctorSearch>`.
#[async_trait]
pub trait DoctorSearch: Send + Sync {
    async fn search(&self, specialty: &str, location: &str, limit: usize) -> Vec<DoctorResult>;

    /// Short backend name, reported alongside results.
    fn backend(&self) -> &'static str;
}
