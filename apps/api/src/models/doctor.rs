use serde::{Deserialize, Serialize};

/// A practice or clinic returned by a doctor-search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorResult {
    pub name: String,
    pub specialty: Option<String>,
    pub rating: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub maps_url: Option<String>,
}
