use async_trait::async_trait;

use crate::doctor_search::DoctorSearch;
use crate::models::doctor::DoctorResult;

/// Deterministic placeholder results for development without an API key.
pub struct MockDoctorSearch;

#[async_trait]
impl DoctorSearch for MockDoctorSearch {
    async fn search(&self, specialty: &str, location: &str, limit: usize) -> Vec<DoctorResult> {
        (0..limit)
            .map(|i| DoctorResult {
                name: format!("{} Clinic {}", title_case(specialty), i + 1),
                specialty: Some(specialty.to_string()),
                rating: Some(if i % 2 == 0 { 4.2 } else { 4.5 }),
                address: Some(format!("123 Example St, {location}")),
                phone: Some("(000) 000-0000".to_string()),
                maps_url: Some("https://maps.google.com".to_string()),
            })
            .collect()
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
