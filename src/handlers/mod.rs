pub mod academic_sessions;
pub mod academic_terms;
pub mod academic_classes;
pub mod subjects;
pub mod class_subjects;
pub mod students;
pub mod enrollments;
pub mod report_cards;
pub mod report_card_subjects;
pub mod date_sheets;
pub mod date_sheet_subjects;
pub mod users;
pub mod app_settings;
pub mod public;

use serde::{Deserialize, Serialize};

/// Distinguishes an absent PATCH field (leave untouched) from an explicit
/// null (clear the column). Fields using this need `#[serde(default)]`.
pub mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

fn default_limit() -> u64 {
    50
}

fn default_limit_large() -> u64 {
    500
}

/// Offset/limit query parameters for the standard list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Pagination {
    pub fn page(&self) -> (u64, u64) {
        (self.offset, self.limit.clamp(1, 200))
    }
}

/// Same as [`Pagination`] for catalog-style lists that are fetched whole.
#[derive(Debug, Deserialize)]
pub struct LargePagination {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit_large")]
    pub limit: u64,
}

impl LargePagination {
    pub fn page(&self) -> (u64, u64) {
        (self.offset, self.limit.clamp(1, 2000))
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub total: u64,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}

/// Outcome of the idempotent bulk generators (terms, classes, report cards).
#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub created: Vec<String>,
    pub existing: Vec<String>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, with = "double_option")]
        marks: Option<Option<i32>>,
    }

    #[test]
    fn test_double_option_distinguishes_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.marks, None);
        let null: Patch = serde_json::from_str(r#"{"marks": null}"#).unwrap();
        assert_eq!(null.marks, Some(None));
        let set: Patch = serde_json::from_str(r#"{"marks": 42}"#).unwrap();
        assert_eq!(set.marks, Some(Some(42)));
    }

    #[test]
    fn test_pagination_clamps_limit() {
        let p: Pagination = serde_json::from_str(r#"{"offset": 10, "limit": 5000}"#).unwrap();
        assert_eq!(p.page(), (10, 200));
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page(), (0, 50));
        let p: LargePagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page(), (0, 500));
    }
}
