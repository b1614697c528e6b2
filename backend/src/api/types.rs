//! REST API payloads.
//!
//! Field names are part of the public contract with the dashboard frontend
//! and stay snake_case.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::classifier::LabelScore;
use crate::models::{humanize_label, Dataset};

/// `GET /api/genre_counts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreCountsResponse {
    pub genre_names: Vec<String>,
    pub genre_counts: Vec<usize>,
}

impl From<&Dataset> for GenreCountsResponse {
    fn from(dataset: &Dataset) -> Self {
        let (genre_names, genre_counts) = dataset.genre_counts().into_iter().unzip();
        Self {
            genre_names,
            genre_counts,
        }
    }
}

/// `GET /api/labels_count`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelsCountResponse {
    /// Humanized names, most frequent first
    pub labels_name: Vec<String>,
    pub labels_count: Vec<u64>,
}

impl From<&Dataset> for LabelsCountResponse {
    fn from(dataset: &Dataset) -> Self {
        let (labels_name, labels_count) = dataset
            .label_counts()
            .into_iter()
            .map(|(name, count)| (humanize_label(&name), count))
            .unzip();
        Self {
            labels_name,
            labels_count,
        }
    }
}

/// `GET /api/predict/{text}`: `[label, score]` pairs, highest score first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub results: Vec<(String, f64)>,
}

impl From<Vec<LabelScore>> for PredictResponse {
    fn from(scores: Vec<LabelScore>) -> Self {
        Self {
            results: scores.into_iter().map(|s| (s.label, s.score)).collect(),
        }
    }
}

/// Query string of `GET /go`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoParams {
    #[serde(default)]
    pub query: String,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRecord;

    fn dataset() -> Dataset {
        let record = |id, genre: &str, labels| MessageRecord {
            id,
            message: "help".into(),
            original: None,
            genre: genre.into(),
            labels,
        };
        Dataset::new(
            vec!["related".into(), "medical_help".into()],
            vec![
                record(1, "social", vec![1, 0]),
                record(2, "direct", vec![1, 1]),
                record(3, "social", vec![0, 0]),
            ],
        )
    }

    #[test]
    fn test_genre_counts_payload() {
        let json = serde_json::to_value(GenreCountsResponse::from(&dataset())).unwrap();
        assert_eq!(json["genre_names"], json!(["direct", "social"]));
        assert_eq!(json["genre_counts"], json!([1, 2]));
    }

    #[test]
    fn test_labels_count_payload() {
        let json = serde_json::to_value(LabelsCountResponse::from(&dataset())).unwrap();
        assert_eq!(json["labels_name"], json!(["Related", "Medical Help"]));
        assert_eq!(json["labels_count"], json!([2, 1]));
    }

    #[test]
    fn test_predict_payload_is_pairs() {
        let response = PredictResponse::from(vec![
            LabelScore {
                label: "water".into(),
                score: 0.75,
            },
            LabelScore {
                label: "food".into(),
                score: 0.25,
            },
        ]);
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["results"], json!([["water", 0.75], ["food", 0.25]]));
    }
}
