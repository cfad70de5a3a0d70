use std::cmp::Ordering;

use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::model::InferenceError;
use crate::remedies::RemedyTable;

/// Class labels in model output order. The index produced by the classifier
/// is only meaningful against this exact sequence.
pub const CLASS_NAMES: [&str; 38] = [
    "Apple Scab",
    "Apple Black Rot",
    "Apple Cedar Rust",
    "Apple Healthy",
    "Blueberry Healthy",
    "Cherry Powdery Mildew",
    "Cherry Healthy",
    "Corn Cercospora Leaf Spot & Gray Leaf Spot",
    "Corn Common Rust",
    "Corn Northern Leaf Blight",
    "Corn Healthy",
    "Grape Black Rot",
    "Grape Esca (Black Measles)",
    "Grape Leaf Blight (Isariopsis Leaf Spot)",
    "Grape Healthy",
    "Orange Haunglongbing (Citrus Greening)",
    "Peach Bacterial Spot",
    "Peach Healthy",
    "Pepper Bell Bacterial Spot",
    "Pepper Bell Healthy",
    "Potato Early Blight",
    "Potato Late Blight",
    "Potato Healthy",
    "Raspberry Healthy",
    "Soybean Healthy",
    "Squash Powdery Mildew",
    "Strawberry Leaf Scorch",
    "Strawberry Healthy",
    "Tomato Bacterial Spot",
    "Tomato Early Blight",
    "Tomato Late Blight",
    "Tomato Leaf Mold",
    "Tomato Septoria Leaf Spot",
    "Tomato Spider Mites (Two-Spotted Spider Mite)",
    "Tomato Target Spot",
    "Tomato Yellow Leaf Curl Virus",
    "Tomato Mosaic Virus",
    "Tomato Healthy",
];

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predicted_class: usize,
    pub disease_name: String,
    pub confidence: String,
    pub prediction_vector: Vec<f32>,
    pub cure: String,
    pub precaution: String,
}

/// Applies the decision rule to a raw probability vector: arg-max selects
/// the class, the max probability itself is reported as confidence, and the
/// winning label is enriched from the remedy table.
pub fn resolve(
    prediction_vector: Vec<f32>,
    remedies: &RemedyTable,
) -> Result<PredictionResponse, ApiError> {
    let (class_index, &confidence) = prediction_vector
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .ok_or(InferenceError::EmptyOutput)?;

    if class_index >= CLASS_NAMES.len() {
        return Err(ApiError::ClassOutOfRange {
            index: class_index,
            classes: CLASS_NAMES.len(),
        });
    }

    let disease_name = CLASS_NAMES[class_index].to_string();
    let remedy = remedies.lookup(&disease_name);

    info!(
        "Predicted: {} (index: {}, confidence: {:.4})",
        disease_name, class_index, confidence
    );

    Ok(PredictionResponse {
        predicted_class: class_index,
        disease_name,
        confidence: format!("{:.4}", confidence),
        prediction_vector,
        cure: remedy.cure,
        precaution: remedy.precaution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remedies::NOT_AVAILABLE;

    fn vector_with_peak(len: usize, peak: usize, value: f32) -> Vec<f32> {
        let rest = (1.0 - value) / (len - 1) as f32;
        let mut v = vec![rest; len];
        v[peak] = value;
        v
    }

    #[test]
    fn test_argmax_selects_most_probable_class() {
        let result = resolve(vector_with_peak(38, 2, 0.61), &RemedyTable::default()).unwrap();
        assert_eq!(result.predicted_class, 2);
        assert_eq!(result.disease_name, "Apple Cedar Rust");
    }

    #[test]
    fn test_confidence_is_max_probability_with_four_decimals() {
        let result = resolve(vector_with_peak(38, 5, 0.87654), &RemedyTable::default()).unwrap();
        assert_eq!(result.confidence, "0.8765");

        let parsed: f32 = result.confidence.parse().unwrap();
        assert!((0.0..=1.0).contains(&parsed));
    }

    #[test]
    fn test_prediction_vector_is_returned_verbatim() {
        let vector = vector_with_peak(38, 20, 0.9);
        let result = resolve(vector.clone(), &RemedyTable::default()).unwrap();
        assert_eq!(result.prediction_vector, vector);

        let sum: f32 = result.prediction_vector.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_label_falls_back_to_not_available() {
        let result = resolve(vector_with_peak(38, 0, 0.75), &RemedyTable::default()).unwrap();
        assert_eq!(result.disease_name, "Apple Scab");
        assert_eq!(result.cure, NOT_AVAILABLE);
        assert_eq!(result.precaution, NOT_AVAILABLE);
    }

    #[test]
    fn test_known_label_is_enriched_from_table() {
        let table = RemedyTable::parse(
            r#"{"Apple Scab": {"cure": "Apply fungicide", "precaution": "Prune infected leaves"}}"#,
        )
        .unwrap();

        let result = resolve(vector_with_peak(38, 0, 0.75), &table).unwrap();
        assert_eq!(result.cure, "Apply fungicide");
        assert_eq!(result.precaution, "Prune infected leaves");
    }

    #[test]
    fn test_index_beyond_label_list_is_an_error() {
        let err = resolve(vector_with_peak(40, 39, 0.99), &RemedyTable::default()).unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClassOutOfRange { index: 39, classes: 38 }
        ));
    }

    #[test]
    fn test_empty_vector_is_a_processing_error() {
        let err = resolve(Vec::new(), &RemedyTable::default()).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Processing(InferenceError::EmptyOutput)
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let vector = vector_with_peak(38, 11, 0.55);
        let first = resolve(vector.clone(), &RemedyTable::default()).unwrap();
        let second = resolve(vector, &RemedyTable::default()).unwrap();
        assert_eq!(first.predicted_class, second.predicted_class);
        assert_eq!(first.confidence, second.confidence);
    }
}
