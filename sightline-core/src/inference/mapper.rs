use serde::Serialize;

use crate::{
    analysis::{bbox::Bbox, labels::ClassCatalog, letterbox::LetterboxTransform},
    error::DetectError,
    inference::decode::Candidate,
};

/// Final image-space detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub score: f32,
    pub bbox: Bbox,
    #[serde(skip)]
    pub class_id: u32,
}

/// Maps surviving model-space candidates back to original-image pixels,
/// names them, and returns at most `limit` of them by descending score.
///
/// Any out-of-range class id fails the whole call; there are no partial
/// results.
pub fn map_detections(
    mut candidates: Vec<Candidate>,
    transform: &LetterboxTransform,
    catalog: &ClassCatalog,
    limit: usize,
) -> Result<Vec<Detection>, DetectError> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    // every survivor is checked against the catalog, not only the returned ones
    let mut detections = candidates
        .iter()
        .map(|candidate| {
            Ok(Detection {
                class_name: catalog.name(candidate.class_id)?.to_string(),
                score: candidate.score,
                bbox: transform.bbox_to_image(&candidate.bbox),
                class_id: candidate.class_id,
            })
        })
        .collect::<Result<Vec<_>, DetectError>>()?;

    detections.truncate(limit);
    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(class_id: u32, score: f32, corners: [f32; 4]) -> Candidate {
        Candidate {
            class_id,
            score,
            bbox: Bbox::from_corners(corners),
        }
    }

    #[test]
    fn test_maps_to_image_space_in_score_order() {
        // 1280x720 -> ratio 0.5, pad_y 140
        let transform = LetterboxTransform::new(1280, 720, 640).unwrap();
        let catalog = ClassCatalog::coco();
        let detections = map_detections(
            vec![
                candidate(0, 0.6, [0.0, 140.0, 10.0, 150.0]),
                candidate(2, 0.9, [100.0, 190.0, 200.0, 290.0]),
            ],
            &transform,
            &catalog,
            usize::MAX,
        )
        .unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_name, "car");
        assert_eq!(detections[0].bbox.to_array(), [200.0, 100.0, 400.0, 300.0]);
        assert_eq!(detections[1].class_name, "person");
        assert_eq!(detections[1].bbox.to_array(), [0.0, 0.0, 20.0, 20.0]);
    }

    #[test]
    fn test_limit() {
        let transform = LetterboxTransform::new(640, 640, 640).unwrap();
        let catalog = ClassCatalog::coco();
        let candidates = (0..10)
            .map(|i| candidate(i, i as f32 / 10.0, [0.0, 0.0, 1.0, 1.0]))
            .collect();

        let detections = map_detections(candidates, &transform, &catalog, 1).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 9);
    }

    #[test]
    fn test_unknown_class_fails_whole_call() {
        let transform = LetterboxTransform::new(640, 640, 640).unwrap();
        let catalog = ClassCatalog::new(["only"]);
        let err = map_detections(
            vec![
                candidate(0, 0.9, [0.0, 0.0, 1.0, 1.0]),
                candidate(5, 0.8, [0.0, 0.0, 1.0, 1.0]),
            ],
            &transform,
            &catalog,
            usize::MAX,
        )
        .unwrap_err();
        assert!(matches!(err, DetectError::UnknownClass { class_id: 5, .. }));
    }

    #[test]
    fn test_detection_json() {
        let detection = Detection {
            class_name: "dog".to_string(),
            score: 0.5,
            bbox: Bbox::from_corners([1.0, 2.0, 3.0, 4.0]),
            class_id: 16,
        };
        let json = serde_json::to_value(&detection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"class": "dog", "score": 0.5, "bbox": [1.0, 2.0, 3.0, 4.0]})
        );
    }
}
