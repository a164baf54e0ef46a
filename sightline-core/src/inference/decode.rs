use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    analysis::bbox::Bbox,
    consts::{OBJECTNESS_OFFSET, RECORD_HEADER_SIZE},
    error::{DetectError, ShapeMismatchSnafu},
};

/// How raw objectness / class values become probabilities.
///
/// This is part of the model contract: graphs exported with raw logits need
/// `Sigmoid`, graphs that already end in a sigmoid need `Identity`. Applying
/// it twice (or never) silently skews every score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreActivation {
    #[default]
    Sigmoid,
    Identity,
}

impl ScoreActivation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ScoreActivation::Sigmoid => sigmoid(x),
            ScoreActivation::Identity => x,
        }
    }
}

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A model-space detection that passed the confidence filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: u32,
    pub score: f32,
    pub bbox: Bbox,
}

#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    pub num_classes: usize,
    pub confidence_threshold: f32,
    pub activation: ScoreActivation,
}

impl Decoder {
    pub fn stride(&self) -> usize {
        RECORD_HEADER_SIZE + self.num_classes
    }

    /// Interprets `output` as `[cx, cy, w, h, obj, class...]` records and
    /// keeps those whose fused score reaches the threshold, in record order.
    pub fn decode(&self, output: &[f32]) -> Result<Vec<Candidate>, DetectError> {
        let stride = self.stride();
        ensure!(
            self.num_classes > 0 && output.len() % stride == 0,
            ShapeMismatchSnafu {
                stage: "raw-output",
                expected: format!("a multiple of {stride} values"),
                actual: output.len().to_string(),
            }
        );

        let candidates = output
            .par_chunks_exact(stride)
            .filter_map(|record| self.decode_record(record))
            .collect();

        Ok(candidates)
    }

    fn decode_record(&self, record: &[f32]) -> Option<Candidate> {
        let objectness = self.activation.apply(record[OBJECTNESS_OFFSET]);

        // first maximum wins on ties
        let (class_id, class_score) = record[RECORD_HEADER_SIZE..]
            .iter()
            .map(|&raw| self.activation.apply(raw))
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (idx, score)| {
                if score > best.1 { (idx, score) } else { best }
            });

        let score = objectness * class_score;
        if !score.is_finite() || score < self.confidence_threshold {
            return None;
        }

        let bbox = Bbox::from_center_size(
            Vec2::new(record[0], record[1]),
            Vec2::new(record[2], record[3]),
        );

        Some(Candidate {
            class_id: class_id as u32,
            score,
            bbox,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the sigmoid, to script raw logits for a wanted probability.
    fn logit(p: f32) -> f32 {
        (p / (1.0 - p)).ln()
    }

    fn record(bbox: [f32; 4], objectness: f32, class_scores: &[f32]) -> Vec<f32> {
        let mut record = bbox.to_vec();
        record.push(objectness);
        record.extend_from_slice(class_scores);
        record
    }

    fn decoder(num_classes: usize, threshold: f32, activation: ScoreActivation) -> Decoder {
        Decoder {
            num_classes,
            confidence_threshold: threshold,
            activation,
        }
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(logit(0.9)) - 0.9).abs() < 1e-5);
        assert!(sigmoid(-100.0) >= 0.0 && sigmoid(100.0) <= 1.0);
    }

    #[test]
    fn test_decode_single_box_with_sigmoid() {
        let raw = record(
            [320.0, 240.0, 100.0, 50.0],
            logit(1.0 - 1e-6),
            &[logit(0.1), logit(0.2), logit(0.9), logit(0.3)],
        );
        let candidates = decoder(4, 0.5, ScoreActivation::Sigmoid)
            .decode(&raw)
            .unwrap();

        assert_eq!(candidates.len(), 1);
        let candidate = candidates[0];
        assert_eq!(candidate.class_id, 2);
        assert!((candidate.score - 0.9).abs() < 1e-4);
        assert_eq!(candidate.bbox.to_array(), [270.0, 215.0, 370.0, 265.0]);
    }

    #[test]
    fn test_identity_activation_uses_raw_scores() {
        let raw = record([10.0, 10.0, 4.0, 4.0], 0.8, &[0.25, 0.75]);
        let candidates = decoder(2, 0.5, ScoreActivation::Identity)
            .decode(&raw)
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_id, 1);
        assert!((candidates[0].score - 0.6).abs() < 1e-6);

        // the same numbers read as logits give a different confidence
        let candidates = decoder(2, 0.0, ScoreActivation::Sigmoid)
            .decode(&raw)
            .unwrap();
        let expected = sigmoid(0.8) * sigmoid(0.75);
        assert!((candidates[0].score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_tie_takes_first() {
        let raw = record([0.0, 0.0, 2.0, 2.0], 1.0, &[0.7, 0.7, 0.1]);
        let candidates = decoder(3, 0.5, ScoreActivation::Identity)
            .decode(&raw)
            .unwrap();
        assert_eq!(candidates[0].class_id, 0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let raw = record([0.0, 0.0, 2.0, 2.0], 1.0, &[0.5]);
        let candidates = decoder(1, 0.5, ScoreActivation::Identity)
            .decode(&raw)
            .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_nan_scores_are_dropped() {
        let raw = record([0.0, 0.0, 2.0, 2.0], f32::NAN, &[0.9]);
        let candidates = decoder(1, 0.0, ScoreActivation::Identity)
            .decode(&raw)
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_non_finite_scores_are_dropped() {
        let all_nan = record([10.0, 10.0, 4.0, 4.0], -0.5, &[f32::NAN, f32::NAN]);
        let infinite = record([10.0, 10.0, 4.0, 4.0], 1.0, &[f32::INFINITY, 0.2]);
        let negative = record([10.0, 10.0, 4.0, 4.0], -1.0, &[f32::NEG_INFINITY; 2]);
        for raw in [all_nan, infinite, negative] {
            let candidates = decoder(2, 0.5, ScoreActivation::Identity)
                .decode(&raw)
                .unwrap();
            assert!(candidates.is_empty(), "{raw:?} -> {candidates:?}");
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let err = decoder(80, 0.5, ScoreActivation::Sigmoid)
            .decode(&vec![0.0; 85 * 3 + 1])
            .unwrap_err();
        assert!(matches!(err, DetectError::ShapeMismatch { .. }));

        assert!(decoder(0, 0.5, ScoreActivation::Sigmoid).decode(&[]).is_err());
    }

    #[test]
    fn test_empty_output() {
        let candidates = decoder(80, 0.5, ScoreActivation::Sigmoid)
            .decode(&[])
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_confidence_filter_is_monotonic() {
        // deterministic pseudo-random records
        let mut state = 0x2545_f491_u32;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 2000) as f32 / 100.0 - 10.0
        };
        let raw: Vec<f32> = (0..(200 * 8)).map(|_| next()).collect();

        let mut previous = usize::MAX;
        for threshold in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99, 1.0] {
            let count = decoder(3, threshold, ScoreActivation::Sigmoid)
                .decode(&raw)
                .unwrap()
                .len();
            assert!(count <= previous, "threshold {threshold}: {count} > {previous}");
            previous = count;
        }
    }

    #[test]
    fn test_record_order_is_preserved() {
        let mut raw = Vec::new();
        for i in 0..64 {
            raw.extend(record([i as f32, 0.0, 2.0, 2.0], 1.0, &[1.0]));
        }
        let candidates = decoder(1, 0.5, ScoreActivation::Identity)
            .decode(&raw)
            .unwrap();
        let centers: Vec<f32> = candidates.iter().map(|c| c.bbox.center().x).collect();
        assert_eq!(centers, (0..64).map(|i| i as f32).collect::<Vec<_>>());
    }
}
