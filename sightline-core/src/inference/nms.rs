use std::collections::BTreeMap;

use crate::inference::decode::Candidate;

/// Greedy per-class non-max suppression.
///
/// Within each class the highest scoring remaining candidate is kept and
/// every other candidate overlapping it with `IoU >= iou_threshold` is
/// dropped. Classes never suppress each other. The result is grouped by
/// class id and sorted by score inside a group, not across groups.
pub fn suppress(candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    let mut by_class: BTreeMap<u32, Vec<Candidate>> = BTreeMap::new();
    for candidate in candidates {
        by_class.entry(candidate.class_id).or_default().push(candidate);
    }

    let mut kept = Vec::new();
    for (_, mut group) in by_class {
        // Sort by confidence score in descending order; stable on ties
        group.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut keep_flags = vec![true; group.len()];
        for current in 0..group.len() {
            if !keep_flags[current] {
                continue;
            }

            let best = group[current];
            kept.push(best);

            for (other, flag) in keep_flags.iter_mut().enumerate().skip(current + 1) {
                if *flag && best.bbox.iou(&group[other].bbox) >= iou_threshold {
                    *flag = false;
                }
            }
        }
    }

    kept
}
