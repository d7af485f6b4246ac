//! Picking the single target for a cycle

use chaser_core::{Detection, DetectorConfig, FrameSize, SelectionPolicy};

/// The detection chosen as this cycle's target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    pub detection: Detection,
    /// Position in the detector's output
    pub index: usize,
}

/// Which detections qualify and how one is chosen
#[derive(Debug, Clone)]
pub struct TargetPolicy {
    pub labels: Vec<String>,
    pub min_confidence: f32,
    pub selection: SelectionPolicy,
}

impl TargetPolicy {
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            labels: config.target_labels.clone(),
            min_confidence: config.min_confidence,
            selection: config.selection,
        }
    }

    /// Target label with confidence strictly above the threshold, and a box
    /// that lies inside the frame
    pub fn qualifies(&self, detection: &Detection, frame: FrameSize) -> bool {
        self.labels.iter().any(|l| l == &detection.label)
            && detection.confidence > self.min_confidence
            && detection.bbox.fits_within(frame)
    }
}

/// Select at most one target from a frame's detections
pub fn select_target(
    detections: &[Detection],
    frame: FrameSize,
    policy: &TargetPolicy,
) -> Option<TargetCandidate> {
    let mut qualifying = detections
        .iter()
        .enumerate()
        .filter(|(_, d)| policy.qualifies(d, frame));

    let (index, detection) = match policy.selection {
        SelectionPolicy::First => qualifying.next(),
        SelectionPolicy::Last => qualifying.last(),
        // max_by keeps the last of equal maxima; fold keeps the first
        SelectionPolicy::HighestConfidence => {
            qualifying.fold(None::<(usize, &Detection)>, |best, candidate| match best {
                Some((_, b)) if b.confidence >= candidate.1.confidence => best,
                _ => Some(candidate),
            })
        }
    }?;

    Some(TargetCandidate {
        detection: detection.clone(),
        index,
    })
}
