//! Virtual user targets for ramp stages

use crate::config::Stage;
use std::time::Duration;

/// Number of virtual users that should be active `elapsed` into the run
///
/// The count starts at zero and moves linearly towards each stage's target
/// over the stage's duration. A zero-duration stage jumps straight to its
/// target. After the last stage its target holds.
pub fn target_at(stages: &[Stage], elapsed: Duration) -> usize {
    let mut current = 0.0_f64;
    let mut stage_start = Duration::ZERO;

    for stage in stages {
        let target = stage.target as f64;
        if stage.duration.is_zero() {
            current = target;
            continue;
        }

        let stage_end = stage_start + stage.duration;
        if elapsed < stage_end {
            // Interpolation factor [0.0..1.0)
            let t = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
            return (current + (target - current) * t).round() as usize;
        }

        current = target;
        stage_start = stage_end;
    }

    current.round() as usize
}

/// Sum of all stage durations
pub fn stages_duration(stages: &[Stage]) -> Duration {
    stages.iter().map(|s| s.duration).sum()
}
