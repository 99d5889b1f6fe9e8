//! Elapsed time to frame rate.

use crate::config::BakerConfig;

/// Frame rate the kernel uses to turn position deltas into velocities.
///
/// `1 / delta_time` for a finite delta of at least
/// [`BakerConfig::min_delta_time`], otherwise
/// [`BakerConfig::fallback_frame_rate`].
pub fn frame_rate(delta_time: f32, config: &BakerConfig) -> f32 {
    if delta_time.is_finite() && delta_time >= config.min_delta_time {
        1.0 / delta_time
    } else {
        log::debug!(
            "frame_rate: unusable delta {delta_time}, using {} Hz",
            config.fallback_frame_rate
        );
        config.fallback_frame_rate
    }
}
