//! Baker configuration.

use crate::error::GraphicsError;
use crate::types::TextureUsage;

/// Tunables for a [`SkinnedMeshBaker`](crate::SkinnedMeshBaker).
///
/// # Example
///
/// ```ignore
/// let config = BakerConfig::default()
///     .with_fallback_frame_rate(30.0)
///     .with_label_prefix("HeroCloth");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BakerConfig {
    /// Frame rate handed to the kernel when the elapsed time is unusable.
    pub fallback_frame_rate: f32,
    /// Smallest elapsed time (seconds) that is turned into a frame rate.
    pub min_delta_time: f32,
    /// Usage of the scratch images.
    ///
    /// Formats are not configurable: each scratch image takes the format of
    /// the output it is copied into.
    pub scratch_usage: TextureUsage,
    /// Prefix of scratch resource debug labels.
    pub label_prefix: String,
}

impl Default for BakerConfig {
    fn default() -> Self {
        Self {
            fallback_frame_rate: 60.0,
            min_delta_time: 1e-5,
            scratch_usage: TextureUsage::STORAGE_BINDING | TextureUsage::COPY_SRC,
            label_prefix: "SkinnedMeshBaker".to_string(),
        }
    }
}

impl BakerConfig {
    /// Set the fallback frame rate.
    pub fn with_fallback_frame_rate(mut self, frame_rate: f32) -> Self {
        self.fallback_frame_rate = frame_rate;
        self
    }

    /// Set the minimum elapsed time.
    pub fn with_min_delta_time(mut self, seconds: f32) -> Self {
        self.min_delta_time = seconds;
        self
    }

    /// Set the debug label prefix.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Debug label for the scratch resource `name`.
    pub(crate) fn label(&self, name: &str) -> String {
        format!("{}.{}", self.label_prefix, name)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] for a non-positive frame
    /// rate or delta, or scratch usage the kernel cannot write and copy from.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        if !(self.fallback_frame_rate.is_finite() && self.fallback_frame_rate > 0.0) {
            return Err(GraphicsError::InvalidParameter(format!(
                "fallback frame rate must be positive, got {}",
                self.fallback_frame_rate
            )));
        }
        if !(self.min_delta_time.is_finite() && self.min_delta_time > 0.0) {
            return Err(GraphicsError::InvalidParameter(format!(
                "minimum delta time must be positive, got {}",
                self.min_delta_time
            )));
        }
        if !self.scratch_usage.contains(TextureUsage::STORAGE_BINDING | TextureUsage::COPY_SRC) {
            return Err(GraphicsError::InvalidParameter(
                "scratch usage must include STORAGE_BINDING and COPY_SRC".to_string(),
            ));
        }
        Ok(())
    }
}
