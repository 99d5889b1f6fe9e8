//! Output map validation.

use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::DiagnosticsSink;
use crate::kernel::params::THREAD_GROUP_SIZE;
use crate::resources::Texture;
use crate::types::{Extent3d, TextureFormat};

use super::scratch::ImageLayout;

/// Caller-owned textures the baker writes into.
#[derive(Debug, Clone)]
pub struct OutputTextures {
    pub position_map: Arc<Texture>,
    pub velocity_map: Arc<Texture>,
    pub normal_map: Arc<Texture>,
}

impl OutputTextures {
    pub fn new(
        position_map: Arc<Texture>,
        velocity_map: Arc<Texture>,
        normal_map: Arc<Texture>,
    ) -> Self {
        Self {
            position_map,
            velocity_map,
            normal_map,
        }
    }

    /// Size of the position map, which every other image must match.
    pub fn size(&self) -> Extent3d {
        self.position_map.size()
    }

    /// Size of the position map and the format of every map, in
    /// position, velocity, normal order.
    pub fn layout(&self) -> ImageLayout {
        ImageLayout {
            size: self.size(),
            formats: [
                self.position_map.format(),
                self.velocity_map.format(),
                self.normal_map.format(),
            ],
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Texture>> {
        [&self.position_map, &self.velocity_map, &self.normal_map].into_iter()
    }
}

/// A misconfigured output map.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyViolation {
    #[error("Position map dimensions should be a multiple of 8 (got {0}).")]
    PositionMapNotGroupAligned(Extent3d),
    #[error("Position/normal map dimensions should match (position {position}, normal {normal}).")]
    NormalMapSizeMismatch {
        position: Extent3d,
        normal: Extent3d,
    },
    #[error("Position map format should be Rgba16Float or Rgba32Float (got {0:?}).")]
    PositionMapFormat(TextureFormat),
    #[error("Normal map format should be Rgba16Float or Rgba32Float (got {0:?}).")]
    NormalMapFormat(TextureFormat),
    #[error(
        "Position/velocity map dimensions should match (position {position}, velocity {velocity})."
    )]
    VelocityMapSizeMismatch {
        position: Extent3d,
        velocity: Extent3d,
    },
    #[error("Velocity map format should be Rgba16Float or Rgba32Float (got {0:?}).")]
    VelocityMapFormat(TextureFormat),
}

/// Every rule `outputs` breaks, in reporting order.
///
/// The position map must be group aligned, and the position and normal maps
/// must be float RGBA with the normal map sized like the position map. The
/// velocity map is held to the same size and format rules as the normal map;
/// its violations are reported last.
pub fn find_violations(outputs: &OutputTextures) -> Vec<ConsistencyViolation> {
    let position = outputs.position_map.size();
    let velocity = outputs.velocity_map.size();
    let normal = outputs.normal_map.size();
    let same_2d = |a: Extent3d, b: Extent3d| a.width == b.width && a.height == b.height;

    let mut violations = Vec::new();
    if position.width % THREAD_GROUP_SIZE != 0 || position.height % THREAD_GROUP_SIZE != 0 {
        violations.push(ConsistencyViolation::PositionMapNotGroupAligned(position));
    }
    if !same_2d(normal, position) {
        violations.push(ConsistencyViolation::NormalMapSizeMismatch { position, normal });
    }
    if !outputs.position_map.format().is_float_rgba() {
        violations.push(ConsistencyViolation::PositionMapFormat(
            outputs.position_map.format(),
        ));
    }
    if !outputs.normal_map.format().is_float_rgba() {
        violations.push(ConsistencyViolation::NormalMapFormat(
            outputs.normal_map.format(),
        ));
    }
    if !same_2d(velocity, position) {
        violations.push(ConsistencyViolation::VelocityMapSizeMismatch { position, velocity });
    }
    if !outputs.velocity_map.format().is_float_rgba() {
        violations.push(ConsistencyViolation::VelocityMapFormat(
            outputs.velocity_map.format(),
        ));
    }
    violations
}

/// Validates the output maps until the first failure, then stays failed.
#[derive(Debug, Default)]
pub struct ConsistencyChecker {
    latched: bool,
}

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a violation has been seen.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Check `outputs`, reporting every violation to `sink`.
    ///
    /// Returns `true` if baking may proceed. Once a check has failed this
    /// returns `false` without looking at the textures or reporting again.
    pub fn check(&mut self, outputs: &OutputTextures, sink: &dyn DiagnosticsSink) -> bool {
        if self.latched {
            return false;
        }

        let violations = find_violations(outputs);
        for violation in &violations {
            sink.report_error(&violation.to_string());
        }
        if !violations.is_empty() {
            log::warn!(
                "ConsistencyChecker: {} violation(s), baking halted",
                violations.len()
            );
            self.latched = true;
        }
        !self.latched
    }
}
