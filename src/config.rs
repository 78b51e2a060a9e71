// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Surfclip Contributors

//! Operation configuration shared by clip, cut, corefine and weld

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

/// Default file looked up by [`OperationConfig::load`].
pub const CONFIG_FILE: &str = "surfclip.toml";

/// Parameters of a clip/cut/corefine pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    /// Desired edge length for the remeshing passes
    pub target_edge_length: f64,
    /// Remesh the operands before the boolean step
    pub remesh_before_op: bool,
    /// Remesh the result after the boolean step
    pub remesh_after_op: bool,
    /// Run cleanup on the result
    pub remove_degenerate_faces: bool,
    /// Vertices closer than this are merged during cleanup and snapping
    pub duplicate_vertex_threshold: f64,
    /// Triangles smaller than this are discarded during cleanup
    pub area_threshold: f64,
    /// Constraint edges are never split, collapsed or flipped
    pub protect_constraints: bool,
    /// Constraint vertices may slide along their constraint polyline
    pub relax_constraints: bool,
    /// Remeshing iteration count
    pub number_of_iterations: i32,
    /// Cap closed meshes where a plane clip opens them
    pub clip_volume: bool,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            target_edge_length: 10.0,
            remesh_before_op: true,
            remesh_after_op: true,
            remove_degenerate_faces: true,
            duplicate_vertex_threshold: 1e-6,
            area_threshold: 1e-6,
            protect_constraints: true,
            relax_constraints: false,
            number_of_iterations: 3,
            clip_volume: true,
        }
    }
}

impl OperationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that performs only the boolean step: no remeshing and
    /// no cleanup.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            remesh_before_op: false,
            remesh_after_op: false,
            remove_degenerate_faces: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_target_edge_length(mut self, length: f64) -> Self {
        self.target_edge_length = length;
        self
    }

    #[must_use]
    pub fn with_remeshing(mut self, before: bool, after: bool) -> Self {
        self.remesh_before_op = before;
        self.remesh_after_op = after;
        self
    }

    #[must_use]
    pub fn with_cleanup(mut self, enabled: bool) -> Self {
        self.remove_degenerate_faces = enabled;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, area: f64, duplicate_vertex: f64) -> Self {
        self.area_threshold = area;
        self.duplicate_vertex_threshold = duplicate_vertex;
        self
    }

    #[must_use]
    pub fn with_constraints(mut self, protect: bool, relax: bool) -> Self {
        self.protect_constraints = protect;
        self.relax_constraints = relax;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: i32) -> Self {
        self.number_of_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_clip_volume(mut self, enabled: bool) -> Self {
        self.clip_volume = enabled;
        self
    }

    /// Reject non-positive lengths or iteration counts and negative or
    /// non-finite thresholds.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_edge_length(self.target_edge_length)?;
        validate_iterations(i64::from(self.number_of_iterations))?;
        validate_threshold("duplicate vertex threshold", self.duplicate_vertex_threshold)?;
        validate_threshold("area threshold", self.area_threshold)?;
        Ok(())
    }

    /// Parse a TOML document. Missing keys take their default value.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse operation config")
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: OperationConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `surfclip.toml` from the working directory when present, then
    /// apply `SURFCLIP_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(length) = std::env::var("SURFCLIP_TARGET_EDGE_LENGTH") {
            config.target_edge_length = length
                .parse()
                .with_context(|| format!("SURFCLIP_TARGET_EDGE_LENGTH is not a number: {length}"))?;
        }

        if let Ok(iterations) = std::env::var("SURFCLIP_ITERATIONS") {
            config.number_of_iterations = iterations
                .parse()
                .with_context(|| format!("SURFCLIP_ITERATIONS is not an integer: {iterations}"))?;
        }

        if let Ok(threshold) = std::env::var("SURFCLIP_DUPLICATE_VERTEX_THRESHOLD") {
            config.duplicate_vertex_threshold = threshold.parse().with_context(|| {
                format!("SURFCLIP_DUPLICATE_VERTEX_THRESHOLD is not a number: {threshold}")
            })?;
        }

        if let Ok(threshold) = std::env::var("SURFCLIP_AREA_THRESHOLD") {
            config.area_threshold = threshold
                .parse()
                .with_context(|| format!("SURFCLIP_AREA_THRESHOLD is not a number: {threshold}"))?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

/// Retention flags for [`crate::cut_with_surface`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutOptions {
    /// Keep the parts of the cut mesh lying on the clipper with the same
    /// orientation as the clipper.
    pub preserve_intersection: bool,
    /// Keep the parts of the cut mesh lying on the clipper with the opposite
    /// orientation.
    pub preserve_intersection_clipper: bool,
}

pub(crate) fn validate_edge_length(length: f64) -> Result<(), ConfigurationError> {
    if length.is_finite() && length > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidTargetEdgeLength(length))
    }
}

pub(crate) fn validate_iterations(iterations: i64) -> Result<(), ConfigurationError> {
    if iterations > 0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIterations(iterations))
    }
}

pub(crate) fn validate_threshold(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = OperationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.number_of_iterations, 3);
        assert!(config.protect_constraints);
        assert!(!config.relax_constraints);

        let config = config.with_remeshing(false, true);
        assert!(!config.remesh_before_op);
        assert!(config.remesh_after_op);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = OperationConfig::default().with_target_edge_length(0.0);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidTargetEdgeLength(0.0))
        );

        let config = OperationConfig::default().with_iterations(-2);
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidIterations(-2)));

        let config = OperationConfig::default().with_thresholds(-1.0, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidThreshold { .. })
        ));

        let config = OperationConfig::default().with_target_edge_length(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = OperationConfig::from_toml_str(
            "target_edge_length = 2.5\nremesh_before_op = false\n",
        )
        .unwrap();
        assert_eq!(config.target_edge_length, 2.5);
        assert!(!config.remesh_before_op);
        assert!(config.remesh_after_op);
        assert_eq!(config.area_threshold, 1e-6);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.toml");
        let config = OperationConfig::exact().with_iterations(7);
        config.save(&path).unwrap();
        let loaded = OperationConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
