//! Declarative pipeline descriptions loaded from TOML or JSON.
//!
//! ```toml
//! type = "main"
//! fragment_shader = """
//! uniform vec2 u_resolution;
//! void main() { gl_FragColor = vec4(gl_FragCoord.xy / u_resolution, 0.0, 1.0); }
//! """
//! render_priority = 1
//!
//! [uniforms]
//! speed = 0.5
//! tint = [1.0, 0.5, 0.25]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Branch, MaterialOptions, RenderMode};
use crate::uniforms::Uniforms;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(rename = "type", default)]
    pub mode: RenderMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniforms: Option<Uniforms>,
    pub fragment_shader: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_shader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    #[serde(default = "default_true")]
    pub resize: bool,
    #[serde(default = "default_true")]
    pub auto_render: bool,
    #[serde(default)]
    pub render_priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MaterialOptions>,
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PipelineConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PipelineConfig = serde_json::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads a `.toml` or `.json` file, picking the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension != "toml" && extension != "json" {
            return Err(ConfigError::UnsupportedFormat(extension));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if extension == "json" {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fragment_shader.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fragment_shader must not be empty".into(),
            ));
        }

        if let Some(vertex) = &self.vertex_shader {
            if vertex.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "vertex_shader must not be empty when present".into(),
                ));
            }
        }

        if let Some(branch) = &self.branch {
            if branch.is_empty() {
                return Err(ConfigError::Invalid("branch must name a define".into()));
            }
        }

        if let Some(uniforms) = &self.uniforms {
            for (name, value) in uniforms {
                if name.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "uniform names must not be empty".into(),
                    ));
                }
                if !value.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "uniform '{name}' must be finite"
                    )));
                }
            }
        }

        Ok(())
    }
}
