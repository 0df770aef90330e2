use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a mounted pipeline reaches the screen.
///
/// * `Scene` hands the pipeline material to an external scene graph and renders
///   that scene through the active camera.
/// * `Main` draws the pipeline as a self-contained full-screen quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Scene,
    Main,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Scene => f.write_str("scene"),
            RenderMode::Main => f.write_str("main"),
        }
    }
}

/// Material sub-selection: one branch define or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Branch {
    One(String),
    Many(Vec<String>),
}

impl Branch {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Branch::One(name) => vec![name.as_str()],
            Branch::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Branch::One(name) => name.trim().is_empty(),
            Branch::Many(names) => names.iter().all(|name| name.trim().is_empty()),
        }
    }
}

impl From<&str> for Branch {
    fn from(value: &str) -> Self {
        Branch::One(value.to_string())
    }
}

impl From<Vec<String>> for Branch {
    fn from(value: Vec<String>) -> Self {
        Branch::Many(value)
    }
}

/// Which faces of the geometry the material draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Material parameters forwarded to the pipeline alongside uniforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialOptions {
    pub side: Side,
    pub transparent: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub wireframe: bool,
    /// Extra preprocessor defines injected ahead of the shader sources.
    pub defines: BTreeMap<String, String>,
}

impl Default for MaterialOptions {
    fn default() -> Self {
        Self {
            side: Side::Front,
            transparent: false,
            depth_test: true,
            depth_write: true,
            wireframe: false,
            defines: BTreeMap::new(),
        }
    }
}

/// Name and resolution of an offscreen buffer owned by a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Plain-data projection of a pipeline handle.
///
/// Callbacks receive this instead of the handle so they can read state without
/// reaching the handle's mutators. It is rebuilt for every dispatch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineProperties {
    pub id: String,
    pub uniforms: crate::uniforms::Uniforms,
    pub options: MaterialOptions,
    pub defines: BTreeMap<String, String>,
    pub frag_src: Option<String>,
    pub vert_src: Option<String>,
    pub buffers: Vec<BufferInfo>,
    pub double_buffers: Vec<BufferInfo>,
    pub frame: u64,
    pub time: f32,
    pub last_time: f32,
    pub resolution: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_accepts_string_or_list() {
        let one: Branch = serde_json::from_str(r#""BRANCH_A""#).unwrap();
        let many: Branch = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(one.names(), vec!["BRANCH_A"]);
        assert_eq!(many.names(), vec!["A", "B"]);
        assert!(Branch::Many(vec![]).is_empty());
        assert!(Branch::from(" ").is_empty());
    }

    #[test]
    fn material_options_fill_missing_fields() {
        let options: MaterialOptions = serde_json::from_str(r#"{"side": "double"}"#).unwrap();
        assert_eq!(options.side, Side::Double);
        assert!(options.depth_test);
        assert!(options.defines.is_empty());
    }

    #[test]
    fn render_mode_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&RenderMode::Main).unwrap(), r#""main""#);
        assert_eq!(RenderMode::default(), RenderMode::Scene);
        assert_eq!(RenderMode::Scene.to_string(), "scene");
    }
}
