//! Uniform values handed to pipeline handles, plus the built-in block that
//! every pipeline refreshes once per frame.
//!
//! User uniforms travel as an ordered [`Uniforms`] map so config files and
//! callers can describe them without knowing the GPU layout. The built-in
//! `u_time`/`u_resolution`/`u_date` family lives in [`BuiltinUniforms`], a
//! `#[repr(C)]` block that handle implementors can upload verbatim or merge into
//! their own map through [`BuiltinUniforms::to_uniforms`].

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::frame::FrameTiming;

/// Named uniform values, ordered by name so snapshots are stable.
pub type Uniforms = BTreeMap<String, UniformValue>;

/// A single uniform value as the shader sees it.
///
/// Untagged on the wire: `5` is an int, `5.0` a float, `[1.0, 0.5]` a `vec2`
/// and a string names a texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Texture(String),
}

impl UniformValue {
    /// Returns the value as a float when it is numeric.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            UniformValue::Float(value) => Some(*value),
            UniformValue::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    /// GLSL type name used when declaring the uniform.
    pub fn glsl_type(&self) -> &'static str {
        match self {
            UniformValue::Bool(_) => "bool",
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Texture(_) => "sampler2D",
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        let components: &[f32] = match self {
            UniformValue::Float(value) => std::slice::from_ref(value),
            UniformValue::Vec2(values) => values,
            UniformValue::Vec3(values) => values,
            UniformValue::Vec4(values) => values,
            _ => return true,
        };
        components.iter().all(|value| value.is_finite())
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Bool(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

/// Names of the uniforms maintained by [`BuiltinUniforms`].
pub const U_RESOLUTION: &str = "u_resolution";
pub const U_TIME: &str = "u_time";
pub const U_DELTA: &str = "u_delta";
pub const U_DATE: &str = "u_date";
pub const U_MOUSE: &str = "u_mouse";
pub const U_FRAME: &str = "u_frame";

/// Per-frame uniforms every pipeline exposes.
///
/// The layout is std140 compatible: declare it in GLSL as
/// `vec2 u_resolution; float u_time; float u_delta; vec4 u_date; vec2 u_mouse;
/// int u_frame; float _pad;`.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinUniforms {
    pub u_resolution: [f32; 2],
    pub u_time: f32,
    pub u_delta: f32,
    pub u_date: [f32; 4],
    pub u_mouse: [f32; 2],
    pub u_frame: i32,
    _padding: f32,
}

unsafe impl Zeroable for BuiltinUniforms {}
unsafe impl Pod for BuiltinUniforms {}

impl BuiltinUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        let mut uniforms = Self {
            u_resolution: [width as f32, height as f32],
            u_time: 0.0,
            u_delta: 0.0,
            u_date: [0.0; 4],
            u_mouse: [0.0; 2],
            u_frame: 0,
            _padding: 0.0,
        };
        uniforms.refresh_date();
        uniforms
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.u_resolution = [width, height];
    }

    pub fn set_mouse(&mut self, x: f32, y: f32) {
        self.u_mouse = [x, y];
    }

    /// Advances time-driven fields from a host frame tick.
    pub fn update(&mut self, timing: &FrameTiming) {
        self.u_time = timing.elapsed.as_secs_f32();
        self.u_delta = timing.delta.as_secs_f32();
        self.u_frame = timing.frame.min(i32::MAX as u64) as i32;
        self.refresh_date();
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Projects the block into a uniform map so handles can merge it with user
    /// uniforms.
    pub fn to_uniforms(&self) -> Uniforms {
        let mut map = Uniforms::new();
        map.insert(U_RESOLUTION.into(), self.u_resolution.into());
        map.insert(U_TIME.into(), self.u_time.into());
        map.insert(U_DELTA.into(), self.u_delta.into());
        map.insert(U_DATE.into(), self.u_date.into());
        map.insert(U_MOUSE.into(), self.u_mouse.into());
        map.insert(U_FRAME.into(), self.u_frame.into());
        map
    }

    fn refresh_date(&mut self) {
        let local_now = Local::now();
        let seconds_since_midnight = local_now.num_seconds_from_midnight() as f32
            + local_now.nanosecond() as f32 / 1_000_000_000.0;
        self.u_date = [
            local_now.year() as f32,
            local_now.month() as f32,
            local_now.day() as f32,
            seconds_since_midnight,
        ];
    }
}
