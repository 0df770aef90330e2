//! Frame-driven glue between a host render loop and multi-pass GLSL pipelines.
//!
//! The crate does not compile shaders or touch the GPU itself. It decides when
//! a [`Pipeline`] handle is built or reused, renders it every frame in one of
//! two [`RenderMode`]s, keeps its size in step with the viewport and fans out
//! per-frame callbacks to subscribers:
//!
//! ```text
//!   host frame loop ──▶ FrameLoop::advance ──▶ GlslPipelineComponent::frame
//!                                                   │
//!                        ┌──────────────────────────┴─────────────┐
//!                        ▼                                        ▼
//!           Pipeline::render_scene / render_main      CallbackRegistry::dispatch_all
//!
//!   props change ──▶ Reconciler::resolve ──▶ HandleSlot
//!   viewport resize ──▶ ResizeCoordinator ──▶ Renderer + Pipeline + camera
//! ```
//!
//! Everything runs on the host's render thread and is shared through
//! `Rc<RefCell<_>>`.

pub mod camera;
pub mod component;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod handle;
pub mod reconcile;
pub mod registry;
pub mod resize;
pub mod types;
pub mod uniforms;

#[cfg(test)]
mod testing;

pub use camera::{
    pixel_perfect_fov, CameraKind, OrthographicCamera, PerspectiveCamera, SceneCamera,
};
pub use component::{GlslPipelineComponent, PipelineProps};
pub use config::PipelineConfig;
pub use driver::{FrameDriver, FrameLoop, FrameTask, TaskId};
pub use error::ConfigError;
pub use frame::{FrameClock, FrameState, FrameTiming, Size};
pub use handle::{Pipeline, Renderer, SharedPipeline, SharedRenderer, Snapshot};
pub use reconcile::{HandleSlot, ReconcileInputs, Reconciler};
pub use registry::{CallbackOwner, CallbackRegistry, PipelineCallback};
pub use resize::{ListenerId, ResizeCoordinator, Viewport};
pub use types::{BufferInfo, Branch, MaterialOptions, PipelineProperties, RenderMode, Side};
pub use uniforms::{BuiltinUniforms, UniformValue, Uniforms};
