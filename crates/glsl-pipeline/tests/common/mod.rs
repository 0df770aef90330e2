#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{bail, Result};
use glsl_pipeline::{
    Branch, BufferInfo, BuiltinUniforms, FrameClock, ListenerId, MaterialOptions, Pipeline,
    PipelineProperties, Renderer, SceneCamera, SharedRenderer, Size, Uniforms, Viewport,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("glsl_pipeline=debug")
        .with_test_writer()
        .try_init();
}

/// Canvas stand-in that records what the pipeline asked of it.
#[derive(Debug, Default)]
pub struct Canvas {
    pub pixel_ratio: f32,
    pub size: (u32, u32),
    pub pipelines_created: u32,
}

impl Renderer for Canvas {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

pub fn canvas() -> SharedRenderer<Canvas> {
    Rc::new(RefCell::new(Canvas::default()))
}

/// Geometry a scene-mode pipeline is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub scale: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub pipeline: String,
    pub defines: Vec<String>,
    pub side: glsl_pipeline::Side,
}

/// Pipeline that tracks buffers and built-in uniforms without a GPU.
pub struct SoftPipeline {
    id: String,
    renderer: SharedRenderer<Canvas>,
    uniforms: Uniforms,
    options: MaterialOptions,
    builtins: BuiltinUniforms,
    clock: FrameClock,
    fragment: Option<String>,
    vertex: Option<String>,
    buffers: Vec<BufferInfo>,
    pub loads: u32,
    pub renders: Vec<String>,
    disposed: bool,
    size: (u32, u32),
}

impl SoftPipeline {
    fn scan_buffers(fragment: &str, size: (u32, u32)) -> Vec<BufferInfo> {
        (0..)
            .map(|index| format!("BUFFER_{index}"))
            .take_while(|name| fragment.contains(name.as_str()))
            .map(|name| BufferInfo {
                name,
                width: size.0,
                height: size.1,
            })
            .collect()
    }

    fn advance(&mut self) {
        let timing = self.clock.tick(Instant::now());
        self.builtins.update(&timing);
    }
}

impl Pipeline for SoftPipeline {
    type Renderer = Canvas;
    type Scene = Mesh;
    type Material = ShaderMaterial;

    fn create(
        renderer: &SharedRenderer<Canvas>,
        uniforms: Option<Uniforms>,
        options: Option<MaterialOptions>,
    ) -> Result<Self> {
        let mut canvas = renderer.borrow_mut();
        canvas.pipelines_created += 1;
        let size = canvas.size;
        Ok(Self {
            id: format!("pipeline-{}", canvas.pipelines_created),
            renderer: Rc::clone(renderer),
            uniforms: uniforms.unwrap_or_default(),
            options: options.unwrap_or_default(),
            builtins: BuiltinUniforms::new(size.0, size.1),
            clock: FrameClock::new(Instant::now()),
            fragment: None,
            vertex: None,
            buffers: Vec::new(),
            loads: 0,
            renders: Vec::new(),
            disposed: false,
            size,
        })
    }

    fn renderer(&self) -> &SharedRenderer<Canvas> {
        &self.renderer
    }

    fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    fn set_uniforms(&mut self, uniforms: Uniforms) {
        self.uniforms = uniforms;
    }

    fn options(&self) -> &MaterialOptions {
        &self.options
    }

    fn set_options(&mut self, options: MaterialOptions) {
        self.options = options;
    }

    fn load(&mut self, fragment: &str, vertex: Option<&str>) -> Result<()> {
        if !fragment.contains("main") {
            bail!("fragment shader has no entry point");
        }
        self.buffers = Self::scan_buffers(fragment, self.size);
        self.fragment = Some(fragment.to_string());
        self.vertex = vertex.map(str::to_string);
        self.loads += 1;
        Ok(())
    }

    fn render_main(&mut self) -> Result<()> {
        self.advance();
        self.renders.push("main".into());
        Ok(())
    }

    fn render_scene(&mut self, scene: &Mesh, _camera: &SceneCamera) -> Result<()> {
        self.advance();
        self.renders
            .push(format!("scene {}x{}", scene.scale[0], scene.scale[1]));
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.builtins.set_resolution(width as f32, height as f32);
        for buffer in &mut self.buffers {
            buffer.width = width;
            buffer.height = height;
        }
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn material(&self) -> ShaderMaterial {
        ShaderMaterial {
            pipeline: self.id.clone(),
            defines: Vec::new(),
            side: self.options.side,
        }
    }

    fn branch_material(&mut self, branch: &Branch) -> ShaderMaterial {
        ShaderMaterial {
            pipeline: self.id.clone(),
            defines: branch.names().into_iter().map(str::to_string).collect(),
            side: self.options.side,
        }
    }

    fn properties(&self) -> PipelineProperties {
        let mut uniforms = self.uniforms.clone();
        uniforms.extend(self.builtins.to_uniforms());
        PipelineProperties {
            id: self.id.clone(),
            uniforms,
            options: self.options.clone(),
            frag_src: self.fragment.clone(),
            vert_src: self.vertex.clone(),
            buffers: self.buffers.clone(),
            frame: self.clock.frame_count(),
            time: self.builtins.u_time,
            resolution: self.builtins.u_resolution,
            ..PipelineProperties::default()
        }
    }
}

/// Window stand-in with a controllable size.
#[derive(Debug)]
pub struct Window {
    pub size: Size,
    pub pixel_ratio: f32,
    listeners: Vec<ListenerId>,
    next_id: u64,
}

impl Window {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixel_ratio: 1.0,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Viewport for Window {
    fn size(&self) -> Size {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|listener| *listener != id);
    }
}
