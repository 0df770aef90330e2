//! In-memory collaborators for unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::camera::{PerspectiveCamera, SceneCamera};
use crate::frame::{FrameTiming, Size};
use crate::handle::{Pipeline, Renderer, SharedPipeline, SharedRenderer};
use crate::resize::{ListenerId, Viewport};
use crate::types::{Branch, MaterialOptions, PipelineProperties};
use crate::uniforms::Uniforms;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MockScene {
    pub name: String,
}

#[derive(Debug, Default)]
pub(crate) struct MockRenderer {
    pub pixel_ratio: Option<f32>,
    pub size: Option<(u32, u32)>,
    pub created: u32,
    pub fail_loads: bool,
    pub fail_renders: bool,
    /// Shared event journal; pipelines and test callbacks append to it.
    pub journal: Rc<RefCell<Vec<String>>>,
}

impl Renderer for MockRenderer {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = Some(ratio);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }
}

#[derive(Debug)]
pub(crate) struct MockPipeline {
    pub id: u32,
    renderer: SharedRenderer<MockRenderer>,
    pub uniforms: Uniforms,
    pub options: MaterialOptions,
    pub created_with_uniforms: Option<Uniforms>,
    pub uniform_overwrites: u32,
    pub loads: Vec<(String, Option<String>)>,
    pub size: Option<(u32, u32)>,
    pub disposals: u32,
    pub frame: u64,
}

impl MockPipeline {
    fn journal(&self, event: String) {
        let journal = Rc::clone(&self.renderer.borrow().journal);
        journal.borrow_mut().push(event);
    }
}

impl Pipeline for MockPipeline {
    type Renderer = MockRenderer;
    type Scene = MockScene;
    type Material = String;

    fn create(
        renderer: &SharedRenderer<MockRenderer>,
        uniforms: Option<Uniforms>,
        options: Option<MaterialOptions>,
    ) -> Result<Self> {
        let id = {
            let mut renderer = renderer.borrow_mut();
            renderer.created += 1;
            renderer.created
        };
        Ok(Self {
            id,
            renderer: Rc::clone(renderer),
            created_with_uniforms: uniforms.clone(),
            uniforms: uniforms.unwrap_or_default(),
            options: options.unwrap_or_default(),
            uniform_overwrites: 0,
            loads: Vec::new(),
            size: None,
            disposals: 0,
            frame: 0,
        })
    }

    fn renderer(&self) -> &SharedRenderer<MockRenderer> {
        &self.renderer
    }

    fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    fn set_uniforms(&mut self, uniforms: Uniforms) {
        self.uniform_overwrites += 1;
        self.uniforms = uniforms;
    }

    fn options(&self) -> &MaterialOptions {
        &self.options
    }

    fn set_options(&mut self, options: MaterialOptions) {
        self.options = options;
    }

    fn load(&mut self, fragment: &str, vertex: Option<&str>) -> Result<()> {
        if self.renderer.borrow().fail_loads {
            bail!("shader failed to compile");
        }
        self.loads
            .push((fragment.to_string(), vertex.map(str::to_string)));
        self.journal(format!("load#{}", self.id));
        Ok(())
    }

    fn render_main(&mut self) -> Result<()> {
        if self.renderer.borrow().fail_renders {
            bail!("render target lost");
        }
        self.frame += 1;
        self.journal(format!("render_main#{}", self.id));
        Ok(())
    }

    fn render_scene(&mut self, scene: &MockScene, _camera: &SceneCamera) -> Result<()> {
        if self.renderer.borrow().fail_renders {
            bail!("render target lost");
        }
        self.frame += 1;
        self.journal(format!("render_scene#{}:{}", self.id, scene.name));
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn dispose(&mut self) {
        self.disposals += 1;
        self.journal(format!("dispose#{}", self.id));
    }

    fn is_disposed(&self) -> bool {
        self.disposals > 0
    }

    fn material(&self) -> String {
        format!("material#{}", self.id)
    }

    fn branch_material(&mut self, branch: &Branch) -> String {
        format!("material#{}:{}", self.id, branch.names().join(","))
    }

    fn properties(&self) -> PipelineProperties {
        PipelineProperties {
            id: self.id.to_string(),
            uniforms: self.uniforms.clone(),
            options: self.options.clone(),
            frag_src: self.loads.last().map(|(fragment, _)| fragment.clone()),
            vert_src: self.loads.last().and_then(|(_, vertex)| vertex.clone()),
            frame: self.frame,
            resolution: self
                .size
                .map(|(w, h)| [w as f32, h as f32])
                .unwrap_or_default(),
            ..PipelineProperties::default()
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockViewport {
    pub size: Size,
    pub pixel_ratio: f32,
    pub added: Vec<ListenerId>,
    pub removed: Vec<ListenerId>,
    next_id: u64,
}

impl MockViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            pixel_ratio: 2.0,
            added: Vec::new(),
            removed: Vec::new(),
            next_id: 1,
        }
    }

    pub fn active_listeners(&self) -> usize {
        self.added.len() - self.removed.len()
    }
}

impl Viewport for MockViewport {
    fn size(&self) -> Size {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.added.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.removed.push(id);
    }
}

pub(crate) fn mock_renderer() -> SharedRenderer<MockRenderer> {
    Rc::new(RefCell::new(MockRenderer::default()))
}

pub(crate) fn pipeline_for(renderer: &SharedRenderer<MockRenderer>) -> SharedPipeline<MockPipeline> {
    let pipeline = MockPipeline::create(renderer, None, None).expect("mock pipeline");
    Rc::new(RefCell::new(pipeline))
}

pub(crate) fn shared_pipeline() -> (SharedPipeline<MockPipeline>, SharedRenderer<MockRenderer>) {
    let renderer = mock_renderer();
    (pipeline_for(&renderer), renderer)
}

pub(crate) fn frame_state_parts() -> (MockScene, SceneCamera, Size, FrameTiming) {
    (
        MockScene {
            name: "root".into(),
        },
        SceneCamera::from(PerspectiveCamera::default()),
        Size::new(800, 600),
        FrameTiming {
            elapsed: Duration::from_millis(16),
            delta: Duration::from_millis(16),
            frame: 1,
        },
    )
}
