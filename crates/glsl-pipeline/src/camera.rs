//! Scene cameras with an explicit kind tag.
//!
//! Hosts hand the component a [`SceneCamera`]; the variant is the capability
//! check, so resize handling matches on it instead of probing marker flags.

use glam::{Mat4, Vec3};

/// Vertical field of view (degrees) that maps one world unit to one pixel for a
/// camera `distance` units away from a plane `height` pixels tall.
pub fn pixel_perfect_fov(height: f32, distance: f32) -> f32 {
    2.0 * ((height / 2.0) / distance).atan() * (180.0 / std::f32::consts::PI)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 5.0),
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    /// Recomputes the projection from `fov`, `aspect`, `near` and `far`. Field
    /// edits are not visible in [`Self::projection`] until this runs.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Picks the field of view that keeps world units pixel sized for a
    /// viewport `height` pixels tall, based on the camera's distance along z.
    pub fn fit_to_viewport_height(&mut self, height: f32) {
        self.fov = pixel_perfect_fov(height, self.position.z);
        self.update_projection_matrix();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    projection: Mat4,
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self::new(-1.0, 1.0, 1.0, -1.0, 0.1, 2000.0)
    }
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
            zoom: 1.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        let zoom = self.zoom.max(f32::EPSILON);
        let center_x = (self.left + self.right) / 2.0;
        let center_y = (self.top + self.bottom) / 2.0;
        let half_w = (self.right - self.left) / (2.0 * zoom);
        let half_h = (self.top - self.bottom) / (2.0 * zoom);
        self.projection = Mat4::orthographic_rh_gl(
            center_x - half_w,
            center_x + half_w,
            center_y - half_h,
            center_y + half_h,
            self.near,
            self.far,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

/// The active camera of a host scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCamera {
    Perspective(PerspectiveCamera),
    Orthographic(OrthographicCamera),
}

impl SceneCamera {
    pub fn kind(&self) -> CameraKind {
        match self {
            SceneCamera::Perspective(_) => CameraKind::Perspective,
            SceneCamera::Orthographic(_) => CameraKind::Orthographic,
        }
    }

    pub fn projection(&self) -> Mat4 {
        match self {
            SceneCamera::Perspective(camera) => camera.projection(),
            SceneCamera::Orthographic(camera) => camera.projection(),
        }
    }

    pub fn as_perspective_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        match self {
            SceneCamera::Perspective(camera) => Some(camera),
            SceneCamera::Orthographic(_) => None,
        }
    }
}

impl From<PerspectiveCamera> for SceneCamera {
    fn from(camera: PerspectiveCamera) -> Self {
        SceneCamera::Perspective(camera)
    }
}

impl From<OrthographicCamera> for SceneCamera {
    fn from(camera: OrthographicCamera) -> Self {
        SceneCamera::Orthographic(camera)
    }
}
