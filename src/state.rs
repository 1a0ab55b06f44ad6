//! Demo state: scene objects, camera, mode toggles.
//!
//! One explicitly constructed [`DemoState`] is passed by reference through the
//! input, update, and render phases; nothing here is global.

use glam::{Mat4, Vec3, Vec4, vec3};

use crate::transform::{self, AuthoredAxis, VerticalAxis};

/// Number of MRT color attachments, and therefore of selectable demo modes.
pub const DEMO_MODE_COUNT: usize = 4;

/// A transformable thing in the scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneObject {
    pub position: Vec3,
    /// Euler angles in degrees, applied intrinsic Z then Y then X.
    pub euler: Vec3,
    pub model_mat: Mat4,
    pub model_mat_inv: Mat4,
}

impl SceneObject {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            euler: Vec3::ZERO,
            model_mat: Mat4::IDENTITY,
            model_mat_inv: Mat4::IDENTITY,
        }
    }

    /// Re-derives both matrices from position and orientation. Runs every
    /// frame before the renderer reads them, so they are never stale.
    pub fn update(&mut self) {
        self.model_mat = transform::model_matrix(self.position, self.euler);
        self.model_mat_inv = transform::inverse_ignore_scale(&self.model_mat);
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Projection parameters plus the derived view-projection matrix.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub aspect: f32,
    pub projection_mat: Mat4,
    pub view_projection_mat: Mat4,
    pub ctrl_move_speed: f32,
    pub ctrl_rotate_speed: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            fovy_deg: 60.0,
            znear: 1.0,
            zfar: 100.0,
            aspect,
            projection_mat: Mat4::IDENTITY,
            view_projection_mat: Mat4::IDENTITY,
            ctrl_move_speed: 10.0,
            ctrl_rotate_speed: 5.0,
        };
        camera.update_projection();
        camera
    }

    pub fn update_projection(&mut self) {
        self.projection_mat = Mat4::perspective_rh_gl(
            self.fovy_deg.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        );
    }

    /// Recomputes the view-projection from the camera object's inverse model
    /// matrix. Called whenever the camera object or projection changed, which
    /// in this demo means every frame.
    pub fn update_view_projection(&mut self, camera_object: &SceneObject) {
        self.view_projection_mat = self.projection_mat * camera_object.model_mat_inv;
    }
}

/// The scene shapes drawn by the opaque object pass, in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeId {
    Ground,
    Sphere,
    Cylinder,
    Torus,
    Teapot,
}

impl ShapeId {
    pub const DRAW_ORDER: [ShapeId; 5] = [
        ShapeId::Ground,
        ShapeId::Sphere,
        ShapeId::Cylinder,
        ShapeId::Torus,
        ShapeId::Teapot,
    ];

    /// The canonical axis each shape's geometry was generated around; the
    /// renderer resolves this against the active vertical axis.
    pub fn authored_axis(self) -> AuthoredAxis {
        match self {
            ShapeId::Ground => AuthoredAxis::World,
            ShapeId::Sphere => AuthoredAxis::ZUp,
            ShapeId::Cylinder | ShapeId::Torus => AuthoredAxis::ZAlong,
            ShapeId::Teapot => AuthoredAxis::YUp,
        }
    }
}

/// All mutable demo state, owned by the frame loop.
pub struct DemoState {
    pub vertical_axis: VerticalAxis,

    pub demo_mode: usize,
    pub demo_mode_count: usize,
    pub display_depth: bool,
    pub display_grid: bool,
    pub display_axes: bool,
    /// `false` selects the combined-shading program, `true` the effects one.
    pub use_effects_program: bool,

    pub light_pos_world: Vec4,

    pub camera_object: SceneObject,
    pub camera: Camera,
    pub ground: SceneObject,
    pub sphere: SceneObject,
    pub cylinder: SceneObject,
    pub torus: SceneObject,
    pub teapot: SceneObject,
}

impl DemoState {
    pub fn new(vertical_axis: VerticalAxis, aspect: f32) -> Self {
        let mut state = Self {
            vertical_axis,
            demo_mode: 0,
            demo_mode_count: DEMO_MODE_COUNT,
            display_depth: false,
            display_grid: true,
            display_axes: true,
            use_effects_program: false,
            light_pos_world: Vec4::new(20.0, 0.0, 0.0, 1.0),
            camera_object: SceneObject::new(),
            camera: Camera::new(aspect),
            ground: SceneObject::new(),
            sphere: SceneObject::new(),
            cylinder: SceneObject::new(),
            torus: SceneObject::new(),
            teapot: SceneObject::new(),
        };

        // camera start pose depends on the vertical axis; both poses give the
        // exact same view
        let camera_axis_pos = 15.0;
        match vertical_axis {
            VerticalAxis::Y => {
                state.camera_object.position = vec3(camera_axis_pos, camera_axis_pos, camera_axis_pos);
                state.camera_object.euler = vec3(-30.0, 45.0, 0.0);
            }
            VerticalAxis::Z => {
                state.camera_object.position =
                    vec3(camera_axis_pos, -camera_axis_pos, camera_axis_pos);
                state.camera_object.euler = vec3(60.0, 0.0, 45.0);
            }
        }
        state.camera_object.update();
        state.camera.update_view_projection(&state.camera_object);
        state
    }

    pub fn scene_object(&self, shape: ShapeId) -> &SceneObject {
        match shape {
            ShapeId::Ground => &self.ground,
            ShapeId::Sphere => &self.sphere,
            ShapeId::Cylinder => &self.cylinder,
            ShapeId::Torus => &self.torus,
            ShapeId::Teapot => &self.teapot,
        }
    }

    pub fn objects_mut(&mut self) -> [&mut SceneObject; 6] {
        [
            &mut self.camera_object,
            &mut self.ground,
            &mut self.sphere,
            &mut self.cylinder,
            &mut self.torus,
            &mut self.teapot,
        ]
    }

    /// Advances the demo mode, wrapping past the last attachment.
    pub fn next_demo_mode(&mut self) {
        self.demo_mode = (self.demo_mode + 1) % self.demo_mode_count;
    }

    /// Steps the demo mode backward, wrapping below zero.
    pub fn prev_demo_mode(&mut self) {
        self.demo_mode = (self.demo_mode + self.demo_mode_count - 1) % self.demo_mode_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::CONVERT_Y2Z;

    #[test]
    fn demo_mode_wraps_forward_and_backward() {
        let mut state = DemoState::new(VerticalAxis::Y, 16.0 / 9.0);
        assert_eq!(state.demo_mode_count, 4);
        state.demo_mode = 3;
        state.next_demo_mode();
        assert_eq!(state.demo_mode, 0);
        state.prev_demo_mode();
        assert_eq!(state.demo_mode, 3);
        for _ in 0..state.demo_mode_count {
            state.next_demo_mode();
        }
        assert_eq!(state.demo_mode, 3);
    }

    #[test]
    fn camera_start_poses_give_the_same_view() {
        let y_up = DemoState::new(VerticalAxis::Y, 1.0);
        let z_up = DemoState::new(VerticalAxis::Z, 1.0);

        // mapping the Y-up camera pose through the Y-to-Z conversion must land
        // exactly on the Z-up pose, position and forward direction both
        let y_pos = y_up.camera_object.position.extend(1.0);
        let z_pos = z_up.camera_object.position.extend(1.0);
        assert!((CONVERT_Y2Z * y_pos - z_pos).length() < 1e-4);

        let forward = Vec4::new(0.0, 0.0, -1.0, 0.0);
        let y_forward = CONVERT_Y2Z * (y_up.camera_object.model_mat * forward);
        let z_forward = z_up.camera_object.model_mat * forward;
        assert!((y_forward - z_forward).length() < 1e-4);
    }

    #[test]
    fn updated_matrices_are_never_stale() {
        let mut state = DemoState::new(VerticalAxis::Y, 1.0);
        state.sphere.position = vec3(5.0, 0.0, 0.0);
        state.sphere.euler = vec3(0.0, 42.0, 0.0);
        for object in state.objects_mut() {
            object.update();
        }
        let expected = crate::transform::model_matrix(vec3(5.0, 0.0, 0.0), vec3(0.0, 42.0, 0.0));
        assert!((state.sphere.model_mat * expected.inverse() - Mat4::IDENTITY)
            .to_cols_array()
            .iter()
            .all(|v| v.abs() < 1e-4));
    }

    #[test]
    fn shape_table_covers_draw_order() {
        use crate::transform::AuthoredAxis;
        assert_eq!(ShapeId::DRAW_ORDER.len(), 5);
        assert_eq!(ShapeId::Ground.authored_axis(), AuthoredAxis::World);
        assert_eq!(ShapeId::Sphere.authored_axis(), AuthoredAxis::ZUp);
        assert_eq!(ShapeId::Cylinder.authored_axis(), AuthoredAxis::ZAlong);
        assert_eq!(ShapeId::Torus.authored_axis(), AuthoredAxis::ZAlong);
        assert_eq!(ShapeId::Teapot.authored_axis(), AuthoredAxis::YUp);
    }
}
