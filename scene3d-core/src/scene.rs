/// Scene state and the per-frame composer that turns it into draw calls
use crate::animation::AnimationState;
use crate::camera::CameraRig;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::geometry::{build_ground, build_sphere, build_torus};
use crate::input::{HeldKeys, Key};
use crate::render::{MeshObject, RenderBackend};
use crate::transform::{MatrixStack, Transform};
use nalgebra::{Matrix4, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Ground plane sits just below eye level
const GROUND_DROP: f32 = -0.4;
/// Scattered spheres rest on the ground
const SPHERE_DROP: f32 = -0.2;
/// Distance of the animated pair in front of the world origin
const SHOWCASE_DEPTH: f32 = -2.5;
const ORBIT_RADIUS: f32 = 1.0;
const TORUS_LIFT: f32 = 0.1;
/// Frame rate that per-frame camera steps were tuned for
const REFERENCE_FPS: f32 = 60.0;

/// Ground position of one scattered sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub z: f32,
}

/// Scatter `count` spheres uniformly over `[-half_extent, half_extent)²`
pub fn place_spheres<R: Rng + ?Sized>(count: usize, half_extent: f32, rng: &mut R) -> Vec<Placement> {
    (0..count)
        .map(|_| {
            let x = rng.random::<f32>() * half_extent * 2.0 - half_extent;
            let z = rng.random::<f32>() * half_extent * 2.0 - half_extent;
            Placement { x, z }
        })
        .collect()
}

/// Everything that changes between frames: camera, animation, held keys.
#[derive(Debug, Clone)]
pub struct SceneState {
    camera: CameraRig,
    animation: AnimationState,
    held: HeldKeys,
    placements: Vec<Placement>,
    scale_by_elapsed: bool,
}

impl SceneState {
    pub fn new(config: &SceneConfig, placements: Vec<Placement>) -> Self {
        Self {
            camera: CameraRig::new(config.camera.move_step, config.camera.turn_step),
            animation: AnimationState::new(config.animation.rotation_rate, config.animation.jump),
            held: HeldKeys::default(),
            placements,
            scale_by_elapsed: config.camera.scale_by_elapsed,
        }
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn held(&self) -> &HeldKeys {
        &self.held
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn key_down(&mut self, key: Key) {
        if let Some(control) = key.nudge() {
            self.camera.apply(control, 1.0);
        }
        if let Some(control) = key.held_control() {
            self.held.set(control, true);
        }
        if key == Key::Space {
            self.animation.start_jump();
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if let Some(control) = key.held_control() {
            self.held.set(control, false);
        }
    }

    /// Advance animation by `dt` seconds, then re-apply held controls
    pub fn update(&mut self, dt: f32) {
        self.animation.advance(dt);

        let scale = if self.scale_by_elapsed {
            dt.max(0.0) * REFERENCE_FPS
        } else {
            1.0
        };
        let held = self.held;
        for control in held.controls() {
            self.camera.apply(control, scale);
        }
    }

    /// Root modelview for the frame: the camera lifted by the jump
    pub fn base_modelview(&self) -> Matrix4<f32> {
        Transform::translation(0.0, -self.animation.jump_height(), 0.0) * self.camera.camera()
    }
}

/// Totals for one composed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub vertices: usize,
}

/// The three uploaded meshes plus the state and stack used to draw them
pub struct Scene {
    state: SceneState,
    ground: MeshObject,
    sphere: MeshObject,
    torus: MeshObject,
    stack: MatrixStack,
}

fn color(rgb: [f32; 3]) -> Vector3<f32> {
    Vector3::new(rgb[0], rgb[1], rgb[2])
}

impl Scene {
    /// Build and upload the meshes and scatter the spheres
    pub fn new(config: &SceneConfig, backend: &mut dyn RenderBackend) -> Result<Self> {
        config.validate()?;
        let seed = config.sphere.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, count = config.sphere.count, "scattering spheres");
        let mut rng = StdRng::seed_from_u64(seed);
        let placements = place_spheres(config.sphere.count, config.sphere.scatter, &mut rng);
        Self::with_placements(config, placements, backend)
    }

    pub fn with_placements(
        config: &SceneConfig,
        placements: Vec<Placement>,
        backend: &mut dyn RenderBackend,
    ) -> Result<Self> {
        let ground = &config.ground;
        let sphere = &config.sphere;
        let torus = &config.torus;

        let mut scene = Self {
            state: SceneState::new(config, placements),
            ground: MeshObject::new(build_ground(ground.extent, ground.step))
                .with_color(color(ground.color)),
            sphere: MeshObject::new(build_sphere(sphere.radius, sphere.columns, sphere.rows))
                .with_color(color(sphere.color)),
            torus: MeshObject::new(build_torus(
                torus.major_radius,
                torus.minor_radius,
                torus.num_major,
                torus.num_minor,
            ))
            .with_color(color(torus.color)),
            stack: MatrixStack::new(),
        };

        scene.ground.initialize_buffers(backend)?;
        scene.sphere.initialize_buffers(backend)?;
        scene.torus.initialize_buffers(backend)?;
        tracing::info!(
            ground = scene.ground.vertex_count(),
            sphere = scene.sphere.vertex_count(),
            torus = scene.torus.vertex_count(),
            "scene meshes ready"
        );

        Ok(scene)
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    pub fn meshes(&self) -> [&MeshObject; 3] {
        [&self.ground, &self.sphere, &self.torus]
    }

    /// Update state by `dt` seconds and draw the whole scene.
    ///
    /// A stack underflow aborts the rest of the frame.
    pub fn render_frame(&mut self, dt: f32, backend: &mut dyn RenderBackend) -> Result<FrameStats> {
        self.state.update(dt);

        let mut stats = FrameStats::default();
        let result = self.compose(backend, &mut stats);
        if let Err(err) = &result {
            tracing::error!(%err, "frame aborted");
        }
        self.stack.clear();
        result.map(|_| stats)
    }

    fn compose(&mut self, backend: &mut dyn RenderBackend, stats: &mut FrameStats) -> Result<()> {
        let mut modelview = self.state.base_modelview();

        self.stack.push(modelview);
        modelview *= Transform::translation(0.0, GROUND_DROP, 0.0);
        submit(&self.ground, backend, &modelview, stats)?;
        modelview = self.stack.pop()?;

        for placement in &self.state.placements {
            self.stack.push(modelview);
            modelview = modelview
                * Transform::translation(placement.x, SPHERE_DROP, placement.z)
                * Transform::rotation_x(90.0);
            submit(&self.sphere, backend, &modelview, stats)?;
            modelview = self.stack.pop()?;
        }

        modelview *= Transform::translation(0.0, 0.0, SHOWCASE_DEPTH);

        let angle = self.state.animation.angle();
        self.stack.push(modelview);
        modelview = modelview
            * Transform::rotation_y(-2.0 * angle)
            * Transform::translation(ORBIT_RADIUS, 0.0, 0.0)
            * Transform::rotation_x(90.0);
        submit(&self.sphere, backend, &modelview, stats)?;
        modelview = self.stack.pop()?;

        modelview = modelview * Transform::translation(0.0, TORUS_LIFT, 0.0) * Transform::rotation_y(angle);
        submit(&self.torus, backend, &modelview, stats)?;

        Ok(())
    }
}

fn submit(
    object: &MeshObject,
    backend: &mut dyn RenderBackend,
    modelview: &Matrix4<f32>,
    stats: &mut FrameStats,
) -> Result<()> {
    object.draw(backend, modelview)?;
    stats.draw_calls += 1;
    stats.vertices += object.vertex_count();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Control;
    use crate::render::tests::RecordingBackend;
    use crate::render::BufferId;

    fn seeded_config(count: usize) -> SceneConfig {
        let mut config = SceneConfig::default();
        config.sphere.count = count;
        config.sphere.seed = Some(42);
        config
    }

    fn assert_close(a: &Matrix4<f32>, b: &Matrix4<f32>) {
        assert!((a - b).norm() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_scene_uploads_meshes() {
        let mut backend = RecordingBackend::default();
        let scene = Scene::new(&SceneConfig::default(), &mut backend).unwrap();

        let lengths: Vec<_> = backend.buffers.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![9600, 1350, 4800]);
        assert!(scene.meshes().iter().all(|m| m.is_uploaded()));
        assert!(scene.meshes().iter().all(|m| m.vertices().is_empty()));
        assert_eq!(scene.state().placements().len(), 50);
    }

    #[test]
    fn test_placements_seeded_and_bounded() {
        let a = place_spheres(100, 20.0, &mut StdRng::seed_from_u64(9));
        let b = place_spheres(100, 20.0, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        for p in &a {
            assert!(p.x >= -20.0 && p.x < 20.0);
            assert!(p.z >= -20.0 && p.z < 20.0);
        }
    }

    #[test]
    fn test_frame_draw_order() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new(&seeded_config(3), &mut backend).unwrap();

        let stats = scene.render_frame(0.016, &mut backend).unwrap();
        assert_eq!(stats.draw_calls, 6);
        assert_eq!(stats.vertices, 9600 + 4 * 1350 + 4800);

        let buffers: Vec<_> = backend.draws.iter().map(|d| d.buffer).collect();
        assert_eq!(
            buffers,
            vec![
                BufferId(0),
                BufferId(1),
                BufferId(1),
                BufferId(1),
                BufferId(1),
                BufferId(2)
            ]
        );
        assert!(scene.stack.is_empty());
    }

    #[test]
    fn test_frame_matrices() {
        let mut backend = RecordingBackend::default();
        let placements = vec![Placement { x: 3.0, z: -4.0 }];
        let mut scene =
            Scene::with_placements(&SceneConfig::default(), placements, &mut backend).unwrap();

        // 1.5s at 60°/s
        scene.render_frame(1.5, &mut backend).unwrap();
        let angle = 90.0;
        let draws = &backend.draws;

        assert_close(&draws[0].modelview, &Transform::translation(0.0, -0.4, 0.0));
        assert_close(
            &draws[1].modelview,
            &(Transform::translation(3.0, -0.2, -4.0) * Transform::rotation_x(90.0)),
        );

        let showcase = Transform::translation(0.0, 0.0, -2.5);
        assert_close(
            &draws[2].modelview,
            &(showcase
                * Transform::rotation_y(-2.0 * angle)
                * Transform::translation(1.0, 0.0, 0.0)
                * Transform::rotation_x(90.0)),
        );
        assert_close(
            &draws[3].modelview,
            &(showcase * Transform::translation(0.0, 0.1, 0.0) * Transform::rotation_y(angle)),
        );
    }

    #[test]
    fn test_frames_do_not_accumulate() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new(&seeded_config(2), &mut backend).unwrap();

        scene.render_frame(0.0, &mut backend).unwrap();
        scene.render_frame(0.0, &mut backend).unwrap();
        let (first, second) = backend.draws.split_at(5);
        for (a, b) in first.iter().zip(second) {
            assert_eq!(a.modelview, b.modelview);
        }
    }

    #[test]
    fn test_jump_lifts_camera() {
        let mut backend = RecordingBackend::default();
        let mut scene = Scene::new(&seeded_config(0), &mut backend).unwrap();

        scene.state_mut().key_down(Key::Space);
        scene.render_frame(0.25, &mut backend).unwrap();

        let height = scene.state().animation().jump_height();
        assert!(height > 0.0);
        let base = scene.state().base_modelview();
        assert!((base[(1, 3)] + height).abs() < 1e-6);
        assert_close(
            &backend.draws[0].modelview,
            &Transform::translation(0.0, -height - 0.4, 0.0),
        );
    }

    #[test]
    fn test_arrow_keys_nudge_once() {
        let mut state = SceneState::new(&SceneConfig::default(), Vec::new());
        state.key_down(Key::Up);
        let after_press = *state.camera().camera();
        assert_close(&after_press, &Transform::translation(0.0, 0.0, 0.1));

        state.update(0.016);
        state.update(0.016);
        assert_eq!(*state.camera().camera(), after_press);
    }

    #[test]
    fn test_held_keys_apply_every_frame() {
        let mut state = SceneState::new(&SceneConfig::default(), Vec::new());
        state.key_down(Key::W);
        assert!(state.held().is_held(Control::Forward));
        for _ in 0..10 {
            state.update(0.016);
        }
        assert_close(state.camera().camera(), &Transform::translation(0.0, 0.0, 1.0));

        state.key_up(Key::W);
        state.update(0.016);
        assert_close(state.camera().camera(), &Transform::translation(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_scale_by_elapsed() {
        let mut config = SceneConfig::default();
        config.camera.scale_by_elapsed = true;
        let mut state = SceneState::new(&config, Vec::new());
        state.key_down(Key::D);
        // Two reference frames' worth of time in one update
        state.update(2.0 / 60.0);
        assert_close(state.camera().camera(), &Transform::rotation_y(2.0));
    }

    #[test]
    fn test_space_ignored_while_airborne() {
        let mut state = SceneState::new(&SceneConfig::default(), Vec::new());
        state.key_down(Key::Space);
        state.update(0.3);
        let elapsed = state.animation().jump_elapsed();
        state.key_down(Key::Space);
        assert_eq!(state.animation().jump_elapsed(), elapsed);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut backend = RecordingBackend::default();
        let mut config = SceneConfig::default();
        config.sphere.rows = 0;
        assert!(Scene::new(&config, &mut backend).is_err());
        assert!(backend.buffers.is_empty());
    }
}
