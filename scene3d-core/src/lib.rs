/// Scene3D Core Library - Procedural meshes and the modelview pipeline
///
/// This library provides the renderer-independent half of the scene:
/// mesh builders, the matrix stack, the camera rig, animation state and the
/// frame composer that drives any `RenderBackend`.

pub mod animation;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use animation::{AnimationState, JumpParams};
pub use camera::{CameraRig, Control};
pub use config::SceneConfig;
pub use error::{Result, SceneError};
pub use geometry::{build_ground, build_sphere, build_torus, Mesh, MAX_MESH_VERTICES};
pub use input::{HeldKeys, Key};
pub use render::{normal_matrix, BufferId, DrawCall, MeshObject, RenderBackend};
pub use scene::{FrameStats, Placement, Scene, SceneState};
pub use transform::{MatrixStack, Transform};
