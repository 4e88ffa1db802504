/// Time-driven animation: a spinning angle and a ballistic jump
use serde::Deserialize;

/// Projectile parameters for the jump arc
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct JumpParams {
    pub initial_speed: f32,
    pub gravity: f32,
}

impl JumpParams {
    /// Highest point of the arc, `v² / 2g`
    pub fn peak_height(&self) -> f32 {
        self.initial_speed * self.initial_speed / (2.0 * self.gravity)
    }

    /// Time until the arc returns to the ground, `2v / g`
    pub fn airtime(&self) -> f32 {
        2.0 * self.initial_speed / self.gravity
    }

    pub fn height_at(&self, t: f32) -> f32 {
        self.initial_speed * t - 0.5 * self.gravity * t * t
    }
}

impl Default for JumpParams {
    fn default() -> Self {
        Self {
            initial_speed: 4.0,
            gravity: 9.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationState {
    rotation_rate: f32,
    jump: JumpParams,
    angle: f32,
    jumping: bool,
    jump_elapsed: f32,
    jump_height: f32,
}

impl AnimationState {
    /// `rotation_rate` is in degrees per second
    pub fn new(rotation_rate: f32, jump: JumpParams) -> Self {
        Self {
            rotation_rate,
            jump,
            angle: 0.0,
            jumping: false,
            jump_elapsed: 0.0,
            jump_height: 0.0,
        }
    }

    /// Current spin angle in degrees, within `[0, 360)`
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn jump_height(&self) -> f32 {
        self.jump_height
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn jump_elapsed(&self) -> f32 {
        self.jump_elapsed
    }

    /// Begin a jump unless one is already in the air. Returns whether it started.
    pub fn start_jump(&mut self) -> bool {
        if self.jumping {
            return false;
        }
        self.jumping = true;
        self.jump_elapsed = 0.0;
        tracing::debug!("jump started");
        true
    }

    /// Advance by `dt` seconds of wall-clock time
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        self.angle = (self.angle + self.rotation_rate * dt).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if self.angle >= 360.0 {
            self.angle = 0.0;
        }

        self.jump_elapsed += dt;
        if self.jumping {
            self.jump_height = self.jump.height_at(self.jump_elapsed);
            if self.jump_height <= 0.0 {
                self.jump_height = 0.0;
                self.jumping = false;
                tracing::debug!(airtime = self.jump_elapsed, "jump landed");
            }
        }
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(60.0, JumpParams::default())
    }
}
