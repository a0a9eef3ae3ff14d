use crate::canvas::Canvas;
use crate::color::Rgb;

/// Frames per second the per-frame constants were tuned at.
pub const REFERENCE_FPS: f32 = 60.0;

/// Converts a wall-clock delta into "reference frames".
pub fn frames(dt: f32) -> f32 {
    dt.max(0.0) * REFERENCE_FPS
}

/// Short-lived glowing point. `life` runs from 1 down to 0.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: Rgb,
    pub alpha: f32,
    pub life: f32,
}

impl Particle {
    pub fn integrate(&mut self, frames: f32) {
        self.x += self.vx * frames;
        self.y += self.vy * frames;
    }

    /// Linear life decay; alpha tracks the remaining life.
    pub fn decay(&mut self, rate: f32, frames: f32) {
        self.life = (self.life - rate * frames).max(0.0);
        self.alpha = self.life;
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0 && self.alpha > 0.0
    }

    /// Soft halo of `glow_scale * size` plus a solid core.
    pub fn draw(&self, canvas: &mut Canvas, glow_scale: f32, glow_alpha: f32) {
        if !self.is_alive() {
            return;
        }
        canvas.glow(self.x, self.y, self.size * glow_scale, self.color, self.alpha * glow_alpha);
        canvas.disc(self.x, self.y, self.size, self.color, self.alpha);
    }
}
