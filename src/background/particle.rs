use rand::Rng;
use serde::Serialize;

/// Drawing surface size in pixels. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// `None` when either dimension is not a positive finite number
    /// (there is nothing to draw on).
    pub fn new(width: f64, height: f64) -> Option<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        (ok(width) && ok(height)).then_some(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
}

impl Particle {
    /// Uniform position over the viewport, small velocity, small radius.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, vp: Viewport) -> Self {
        Self {
            x: rng.random::<f64>() * vp.width,
            y: rng.random::<f64>() * vp.height,
            vx: (rng.random::<f64>() - 0.5) * 0.5,
            vy: (rng.random::<f64>() - 0.5) * 0.5,
            radius: rng.random::<f64>() * 2.0 + 1.0,
        }
    }

    /// Integrate one frame. Each axis reflects independently at the edges.
    pub fn advance(&mut self, vp: Viewport) {
        self.x += self.vx;
        self.y += self.vy;
        if self.x < 0.0 || self.x > vp.width {
            self.vx = -self.vx;
            self.x = self.x.clamp(0.0, vp.width);
        }
        if self.y < 0.0 || self.y > vp.height {
            self.vy = -self.vy;
            self.y = self.y.clamp(0.0, vp.height);
        }
    }
}

pub fn spawn_particles<R: Rng + ?Sized>(rng: &mut R, vp: Viewport, count: usize) -> Vec<Particle> {
    (0..count).map(|_| Particle::random(rng, vp)).collect()
}
