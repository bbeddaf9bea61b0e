//! Expanding ring ("ripple") effects.
//!
//! Active ripples are plain values advanced once per frame by the render
//! loop; a ripple is dropped as soon as its radius passes the cap.

use rand::Rng;

use super::particle::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct Ripples {
    active: Vec<Ripple>,
    growth: f64,
    max_radius: f64,
}

impl Ripples {
    pub fn new(growth: f64, max_radius: f64) -> Self {
        Self {
            active: Vec::new(),
            growth: growth.max(f64::EPSILON),
            max_radius,
        }
    }

    /// With probability `p`, start a ripple at a random point.
    pub fn maybe_spawn<R: Rng + ?Sized>(&mut self, rng: &mut R, vp: Viewport, p: f64) -> bool {
        if rng.random::<f64>() >= p {
            return false;
        }
        self.active.push(Ripple {
            x: rng.random::<f64>() * vp.width,
            y: rng.random::<f64>() * vp.height,
            radius: 0.0,
        });
        true
    }

    /// Grow every ripple by one step and drop the finished ones.
    pub fn advance(&mut self) {
        let growth = self.growth;
        let max = self.max_radius;
        self.active.retain_mut(|r| {
            r.radius += growth;
            r.radius <= max
        });
    }

    /// Ring opacity fades from 0.3 at birth to 0 at the cap.
    pub fn opacity(&self, r: &Ripple) -> f64 {
        (0.3 * (1.0 - r.radius / self.max_radius)).clamp(0.0, 0.3)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
