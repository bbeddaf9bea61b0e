//! # Scene
//! One ambient background: drifting gradient, faint outline, particles
//! linked by proximity, and occasional ripples.
//!
//! Frame order: clear, advance clock, gradient, outline, particles
//! (integrate + draw), links, ripples. Links come from the spatial grid, so
//! the particle count can grow without an O(n²) scan per frame.

use rand::Rng;
use serde::Serialize;

use super::canvas::{Canvas, Rgba};
use super::effects::Ripples;
use super::grid::close_pairs;
use super::outline::scaled_outline;
use super::particle::{spawn_particles, Particle, Viewport};

const GRADIENT_FROM: Rgba = Rgba::new(6, 78, 59, 0.9);
const GRADIENT_TO: Rgba = Rgba::new(12, 74, 110, 0.9);
const PARTICLE: Rgba = Rgba::new(52, 211, 153, 1.0);
const LINK: Rgba = Rgba::new(110, 231, 183, 1.0);
const OUTLINE: Rgba = Rgba::new(255, 255, 255, 0.05);
const RIPPLE: Rgba = Rgba::new(167, 243, 208, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub particle_count: usize,
    /// Pairs closer than this (px) are linked.
    pub link_distance: f64,
    /// Clock increment per frame; only phases the gradient and twinkle.
    pub time_step: f64,
    /// Chance per frame of starting a ripple.
    pub ripple_probability: f64,
    pub ripple_growth: f64,
    pub ripple_max_radius: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            particle_count: 50,
            link_distance: 150.0,
            time_step: 0.01,
            ripple_probability: 0.02,
            ripple_growth: 2.0,
            ripple_max_radius: 100.0,
        }
    }
}

/// Counts for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
    pub ripples: usize,
}

pub struct Scene<R: Rng> {
    cfg: SceneConfig,
    vp: Viewport,
    particles: Vec<Particle>,
    ripples: Ripples,
    time: f64,
    rng: R,
}

impl<R: Rng> Scene<R> {
    pub fn new(cfg: SceneConfig, vp: Viewport, mut rng: R) -> Self {
        let particles = spawn_particles(&mut rng, vp, cfg.particle_count);
        Self {
            ripples: Ripples::new(cfg.ripple_growth, cfg.ripple_max_radius),
            cfg,
            vp,
            particles,
            time: 0.0,
            rng,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.vp
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// New surface size: particles are re-seeded across it and effects dropped.
    pub fn resize(&mut self, vp: Viewport) {
        self.vp = vp;
        self.particles = spawn_particles(&mut self.rng, vp, self.cfg.particle_count);
        self.ripples.clear();
    }

    /// Twinkle: opacity in `[0.3, 0.7]`, phase-shifted per particle.
    pub fn particle_opacity(time: f64, index: usize) -> f64 {
        0.5 + 0.2 * (time * 2.0 + index as f64 * 0.5).sin()
    }

    /// Link opacity decays linearly from 0.5 (touching) to 0 (at the threshold).
    pub fn link_opacity(&self, distance: f64) -> f64 {
        (0.5 * (1.0 - distance / self.cfg.link_distance)).clamp(0.0, 0.5)
    }

    /// Render one frame onto `canvas`.
    pub fn step(&mut self, canvas: &mut dyn Canvas) -> FrameStats {
        let vp = self.vp;
        canvas.clear(vp);

        self.time += self.cfg.time_step;
        let t = self.time;

        let cx = vp.width / 2.0;
        canvas.linear_gradient(
            (cx + t.sin() * cx, 0.0),
            (cx + t.cos() * cx, vp.height),
            &[(0.0, GRADIENT_FROM), (1.0, GRADIENT_TO)],
        );

        canvas.stroke_polyline(&scaled_outline(vp), OUTLINE, 1.5);

        for (i, p) in self.particles.iter_mut().enumerate() {
            p.advance(vp);
            canvas.fill_circle(
                (p.x, p.y),
                p.radius,
                PARTICLE.with_alpha(Self::particle_opacity(t, i)),
            );
        }

        let points: Vec<(f64, f64)> = self.particles.iter().map(|p| (p.x, p.y)).collect();
        let links = close_pairs(&points, self.cfg.link_distance);
        for l in &links {
            canvas.stroke_line(
                points[l.a],
                points[l.b],
                LINK.with_alpha(self.link_opacity(l.distance)),
                0.5,
            );
        }

        self.ripples
            .maybe_spawn(&mut self.rng, vp, self.cfg.ripple_probability);
        self.ripples.advance();
        for r in self.ripples.iter() {
            canvas.stroke_circle(
                (r.x, r.y),
                r.radius,
                RIPPLE.with_alpha(self.ripples.opacity(r)),
                1.0,
            );
        }

        FrameStats {
            particles: self.particles.len(),
            links: links.len(),
            ripples: self.ripples.len(),
        }
    }
}
