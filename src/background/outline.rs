use super::particle::Viewport;

/// Stylized outline of India in normalized `[0, 1]` viewport coordinates.
pub const INDIA_OUTLINE: &[(f64, f64)] = &[
    (0.45, 0.15),
    (0.48, 0.12),
    (0.52, 0.14),
    (0.55, 0.18),
    (0.53, 0.22),
    (0.58, 0.26),
    (0.64, 0.28),
    (0.68, 0.27),
    (0.70, 0.31),
    (0.66, 0.36),
    (0.62, 0.38),
    (0.60, 0.44),
    (0.57, 0.52),
    (0.55, 0.60),
    (0.52, 0.68),
    (0.50, 0.75),
    (0.48, 0.80),
    (0.46, 0.74),
    (0.44, 0.66),
    (0.42, 0.58),
    (0.40, 0.50),
    (0.37, 0.44),
    (0.35, 0.40),
    (0.38, 0.36),
    (0.37, 0.30),
    (0.40, 0.25),
    (0.43, 0.20),
    (0.45, 0.15),
];

/// Outline scaled to pixel coordinates.
pub fn scaled_outline(vp: Viewport) -> Vec<(f64, f64)> {
    INDIA_OUTLINE
        .iter()
        .map(|&(x, y)| (x * vp.width, y * vp.height))
        .collect()
}
