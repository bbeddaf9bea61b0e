//! Drawing surface abstraction.
//!
//! The scene only talks to [`Canvas`]. `RecordingCanvas` keeps the draw calls
//! for inspection; `SvgCanvas` serializes one frame as an SVG document.

use std::fmt::Write as _;

use super::particle::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

pub type Point = (f64, f64);

pub trait Canvas {
    fn clear(&mut self, vp: Viewport);
    fn linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, Rgba)]);
    fn stroke_polyline(&mut self, points: &[Point], color: Rgba, width: f64);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, width: f64);
    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Viewport),
    Gradient {
        from: Point,
        to: Point,
        stops: Vec<(f64, Rgba)>,
    },
    Polyline {
        points: Vec<Point>,
        color: Rgba,
        width: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    Line {
        from: Point,
        to: Point,
        color: Rgba,
        width: f64,
    },
    Ring {
        center: Point,
        radius: f64,
        color: Rgba,
        width: f64,
    },
}

#[derive(Debug, Default, Clone)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, vp: Viewport) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(vp));
    }

    fn linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, Rgba)]) {
        self.ops.push(DrawOp::Gradient {
            from,
            to,
            stops: stops.to_vec(),
        });
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Rgba, width: f64) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64) {
        self.ops.push(DrawOp::Ring {
            center,
            radius,
            color,
            width,
        });
    }
}

/// Serializes one frame to SVG.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    vp: Viewport,
    defs: String,
    body: String,
    gradients: usize,
}

impl SvgCanvas {
    pub fn new(vp: Viewport) -> Self {
        Self {
            vp,
            defs: String::new(),
            body: String::new(),
            gradients: 0,
        }
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs>{defs}</defs>{body}</svg>"#,
            w = self.vp.width,
            h = self.vp.height,
            defs = self.defs,
            body = self.body
        )
    }
}

fn rgb(c: Rgba) -> String {
    format!("rgb({},{},{})", c.r, c.g, c.b)
}

impl Canvas for SvgCanvas {
    fn clear(&mut self, vp: Viewport) {
        self.vp = vp;
        self.defs.clear();
        self.body.clear();
        self.gradients = 0;
    }

    fn linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, Rgba)]) {
        self.gradients += 1;
        let id = format!("bg{}", self.gradients);
        let _ = write!(
            self.defs,
            r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}">"#,
            from.0, from.1, to.0, to.1
        );
        for (offset, c) in stops {
            let _ = write!(
                self.defs,
                r#"<stop offset="{:.3}" stop-color="{}" stop-opacity="{:.3}"/>"#,
                offset,
                rgb(*c),
                c.a
            );
        }
        self.defs.push_str("</linearGradient>");
        let _ = write!(
            self.body,
            r#"<rect width="100%" height="100%" fill="url(#{id})"/>"#
        );
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Rgba, width: f64) {
        let pts: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        let _ = write!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.1}"/>"#,
            pts.join(" "),
            rgb(color),
            color.a,
            width
        );
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        let _ = write!(
            self.body,
            r#"<circle cx="{:.1}" cy="{:.1}" r="{:.2}" fill="{}" fill-opacity="{:.3}"/>"#,
            center.0,
            center.1,
            radius,
            rgb(color),
            color.a
        );
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        let _ = write!(
            self.body,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.1}"/>"#,
            from.0,
            from.1,
            to.0,
            to.1,
            rgb(color),
            color.a,
            width
        );
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: Rgba, width: f64) {
        let _ = write!(
            self.body,
            r#"<circle cx="{:.1}" cy="{:.1}" r="{:.2}" fill="none" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.1}"/>"#,
            center.0,
            center.1,
            radius,
            rgb(color),
            color.a,
            width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_contains_drawn_shapes() {
        let vp = Viewport::new(200.0, 100.0).unwrap();
        let mut c = SvgCanvas::new(vp);
        c.clear(vp);
        c.linear_gradient(
            (0.0, 0.0),
            (200.0, 100.0),
            &[(0.0, Rgba::new(0, 0, 0, 1.0)), (1.0, Rgba::new(255, 255, 255, 1.0))],
        );
        c.fill_circle((10.0, 10.0), 2.0, Rgba::new(1, 2, 3, 0.5));
        c.stroke_line((0.0, 0.0), (5.0, 5.0), Rgba::new(1, 2, 3, 0.1), 1.0);
        let svg = c.finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"fill="url(#bg1)""#));
        assert!(svg.contains("<circle cx=\"10.0\""));
        assert!(svg.contains("<line "));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn recording_clear_resets_ops() {
        let vp = Viewport::new(10.0, 10.0).unwrap();
        let mut c = RecordingCanvas::new();
        c.fill_circle((1.0, 1.0), 1.0, Rgba::new(0, 0, 0, 1.0));
        c.clear(vp);
        assert_eq!(c.ops, vec![DrawOp::Clear(vp)]);
    }
}
