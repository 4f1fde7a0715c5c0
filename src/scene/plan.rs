use kurbo::{BezPath, Point, Rect};

use crate::foundation::core::{Canvas, Rgba8};

/// Backend-agnostic list of draw operations for a single frame.
///
/// A plan is a pure product of the clip constants and a frame index: equal
/// inputs must yield structurally equal plans. This is what makes synthesis
/// testable without pixel-exact comparisons, which may legitimately differ
/// between rasterizer versions.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

impl ScenePlan {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

/// Fill paint for rect ops. Gradients are described here and realized by the
/// backend (as CPU-computed ramp images on the CPU backend).
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba8),
    /// Vertical two-stop gradient spanning the rect top to bottom.
    LinearGradientV { top: Rgba8, bottom: Rgba8 },
    /// Radial two-stop gradient; `center` is in canvas coordinates.
    RadialGradient {
        center: Point,
        inner_radius: f64,
        outer_radius: f64,
        inner: Rgba8,
        outer: Rgba8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// `origin.x` is the horizontal center of the laid-out line.
    Center,
}

/// One draw operation. Ops are executed strictly in plan order; later ops
/// paint over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        paint: Paint,
        opacity: f32,
    },
    FillPath {
        path: BezPath,
        color: Rgba8,
        opacity: f32,
    },
    /// Stroked outline; the backend expands the stroke to a fill region.
    StrokePath {
        path: BezPath,
        color: Rgba8,
        width: f64,
        opacity: f32,
    },
    /// A single line of text. Content and style only; glyph layout is a
    /// backend concern so plans stay independent of the resolved font.
    Text {
        content: String,
        size_px: f32,
        origin: Point,
        color: Rgba8,
        opacity: f32,
        anchor: TextAnchor,
        bold: bool,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/scene/plan.rs"]
mod tests;
