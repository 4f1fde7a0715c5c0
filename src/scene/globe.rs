use std::f64::consts::PI;

use kurbo::{BezPath, Circle, Ellipse, Point, Rect, Shape};

use crate::{
    foundation::core::{ClipParams, FrameIndex, Rgba8},
    foundation::error::{ReelError, ReelResult},
    scene::plan::{DrawOp, Paint, ScenePlan, TextAnchor},
};

// Palette of the reel. Hex values mirror the published clip.
const BG_TOP: Rgba8 = Rgba8::opaque(0x0a, 0x0f, 0x1f);
const BG_BOTTOM: Rgba8 = Rgba8::opaque(0x02, 0x04, 0x09);
const GRID: Rgba8 = Rgba8::opaque(0x1c, 0x2a, 0x4a);
const SPHERE: Rgba8 = Rgba8::opaque(0x0e, 0xa5, 0xe9);
const SPHERE_HALO: Rgba8 = Rgba8::opaque(0x06, 0xb6, 0xd4);
const WIRE: Rgba8 = Rgba8::new(0x38, 0xbd, 0xf8, 178);
const NODE: Rgba8 = Rgba8::opaque(0x22, 0xd3, 0xee);
const CIRCUIT: Rgba8 = Rgba8::opaque(0x60, 0xa5, 0xfa);
const TITLE: Rgba8 = Rgba8::opaque(0xe2, 0xe8, 0xf0);
const SUBTITLE: Rgba8 = Rgba8::opaque(0x93, 0xc5, 0xfd);

const GRID_SPACING: f64 = 32.0;
const LAT_RINGS: u32 = 8;
const LON_LINES: u32 = 14;
const ORBIT_NODES: u32 = 90;
const CIRCUIT_LINES: u32 = 30;
/// Vertical sampling step for longitude arcs, in pixels.
const LON_SAMPLE_STEP: f64 = 2.0;

const TITLE_TEXT: &str = "AI COVERS THE WORLD";
const SUBTITLE_TEXT: &str = "Instagram Reel \u{2022} 720x1280 \u{2022} 5s \u{2022} 24fps";
const FOOTER_TEXT: &str = "The AI era is global.";

/// Paint one frame of the rotating-globe animation as a [`ScenePlan`].
///
/// Deterministic: the plan depends only on `params` and `frame`. Stages are
/// layered in a fixed order; later ops draw over earlier ones.
#[tracing::instrument(skip(params))]
pub fn synthesize_frame(params: &ClipParams, frame: FrameIndex) -> ReelResult<ScenePlan> {
    params.validate()?;
    if !params.contains(frame) {
        return Err(ReelError::validation(format!(
            "frame index {} out of range (clip has {} frames)",
            frame.0,
            params.frame_count()
        )));
    }

    let t = params.time_at(frame);
    let w = f64::from(params.canvas.width);
    let h = f64::from(params.canvas.height);

    let cx = w / 2.0;
    let cy = h * 0.48;
    let r = w.min(h) * 0.32;
    let rotation = t * PI * 0.8;

    let mut plan = ScenePlan::new(params.canvas);
    push_background(&mut plan, w, h);
    push_grid(&mut plan, w, h);
    push_glow(&mut plan, cx, cy, r, w, h);
    push_sphere_outline(&mut plan, cx, cy, r);
    push_latitude_rings(&mut plan, cx, cy, r);
    push_longitude_lines(&mut plan, cx, cy, r, rotation);
    push_orbit_nodes(&mut plan, cx, cy, r, rotation, t);
    push_circuit_lines(&mut plan, cx, cy, r, rotation, t);
    push_text(&mut plan, w, h, t);
    Ok(plan)
}

fn push_background(plan: &mut ScenePlan, w: f64, h: f64) {
    plan.push(DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, w, h),
        paint: Paint::LinearGradientV {
            top: BG_TOP,
            bottom: BG_BOTTOM,
        },
        opacity: 1.0,
    });
}

fn push_grid(plan: &mut ScenePlan, w: f64, h: f64) {
    let mut path = BezPath::new();
    let mut x = 0.0;
    while x < w {
        path.move_to(Point::new(x, 0.0));
        path.line_to(Point::new(x, h));
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y < h {
        path.move_to(Point::new(0.0, y));
        path.line_to(Point::new(w, y));
        y += GRID_SPACING;
    }
    plan.push(DrawOp::StrokePath {
        path,
        color: GRID,
        width: 1.0,
        opacity: 0.12,
    });
}

fn push_glow(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64, w: f64, h: f64) {
    plan.push(DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, w, h),
        paint: Paint::RadialGradient {
            center: Point::new(cx, cy),
            inner_radius: r * 0.4,
            outer_radius: r * 1.1,
            inner: SPHERE.with_alpha(26),
            outer: SPHERE.with_alpha(0),
        },
        opacity: 1.0,
    });
}

fn push_sphere_outline(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64) {
    let circle = Circle::new(Point::new(cx, cy), r).to_path(0.1);
    // Two soft halo strokes stand in for the blurred shadow of the source
    // rendering; the result is deterministic and rasterizer-independent.
    plan.push(DrawOp::StrokePath {
        path: circle.clone(),
        color: SPHERE_HALO,
        width: 12.0,
        opacity: 0.10,
    });
    plan.push(DrawOp::StrokePath {
        path: circle.clone(),
        color: SPHERE_HALO,
        width: 6.0,
        opacity: 0.20,
    });
    plan.push(DrawOp::StrokePath {
        path: circle,
        color: SPHERE,
        width: 2.0,
        opacity: 1.0,
    });
}

fn push_latitude_rings(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64) {
    // Horizontal ellipses whose vertical radius shrinks toward the poles.
    for i in 1..LAT_RINGS {
        let lat = f64::from(i) / f64::from(LAT_RINGS) * PI - PI / 2.0;
        let ry = (r * lat.cos()).max(0.0);
        let y = cy + r * lat.sin();
        plan.push(DrawOp::StrokePath {
            path: Ellipse::new(Point::new(cx, y), (r, ry), 0.0).to_path(0.1),
            color: WIRE,
            width: 1.2,
            opacity: 1.0,
        });
    }
}

fn push_longitude_lines(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64, rotation: f64) {
    // Meridians of the rotating sphere: each arc is the projection of a great
    // circle at longitude `lon`, sampled along the vertical extent.
    for j in 0..LON_LINES {
        let lon = f64::from(j) / f64::from(LON_LINES) * PI * 2.0 + rotation;
        let cos = lon.cos();
        let mut path = BezPath::new();
        let mut k = -r;
        let mut first = true;
        while k <= r {
            let x = cx + (r * r - k * k).max(0.0).sqrt() * cos;
            let y = cy + k;
            if first {
                path.move_to(Point::new(x, y));
                first = false;
            } else {
                path.line_to(Point::new(x, y));
            }
            k += LON_SAMPLE_STEP;
        }
        plan.push(DrawOp::StrokePath {
            path,
            color: WIRE,
            width: 1.2,
            opacity: 1.0,
        });
    }
}

fn push_orbit_nodes(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64, rotation: f64, t: f64) {
    for n in 0..ORBIT_NODES {
        let a = f64::from(n) / f64::from(ORBIT_NODES) * PI * 2.0 + rotation * 1.6;
        let rr = r * (0.85 + 0.1 * (f64::from(n) * 0.7 + t * 2.0).sin());
        let x = cx + rr * a.cos();
        let y = cy + rr * a.sin() * 0.6;
        let size = 2.0 + 1.5 * (a * 3.0 + t * 5.0).sin();
        plan.push(DrawOp::FillPath {
            path: Circle::new(Point::new(x, y), size).to_path(0.1),
            color: NODE,
            opacity: 0.8,
        });
    }
}

fn push_circuit_lines(plan: &mut ScenePlan, cx: f64, cy: f64, r: f64, rotation: f64, t: f64) {
    let mut path = BezPath::new();
    for i in 0..CIRCUIT_LINES {
        let ang = f64::from(i) / f64::from(CIRCUIT_LINES) * PI * 2.0 + rotation * 0.5;
        let reach = r + 120.0 + 40.0 * (t * 2.0 + f64::from(i)).sin();
        path.move_to(Point::new(cx + r * ang.cos(), cy + r * ang.sin()));
        path.line_to(Point::new(cx + reach * ang.cos(), cy + reach * ang.sin()));
    }
    plan.push(DrawOp::StrokePath {
        path,
        color: CIRCUIT,
        width: 1.0,
        opacity: 0.25,
    });
}

fn push_text(plan: &mut ScenePlan, w: f64, h: f64, t: f64) {
    plan.push(DrawOp::Text {
        content: TITLE_TEXT.to_string(),
        size_px: 54.0,
        origin: Point::new(w / 2.0, h * 0.1),
        color: TITLE,
        opacity: 1.0,
        anchor: TextAnchor::Center,
        bold: true,
    });
    plan.push(DrawOp::Text {
        content: SUBTITLE_TEXT.to_string(),
        size_px: 22.0,
        origin: Point::new(w / 2.0, h * 0.14),
        color: SUBTITLE,
        opacity: 1.0,
        anchor: TextAnchor::Center,
        bold: false,
    });

    let pulse = 0.5 + 0.5 * (t * 6.0).sin();
    let alpha = ((0.6 + pulse * 0.3) * 255.0).round().clamp(0.0, 255.0) as u8;
    plan.push(DrawOp::Text {
        content: FOOTER_TEXT.to_string(),
        size_px: 26.0,
        origin: Point::new(w / 2.0, h * 0.9),
        color: NODE.with_alpha(alpha),
        opacity: 0.8,
        anchor: TextAnchor::Center,
        bold: true,
    });
}

#[cfg(test)]
#[path = "../../tests/unit/scene/globe.rs"]
mod tests;
