use super::*;
use crate::scene::plan::{DrawOp, Paint, ScenePlan};

#[test]
fn premul_matches_straight_for_opaque() {
    assert_eq!(premul_rgba8(10, 20, 30, 255), [10, 20, 30, 255]);
    assert_eq!(premul_rgba8(255, 0, 0, 128), [128, 0, 0, 128]);
}

#[test]
fn premul_lerp_hits_both_endpoints() {
    let a = Rgba8::opaque(10, 20, 30);
    let b = Rgba8::opaque(200, 100, 50);
    assert_eq!(premul_lerp(a, b, 0.0), [10, 20, 30, 255]);
    assert_eq!(premul_lerp(a, b, 1.0), [200, 100, 50, 255]);
}

#[test]
fn linear_ramp_interpolates_top_to_bottom() {
    let top = Rgba8::opaque(0, 0, 0);
    let bottom = Rgba8::opaque(255, 255, 255);
    let bytes = linear_ramp_bytes(top, bottom, 2, 3);
    assert_eq!(bytes.len(), 2 * 3 * 4);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);
    // middle row is the midpoint
    assert_eq!(bytes[2 * 4], 128);
    // last row is the bottom stop
    assert_eq!(&bytes[2 * 2 * 4..2 * 2 * 4 + 4], &[255, 255, 255, 255]);
}

#[test]
fn radial_ramp_fades_outward() {
    let inner = Rgba8::new(100, 100, 100, 255);
    let outer = Rgba8::new(100, 100, 100, 0);
    // Pixels are sampled at their centers, so the center pixel sits at
    // distance sqrt(0.5) from (8, 8); inner_radius = 1.0 keeps it inside
    // the inner stop.
    let bytes = radial_ramp_bytes(8.0, 8.0, 1.0, 6.0, inner, outer, 16, 16);

    let alpha_at = |x: usize, y: usize| bytes[(y * 16 + x) * 4 + 3];
    assert_eq!(alpha_at(8, 8), 255);
    assert_eq!(alpha_at(0, 0), 0);
    let mid = alpha_at(10, 8);
    assert!(mid > 0 && mid < 255);
}

#[test]
fn bezpath_conversion_preserves_element_count() {
    let mut path = kurbo::BezPath::new();
    path.move_to(kurbo::Point::new(0.0, 0.0));
    path.line_to(kurbo::Point::new(4.0, 0.0));
    path.curve_to(
        kurbo::Point::new(5.0, 1.0),
        kurbo::Point::new(6.0, 2.0),
        kurbo::Point::new(7.0, 3.0),
    );
    path.close_path();

    let cpu = bezpath_to_cpu(&path);
    assert_eq!(cpu.elements().len(), path.elements().len());
}

// Raster smoke test; skipped when no system font is available, since the
// backend registers a face at construction.
#[test]
fn renders_gradient_rect_without_text() {
    let Ok(font_bytes) = crate::render::text::resolve_font_bytes(None) else {
        return;
    };

    let canvas = crate::foundation::core::Canvas {
        width: 8,
        height: 8,
    };
    let mut plan = ScenePlan::new(canvas);
    plan.push(DrawOp::FillRect {
        rect: kurbo::Rect::new(0.0, 0.0, 8.0, 8.0),
        paint: Paint::LinearGradientV {
            top: Rgba8::opaque(255, 0, 0),
            bottom: Rgba8::opaque(0, 0, 255),
        },
        opacity: 1.0,
    });

    let mut backend =
        CpuBackend::new(RenderSettings::default(), Arc::new(font_bytes)).unwrap();
    let frame = backend.render_plan(&plan).unwrap();
    assert_eq!(frame.width, 8);
    assert_eq!(frame.height, 8);
    assert_eq!(frame.data.len(), 8 * 8 * 4);

    // Top row leans red, bottom row leans blue.
    let top = &frame.data[0..4];
    let bottom_off = (7 * 8) * 4;
    let bottom = &frame.data[bottom_off..bottom_off + 4];
    assert!(top[0] > top[2], "top row should lean red: {top:?}");
    assert!(bottom[2] > bottom[0], "bottom row should lean blue: {bottom:?}");
}
