use std::{collections::HashMap, sync::Arc};

use crate::{
    foundation::core::Rgba8,
    foundation::error::{ReelError, ReelResult},
    render::backend::{FrameRGBA, RenderBackend, RenderSettings},
    render::text::{TextBrush, TextLayoutEngine},
    scene::plan::{DrawOp, Paint, ScenePlan, TextAnchor},
};

/// CPU rasterizer for [`ScenePlan`]s built on `vello_cpu`.
///
/// Gradients are realized as CPU-computed ramp images used as paints, and
/// strokes are expanded to fill regions with kurbo before rasterization.
pub struct CpuBackend {
    settings: RenderSettings,
    text_engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    gradient_cache: HashMap<PaintKey, vello_cpu::Image>,
    layout_cache: HashMap<LayoutKey, Arc<parley::Layout<TextBrush>>>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum PaintKey {
    LinearV {
        top: [u8; 4],
        bottom: [u8; 4],
        w: u32,
        h: u32,
    },
    Radial {
        // f64 params keyed by bit pattern; inputs are deterministic.
        cx: u64,
        cy: u64,
        r0: u64,
        r1: u64,
        inner: [u8; 4],
        outer: [u8; 4],
        w: u32,
        h: u32,
    },
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    content: String,
    size_bits: u32,
    bold: bool,
}

impl CpuBackend {
    pub fn new(settings: RenderSettings, font_bytes: Arc<Vec<u8>>) -> ReelResult<Self> {
        let text_engine = TextLayoutEngine::new(&font_bytes)?;
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            settings,
            text_engine,
            font,
            gradient_cache: HashMap::new(),
            layout_cache: HashMap::new(),
        })
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(&mut self, plan: &ScenePlan) -> ReelResult<FrameRGBA> {
        let width_u16: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| ReelError::validation("canvas width exceeds u16"))?;
        let height_u16: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| ReelError::validation("canvas height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            clear_pixmap(&mut pixmap, premul_rgba8(r, g, b, a));
        }

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        for op in &plan.ops {
            self.draw_op(&mut ctx, op)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

impl CpuBackend {
    fn draw_op(&mut self, ctx: &mut vello_cpu::RenderContext, op: &DrawOp) -> ReelResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::FillRect {
                rect,
                paint,
                opacity,
            } => {
                match paint {
                    Paint::Solid(color) => {
                        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                            rect.x0, rect.y0,
                        )));
                        ctx.set_paint(to_color(*color));
                    }
                    Paint::LinearGradientV { top, bottom } => {
                        let w = rect.width().ceil().max(1.0) as u32;
                        let h = rect.height().ceil().max(1.0) as u32;
                        let img = self.linear_gradient_paint(*top, *bottom, w, h)?;
                        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                            rect.x0, rect.y0,
                        )));
                        ctx.set_paint(img);
                    }
                    Paint::RadialGradient {
                        center,
                        inner_radius,
                        outer_radius,
                        inner,
                        outer,
                    } => {
                        let w = rect.width().ceil().max(1.0) as u32;
                        let h = rect.height().ceil().max(1.0) as u32;
                        let img = self.radial_gradient_paint(
                            center.x - rect.x0,
                            center.y - rect.y0,
                            *inner_radius,
                            *outer_radius,
                            *inner,
                            *outer,
                            w,
                            h,
                        )?;
                        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                            rect.x0, rect.y0,
                        )));
                        ctx.set_paint(img);
                    }
                }

                with_opacity(ctx, *opacity, |ctx| {
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        0.0,
                        0.0,
                        rect.width(),
                        rect.height(),
                    ));
                });
                Ok(())
            }
            DrawOp::FillPath {
                path,
                color,
                opacity,
            } => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(to_color(*color));
                let cpu_path = bezpath_to_cpu(path);
                with_opacity(ctx, *opacity, |ctx| ctx.fill_path(&cpu_path));
                Ok(())
            }
            DrawOp::StrokePath {
                path,
                color,
                width,
                opacity,
            } => {
                let expanded = kurbo::stroke(
                    path.elements().iter().copied(),
                    &kurbo::Stroke::new(*width),
                    &kurbo::StrokeOpts::default(),
                    0.25,
                );
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(to_color(*color));
                let cpu_path = bezpath_to_cpu(&expanded);
                with_opacity(ctx, *opacity, |ctx| ctx.fill_path(&cpu_path));
                Ok(())
            }
            DrawOp::Text {
                content,
                size_px,
                origin,
                color,
                opacity,
                anchor,
                bold,
            } => {
                let layout = self.layout_for(content, *size_px, *bold)?;
                let width = f64::from(layout.width());
                let baseline = layout
                    .lines()
                    .next()
                    .map(|l| f64::from(l.metrics().baseline))
                    .unwrap_or(0.0);
                let tx = match anchor {
                    TextAnchor::Center => origin.x - width / 2.0,
                };
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    tx,
                    origin.y - baseline,
                )));
                ctx.set_paint(to_color(*color));

                let font = self.font.clone();
                with_opacity(ctx, *opacity, |ctx| {
                    for line in layout.lines() {
                        for item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(&font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                });
                Ok(())
            }
        }
    }

    fn layout_for(
        &mut self,
        content: &str,
        size_px: f32,
        bold: bool,
    ) -> ReelResult<Arc<parley::Layout<TextBrush>>> {
        let key = LayoutKey {
            content: content.to_string(),
            size_bits: size_px.to_bits(),
            bold,
        };
        if let Some(layout) = self.layout_cache.get(&key) {
            return Ok(layout.clone());
        }
        let layout = Arc::new(self.text_engine.layout_line(content, size_px, bold)?);
        self.layout_cache.insert(key, layout.clone());
        Ok(layout)
    }

    fn linear_gradient_paint(
        &mut self,
        top: Rgba8,
        bottom: Rgba8,
        w: u32,
        h: u32,
    ) -> ReelResult<vello_cpu::Image> {
        let key = PaintKey::LinearV {
            top: [top.r, top.g, top.b, top.a],
            bottom: [bottom.r, bottom.g, bottom.b, bottom.a],
            w,
            h,
        };
        if let Some(img) = self.gradient_cache.get(&key).cloned() {
            return Ok(img);
        }

        let bytes = linear_ramp_bytes(top, bottom, w, h);
        let img = premul_bytes_to_image(&bytes, w, h)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }

    #[allow(clippy::too_many_arguments)]
    fn radial_gradient_paint(
        &mut self,
        cx: f64,
        cy: f64,
        inner_radius: f64,
        outer_radius: f64,
        inner: Rgba8,
        outer: Rgba8,
        w: u32,
        h: u32,
    ) -> ReelResult<vello_cpu::Image> {
        if !(outer_radius > inner_radius) || inner_radius < 0.0 {
            return Err(ReelError::validation(
                "radial gradient requires 0 <= inner_radius < outer_radius",
            ));
        }
        let key = PaintKey::Radial {
            cx: cx.to_bits(),
            cy: cy.to_bits(),
            r0: inner_radius.to_bits(),
            r1: outer_radius.to_bits(),
            inner: [inner.r, inner.g, inner.b, inner.a],
            outer: [outer.r, outer.g, outer.b, outer.a],
            w,
            h,
        };
        if let Some(img) = self.gradient_cache.get(&key).cloned() {
            return Ok(img);
        }

        let bytes = radial_ramp_bytes(cx, cy, inner_radius, outer_radius, inner, outer, w, h);
        let img = premul_bytes_to_image(&bytes, w, h)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }
}

fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f32,
    f: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
        f(ctx);
        ctx.pop_layer();
    } else {
        f(ctx);
    }
}

fn to_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let premul = |c: u8| -> u8 { (((u16::from(c) * u16::from(a)) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

/// Lerp two straight-alpha colors at `t` and premultiply the result.
fn premul_lerp(a: Rgba8, b: Rgba8, t: f64) -> [u8; 4] {
    let lerp = |x: u8, y: u8| -> u8 {
        (f64::from(x) + (f64::from(y) - f64::from(x)) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    premul_rgba8(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b), lerp(a.a, b.a))
}

fn linear_ramp_bytes(top: Rgba8, bottom: Rgba8, w: u32, h: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    let h1 = (h.max(1) - 1) as f64;
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { f64::from(y) / h1 };
        let c = premul_lerp(top, bottom, t);
        for x in 0..w {
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&c);
        }
    }
    bytes
}

#[allow(clippy::too_many_arguments)]
fn radial_ramp_bytes(
    cx: f64,
    cy: f64,
    inner_radius: f64,
    outer_radius: f64,
    inner: Rgba8,
    outer: Rgba8,
    w: u32,
    h: u32,
) -> Vec<u8> {
    let span = outer_radius - inner_radius;
    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    for y in 0..h {
        for x in 0..w {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let t = ((d - inner_radius) / span).clamp(0.0, 1.0);
            let c = premul_lerp(inner, outer, t);
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx..idx + 4].copy_from_slice(&c);
        }
    }
    bytes
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn premul_bytes_to_image(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::validation("gradient width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::validation("gradient height exceeds u16"))?;
    if bytes.len() != width as usize * height as usize * 4 {
        return Err(ReelError::validation("gradient byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in bytes.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(
            vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities),
        )),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
