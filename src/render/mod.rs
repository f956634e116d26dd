use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use cosmic_text::{fontdb, Attrs, Buffer, FontSystem, Metrics, Shaping, Wrap};
use image::{imageops, RgbaImage};
use vello_cpu::kurbo::{
    Affine, BezPath, Cap, Ellipse, Join, Rect as KurboRect, Shape as _, Stroke,
};
use vello_cpu::peniko::{
    Blob, Color as PaintColor, FontData, ImageAlphaType, ImageData, ImageFormat, ImageSampler,
};
use vello_cpu::{Glyph, Image as CpuImage, ImageSource, Pixmap, RenderContext};

use crate::geometry::{Color, Point};
use crate::scene::{LineCap, SceneGraph, Shape, VisualObject, TEXT_LINE_HEIGHT_RATIO};

const CURVE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    pub include_background: bool,
    /// Draw transient objects such as the crop proposal.
    pub include_transient: bool,
}

impl CompositeOptions {
    /// Background plus every committed object; what gets exported.
    pub const EXPORT: Self = Self {
        include_background: true,
        include_transient: false,
    };
    /// Objects only, on a transparent canvas.
    pub const OVERLAY: Self = Self {
        include_background: false,
        include_transient: false,
    };
    /// Everything currently on screen.
    pub const PREVIEW: Self = Self {
        include_background: true,
        include_transient: true,
    };
}

pub fn composite(scene: &SceneGraph, options: CompositeOptions) -> RgbaImage {
    let size = scene.size();
    let (width, height) = (size.width.max(1), size.height.max(1));
    let layer = render_objects(scene, options.include_transient, width, height);
    if !options.include_background {
        return layer.unwrap_or_else(|| RgbaImage::new(width, height));
    }
    let mut canvas = render_background(scene);
    if let Some(layer) = layer {
        imageops::overlay(&mut canvas, &layer, 0, 0);
    }
    canvas
}

/// Background pixels only, without any objects.
pub fn render_background(scene: &SceneGraph) -> RgbaImage {
    let size = scene.size();
    let mut canvas = RgbaImage::new(size.width.max(1), size.height.max(1));
    if let Some(background) = scene.displayed_background() {
        imageops::replace(&mut canvas, background.as_ref(), 0, 0);
    }
    canvas
}

/// Rasterises the visible objects onto a transparent layer. `None` when
/// there is nothing to draw.
fn render_objects(
    scene: &SceneGraph,
    include_transient: bool,
    width: u32,
    height: u32,
) -> Option<RgbaImage> {
    let objects: Vec<&VisualObject> = scene
        .objects_in_z_order()
        .into_iter()
        .filter(|object| include_transient || !object.transient)
        .filter(|object| object.opacity > 0.0)
        .collect();
    if objects.is_empty() {
        return None;
    }
    let (Ok(ctx_width), Ok(ctx_height)) = (u16::try_from(width), u16::try_from(height)) else {
        tracing::warn!(width, height, "canvas exceeds rasteriser limits; objects skipped");
        return None;
    };

    let mut ctx = RenderContext::new(ctx_width, ctx_height);
    for object in objects {
        draw_object(&mut ctx, scene, object);
    }
    let mut pixmap = Pixmap::new(ctx_width, ctx_height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let bytes = pixmap
        .take_unpremultiplied()
        .into_iter()
        .flat_map(|pixel| [pixel.r, pixel.g, pixel.b, pixel.a])
        .collect();
    RgbaImage::from_raw(width, height, bytes)
}

fn object_transform(object: &VisualObject) -> Affine {
    Affine::translate((f64::from(object.x), f64::from(object.y)))
        * Affine::rotate(f64::from(object.angle).to_radians())
        * Affine::scale_non_uniform(f64::from(object.scale_x), f64::from(object.scale_y))
}

fn paint_color(color: Color) -> PaintColor {
    PaintColor::from_rgba8(color.r, color.g, color.b, color.a)
}

fn draw_object(ctx: &mut RenderContext, scene: &SceneGraph, object: &VisualObject) {
    let opacity = object.opacity.clamp(0.0, 1.0);
    ctx.set_transform(object_transform(object));
    ctx.set_paint_transform(Affine::IDENTITY);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }

    match &object.shape {
        Shape::Rectangle {
            width,
            height,
            stroke_width,
        } => {
            let rect = KurboRect::new(0.0, 0.0, f64::from(*width), f64::from(*height));
            if let Some(fill) = object.fill {
                ctx.set_paint(paint_color(fill));
                ctx.fill_rect(&rect);
            }
            if let Some(stroke) = object.stroke.filter(|_| *stroke_width > 0.0) {
                ctx.set_paint(paint_color(stroke));
                ctx.set_stroke(Stroke::new(f64::from(*stroke_width)).with_join(Join::Miter));
                ctx.stroke_rect(&rect);
            }
        }
        Shape::Ellipse { radius_x, radius_y } => {
            if let Some(fill) = object.fill {
                let (rx, ry) = (f64::from(*radius_x), f64::from(*radius_y));
                let ellipse = Ellipse::new((rx, ry), (rx, ry), 0.0);
                ctx.set_paint(paint_color(fill));
                ctx.fill_path(&ellipse.to_path(CURVE_TOLERANCE));
            }
        }
        Shape::Path {
            points,
            stroke_width,
            line_cap,
        } => {
            if let Some(color) = object.stroke.or(object.fill) {
                ctx.set_paint(paint_color(color));
                draw_stroke(ctx, points, f64::from(*stroke_width), *line_cap);
            }
        }
        Shape::Text { content, font_size } => {
            let color = object.fill.unwrap_or(Color::BLACK);
            ctx.set_paint(paint_color(color));
            draw_text(ctx, content, *font_size);
        }
        Shape::Image {
            bitmap,
            width,
            height,
            filters,
        } => match scene.bitmaps().get(*bitmap) {
            Some(source) => {
                let pixels = filters.apply(source);
                let (bitmap_width, bitmap_height) = pixels.dimensions();
                if bitmap_width > 0 && bitmap_height > 0 {
                    let stretch = Affine::scale_non_uniform(
                        f64::from(*width) / f64::from(bitmap_width),
                        f64::from(*height) / f64::from(bitmap_height),
                    );
                    ctx.set_transform(object_transform(object) * stretch);
                    ctx.set_paint(image_paint(pixels));
                    ctx.fill_rect(&KurboRect::new(
                        0.0,
                        0.0,
                        f64::from(bitmap_width),
                        f64::from(bitmap_height),
                    ));
                }
            }
            None => {
                tracing::warn!(id = %object.id, bitmap = %bitmap, "image object references missing bitmap");
            }
        },
    }

    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn image_paint(pixels: RgbaImage) -> CpuImage {
    let (width, height) = pixels.dimensions();
    let data = ImageData {
        data: Blob::from(pixels.into_raw()),
        format: ImageFormat::Rgba8,
        alpha_type: ImageAlphaType::Alpha,
        width,
        height,
    };
    CpuImage {
        image: ImageSource::from_peniko_image_data(&data),
        sampler: ImageSampler::default(),
    }
}

fn draw_stroke(ctx: &mut RenderContext, points: &[Point], width: f64, cap: LineCap) {
    let to_kurbo = |point: &Point| (f64::from(point.x), f64::from(point.y));
    match points {
        [] => {}
        [only] => {
            let (x, y) = to_kurbo(only);
            let half = width / 2.0;
            match cap {
                LineCap::Round => {
                    let dot = Ellipse::new((x, y), (half, half), 0.0);
                    ctx.fill_path(&dot.to_path(CURVE_TOLERANCE));
                }
                LineCap::Square => {
                    ctx.fill_rect(&KurboRect::new(x - half, y - half, x + half, y + half));
                }
            }
        }
        [first, rest @ ..] => {
            let mut path = BezPath::new();
            path.move_to(to_kurbo(first));
            for point in rest {
                path.line_to(to_kurbo(point));
            }
            let (cap, join) = match cap {
                LineCap::Round => (Cap::Round, Join::Round),
                LineCap::Square => (Cap::Square, Join::Miter),
            };
            ctx.set_stroke(Stroke::new(width).with_caps(cap).with_join(join));
            ctx.stroke_path(&path);
        }
    }
}

/// Shared font database; loading system fonts is expensive, so it happens
/// once, on the first text draw.
struct TextEngine {
    fonts: FontSystem,
    faces: HashMap<fontdb::ID, FontData>,
}

impl TextEngine {
    fn shared() -> &'static Mutex<TextEngine> {
        static ENGINE: OnceLock<Mutex<TextEngine>> = OnceLock::new();
        ENGINE.get_or_init(|| {
            let fonts = FontSystem::new();
            tracing::debug!(faces = fonts.db().len(), "font database loaded");
            Mutex::new(TextEngine {
                fonts,
                faces: HashMap::new(),
            })
        })
    }

    fn face(&mut self, id: fontdb::ID) -> Option<FontData> {
        if let Some(face) = self.faces.get(&id) {
            return Some(face.clone());
        }
        let index = self.fonts.db().face(id).map_or(0, |info| info.index);
        let font = self.fonts.get_font(id)?;
        let face = FontData::new(Blob::from(font.data().to_vec()), index);
        self.faces.insert(id, face.clone());
        Some(face)
    }

    /// Shapes `content` and groups the positioned glyphs by font face.
    fn layout(&mut self, content: &str, font_size: f32) -> Vec<(FontData, Vec<Glyph>)> {
        let metrics = Metrics::new(font_size, font_size * TEXT_LINE_HEIGHT_RATIO);
        let mut buffer = Buffer::new(&mut self.fonts, metrics);
        buffer.set_wrap(&mut self.fonts, Wrap::None);
        buffer.set_size(&mut self.fonts, f32::MAX, f32::MAX);
        buffer.set_text(&mut self.fonts, content, Attrs::new(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.fonts, false);

        let mut positioned: Vec<(fontdb::ID, Glyph)> = Vec::new();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                positioned.push((
                    glyph.font_id,
                    Glyph {
                        id: u32::from(glyph.glyph_id),
                        x: glyph.x,
                        y: run.line_y + glyph.y,
                    },
                ));
            }
        }

        let mut runs: Vec<(fontdb::ID, FontData, Vec<Glyph>)> = Vec::new();
        for (font_id, glyph) in positioned {
            match runs.last_mut() {
                Some((current, _, glyphs)) if *current == font_id => glyphs.push(glyph),
                _ => {
                    let Some(face) = self.face(font_id) else {
                        continue;
                    };
                    runs.push((font_id, face, vec![glyph]));
                }
            }
        }
        runs.into_iter().map(|(_, face, glyphs)| (face, glyphs)).collect()
    }
}

fn draw_text(ctx: &mut RenderContext, content: &str, font_size: f32) {
    if content.trim().is_empty() {
        return;
    }
    let runs = {
        let mut engine = TextEngine::shared()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if engine.fonts.db().len() == 0 {
            tracing::warn!("no fonts available; text object not drawn");
            return;
        }
        engine.layout(content, font_size)
    };
    for (face, glyphs) in runs {
        ctx.glyph_run(&face)
            .font_size(font_size)
            .fill_glyphs(glyphs.into_iter());
    }
}
