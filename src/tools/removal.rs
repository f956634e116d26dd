use image::{Rgba, RgbaImage};

use super::brush::is_mask_stroke;
use crate::filter::{FilterKind, FilterStack};
use crate::geometry::{CanvasSize, Point, Rect};
use crate::scene::{BitmapId, ObjectId, Shape, VisualObject};

pub const PATCH_BLUR: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct RemovalPlan {
    pub mask_ids: Vec<ObjectId>,
    /// Combined bounding rectangle of every mask stroke, clipped to the canvas.
    pub bounds: Rect,
    /// Background region the patch pixels are sampled from.
    pub source: Rect,
}

/// Collects committed mask strokes; `None` when nothing on the canvas has
/// been masked.
pub fn plan_removal<'a>(
    objects: impl IntoIterator<Item = &'a VisualObject>,
    canvas: CanvasSize,
) -> Option<RemovalPlan> {
    let mut mask_ids = Vec::new();
    let mut bounds: Option<Rect> = None;
    for object in objects {
        if object.transient || !is_mask_stroke(object) {
            continue;
        }
        mask_ids.push(object.id);
        let rect = object.bounding_rect();
        bounds = Some(match bounds {
            Some(current) => current.union(&rect),
            None => rect,
        });
    }
    let bounds = bounds?.intersect(&canvas.bounds())?;
    let source = Rect::new(
        (bounds.x - bounds.width).max(0.0),
        bounds.y,
        bounds.width,
        bounds.height,
    );
    Some(RemovalPlan {
        mask_ids,
        bounds,
        source,
    })
}

/// Copies `source` out of `background`; pixels outside it stay transparent.
pub fn sample_patch(background: &RgbaImage, source: Rect) -> RgbaImage {
    let width = source.width.ceil().max(1.0) as u32;
    let height = source.height.ceil().max(1.0) as u32;
    let origin_x = source.x.floor() as i64;
    let origin_y = source.y.floor() as i64;
    RgbaImage::from_fn(width, height, |x, y| {
        let sx = origin_x + i64::from(x);
        let sy = origin_y + i64::from(y);
        match (u32::try_from(sx), u32::try_from(sy)) {
            (Ok(sx), Ok(sy)) if sx < background.width() && sy < background.height() => {
                *background.get_pixel(sx, sy)
            }
            _ => Rgba([0, 0, 0, 0]),
        }
    })
}

/// Non-interactive image object covering `bounds`, softened by a small blur.
pub fn patch_object(bitmap: BitmapId, bounds: Rect) -> VisualObject {
    let mut filters = FilterStack::new();
    filters.set(FilterKind::Blur, PATCH_BLUR);
    VisualObject::new(
        Point::new(bounds.x, bounds.y),
        Shape::Image {
            bitmap,
            width: bounds.width.max(1.0),
            height: bounds.height.max(1.0),
            filters,
        },
    )
    .non_interactive()
}
