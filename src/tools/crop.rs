use image::{imageops, RgbaImage};

use crate::error::{EngineError, EngineResult};
use crate::geometry::{CanvasSize, Color, Point, Rect};
use crate::scene::{Shape, VisualObject};

/// Share of each canvas dimension the initial proposal may occupy.
const PROPOSAL_FRACTION: f32 = 0.8;
const PROPOSAL_FILL: Color = Color::rgba(0, 0, 0, 77);
const PROPOSAL_STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    Free,
    Ratio16x9,
    Ratio1x1,
    Ratio9x16,
    Original,
}

impl CropPreset {
    pub const ALL: [CropPreset; 5] = [
        Self::Free,
        Self::Ratio16x9,
        Self::Ratio1x1,
        Self::Ratio9x16,
        Self::Original,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Ratio16x9 => "16:9",
            Self::Ratio1x1 => "1:1",
            Self::Ratio9x16 => "9:16",
            Self::Original => "Original",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(value.trim()))
    }

    pub const fn ratio(self) -> Option<(u32, u32)> {
        match self {
            Self::Ratio16x9 => Some((16, 9)),
            Self::Ratio1x1 => Some((1, 1)),
            Self::Ratio9x16 => Some((9, 16)),
            Self::Free | Self::Original => None,
        }
    }

    /// Effective aspect ratio; `Original` follows the canvas dimensions.
    pub fn resolve_ratio(self, width: u32, height: u32) -> Option<(u32, u32)> {
        self.ratio().or_else(|| {
            (self == Self::Original).then_some((width.max(1), height.max(1)))
        })
    }

    /// Initial proposal bounds: the largest rectangle of the preset ratio that
    /// fits inside 80% of the canvas, centred. `Free` takes 80% of each axis.
    pub fn proposal(self, canvas: CanvasSize) -> Rect {
        let max_width = (canvas.width as f32 * PROPOSAL_FRACTION).floor().max(1.0) as u32;
        let max_height = (canvas.height as f32 * PROPOSAL_FRACTION).floor().max(1.0) as u32;
        let (width, height) = match self.resolve_ratio(canvas.width, canvas.height) {
            Some((ratio_x, ratio_y)) => adjust_ratio_to_fit(max_width, max_height, ratio_x, ratio_y),
            None => (max_width, max_height),
        };
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Rect::new(
            ((canvas.width as f32 - width) / 2.0).floor(),
            ((canvas.height as f32 - height) / 2.0).floor(),
            width,
            height,
        )
    }
}

/// The semi-transparent rectangle shown while cropping.
pub fn proposal_object(bounds: Rect) -> VisualObject {
    VisualObject::new(
        Point::new(bounds.x, bounds.y),
        Shape::Rectangle {
            width: bounds.width,
            height: bounds.height,
            stroke_width: PROPOSAL_STROKE_WIDTH,
        },
    )
    .with_fill(PROPOSAL_FILL)
    .with_stroke(Color::WHITE)
}

/// Integer pixel region of `bounds` clipped to the canvas.
pub fn crop_region(bounds: Rect, canvas: CanvasSize) -> EngineResult<(u32, u32, u32, u32)> {
    let left = bounds.x.round().clamp(0.0, canvas.width as f32) as u32;
    let top = bounds.y.round().clamp(0.0, canvas.height as f32) as u32;
    let right = bounds.right().round().clamp(0.0, canvas.width as f32) as u32;
    let bottom = bounds.bottom().round().clamp(0.0, canvas.height as f32) as u32;
    if right <= left || bottom <= top {
        return Err(EngineError::invalid_geometry(
            "crop region does not overlap the canvas",
        ));
    }
    Ok((left, top, right - left, bottom - top))
}

/// Copies the pixels of `bounds` out of the rendered background.
pub fn crop_background(
    rendered: &RgbaImage,
    bounds: Rect,
    canvas: CanvasSize,
) -> EngineResult<(RgbaImage, Point)> {
    let (x, y, width, height) = crop_region(bounds, canvas)?;
    let cropped = imageops::crop_imm(rendered, x, y, width, height).to_image();
    tracing::debug!(x, y, width, height, "background cropped");
    Ok((cropped, Point::new(x as f32, y as f32)))
}

pub(crate) fn adjust_ratio_to_fit(
    width: u32,
    height: u32,
    ratio_x: u32,
    ratio_y: u32,
) -> (u32, u32) {
    let target_w = scale_ratio_dimension(height, ratio_x, ratio_y);
    let target_h = scale_ratio_dimension(width, ratio_y, ratio_x);

    if target_w <= width {
        (target_w, height)
    } else {
        (width, target_h)
    }
}

pub(crate) fn scale_ratio_dimension(base: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        0
    } else {
        let scaled = (u64::from(base) * u64::from(numerator)) / u64::from(denominator);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn square_proposal_fits_shorter_dimension() {
        let rect = CropPreset::Ratio1x1.proposal(CanvasSize::new(800, 600));
        assert_eq!(rect, Rect::new(160.0, 60.0, 480.0, 480.0));
    }

    #[test]
    fn widescreen_proposal_keeps_ratio_inside_canvas() {
        let rect = CropPreset::Ratio16x9.proposal(CanvasSize::new(800, 600));
        assert_eq!((rect.width, rect.height), (640.0, 360.0));
        assert!(rect.right() <= 800.0 && rect.bottom() <= 600.0);
    }

    #[test]
    fn free_proposal_uses_ten_percent_inset() {
        let rect = CropPreset::Free.proposal(CanvasSize::new(800, 600));
        assert_eq!(rect, Rect::new(80.0, 60.0, 640.0, 480.0));
    }

    #[test]
    fn resolve_ratio_returns_canvas_dims_for_original() {
        assert_eq!(
            CropPreset::Original.resolve_ratio(1920, 1080),
            Some((1920, 1080))
        );
        assert_eq!(CropPreset::Original.resolve_ratio(0, 0), Some((1, 1)));
        assert_eq!(CropPreset::Free.resolve_ratio(800, 600), None);
    }

    #[test]
    fn adjust_ratio_to_fit_maintains_aspect_boundary() {
        assert_eq!(adjust_ratio_to_fit(400, 120, 16, 9), (213, 120));
        assert_eq!(adjust_ratio_to_fit(120, 400, 16, 9), (120, 67));
    }

    #[test]
    fn parse_accepts_labels() {
        assert_eq!(CropPreset::parse("16:9"), Some(CropPreset::Ratio16x9));
        assert_eq!(CropPreset::parse("free"), Some(CropPreset::Free));
        assert_eq!(CropPreset::parse("4:3"), None);
    }

    #[test]
    fn crop_background_copies_exact_region() {
        let mut rendered = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        rendered.put_pixel(5, 2, Rgba([255, 0, 0, 255]));
        let (cropped, origin) = crop_background(
            &rendered,
            Rect::new(5.0, 2.0, 4.0, 3.0),
            CanvasSize::new(20, 10),
        )
        .expect("region inside canvas");
        assert_eq!(cropped.dimensions(), (4, 3));
        assert_eq!(origin, Point::new(5.0, 2.0));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn crop_region_rejects_area_outside_canvas() {
        assert!(matches!(
            crop_region(Rect::new(50.0, 50.0, 10.0, 10.0), CanvasSize::new(20, 20)),
            Err(EngineError::InvalidGeometry { .. })
        ));
    }
}
