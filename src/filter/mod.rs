//! Non-destructive adjustment stacks for background and image objects.
//!
//! A [`FilterStack`] holds at most one [`FilterOperation`] per [`FilterKind`].
//! Recomposition always replays the stack in [`FilterKind::CANONICAL_ORDER`],
//! so the order in which parameters were set never changes the pixels.

use image::{imageops, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const NOISE_SCALE: f32 = 100.0;
const NOISE_SEED: u64 = 0x5eed_0f_a11;
const BLUR_SIGMA_PER_UNIT: f32 = 20.0;
const BLUR_DOWNSAMPLE_MIN_SIGMA: f32 = 8.0;
const PIXELATE_SCALE: f32 = 10.0;
const PIXELATE_MIN_BLOCK: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Blur,
    Noise,
    Pixelate,
}

impl FilterKind {
    pub const CANONICAL_ORDER: [FilterKind; 6] = [
        Self::Brightness,
        Self::Contrast,
        Self::Saturation,
        Self::Blur,
        Self::Noise,
        Self::Pixelate,
    ];

    pub const fn range(self) -> (f32, f32) {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturation => (-1.0, 1.0),
            Self::Blur | Self::Noise | Self::Pixelate => (0.0, 1.0),
        }
    }

    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let (min, max) = self.range();
        value.clamp(min, max)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Blur => "blur",
            Self::Noise => "noise",
            Self::Pixelate => "pixelate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::CANONICAL_ORDER
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterOperation {
    pub kind: FilterKind,
    pub value: f32,
}

impl FilterOperation {
    /// Block size used by pixelation; always at least two pixels.
    pub fn pixelate_block_size(value: f32) -> u32 {
        ((value * PIXELATE_SCALE + PIXELATE_MIN_BLOCK as f32).floor() as u32).max(PIXELATE_MIN_BLOCK)
    }

    pub fn noise_amount(value: f32) -> f32 {
        value * NOISE_SCALE
    }

    pub fn blur_sigma(value: f32) -> f32 {
        value * BLUR_SIGMA_PER_UNIT
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterStack {
    operations: Vec<FilterOperation>,
}

impl FilterStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[FilterOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn find(&self, kind: FilterKind) -> Option<&FilterOperation> {
        self.operations.iter().find(|operation| operation.kind == kind)
    }

    pub fn value(&self, kind: FilterKind) -> f32 {
        self.find(kind).map_or(0.0, |operation| operation.value)
    }

    /// Clamps `value` into the kind's range and upserts it. The neutral value
    /// removes the operation. Returns the clamped value that was applied.
    pub fn set(&mut self, kind: FilterKind, value: f32) -> f32 {
        let value = kind.clamp(value);
        self.operations.retain(|operation| operation.kind != kind);
        if value != 0.0 {
            self.operations.push(FilterOperation { kind, value });
        }
        value
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Replays the stack over `source` in canonical order.
    pub fn apply(&self, source: &RgbaImage) -> RgbaImage {
        let mut image = source.clone();
        for kind in FilterKind::CANONICAL_ORDER {
            let Some(operation) = self.find(kind) else {
                continue;
            };
            image = match kind {
                FilterKind::Brightness => brightness(image, operation.value),
                FilterKind::Contrast => contrast(image, operation.value),
                FilterKind::Saturation => saturation(image, operation.value),
                FilterKind::Blur => blur(&image, FilterOperation::blur_sigma(operation.value)),
                FilterKind::Noise => noise(image, FilterOperation::noise_amount(operation.value)),
                FilterKind::Pixelate => {
                    pixelate(&image, FilterOperation::pixelate_block_size(operation.value))
                }
            };
        }
        image
    }
}

fn map_rgb(mut image: RgbaImage, transform: impl Fn(f32, f32, f32) -> (f32, f32, f32)) -> RgbaImage {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let (r, g, b) = transform(f32::from(r), f32::from(g), f32::from(b));
        *pixel = Rgba([to_channel(r), to_channel(g), to_channel(b), a]);
    }
    image
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn brightness(image: RgbaImage, value: f32) -> RgbaImage {
    let shift = value * 255.0;
    map_rgb(image, |r, g, b| (r + shift, g + shift, b + shift))
}

fn contrast(image: RgbaImage, value: f32) -> RgbaImage {
    let c = (value * 255.0).floor();
    let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
    let apply = |channel: f32| factor * (channel - 128.0) + 128.0;
    map_rgb(image, |r, g, b| (apply(r), apply(g), apply(b)))
}

fn saturation(image: RgbaImage, value: f32) -> RgbaImage {
    let adjust = -value;
    map_rgb(image, |r, g, b| {
        let max = r.max(g).max(b);
        let shift = |channel: f32| {
            if channel != max {
                channel + (max - channel) * adjust
            } else {
                channel
            }
        };
        (shift(r), shift(g), shift(b))
    })
}

/// Gaussian blur; large radii are blurred at reduced resolution and scaled back.
pub fn blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if sigma <= 0.0 || width == 0 || height == 0 {
        return image.clone();
    }
    let downsample = if sigma >= BLUR_DOWNSAMPLE_MIN_SIGMA {
        ((sigma / 4.0) as u32).clamp(1, 8).min(width).min(height)
    } else {
        1
    };
    if downsample <= 1 {
        return imageops::blur(image, sigma);
    }

    let reduced_width = (width / downsample).max(1);
    let reduced_height = (height / downsample).max(1);
    let reduced = imageops::resize(
        image,
        reduced_width,
        reduced_height,
        imageops::FilterType::Triangle,
    );
    let reduced_sigma = (sigma / downsample as f32).max(0.8);
    let blurred = imageops::blur(&reduced, reduced_sigma);
    imageops::resize(&blurred, width, height, imageops::FilterType::Triangle)
}

fn noise(image: RgbaImage, amount: f32) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(NOISE_SEED);
    let mut image = image;
    for pixel in image.pixels_mut() {
        let jitter = (0.5 - rng.random::<f32>()) * amount;
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([
            to_channel(f32::from(r) + jitter),
            to_channel(f32::from(g) + jitter),
            to_channel(f32::from(b) + jitter),
            a,
        ]);
    }
    image
}

fn pixelate(image: &RgbaImage, block: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut output = RgbaImage::new(width, height);
    for block_y in (0..height).step_by(block as usize) {
        for block_x in (0..width).step_by(block as usize) {
            let sample = *image.get_pixel(block_x, block_y);
            for y in block_y..(block_y + block).min(height) {
                for x in block_x..(block_x + block).min(width) {
                    output.put_pixel(x, y, sample);
                }
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 17 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8, 255])
        })
    }

    #[test]
    fn neutral_value_removes_operation() {
        let mut stack = FilterStack::new();
        stack.set(FilterKind::Brightness, 0.4);
        assert!(stack.find(FilterKind::Brightness).is_some());

        stack.set(FilterKind::Brightness, 0.0);
        assert!(stack.find(FilterKind::Brightness).is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn setting_a_kind_twice_keeps_a_single_entry() {
        let mut stack = FilterStack::new();
        stack.set(FilterKind::Contrast, 0.2);
        stack.set(FilterKind::Contrast, -0.3);
        assert_eq!(stack.operations().len(), 1);
        assert_eq!(stack.value(FilterKind::Contrast), -0.3);
    }

    #[test]
    fn values_are_clamped_to_kind_range() {
        let mut stack = FilterStack::new();
        assert_eq!(stack.set(FilterKind::Saturation, 3.0), 1.0);
        assert_eq!(stack.set(FilterKind::Blur, -0.5), 0.0);
        assert!(stack.find(FilterKind::Blur).is_none());
        assert_eq!(stack.set(FilterKind::Noise, f32::NAN), 0.0);
    }

    #[test]
    fn recomposition_is_independent_of_set_order() {
        let source = gradient(24, 16);

        let mut contrast_first = FilterStack::new();
        contrast_first.set(FilterKind::Contrast, 0.35);
        contrast_first.set(FilterKind::Brightness, -0.2);

        let mut brightness_first = FilterStack::new();
        brightness_first.set(FilterKind::Brightness, -0.2);
        brightness_first.set(FilterKind::Contrast, 0.35);

        assert_eq!(contrast_first.apply(&source), brightness_first.apply(&source));
    }

    #[test]
    fn noise_is_reproducible() {
        let source = gradient(12, 12);
        let mut stack = FilterStack::new();
        stack.set(FilterKind::Noise, 0.6);
        assert_eq!(stack.apply(&source), stack.apply(&source));
    }

    #[test]
    fn pixelate_block_size_is_at_least_two() {
        assert_eq!(FilterOperation::pixelate_block_size(0.0), 2);
        assert_eq!(FilterOperation::pixelate_block_size(0.5), 7);
        assert_eq!(FilterOperation::pixelate_block_size(1.0), 12);
    }

    #[test]
    fn pixelate_copies_block_origin() {
        let source = gradient(8, 8);
        let output = pixelate(&source, 4);
        assert_eq!(output.get_pixel(3, 3), source.get_pixel(0, 0));
        assert_eq!(output.get_pixel(5, 2), source.get_pixel(4, 0));
    }

    #[test]
    fn brightness_shifts_channels_and_keeps_alpha() {
        let source = RgbaImage::from_pixel(2, 2, Rgba([100, 100, 100, 80]));
        let mut stack = FilterStack::new();
        stack.set(FilterKind::Brightness, 0.2);
        let output = stack.apply(&source);
        assert_eq!(*output.get_pixel(0, 0), Rgba([151, 151, 151, 80]));
    }

    #[test]
    fn blur_preserves_dimensions() {
        let source = gradient(96, 72);
        assert_eq!(blur(&source, 11.0).dimensions(), source.dimensions());
        assert_eq!(blur(&source, 2.0).dimensions(), source.dimensions());
    }

    #[test]
    fn filter_kind_parses_labels() {
        assert_eq!(FilterKind::parse("Pixelate"), Some(FilterKind::Pixelate));
        assert_eq!(FilterKind::parse("sepia"), None);
    }
}
