use image::DynamicImage;

use crate::job::{Margin, Orientation, PaperSize};

/// How an image is scaled onto the printable area.
/// 圖片放置到可列印範圍時的縮放方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingPolicy {
    /// Shrinks oversized images, never enlarges small ones.
    #[default]
    AutoFit,
    NoScale,
}

/// Intrinsic image dimensions in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

impl ImageSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Read-only view of an image queued for printing.
/// 待列印圖片的唯讀介面；列印核心只讀取尺寸。
pub trait PageImage {
    fn size(&self) -> ImageSize;
}

impl PageImage for ImageSize {
    fn size(&self) -> ImageSize {
        *self
    }
}

/// Decoded images are measured one unit per pixel.
impl PageImage for DynamicImage {
    fn size(&self) -> ImageSize {
        ImageSize::new(self.width() as f32, self.height() as f32)
    }
}

/// Represents the printable area after applying margins.
/// 表示套用邊界後可列印的實際範圍。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintableArea {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PrintableArea {
    pub const fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }

    pub fn from_paper(paper: PaperSize, orientation: Orientation, margin: Margin) -> Self {
        let (width, height) = paper.to_points(orientation);
        Self {
            width_pt: (width - margin.left - margin.right).max(0.0),
            height_pt: (height - margin.top - margin.bottom).max(0.0),
        }
    }

    /// True when no image can be fitted into the area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width_pt.is_finite()
            && self.height_pt.is_finite()
            && self.width_pt > 0.0
            && self.height_pt > 0.0)
    }
}

/// Placement of an image relative to the printable area's top-left corner.
/// 圖片相對於可列印範圍左上角的放置矩形。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Computes where an image is drawn inside `area`.
///
/// Under [`ScalingPolicy::AutoFit`] a width overflow sets the scale to the width ratio,
/// then a height overflow raises it to `max(scale, height ratio)` starting from 1.0. An
/// image overflowing only in height therefore keeps its native size, and when both axes
/// overflow the larger ratio wins so one axis may still exceed the area. Images that
/// already fit keep their native size. The scaled image is centred
/// and offsets never go negative; content past the area is clipped by the renderer.
///
/// A degenerate area (zero, negative or non-finite on either axis) cannot fit anything:
/// the image keeps its native size and is anchored at the origin.
pub fn compute_rect(image: ImageSize, area: PrintableArea, policy: ScalingPolicy) -> DrawRect {
    if area.is_degenerate() {
        return DrawRect {
            x: 0.0,
            y: 0.0,
            width: image.width,
            height: image.height,
            scale: 1.0,
        };
    }

    let scale = fit_scale(image, area, policy);
    let width = image.width * scale;
    let height = image.height * scale;

    DrawRect {
        x: ((area.width_pt - width) / 2.0).max(0.0),
        y: ((area.height_pt - height) / 2.0).max(0.0),
        width,
        height,
        scale,
    }
}

fn fit_scale(image: ImageSize, area: PrintableArea, policy: ScalingPolicy) -> f32 {
    if policy == ScalingPolicy::NoScale {
        return 1.0;
    }

    let mut scale = 1.0_f32;
    if area.width_pt - image.width < 0.0 {
        scale = area.width_pt / image.width;
    }
    if area.height_pt - image.height < 0.0 {
        // max() against 1.0 means a height-only overflow never shrinks.
        scale = scale.max(area.height_pt / image.height);
    }
    scale
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: PrintableArea = PrintableArea::new(300.0, 200.0);

    #[test]
    fn fitting_image_is_centred_at_native_size() {
        let rect = compute_rect(ImageSize::new(100.0, 50.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(
            rect,
            DrawRect {
                x: 100.0,
                y: 75.0,
                width: 100.0,
                height: 50.0,
                scale: 1.0,
            }
        );
    }

    #[test]
    fn small_images_are_never_enlarged() {
        let rect = compute_rect(ImageSize::new(10.0, 10.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(rect.scale, 1.0);
        assert_eq!((rect.width, rect.height), (10.0, 10.0));
        assert_eq!((rect.x, rect.y), (145.0, 95.0));
    }

    #[test]
    fn image_exactly_filling_the_area_sits_at_origin() {
        let rect = compute_rect(ImageSize::new(300.0, 200.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(rect.scale, 1.0);
        assert_eq!((rect.x, rect.y), (0.0, 0.0));
    }

    #[test]
    fn wide_image_shrinks_to_area_width() {
        let rect = compute_rect(ImageSize::new(600.0, 100.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(rect.scale, 0.5);
        assert_eq!((rect.width, rect.height), (300.0, 50.0));
        assert_eq!((rect.x, rect.y), (0.0, 75.0));
    }

    #[test]
    fn tall_image_is_not_shrunk_when_only_height_overflows() {
        let rect = compute_rect(ImageSize::new(100.0, 400.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(
            rect,
            DrawRect {
                x: 100.0,
                y: 0.0,
                width: 100.0,
                height: 400.0,
                scale: 1.0,
            }
        );
    }

    #[test]
    fn both_axes_overflowing_use_the_larger_ratio() {
        let rect = compute_rect(ImageSize::new(400.0, 300.0), AREA, ScalingPolicy::AutoFit);
        let width_ratio = 300.0_f32 / 400.0;
        let height_ratio = 200.0_f32 / 300.0;
        assert_eq!(rect.scale, width_ratio.max(height_ratio));
        assert_eq!((rect.width, rect.height), (300.0, 225.0));
        // The height still overflows; the offset is clamped instead of going negative.
        assert_eq!((rect.x, rect.y), (0.0, 0.0));
    }

    #[test]
    fn only_a_width_overflow_shrinks() {
        let wide = compute_rect(ImageSize::new(900.0, 100.0), AREA, ScalingPolicy::AutoFit);
        assert!(wide.scale < 1.0);
        assert!(wide.width <= AREA.width_pt + 1e-3);

        let tall = compute_rect(ImageSize::new(250.0, 700.0), AREA, ScalingPolicy::AutoFit);
        assert_eq!(tall.scale, 1.0);
        assert_eq!((tall.width, tall.height), (250.0, 700.0));
        assert_eq!((tall.x, tall.y), (25.0, 0.0));
    }

    #[test]
    fn no_scale_keeps_native_size_and_clamps_offsets() {
        let rect = compute_rect(ImageSize::new(400.0, 100.0), AREA, ScalingPolicy::NoScale);
        assert_eq!(rect.scale, 1.0);
        assert_eq!((rect.width, rect.height), (400.0, 100.0));
        assert_eq!((rect.x, rect.y), (0.0, 50.0));
    }

    #[test]
    fn degenerate_area_anchors_native_image_at_origin() {
        let image = ImageSize::new(120.0, 80.0);
        for area in [
            PrintableArea::new(0.0, 200.0),
            PrintableArea::new(300.0, 0.0),
            PrintableArea::new(-10.0, 50.0),
            PrintableArea::new(f32::NAN, 50.0),
            PrintableArea::new(f32::INFINITY, 50.0),
        ] {
            let rect = compute_rect(image, area, ScalingPolicy::AutoFit);
            assert_eq!(
                rect,
                DrawRect {
                    x: 0.0,
                    y: 0.0,
                    width: 120.0,
                    height: 80.0,
                    scale: 1.0,
                },
                "area {area:?}"
            );
        }
    }

    #[test]
    fn placement_is_deterministic() {
        let image = ImageSize::new(1234.5, 987.25);
        let area = PrintableArea::new(595.28, 841.89);
        let first = compute_rect(image, area, ScalingPolicy::AutoFit);
        let second = compute_rect(image, area, ScalingPolicy::AutoFit);
        assert_eq!(first.x.to_bits(), second.x.to_bits());
        assert_eq!(first.y.to_bits(), second.y.to_bits());
        assert_eq!(first.width.to_bits(), second.width.to_bits());
        assert_eq!(first.height.to_bits(), second.height.to_bits());
    }

    #[test]
    fn printable_area_subtracts_margins() {
        let area = PrintableArea::from_paper(
            PaperSize::a4(),
            Orientation::Portrait,
            Margin::uniform(36.0),
        );
        assert!((area.width_pt - (595.28 - 72.0)).abs() < 0.01);
        assert!((area.height_pt - (841.89 - 72.0)).abs() < 0.01);
    }

    #[test]
    fn oversized_margins_collapse_to_a_degenerate_area() {
        let area = PrintableArea::from_paper(
            PaperSize::a4(),
            Orientation::Portrait,
            Margin::uniform(500.0),
        );
        assert_eq!(area.width_pt, 0.0);
        assert!(area.is_degenerate());
    }

    #[test]
    fn decoded_images_report_pixel_size() {
        let image = DynamicImage::new_rgb8(64, 32);
        assert_eq!(image.size(), ImageSize::new(64.0, 32.0));
    }
}
