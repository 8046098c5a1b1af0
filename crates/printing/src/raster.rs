use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};

use crate::job::{Margin, PrintJobId, PrintJobOptions};
use crate::platform::{PlatformAdapter, PlatformJobHandle, SpoolError, SpoolPage};

/// Largest bitmap, in pixels, the adapter allocates for a page or a scaled image.
pub const MAX_PAGE_PIXELS: u64 = 100_000_000;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GUIDE: Rgba<u8> = Rgba([230, 230, 230, 255]);

/// Renders every page to a PNG preview (`page-001.png`, ...).
/// 將每一頁輸出為 PNG 預覽圖。
#[derive(Debug, Clone)]
pub struct RasterAdapter {
    output_dir: PathBuf,
    dpi: u32,
}

impl RasterAdapter {
    pub fn new(output_dir: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            dpi: dpi.max(1),
        }
    }

    pub fn page_path(dir: &Path, page_number: u32) -> PathBuf {
        dir.join(format!("page-{page_number:03}.png"))
    }
}

impl PlatformAdapter<DynamicImage> for RasterAdapter {
    type Error = SpoolError;
    type JobHandle = RasterJobHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        let (page_width, page_height) = options.page_size_pt();
        let scale = self.dpi as f32 / 72.0;
        pixel_size(page_width * scale, page_height * scale)?;
        fs::create_dir_all(&self.output_dir)?;
        Ok(RasterJobHandle {
            job_id: options.job_id,
            output_dir: self.output_dir.clone(),
            scale,
            page_width,
            page_height,
            margins: options.margins,
            written: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct RasterJobHandle {
    job_id: PrintJobId,
    output_dir: PathBuf,
    scale: f32,
    page_width: f32,
    page_height: f32,
    margins: Margin,
    written: Vec<PathBuf>,
}

impl RasterJobHandle {
    fn render_page(&self, page: &SpoolPage<'_, DynamicImage>) -> Result<RgbaImage, SpoolError> {
        let (width_px, height_px) =
            pixel_size(self.page_width * self.scale, self.page_height * self.scale)?;
        let mut canvas = ImageBuffer::from_pixel(width_px, height_px, PAPER);
        draw_margin_guides(&mut canvas, self.margins, self.scale);

        let x = ((self.margins.left + page.rect.x) * self.scale).round() as i64;
        let y = ((self.margins.top + page.rect.y) * self.scale).round() as i64;
        let w = (page.rect.width * self.scale).round();
        let h = (page.rect.height * self.scale).round();
        if w >= 1.0 && h >= 1.0 {
            let (w, h) = pixel_size(w, h)?;
            let scaled = imageops::resize(&page.image.to_rgba8(), w, h, FilterType::Triangle);
            imageops::overlay(&mut canvas, &scaled, x, y);
        }
        Ok(canvas)
    }
}

impl PlatformJobHandle<DynamicImage> for RasterJobHandle {
    type Error = SpoolError;

    fn submit_page(&mut self, page: SpoolPage<'_, DynamicImage>) -> Result<(), Self::Error> {
        let canvas = self.render_page(&page)?;
        let path = RasterAdapter::page_path(&self.output_dir, page.page_number);
        canvas.save_with_format(&path, ImageFormat::Png)?;
        debug!("{}: page {} -> {}", self.job_id, page.page_number, path.display());
        self.written.push(path);
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        debug!("{}: {} preview page(s) written", self.job_id, self.written.len());
        Ok(())
    }

    fn abort(self, reason: &str) {
        warn!(
            "{}: preview stopped after {} page(s): {reason}",
            self.job_id,
            self.written.len()
        );
    }
}

/// Rounds a size in pixels up and rejects bitmaps larger than [`MAX_PAGE_PIXELS`].
fn pixel_size(width: f32, height: f32) -> Result<(u32, u32), SpoolError> {
    let width = f64::from(width).ceil().max(1.0);
    let height = f64::from(height).ceil().max(1.0);
    let too_large = || SpoolError::PageTooLarge {
        width: width.min(u64::MAX as f64) as u64,
        height: height.min(u64::MAX as f64) as u64,
    };
    if !width.is_finite() || !height.is_finite() || width * height > MAX_PAGE_PIXELS as f64 {
        return Err(too_large());
    }
    Ok((width as u32, height as u32))
}

fn draw_margin_guides(buffer: &mut RgbaImage, margins: Margin, scale: f32) {
    let left = (margins.left * scale).round() as i32;
    let right = buffer.width() as i32 - (margins.right * scale).round() as i32;
    let top = (margins.top * scale).round() as i32;
    let bottom = buffer.height() as i32 - (margins.bottom * scale).round() as i32;
    draw_vertical_band(buffer, left);
    draw_vertical_band(buffer, right);
    draw_horizontal_band(buffer, top);
    draw_horizontal_band(buffer, bottom);
}

fn draw_vertical_band(buffer: &mut RgbaImage, x: i32) {
    if x < 0 || x >= buffer.width() as i32 {
        return;
    }
    for y in 0..buffer.height() {
        buffer.put_pixel(x as u32, y, GUIDE);
    }
}

fn draw_horizontal_band(buffer: &mut RgbaImage, y: i32) {
    if y < 0 || y >= buffer.height() as i32 {
        return;
    }
    for x in 0..buffer.width() {
        buffer.put_pixel(x, y as u32, GUIDE);
    }
}
