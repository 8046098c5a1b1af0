//! PDF spooler: writes each printed page as a PDF page carrying one image.
//! PDF 列印佇列：每一頁輸出一張圖片。

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use log::{info, warn};

use crate::job::{Margin, PrintJobOptions};
use crate::layout::DrawRect;
use crate::platform::{PlatformAdapter, PlatformJobHandle, SpoolError, SpoolPage};

/// Platform adapter that saves the job to a PDF file once it finishes.
#[derive(Debug, Clone)]
pub struct PdfAdapter {
    output: PathBuf,
}

impl PdfAdapter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl PlatformAdapter<DynamicImage> for PdfAdapter {
    type Error = SpoolError;
    type JobHandle = PdfJobHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        let (page_width, page_height) = options.page_size_pt();
        Ok(PdfJobHandle {
            output: self.output.clone(),
            writer: PdfDocumentWriter::new(page_width, page_height, options.margins),
        })
    }
}

/// Job handle accumulating pages in memory until [`finish`](PlatformJobHandle::finish).
#[derive(Debug)]
pub struct PdfJobHandle {
    output: PathBuf,
    writer: PdfDocumentWriter,
}

impl PlatformJobHandle<DynamicImage> for PdfJobHandle {
    type Error = SpoolError;

    fn submit_page(&mut self, page: SpoolPage<'_, DynamicImage>) -> Result<(), Self::Error> {
        self.writer.add_page(page.image, page.rect)?;
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let pages = self.writer.page_count();
        let data = self.writer.finish();
        fs::write(&self.output, data)?;
        info!("wrote {pages} page(s) to {}", self.output.display());
        Ok(())
    }

    fn abort(self, reason: &str) {
        warn!(
            "discarding PDF job for {} after {} page(s): {reason}",
            self.output.display(),
            self.writer.page_count()
        );
    }
}

/// Builds a PDF document with one image per page.
///
/// Every page shares the same media box. Draw rects are measured from the top-left
/// corner of the printable area and flipped into PDF user space.
#[derive(Debug)]
pub struct PdfDocumentWriter {
    builder: PdfBuilder,
    pages_object: usize,
    page_objects: Vec<usize>,
    page_width: f32,
    page_height: f32,
    margins: Margin,
}

impl PdfDocumentWriter {
    pub fn new(page_width: f32, page_height: f32, margins: Margin) -> Self {
        let mut builder = PdfBuilder::new();
        let pages_object = builder.reserve();
        Self {
            builder,
            pages_object,
            page_objects: Vec::new(),
            page_width,
            page_height,
            margins,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_objects.len()
    }

    pub fn add_page(&mut self, image: &DynamicImage, rect: DrawRect) -> std::io::Result<()> {
        let rgb = image.to_rgb8();
        let pixels = flate_compress(rgb.as_raw())?;
        let image_object = self.builder.add_stream(
            &format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
                rgb.width(),
                rgb.height()
            ),
            &pixels,
        );

        let left = self.margins.left + rect.x;
        let bottom = self.page_height - (self.margins.top + rect.y) - rect.height;
        let content = format!(
            "q\n{w} 0 0 {h} {x} {y} cm\n/Im1 Do\nQ\n",
            w = fmt_float(rect.width),
            h = fmt_float(rect.height),
            x = fmt_float(left),
            y = fmt_float(bottom)
        );
        let content_object = self.builder.add_stream("", content.as_bytes());

        let page_object = self.builder.add_object(format!(
            "<< /Type /Page /Parent {parent} 0 R /MediaBox [0 0 {width} {height}] \
             /Resources << /XObject << /Im1 {image} 0 R >> >> /Contents {content} 0 R >>",
            parent = self.pages_object,
            width = fmt_float(self.page_width),
            height = fmt_float(self.page_height),
            image = image_object,
            content = content_object
        ));
        self.page_objects.push(page_object);
        Ok(())
    }

    pub fn finish(mut self) -> Vec<u8> {
        let kids = self
            .page_objects
            .iter()
            .map(|obj| format!("{obj} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        self.builder.set(
            self.pages_object,
            format!(
                "<< /Type /Pages /Count {count} /Kids [{kids}] >>",
                count = self.page_objects.len()
            ),
        );
        let catalog = self.builder.add_object(format!(
            "<< /Type /Catalog /Pages {pages} 0 R >>",
            pages = self.pages_object
        ));
        self.builder.finish(catalog)
    }
}

fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn fmt_float(value: f32) -> String {
    format!("{:.3}", value)
}

#[derive(Debug)]
struct PdfBuilder {
    objects: Vec<Option<Vec<u8>>>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Allocates an object number whose body is provided later via `set`.
    fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len()
    }

    fn set(&mut self, number: usize, body: impl Into<Vec<u8>>) {
        if let Some(slot) = self.objects.get_mut(number - 1) {
            *slot = Some(body.into());
        }
    }

    fn add_object(&mut self, body: impl Into<Vec<u8>>) -> usize {
        let number = self.reserve();
        self.set(number, body);
        number
    }

    fn add_stream(&mut self, dictionary: &str, stream: &[u8]) -> usize {
        let header = if dictionary.is_empty() {
            format!("<< /Length {} >>", stream.len())
        } else {
            format!("<< {dictionary} /Length {} >>", stream.len())
        };
        let mut body = format!("{header}\nstream\n").into_bytes();
        body.extend_from_slice(stream);
        body.extend_from_slice(b"\nendstream");
        self.add_object(body)
    }

    fn finish(self, root: usize) -> Vec<u8> {
        let mut output = Vec::new();
        output.extend_from_slice(b"%PDF-1.4\n%\xFF\xFF\xFF\xFF\n");
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (index, object) in self.objects.iter().enumerate() {
            offsets.push(output.len());
            output.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            match object {
                Some(body) => output.extend_from_slice(body),
                None => output.extend_from_slice(b"null"),
            }
            output.extend_from_slice(b"\nendobj\n");
        }

        let xref_start = output.len();
        output.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            output.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        output.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                root,
                xref_start
            )
            .as_bytes(),
        );
        output
    }
}
