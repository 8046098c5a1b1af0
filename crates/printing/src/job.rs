use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::layout::PrintableArea;

/// Opaque identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrintJobId(u64);

impl PrintJobId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "print-job-{}", self.0)
    }
}

/// Orientation of a print page.
/// 頁面方向；圖片列印預設為橫式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

/// Margin values expressed in points (1/72").
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margin {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margin {
    pub const fn zero() -> Self {
        Self::uniform(0.0)
    }

    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            bottom: value,
            left: value,
            right: value,
        }
    }
}

/// Supported paper identifiers for quick selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperId {
    A4,
    Letter,
    Legal,
    A3,
    Custom,
}

/// Represents a paper size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub id: PaperId,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PaperSize {
    pub const fn new(id: PaperId, width_mm: f32, height_mm: f32) -> Self {
        Self {
            id,
            width_mm,
            height_mm,
        }
    }

    pub const fn a4() -> Self {
        Self::new(PaperId::A4, 210.0, 297.0)
    }

    pub const fn a3() -> Self {
        Self::new(PaperId::A3, 297.0, 420.0)
    }

    pub const fn letter() -> Self {
        Self::new(PaperId::Letter, 215.9, 279.4)
    }

    pub const fn legal() -> Self {
        Self::new(PaperId::Legal, 215.9, 355.6)
    }

    pub const fn to_points(&self, orientation: Orientation) -> (f32, f32) {
        const MM_PER_INCH: f32 = 25.4;
        let width_in = self.width_mm / MM_PER_INCH;
        let height_in = self.height_mm / MM_PER_INCH;
        let width_pt = width_in * 72.0;
        let height_pt = height_in * 72.0;
        match orientation {
            Orientation::Portrait => (width_pt, height_pt),
            Orientation::Landscape => (height_pt, width_pt),
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::a4()
    }
}

/// Page setup handed to the platform adapter when a job is spooled.
/// 送交平台列印介面的頁面設定。
///
/// Copies are not part of the job; duplication is left to the host spooler.
#[derive(Debug, Clone, Default)]
pub struct PrintJobOptions {
    pub job_id: PrintJobId,
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub margins: Margin,
}

impl PrintJobOptions {
    pub fn new(paper: PaperSize, orientation: Orientation, margins: Margin) -> Self {
        Self {
            job_id: PrintJobId::new(),
            paper,
            orientation,
            margins,
        }
    }

    /// Full page size in points for the configured orientation.
    pub fn page_size_pt(&self) -> (f32, f32) {
        self.paper.to_points(self.orientation)
    }

    /// Margin-adjusted area available to each page.
    pub fn printable_area(&self) -> PrintableArea {
        PrintableArea::from_paper(self.paper, self.orientation, self.margins)
    }
}

/// Lifecycle marker exposed by the print job controller.
/// 列印作業控制器的狀態標記。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintJobControllerState {
    Idle,
    Rendering,
    Completed,
    Cancelled,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_swaps_paper_axes() {
        let (width, height) = PaperSize::a4().to_points(Orientation::Landscape);
        assert!(width > height);
        assert!((width - 841.89).abs() < 0.01);
        assert!((height - 595.28).abs() < 0.01);
    }

    #[test]
    fn default_options_print_landscape_without_margins() {
        let options = PrintJobOptions::default();
        assert_eq!(options.orientation, Orientation::Landscape);
        assert_eq!(options.margins, Margin::zero());

        let area = options.printable_area();
        let (width, height) = options.page_size_pt();
        assert_eq!(area.width_pt, width);
        assert_eq!(area.height_pt, height);
    }

    #[test]
    fn job_ids_are_unique() {
        let first = PrintJobId::new();
        let second = PrintJobId::new();
        assert_ne!(first, second);
        assert!(first.to_string().starts_with("print-job-"));
    }
}
