//! Image print jobs: one image per page, scaled to fit and centred.
//! 圖片列印作業：一張圖片一頁，自動縮放並置中。

pub mod controller;
pub mod job;
pub mod layout;
pub mod pdf;
pub mod platform;
pub mod range;
pub mod raster;

pub use controller::{
    spool_job, JobError, JobSummary, PageOutcome, Pages, PlacedPage, PrintJobController,
};
pub use job::{
    Margin, Orientation, PaperId, PaperSize, PrintJobControllerState, PrintJobId,
    PrintJobOptions,
};
pub use layout::{compute_rect, DrawRect, ImageSize, PageImage, PrintableArea, ScalingPolicy};
pub use pdf::{PdfAdapter, PdfDocumentWriter};
pub use platform::{PlatformAdapter, PlatformJobHandle, SpoolError, SpoolPage};
pub use range::{PageRange, PaginationState, ParseRangeError, RangeError};
pub use raster::RasterAdapter;
