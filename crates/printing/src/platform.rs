use std::io;

use thiserror::Error;

use crate::job::{PrintJobId, PrintJobOptions};
use crate::layout::{DrawRect, PrintableArea};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// A placed image handed to the platform for drawing.
/// 已完成版面配置、交給平台繪製的頁面。
///
/// `rect` is relative to the top-left corner of the printable area; adapters offset
/// it by the job margins.
#[derive(Debug)]
pub struct SpoolPage<'p, I> {
    pub job_id: PrintJobId,
    pub page_number: u32,
    pub image: &'p I,
    pub area: PrintableArea,
    pub rect: DrawRect,
}

/// Handle returned when a platform adapter begins a job.
/// 平台列印介面開始作業時回傳的控制物件。
pub trait PlatformJobHandle<I> {
    type Error;

    fn submit_page(&mut self, page: SpoolPage<'_, I>) -> Result<(), Self::Error>;
    fn finish(self) -> Result<(), Self::Error>;
    fn abort(self, reason: &str);
}

/// Abstraction over the host's print spooler.
/// 主機列印佇列的抽象介面。
pub trait PlatformAdapter<I> {
    type Error;
    type JobHandle: PlatformJobHandle<I, Error = Self::Error>;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error>;
}

/// Failures raised by the bundled file-backed adapters.
#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("page raster of {width}x{height} pixels exceeds the preview limit")]
    PageTooLarge { width: u64, height: u64 },
}

/// Page metadata captured by the mock adapter.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPage {
    pub page_number: u32,
    pub rect: DrawRect,
}

/// Recorded job metadata produced by the mock adapter.
/// 模擬介面所記錄的列印作業中繼資料。
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub options: PrintJobOptions,
    pub pages: Vec<RecordedPage>,
    pub aborted: bool,
    pub abort_reason: Option<String>,
}

/// In-memory implementation of [`PlatformAdapter`] used for tests.
/// 測試使用的記憶體內部平台介面實作。
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockPlatformAdapter {
    jobs: Arc<Mutex<Vec<RecordedJob>>>,
    fail_on_page: Option<u32>,
    fail_finish: Option<String>,
}

#[cfg(test)]
impl MockPlatformAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(page: u32) -> Self {
        Self {
            fail_on_page: Some(page),
            ..Self::default()
        }
    }

    pub fn failing_finish(reason: &str) -> Self {
        Self {
            fail_finish: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn drain_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().expect("lock poisoned").drain(..).collect()
    }
}

#[cfg(test)]
pub struct MockJobHandle {
    options: PrintJobOptions,
    pages: Vec<RecordedPage>,
    fail_on_page: Option<u32>,
    fail_finish: Option<String>,
    sink: Arc<Mutex<Vec<RecordedJob>>>,
}

#[cfg(test)]
impl<I> PlatformAdapter<I> for MockPlatformAdapter {
    type Error = String;
    type JobHandle = MockJobHandle;

    fn begin_job(&self, options: &PrintJobOptions) -> Result<Self::JobHandle, Self::Error> {
        Ok(MockJobHandle {
            options: options.clone(),
            pages: Vec::new(),
            fail_on_page: self.fail_on_page,
            fail_finish: self.fail_finish.clone(),
            sink: self.jobs.clone(),
        })
    }
}

#[cfg(test)]
impl<I> PlatformJobHandle<I> for MockJobHandle {
    type Error = String;

    fn submit_page(&mut self, page: SpoolPage<'_, I>) -> Result<(), Self::Error> {
        if self.fail_on_page == Some(page.page_number) {
            return Err(format!("printer jammed on page {}", page.page_number));
        }
        self.pages.push(RecordedPage {
            page_number: page.page_number,
            rect: page.rect,
        });
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        if let Some(reason) = self.fail_finish {
            return Err(reason);
        }
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: self.pages,
            aborted: false,
            abort_reason: None,
        });
        Ok(())
    }

    fn abort(self, reason: &str) {
        let mut guard = self.sink.lock().expect("lock poisoned");
        guard.push(RecordedJob {
            options: self.options,
            pages: self.pages,
            aborted: true,
            abort_reason: Some(reason.to_string()),
        });
    }
}
