use std::fmt::Display;

use log::{debug, info, warn};
use thiserror::Error;

use crate::job::{PrintJobControllerState, PrintJobOptions};
use crate::layout::{compute_rect, DrawRect, PageImage, PrintableArea, ScalingPolicy};
use crate::platform::{PlatformAdapter, PlatformJobHandle, SpoolPage};
use crate::range::{self, PageRange, PaginationState, RangeError};

/// Errors raised while running a print job.
/// 列印作業執行時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid page range: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("page {page} failed to render: {reason}")]
    RenderFailure { page: u32, reason: String },
    #[error("platform adapter failed: {0}")]
    Platform(String),
    #[error("a print job is already in progress")]
    InProgress,
}

/// Signal returned to the host after each rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    HasMorePages,
    Completed,
}

/// An image together with where it lands on its page.
/// 單頁的圖片與其放置矩形。
#[derive(Debug)]
pub struct PlacedPage<'a, I> {
    pub page_number: u32,
    pub image: &'a I,
    pub area: PrintableArea,
    pub rect: DrawRect,
}

/// Result produced after a job ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub first_page: u32,
    pub last_page: u32,
    pub pages_rendered: u32,
}

/// Drives one image per page through layout and rendering.
/// 逐頁驅動圖片的版面配置與繪製：一張圖片一頁。
///
/// The controller borrows the images; page `n` prints `images[n - 1]`. Pagination
/// state survives between jobs so that [`PageRange::Current`] can refer to the last
/// page the host showed or printed.
#[derive(Debug)]
pub struct PrintJobController<'a, I> {
    images: &'a [I],
    policy: ScalingPolicy,
    state: PaginationState,
    status: PrintJobControllerState,
}

impl<'a, I: PageImage> PrintJobController<'a, I> {
    pub fn new(images: &'a [I]) -> Self {
        Self::with_policy(images, ScalingPolicy::default())
    }

    pub fn with_policy(images: &'a [I], policy: ScalingPolicy) -> Self {
        Self {
            images,
            policy,
            state: PaginationState::all(page_count_of(images)),
            status: PrintJobControllerState::Idle,
        }
    }

    pub fn page_count(&self) -> u32 {
        page_count_of(self.images)
    }

    pub fn policy(&self) -> ScalingPolicy {
        self.policy
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn status(&self) -> PrintJobControllerState {
        self.status
    }

    /// Records the page the host is displaying, used by later `Current` jobs.
    pub fn set_current_page(&mut self, page: u32) -> Result<(), JobError> {
        if self.status == PrintJobControllerState::Rendering {
            return Err(JobError::InProgress);
        }
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(RangeError::InvalidBounds {
                start: page,
                end: page,
                page_count,
            }
            .into());
        }
        self.state.current = page;
        Ok(())
    }

    /// Resolves `range` and resets the pagination state for a new job.
    ///
    /// A job still in progress is abandoned. Nothing is rendered when the range is
    /// rejected.
    pub fn begin(&mut self, range: PageRange) -> Result<PaginationState, JobError> {
        if self.status == PrintJobControllerState::Rendering {
            warn!(
                "restarting print job at page {} of {}",
                self.state.current, self.state.to
            );
        }

        let state = match range::resolve(range, self.page_count(), self.state.current) {
            Ok(state) => state,
            Err(err) => {
                warn!("rejected page range {range}: {err}");
                self.status = PrintJobControllerState::Failed;
                return Err(err.into());
            }
        };

        self.state = state;
        self.status = if state.is_empty() {
            PrintJobControllerState::Completed
        } else {
            PrintJobControllerState::Rendering
        };
        info!(
            "print job for range {range}: pages {}-{} ({} page(s))",
            state.from,
            state.to,
            state.page_count()
        );
        Ok(state)
    }

    /// Lays out and renders the current page, then advances.
    ///
    /// Intended to be called once per page event of the host's print pipeline after
    /// [`begin`](Self::begin). Returns [`PageOutcome::Completed`] without rendering when
    /// no job is active.
    pub fn render_next_page<F, E>(
        &mut self,
        area: PrintableArea,
        render: F,
    ) -> Result<PageOutcome, JobError>
    where
        F: FnOnce(&PlacedPage<'a, I>) -> Result<(), E>,
        E: Display,
    {
        let page = match self.placement(area) {
            Ok(Some(page)) => page,
            Ok(None) => return Ok(PageOutcome::Completed),
            Err(err) => return Err(self.fail(err)),
        };

        if let Err(err) = render(&page) {
            return Err(self.fail(JobError::RenderFailure {
                page: page.page_number,
                reason: err.to_string(),
            }));
        }

        Ok(self.finish_page())
    }

    /// Runs a whole job: every page in `range` is placed and passed to `render`.
    pub fn run_job<A, F, E>(
        &mut self,
        range: PageRange,
        area: A,
        render: F,
    ) -> Result<JobSummary, JobError>
    where
        A: FnMut() -> PrintableArea,
        F: FnMut(&PlacedPage<'a, I>) -> Result<(), E>,
        E: Display,
    {
        let state = self.begin(range)?;
        self.drive(state, area, render)
    }

    /// Iterator form of [`run_job`](Self::run_job).
    ///
    /// The iterator yields at most `to - from + 1` pages and stops after the first
    /// error. Starting over requires a new call, which re-resolves the range.
    pub fn pages<A>(&mut self, range: PageRange, area: A) -> Result<Pages<'_, 'a, I, A>, JobError>
    where
        A: FnMut() -> PrintableArea,
    {
        self.begin(range)?;
        Ok(Pages {
            controller: self,
            area,
        })
    }

    /// Stops the active job. Pages already rendered stay rendered.
    pub fn cancel(&mut self) {
        if self.status == PrintJobControllerState::Rendering {
            info!(
                "print job cancelled before page {} of {}",
                self.state.current, self.state.to
            );
            self.status = PrintJobControllerState::Cancelled;
        }
    }

    fn drive<A, F, E>(
        &mut self,
        state: PaginationState,
        mut area: A,
        mut render: F,
    ) -> Result<JobSummary, JobError>
    where
        A: FnMut() -> PrintableArea,
        F: FnMut(&PlacedPage<'a, I>) -> Result<(), E>,
        E: Display,
    {
        let mut pages_rendered = 0;
        while self.status == PrintJobControllerState::Rendering {
            self.render_next_page(area(), &mut render)?;
            pages_rendered += 1;
        }
        info!("print job finished after {pages_rendered} page(s)");
        Ok(JobSummary {
            first_page: state.from,
            last_page: state.to,
            pages_rendered,
        })
    }

    fn placement(&self, area: PrintableArea) -> Result<Option<PlacedPage<'a, I>>, JobError> {
        if self.status != PrintJobControllerState::Rendering {
            return Ok(None);
        }

        let page_number = self.state.current;
        let images: &'a [I] = self.images;
        let image = page_number
            .checked_sub(1)
            .and_then(|index| images.get(index as usize))
            .ok_or_else(|| JobError::RenderFailure {
                page: page_number,
                reason: format!("no image for page {page_number} of {}", images.len()),
            })?;

        let rect = compute_rect(image.size(), area, self.policy);
        debug!(
            "page {page_number}: {:.1}x{:.1} at ({:.1}, {:.1}), scale {:.3}",
            rect.width, rect.height, rect.x, rect.y, rect.scale
        );
        Ok(Some(PlacedPage {
            page_number,
            image,
            area,
            rect,
        }))
    }

    fn finish_page(&mut self) -> PageOutcome {
        if self.state.has_next() {
            self.state = self.state.advance();
            PageOutcome::HasMorePages
        } else {
            self.status = PrintJobControllerState::Completed;
            PageOutcome::Completed
        }
    }

    fn fail(&mut self, err: JobError) -> JobError {
        warn!("print job failed: {err}");
        self.status = PrintJobControllerState::Failed;
        err
    }
}

fn page_count_of<I>(images: &[I]) -> u32 {
    u32::try_from(images.len()).unwrap_or(u32::MAX)
}

/// Pages of a job in print order. Created by [`PrintJobController::pages`].
#[derive(Debug)]
pub struct Pages<'c, 'a, I, A> {
    controller: &'c mut PrintJobController<'a, I>,
    area: A,
}

impl<'c, 'a, I, A> Iterator for Pages<'c, 'a, I, A>
where
    I: PageImage,
    A: FnMut() -> PrintableArea,
{
    type Item = Result<PlacedPage<'a, I>, JobError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.controller.status != PrintJobControllerState::Rendering {
            return None;
        }
        let area = (self.area)();
        match self.controller.placement(area) {
            Ok(Some(page)) => {
                self.controller.finish_page();
                Some(Ok(page))
            }
            Ok(None) => None,
            Err(err) => Some(Err(self.controller.fail(err))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.controller.status == PrintJobControllerState::Rendering {
            let remaining = self.controller.state.remaining() as usize;
            (0, Some(remaining))
        } else {
            (0, Some(0))
        }
    }
}

/// Spools a job through a platform adapter.
/// 透過平台列印介面送出整份列印作業。
///
/// The range is validated before the platform job is opened. The printable area comes
/// from the job options; any failure aborts the platform job with the error message.
pub fn spool_job<'a, I, P>(
    controller: &mut PrintJobController<'a, I>,
    range: PageRange,
    options: &PrintJobOptions,
    adapter: &P,
) -> Result<JobSummary, JobError>
where
    I: PageImage,
    P: PlatformAdapter<I>,
    P::Error: Display,
{
    let state = controller.begin(range)?;
    let mut handle = match adapter.begin_job(options) {
        Ok(handle) => handle,
        Err(err) => {
            return Err(controller.fail(JobError::Platform(err.to_string())));
        }
    };

    let area = options.printable_area();
    let result = controller.drive(
        state,
        || area,
        |page| {
            handle.submit_page(SpoolPage {
                job_id: options.job_id,
                page_number: page.page_number,
                image: page.image,
                area: page.area,
                rect: page.rect,
            })
        },
    );

    match result {
        Ok(summary) => match handle.finish() {
            Ok(()) => Ok(summary),
            Err(err) => Err(controller.fail(JobError::Platform(err.to_string()))),
        },
        Err(err) => {
            handle.abort(&err.to_string());
            Err(err)
        }
    }
}
