//! Page render pipeline
//!
//! Full re-renders are queued as jobs tagged with a generation token. Starting
//! a new render bumps the generation, which supersedes whatever was queued or
//! half-done, so at most one full render is ever in flight. Jobs advance one
//! page per [`RenderPipeline::step`], which lets the owner interleave other
//! work between pages.

use std::collections::VecDeque;

use log::{debug, warn};

use super::document::{DocumentError, PdfDocument};
use super::thumbnails::{ThumbnailStrip, render_thumbnail};
use super::types::{PageSurface, Rotation};
use super::viewport::Viewport;

/// Parameters shared by every page of one full render
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub scale: f32,
    pub rotation: Rotation,
}

/// Monotonic token identifying one full render
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug)]
enum Job {
    Pages {
        generation: Generation,
        params: RenderParams,
        next_page: usize,
    },
    Thumbnails {
        generation: Generation,
        rotation: Rotation,
        next_page: usize,
    },
}

/// Result of advancing the pipeline by one unit of work
#[derive(Debug)]
pub enum StepOutcome {
    /// Nothing queued
    Idle,
    PageRendered { page: usize, height: f32 },
    PageFailed { page: usize, error: DocumentError },
    PagesFinished(Generation),
    ThumbnailRendered { page: usize },
    ThumbnailFailed { page: usize, error: DocumentError },
    ThumbnailsFinished(Generation),
}

/// Owns every rendered surface and thumbnail of the live document
#[derive(Debug)]
pub struct RenderPipeline {
    generation: Generation,
    page_count: usize,
    thumbnail_scale: f32,
    surfaces: Vec<Option<PageSurface>>,
    thumbnails: ThumbnailStrip,
    queue: VecDeque<Job>,
}

impl RenderPipeline {
    #[must_use]
    pub fn new(thumbnail_scale: f32) -> Self {
        Self {
            generation: Generation(0),
            page_count: 0,
            thumbnail_scale,
            surfaces: Vec::new(),
            thumbnails: ThumbnailStrip::new(),
            queue: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Start a full render of `page_count` pages, superseding any in-flight one.
    ///
    /// A superseded job that still owed a thumbnail pass keeps that obligation,
    /// so a zoom arriving mid-rotation cannot leave stale thumbnails behind.
    pub fn begin_full_render(
        &mut self,
        page_count: usize,
        params: RenderParams,
        thumbnails: bool,
    ) -> Generation {
        let owed_thumbnails = self
            .queue
            .iter()
            .any(|job| matches!(job, Job::Thumbnails { .. }));

        self.generation = Generation(self.generation.0 + 1);
        self.page_count = page_count;
        self.queue.clear();
        self.surfaces.clear();
        self.surfaces.resize_with(page_count, || None);

        self.queue.push_back(Job::Pages {
            generation: self.generation,
            params,
            next_page: 1,
        });
        if thumbnails || owed_thumbnails {
            self.queue.push_back(Job::Thumbnails {
                generation: self.generation,
                rotation: params.rotation,
                next_page: 1,
            });
        }

        debug!(
            "Render generation {} queued: {} pages at scale {} rotation {}",
            self.generation.0,
            page_count,
            params.scale,
            params.rotation.degrees()
        );
        self.generation
    }

    /// Drop all surfaces, thumbnails and pending work
    pub fn discard(&mut self) {
        self.generation = Generation(self.generation.0 + 1);
        self.page_count = 0;
        self.queue.clear();
        self.surfaces.clear();
        self.thumbnails.reset();
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Page rendering for the current generation is still in progress
    #[must_use]
    pub fn pages_pending(&self) -> bool {
        self.queue.iter().any(|job| matches!(job, Job::Pages { .. }))
    }

    /// Advance the head job by one page
    pub fn step(&mut self, doc: &dyn PdfDocument) -> StepOutcome {
        let Some(job) = self.queue.front_mut() else {
            return StepOutcome::Idle;
        };

        match job {
            Job::Pages {
                generation,
                params,
                next_page,
            } => {
                let generation = *generation;
                if *next_page > self.page_count {
                    self.queue.pop_front();
                    return StepOutcome::PagesFinished(generation);
                }

                let page = *next_page;
                *next_page += 1;
                let params = *params;

                match render_page(doc, page, params.scale, params.rotation) {
                    Ok(surface) => {
                        let height = surface.height as f32;
                        self.surfaces[page - 1] = Some(surface);
                        StepOutcome::PageRendered { page, height }
                    }
                    Err(error) => {
                        warn!("Render of page {page} failed: {error}");
                        StepOutcome::PageFailed { page, error }
                    }
                }
            }

            Job::Thumbnails {
                generation,
                rotation,
                next_page,
            } => {
                let generation = *generation;
                if *next_page == 1 {
                    self.thumbnails.reset();
                }
                if *next_page > self.page_count {
                    self.queue.pop_front();
                    return StepOutcome::ThumbnailsFinished(generation);
                }

                let page = *next_page;
                *next_page += 1;
                let rotation = *rotation;

                match render_thumbnail(doc, page, self.thumbnail_scale, rotation) {
                    Ok(thumbnail) => {
                        self.thumbnails.push(thumbnail);
                        StepOutcome::ThumbnailRendered { page }
                    }
                    Err(error) => {
                        warn!("Thumbnail of page {page} failed: {error}");
                        StepOutcome::ThumbnailFailed { page, error }
                    }
                }
            }
        }
    }

    /// Drain every queued job, collecting the outcomes
    pub fn run_to_completion(&mut self, doc: &dyn PdfDocument) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.step(doc) {
                StepOutcome::Idle => break,
                outcome => outcomes.push(outcome),
            }
        }
        outcomes
    }

    /// Rendered surface of a page (1-based)
    #[must_use]
    pub fn surface(&self, page: usize) -> Option<&PageSurface> {
        page.checked_sub(1)
            .and_then(|i| self.surfaces.get(i))
            .and_then(Option::as_ref)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &PageSurface> {
        self.surfaces.iter().flatten()
    }

    #[must_use]
    pub fn thumbnails(&self) -> &ThumbnailStrip {
        &self.thumbnails
    }

    pub fn thumbnails_mut(&mut self) -> &mut ThumbnailStrip {
        &mut self.thumbnails
    }
}

/// Render one page (1-based): raster plus positioned text layer
pub fn render_page(
    doc: &dyn PdfDocument,
    page_number: usize,
    scale: f32,
    rotation: Rotation,
) -> Result<PageSurface, DocumentError> {
    let index = page_number.saturating_sub(1);
    doc.check_index(index)?;

    let viewport = Viewport::new(doc.page_box(index)?, scale, rotation);
    let (width, height) = viewport.pixel_size();
    let raster = doc.rasterize(index, &viewport)?;

    let text_spans = doc
        .text_content(index)?
        .iter()
        .map(|run| viewport.place(run))
        .collect();

    Ok(PageSurface {
        page_number,
        scale,
        rotation,
        width,
        height,
        raster,
        text_spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryDocument;

    const UPRIGHT: RenderParams = RenderParams {
        scale: 1.0,
        rotation: Rotation::Deg0,
    };

    #[test]
    fn renders_every_page_in_order() {
        let doc = MemoryDocument::with_pages(&["a", "b", "c"]);
        let mut pipeline = RenderPipeline::new(0.2);
        pipeline.begin_full_render(3, UPRIGHT, false);

        let rendered: Vec<usize> = pipeline
            .run_to_completion(&doc)
            .into_iter()
            .filter_map(|o| match o {
                StepOutcome::PageRendered { page, .. } => Some(page),
                _ => None,
            })
            .collect();

        assert_eq!(rendered, vec![1, 2, 3]);
        assert_eq!(pipeline.surfaces().count(), 3);
        assert!(pipeline.is_idle());
    }

    #[test]
    fn newer_generation_supersedes_in_flight_render() {
        let doc = MemoryDocument::with_pages(&["a", "b", "c", "d"]);
        let mut pipeline = RenderPipeline::new(0.2);
        let first = pipeline.begin_full_render(4, UPRIGHT, false);
        assert!(matches!(pipeline.step(&doc), StepOutcome::PageRendered { page: 1, .. }));

        let second = pipeline.begin_full_render(
            4,
            RenderParams {
                scale: 2.0,
                rotation: Rotation::Deg0,
            },
            false,
        );
        assert!(second > first);
        assert_eq!(pipeline.surfaces().count(), 0);

        let outcomes = pipeline.run_to_completion(&doc);
        assert!(matches!(outcomes.last(), Some(StepOutcome::PagesFinished(g)) if *g == second));
        assert!(pipeline.surfaces().all(|s| s.scale == 2.0));
        assert_eq!(pipeline.surfaces().count(), 4);
    }

    #[test]
    fn thumbnails_wait_for_pages() {
        let doc = MemoryDocument::with_pages(&["a", "b"]);
        let mut pipeline = RenderPipeline::new(0.2);
        pipeline.begin_full_render(2, UPRIGHT, true);

        let outcomes = pipeline.run_to_completion(&doc);
        let pages_done = outcomes
            .iter()
            .position(|o| matches!(o, StepOutcome::PagesFinished(_)))
            .unwrap();
        let first_thumb = outcomes
            .iter()
            .position(|o| matches!(o, StepOutcome::ThumbnailRendered { .. }))
            .unwrap();
        assert!(pages_done < first_thumb);
        assert_eq!(pipeline.thumbnails().len(), 2);
    }

    #[test]
    fn pages_pending_clears_before_thumbnails_finish() {
        let doc = MemoryDocument::with_pages(&["a", "b"]);
        let mut pipeline = RenderPipeline::new(0.2);
        assert!(!pipeline.pages_pending());
        pipeline.begin_full_render(2, UPRIGHT, true);
        assert!(pipeline.pages_pending());

        while !matches!(pipeline.step(&doc), StepOutcome::PagesFinished(_)) {
            assert!(pipeline.pages_pending());
        }
        assert!(!pipeline.pages_pending());
        assert!(!pipeline.is_idle());
    }

    #[test]
    fn superseding_keeps_owed_thumbnail_pass() {
        let doc = MemoryDocument::with_pages(&["a", "b"]);
        let mut pipeline = RenderPipeline::new(0.2);
        pipeline.begin_full_render(
            2,
            RenderParams {
                scale: 1.0,
                rotation: Rotation::Deg90,
            },
            true,
        );
        pipeline.step(&doc);
        pipeline.begin_full_render(
            2,
            RenderParams {
                scale: 1.5,
                rotation: Rotation::Deg90,
            },
            false,
        );
        pipeline.run_to_completion(&doc);
        assert_eq!(pipeline.thumbnails().len(), 2);
        assert!(
            pipeline
                .thumbnails()
                .entries()
                .iter()
                .all(|t| t.rotation == Rotation::Deg90)
        );
    }

    #[test]
    fn failed_page_does_not_abort_the_rest() {
        let doc = MemoryDocument::with_pages(&["a", "b", "c"]).failing_render(2);
        let mut pipeline = RenderPipeline::new(0.2);
        pipeline.begin_full_render(3, UPRIGHT, false);

        let outcomes = pipeline.run_to_completion(&doc);
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, StepOutcome::PageFailed { page: 2, .. }))
        );
        assert!(pipeline.surface(1).is_some());
        assert!(pipeline.surface(2).is_none());
        assert!(pipeline.surface(3).is_some());
    }

    #[test]
    fn text_layer_uses_render_transform() {
        let doc = MemoryDocument::with_pages(&["Hello world"]);
        let surface = render_page(&doc, 1, 2.0, Rotation::Deg0).unwrap();
        assert_eq!((surface.width, surface.height), (1224, 1584));
        assert_eq!(surface.text_spans.len(), 1);
        assert_eq!(surface.text_spans[0].font_size, 24.0);
    }

    #[test]
    fn discard_drops_everything() {
        let doc = MemoryDocument::with_pages(&["a"]);
        let mut pipeline = RenderPipeline::new(0.2);
        pipeline.begin_full_render(1, UPRIGHT, true);
        pipeline.run_to_completion(&doc);
        pipeline.discard();
        assert!(pipeline.surface(1).is_none());
        assert!(pipeline.thumbnails().is_empty());
        assert!(pipeline.is_idle());
    }
}
