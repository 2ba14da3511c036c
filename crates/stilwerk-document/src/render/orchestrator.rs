// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document orchestrator — drives extraction, background synthesis and page
// reconstruction over a whole document and writes the restyled result.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use stilwerk_core::config::RestyleConfig;
use stilwerk_core::error::Result;
use tracing::{debug, info, instrument};

use crate::image::background::{BackgroundStyle, BackgroundSynthesizer};
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::PdfWriter;

use super::canvas::DisplayList;
use super::reconstruct::{PageReconstructor, PageReport};
use super::source::{MemorySource, PageSource};

/// One reconstructed page, not yet written to an output document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub width: f32,
    pub height: f32,
    pub display_list: DisplayList,
    pub report: PageReport,
}

/// Totals over a restyling run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestyleSummary {
    pub pages: usize,
    pub images_placed: usize,
    pub segments_drawn: usize,
    pub segments_ignored: usize,
    pub spans_drawn: usize,
    pub links: usize,
    /// Elements dropped across all pages.
    pub skipped: usize,
    pub reports: Vec<PageReport>,
}

impl RestyleSummary {
    pub fn from_reports(reports: Vec<PageReport>) -> Self {
        let mut summary = Self {
            pages: reports.len(),
            ..Default::default()
        };
        for report in &reports {
            summary.images_placed += report.images_placed;
            summary.segments_drawn += report.segments_drawn;
            summary.segments_ignored += report.segments_ignored;
            summary.spans_drawn += report.spans_drawn;
            summary.links += report.links.len();
            summary.skipped += report.skipped();
        }
        summary.reports = reports;
        summary
    }
}

/// Restyles whole documents according to a [`RestyleConfig`].
///
/// ```ignore
/// let restyler = Restyler::new(RestyleConfig::default())?;
/// let summary = restyler.restyle_file("input.pdf", "background.jpg", "restyled.pdf")?;
/// ```
#[derive(Debug, Clone)]
pub struct Restyler {
    config: RestyleConfig,
    reconstructor: PageReconstructor,
}

impl Restyler {
    pub fn new(config: RestyleConfig) -> Result<Self> {
        config.validate()?;
        let reconstructor = PageReconstructor::new(config.font_family);
        Ok(Self {
            config,
            reconstructor,
        })
    }

    /// Restyle the PDF at `source` over `cover` and save it to `output`.
    ///
    /// Both inputs are opened before any page work starts; failure to open
    /// either aborts the run without touching `output`.
    #[instrument(skip_all, fields(
        source = %source.as_ref().display(),
        output = %output.as_ref().display(),
    ))]
    pub fn restyle_file(
        &self,
        source: impl AsRef<Path>,
        cover: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<RestyleSummary> {
        let reader = PdfReader::open(source.as_ref())?;
        let synth = BackgroundSynthesizer::open(cover.as_ref(), BackgroundStyle::from(&self.config))?;

        let pages = self.restyle(&reader, &synth)?;
        let (writer, summary) = self.compose(pages);
        writer.save(output.as_ref())?;

        info!(
            pages = summary.pages,
            images = summary.images_placed,
            segments = summary.segments_drawn,
            spans = summary.spans_drawn,
            skipped = summary.skipped,
            "Document restyled"
        );
        Ok(summary)
    }

    /// Restyle `source` into serialised PDF bytes.
    pub fn render_pdf<S: PageSource + ?Sized>(
        &self,
        source: &S,
        synth: &BackgroundSynthesizer,
    ) -> Result<(Vec<u8>, RestyleSummary)> {
        let pages = self.restyle(source, synth)?;
        let (writer, summary) = self.compose(pages);
        Ok((writer.finish()?, summary))
    }

    /// Reconstruct every page of `source` into a display list, in page order.
    ///
    /// With `parallel` enabled the source is first captured into memory and
    /// pages are reconstructed on the rayon pool.
    #[instrument(skip_all, fields(pages = source.page_count(), parallel = self.config.parallel))]
    pub fn restyle<S: PageSource + ?Sized>(
        &self,
        source: &S,
        synth: &BackgroundSynthesizer,
    ) -> Result<Vec<RenderedPage>> {
        if self.config.parallel {
            let snapshot = MemorySource::capture(source)?;
            (0..snapshot.page_count())
                .into_par_iter()
                .map(|index| self.restyle_page(&snapshot, synth, index))
                .collect()
        } else {
            (0..source.page_count())
                .map(|index| self.restyle_page(source, synth, index))
                .collect()
        }
    }

    fn restyle_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        synth: &BackgroundSynthesizer,
        index: usize,
    ) -> Result<RenderedPage> {
        let page = source.page(index)?;
        let background = synth.synthesize(page.width, page.height, &mut self.page_rng(index))?;

        let mut display_list = DisplayList::new();
        let report = self
            .reconstructor
            .reconstruct(&page, background, source, &mut display_list);
        debug!(page = page.number, commands = display_list.len(), "Page recorded");

        Ok(RenderedPage {
            width: page.width,
            height: page.height,
            display_list,
            report,
        })
    }

    /// Grain generator for page `index`.
    fn page_rng(&self, index: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Replay rendered pages, in order, onto a fresh output document.
    fn compose(&self, pages: Vec<RenderedPage>) -> (PdfWriter, RestyleSummary) {
        let mut writer = PdfWriter::new(&self.config.title);
        let mut reports = Vec::with_capacity(pages.len());
        for page in pages {
            let RenderedPage {
                width,
                height,
                display_list,
                mut report,
            } = page;
            let refused = writer.add_page(width, height, |canvas| display_list.replay(canvas));
            report.images_skipped.extend(refused);
            reports.push(report);
        }
        (writer, RestyleSummary::from_reports(reports))
    }
}
