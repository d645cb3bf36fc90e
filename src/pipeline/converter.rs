use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::count::{expected_for_mode, expected_spectrum_count};
use super::{link, plan_windows, ConversionConfig, ConversionError, ConversionStats, FrameWindow, LinkedRecord};
use crate::builder::{BuildError, ScanRecordBuilder, WindowAccumulator};
use crate::source::{AcquisitionSource, ProviderError};
use crate::serializer::{RunMetadata, SpectrumSink, StreamingSerializer};

/// Shared flag that stops a running conversion at the next window boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frames, windows and declared count of a run, computed before streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    /// Frames to convert, ascending
    pub frame_ids: Vec<u32>,
    /// Window boundaries (survey frames for LC, every classified frame for MALDI)
    pub boundaries: Vec<u32>,
    /// Frame windows in processing order
    pub windows: Vec<FrameWindow>,
    /// Expected spectrum count
    pub declared: usize,
}

/// One built and linked window.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedWindow {
    /// Counters of the window (its `records` are moved into `records` below)
    pub accumulator: WindowAccumulator,
    /// Records in emission order
    pub records: Vec<LinkedRecord>,
}

/// Drives classification, extraction, linking and serialization of one acquisition.
///
/// Windows are processed one after another; with the `parallel` feature and
/// more than one worker, batches of `workers` windows are built on the rayon
/// pool and written in frame order.
pub struct Converter<'a> {
    source: &'a dyn AcquisitionSource,
    config: ConversionConfig,
    frames: Option<Vec<u32>>,
    cancellation: CancellationToken,
}

impl<'a> Converter<'a> {
    /// Converter for a source. Fails on an invalid configuration.
    pub fn new(source: &'a dyn AcquisitionSource, config: ConversionConfig) -> Result<Self, ConversionError> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            frames: None,
            cancellation: CancellationToken::new(),
        })
    }

    /// Stop at the next window boundary once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Restrict the run to a subset of frames.
    pub fn with_frames(mut self, mut frames: Vec<u32>) -> Self {
        frames.sort_unstable();
        frames.dedup();
        self.frames = Some(frames);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Frames this converter covers, ascending.
    pub fn frame_ids(&self) -> Vec<u32> {
        match &self.frames {
            Some(frames) => frames.clone(),
            None => self.source.frame_ids(),
        }
    }

    /// Classify every frame once to find window boundaries and the declared count.
    pub fn plan(&self) -> Result<ConversionPlan, ProviderError> {
        let builder = ScanRecordBuilder::new(self.source, &self.config);
        let classifier = builder.classifier();
        let maldi = classifier.layout().is_maldi();
        let frame_ids = self.frame_ids();

        let mut boundaries = Vec::new();
        let mut declared = 0;
        for &id in &frame_ids {
            let frame = self.source.frame(id)?;
            let Some(mode) = classifier.classify_frame(&frame) else {
                continue;
            };
            if maldi || mode.is_survey() {
                boundaries.push(id);
            }
            declared += expected_for_mode(self.source, mode, id, self.config.ms2_only);
        }

        let windows = plan_windows(&frame_ids, &boundaries, self.config.chunk_size);
        debug!(
            "Planned {} window(s) over {} frames, {} boundaries",
            windows.len(),
            frame_ids.len(),
            boundaries.len()
        );
        Ok(ConversionPlan {
            frame_ids,
            boundaries,
            windows,
            declared,
        })
    }

    /// Expected number of spectra, from metadata only.
    pub fn expected_count(&self) -> Result<usize, ProviderError> {
        let builder = ScanRecordBuilder::new(self.source, &self.config);
        expected_spectrum_count(self.source, builder.classifier(), self.config.ms2_only, &self.frame_ids())
    }

    /// Build one window and order its records parent-then-children.
    pub fn process_window(
        &self,
        builder: &ScanRecordBuilder<'_>,
        window: FrameWindow,
        frame_ids: &[u32],
    ) -> Result<ProcessedWindow, BuildError> {
        let mut accumulator = builder.build_window(window, frame_ids)?;
        let records = link(std::mem::take(&mut accumulator.records));
        Ok(ProcessedWindow { accumulator, records })
    }

    #[cfg(feature = "parallel")]
    fn process_batch(
        &self,
        builder: &ScanRecordBuilder<'_>,
        batch: &[FrameWindow],
        frame_ids: &[u32],
    ) -> Result<Vec<ProcessedWindow>, BuildError> {
        batch
            .par_iter()
            .map(|window| self.process_window(builder, *window, frame_ids))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn process_batch(
        &self,
        builder: &ScanRecordBuilder<'_>,
        batch: &[FrameWindow],
        frame_ids: &[u32],
    ) -> Result<Vec<ProcessedWindow>, BuildError> {
        batch
            .iter()
            .map(|window| self.process_window(builder, *window, frame_ids))
            .collect()
    }

    fn batch_size(&self) -> usize {
        if cfg!(feature = "parallel") {
            self.config.workers
        } else {
            if self.config.workers > 1 {
                warn!(
                    "{} workers requested but parallel support is not compiled in; converting sequentially",
                    self.config.workers
                );
            }
            1
        }
    }

    /// Convert into `sink`, returning the run statistics.
    pub fn convert<S: SpectrumSink>(&self, sink: S, run: &RunMetadata) -> Result<ConversionStats, ConversionError> {
        self.convert_into(sink, run).map(|(stats, _)| stats)
    }

    /// Convert into `sink`, returning the statistics and the finished sink.
    pub fn convert_into<S: SpectrumSink>(
        &self,
        sink: S,
        run: &RunMetadata,
    ) -> Result<(ConversionStats, S), ConversionError> {
        let started = Instant::now();
        info!(
            "Converting {} ({}, {} mode{})",
            run.run_id,
            run.schema,
            self.config.mode,
            if self.config.ms2_only { ", MS2 only" } else { "" }
        );

        let plan = self.plan()?;
        info!(
            "{} frames in {} window(s), {} spectra expected",
            plan.frame_ids.len(),
            plan.windows.len(),
            plan.declared
        );

        let mut serializer = StreamingSerializer::new(sink, self.config.write_options());
        serializer.write_metadata(run)?;
        serializer.begin(plan.declared)?;

        let builder = ScanRecordBuilder::new(self.source, &self.config);
        let mut stats = ConversionStats::new(run.run_id.clone());
        let total = plan.windows.len();

        for batch in plan.windows.chunks(self.batch_size().max(1)) {
            if self.cancellation.is_cancelled() {
                warn!("Conversion of {} cancelled after {} window(s)", run.run_id, stats.windows);
                return Err(ConversionError::Cancelled { windows: stats.windows });
            }
            for processed in self.process_batch(&builder, batch, &plan.frame_ids)? {
                serializer.write_window(&processed.records)?;
                stats.record_window(&processed.accumulator);
                info!(
                    "Window {}/{} {}: {} spectra ({} written so far)",
                    stats.windows,
                    total,
                    processed.accumulator.window,
                    processed.records.len(),
                    serializer.emitted()
                );
            }
        }

        let summary = serializer.finalize()?;
        stats.record_summary(&summary);
        stats.elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "Finished {}: {} spectra in {:.2}s",
            run.run_id, stats.emitted, stats.elapsed_seconds
        );
        Ok((stats, serializer.into_sink()))
    }
}
