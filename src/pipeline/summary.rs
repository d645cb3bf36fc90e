use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use super::count::expected_for_mode;
use crate::acquisition::{AcquisitionClassifier, AcquisitionMode, Layout, Schema};
use crate::source::{AcquisitionSource, ProviderError};

/// Classification of an acquisition, computed from metadata without
/// reading any peaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionSummary {
    /// Storage schema
    pub schema: Schema,
    /// LC or MALDI
    pub layout: Layout,
    /// Frames in the acquisition
    pub frames: usize,
    /// Frames per acquisition mode
    pub mode_counts: BTreeMap<AcquisitionMode, usize>,
    /// Frames no route classifies
    pub unclassified: usize,
    /// Spectra a full conversion would declare
    pub expected_spectra: usize,
    /// Retention time span in seconds, LC runs only
    pub retention_time: Option<(f64, f64)>,
}

impl AcquisitionSummary {
    /// Classify every frame of `source`.
    pub fn from_source(source: &dyn AcquisitionSource, ms2_only: bool) -> Result<Self, ProviderError> {
        let metadata = source.metadata();
        let layout = metadata.layout();
        let classifier = AcquisitionClassifier::new(metadata.schema, layout);

        let mut mode_counts = BTreeMap::new();
        let mut unclassified = 0;
        let mut expected_spectra = 0;
        let mut retention_time: Option<(f64, f64)> = None;
        let frame_ids = source.frame_ids();
        for &id in &frame_ids {
            let frame = source.frame(id)?;
            if !layout.is_maldi() {
                retention_time = Some(match retention_time {
                    Some((first, last)) => (first.min(frame.time), last.max(frame.time)),
                    None => (frame.time, frame.time),
                });
            }
            match classifier.classify_frame(&frame) {
                Some(mode) => {
                    *mode_counts.entry(mode).or_insert(0) += 1;
                    expected_spectra += expected_for_mode(source, mode, id, ms2_only);
                }
                None => unclassified += 1,
            }
        }

        Ok(Self {
            schema: metadata.schema,
            layout,
            frames: frame_ids.len(),
            mode_counts,
            unclassified,
            expected_spectra,
            retention_time,
        })
    }

    /// Format the summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            output.push_str(&format!(
                "{} {} ({:?})\n",
                style("Acquisition").bold().cyan(),
                style(self.schema).bold(),
                self.layout
            ));
            output.push_str(&format!(
                "  {}: {} total, {} unclassified\n",
                style("Frames").bold(),
                self.frames,
                style(self.unclassified).yellow()
            ));
            for (mode, n) in &self.mode_counts {
                output.push_str(&format!("    {:<22} {}\n", mode.label(), style(n).cyan()));
            }
            if let Some((first, last)) = self.retention_time {
                output.push_str(&format!("  {}: {first:.2}s - {last:.2}s\n", style("Retention time").bold()));
            }
            output.push_str(&format!(
                "  {}: {}\n",
                style("Expected spectra").bold(),
                style(self.expected_spectra).green()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for AcquisitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Acquisition {} ({:?})", self.schema, self.layout)?;
        writeln!(f, "  Frames: {} total, {} unclassified", self.frames, self.unclassified)?;
        for (mode, n) in &self.mode_counts {
            writeln!(f, "    {:<22} {}", mode.label(), n)?;
        }
        if let Some((first, last)) = self.retention_time {
            writeln!(f, "  Retention time: {first:.2}s - {last:.2}s")?;
        }
        writeln!(f, "  Expected spectra: {}", self.expected_spectra)
    }
}
