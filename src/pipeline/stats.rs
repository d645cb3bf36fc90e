use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use crate::acquisition::AcquisitionMode;
use crate::builder::WindowAccumulator;
use crate::serializer::SerializationSummary;

/// Statistics from a completed conversion run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionStats {
    /// Run identifier (output stem)
    pub run_id: String,
    /// Frames read from the source
    pub frames_seen: usize,
    /// Frames no route classifies
    pub skipped_frames: usize,
    /// Frame windows processed
    pub windows: usize,
    /// Spectrum count declared when the spectrum list opened
    pub declared: usize,
    /// Spectra written
    pub emitted: usize,
    /// Candidate spectra dropped for having no peaks
    pub dropped: usize,
    /// Whether the declared count had to be corrected
    pub corrected: bool,
    /// Spectra per acquisition mode
    pub mode_counts: BTreeMap<AcquisitionMode, usize>,
    /// Wall-clock time in seconds
    pub elapsed_seconds: f64,
}

impl ConversionStats {
    /// Empty statistics for a run.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Fold one built window into the totals.
    pub fn record_window(&mut self, acc: &WindowAccumulator) {
        self.windows += 1;
        self.frames_seen += acc.frames_seen;
        self.skipped_frames += acc.skipped_frames;
        self.dropped += acc.dropped;
        for (mode, count) in &acc.mode_counts {
            *self.mode_counts.entry(*mode).or_insert(0) += count;
        }
    }

    /// Take over the serializer's count reconciliation.
    pub fn record_summary(&mut self, summary: &SerializationSummary) {
        self.declared = summary.declared;
        self.emitted = summary.emitted;
        self.corrected = summary.corrected;
    }

    /// Spectra per second.
    pub fn throughput(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.emitted as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }

    /// Format the statistics with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            output.push_str(&format!("{} {}\n", style("Run").bold().cyan(), style(&self.run_id).bold()));
            output.push_str(&format!(
                "  {}: {} seen, {} skipped, {} window(s)\n",
                style("Frames").bold(),
                self.frames_seen,
                style(self.skipped_frames).yellow(),
                self.windows
            ));
            let count = if self.corrected {
                style(format!("{} (declared {})", self.emitted, self.declared)).yellow()
            } else {
                style(self.emitted.to_string()).green()
            };
            output.push_str(&format!(
                "  {}: {} written, {} empty dropped\n",
                style("Spectra").bold(),
                count,
                self.dropped
            ));
            for (mode, n) in &self.mode_counts {
                output.push_str(&format!("    {:<22} {}\n", mode.label(), style(n).cyan()));
            }
            output.push_str(&format!(
                "  {}: {:.2}s ({:.1} spectra/s)\n",
                style("Elapsed").bold(),
                self.elapsed_seconds,
                self.throughput()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(
            f,
            "  Frames: {} seen, {} skipped, {} window(s)",
            self.frames_seen, self.skipped_frames, self.windows
        )?;
        if self.corrected {
            writeln!(
                f,
                "  Spectra: {} written (declared {}), {} empty dropped",
                self.emitted, self.declared, self.dropped
            )?;
        } else {
            writeln!(f, "  Spectra: {} written, {} empty dropped", self.emitted, self.dropped)?;
        }
        for (mode, n) in &self.mode_counts {
            writeln!(f, "    {:<22} {}", mode.label(), n)?;
        }
        writeln!(
            f,
            "  Elapsed: {:.2}s ({:.1} spectra/s)",
            self.elapsed_seconds,
            self.throughput()
        )
    }
}
