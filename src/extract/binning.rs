//! Re-binning of merged, non-uniform peak lists.
//!
//! Points are assigned to slots by right-open digitization against a sorted
//! edge array: slot `k` is the number of edges `<= x`. Every occupied slot
//! collapses to one point whose m/z is the intensity-weighted mean of its
//! members and whose intensity is their sum.

use log::warn;

/// Most edges [`BinEdges::fixed_width`] will generate.
pub const MAX_BIN_EDGES: usize = 1 << 22;

/// Sorted bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Use explicit edges. They are sorted if needed.
    pub fn explicit(mut edges: Vec<f64>) -> Self {
        edges.sort_by(f64::total_cmp);
        Self { edges }
    }

    /// `n` evenly spaced edges from `lo` to `hi` inclusive.
    ///
    /// The last edge is exactly `hi`. `n == 0` yields no edges.
    pub fn uniform(lo: f64, hi: f64, n: usize) -> Self {
        let edges = match n {
            0 => Vec::new(),
            1 => vec![lo],
            _ => {
                let step = (hi - lo) / (n - 1) as f64;
                let mut edges: Vec<f64> = (0..n - 1).map(|i| lo + step * i as f64).collect();
                edges.push(hi);
                edges
            }
        };
        Self { edges }
    }

    /// Number of edges `fixed_width(lo, hi, width)` asks for before the
    /// [`MAX_BIN_EDGES`] cap, 0 when the width or the range is unusable.
    pub fn fixed_width_count(lo: f64, hi: f64, width: f64) -> usize {
        if !(width > 0.0 && width.is_finite()) || !(hi > lo) || !(hi - lo).is_finite() {
            return 0;
        }
        let count = ((hi - lo) / width).ceil();
        if count >= usize::MAX as f64 {
            usize::MAX
        } else {
            count as usize
        }
    }

    /// Edges `lo, lo + w, lo + 2w, ...` strictly below `hi`.
    ///
    /// Yields no edges for a non-positive or non-finite width or an empty range.
    /// At most [`MAX_BIN_EDGES`] edges are generated.
    pub fn fixed_width(lo: f64, hi: f64, width: f64) -> Self {
        let count = Self::fixed_width_count(lo, hi, width);
        if count > MAX_BIN_EDGES {
            warn!(
                "{count} bins of width {width} over [{lo}, {hi}) exceed the limit; keeping the first {MAX_BIN_EDGES}"
            );
        }
        let edges = (0..count.min(MAX_BIN_EDGES))
            .map(|i| lo + width * i as f64)
            .filter(|edge| *edge < hi)
            .collect();
        Self { edges }
    }

    /// The edges.
    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Slot of `x`: the number of edges `<= x`.
    pub fn slot(&self, x: f64) -> usize {
        self.edges.partition_point(|edge| *edge <= x)
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotAccumulator {
    slot: usize,
    weighted_mz: f64,
    mz_sum: f64,
    intensity: f64,
    count: usize,
    min_mz: f64,
    max_mz: f64,
}

impl SlotAccumulator {
    fn new(slot: usize, mz: f64, intensity: f64) -> Self {
        Self {
            slot,
            weighted_mz: mz * intensity,
            mz_sum: mz,
            intensity,
            count: 1,
            min_mz: mz,
            max_mz: mz,
        }
    }

    fn add(&mut self, mz: f64, intensity: f64) {
        self.weighted_mz += mz * intensity;
        self.mz_sum += mz;
        self.intensity += intensity;
        self.count += 1;
        self.min_mz = self.min_mz.min(mz);
        self.max_mz = self.max_mz.max(mz);
    }

    fn centroid(&self) -> f64 {
        let mean = if self.intensity != 0.0 {
            self.weighted_mz / self.intensity
        } else {
            self.mz_sum / self.count as f64
        };
        mean.clamp(self.min_mz, self.max_mz)
    }
}

/// Collapses peak lists onto a fixed set of bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumBinner {
    edges: BinEdges,
}

impl SpectrumBinner {
    /// Binner over the given edges.
    pub fn new(edges: BinEdges) -> Self {
        Self { edges }
    }

    /// Edges in use.
    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Bin a peak list. Input order does not matter; output is sorted by m/z.
    ///
    /// Without edges the input is returned unchanged.
    pub fn bin(&self, mz: &[f64], intensity: &[f64]) -> (Vec<f64>, Vec<f64>) {
        bin_spectrum(mz, intensity, &self.edges)
    }
}

/// Bin `mz`/`intensity` onto `edges`.
pub fn bin_spectrum(mz: &[f64], intensity: &[f64], edges: &BinEdges) -> (Vec<f64>, Vec<f64>) {
    if edges.is_empty() {
        return (mz.to_vec(), intensity.to_vec());
    }

    let mut points: Vec<(usize, f64, f64)> = mz
        .iter()
        .zip(intensity)
        .map(|(&m, &i)| (edges.slot(m), m, i))
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut slots: Vec<SlotAccumulator> = Vec::new();
    for (slot, m, i) in points {
        match slots.last_mut() {
            Some(acc) if acc.slot == slot => acc.add(m, i),
            _ => slots.push(SlotAccumulator::new(slot, m, i)),
        }
    }

    slots
        .iter()
        .map(|acc| (acc.centroid(), acc.intensity))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_matches_linspace() {
        let edges = BinEdges::uniform(1.0, 2.0, 5);
        assert_eq!(edges.as_slice(), &[1.0, 1.25, 1.5, 1.75, 2.0]);
        assert_eq!(BinEdges::uniform(1.0, 2.0, 1).as_slice(), &[1.0]);
        assert!(BinEdges::uniform(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_fixed_width_matches_arange() {
        let edges = BinEdges::fixed_width(100.0, 100.02, 0.005);
        assert_eq!(edges.len(), 4);
        assert!(edges.as_slice().iter().all(|e| *e < 100.02));
        assert!(BinEdges::fixed_width(1.0, 2.0, 0.0).is_empty());
        assert!(BinEdges::fixed_width(2.0, 1.0, 0.1).is_empty());
    }

    #[test]
    fn test_fixed_width_is_capped() {
        assert!(BinEdges::fixed_width_count(100.0, 1700.0, 1e-9) > 1_000_000_000_000);
        assert_eq!(BinEdges::fixed_width_count(0.0, f64::INFINITY, 1.0), 0);
        let edges = BinEdges::fixed_width(0.0, 1.0, 1e-9);
        assert_eq!(edges.len(), MAX_BIN_EDGES);
    }

    #[test]
    fn test_right_open_digitization() {
        let edges = BinEdges::explicit(vec![1.0, 2.0, 3.0]);
        assert_eq!(edges.slot(0.5), 0);
        assert_eq!(edges.slot(1.0), 1);
        assert_eq!(edges.slot(1.999), 1);
        assert_eq!(edges.slot(3.0), 3);
        assert_eq!(edges.slot(10.0), 3);
    }

    #[test]
    fn test_two_bin_scenario() {
        let mz = [1.0, 1.02, 1.03, 5.0];
        let intensity = [10.0, 5.0, 5.0, 1.0];
        let (out_mz, out_int) = bin_spectrum(&mz, &intensity, &BinEdges::uniform(1.0, 5.0, 2));
        assert_eq!(out_mz.len(), 2);
        assert!((out_mz[0] - 1.0125).abs() < 1e-12);
        assert_eq!(out_mz[1], 5.0);
        assert_eq!(out_int, vec![20.0, 1.0]);
        assert_eq!(out_int.iter().sum::<f64>(), 21.0);
    }

    #[test]
    fn test_zero_intensity_slot_uses_plain_mean() {
        let edges = BinEdges::explicit(vec![0.0, 10.0]);
        let (out_mz, out_int) = bin_spectrum(&[2.0, 4.0], &[0.0, 0.0], &edges);
        assert_eq!(out_mz, vec![3.0]);
        assert_eq!(out_int, vec![0.0]);
    }

    #[test]
    fn test_binning_is_a_fixed_point() {
        let edges = BinEdges::fixed_width(100.0, 101.0, 0.1);
        let mz = [100.01, 100.02, 100.33, 100.36, 100.9, 100.91];
        let intensity = [1.0, 3.0, 2.0, 2.0, 7.0, 0.5];
        let once = bin_spectrum(&mz, &intensity, &edges);
        let twice = bin_spectrum(&once.0, &once.1, &edges);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_edges_passes_through() {
        let (mz, int) = bin_spectrum(&[3.0, 1.0], &[1.0, 2.0], &BinEdges::uniform(0.0, 1.0, 0));
        assert_eq!(mz, vec![3.0, 1.0]);
        assert_eq!(int, vec![1.0, 2.0]);
    }
}
