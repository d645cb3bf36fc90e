use std::fmt;

/// Half-open range `[start, stop)` of frame ids processed as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameWindow {
    /// First frame id (inclusive)
    pub start: u32,
    /// Last frame id (exclusive)
    pub stop: u32,
}

impl FrameWindow {
    /// Create a window.
    pub fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    /// Whether `frame` lies in the window.
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame < self.stop
    }

    /// Width in frame ids.
    pub fn len(&self) -> u32 {
        self.stop.saturating_sub(self.start)
    }

    /// Whether the window spans no frame id.
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }
}

impl fmt::Display for FrameWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Split the acquisition into windows of `chunk_size` boundary-led intervals.
///
/// Each boundary frame (a survey frame for LC, every frame for MALDI) opens an
/// interval that runs to the next boundary. Intervals are grouped
/// `chunk_size` at a time: all full chunks first, then one final partial
/// chunk. The first window starts at the lowest frame id and the last one
/// stops past the highest, so the windows cover every frame exactly once.
/// Without any boundary, every frame is its own interval.
pub fn plan_windows(frame_ids: &[u32], boundaries: &[u32], chunk_size: usize) -> Vec<FrameWindow> {
    let (Some(&first), Some(&last)) = (frame_ids.iter().min(), frame_ids.iter().max()) else {
        return Vec::new();
    };
    let chunk_size = chunk_size.max(1);

    let mut starts: Vec<u32> = if boundaries.is_empty() {
        frame_ids.to_vec()
    } else {
        boundaries.to_vec()
    };
    starts.sort_unstable();
    starts.dedup();
    starts.retain(|id| (first..=last).contains(id));
    match starts.first_mut() {
        Some(head) => *head = first,
        None => starts.push(first),
    }

    let end = last.saturating_add(1);
    let full_chunks = starts.len() / chunk_size;
    let mut windows = Vec::with_capacity(full_chunks + 1);

    for chunk in 0..full_chunks {
        let begin = chunk * chunk_size;
        let stop = starts.get(begin + chunk_size).copied().unwrap_or(end);
        windows.push(FrameWindow::new(starts[begin], stop));
    }
    let remainder = full_chunks * chunk_size;
    if remainder < starts.len() {
        windows.push(FrameWindow::new(starts[remainder], end));
    }
    windows
}
