//! Two-tier frame cache.
//!
//! The buffer window is a bounded run of decoded frames that favours forward
//! reads; it is replaced wholesale on every miss. The historic window retains
//! frames already decoded so that look-back reads (delta computation, sliding
//! contexts) never touch the file again. [`WindowCache::lookup`] is the only
//! place deciding where a frame is served from: historic first, then buffer.

/// Resolved historic retention policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HistoricPolicy {
    /// Every frame from index 0 up to the furthest decoded one
    All,
    /// The most recent run of at most this many frames
    Limited(usize),
    /// No retention
    Disabled,
}

/// Window that satisfied a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHit {
    /// Served from the historic window
    Historic,
    /// Served from the buffer window
    Buffer,
}

/// Lookup counters of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Frames served by the historic window
    pub historic_hits: u64,
    /// Frames served by the buffer window
    pub buffer_hits: u64,
    /// Lookups that needed a decode
    pub misses: u64,
}

impl CacheStats {
    pub(crate) fn record(&mut self, hit: CacheHit) {
        match hit {
            CacheHit::Historic => self.historic_hits += 1,
            CacheHit::Buffer => self.buffer_hits += 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BufferWindow {
    vect_size: usize,
    capacity: usize,
    first: usize,
    data: Vec<f32>,
}

impl BufferWindow {
    fn new(vect_size: usize, capacity: usize) -> Self {
        Self {
            vect_size,
            capacity: capacity.max(1),
            first: 0,
            data: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        if self.vect_size == 0 {
            0
        } else {
            self.data.len() / self.vect_size
        }
    }

    fn end(&self) -> usize {
        self.first + self.len()
    }

    fn contains(&self, index: usize) -> bool {
        index >= self.first && index < self.end()
    }

    fn frame(&self, index: usize) -> Option<&[f32]> {
        if !self.contains(index) {
            return None;
        }
        let start = (index - self.first) * self.vect_size;
        Some(&self.data[start..start + self.vect_size])
    }

    fn replace(&mut self, first: usize, data: Vec<f32>) {
        self.first = first;
        self.data = data;
    }

    fn mirror(&mut self, index: usize, frame: &[f32]) {
        if self.contains(index) {
            let start = (index - self.first) * self.vect_size;
            self.data[start..start + self.vect_size].copy_from_slice(frame);
        } else if index == self.end() && self.len() > 0 && self.len() < self.capacity {
            self.data.extend_from_slice(frame);
        } else {
            let mut data = Vec::with_capacity(self.capacity * self.vect_size);
            data.extend_from_slice(frame);
            self.replace(index, data);
        }
    }

    fn clear(&mut self) {
        self.first = 0;
        self.data.clear();
    }
}

#[derive(Debug)]
pub(crate) struct HistoricWindow {
    policy: HistoricPolicy,
    vect_size: usize,
    first: usize,
    // Evicted frames still at the front of `data`
    head: usize,
    data: Vec<f32>,
}

impl HistoricWindow {
    fn new(vect_size: usize, policy: HistoricPolicy) -> Self {
        Self {
            policy,
            vect_size,
            first: 0,
            head: 0,
            data: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        if self.vect_size == 0 {
            0
        } else {
            self.data.len() / self.vect_size - self.head
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn end(&self) -> usize {
        self.first + self.len()
    }

    fn contains(&self, index: usize) -> bool {
        index >= self.first && index < self.end()
    }

    fn frame(&self, index: usize) -> Option<&[f32]> {
        if !self.contains(index) {
            return None;
        }
        let start = (self.head + index - self.first) * self.vect_size;
        Some(&self.data[start..start + self.vect_size])
    }

    /// Retain a freshly decoded run of frames starting at `first`
    fn absorb(&mut self, first: usize, frames: &[f32]) {
        if self.vect_size == 0 {
            return;
        }
        let count = frames.len() / self.vect_size;
        let run_end = first + count;
        if count == 0 {
            return;
        }

        match self.policy {
            HistoricPolicy::Disabled => {}
            HistoricPolicy::All => {
                // Always [0, end); runs starting past `end` need a gap fill first
                let end = self.end();
                if first <= end && run_end > end {
                    self.data
                        .extend_from_slice(&frames[(end - first) * self.vect_size..]);
                }
            }
            HistoricPolicy::Limited(capacity) => {
                let end = self.end();
                if !self.is_empty() && first >= self.first && first <= end && run_end > end {
                    self.data
                        .extend_from_slice(&frames[(end - first) * self.vect_size..]);
                } else if self.is_empty() || first < self.first || first > end {
                    self.data.clear();
                    self.head = 0;
                    self.first = first;
                    self.data.extend_from_slice(frames);
                }
                self.evict(capacity);
            }
        }
    }

    fn evict(&mut self, capacity: usize) {
        let len = self.len();
        if len <= capacity {
            return;
        }
        let dropped = len - capacity;
        self.head += dropped;
        self.first += dropped;
        if self.head >= capacity {
            self.data.drain(..self.head * self.vect_size);
            self.head = 0;
        }
    }

    fn update(&mut self, index: usize, frame: &[f32]) {
        if self.contains(index) {
            let start = (self.head + index - self.first) * self.vect_size;
            self.data[start..start + self.vect_size].copy_from_slice(frame);
        } else {
            self.absorb(index, frame);
        }
    }

    fn clear(&mut self) {
        self.first = 0;
        self.head = 0;
        self.data.clear();
    }
}

/// Buffer and historic windows of one open stream
#[derive(Debug)]
pub(crate) struct WindowCache {
    buffer: BufferWindow,
    historic: HistoricWindow,
}

impl WindowCache {
    pub(crate) fn new(vect_size: usize, buffer_capacity: usize, policy: HistoricPolicy) -> Self {
        Self {
            buffer: BufferWindow::new(vect_size, buffer_capacity),
            historic: HistoricWindow::new(vect_size, policy),
        }
    }

    /// Locate frame `index` without touching the file
    pub(crate) fn lookup(&self, index: usize) -> Option<(CacheHit, &[f32])> {
        if let Some(frame) = self.historic.frame(index) {
            return Some((CacheHit::Historic, frame));
        }
        self.buffer
            .frame(index)
            .map(|frame| (CacheHit::Buffer, frame))
    }

    pub(crate) fn buffer_capacity(&self) -> usize {
        self.buffer.capacity
    }

    pub(crate) fn historic_policy(&self) -> HistoricPolicy {
        self.historic.policy
    }

    /// Index one past the last historic frame
    pub(crate) fn historic_end(&self) -> usize {
        self.historic.end()
    }

    /// Install a decoded run as the new buffer window
    pub(crate) fn fill(&mut self, first: usize, frames: Vec<f32>) {
        self.historic.absorb(first, &frames);
        self.buffer.replace(first, frames);
    }

    /// Feed decoded frames to the historic window only
    pub(crate) fn retain(&mut self, first: usize, frames: &[f32]) {
        self.historic.absorb(first, frames);
    }

    /// Keep both windows consistent with a frame just written
    pub(crate) fn mirror(&mut self, index: usize, frame: &[f32]) {
        self.buffer.mirror(index, frame);
        self.historic.update(index, frame);
    }

    pub(crate) fn invalidate_buffer(&mut self) {
        self.buffer.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.historic.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(range: std::ops::Range<usize>) -> Vec<f32> {
        range.flat_map(|i| [i as f32, -(i as f32)]).collect()
    }

    #[test]
    fn test_lookup_prefers_historic() {
        let mut cache = WindowCache::new(2, 4, HistoricPolicy::All);
        cache.fill(0, frames(0..4));
        assert_eq!(cache.lookup(2).unwrap(), (CacheHit::Historic, &[2.0, -2.0][..]));
        assert!(cache.lookup(4).is_none());
    }

    #[test]
    fn test_lookup_falls_back_to_buffer() {
        let mut cache = WindowCache::new(2, 4, HistoricPolicy::Disabled);
        cache.fill(10, frames(10..14));
        assert_eq!(cache.lookup(13).unwrap(), (CacheHit::Buffer, &[13.0, -13.0][..]));
        assert!(cache.lookup(9).is_none());
        assert!(cache.lookup(14).is_none());
    }

    #[test]
    fn test_all_policy_keeps_everything_from_zero() {
        let mut cache = WindowCache::new(2, 3, HistoricPolicy::All);
        cache.fill(0, frames(0..3));
        cache.fill(3, frames(3..6));
        cache.fill(6, frames(6..8));
        assert_eq!(cache.historic_end(), 8);
        for i in 0..8 {
            assert_eq!(cache.lookup(i).unwrap().0, CacheHit::Historic);
        }
    }

    #[test]
    fn test_all_policy_ignores_runs_past_a_gap() {
        let mut cache = WindowCache::new(2, 3, HistoricPolicy::All);
        cache.fill(5, frames(5..8));
        assert_eq!(cache.historic_end(), 0);
        assert_eq!(cache.lookup(6).unwrap().0, CacheHit::Buffer);

        cache.retain(0, &frames(0..5));
        cache.fill(5, frames(5..8));
        assert_eq!(cache.historic_end(), 8);
    }

    #[test]
    fn test_limited_policy_evicts_oldest() {
        let mut cache = WindowCache::new(2, 2, HistoricPolicy::Limited(3));
        cache.fill(0, frames(0..2));
        cache.fill(2, frames(2..4));
        cache.fill(4, frames(4..6));
        // historic keeps 3..6, buffer holds 4..6
        assert!(cache.lookup(2).is_none());
        assert_eq!(cache.lookup(3).unwrap().0, CacheHit::Historic);
        assert_eq!(cache.lookup(5).unwrap(), (CacheHit::Historic, &[5.0, -5.0][..]));
    }

    #[test]
    fn test_limited_policy_resets_on_jump() {
        let mut cache = WindowCache::new(2, 2, HistoricPolicy::Limited(4));
        cache.fill(0, frames(0..2));
        cache.fill(100, frames(100..102));
        assert!(cache.lookup(0).is_none());
        assert_eq!(cache.lookup(101).unwrap().0, CacheHit::Historic);
        assert_eq!(cache.historic_end(), 102);
    }

    #[test]
    fn test_limited_eviction_compacts_storage() {
        let mut cache = WindowCache::new(1, 1, HistoricPolicy::Limited(2));
        for i in 0..50 {
            cache.fill(i, vec![i as f32]);
        }
        assert!(cache.historic.data.len() <= 4);
        assert_eq!(cache.lookup(48).unwrap(), (CacheHit::Historic, &[48.0][..]));
        assert_eq!(cache.lookup(49).unwrap(), (CacheHit::Historic, &[49.0][..]));
        assert!(cache.lookup(47).is_none());
    }

    #[test]
    fn test_mirror_makes_written_frame_readable() {
        let mut cache = WindowCache::new(2, 4, HistoricPolicy::Disabled);
        cache.fill(0, frames(0..2));

        cache.mirror(1, &[7.0, 7.0]);
        assert_eq!(cache.lookup(1).unwrap().1, &[7.0, 7.0]);

        cache.mirror(2, &[8.0, 8.0]);
        assert_eq!(cache.lookup(2).unwrap().1, &[8.0, 8.0]);
        assert_eq!(cache.lookup(0).unwrap().1, &[0.0, -0.0]);

        cache.mirror(40, &[9.0, 9.0]);
        assert_eq!(cache.lookup(40).unwrap(), (CacheHit::Buffer, &[9.0, 9.0][..]));
        assert!(cache.lookup(0).is_none());
    }

    #[test]
    fn test_mirror_updates_historic_copy() {
        let mut cache = WindowCache::new(2, 2, HistoricPolicy::All);
        cache.fill(0, frames(0..2));
        cache.fill(2, frames(2..4));
        cache.mirror(0, &[5.0, 5.0]);
        assert_eq!(cache.lookup(0).unwrap(), (CacheHit::Historic, &[5.0, 5.0][..]));
        cache.mirror(4, &[6.0, 6.0]);
        assert_eq!(cache.historic_end(), 5);
    }

    #[test]
    fn test_clear_drops_both_windows() {
        let mut cache = WindowCache::new(2, 4, HistoricPolicy::All);
        cache.fill(0, frames(0..4));
        cache.clear();
        assert!(cache.lookup(0).is_none());
        assert_eq!(cache.historic_end(), 0);
    }
}
