use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use super::cache::{CacheStats, HistoricPolicy, WindowCache};
use super::codec::FeatureCodec;
use super::config::{ReaderConfig, DEFAULT_BUFFER_SIZE};
use super::FeatureError;
use crate::feature::{Feature, FeatureFlags};
use crate::format::{FormatDescriptor, FormatSpec, SourceRef, SourceTable};
use crate::io::{FrameFile, IoStats};

/// I/O and cache counters of an open stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Calls that reached the file
    pub io: IoStats,
    /// Window lookups
    pub cache: CacheStats,
}

impl fmt::Display for StreamStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {} historic hits, {} buffer hits, {} misses",
            self.io, self.cache.historic_hits, self.cache.buffer_hits, self.cache.misses
        )
    }
}

/// Everything that exists only while the file is open
#[derive(Debug)]
struct OpenStream {
    file: FrameFile,
    descriptor: FormatDescriptor,
    cache: WindowCache,
    cache_stats: CacheStats,
    scratch: Vec<u8>,
}

/// Lifecycle of a [`FeatureFile`]: nothing is read until the first access
/// needing the header, and the cursor only exists once frames are accessed
/// sequentially.
#[derive(Debug)]
enum StreamState {
    Unopened,
    HeaderParsed(Box<OpenStream>),
    Positioned {
        stream: Box<OpenStream>,
        position: usize,
    },
}

/// Feature file with lazy header parsing and a buffer/historic frame cache.
///
/// The cursor is the index of the next frame to read or write. Reading past
/// the last frame returns `Ok(false)`.
///
/// ```rust,no_run
/// use featstream::{Feature, ReaderConfig, SPro4File};
///
/// let config = ReaderConfig::default()
///     .with_feature_files_path("/data/prm")
///     .with_extension(".prm");
/// let mut file = SPro4File::new("spk01", &config)?;
///
/// let mut feature = Feature::default();
/// while file.read_feature(&mut feature, 1)? {
///     println!("{}", feature);
/// }
/// # Ok::<(), featstream::FeatureError>(())
/// ```
pub struct FeatureFile<C: FeatureCodec> {
    path: PathBuf,
    source_name: String,
    config: ReaderConfig,
    state: StreamState,
    _codec: PhantomData<fn() -> C>,
}

impl<C: FeatureCodec> fmt::Debug for FeatureFile<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFile")
            .field("format", &C::NAME)
            .field("path", &self.path)
            .field("source_name", &self.source_name)
            .field("state", &self.state)
            .finish()
    }
}

fn default_source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl<C: FeatureCodec> FeatureFile<C> {
    /// Prepare a reader for the file `name`, resolved through the configured
    /// directory and extension. No I/O happens here.
    pub fn new(name: &str, config: &ReaderConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self {
            path: config.resolve_path(name),
            source_name: name.to_string(),
            config: config.clone(),
            state: StreamState::Unopened,
            _codec: PhantomData,
        })
    }

    /// Prepare a reader for an explicit path, ignoring the configured
    /// directory and extension
    pub fn with_path(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        Ok(Self {
            source_name: default_source_name(&path),
            path,
            config: config.clone(),
            state: StreamState::Unopened,
            _codec: PhantomData,
        })
    }

    /// Create (or truncate) a file and write its header. The returned stream
    /// is writable, holds no frames and is positioned at 0.
    pub fn create(
        path: impl AsRef<Path>,
        spec: FormatSpec,
        config: &ReaderConfig,
    ) -> Result<Self, FeatureError> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        if spec.vect_size == 0 || spec.vect_size > u16::MAX as usize {
            return Err(FeatureError::InvalidData(format!(
                "vector size {} outside 1..={}",
                spec.vect_size,
                u16::MAX
            )));
        }

        let source_name = default_source_name(&path);
        let sources = if spec.sources.is_empty() {
            SourceTable::single(source_name.clone(), 0)
        } else {
            SourceTable::from_counts(spec.sources)?.with_total(0)
        };

        let mut file = FrameFile::create(&path)?;
        let mut descriptor = FormatDescriptor {
            vect_size: spec.vect_size,
            flags: spec.flags,
            sample_rate: spec.sample_rate,
            feature_count: 0,
            header_length: 0,
            byte_order: spec.byte_order,
            sources,
        };
        descriptor.header_length = C::write_header(&mut file, &descriptor)?;
        debug!(
            "Created {} file {} ({})",
            C::NAME,
            path.display(),
            descriptor
        );

        let config = config.clone().writable(true);
        let stream = OpenStream::new(file, descriptor, &config);
        Ok(Self {
            path,
            source_name,
            config,
            state: StreamState::Positioned {
                stream: Box::new(stream),
                position: 0,
            },
            _codec: PhantomData,
        })
    }

    /// Resolved path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration the stream was built with
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// True once the header has been parsed and the file handle is held
    pub fn is_open(&self) -> bool {
        !matches!(self.state, StreamState::Unopened)
    }

    /// Index of the next frame to read or write
    pub fn position(&self) -> usize {
        match &self.state {
            StreamState::Positioned { position, .. } => *position,
            _ => 0,
        }
    }

    fn open(&mut self) -> Result<&mut OpenStream, FeatureError> {
        if matches!(self.state, StreamState::Unopened) {
            let mut file = FrameFile::open(&self.path, self.config.writable)?;
            let descriptor = C::read_header(&mut file, self.config.byte_order, &self.source_name)?;
            debug!("Opened {} file {} ({})", C::NAME, self.path.display(), descriptor);
            let stream = OpenStream::new(file, descriptor, &self.config);
            self.state = StreamState::HeaderParsed(Box::new(stream));
        }
        match &mut self.state {
            StreamState::HeaderParsed(stream) | StreamState::Positioned { stream, .. } => {
                Ok(&mut **stream)
            }
            StreamState::Unopened => unreachable!("stream opened above"),
        }
    }

    fn positioned(&mut self) -> Result<(&mut OpenStream, &mut usize), FeatureError> {
        self.open()?;
        if let StreamState::HeaderParsed(_) = self.state {
            if let StreamState::HeaderParsed(stream) =
                std::mem::replace(&mut self.state, StreamState::Unopened)
            {
                self.state = StreamState::Positioned {
                    stream,
                    position: 0,
                };
            }
        }
        match &mut self.state {
            StreamState::Positioned { stream, position } => Ok((&mut **stream, position)),
            _ => unreachable!("stream positioned above"),
        }
    }

    /// Parsed header of the file
    pub fn descriptor(&mut self) -> Result<&FormatDescriptor, FeatureError> {
        Ok(&self.open()?.descriptor)
    }

    /// Number of frames in the file
    pub fn feature_count(&mut self) -> Result<usize, FeatureError> {
        Ok(self.open()?.descriptor.feature_count)
    }

    /// Coefficients per frame
    pub fn vect_size(&mut self) -> Result<usize, FeatureError> {
        Ok(self.open()?.descriptor.vect_size)
    }

    /// Channel groups present in every frame
    pub fn feature_flags(&mut self) -> Result<FeatureFlags, FeatureError> {
        Ok(self.open()?.descriptor.flags)
    }

    /// Frame rate in Hz
    pub fn sample_rate(&mut self) -> Result<f32, FeatureError> {
        Ok(self.open()?.descriptor.sample_rate)
    }

    /// Number of sources multiplexed in the file
    pub fn source_count(&mut self) -> Result<usize, FeatureError> {
        Ok(self.open()?.descriptor.sources.len())
    }

    /// Number of frames of a source
    pub fn feature_count_of_source(&mut self, source: SourceRef<'_>) -> Result<usize, FeatureError> {
        Ok(self.open()?.descriptor.sources.span(source)?.count)
    }

    /// Global index of the first frame of a source
    pub fn first_feature_index_of_source(
        &mut self,
        source: SourceRef<'_>,
    ) -> Result<usize, FeatureError> {
        Ok(self.open()?.descriptor.sources.span(source)?.first)
    }

    /// Name of the source at `index`
    pub fn source_name(&mut self, index: usize) -> Result<&str, FeatureError> {
        self.open()?.descriptor.sources.name(index)
    }

    /// Source holding the global frame `index`, `None` past the end
    pub fn source_of_feature(&mut self, index: usize) -> Result<Option<usize>, FeatureError> {
        Ok(self.open()?.descriptor.sources.source_of_feature(index))
    }

    /// Move the cursor. `index == feature_count` is allowed and positions
    /// the cursor for appending.
    pub fn seek_feature(&mut self, index: usize) -> Result<(), FeatureError> {
        let (stream, position) = self.positioned()?;
        let count = stream.descriptor.feature_count;
        if index > count {
            return Err(FeatureError::OutOfBounds { index, count });
        }
        *position = index;
        Ok(())
    }

    /// Decode the frame at the cursor into `out`, then advance the cursor by
    /// `step`. A `step` of 0 keeps the cursor in place.
    ///
    /// Returns `Ok(false)` once the cursor is past the last frame. On error
    /// the cursor does not move.
    pub fn read_feature(&mut self, out: &mut Feature, step: usize) -> Result<bool, FeatureError> {
        let (stream, position) = self.positioned()?;
        if *position >= stream.descriptor.feature_count {
            return Ok(false);
        }
        stream.load::<C>(*position, out)?;
        *position = position.saturating_add(step);
        Ok(true)
    }

    /// Decode frame `index` into `out` without moving the cursor
    pub fn read_feature_at(&mut self, index: usize, out: &mut Feature) -> Result<(), FeatureError> {
        let stream = self.open()?;
        let count = stream.descriptor.feature_count;
        if index >= count {
            return Err(FeatureError::OutOfBounds { index, count });
        }
        stream.load::<C>(index, out)
    }

    /// Write `feature` at the cursor, then advance the cursor by `step`.
    ///
    /// Writing at `feature_count` appends a frame to the last source.
    /// Returns `Ok(false)` when the cursor is past the end, since that
    /// would leave a gap.
    pub fn write_feature(&mut self, feature: &Feature, step: usize) -> Result<bool, FeatureError> {
        if !self.config.writable {
            return Err(FeatureError::ReadOnly {
                path: self.path.clone(),
            });
        }
        let (stream, position) = self.positioned()?;
        let expected = stream.descriptor.vect_size;
        if feature.vect_size() != expected {
            return Err(FeatureError::DimensionMismatch {
                expected,
                actual: feature.vect_size(),
            });
        }
        if *position > stream.descriptor.feature_count {
            return Ok(false);
        }
        stream.write_frame::<C>(*position, feature.as_slice())?;
        *position = position.saturating_add(step);
        Ok(true)
    }

    /// Decode as many whole frames as fit in `storage`, starting at the
    /// cursor, straight into the caller's memory.
    ///
    /// The internal buffer window is dropped, the historic window retains the
    /// decoded frames and the cursor advances past them. Returns the number
    /// of frames decoded; 0 at the end of the stream.
    pub fn read_features_into(&mut self, storage: &mut [f32]) -> Result<usize, FeatureError> {
        let (stream, position) = self.positioned()?;
        let vect_size = stream.descriptor.vect_size;
        let available = stream.descriptor.feature_count.saturating_sub(*position);
        let frames = (storage.len() / vect_size.max(1)).min(available);
        if frames == 0 || vect_size == 0 {
            return Ok(0);
        }
        stream.decode_into::<C>(*position, &mut storage[..frames * vect_size])?;
        stream.cache.invalidate_buffer();
        *position += frames;
        Ok(frames)
    }

    /// Drop both windows, forcing the next reads back to the file
    pub fn clear_cache(&mut self) {
        match &mut self.state {
            StreamState::HeaderParsed(stream) | StreamState::Positioned { stream, .. } => {
                stream.cache.clear();
            }
            StreamState::Unopened => {}
        }
    }

    /// Counters of the open stream, `None` while unopened
    pub fn stats(&self) -> Option<StreamStats> {
        match &self.state {
            StreamState::HeaderParsed(stream) | StreamState::Positioned { stream, .. } => {
                Some(StreamStats {
                    io: stream.file.stats(),
                    cache: stream.cache_stats,
                })
            }
            StreamState::Unopened => None,
        }
    }

    /// Release the file handle and both windows. Calling it again is a no-op;
    /// the next access re-parses the header.
    pub fn close(&mut self) {
        if self.is_open() {
            debug!("Closing {}", self.path.display());
        }
        self.state = StreamState::Unopened;
    }
}

impl OpenStream {
    fn new(file: FrameFile, descriptor: FormatDescriptor, config: &ReaderConfig) -> Self {
        let cache = WindowCache::new(
            descriptor.vect_size,
            config.buffer_capacity(),
            config.historic_policy(),
        );
        Self {
            file,
            descriptor,
            cache,
            cache_stats: CacheStats::default(),
            scratch: Vec::new(),
        }
    }

    /// Serve frame `index` from the windows, refilling them on a miss
    fn load<C: FeatureCodec>(&mut self, index: usize, out: &mut Feature) -> Result<(), FeatureError> {
        let missed = self.cache.lookup(index).is_none();
        if missed {
            self.cache_stats.misses += 1;
            self.refill::<C>(index)?;
        }
        match self.cache.lookup(index) {
            Some((hit, frame)) => {
                out.assign(frame, self.descriptor.flags);
                if !missed {
                    self.cache_stats.record(hit);
                }
                Ok(())
            }
            None => Err(FeatureError::InvalidData(format!(
                "frame {} missing after refill",
                index
            ))),
        }
    }

    /// Decode a fresh buffer window starting at `index`. The previous window
    /// is kept if decoding fails.
    fn refill<C: FeatureCodec>(&mut self, index: usize) -> Result<(), FeatureError> {
        self.fill_historic_gap::<C>(index)?;
        let frames = self
            .cache
            .buffer_capacity()
            .min(self.descriptor.feature_count - index);
        let run = self.decode_run::<C>(index, frames)?;
        trace!("Buffer window refilled with frames [{}, {})", index, index + frames);
        self.cache.fill(index, run);
        Ok(())
    }

    /// Keep an all-features historic window contiguous up to `index`
    fn fill_historic_gap<C: FeatureCodec>(&mut self, index: usize) -> Result<(), FeatureError> {
        if self.cache.historic_policy() != HistoricPolicy::All {
            return Ok(());
        }
        let mut next = self.cache.historic_end();
        while next < index {
            let frames = DEFAULT_BUFFER_SIZE.min(index - next);
            let run = self.decode_run::<C>(next, frames)?;
            trace!("Historic window extended with frames [{}, {})", next, next + frames);
            self.cache.retain(next, &run);
            next += frames;
        }
        Ok(())
    }

    fn read_frame_bytes(&mut self, first: usize, frames: usize) -> Result<(), FeatureError> {
        self.scratch
            .resize(frames * self.descriptor.frame_byte_size(), 0);
        self.file.seek(self.descriptor.frame_offset(first))?;
        if !self.file.read_raw(&mut self.scratch)? {
            return Err(FeatureError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "file ends inside frames [{}, {})",
                    first,
                    first + frames
                ),
            )));
        }
        Ok(())
    }

    fn decode_run<C: FeatureCodec>(
        &mut self,
        first: usize,
        frames: usize,
    ) -> Result<Vec<f32>, FeatureError> {
        self.read_frame_bytes(first, frames)?;
        let mut values = vec![0.0; frames * self.descriptor.vect_size];
        C::decode_frames(&self.scratch, self.descriptor.byte_order, &mut values);
        Ok(values)
    }

    fn decode_into<C: FeatureCodec>(
        &mut self,
        first: usize,
        out: &mut [f32],
    ) -> Result<(), FeatureError> {
        self.fill_historic_gap::<C>(first)?;
        let frames = out.len() / self.descriptor.vect_size;
        self.read_frame_bytes(first, frames)?;
        C::decode_frames(&self.scratch, self.descriptor.byte_order, out);
        self.cache.retain(first, out);
        Ok(())
    }

    fn write_frame<C: FeatureCodec>(&mut self, index: usize, values: &[f32]) -> Result<(), FeatureError> {
        self.scratch.resize(self.descriptor.frame_byte_size(), 0);
        C::encode_frames(values, self.descriptor.byte_order, &mut self.scratch);
        self.file.seek(self.descriptor.frame_offset(index))?;
        self.file.write_raw(&self.scratch)?;
        if index == self.descriptor.feature_count {
            self.descriptor.extend(1);
        }
        self.cache.mirror(index, values);
        Ok(())
    }
}
