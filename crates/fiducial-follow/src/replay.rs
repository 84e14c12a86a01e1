use std::convert::Infallible;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use fiducial_nav::{Frame, FrameSize, FrameSource, MarkerDetector, RawMarkerObservation};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised while reading a replay file.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Reading the underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line is not a valid replay frame.
    #[error("invalid replay frame at line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded frame: its size and what the detector reported in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Capture index of the frame.
    pub frame: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Detector output, ids as scalars or one-element lists.
    ///
    /// Entries that are not a marker record are dropped; the rest of the frame
    /// is kept.
    #[serde(default, deserialize_with = "lenient_markers")]
    pub markers: Vec<RawMarkerObservation>,
}

fn lenient_markers<'de, D>(deserializer: D) -> Result<Vec<RawMarkerObservation>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(marker) => Some(marker),
            Err(e) => {
                log::debug!("ignoring replayed marker {i}: {e}");
                None
            }
        })
        .collect())
}

impl Frame for ReplayFrame {
    fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// Frame source reading one JSON frame per line. Blank lines are skipped.
pub struct ReplaySource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl ReplaySource<BufReader<File>> {
    /// Open a replay file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let file = File::open(path.as_ref())?;
        log::info!("replaying frames from {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    type Frame = ReplayFrame;
    type Error = ReplayError;

    fn read(&mut self) -> Result<Option<ReplayFrame>, ReplayError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| ReplayError::Parse {
                    line: self.line,
                    source,
                });
        }
    }
}

/// Detector for replayed frames: the markers were recorded with the frame.
#[derive(Debug, Default)]
pub struct ReplayDetector;

impl MarkerDetector<ReplayFrame> for ReplayDetector {
    type Error = Infallible;

    fn detect(&mut self, frame: &ReplayFrame) -> Result<Vec<RawMarkerObservation>, Infallible> {
        Ok(frame.markers.clone())
    }
}
