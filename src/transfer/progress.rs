//! Progress-reporting stream copier.
//!
//! [`ProgressReader`] wraps any `AsyncRead` and counts bytes as they pass
//! through, redrawing a [`ProgressSink`] at a bounded rate. It never touches
//! the bytes themselves. [`SourceReader`] picks between the decorated and the
//! plain reader so silent transfers skip the decorator entirely.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use super::constants::{PROGRESS_BAR_WIDTH, PROGRESS_DRAW_INTERVAL};

/// Transfer direction, shown as the bar's indicator glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Request body going to the server.
    Upload,
    /// Response body coming from the server.
    Download,
}

impl Direction {
    /// Glyph drawn at the head of the bar.
    #[must_use]
    pub fn indicator(self) -> char {
        match self {
            Self::Upload => '>',
            Self::Download => '<',
        }
    }
}

/// Byte counters for one copy operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Bytes that have passed through the reader.
    pub bytes_transferred: u64,
    /// Expected total, `None` when unknown.
    pub total_bytes: Option<u64>,
}

impl ProgressState {
    /// Creates a fresh state. A zero total is treated as unknown.
    #[must_use]
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred: 0,
            total_bytes: total_bytes.filter(|total| *total > 0),
        }
    }
}

/// Receives progress updates from a [`ProgressReader`].
pub trait ProgressSink: Send + Sync {
    /// Redraws the progress display.
    fn draw(&mut self, state: &ProgressState);

    /// Called once when the source reports end of stream.
    fn finish(&mut self, state: &ProgressState);
}

/// Progress bar rendered on stderr with indicatif.
///
/// Known totals show a fixed-width bar; unknown totals show the indicator
/// sweeping across the same width.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// Creates a bar drawing to stderr.
    #[must_use]
    pub fn new(direction: Direction, total_bytes: Option<u64>) -> Self {
        Self::with_draw_target(direction, total_bytes, ProgressDrawTarget::stderr())
    }

    /// Creates a bar drawing to an explicit target.
    #[must_use]
    pub fn with_draw_target(
        direction: Direction,
        total_bytes: Option<u64>,
        target: ProgressDrawTarget,
    ) -> Self {
        let total_bytes = total_bytes.filter(|total| *total > 0);
        let bar = ProgressBar::with_draw_target(total_bytes, target);
        let style = match total_bytes {
            Some(_) => bar_style(direction),
            None => indeterminate_style(direction),
        };
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressSink for TerminalProgress {
    fn draw(&mut self, state: &ProgressState) {
        self.bar.set_position(state.bytes_transferred);
        if state.total_bytes.is_none() {
            self.bar.tick();
        }
    }

    fn finish(&mut self, state: &ProgressState) {
        self.bar.set_position(state.bytes_transferred);
        self.bar.finish();
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn bar_style(direction: Direction) -> ProgressStyle {
    let template = format!("[{{bar:{PROGRESS_BAR_WIDTH}}}] {{bytes}}/{{total_bytes}}");
    let chars = format!("={} ", direction.indicator());
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(&chars)
}

fn indeterminate_style(direction: Direction) -> ProgressStyle {
    let indicator = direction.indicator();
    let mut frames: Vec<String> = (0..PROGRESS_BAR_WIDTH)
        .map(|pos| {
            format!(
                "[{}{indicator}{}]",
                " ".repeat(pos),
                " ".repeat(PROGRESS_BAR_WIDTH - 1 - pos)
            )
        })
        .collect();
    // indicatif shows the last frame once the bar is finished.
    frames.push(format!("[{}]", "=".repeat(PROGRESS_BAR_WIDTH)));
    let frame_refs: Vec<&str> = frames.iter().map(String::as_str).collect();

    ProgressStyle::with_template("{spinner} {bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&frame_refs)
}

/// Byte-counting decorator over an `AsyncRead`.
pub struct ProgressReader<R> {
    inner: R,
    state: ProgressState,
    sink: Box<dyn ProgressSink>,
    interval: Duration,
    last_draw: Option<Instant>,
    finished: bool,
}

impl<R> ProgressReader<R> {
    /// Wraps `inner`, reporting to `sink` at most once per default interval.
    pub fn new(inner: R, total_bytes: Option<u64>, sink: Box<dyn ProgressSink>) -> Self {
        Self {
            inner,
            state: ProgressState::new(total_bytes),
            sink,
            interval: PROGRESS_DRAW_INTERVAL,
            last_draw: None,
            finished: false,
        }
    }

    /// Overrides the minimum interval between two draws.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current counters.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    fn observe(&mut self, read: usize) {
        if read == 0 {
            if !self.finished {
                self.finished = true;
                self.sink.finish(&self.state);
            }
            return;
        }

        self.state.bytes_transferred += read as u64;
        let now = Instant::now();
        let due = self
            .last_draw
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        if due {
            self.last_draw = Some(now);
            self.sink.draw(&self.state);
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        let read = buf.filled().len() - before;
        // A zero-length read with a full buffer is not end of stream.
        if read > 0 || buf.remaining() > 0 {
            self.observe(read);
        }
        Poll::Ready(Ok(()))
    }
}

/// A transfer source, decorated with progress unless silent.
pub enum SourceReader<R> {
    /// Undecorated reader.
    Plain(R),
    /// Reader reporting progress.
    Tracked(ProgressReader<R>),
}

impl<R> SourceReader<R> {
    /// Wraps `inner` with a stderr progress bar unless `silent`.
    pub fn new(inner: R, direction: Direction, total_bytes: Option<u64>, silent: bool) -> Self {
        if silent {
            Self::Plain(inner)
        } else {
            let sink = Box::new(TerminalProgress::new(direction, total_bytes));
            Self::Tracked(ProgressReader::new(inner, total_bytes, sink))
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for SourceReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(reader) => Pin::new(reader).poll_read(cx, buf),
            Self::Tracked(reader) => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

/// Copies `reader` to `writer` with a buffered copy loop, then flushes.
///
/// # Errors
///
/// Returns the first read or write error.
pub async fn copy_to<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let copied = tokio::io::copy(reader, writer).await?;
    writer.flush().await?;
    Ok(copied)
}
