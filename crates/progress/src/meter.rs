//! Byte-counting writer with throttled progress output

use crate::format::{format_bytes, format_duration, format_speed};
use std::fmt;
use std::io::{self, Write};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;

/// Minimum wall-clock time between two progress lines
pub const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Below this much elapsed time no meaningful speed can be computed
const MIN_ELAPSED: Duration = Duration::from_millis(1);

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Counters of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferState {
    /// Bytes written through the meter
    pub written: u64,
    /// Bytes already present before a resumed transfer
    pub start_bytes: u64,
    /// Size of the complete artifact, when the server reported one
    pub total: Option<u64>,
}

impl TransferState {
    /// Bytes of the artifact present at the destination
    #[must_use]
    pub fn current(&self) -> u64 {
        self.start_bytes + self.written
    }

    /// Completion percentage, when the total is known
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> Option<f64> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| self.current() as f64 / total as f64 * 100.0)
    }

    /// Average speed since the meter was created, in bytes per second
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn speed(&self, elapsed: Duration) -> Option<f64> {
        (elapsed >= MIN_ELAPSED).then(|| self.written as f64 / elapsed.as_secs_f64())
    }

    /// Remaining time at the average speed
    ///
    /// `None` until a speed is known, or when the estimate does not fit in a
    /// `Duration`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eta(&self, elapsed: Duration) -> Option<Duration> {
        let total = self.total?;
        let speed = self.speed(elapsed).filter(|speed| *speed > 0.0)?;
        let remaining = total.saturating_sub(self.current());
        Duration::try_from_secs_f64(remaining as f64 / speed).ok()
    }
}

/// Render one progress line
///
/// With a known total: percentage, `current / total`, speed and ETA.
/// Without one: bytes transferred and speed only.
#[must_use]
pub fn render_progress(state: &TransferState, elapsed: Duration) -> String {
    let speed = format_speed(state.speed(elapsed).unwrap_or(0.0));
    match (state.percentage(), state.total) {
        (Some(percentage), Some(total)) => {
            let eta = state
                .eta(elapsed)
                .map_or_else(|| "calculating...".to_string(), format_duration);
            format!(
                "{percentage:.1}% | {} / {} | {speed} | ETA {eta}",
                format_bytes(state.current()),
                format_bytes(total),
            )
        }
        _ => format!("{} transferred | {speed}", format_bytes(state.current())),
    }
}

/// Writer adapter that counts bytes and reports progress
///
/// Every write is forwarded to the wrapped sink first; only the bytes the sink
/// accepted are counted. A progress line is printed on the first write and
/// then at most once per [`REPORT_INTERVAL`]. All timing and spinner state
/// belongs to this instance.
pub struct TransferMeter<W> {
    inner: W,
    output: Box<dyn Write + Send>,
    state: TransferState,
    started: Instant,
    last_report: Option<Instant>,
    spinner: usize,
    line_open: bool,
}

impl<W> TransferMeter<W> {
    /// Wrap `inner`, printing progress to `output`
    ///
    /// `total` is the size of the complete artifact; `0` is treated as unknown.
    pub fn new(
        inner: W,
        total: Option<u64>,
        start_bytes: u64,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            inner,
            output,
            state: TransferState {
                written: 0,
                start_bytes,
                total: total.filter(|t| *t > 0),
            },
            started: Instant::now(),
            last_report: None,
            spinner: 0,
            line_open: false,
        }
    }

    /// Wrap `inner`, printing progress to standard error
    pub fn stderr(inner: W, total: Option<u64>, start_bytes: u64) -> Self {
        Self::new(inner, total, start_bytes, Box::new(io::stderr()))
    }

    #[must_use]
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Bytes written through this meter
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.state.written
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Print the size of the upcoming transfer, if known
    pub fn announce(&mut self) {
        let Some(total) = self.state.total else {
            return;
        };
        let line = if self.state.start_bytes > 0 {
            format!(
                "Resuming download at {} of {}\n",
                format_bytes(self.state.start_bytes),
                format_bytes(total)
            )
        } else {
            format!("Downloading {}\n", format_bytes(total))
        };
        self.emit(&line);
    }

    /// Print a last progress line and end it, then hand back the sink
    pub fn finish(mut self) -> W {
        self.report(Instant::now());
        if self.line_open {
            self.emit("\n");
        }
        self.inner
    }

    /// Drop the meter without further output
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn record(&mut self, n: usize) {
        self.state.written += n as u64;
        let now = Instant::now();
        let due = self
            .last_report
            .is_none_or(|last| now.duration_since(last) >= REPORT_INTERVAL);
        if due {
            self.report(now);
        }
    }

    fn report(&mut self, now: Instant) {
        let mut line = render_progress(&self.state, now.duration_since(self.started));
        if self.state.total.is_none() {
            line = format!("{} {line}", SPINNER[self.spinner % SPINNER.len()]);
            self.spinner = self.spinner.wrapping_add(1);
        }
        self.emit(&format!("\r{line}"));
        self.line_open = true;
        self.last_report = Some(now);
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write transfer progress");
        }
    }
}

impl<W: Write> Write for TransferMeter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.record(n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for TransferMeter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        this.record(n);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

impl<W> fmt::Debug for TransferMeter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferMeter")
            .field("state", &self.state)
            .field("started", &self.started)
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}
