//! Prompt-delimited request/response exchange over a [`Transport`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;

use super::buffer::LineBuffer;
use super::patterns::{PromptPattern, PromptPatternBuilder};
use crate::error::{ChannelError, Result};
use crate::platform::{DeviceProfile, Pager};
use crate::transport::Transport;

/// Configuration for stream behavior.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Default deadline for one send.
    pub timeout: Duration,

    /// How many trailing bytes are searched for the prompt line.
    pub search_depth: usize,

    /// How long [`SessionStream::establish`] waits for an unsolicited prompt
    /// before nudging the device with a line ending.
    pub wake_after: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
            wake_after: Duration::from_secs(1),
        }
    }
}

/// What ended a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The session prompt.
    Prompt,
    /// A caller-supplied pattern, such as a password prompt.
    Expect,
}

/// Normalized result of one send.
#[derive(Debug, Clone)]
pub struct Reply {
    /// The command as sent, empty for hidden input.
    pub command: String,

    /// Output with the echoed command and trailing prompt removed.
    pub output: String,

    /// The trailing line that ended the read.
    pub prompt: String,

    /// Output as read, after ANSI and `\r` stripping.
    pub raw: String,

    /// Which pattern ended the read.
    pub boundary: Boundary,
}

/// Clears the busy flag on every exit path, including cancellation.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ChannelError::Busy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Line-buffered command channel to one device.
///
/// Each send writes one line and reads until the trailing non-blank line
/// matches the session's [`PromptPattern`], which is derived from the first
/// prompt seen by [`establish`](Self::establish). Only one send may be in
/// flight at a time.
pub struct SessionStream<T> {
    transport: T,
    buffer: LineBuffer,
    builder: PromptPatternBuilder,
    pattern: Option<PromptPattern>,
    pager: Option<Pager>,
    line_ending: String,
    config: StreamConfig,
    busy: Arc<AtomicBool>,
}

impl<T: Transport> SessionStream<T> {
    /// Create a stream for a device described by `profile`.
    pub fn new(transport: T, profile: &DeviceProfile, config: StreamConfig) -> Result<Self> {
        Ok(Self {
            transport,
            buffer: LineBuffer::new(config.search_depth),
            builder: PromptPatternBuilder::new(&profile.delimiters)?,
            pattern: None,
            pager: profile.pager.clone(),
            line_ending: profile.line_ending.clone(),
            config,
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Wait for the first prompt and derive the session's prompt pattern.
    ///
    /// Devices usually print a prompt right after login. If none shows up
    /// within `wake_after`, one line ending is written to provoke it.
    /// Returns the prompt line.
    pub async fn establish(&mut self) -> Result<String> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.pattern = None;
        self.buffer.clear();

        let wake_after = self.config.wake_after;
        match tokio::time::timeout(wake_after, self.read_until_boundary(None)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                debug!("No prompt after {:?}, sending line ending", wake_after);
                let ending = self.line_ending.clone();
                self.transport.write(ending.as_bytes()).await?;

                let timeout = self.config.timeout;
                tokio::time::timeout(timeout, self.read_until_boundary(None))
                    .await
                    .map_err(|_| ChannelError::ReadTimeout(timeout))??;
            }
        }

        let raw = String::from_utf8_lossy(&self.buffer.take()).into_owned();
        let pattern = self.builder.build(&raw)?;
        debug!(
            "Prompt pattern for '{}': {}",
            pattern.anchor(),
            pattern.as_str()
        );
        self.pattern = Some(pattern);

        let prompt = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or_default();
        Ok(prompt.to_string())
    }

    /// Send a command with the default timeout.
    pub async fn send(&mut self, command: &str) -> Result<Reply> {
        let timeout = self.config.timeout;
        self.send_with_timeout(command, timeout).await
    }

    /// Send a command with an explicit timeout.
    pub async fn send_with_timeout(&mut self, command: &str, timeout: Duration) -> Result<Reply> {
        self.exchange(command, false, None, timeout, std::future::pending())
            .await
    }

    /// Send a command that is abandoned as soon as `cancel` completes.
    pub async fn send_cancellable(
        &mut self,
        command: &str,
        timeout: Duration,
        cancel: impl Future<Output = ()> + Send,
    ) -> Result<Reply> {
        self.exchange(command, false, None, timeout, cancel).await
    }

    /// Send a command and stop at either the prompt or `expect`.
    pub async fn send_expecting(
        &mut self,
        command: &str,
        expect: &Regex,
        timeout: Duration,
    ) -> Result<Reply> {
        self.exchange(command, false, Some(expect), timeout, std::future::pending())
            .await
    }

    /// Send a secret. It is never logged and never echo-stripped.
    pub async fn send_hidden(&mut self, secret: &str, timeout: Duration) -> Result<Reply> {
        self.exchange(secret, true, None, timeout, std::future::pending())
            .await
    }

    async fn exchange(
        &mut self,
        input: &str,
        hidden: bool,
        expect: Option<&Regex>,
        timeout: Duration,
        cancel: impl Future<Output = ()>,
    ) -> Result<Reply> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        if self.pattern.is_none() {
            return Err(ChannelError::NotEstablished.into());
        }

        // Anything left over belongs to an earlier exchange
        self.buffer.clear();

        if hidden {
            debug!("Sending hidden input");
        } else {
            debug!("Sending command: {:?}", input);
        }

        let mut payload = Vec::with_capacity(input.len() + self.line_ending.len());
        payload.extend_from_slice(input.as_bytes());
        payload.extend_from_slice(self.line_ending.as_bytes());

        let outcome = tokio::select! {
            biased;
            _ = cancel => Err(ChannelError::Cancelled.into()),
            result = tokio::time::timeout(timeout, self.write_and_read(&payload, expect)) => {
                result.unwrap_or_else(|_| Err(ChannelError::ReadTimeout(timeout).into()))
            }
        };

        let boundary = match outcome {
            Ok(boundary) => boundary,
            Err(e) => {
                debug!("Send failed: {}", e);
                return Err(e);
            }
        };

        let reply = self.finish(input, hidden, boundary);
        debug!("Matched prompt: {:?}", reply.prompt);
        Ok(reply)
    }

    async fn write_and_read(&mut self, payload: &[u8], expect: Option<&Regex>) -> Result<Boundary> {
        self.transport.write(payload).await?;
        self.read_until_boundary(expect).await
    }

    /// Read until the tail is the prompt (or the probe before a pattern
    /// exists) or `expect`, answering pager banners on the way.
    async fn read_until_boundary(&mut self, expect: Option<&Regex>) -> Result<Boundary> {
        loop {
            let chunk = self
                .transport
                .read_available()
                .await?
                .ok_or(ChannelError::ConnectionClosed)?;
            trace!("Read {} bytes: {:?}", chunk.len(), String::from_utf8_lossy(&chunk));
            self.buffer.extend(&chunk);

            let at_prompt = match &self.pattern {
                Some(pattern) => self.buffer.tail_matches(pattern),
                None => self.buffer.tail_matches(self.builder.probe()),
            };
            if at_prompt {
                return Ok(Boundary::Prompt);
            }

            if expect.is_some_and(|re| self.buffer.tail_matches(re)) {
                return Ok(Boundary::Expect);
            }

            let paged = self
                .pager
                .as_ref()
                .is_some_and(|pager| self.buffer.tail_matches(&pager.pattern));
            if paged {
                self.buffer.truncate_last_line();
                if let Some(pager) = &self.pager {
                    trace!("Pager banner, sending {:?}", pager.response);
                    self.transport.write(pager.response.as_bytes()).await?;
                }
            }
        }
    }

    /// Split the buffered output into echo, body and trailing prompt.
    fn finish(&mut self, input: &str, hidden: bool, boundary: Boundary) -> Reply {
        let raw = String::from_utf8_lossy(&self.buffer.take()).into_owned();

        let mut lines: Vec<&str> = raw.split('\n').collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let prompt = lines.pop().map(str::trim).unwrap_or_default().to_string();

        let mut start = lines
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(lines.len());
        if !hidden && lines.get(start).is_some_and(|line| line.trim() == input.trim()) {
            start += 1;
        }
        let output = lines[start..].join("\n");

        Reply {
            command: if hidden { String::new() } else { input.to_string() },
            output,
            prompt,
            raw,
            boundary,
        }
    }

    /// The session prompt pattern, once established.
    pub fn prompt_pattern(&self) -> Option<&PromptPattern> {
        self.pattern.as_ref()
    }

    /// True while a send is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Get the configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Set the default timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    #[cfg(test)]
    pub(crate) fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::platform::vendors::cisco_like;
    use crate::testing::{Flavor, FakeDevice};

    fn quick() -> StreamConfig {
        StreamConfig {
            timeout: Duration::from_secs(2),
            search_depth: 1000,
            wake_after: Duration::from_millis(50),
        }
    }

    async fn established(device: &FakeDevice) -> SessionStream<FakeDevice> {
        let mut stream = SessionStream::new(device.clone(), &cisco_like::profile(), quick()).unwrap();
        stream.establish().await.unwrap();
        stream
    }

    #[tokio::test]
    async fn test_establish_reads_banner_prompt() {
        let device = FakeDevice::cisco("r1");
        let mut stream = SessionStream::new(device.clone(), &cisco_like::profile(), quick()).unwrap();

        let prompt = stream.establish().await.unwrap();
        assert_eq!(prompt, "r1>");
        assert_eq!(stream.prompt_pattern().unwrap().anchor(), "r1");
        // The device printed its prompt unprompted, nothing was written
        assert!(device.writes().is_empty());
    }

    #[tokio::test]
    async fn test_establish_wakes_silent_device() {
        let device = FakeDevice::new(Flavor::Cisco, "quiet");
        let mut stream = SessionStream::new(device.clone(), &cisco_like::profile(), quick()).unwrap();

        let prompt = stream.establish().await.unwrap();
        assert_eq!(prompt, "quiet>");
        assert_eq!(device.writes(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_send_strips_echo_and_prompt() {
        let device = FakeDevice::cisco("r1").with_output("show clock", "line one\r\nline two");
        let mut stream = established(&device).await;

        let reply = stream.send("show clock").await.unwrap();
        assert_eq!(reply.output, "line one\nline two");
        assert_eq!(reply.prompt, "r1>");
        assert_eq!(reply.command, "show clock");
        assert_eq!(reply.boundary, Boundary::Prompt);
        assert!(reply.raw.starts_with("show clock\n"));
    }

    #[tokio::test]
    async fn test_send_strips_ansi() {
        let device = FakeDevice::cisco("r1").with_output("show color", "\x1b[32mup\x1b[0m");
        let mut stream = established(&device).await;

        let reply = stream.send("show color").await.unwrap();
        assert_eq!(reply.output, "up");
    }

    #[tokio::test]
    async fn test_send_before_establish() {
        let device = FakeDevice::cisco("r1");
        let mut stream = SessionStream::new(device, &cisco_like::profile(), quick()).unwrap();

        let err = stream.send("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::NotEstablished)));
        assert!(!stream.is_busy());
    }

    #[tokio::test]
    async fn test_timeout_clears_busy() {
        let device = FakeDevice::cisco("r1");
        let mut stream = established(&device).await;
        device.state().mute = true;

        let err = stream
            .send_with_timeout("show version", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(
            err,
            Error::Channel(ChannelError::ReadTimeout(d)) if d == Duration::from_millis(100)
        ));
        assert!(!stream.is_busy());
    }

    #[tokio::test]
    async fn test_busy_while_in_flight() {
        let device = FakeDevice::cisco("r1");
        let mut stream = established(&device).await;
        device.state().mute = true;
        let flag = stream.busy_flag();

        let (result, seen_busy) = tokio::join!(
            stream.send_with_timeout("show version", Duration::from_millis(200)),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                flag.load(Ordering::Acquire)
            }
        );

        assert!(seen_busy);
        assert!(result.is_err());
        assert!(!stream.is_busy());
    }

    #[test]
    fn test_busy_guard_single_flight() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(matches!(
            BusyGuard::acquire(&flag),
            Err(Error::Channel(ChannelError::Busy))
        ));
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(BusyGuard::acquire(&flag).is_ok());
    }

    #[tokio::test]
    async fn test_cancel() {
        let device = FakeDevice::cisco("r1");
        let mut stream = established(&device).await;
        device.state().mute = true;

        let err = stream
            .send_cancellable(
                "show tech",
                Duration::from_secs(5),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Cancelled)));
        assert!(!stream.is_busy());
    }

    #[tokio::test]
    async fn test_connection_closed() {
        let device = FakeDevice::cisco("r1");
        let mut stream = established(&device).await;
        device.state().hang_up = true;

        let err = stream.send("show clock").await.unwrap_err();
        assert!(err.is_disconnect());
        assert!(!stream.is_busy());
    }

    #[tokio::test]
    async fn test_pager_is_answered() {
        let device = FakeDevice::cisco("r1");
        device.state().paged.insert(
            "show run".to_string(),
            vec!["page1".to_string(), "page2".to_string(), "page3".to_string()],
        );
        let mut stream = established(&device).await;

        let reply = stream.send("show run").await.unwrap();
        assert_eq!(reply.output, "page1\npage2\npage3");
        assert!(!reply.raw.contains("More"));
        assert_eq!(device.state().pager_presses, 2);
    }

    #[tokio::test]
    async fn test_send_expecting_and_hidden() {
        let device = FakeDevice::cisco("r1");
        device.state().enable_secret = Some("s3cret".to_string());
        let mut stream = established(&device).await;
        let password = Regex::new(r"[Pp]assword:\s*$").unwrap();

        let reply = stream
            .send_expecting("enable", &password, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply.boundary, Boundary::Expect);
        assert_eq!(reply.prompt, "Password:");

        let reply = stream
            .send_hidden("s3cret", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply.boundary, Boundary::Prompt);
        assert_eq!(reply.prompt, "r1#");
        assert!(reply.command.is_empty());
    }

    #[tokio::test]
    async fn test_stale_output_is_discarded() {
        let device = FakeDevice::cisco("r1").with_output("show clock", "12:00");
        let mut stream = established(&device).await;

        // A late chunk that arrives before the next command is sent
        stream.buffer.extend(b"%LINK-3-UPDOWN: late syslog\n");
        let reply = stream.send("show clock").await.unwrap();
        assert_eq!(reply.output, "12:00");
    }
}
