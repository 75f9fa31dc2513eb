//! In-memory fake devices for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::Notify;

use crate::error::Result;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flavor {
    /// `>`, `#`, `(config)#` with enable / conf t / end / disable.
    Cisco,
    /// `>`, `#` with configure / commit / exit configuration-mode.
    Juniper,
}

#[derive(Debug)]
pub(crate) struct DeviceState {
    pub flavor: Flavor,
    pub hostname: String,
    pub mode: usize,
    /// Every line received, without line ending.
    pub writes: Vec<String>,
    /// Canned command outputs.
    pub outputs: HashMap<String, String>,
    /// Commands whose output is split into pages.
    pub paged: HashMap<String, Vec<String>>,
    /// Commands that land in the given mode instead of the normal one.
    pub misroute: HashMap<String, usize>,
    pub enable_secret: Option<String>,
    /// Swallow input and never reply.
    pub mute: bool,
    /// Close the stream on the next line received.
    pub hang_up: bool,
    pub echo: bool,
    pub uncommitted: bool,
    /// Make `commit` fail with this message.
    pub commit_error: Option<String>,
    pub commits: usize,
    pub pager_presses: usize,
    pub closed_by_client: bool,
    awaiting_secret: bool,
    pages: VecDeque<String>,
    partial: String,
    pending: VecDeque<Bytes>,
    ended: bool,
}

impl DeviceState {
    pub fn prompt(&self) -> String {
        match (self.flavor, self.mode) {
            (Flavor::Cisco, 0) => format!("{}>", self.hostname),
            (Flavor::Cisco, 1) => format!("{}#", self.hostname),
            (Flavor::Cisco, _) => format!("{}(config)#", self.hostname),
            (Flavor::Juniper, 0) => format!("admin@{}>", self.hostname),
            (Flavor::Juniper, _) => format!("admin@{}#", self.hostname),
        }
    }

    fn push(&mut self, text: impl Into<String>) {
        self.pending.push_back(Bytes::from(text.into()));
    }

    fn on_bytes(&mut self, data: &[u8]) {
        if !self.pages.is_empty() && data == b" " {
            self.pager_presses += 1;
            if let Some(page) = self.pages.pop_front() {
                if self.pages.is_empty() {
                    let prompt = self.prompt();
                    self.push(format!("\r{page}\r\n{prompt}"));
                } else {
                    self.push(format!("\r{page}\r\n --More-- "));
                }
            }
            return;
        }

        self.partial.push_str(&String::from_utf8_lossy(data));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            self.on_line(line);
        }
    }

    fn on_line(&mut self, line: String) {
        self.writes.push(line.clone());

        if self.ended {
            return;
        }
        if self.hang_up {
            self.ended = true;
            return;
        }
        if self.mute {
            return;
        }

        if self.awaiting_secret {
            self.awaiting_secret = false;
            if self.enable_secret.as_deref() == Some(line.as_str()) {
                self.mode = 1;
                let prompt = self.prompt();
                self.push(format!("\r\n{prompt}"));
            } else {
                let prompt = self.prompt();
                self.push(format!("\r\n% Access denied\r\n\r\n{prompt}"));
            }
            return;
        }

        let mut out = String::new();
        if self.echo {
            out.push_str(&line);
            out.push_str("\r\n");
        }

        if let Some(&mode) = self.misroute.get(&line) {
            self.mode = mode;
        } else if let Some(pages) = self.paged.get(&line).cloned() {
            let mut pages: VecDeque<String> = pages.into();
            if let Some(first) = pages.pop_front() {
                out.push_str(&first);
                out.push_str("\r\n --More-- ");
            }
            self.pages = pages;
            self.push(out);
            return;
        } else {
            match self.flavor {
                Flavor::Cisco => self.cisco(&line, &mut out),
                Flavor::Juniper => self.juniper(&line, &mut out),
            }
            if self.ended {
                self.push(out);
                return;
            }
        }

        if self.awaiting_secret {
            self.push(out);
            return;
        }

        out.push_str(&self.prompt());
        self.push(out);
    }

    fn cisco(&mut self, line: &str, out: &mut String) {
        match (line, self.mode) {
            ("enable", 0) => {
                if self.enable_secret.is_some() {
                    out.push_str("Password: ");
                    self.awaiting_secret = true;
                } else {
                    self.mode = 1;
                }
            }
            ("conf t", 1) | ("configure terminal", 1) => {
                out.push_str("Enter configuration commands, one per line.  End with CNTL/Z.\r\n");
                self.mode = 2;
            }
            ("end", 2) => self.mode = 1,
            ("exit", 2) => self.mode = 1,
            ("disable", 1) => self.mode = 0,
            ("exit", _) => self.ended = true,
            _ => self.canned(line, out),
        }
    }

    fn juniper(&mut self, line: &str, out: &mut String) {
        match (line, self.mode) {
            ("configure", 0) => {
                out.push_str("Entering configuration mode\r\n\r\n[edit]\r\n");
                self.mode = 1;
            }
            ("commit", 1) if self.commit_error.is_some() => {
                let message = self.commit_error.clone().unwrap_or_default();
                out.push_str(&format!("error: {message}\r\nerror: configuration check-out failed\r\n\r\n[edit]\r\n"));
            }
            ("commit", 1) => {
                self.commits += 1;
                self.uncommitted = false;
                out.push_str("commit complete\r\n\r\n[edit]\r\n");
            }
            ("exit configuration-mode", 1) => {
                out.push_str("Exiting configuration mode\r\n\r\n");
                self.mode = 0;
            }
            (cmd, 1) if cmd.starts_with("set ") => {
                self.uncommitted = true;
                out.push_str("\r\n[edit]\r\n");
            }
            _ => self.canned(line, out),
        }
    }

    fn canned(&mut self, line: &str, out: &mut String) {
        if let Some(body) = self.outputs.get(line) {
            out.push_str(body);
            out.push_str("\r\n");
        }
    }
}

/// A fake device behind the [`Transport`] trait.
///
/// Clones share state, so a test can keep one handle for inspection while the
/// session owns another.
#[derive(Debug, Clone)]
pub(crate) struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
    notify: Arc<Notify>,
}

impl FakeDevice {
    pub fn new(flavor: Flavor, hostname: &str) -> Self {
        let state = DeviceState {
            flavor,
            hostname: hostname.to_string(),
            mode: 0,
            writes: vec![],
            outputs: HashMap::new(),
            paged: HashMap::new(),
            misroute: HashMap::new(),
            enable_secret: None,
            mute: false,
            hang_up: false,
            echo: true,
            uncommitted: false,
            commit_error: None,
            commits: 0,
            pager_presses: 0,
            closed_by_client: false,
            awaiting_secret: false,
            pages: VecDeque::new(),
            partial: String::new(),
            pending: VecDeque::new(),
            ended: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Cisco-like device that has printed a login banner and its prompt.
    pub fn cisco(hostname: &str) -> Self {
        let device = Self::new(Flavor::Cisco, hostname);
        device.greet();
        device
    }

    /// Juniper-like device that has printed a login banner and its prompt.
    pub fn juniper(hostname: &str) -> Self {
        let device = Self::new(Flavor::Juniper, hostname);
        device.greet();
        device
    }

    fn greet(&self) {
        let mut state = self.state();
        let prompt = state.prompt();
        state.push(format!("\r\nAuthorized access only\r\n\r\n{prompt}"));
    }

    pub fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    pub fn with_output(self, command: &str, output: &str) -> Self {
        self.state()
            .outputs
            .insert(command.to_string(), output.to_string());
        self
    }

    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    /// Queue raw bytes as if the device printed them unprompted.
    pub fn inject(&self, text: &str) {
        self.state().push(text.to_string());
        self.notify.notify_one();
    }
}

impl Transport for FakeDevice {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.state().on_bytes(data);
        self.notify.notify_one();
        Ok(())
    }

    async fn read_available(&mut self) -> Result<Option<Bytes>> {
        loop {
            {
                let mut state = self.state();
                if let Some(chunk) = state.pending.pop_front() {
                    return Ok(Some(chunk));
                }
                if state.ended {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.closed_by_client = true;
        state.ended = true;
        Ok(())
    }
}
