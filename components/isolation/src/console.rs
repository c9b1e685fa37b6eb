//! Console capture inside the worker
//!
//! The shim replaces `console` in each task context with functions that
//! format their arguments and forward them to a [`ConsoleCapture`], which
//! coalesces repeats and ships batches to the host.

use std::sync::Arc;
use std::time::{Duration, Instant};

use benchmarks::ContextHook;
use core_types::{ConsoleLevel, ConsoleLog};
use parking_lot::Mutex;
use rquickjs::function::Func;
use rquickjs::{Ctx, Function};

use crate::messages::WorkerMessage;
use crate::worker::Outbox;

/// Entries held between flushes before new distinct messages are dropped
pub const MAX_BUFFERED_ENTRIES: usize = 1000;

const INSTALL_CONSOLE: &str = r#"(function (sink, levels) {
  const format = (value) => {
    if (typeof value === "string") return value;
    if (value instanceof Error) return String(value);
    if (typeof value === "object" && value !== null) {
      try {
        const json = JSON.stringify(value);
        if (json !== undefined) return json;
      } catch (_) {}
    }
    return String(value);
  };
  const shim = {};
  for (const level of levels) {
    shim[level] = (...args) => {
      sink(level, args.map(format).join(" "));
    };
  }
  Object.defineProperty(globalThis, Symbol.for("jsbench.console"), {
    value: globalThis.console,
    configurable: true,
  });
  globalThis.console = shim;
})"#;

const RESTORE_CONSOLE: &str = r#"(() => {
  const key = Symbol.for("jsbench.console");
  if (Object.prototype.hasOwnProperty.call(globalThis, key)) {
    globalThis.console = globalThis[key];
    delete globalThis[key];
  }
})();"#;

/// Console entries awaiting a flush, with consecutive repeats coalesced
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConsoleBuffer {
    entries: Vec<ConsoleLog>,
    dropped: u64,
}

impl ConsoleBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        ConsoleBuffer::default()
    }

    /// Append a message, bumping the count of an identical last entry
    pub fn push(&mut self, level: ConsoleLevel, message: String) {
        if let Some(last) = self.entries.last_mut() {
            if last.matches(level, &message) {
                last.count = last.count.saturating_add(1);
                return;
            }
        }
        if self.entries.len() >= MAX_BUFFERED_ENTRIES {
            self.dropped += 1;
            return;
        }
        self.entries.push(ConsoleLog {
            level,
            message,
            count: 1,
        });
    }

    /// Nothing to flush
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.dropped == 0
    }

    /// Drain the buffer, reporting dropped messages as a final warning
    pub fn take(&mut self) -> Vec<ConsoleLog> {
        let mut logs = std::mem::take(&mut self.entries);
        if self.dropped > 0 {
            logs.push(ConsoleLog {
                level: ConsoleLevel::Warn,
                message: format!("{} console messages were dropped", self.dropped),
                count: 1,
            });
            self.dropped = 0;
        }
        logs
    }
}

struct CaptureState {
    run_id: Option<String>,
    buffer: ConsoleBuffer,
    last_flush: Instant,
}

/// Shared console state of one worker
#[derive(Clone)]
pub(crate) struct ConsoleCapture {
    state: Arc<Mutex<CaptureState>>,
    outbox: Outbox,
    interval: Duration,
}

impl ConsoleCapture {
    pub(crate) fn new(outbox: Outbox, interval: Duration) -> Self {
        ConsoleCapture {
            state: Arc::new(Mutex::new(CaptureState {
                run_id: None,
                buffer: ConsoleBuffer::new(),
                last_flush: Instant::now(),
            })),
            outbox,
            interval,
        }
    }

    /// Attribute following output to `run_id`
    pub(crate) fn begin(&self, run_id: &str) {
        let mut state = self.state.lock();
        self.flush_locked(&mut state);
        state.run_id = Some(run_id.to_string());
        state.last_flush = Instant::now();
    }

    pub(crate) fn record(&self, level: ConsoleLevel, message: String) {
        let mut state = self.state.lock();
        state.buffer.push(level, message);
        if state.last_flush.elapsed() >= self.interval {
            self.flush_locked(&mut state);
        }
    }

    /// Flush once the interval has passed since the last flush. Called at
    /// progress events and at every engine interrupt check, so output of a
    /// long-running iteration is not held back until it returns.
    pub(crate) fn flush_if_due(&self) {
        let mut state = self.state.lock();
        if state.last_flush.elapsed() >= self.interval {
            self.flush_locked(&mut state);
        }
    }

    /// Flush everything and stop attributing output
    pub(crate) fn end(&self) {
        let mut state = self.state.lock();
        self.flush_locked(&mut state);
        state.run_id = None;
    }

    fn flush_locked(&self, state: &mut CaptureState) {
        state.last_flush = Instant::now();
        if state.buffer.is_empty() {
            return;
        }
        let logs = state.buffer.take();
        if let Some(run_id) = &state.run_id {
            self.outbox.send(WorkerMessage::ConsoleBatch {
                run_id: run_id.clone(),
                logs,
            });
        }
    }
}

/// Installs the capturing `console` around every task
pub(crate) struct ConsoleShim {
    capture: ConsoleCapture,
}

impl ConsoleShim {
    pub(crate) fn new(capture: ConsoleCapture) -> Self {
        ConsoleShim { capture }
    }
}

impl ContextHook for ConsoleShim {
    fn install(&mut self, ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        let install: Function = ctx.eval(INSTALL_CONSOLE)?;
        let capture = self.capture.clone();
        let sink = Func::from(move |level: String, message: String| {
            let level = ConsoleLevel::parse(&level).unwrap_or(ConsoleLevel::Log);
            capture.record(level, message);
        });
        let levels: Vec<&str> = ConsoleLevel::ALL.iter().map(ConsoleLevel::as_str).collect();
        install.call::<_, ()>((sink, levels))
    }

    fn uninstall(&mut self, ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        ctx.eval::<(), _>(RESTORE_CONSOLE)
    }
}
