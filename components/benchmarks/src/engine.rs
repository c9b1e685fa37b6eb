//! QuickJS execution of compiled benchmark code
//!
//! One [`Engine`] owns a QuickJS runtime. Every task gets a fresh context,
//! so globals defined by one implementation are never visible to the next.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rquickjs::{Context, Ctx, Function, Runtime, Value};
use tracing::{debug, warn};

use crate::error::{Result, RunnerError};

/// Default JS heap limit
pub const DEFAULT_MEMORY_LIMIT: usize = 256 * 1024 * 1024;

/// Default JS stack limit
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Reduces any thrown value to a printable message
const DESCRIBE_THROWN: &str = r#"(function (value) {
  if (value instanceof Error) return value.message;
  if (typeof value === "string") return value;
  try {
    const json = JSON.stringify(value);
    if (json !== undefined) return json;
  } catch (_) {}
  return String(value);
})"#;

/// Resource limits for the JS runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Heap limit in bytes
    pub memory_limit: usize,
    /// Stack limit in bytes
    pub max_stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            max_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Shared flag that aborts running JS at its next interrupt check
#[derive(Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
    tick: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl InterruptHandle {
    /// A handle that has not fired
    pub fn new() -> Self {
        InterruptHandle::default()
    }

    /// Same flag, with `tick` called at every interrupt check of an engine
    /// built from the returned handle. Checks happen periodically while JS
    /// code is executing.
    pub fn with_tick(mut self, tick: impl Fn() + Send + Sync + 'static) -> Self {
        self.tick = Some(Arc::new(tick));
        self
    }

    /// Abort whatever is running and everything after it
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once [`interrupt`](Self::interrupt) was called
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn check(&self) -> bool {
        if let Some(tick) = &self.tick {
            tick();
        }
        self.is_interrupted()
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("interrupted", &self.is_interrupted())
            .field("tick", &self.tick.is_some())
            .finish()
    }
}

/// Per-context setup run around every task
pub trait ContextHook {
    /// Called on the fresh context before the task's code is evaluated
    fn install(&mut self, _ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        Ok(())
    }

    /// Called before the context is dropped
    fn uninstall(&mut self, _ctx: &Ctx<'_>) -> rquickjs::Result<()> {
        Ok(())
    }
}

/// A hook that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

impl ContextHook for NoHook {}

/// A QuickJS runtime with limits and an interrupt flag installed
pub struct Engine {
    runtime: Runtime,
}

impl Engine {
    /// Create a runtime
    pub fn new(config: &EngineConfig, interrupt: InterruptHandle) -> Result<Self> {
        let runtime = Runtime::new().map_err(engine_error)?;
        runtime.set_memory_limit(config.memory_limit);
        runtime.set_max_stack_size(config.max_stack_size);
        runtime.set_interrupt_handler(Some(Box::new(move || interrupt.check())));
        Ok(Engine { runtime })
    }

    /// Run `f` inside a fresh context wrapped by `hook`
    pub fn with_context<R, F>(&self, hook: &mut dyn ContextHook, f: F) -> Result<R>
    where
        F: for<'js> FnOnce(&Ctx<'js>) -> Result<R>,
    {
        let context = Context::full(&self.runtime).map_err(engine_error)?;
        context.with(|ctx| {
            hook.install(&ctx)
                .map_err(|err| RunnerError::Engine(format!("failed to prepare context: {}", err)))?;
            let outcome = f(&ctx);
            if let Err(err) = hook.uninstall(&ctx) {
                warn!(error = %err, "context teardown hook failed");
            }
            outcome
        })
    }
}

fn engine_error(err: rquickjs::Error) -> RunnerError {
    RunnerError::Engine(err.to_string())
}

/// The `run` function of one compiled task
pub struct JsTask<'js> {
    ctx: Ctx<'js>,
    run: Function<'js>,
    describe: Function<'js>,
    interrupt: InterruptHandle,
}

impl<'js> JsTask<'js> {
    /// Evaluate `code` as a function body and call it once to obtain `run`
    pub fn compile(ctx: &Ctx<'js>, code: &str, interrupt: InterruptHandle) -> Result<Self> {
        let describe: Function<'js> = ctx.eval(DESCRIBE_THROWN).map_err(engine_error)?;
        let fail = |err| failure(ctx, &describe, &interrupt, err);

        let factory: Function<'js> = ctx
            .eval(format!("(function () {{\n{}\n}})", code))
            .map_err(fail)?;
        let value: Value<'js> = factory.call(()).map_err(fail)?;
        let run = value
            .into_function()
            .ok_or_else(|| RunnerError::execution("The `run` export is not a function"))?;
        debug!(bytes = code.len(), "compiled task");

        Ok(JsTask {
            ctx: ctx.clone(),
            run,
            describe,
            interrupt,
        })
    }

    /// Call `run` once, settling a returned promise before returning
    pub fn call(&self) -> Result<()> {
        let value: Value<'js> = self.run.call(()).map_err(|err| self.failure(err))?;
        if let Some(promise) = value.as_promise() {
            promise
                .finish::<Value<'js>>()
                .map_err(|err| self.failure(err))?;
        }
        Ok(())
    }

    fn failure(&self, err: rquickjs::Error) -> RunnerError {
        failure(&self.ctx, &self.describe, &self.interrupt, err)
    }
}

fn failure<'js>(
    ctx: &Ctx<'js>,
    describe: &Function<'js>,
    interrupt: &InterruptHandle,
    err: rquickjs::Error,
) -> RunnerError {
    if interrupt.is_interrupted() {
        return RunnerError::Cancelled;
    }
    match err {
        rquickjs::Error::Exception => {
            let thrown = ctx.catch();
            describe
                .call::<_, String>((thrown,))
                .map(RunnerError::execution)
                .unwrap_or_else(|err| RunnerError::execution(err.to_string()))
        }
        rquickjs::Error::WouldBlock => {
            RunnerError::execution("The promise returned by `run` never settled")
        }
        other => RunnerError::execution(other.to_string()),
    }
}
