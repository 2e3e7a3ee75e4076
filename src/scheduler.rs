//! Per-thread scheduler state and the public control-transfer operations.
//!
//! Each OS thread owns an independent runtime. Only the entity currently
//! holding control (the driver or one coroutine) touches it, and no borrow
//! of it is ever held across a transfer.

use std::any::Any;
use std::cell::RefCell;
use std::panic::resume_unwind;

use crate::co::{Body, CoState, CoroId, Coroutine, Handle, WakeMarker};
use crate::config::Config;
use crate::error::{CoroError, Result, Wakeup};
use crate::registry::Registry;
use crate::sleep_queue::SleepQueue;
use crate::stack::Stack;

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new(Config::from_env()));
}

pub(crate) fn with_runtime<R, F: FnOnce(&mut Runtime) -> R>(f: F) -> R {
    RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

pub(crate) struct Runtime {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) sleep_queue: SleepQueue,
    retired: Vec<CoroId>,
    pub(crate) current: Option<CoroId>,
    pub(crate) finished_total: u64,
    pub(crate) timeout_total: u64
}

enum Prepared {
    Deferred,
    Switch {
        co: *mut Coroutine,
        first: bool,
        previous: Option<CoroId>
    }
}

impl Runtime {
    fn new(config: Config) -> Runtime {
        Runtime {
            config: config,
            registry: Registry::new(),
            sleep_queue: SleepQueue::new(),
            retired: Vec::new(),
            current: None,
            finished_total: 0,
            timeout_total: 0
        }
    }

    fn prepare_resume(&mut self, id: CoroId, wake_time: i64) -> Result<Prepared> {
        let current = self.current;
        let co = self.registry.get_mut(id).ok_or(CoroError::ErrorId)?;

        // A never-started coroutine cannot hold control, so this only
        // triggers on a corrupted runtime.
        if co.state == CoState::Created && current == Some(id) {
            return Err(CoroError::ResumeMain);
        }

        if wake_time > 0 {
            match co.state {
                CoState::Created | CoState::Suspended => {},
                CoState::Running | CoState::Finished => return Err(CoroError::AlreadyRun)
            }
            if let WakeMarker::At(t) = co.wake {
                self.sleep_queue.remove(t, id);
            }
            co.wake = WakeMarker::At(wake_time);
            self.sleep_queue.insert(wake_time, id);
            debug!(id, wake_time, "deferred resume");
            return Ok(Prepared::Deferred);
        }

        let first = match co.state {
            CoState::Created => true,
            CoState::Suspended => false,
            CoState::Running | CoState::Finished => return Err(CoroError::AlreadyRun)
        };

        // An explicit resume preempts a pending timer.
        if let WakeMarker::At(t) = co.wake {
            self.sleep_queue.remove(t, id);
        }
        co.wake = match co.wake {
            WakeMarker::TimedOut if !first => WakeMarker::TimedOut,
            _ => WakeMarker::None
        };
        co.state = CoState::Running;
        self.current = Some(id);

        Ok(Prepared::Switch {
            co: co as *mut Coroutine,
            first: first,
            previous: current
        })
    }

    fn prepare_yield(&mut self, wake_time: i64) -> Result<*mut Coroutine> {
        let id = self.current.ok_or(CoroError::NotInCoro)?;
        let co = match self.registry.get_mut(id) {
            Some(co) => co,
            None => return Err(CoroError::NotInCoro)
        };

        if wake_time > 0 {
            co.wake = WakeMarker::At(wake_time);
            self.sleep_queue.insert(wake_time, id);
        } else {
            co.wake = WakeMarker::Indefinite;
        }
        co.state = CoState::Suspended;

        Ok(co as *mut Coroutine)
    }

    /// Pops due sleep entries until one still matches its coroutine.
    fn next_due(&mut self, now: i64) -> Option<CoroId> {
        while let Some((wake_time, id)) = self.sleep_queue.pop_due(now) {
            match self.registry.get_mut(id) {
                Some(co) if co.wake == WakeMarker::At(wake_time) => {
                    co.wake = WakeMarker::TimedOut;
                    self.timeout_total += 1;
                    debug!(id, wake_time, now, "timed wake-up");
                    return Some(id);
                },
                _ => {
                    trace!(id, wake_time, "skipping stale sleep entry");
                }
            }
        }
        None
    }

    fn take_retired(&mut self) -> Vec<Box<Coroutine>> {
        let mut out = Vec::with_capacity(self.retired.len());
        for id in self.retired.drain(..) {
            if let Some(co) = self.registry.remove(id) {
                out.push(co);
            }
        }
        out
    }
}

/// Replaces the calling thread's runtime configuration.
pub fn configure(config: Config) {
    with_runtime(|rt| rt.config = config);
}

pub fn config() -> Config {
    with_runtime(|rt| rt.config.clone())
}

/// Registers a new coroutine with the configured default stack size.
/// Nothing runs until it is resumed.
pub fn create<F: FnOnce() + 'static>(body: F) -> Handle {
    let stack_size = with_runtime(|rt| rt.config.default_stack_size);
    create_with_stack_size(body, stack_size)
}

pub fn create_with_stack_size<F: FnOnce() + 'static>(body: F, stack_size: usize) -> Handle {
    let body: Body = Box::new(body);
    // Map the stack before borrowing the runtime.
    let stack = Stack::new(stack_size);

    with_runtime(move |rt| {
        let id = rt.registry.next_id();
        debug!(id, stack_size = stack.size(), "coroutine created");
        rt.registry.insert(Box::new(Coroutine::new(id, stack, body)));
        Handle::new(id)
    })
}

/// Creates a coroutine and immediately runs it until it first suspends
/// or finishes.
pub fn go<F: FnOnce() + 'static>(body: F) -> (Handle, Result<()>) {
    let h = create(body);
    let ret = resume(h, 0);
    (h, ret)
}

/// Transfers control into `target`.
///
/// With `wake_time > 0` nothing runs now: the resume is registered as a
/// timed wake-up at that absolute time and `Ok` is returned right away.
/// Otherwise the caller regains control once the target yields or
/// finishes. A panic escaping the target's body is re-raised here.
///
/// Deferred resumes are only accepted by created or suspended coroutines;
/// a running or finished target reports `AlreadyRun` either way.
pub fn resume<T: Into<CoroId>>(target: T, wake_time: i64) -> Result<()> {
    let id = target.into();

    let (co, first, previous) = match with_runtime(|rt| rt.prepare_resume(id, wake_time))? {
        Prepared::Deferred => return Ok(()),
        Prepared::Switch { co, first, previous } => (co, first, previous)
    };

    trace!(id, first, from = previous.unwrap_or(0), "coroutine in");
    unsafe {
        if first {
            Coroutine::start(co);
        } else {
            Coroutine::switch_in(co);
        }
    }

    let panic = with_runtime(|rt| {
        rt.current = previous;
        rt.registry.get_mut(id).and_then(|co| co.panic.take())
    });
    trace!(id, to = previous.unwrap_or(0), "coroutine out");

    if let Some(e) = panic {
        resume_unwind(e);
    }
    Ok(())
}

/// Suspends the running coroutine.
///
/// `wake_time > 0` asks `tick` to wake it at that absolute time; anything
/// else suspends until an explicit `resume`. Returns how it was woken.
pub fn yield_now(wake_time: i64) -> Result<Wakeup> {
    let co = with_runtime(|rt| rt.prepare_yield(wake_time))?;

    unsafe {
        Coroutine::suspend(co);
    }

    Ok(with_runtime(|rt| {
        let id = rt.current.unwrap_or(0);
        match rt.registry.get_mut(id) {
            Some(co) if co.wake == WakeMarker::TimedOut => {
                co.wake = WakeMarker::None;
                Wakeup::TimedOut
            },
            _ => Wakeup::Resumed
        }
    }))
}

/// Suspends until explicitly resumed.
pub fn suspend() -> Result<Wakeup> {
    yield_now(0)
}

pub fn sleep_until(wake_time: i64) -> Result<Wakeup> {
    yield_now(wake_time)
}

/// Called on a finishing coroutine's own stack, right before its final
/// transfer back to the resumer. The record is only freed by `tick`.
pub(crate) fn retire(id: CoroId, panic: Option<Box<dyn Any + Send>>) {
    with_runtime(|rt| {
        if let Some(co) = rt.registry.get_mut(id) {
            co.state = CoState::Finished;
            co.wake = WakeMarker::None;
            co.panic = panic;
        }
        rt.retired.push(id);
        rt.current = None;
        rt.finished_total += 1;
        debug!(id, "coroutine finished");
    });
}

/// One scheduler pass: wakes every sleeper due at `now`, then reclaims all
/// finished coroutines. Returns whether any coroutine is still registered.
pub fn tick(now: i64) -> bool {
    while let Some(id) = with_runtime(|rt| rt.next_due(now)) {
        let ret = resume(id, 0);
        debug_assert!(ret.is_ok(), "timed wake-up of {} failed: {:?}", id, ret);
    }

    // Dropped outside the runtime borrow: payloads may run arbitrary code.
    let reclaimed = with_runtime(|rt| rt.take_retired());
    for co in reclaimed {
        debug!(id = co.id(), "coroutine reclaimed");
        drop(co);
    }

    with_runtime(|rt| !rt.registry.is_empty())
}

/// Id of the running coroutine, or 0 outside any coroutine.
pub fn current_id() -> CoroId {
    with_runtime(|rt| rt.current.unwrap_or(0))
}

pub fn current_handle() -> Option<Handle> {
    with_runtime(|rt| rt.current.map(Handle::new))
}

/// Lifecycle state of a registered coroutine.
pub fn state_of<T: Into<CoroId>>(target: T) -> Option<CoState> {
    let id = target.into();
    with_runtime(|rt| rt.registry.get(id).map(|co| co.state()))
}
