use std::any::Any;
use std::os::raw;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::process;
use std::ptr;

use crate::scheduler;
use crate::stack::Stack;

pub type CoroId = u64;

pub type StackInitializer = extern "C" fn (user_data: *mut raw::c_void);

extern "C" {
    fn __lightcoro_start(
        save_sp: *mut usize,
        new_sp: usize,
        initializer: StackInitializer,
        user_data: *mut raw::c_void
    );
    fn __lightcoro_transfer(save_sp: *mut usize, to_sp: usize);
}

/// Lifecycle of a coroutine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoState {
    /// Registered, never resumed.
    Created,
    /// Holding control, or waiting inside a `resume` of another coroutine.
    Running,
    /// Parked in `yield_now`.
    Suspended,
    /// Body returned; waiting for the next tick to reclaim it.
    Finished
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum WakeMarker {
    None,
    At(i64),
    Indefinite,
    TimedOut
}

/// Opaque reference to a coroutine.
///
/// A handle does not keep the coroutine alive; once the coroutine has been
/// reclaimed, resuming through the handle reports `ErrorId`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    id: CoroId
}

impl Handle {
    pub(crate) fn new(id: CoroId) -> Handle {
        Handle { id: id }
    }

    pub fn id(&self) -> CoroId {
        self.id
    }
}

impl From<Handle> for CoroId {
    fn from(h: Handle) -> CoroId {
        h.id
    }
}

pub(crate) type Body = Box<dyn FnOnce() + 'static>;

/// Runtime record of one coroutine.
///
/// `resume_sp` holds the stack pointer of whoever last resumed the
/// coroutine; `suspend_sp` holds the coroutine's own stack pointer at its
/// last yield. Both are only meaningful after the first activation.
pub(crate) struct Coroutine {
    id: CoroId,
    pub(crate) state: CoState,
    pub(crate) wake: WakeMarker,
    pub(crate) panic: Option<Box<dyn Any + Send>>,
    stack: Stack,
    body: Option<Body>,
    resume_sp: usize,
    suspend_sp: usize
}

impl Coroutine {
    pub fn new(id: CoroId, stack: Stack, body: Body) -> Coroutine {
        let sp = stack.top();

        Coroutine {
            id: id,
            state: CoState::Created,
            wake: WakeMarker::None,
            panic: None,
            stack: stack,
            body: Some(body),
            resume_sp: sp,
            suspend_sp: sp
        }
    }

    pub fn id(&self) -> CoroId {
        self.id
    }

    pub fn state(&self) -> CoState {
        self.state
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// First activation: installs the coroutine's stack and runs its body
    /// on it. Returns once the coroutine yields or finishes.
    ///
    /// # Safety
    ///
    /// `this` must point to a registered, never-started coroutine that stays
    /// allocated until control comes back.
    pub unsafe fn start(this: *mut Coroutine) {
        let save = ptr::addr_of_mut!((*this).resume_sp);
        let new_sp = (*this).stack.top();
        __lightcoro_start(save, new_sp, Self::co_initializer, this as *mut raw::c_void);
    }

    /// Hands control to a coroutine parked in `suspend`.
    ///
    /// # Safety
    ///
    /// `this` must point to a registered coroutine that has been started and
    /// is currently suspended.
    pub unsafe fn switch_in(this: *mut Coroutine) {
        let save = ptr::addr_of_mut!((*this).resume_sp);
        let to = (*this).suspend_sp;
        __lightcoro_transfer(save, to);
    }

    /// Hands control back to the last resumer. Called on the coroutine's
    /// own stack.
    ///
    /// # Safety
    ///
    /// `this` must be the coroutine whose stack is currently active.
    pub unsafe fn suspend(this: *mut Coroutine) {
        let save = ptr::addr_of_mut!((*this).suspend_sp);
        let to = (*this).resume_sp;
        __lightcoro_transfer(save, to);
    }

    extern "C" fn co_initializer(user_data: *mut raw::c_void) {
        let this = user_data as *mut Coroutine;
        let (id, body) = unsafe { ((*this).id, (*this).body.take()) };

        let mut panic = None;
        if let Some(body) = body {
            if let Err(e) = catch_unwind(AssertUnwindSafe(body)) {
                panic = Some(e);
            }
        }

        // No droppable objects should remain at this point.
        // Otherwise there will be a resource leak.
        scheduler::retire(id, panic);
        unsafe {
            Coroutine::terminate_from_inside(this);
        }
    }

    unsafe fn terminate_from_inside(this: *mut Coroutine) -> ! {
        Coroutine::suspend(this);

        error!("Coroutine termination failed");
        process::abort();
    }
}

impl Drop for Coroutine {
    fn drop(&mut self) {
        if self.state != CoState::Finished && self.state != CoState::Created {
            // The body's frames live on the stack being released; whatever
            // they own is leaked.
            debug!(id = self.id, state = ?self.state, "dropping unfinished coroutine");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    // Drives the switch engine directly, without the scheduler, so that
    // only `start`/`switch_in`/`suspend` are involved.
    fn bare(body: Body) -> Box<Coroutine> {
        Box::new(Coroutine::new(0, Stack::new(65536), body))
    }

    #[test]
    fn new_coroutine_is_created() {
        let co = bare(Box::new(|| {}));
        assert_eq!(co.state(), CoState::Created);
        assert_eq!(co.wake, WakeMarker::None);
        assert_eq!(co.resume_sp, co.stack().top());
    }

    #[test]
    fn start_then_switch_in_round_trips() {
        let steps = Rc::new(Cell::new(0));
        let mut co = bare(Box::new(|| {}));
        let raw = &mut *co as *mut Coroutine;

        let s = steps.clone();
        // Replace the body with one that parks after every step.
        co.body = Some(Box::new(move || {
            s.set(1);
            unsafe { Coroutine::suspend(raw) };
            s.set(2);
            unsafe { Coroutine::suspend(raw) };
            s.set(3);
            unsafe { Coroutine::suspend(raw) };
        }));

        unsafe { Coroutine::start(raw) };
        assert_eq!(steps.get(), 1);
        assert!(co.stack().contains(co.suspend_sp));

        unsafe { Coroutine::switch_in(raw) };
        assert_eq!(steps.get(), 2);

        unsafe { Coroutine::switch_in(raw) };
        assert_eq!(steps.get(), 3);
    }

    #[test]
    fn handle_converts_to_id() {
        let h = Handle::new(17);
        let id: CoroId = h.into();
        assert_eq!(id, 17);
        assert_eq!(h.id(), 17);
    }
}
