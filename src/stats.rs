//! Read-only counters and stack measurement.

use crate::scheduler::with_runtime;

/// Snapshot of the calling thread's runtime counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// Highest number of coroutines ever registered at once.
    pub max_concurrent: usize,
    /// Pending timed wake-ups.
    pub sleeping: usize,
    /// Coroutines registered right now, including finished ones awaiting
    /// reclamation.
    pub registered: usize,
    pub finished_total: u64,
    pub timeout_total: u64
}

pub fn statistics() -> Statistics {
    with_runtime(|rt| Statistics {
        max_concurrent: rt.registry.max_concurrent(),
        sleeping: rt.sleep_queue.len(),
        registered: rt.registry.len(),
        finished_total: rt.finished_total,
        timeout_total: rt.timeout_total
    })
}

/// Bytes of the running coroutine's stack in use at the call site, or 0
/// outside any coroutine.
///
/// This is a measurement only; nothing stops a coroutine from running
/// past its stack.
#[inline(never)]
pub fn current_stack_used() -> usize {
    let marker = 0u8;
    let here = &marker as *const u8 as usize;

    with_runtime(|rt| {
        rt.current
            .and_then(|id| rt.registry.get(id))
            .map(|co| co.stack().top().saturating_sub(here))
            .unwrap_or(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{create, resume, tick, yield_now};
    use std::cell::Cell;
    use std::hint::black_box;
    use std::rc::Rc;

    #[test]
    fn fresh_runtime_is_empty() {
        assert_eq!(statistics(), Statistics::default());
        assert_eq!(current_stack_used(), 0);
    }

    #[test]
    fn created_coroutines_are_registered_not_running() {
        create(|| {});
        create(|| {});
        let s = statistics();
        assert_eq!(s.registered, 2);
        assert_eq!(s.max_concurrent, 2);
        assert_eq!(s.finished_total, 0);
        assert_eq!(s.sleeping, 0);
        assert_eq!(current_stack_used(), 0);
    }

    #[test]
    fn sleeping_counts_pending_timers() {
        let h = create(|| {
            yield_now(100).unwrap();
        });
        resume(h, 0).unwrap();
        assert_eq!(statistics().sleeping, 1);
        tick(100);
        let s = statistics();
        assert_eq!(s.sleeping, 0);
        assert_eq!(s.timeout_total, 1);
        assert_eq!(s.finished_total, 1);
        assert_eq!(s.registered, 0);
        assert_eq!(s.max_concurrent, 1);
    }

    #[test]
    fn stack_use_grows_with_depth() {
        #[inline(never)]
        fn deep(n: usize) -> usize {
            let pad = black_box([n as u8; 1024]);
            if n == 0 {
                return current_stack_used();
            }
            let used = deep(n - 1);
            black_box(&pad);
            used
        }

        let shallow = Rc::new(Cell::new(0));
        let deeper = Rc::new(Cell::new(0));
        let (s, d) = (shallow.clone(), deeper.clone());
        let h = create(move || {
            s.set(current_stack_used());
            d.set(deep(8));
        });
        resume(h, 0).unwrap();

        assert!(shallow.get() > 0);
        assert!(shallow.get() < 65536);
        assert!(deeper.get() > shallow.get() + 8 * 1024);
        assert!(deeper.get() < 65536);
    }
}
