//! C ABI for the coroutine runtime.
//!
//! Every function returns the integer codes of `CoroError::code` and
//! `Wakeup::code`: 0 ok, 1 timeout, negative on failure.

extern crate lightcoro;

use std::os::raw::c_void;
use lightcoro::CoroId;

pub type CoroutineEntry = extern "C" fn (user_data: *mut c_void);

const CORO_OK: i32 = 0;

#[no_mangle]
pub extern "C" fn lightcoro_new(
    entry: CoroutineEntry,
    user_data: *mut c_void,
    stack_size: usize
) -> CoroId {
    let body = move || entry(user_data);
    if stack_size == 0 {
        lightcoro::create(body).id()
    } else {
        lightcoro::create_with_stack_size(body, stack_size).id()
    }
}

#[no_mangle]
pub extern "C" fn lightcoro_resume_at(id: CoroId, wake_time: i64) -> i32 {
    match lightcoro::resume(id, wake_time) {
        Ok(()) => CORO_OK,
        Err(e) => e.code()
    }
}

#[no_mangle]
pub extern "C" fn lightcoro_yield(wake_time: i64) -> i32 {
    match lightcoro::yield_now(wake_time) {
        Ok(w) => w.code(),
        Err(e) => e.code()
    }
}

/// Returns 1 while any coroutine remains registered.
#[no_mangle]
pub extern "C" fn lightcoro_schedule(now: i64) -> i32 {
    lightcoro::tick(now) as i32
}

#[no_mangle]
pub extern "C" fn lightcoro_getid() -> CoroId {
    lightcoro::current_id()
}

#[no_mangle]
pub unsafe extern "C" fn lightcoro_get_statistic(
    max_coro: *mut usize,
    sleep_coro: *mut usize,
    total: *mut usize
) {
    let s = lightcoro::statistics();
    if !max_coro.is_null() {
        *max_coro = s.max_concurrent;
    }
    if !sleep_coro.is_null() {
        *sleep_coro = s.sleeping;
    }
    if !total.is_null() {
        *total = s.registered;
    }
}

#[no_mangle]
pub extern "C" fn lightcoro_get_current_stack_used() -> usize {
    lightcoro::current_stack_used()
}
