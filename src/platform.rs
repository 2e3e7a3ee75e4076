use std::process;
use std::ptr;

lazy_static! {
    pub static ref PAGE_SIZE: usize = {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size <= 0 { 4096 } else { size as usize }
    };
}

pub fn round_to_page(size: usize) -> usize {
    let page = *PAGE_SIZE;
    (size + page - 1) / page * page
}

/// Maps a fresh read/write region for use as a coroutine stack.
///
/// Running out of address space here is not something a caller can
/// recover from, so the process is aborted.
pub fn setup_stack(size: usize) -> *mut [u8] {
    let size = round_to_page(size);
    let mem = unsafe {
        libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_STACK,
            -1,
            0
        )
    };
    if mem == libc::MAP_FAILED {
        error!(size, "unable to map coroutine stack");
        process::abort();
    }
    ptr::slice_from_raw_parts_mut(mem as *mut u8, size)
}

/// Revokes access to the lowest page of `mem`.
pub unsafe fn setup_stack_guard_page(mem: *mut [u8]) {
    let base = mem as *mut u8;
    if libc::mprotect(base as *mut libc::c_void, *PAGE_SIZE, libc::PROT_NONE) != 0 {
        error!("unable to protect stack guard page");
        process::abort();
    }
}

pub unsafe fn free_stack(mem: *mut [u8]) {
    let len = mem.len();
    let base = mem as *mut u8;
    if libc::munmap(base as *mut libc::c_void, len) != 0 {
        error!(len, "unable to unmap coroutine stack");
    }
}
