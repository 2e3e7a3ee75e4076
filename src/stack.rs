use crate::config::MIN_STACK_SIZE;
use crate::platform;

/// Raw memory backing one coroutine's call stack.
///
/// The lowest page is a guard page; `size()` reports only the usable part.
pub struct Stack {
    mem: *mut [u8]
}

impl Stack {
    pub fn new(stack_size: usize) -> Stack {
        let stack_size = stack_size.max(MIN_STACK_SIZE);

        // Allocate one more page as the guard page
        let mem = platform::setup_stack(stack_size + *platform::PAGE_SIZE);
        unsafe {
            platform::setup_stack_guard_page(mem);
        }
        Stack {
            mem: mem
        }
    }

    /// Highest address of the buffer, where a new stack begins.
    pub fn top(&self) -> usize {
        self.bottom() + self.size()
    }

    /// Lowest usable address, just above the guard page.
    pub fn bottom(&self) -> usize {
        self.mem as *mut u8 as usize + *platform::PAGE_SIZE
    }

    pub fn size(&self) -> usize {
        self.mem.len() - *platform::PAGE_SIZE
    }

    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.bottom() && addr <= self.top()
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        unsafe {
            platform::free_stack(self.mem);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_should_be_page_aligned() {
        let stack = Stack::new(65536);
        assert_eq!(stack.top() % *platform::PAGE_SIZE, 0);
        assert_eq!(stack.bottom() % *platform::PAGE_SIZE, 0);
        assert!(stack.size() >= 65536);
    }

    #[test]
    fn tiny_stacks_are_raised_to_minimum() {
        let stack = Stack::new(16);
        assert!(stack.size() >= MIN_STACK_SIZE);
    }

    #[test]
    fn stack_memory_is_writable() {
        let stack = Stack::new(8192);
        unsafe {
            let p = (stack.top() - 1) as *mut u8;
            *p = 42;
            assert_eq!(*p, 42);
            let q = stack.bottom() as *mut u8;
            *q = 7;
            assert_eq!(*q, 7);
        }
        assert!(stack.contains(stack.top() - 1));
        assert!(!stack.contains(stack.bottom() - 1));
    }
}
