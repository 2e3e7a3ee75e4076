extern crate lightcoro;
extern crate tracing_subscriber;

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use lightcoro::{create, resume, statistics, tick_now, wake_after, yield_now, Wakeup};
use tracing_subscriber::EnvFilter;

fn sleep_ms(ms: u64) {
    match yield_now(wake_after(Duration::from_millis(ms))) {
        Ok(Wakeup::TimedOut) => {},
        other => panic!("unexpected wake-up: {:?}", other)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let done_count: Rc<Cell<usize>> = Rc::new(Cell::new(0));

    for (n, ms) in [(1, 500), (2, 300)].iter().cloned() {
        let done = done_count.clone();
        let h = create(move || {
            println!("Begin {}", n);
            sleep_ms(ms);
            println!("End {}", n);
            done.set(done.get() + 1);
        });
        resume(h, 0).unwrap();
    }

    // The driver loop: tick until every coroutine has been reclaimed.
    while tick_now() {
        thread::sleep(Duration::from_millis(10));
    }

    let s = statistics();
    println!(
        "done={} max_concurrent={} timeouts={}",
        done_count.get(), s.max_concurrent, s.timeout_total
    );
}
