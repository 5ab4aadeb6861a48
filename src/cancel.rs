use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Set by the interrupt handler, observed by busy-run waits.
pub type CancelSignal = Arc<AtomicBool>;

pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[must_use]
pub fn new_cancel_signal() -> CancelSignal {
    Arc::new(AtomicBool::new(false))
}

/// Sleeps for `duration` in short slices. Returns `true` as soon as `cancel` is set.
pub fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
    }
}
