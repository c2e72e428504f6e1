use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cooperative-stop flag.
///
/// Cloning yields another handle to the same flag. Loops check it at the top
/// of every iteration; nothing is interrupted mid-operation.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn trigger(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }

    /// Whether the signal has been raised.
    pub fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_visible_through_clones() {
        let signal = StopSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_triggered());

        assert!(signal.trigger());
        assert!(observer.is_triggered());
    }

    #[test]
    fn only_first_trigger_reports_true() {
        let signal = StopSignal::new();
        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(!signal.clone().trigger());
    }

    #[test]
    fn trigger_from_another_thread() {
        let signal = StopSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.trigger()).join().unwrap();
        assert!(signal.is_triggered());
    }
}
