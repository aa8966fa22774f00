//! Keeping background work out of the echo timing loop.
//!
//! Anything that can preempt the busy-wait in
//! [`RangingChannel::await_echo_pulse`](crate::RangingChannel::await_echo_pulse)
//! stretches the measured pulse, and a pause spanning both edges means the
//! loop never sees the pulse at all. [`BackgroundTaskGuard`] suspends such work
//! for the duration of the wait and then runs it once, at a point where the
//! ranging channel has to idle for the ping interval anyway.

/// Hook for interruptible background work: interrupts, allocator compaction,
/// deferred flushing and the like.
pub trait Maintenance {
    /// Stop background work from running until [`Maintenance::resume`].
    fn suspend(&mut self);

    /// Allow background work again.
    fn resume(&mut self);

    /// Do one pass of the deferred work now.
    fn collect(&mut self);
}

/// No background work to hold back.
impl Maintenance for () {
    fn suspend(&mut self) {}

    fn resume(&mut self) {}

    fn collect(&mut self) {}
}

impl<M: Maintenance + ?Sized> Maintenance for &mut M {
    fn suspend(&mut self) {
        (**self).suspend();
    }

    fn resume(&mut self) {
        (**self).resume();
    }

    fn collect(&mut self) {
        (**self).collect();
    }
}

/// Suspends background work while alive. Dropping it, on any path including
/// unwinding, resumes the work and runs exactly one maintenance pass.
#[must_use = "background work resumes as soon as the guard is dropped"]
pub struct BackgroundTaskGuard<'a, M: Maintenance> {
    maintenance: &'a mut M,
}

impl<'a, M: Maintenance> BackgroundTaskGuard<'a, M> {
    pub fn new(maintenance: &'a mut M) -> Self {
        maintenance.suspend();
        Self { maintenance }
    }
}

impl<M: Maintenance> Drop for BackgroundTaskGuard<'_, M> {
    fn drop(&mut self) {
        self.maintenance.resume();
        self.maintenance.collect();
    }
}

/// Run `op` with background work suspended, then do one maintenance pass.
pub fn run_with_background_suppressed<M, T, F>(maintenance: &mut M, op: F) -> T
where
    M: Maintenance,
    F: FnOnce() -> T,
{
    let _guard = BackgroundTaskGuard::new(maintenance);
    op()
}
