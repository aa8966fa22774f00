use embedded_hal::delay::DelayNs;

/// Nanoseconds in one second.
pub const NS_PER_SEC: i64 = 1_000_000_000;

/// Monotonic time source.
pub trait Now {
    /// The time elapsed since startup in nanoseconds.
    fn now_nanos(&self) -> i64;
}

impl<T: Now + ?Sized> Now for &T {
    fn now_nanos(&self) -> i64 {
        (**self).now_nanos()
    }
}

/// Block for `ns` nanoseconds.
///
/// Zero and negative amounts return immediately, so a deficit computed as a
/// difference of timestamps can be passed in as-is.
pub fn sleep_ns<DELAY: DelayNs>(delay: &mut DELAY, ns: i64) {
    let mut remaining = ns;
    while remaining > 0 {
        let chunk = remaining.min(u32::MAX as i64);
        delay.delay_ns(chunk as u32);
        remaining -= chunk;
    }
}
