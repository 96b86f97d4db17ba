//! Asynchronous delay used by the polling service.
use embassy_time::Duration;

/// Timer abstraction; the firmware plugs in `embassy_time::Timer`, tests plug
/// in a tokio sleep or an instant fake.
pub trait BusTimer {
    /// Wait for `period`.
    fn delay<'a>(&'a mut self, period: Duration) -> impl core::future::Future<Output = ()> + 'a;
}
