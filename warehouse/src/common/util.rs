use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

pub trait ReadExecutor<T: ?Sized> {
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R;
}

impl<T> ReadExecutor<T> for Atomic<T> {
    #[inline]
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let read_guard = self.read();
        f(&*read_guard)
    }
}

pub trait WriteExecutor<T: ?Sized> {
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> WriteExecutor<T> for Atomic<T> {
    #[inline]
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut write_guard = self.write();
        f(&mut *write_guard)
    }
}

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
#[inline]
pub fn current_time_millis() -> i64 {
    Utc::now().timestamp_millis()
}
