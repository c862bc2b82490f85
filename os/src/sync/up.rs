use core::cell::{RefCell, RefMut};

/// Wrap a static data structure inside it so that we are able to access it
/// without any `unsafe`.
///
/// The kernel is strictly uniprocessor and every access happens with
/// interrupts disabled (inside a trap handler or before they are enabled at
/// boot), so the runtime borrow flag is the interrupt-off mutual exclusion
/// made explicit: a nested `exclusive_access` is a kernel bug and panics.
pub struct UPSafeCell<T> {
    /// inner data
    inner: RefCell<T>,
}

unsafe impl<T> Sync for UPSafeCell<T> {}

impl<T> UPSafeCell<T> {
    /// User is responsible to guarantee that inner struct is only used in
    /// uniprocessor.
    pub unsafe fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// Panic if the data has been borrowed.
    pub fn exclusive_access(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }
}
