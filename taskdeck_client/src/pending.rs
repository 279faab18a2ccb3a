//! Request bookkeeping shared by the form state machines.

use std::mem;

/// Holds a form in its busy state for the length of a request.
///
/// If the request future is dropped before [`InFlight::complete`] runs, the
/// slot goes back to whatever it held before, so the form accepts the next
/// submit instead of reporting itself busy forever.
pub(crate) struct InFlight<'a, S> {
    slot: &'a mut S,
    previous: Option<S>,
}

impl<'a, S> InFlight<'a, S> {
    pub(crate) fn start(slot: &'a mut S, busy: S) -> Self {
        let previous = mem::replace(slot, busy);
        Self {
            slot,
            previous: Some(previous),
        }
    }

    /// The request finished; the caller sets the resulting state itself.
    pub(crate) fn complete(mut self) {
        self.previous = None;
    }
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.slot = previous;
        }
    }
}
