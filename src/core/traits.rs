//! Core traits at the seams between the bank and its collaborators

/// Subscriber to the bank's stream of human-readable events
///
/// Observers are invoked synchronously on whichever cashier or ticker thread
/// produced the event, so implementations must return quickly. A panicking
/// observer is isolated by the event bus: the panic is logged and swallowed,
/// and the remaining observers still receive the event.
pub trait Observer: Send + Sync {
    fn on_event(&self, message: &str);
}

impl<F> Observer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_event(&self, message: &str) {
        self(message)
    }
}
