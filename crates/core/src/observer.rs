/// Receives per-iteration events from a solver and may steer it.
///
/// An observer sees every [`Iteration`] a backend reports and can end the
/// solve early without touching the problem definition. Returning `None`
/// lets the solver carry on; `Some(action)` requests that action.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer, and `()` is the
/// observer that never intervenes.
///
/// [`Iteration`]: crate::Iteration
pub trait Observer<E, A> {
    /// Inspects one event and optionally returns an action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
