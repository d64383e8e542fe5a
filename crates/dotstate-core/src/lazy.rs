//! At-most-once, memoized, fallible evaluation

use std::cell::{Cell, OnceCell};
use std::sync::Arc;

use crate::{Error, Result};

type Compute<T> = Box<dyn FnOnce() -> Result<T>>;

/// An attribute that is either already known or computed on first read.
///
/// The computation runs at most once. Its outcome, value or failure, is
/// cached and the computation is dropped; later reads return the cached
/// outcome. A cached failure is handed out as [`Error::Evaluation`] wrapping
/// the same `Arc` every time.
pub struct Lazy<T> {
    pending: Cell<Option<Compute<T>>>,
    outcome: OnceCell<std::result::Result<T, Arc<Error>>>,
}

impl<T> Lazy<T> {
    pub fn resolved(value: T) -> Self {
        Self {
            pending: Cell::new(None),
            outcome: OnceCell::from(Ok(value)),
        }
    }

    pub fn deferred(compute: impl FnOnce() -> Result<T> + 'static) -> Self {
        Self {
            pending: Cell::new(Some(Box::new(compute))),
            outcome: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<&T> {
        let outcome = self.outcome.get_or_init(|| match self.pending.take() {
            Some(compute) => compute().map_err(Arc::new),
            // Only reachable when an earlier computation panicked
            None => Err(Arc::new(Error::Poisoned)),
        });
        outcome
            .as_ref()
            .map_err(|err| Error::Evaluation(Arc::clone(err)))
    }

    /// Whether the outcome is known without running anything.
    pub fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome.get() {
            Some(Ok(value)) => f.debug_tuple("Resolved").field(value).finish(),
            Some(Err(err)) => f.debug_tuple("Failed").field(err).finish(),
            None => f.write_str("Unresolved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn computes_once_and_caches_value() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let lazy = Lazy::deferred(move || {
            counter.set(counter.get() + 1);
            Ok(42)
        });

        assert!(!lazy.is_resolved());
        assert_eq!(*lazy.get().unwrap(), 42);
        assert_eq!(*lazy.get().unwrap(), 42);
        assert_eq!(calls.get(), 1);
        assert!(lazy.is_resolved());
    }

    #[test]
    fn caches_identical_failure() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let lazy: Lazy<String> = Lazy::deferred(move || {
            counter.set(counter.get() + 1);
            Err(Error::Template {
                name: "t".into(),
                message: "boom".into(),
            })
        });

        let first = lazy.get().unwrap_err();
        let second = lazy.get().unwrap_err();
        assert_eq!(calls.get(), 1);
        match (first, second) {
            (Error::Evaluation(a), Error::Evaluation(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn resolved_never_computes() {
        let lazy = Lazy::resolved("x".to_string());
        assert!(lazy.is_resolved());
        assert_eq!(lazy.get().unwrap(), "x");
    }
}
