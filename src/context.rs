//! Thread-local current-controller context.
//!
//! The portability-layer entry macro needs a controller without threading a
//! handle through every call site. [`Helm::make_current`] installs one for
//! the current thread; [`current`] retrieves it.
//!
//! [`Helm::make_current`]: crate::Helm::make_current
//! [`current`]: crate::current

use std::cell::RefCell;
use std::sync::Weak;

use crate::controller::{Helm, HelmInner};

thread_local! {
    static CURRENT: RefCell<Option<Weak<HelmInner>>> = const { RefCell::new(None) };
}

/// Get the current controller from thread-local storage.
///
/// Returns `Some` while a [`CurrentGuard`] from `make_current` is live on
/// this thread (and the controller itself is still alive), `None` otherwise.
pub fn current() -> Option<Helm> {
    CURRENT.with(|cell| {
        cell.borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(Helm::from_inner)
    })
}

/// Install a controller and return the guard restoring the previous one.
pub(crate) fn install(inner: Weak<HelmInner>) -> CurrentGuard {
    let previous = CURRENT.with(|cell| cell.borrow_mut().replace(inner));
    CurrentGuard { previous }
}

/// Restores the previously-current controller on drop.
#[must_use = "dropping the guard immediately uninstalls the controller"]
pub struct CurrentGuard {
    previous: Option<Weak<HelmInner>>,
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|cell| {
            *cell.borrow_mut() = previous;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HelmBuilder;

    #[test]
    fn test_current_none_initially() {
        assert!(current().is_none());
    }

    #[test]
    fn test_install_and_restore() {
        let helm = HelmBuilder::new().thread_cap(4).build().unwrap();

        {
            let _guard = helm.make_current();
            assert!(current().is_some());
        }
        assert!(current().is_none());
    }

    #[test]
    fn test_nested_install_restores_outer() {
        let outer = HelmBuilder::new().thread_cap(4).build().unwrap();
        let inner = HelmBuilder::new().thread_cap(2).build().unwrap();

        let _outer_guard = outer.make_current();
        {
            let _inner_guard = inner.make_current();
            assert_eq!(current().unwrap().thread_cap(), 2);
        }
        assert_eq!(current().unwrap().thread_cap(), 4);
    }

    #[test]
    fn test_dead_controller_yields_none() {
        let helm = HelmBuilder::new().thread_cap(2).build().unwrap();
        let guard = helm.make_current();
        drop(helm);
        assert!(current().is_none());
        drop(guard);
    }
}
