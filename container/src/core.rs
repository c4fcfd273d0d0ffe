//! Core vocabulary shared across the crate: lookup keys, type-erased
//! service handles, the external provider contract, and the per-thread
//! guard that catches cyclic resolution.

use crate::error::Error;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

thread_local! {
  // Keys currently being resolved on this thread, in entry order. A key
  // appearing twice means the registration graph loops back on itself.
  static RESOLVING_STACK: RefCell<Vec<ServiceKey>> = RefCell::new(Vec::new());
}

/// A stable, hashable identifier for a requested capability.
///
/// Keys compare by type identity, never by name; the label is carried only
/// so diagnostics can say which type was involved. Unsized types are valid,
/// so a trait object is a perfectly good key:
///
/// ```
/// use strata::ServiceKey;
///
/// trait Greeter: Send + Sync {}
///
/// let by_trait = ServiceKey::of::<dyn Greeter>();
/// let by_value = ServiceKey::of::<String>();
///
/// assert_ne!(by_trait, by_value);
/// assert_eq!(by_trait, ServiceKey::of::<dyn Greeter>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceKey {
  id: TypeId,
  label: &'static str,
}

impl ServiceKey {
  /// Creates the key identifying `T`.
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      label: std::any::type_name::<T>(),
    }
  }

  /// The diagnostic label for this key (a type path). Not part of identity.
  pub fn label(&self) -> &'static str {
    self.label
  }
}

impl PartialEq for ServiceKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ServiceKey({})", self.label)
  }
}

/// A type-erased, shared handle to one resolved service object.
///
/// The handle stores an `Arc<T>` behind `dyn Any`, which keeps unsized
/// services (trait objects) representable. Cloning is cheap and every clone
/// refers to the same underlying object.
#[derive(Clone)]
pub struct ServiceInstance {
  value: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
  /// Wraps an already-shared service object.
  pub fn new<T>(value: Arc<T>) -> Self
  where
    T: ?Sized + Send + Sync + 'static,
  {
    Self {
      value: Arc::new(value),
    }
  }

  /// Recovers the typed handle, or `None` when the stored type is not `T`.
  pub fn downcast<T>(&self) -> Option<Arc<T>>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self.value.downcast_ref::<Arc<T>>().cloned()
  }
}

impl fmt::Debug for ServiceInstance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ServiceInstance(..)")
  }
}

/// The contract an externally-owned service source exposes to this crate.
///
/// A provider is only ever queried. Fallback resolution reads through it;
/// registration never writes to it, and its lifecycle stays with its owner.
pub trait ServiceProvider: Send + Sync {
  /// Returns the provider's service for `key`, or `None` when it has none.
  fn get_service(&self, key: ServiceKey) -> Option<ServiceInstance>;
}

/// RAII marker that `key` is being resolved on the current thread.
///
/// Entering a key that is already on the stack means constructor resolution
/// has looped back onto itself, which surfaces as [`Error::DependencyCycle`]
/// carrying the labels from the first visit through the revisit.
#[derive(Debug)]
pub(crate) struct ResolutionGuard;

impl ResolutionGuard {
  pub(crate) fn enter(key: ServiceKey) -> Result<Self, Error> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack.iter().position(|entered| *entered == key) {
        let mut chain: Vec<&'static str> =
          stack[start..].iter().map(ServiceKey::label).collect();
        chain.push(key.label());
        return Err(Error::DependencyCycle { chain });
      }
      stack.push(key);
      Ok(())
    })?;
    Ok(Self)
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  trait Marker: Send + Sync {}

  #[test]
  fn keys_compare_by_type_identity() {
    assert_eq!(ServiceKey::of::<String>(), ServiceKey::of::<String>());
    assert_ne!(ServiceKey::of::<String>(), ServiceKey::of::<usize>());
    assert_ne!(ServiceKey::of::<dyn Marker>(), ServiceKey::of::<String>());
  }

  #[test]
  fn instance_downcasts_to_the_stored_type_only() {
    let instance = ServiceInstance::new(Arc::new(41_usize));

    let typed = instance.downcast::<usize>();
    assert_eq!(typed.as_deref(), Some(&41));
    assert!(instance.downcast::<String>().is_none());
  }

  #[test]
  fn guard_reports_the_chain_from_first_visit_to_revisit() {
    let a = ServiceKey::of::<String>();
    let b = ServiceKey::of::<usize>();

    let outer = ResolutionGuard::enter(a).unwrap();
    let inner = ResolutionGuard::enter(b).unwrap();

    let error = ResolutionGuard::enter(a).unwrap_err();
    match error {
      Error::DependencyCycle { chain } => {
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), chain.last());
      }
      other => panic!("expected a cycle, got {other:?}"),
    }

    drop(inner);
    drop(outer);

    // The stack unwound fully, so the same key can be entered again.
    let reentered = ResolutionGuard::enter(a);
    assert!(reentered.is_ok());
  }
}
