//! The read-only query surface over a built registry.

use crate::core::{ResolutionGuard, ServiceInstance, ServiceKey, ServiceProvider};
use crate::error::Error;
use crate::registry::{Registration, Registry};

use std::sync::Arc;

/// The resolution contract shared by the local and the tiered resolver, so
/// calling code stays agnostic to which one is in play.
///
/// Both operations accept an absent key and answer it with an absent
/// result; passing `None` is never an error in any implementation.
pub trait ServiceResolver: Send + Sync {
  /// Resolves a single instance for `key`. When several registrations are
  /// bound under the key, the last one registered wins.
  fn resolve_key(&self, key: Option<ServiceKey>) -> Result<Option<ServiceInstance>, Error>;

  /// Resolves every registration bound under `key`, in registration order.
  fn resolve_key_all(&self, key: Option<ServiceKey>) -> Result<Vec<ServiceInstance>, Error>;
}

/// Typed convenience over any [`ServiceResolver`].
pub trait ResolverExt: ServiceResolver {
  /// Resolves `T`, or `None` when nothing is registered for it.
  fn resolve<T>(&self) -> Result<Option<Arc<T>>, Error>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    match self.resolve_key(Some(ServiceKey::of::<T>()))? {
      Some(instance) => instance.downcast::<T>().map(Some).ok_or(Error::TypeMismatch {
        requested: std::any::type_name::<T>(),
      }),
      None => Ok(None),
    }
  }

  /// Resolves every registration of `T`, in registration order.
  fn resolve_all<T>(&self) -> Result<Vec<Arc<T>>, Error>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self
      .resolve_key_all(Some(ServiceKey::of::<T>()))?
      .into_iter()
      .map(|instance| {
        instance.downcast::<T>().ok_or(Error::TypeMismatch {
          requested: std::any::type_name::<T>(),
        })
      })
      .collect()
  }

  /// Resolves `T`, treating absence as [`Error::MissingDependency`].
  fn resolve_required<T>(&self) -> Result<Arc<T>, Error>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self.resolve::<T>()?.ok_or(Error::MissingDependency {
      dependency: std::any::type_name::<T>(),
      requested_by: None,
    })
  }
}

impl<R: ServiceResolver + ?Sized> ResolverExt for R {}

/// The registry-backed resolver produced by building a registrar.
///
/// Cloning is cheap and every clone shares the same registry. A clone of
/// this handle is also what constructors receive when they declare a
/// context parameter.
#[derive(Clone)]
pub struct Resolver {
  inner: Arc<ResolverInner>,
}

struct ResolverInner {
  registry: Registry,
  fallback: Option<Arc<dyn ServiceProvider>>,
}

impl Resolver {
  /// Wraps a built registry, optionally backed by a fallback provider
  /// consulted when single-value resolution finds no registration.
  pub fn new(registry: Registry, fallback: Option<Arc<dyn ServiceProvider>>) -> Self {
    Self {
      inner: Arc::new(ResolverInner { registry, fallback }),
    }
  }

  /// The registry this resolver reads from.
  pub fn registry(&self) -> &Registry {
    &self.inner.registry
  }

  fn activate(&self, key: ServiceKey, registration: &Registration) -> Result<ServiceInstance, Error> {
    let _guard = ResolutionGuard::enter(key)?;
    registration.activate(self)
  }
}

impl ServiceResolver for Resolver {
  fn resolve_key(&self, key: Option<ServiceKey>) -> Result<Option<ServiceInstance>, Error> {
    let Some(key) = key else {
      return Ok(None);
    };

    let registrations = self.inner.registry.lookup(key);
    match registrations.last() {
      Some(registration) => self.activate(key, registration).map(Some),
      None => match &self.inner.fallback {
        Some(provider) => {
          #[cfg(feature = "tracing")]
          tracing::trace!(key = key.label(), "consulting the fallback provider");
          Ok(provider.get_service(key))
        }
        None => Ok(None),
      },
    }
  }

  fn resolve_key_all(&self, key: Option<ServiceKey>) -> Result<Vec<ServiceInstance>, Error> {
    let Some(key) = key else {
      return Ok(Vec::new());
    };

    // The collection form reads the registry only. A fallback provider can
    // answer for a single instance, never for a collection.
    self
      .inner
      .registry
      .lookup(key)
      .iter()
      .map(|registration| self.activate(key, registration))
      .collect()
  }
}
