//! Two-tier composition: an owned registrar and resolver layered in front
//! of an externally-owned provider.

use crate::blueprint::Blueprint;
use crate::core::{ServiceInstance, ServiceKey, ServiceProvider};
use crate::error::Error;
use crate::registrar::{LazyFactory, Registrar};
use crate::registry::Registration;
use crate::resolver::ServiceResolver;

use std::sync::Arc;

/// A registrar that composes an owned primary with an externally-owned
/// secondary provider.
///
/// Registration only ever touches the primary. The secondary is consulted
/// as a read-only fallback and is never mutated by this crate; its
/// lifecycle stays with its owner. The provider may be supplied up front
/// ([`from_provider`](TieredRegistrar::from_provider)) or attached later
/// ([`deferred`](TieredRegistrar::deferred) followed by
/// [`attach_provider`](TieredRegistrar::attach_provider)), which is the
/// shape hosts use when the provider only exists once their own startup has
/// run.
pub struct TieredRegistrar {
  primary: Registrar,
  secondary: Option<Arc<dyn ServiceProvider>>,
}

impl TieredRegistrar {
  /// A tiered registrar over an already-available provider.
  ///
  /// The provider is wired in twice: as the tiered secondary and as the
  /// primary resolver's own fallback, so dependencies resolved from inside
  /// a constructor see it exactly like top-level lookups do.
  pub fn from_provider(secondary: Arc<dyn ServiceProvider>) -> Self {
    Self {
      primary: Registrar::with_provider(Arc::clone(&secondary)),
      secondary: Some(secondary),
    }
  }

  /// A tiered registrar whose provider will be attached later. Building
  /// before [`attach_provider`](TieredRegistrar::attach_provider) fails
  /// with [`Error::ResolverNotReady`].
  pub fn deferred() -> Self {
    Self {
      primary: Registrar::new(),
      secondary: None,
    }
  }

  /// Attaches (or replaces) the secondary provider, wiring it into both
  /// tiers exactly as [`from_provider`](TieredRegistrar::from_provider)
  /// would have.
  pub fn attach_provider(&mut self, provider: Arc<dyn ServiceProvider>) {
    self.primary.set_provider(Arc::clone(&provider));
    self.secondary = Some(provider);
  }

  /// See [`Registrar::bind`].
  pub fn bind<S>(&mut self, blueprint: Blueprint<S>) -> Result<(), Error>
  where
    S: ?Sized + Send + Sync + 'static,
  {
    self.primary.bind(blueprint)
  }

  /// See [`Registrar::bind_instance`].
  pub fn bind_instance<T>(&mut self, instance: Arc<T>)
  where
    T: ?Sized + Send + Sync + 'static,
  {
    self.primary.bind_instance(instance);
  }

  /// See [`Registrar::bind_lazy`].
  pub fn bind_lazy<T, F>(&mut self, factory: F)
  where
    T: ?Sized + Send + Sync + 'static,
    F: FnOnce() -> Arc<T> + Send + 'static,
  {
    self.primary.bind_lazy(factory);
  }

  /// See [`Registrar::register`].
  pub fn register(&mut self, registration: Registration) {
    self.primary.register(registration);
  }

  /// See [`Registrar::register_lazy`].
  pub fn register_lazy(
    &mut self,
    service: ServiceKey,
    factory: Option<LazyFactory>,
  ) -> Result<(), Error> {
    self.primary.register_lazy(service, factory)
  }

  /// Builds the primary registrar and pairs the result with the secondary
  /// provider. A failed build leaves the queued registrations intact.
  pub fn build(&mut self) -> Result<TieredResolver, Error> {
    let secondary = self.secondary.clone().ok_or(Error::ResolverNotReady)?;
    Ok(TieredResolver::new(Box::new(self.primary.build()), secondary))
  }
}

impl Default for TieredRegistrar {
  fn default() -> Self {
    Self::deferred()
  }
}

/// A resolver that asks an owned primary first and falls back to an
/// externally-owned provider.
pub struct TieredResolver {
  primary: Box<dyn ServiceResolver>,
  secondary: Arc<dyn ServiceProvider>,
}

impl TieredResolver {
  /// Composes any resolver with a secondary provider.
  pub fn new(primary: Box<dyn ServiceResolver>, secondary: Arc<dyn ServiceProvider>) -> Self {
    Self { primary, secondary }
  }
}

impl ServiceResolver for TieredResolver {
  fn resolve_key(&self, key: Option<ServiceKey>) -> Result<Option<ServiceInstance>, Error> {
    if let Some(instance) = self.primary.resolve_key(key)? {
      return Ok(Some(instance));
    }
    Ok(key.and_then(|key| self.secondary.get_service(key)))
  }

  fn resolve_key_all(&self, key: Option<ServiceKey>) -> Result<Vec<ServiceInstance>, Error> {
    let found = self.primary.resolve_key_all(key)?;
    if !found.is_empty() {
      return Ok(found);
    }

    // With nothing in the primary, the secondary can still contribute its
    // single instance for the key.
    Ok(
      key
        .and_then(|key| self.secondary.get_service(key))
        .into_iter()
        .collect(),
    )
  }
}
