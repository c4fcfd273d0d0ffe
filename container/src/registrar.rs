//! The write-only accumulation surface: deferred registration, one build.

use crate::activator::Activator;
use crate::blueprint::Blueprint;
use crate::core::{ServiceInstance, ServiceKey, ServiceProvider};
use crate::error::Error;
use crate::registry::{Registration, Registry};
use crate::resolver::Resolver;

use std::sync::Arc;

/// A deferred factory accepted by [`Registrar::register_lazy`], invoked at
/// build time.
pub type LazyFactory = Box<dyn FnOnce() -> ServiceInstance + Send>;

type QueuedAction = Box<dyn FnOnce(&Registry) + Send>;

/// Accumulates registration intents and builds an immutable [`Resolver`].
///
/// Nothing is materialized while registering. [`build`](Registrar::build)
/// drains the queue into a fresh registry in enqueue order, which is what
/// makes last-registered-wins deterministic. Accumulation and build both
/// take `&mut self`, so the write phase cannot overlap the read phase by
/// construction.
///
/// ```
/// use std::sync::Arc;
/// use strata::{Registrar, ResolverExt};
///
/// struct Config {
///   retries: usize,
/// }
///
/// let mut registrar = Registrar::new();
/// registrar.bind_instance(Arc::new(Config { retries: 3 }));
///
/// let resolver = registrar.build();
/// let config = resolver.resolve::<Config>().unwrap().unwrap();
/// assert_eq!(config.retries, 3);
/// ```
#[derive(Default)]
pub struct Registrar {
  queue: Vec<QueuedAction>,
  fallback: Option<Arc<dyn ServiceProvider>>,
}

impl Registrar {
  pub fn new() -> Self {
    Self::default()
  }

  /// A registrar whose built resolvers fall back to `provider` when
  /// single-value resolution finds no registration.
  pub fn with_provider(provider: Arc<dyn ServiceProvider>) -> Self {
    Self {
      queue: Vec::new(),
      fallback: Some(provider),
    }
  }

  /// Sets (or replaces) the fallback provider for subsequently built
  /// resolvers.
  pub fn set_provider(&mut self, provider: Arc<dyn ServiceProvider>) {
    self.fallback = Some(provider);
  }

  /// Queues the blueprint's implementation under the service key `S`.
  ///
  /// The blueprint is validated here: one with no constructors fails
  /// immediately with [`Error::NoConstructor`] instead of at first
  /// resolution. Each resolution runs the selected constructor anew; wrap
  /// your own [`Activator::cached`] via [`register`](Registrar::register)
  /// when a blueprint-built service should be a singleton.
  pub fn bind<S>(&mut self, blueprint: Blueprint<S>) -> Result<(), Error>
  where
    S: ?Sized + Send + Sync + 'static,
  {
    let service = ServiceKey::of::<S>();
    let implementation = blueprint.implementation();
    let activator = Activator::factory(blueprint)?;
    let registration = Arc::new(Registration::new(implementation, activator, [service]));
    self.queue.push(Box::new(move |registry| registry.register(registration)));
    Ok(())
  }

  /// Queues a pre-built object under the service key `T`. The object itself
  /// is the singleton: every resolution serves the same handle.
  pub fn bind_instance<T>(&mut self, instance: Arc<T>)
  where
    T: ?Sized + Send + Sync + 'static,
  {
    let service = ServiceKey::of::<T>();
    let activator = Activator::cached(Activator::instance(ServiceInstance::new(instance)));
    let registration = Arc::new(Registration::new(service, activator, []));
    self.queue.push(Box::new(move |registry| registry.register(registration)));
  }

  /// Queues a factory under the service key `T`.
  ///
  /// The factory runs once, at build time rather than at first resolution,
  /// and the produced object is served like a bound instance from then on.
  pub fn bind_lazy<T, F>(&mut self, factory: F)
  where
    T: ?Sized + Send + Sync + 'static,
    F: FnOnce() -> Arc<T> + Send + 'static,
  {
    let service = ServiceKey::of::<T>();
    self.queue.push(Box::new(move |registry| {
      let activator = Activator::cached(Activator::instance(ServiceInstance::new(factory())));
      registry.register(Arc::new(Registration::new(service, activator, [])));
    }));
  }

  /// Queues a pre-assembled registration as-is. This is the erased surface
  /// for callers that build registrations, and their key sets, themselves.
  pub fn register(&mut self, registration: Registration) {
    let registration = Arc::new(registration);
    self.queue.push(Box::new(move |registry| registry.register(registration)));
  }

  /// The erased form of [`bind_lazy`](Registrar::bind_lazy). Submitting no
  /// factory fails immediately with [`Error::MissingFactory`].
  pub fn register_lazy(
    &mut self,
    service: ServiceKey,
    factory: Option<LazyFactory>,
  ) -> Result<(), Error> {
    let factory = factory.ok_or(Error::MissingFactory)?;
    self.queue.push(Box::new(move |registry| {
      let activator = Activator::cached(Activator::instance(factory()));
      registry.register(Arc::new(Registration::new(service, activator, [])));
    }));
    Ok(())
  }

  /// Drains every queued registration, in enqueue order, into a fresh
  /// registry and returns a resolver over it.
  ///
  /// The registrar is an empty session afterwards: building again without
  /// further registrations yields a resolver that knows nothing.
  pub fn build(&mut self) -> Resolver {
    #[cfg(feature = "tracing")]
    tracing::debug!(queued = self.queue.len(), "building resolver");

    let registry = Registry::new();
    for action in self.queue.drain(..) {
      action(&registry);
    }
    Resolver::new(registry, self.fallback.clone())
  }
}
