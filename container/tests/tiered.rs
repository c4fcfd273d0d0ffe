use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata::{
  Blueprint, Constructor, Error, ResolverExt, ServiceInstance, ServiceKey, ServiceProvider,
  TieredRegistrar,
};

// --- Test Fixtures ---

trait Clock: Send + Sync {
  fn now(&self) -> &'static str;
}

struct HostClock;

impl Clock for HostClock {
  fn now(&self) -> &'static str {
    "host"
  }
}

struct LocalClock;

impl Clock for LocalClock {
  fn now(&self) -> &'static str {
    "local"
  }
}

struct HostOnly(&'static str);

struct Unregistered;

/// A provider over a fixed set of services that counts how often it is
/// consulted, so tests can prove the primary tier shielded it.
struct StubProvider {
  clock: Option<Arc<dyn Clock>>,
  host_only: Option<Arc<HostOnly>>,
  queries: AtomicUsize,
}

impl StubProvider {
  fn new(clock: Option<Arc<dyn Clock>>, host_only: Option<Arc<HostOnly>>) -> Arc<Self> {
    Arc::new(Self {
      clock,
      host_only,
      queries: AtomicUsize::new(0),
    })
  }

  fn queries(&self) -> usize {
    self.queries.load(Ordering::SeqCst)
  }
}

impl ServiceProvider for StubProvider {
  fn get_service(&self, key: ServiceKey) -> Option<ServiceInstance> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    if key == ServiceKey::of::<dyn Clock>() {
      return self.clock.clone().map(ServiceInstance::new);
    }
    if key == ServiceKey::of::<HostOnly>() {
      return self.host_only.clone().map(ServiceInstance::new);
    }
    None
  }
}

// --- Tests ---

#[test]
fn the_secondary_answers_what_the_primary_does_not_know() {
  // Arrange
  let provider = StubProvider::new(None, Some(Arc::new(HostOnly("from host"))));
  let mut registrar = TieredRegistrar::from_provider(provider.clone());

  // Act
  let resolver = registrar.build().unwrap();
  let service = resolver.resolve::<HostOnly>().unwrap().unwrap();

  // Assert
  assert_eq!(service.0, "from host");
}

#[test]
fn the_primary_wins_when_both_tiers_know_the_key() {
  // Arrange
  let provider = StubProvider::new(Some(Arc::new(HostClock)), None);
  let mut registrar = TieredRegistrar::from_provider(provider.clone());
  registrar.bind_instance::<dyn Clock>(Arc::new(LocalClock));

  // Act
  let resolver = registrar.build().unwrap();
  let clock = resolver.resolve::<dyn Clock>().unwrap().unwrap();

  // Assert: the owned tier shadowed the host's clock, and the provider was
  // never even asked.
  assert_eq!(clock.now(), "local");
  assert_eq!(provider.queries(), 0);
}

#[test]
fn a_miss_in_both_tiers_is_absence_not_an_error() {
  // Arrange
  let provider = StubProvider::new(None, None);
  let mut registrar = TieredRegistrar::from_provider(provider.clone());

  // Act
  let resolver = registrar.build().unwrap();

  // Assert: the provider had nothing, which is fine. It is consulted twice
  // on a full miss, once as the primary's own fallback and once as the
  // tiered secondary.
  assert!(resolver.resolve::<Unregistered>().unwrap().is_none());
  assert_eq!(provider.queries(), 2);
}

#[test]
fn an_absent_key_never_touches_the_secondary() {
  // Arrange
  let provider = StubProvider::new(Some(Arc::new(HostClock)), None);
  let mut registrar = TieredRegistrar::from_provider(provider.clone());
  let resolver = registrar.build().unwrap();

  // Act
  use strata::ServiceResolver;
  let single = resolver.resolve_key(None).unwrap();
  let all = resolver.resolve_key_all(None).unwrap();

  // Assert
  assert!(single.is_none());
  assert!(all.is_empty());
  assert_eq!(provider.queries(), 0);
}

#[test]
fn collection_resolution_prefers_the_primary_and_falls_back_whole() {
  // Arrange: the provider knows a clock; the primary has two of its own.
  let provider = StubProvider::new(Some(Arc::new(HostClock)), None);
  let mut registrar = TieredRegistrar::from_provider(provider.clone());
  registrar
    .bind::<dyn Clock>(
      Blueprint::of::<LocalClock>().constructor(Constructor::<dyn Clock>::from_fn(|| Arc::new(LocalClock))),
    )
    .unwrap();
  registrar
    .bind::<dyn Clock>(
      Blueprint::of::<LocalClock>().constructor(Constructor::<dyn Clock>::from_fn(|| Arc::new(LocalClock))),
    )
    .unwrap();
  let resolver = registrar.build().unwrap();

  // Act
  let clocks = resolver.resolve_all::<dyn Clock>().unwrap();
  let strays = resolver.resolve_all::<HostOnly>().unwrap();

  // Assert: the primary's collection is served untouched by the provider;
  // a key only the provider knows surfaces as a one-element collection.
  assert_eq!(clocks.len(), 2);
  assert!(strays.is_empty());

  let with_host = StubProvider::new(None, Some(Arc::new(HostOnly("alone"))));
  let mut registrar = TieredRegistrar::from_provider(with_host);
  let resolver = registrar.build().unwrap();
  let from_host = resolver.resolve_all::<HostOnly>().unwrap();
  assert_eq!(from_host.len(), 1);
  assert_eq!(from_host[0].0, "alone");
}

#[test]
fn building_before_attaching_a_provider_is_rejected() {
  // Arrange
  let mut registrar = TieredRegistrar::deferred();
  registrar.bind_instance(Arc::new(HostOnly("queued")));

  // Act
  let premature = registrar.build();

  // Assert: the failure does not lose the queued registrations.
  assert!(matches!(premature, Err(Error::ResolverNotReady)));

  registrar.attach_provider(StubProvider::new(None, None));
  let resolver = registrar.build().unwrap();
  assert_eq!(resolver.resolve::<HostOnly>().unwrap().unwrap().0, "queued");
}

#[test]
fn an_attached_provider_also_serves_constructor_dependencies() {
  // Arrange: the dependency lives only in the host; the service that needs
  // it is registered in the owned tier.
  struct Scheduler {
    clock: Arc<dyn Clock>,
  }

  let provider = StubProvider::new(Some(Arc::new(HostClock)), None);
  let mut registrar = TieredRegistrar::deferred();
  registrar
    .bind::<Scheduler>(
      Blueprint::of::<Scheduler>().constructor(Constructor::new(
        [strata::Param::required::<dyn Clock>()],
        |args| {
          Ok(Arc::new(Scheduler {
            clock: args.take()?,
          }))
        },
      )),
    )
    .unwrap();
  registrar.attach_provider(provider);

  // Act
  let resolver = registrar.build().unwrap();
  let scheduler = resolver.resolve::<Scheduler>().unwrap().unwrap();

  // Assert
  assert_eq!(scheduler.clock.now(), "host");
}

#[test]
fn registration_never_writes_through_to_the_secondary() {
  // Arrange
  let provider = StubProvider::new(None, None);
  let mut registrar = TieredRegistrar::from_provider(provider.clone());

  // Act: a full registration session against the tiered surface.
  registrar.bind_instance::<dyn Clock>(Arc::new(LocalClock));
  registrar.bind_lazy(|| Arc::new(HostOnly("lazy")));
  registrar
    .register_lazy(
      ServiceKey::of::<String>(),
      Some(Box::new(|| ServiceInstance::new(Arc::new(String::from("s"))))),
    )
    .unwrap();
  let resolver = registrar.build().unwrap();

  // Assert: everything resolves from the owned tier; the provider saw no
  // mutation and no queries.
  assert!(resolver.resolve::<dyn Clock>().unwrap().is_some());
  assert!(resolver.resolve::<HostOnly>().unwrap().is_some());
  assert!(resolver.resolve::<String>().unwrap().is_some());
  assert_eq!(provider.queries(), 0);
}

#[test]
fn end_to_end_command_wiring_scenario() {
  // The shape a command host uses: a logger bound as a single service, two
  // handlers bound under one trait, the host's own services behind it all.
  trait Logger: Send + Sync {
    fn name(&self) -> &'static str;
  }
  trait Handler: Send + Sync {
    fn id(&self) -> &'static str;
  }

  struct ConsoleLogger;
  impl Logger for ConsoleLogger {
    fn name(&self) -> &'static str {
      "console"
    }
  }

  struct HandlerA;
  impl Handler for HandlerA {
    fn id(&self) -> &'static str {
      "a"
    }
  }
  struct HandlerB;
  impl Handler for HandlerB {
    fn id(&self) -> &'static str {
      "b"
    }
  }

  // Arrange
  let provider = StubProvider::new(None, None);
  let mut registrar = TieredRegistrar::from_provider(provider);
  registrar.bind_instance::<dyn Logger>(Arc::new(ConsoleLogger));
  registrar
    .bind::<dyn Handler>(
      Blueprint::of::<HandlerA>().constructor(Constructor::<dyn Handler>::from_fn(|| Arc::new(HandlerA))),
    )
    .unwrap();
  registrar
    .bind::<dyn Handler>(
      Blueprint::of::<HandlerB>().constructor(Constructor::<dyn Handler>::from_fn(|| Arc::new(HandlerB))),
    )
    .unwrap();

  // Act
  let resolver = registrar.build().unwrap();

  // Assert
  assert_eq!(
    resolver.resolve::<dyn Logger>().unwrap().unwrap().name(),
    "console"
  );
  let all: Vec<_> = resolver
    .resolve_all::<dyn Handler>()
    .unwrap()
    .iter()
    .map(|handler| handler.id())
    .collect();
  assert_eq!(all, vec!["a", "b"]);
  assert_eq!(
    resolver.resolve::<dyn Handler>().unwrap().unwrap().id(),
    "b"
  );
}
