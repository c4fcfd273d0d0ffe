//! Constructor blueprints: declared, typed descriptions of how an
//! implementation is built.
//!
//! A [`Blueprint`] pairs an implementation type with one or more
//! [`Constructor`]s. Each constructor lists its parameters in order and
//! supplies a produce closure that consumes the resolved values through
//! [`Args`]. When the blueprint is registered the constructor with the most
//! parameters is selected once, up front; every activation then resolves the
//! declared parameters and hands them to the closure.

use crate::core::{ServiceInstance, ServiceKey};
use crate::error::Error;
use crate::resolver::Resolver;

use std::sync::Arc;

/// One declared constructor parameter.
pub struct Param {
  pub(crate) kind: ParamKind,
}

#[derive(Clone, Copy)]
pub(crate) enum ParamKind {
  Service { key: ServiceKey, optional: bool },
  Context,
}

impl Param {
  /// A dependency that must resolve. Activation fails with
  /// [`Error::MissingDependency`] when it cannot.
  pub fn required<T: ?Sized + 'static>() -> Self {
    Self {
      kind: ParamKind::Service {
        key: ServiceKey::of::<T>(),
        optional: false,
      },
    }
  }

  /// A dependency that may be absent. The produce closure receives an empty
  /// slot instead of an error.
  pub fn optional<T: ?Sized + 'static>() -> Self {
    Self {
      kind: ParamKind::Service {
        key: ServiceKey::of::<T>(),
        optional: true,
      },
    }
  }

  /// The resolver itself. The produce closure receives a handle to the
  /// resolver running the activation, letting a component query the
  /// container it was built by.
  pub fn context() -> Self {
    Self {
      kind: ParamKind::Context,
    }
  }
}

pub(crate) enum ArgSlot {
  Present(ServiceInstance),
  Absent(ServiceKey),
  Context(Resolver),
}

/// The resolved parameter slots handed to a produce closure, consumed in
/// declaration order.
///
/// `Args` panics on wiring mistakes the parameter declarations already rule
/// out: consuming more slots than were declared, consuming a slot with the
/// wrong accessor, or constructing successfully while declared slots are
/// still left over. Those are blueprint bugs, not runtime conditions, and
/// hiding them behind an error would only move the failure further from its
/// cause.
pub struct Args {
  slots: std::vec::IntoIter<ArgSlot>,
  implementation: &'static str,
}

impl Args {
  pub(crate) fn new(slots: Vec<ArgSlot>, implementation: &'static str) -> Self {
    Self {
      slots: slots.into_iter(),
      implementation,
    }
  }

  fn next_slot(&mut self) -> ArgSlot {
    match self.slots.next() {
      Some(slot) => slot,
      None => panic!(
        "constructor for '{}' consumed more arguments than it declared",
        self.implementation
      ),
    }
  }

  /// Consumes the next slot as a required dependency.
  pub fn take<T>(&mut self) -> Result<Arc<T>, Error>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    match self.next_slot() {
      ArgSlot::Present(instance) => instance.downcast::<T>().ok_or(Error::TypeMismatch {
        requested: std::any::type_name::<T>(),
      }),
      ArgSlot::Absent(key) => Err(Error::MissingDependency {
        dependency: key.label(),
        requested_by: Some(self.implementation),
      }),
      ArgSlot::Context(_) => panic!(
        "constructor for '{}' consumed a context parameter as a service",
        self.implementation
      ),
    }
  }

  /// Consumes the next slot as an optional dependency.
  pub fn take_optional<T>(&mut self) -> Result<Option<Arc<T>>, Error>
  where
    T: ?Sized + Send + Sync + 'static,
  {
    match self.next_slot() {
      ArgSlot::Present(instance) => instance
        .downcast::<T>()
        .map(Some)
        .ok_or(Error::TypeMismatch {
          requested: std::any::type_name::<T>(),
        }),
      ArgSlot::Absent(_) => Ok(None),
      ArgSlot::Context(_) => panic!(
        "constructor for '{}' consumed a context parameter as a service",
        self.implementation
      ),
    }
  }

  /// Consumes the next slot as the resolver context.
  pub fn take_resolver(&mut self) -> Resolver {
    match self.next_slot() {
      ArgSlot::Context(resolver) => resolver,
      _ => panic!(
        "constructor for '{}' consumed a service parameter as the context",
        self.implementation
      ),
    }
  }

  /// Panics when declared slots were left unconsumed. Called after a
  /// successful construction, so error returns from the closure are free to
  /// bail out early.
  pub(crate) fn finish(&self) {
    let leftover = self.slots.len();
    if leftover > 0 {
      panic!(
        "constructor for '{}' declared {} argument(s) it never consumed",
        self.implementation, leftover
      );
    }
  }
}

type Produce<S> = Box<dyn Fn(&mut Args) -> Result<Arc<S>, Error> + Send + Sync>;

/// One way to construct an implementation served as `Arc<S>`.
pub struct Constructor<S: ?Sized> {
  pub(crate) params: Vec<Param>,
  pub(crate) produce: Produce<S>,
}

impl<S: ?Sized> Constructor<S> {
  /// Declares a constructor from its parameters, in order, and the closure
  /// that builds the value out of them.
  pub fn new<F>(params: impl IntoIterator<Item = Param>, produce: F) -> Self
  where
    F: Fn(&mut Args) -> Result<Arc<S>, Error> + Send + Sync + 'static,
  {
    Self {
      params: params.into_iter().collect(),
      produce: Box::new(produce),
    }
  }

  /// A parameterless constructor.
  pub fn from_fn<F>(produce: F) -> Self
  where
    F: Fn() -> Arc<S> + Send + Sync + 'static,
  {
    Self {
      params: Vec::new(),
      produce: Box::new(move |_| Ok(produce())),
    }
  }
}

/// Describes one implementation and the constructors that can build it.
///
/// `S` is the type the service is served as, which for trait-keyed services
/// is the trait object; the implementation named by [`Blueprint::of`] is
/// what the produce closures actually instantiate.
///
/// ```
/// use std::sync::Arc;
/// use strata::{Blueprint, Constructor};
///
/// trait Greeter: Send + Sync {}
///
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {}
///
/// let blueprint: Blueprint<dyn Greeter> = Blueprint::of::<EnglishGreeter>()
///   .constructor(Constructor::<dyn Greeter>::from_fn(|| Arc::new(EnglishGreeter)));
/// # let _ = blueprint;
/// ```
pub struct Blueprint<S: ?Sized> {
  pub(crate) implementation: ServiceKey,
  pub(crate) constructors: Vec<Constructor<S>>,
}

impl<S: ?Sized> Blueprint<S> {
  /// Starts a blueprint for implementation `I`.
  pub fn of<I: ?Sized + 'static>() -> Self {
    Self {
      implementation: ServiceKey::of::<I>(),
      constructors: Vec::new(),
    }
  }

  /// Adds a constructor. The one with the most parameters wins when the
  /// blueprint is registered; ties go to the first added.
  pub fn constructor(mut self, constructor: Constructor<S>) -> Self {
    self.constructors.push(constructor);
    self
  }

  /// The key identifying the implementation this blueprint builds.
  pub fn implementation(&self) -> ServiceKey {
    self.implementation
  }
}
