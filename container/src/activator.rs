//! Activation strategies: how one registered service produces an object.

use crate::blueprint::{ArgSlot, Args, Blueprint, Constructor, Param, ParamKind};
use crate::core::{ServiceInstance, ServiceKey};
use crate::error::Error;
use crate::resolver::{Resolver, ServiceResolver};

use once_cell::sync::OnceCell;
use std::sync::Arc;

type ErasedProduce = Arc<dyn Fn(&mut Args) -> Result<ServiceInstance, Error> + Send + Sync>;

/// The selected constructor of a blueprint, erased to the instance level.
///
/// Parameter resolution happens here: each declared parameter is resolved
/// through the activating resolver, so a factory's dependencies follow the
/// same lookup rules (and fallbacks) as a direct resolution would.
pub(crate) struct FactoryCore {
  implementation: ServiceKey,
  params: Arc<[Param]>,
  produce: ErasedProduce,
}

impl FactoryCore {
  fn activate(&self, cx: &Resolver) -> Result<ServiceInstance, Error> {
    let mut slots = Vec::with_capacity(self.params.len());
    for param in self.params.iter() {
      match param.kind {
        ParamKind::Context => slots.push(ArgSlot::Context(cx.clone())),
        ParamKind::Service { key, optional } => match cx.resolve_key(Some(key))? {
          Some(instance) => slots.push(ArgSlot::Present(instance)),
          None if optional => slots.push(ArgSlot::Absent(key)),
          None => {
            return Err(Error::MissingDependency {
              dependency: key.label(),
              requested_by: Some(self.implementation.label()),
            });
          }
        },
      }
    }
    let mut args = Args::new(slots, self.implementation.label());
    let instance = (self.produce)(&mut args)?;
    // A successful construction must have consumed every declared slot;
    // leftovers mean the parameter list and the closure disagree.
    args.finish();
    Ok(instance)
  }

  fn share(&self) -> Self {
    Self {
      implementation: self.implementation,
      params: Arc::clone(&self.params),
      produce: Arc::clone(&self.produce),
    }
  }
}

/// A strategy for producing one service instance.
///
/// Three strategies exist, mirroring the three ways services come to be:
/// a pre-built instance, a factory selected from a [`Blueprint`], and a
/// caching wrapper that turns any activator into an at-most-once singleton.
pub struct Activator {
  kind: ActivatorKind,
}

enum ActivatorKind {
  /// Serves the same wrapped object on every activation.
  Instance(ServiceInstance),
  /// Runs the selected constructor, resolving each declared parameter.
  Factory(FactoryCore),
  /// Activates the inner activator at most once and remembers the result.
  Cached {
    inner: Box<Activator>,
    cell: OnceCell<ServiceInstance>,
  },
}

impl Activator {
  /// An activator serving a pre-built object.
  pub fn instance(instance: ServiceInstance) -> Self {
    Self {
      kind: ActivatorKind::Instance(instance),
    }
  }

  /// An activator constructing objects from `blueprint`.
  ///
  /// The constructor with the most parameters is selected here, once, with
  /// ties going to the first declared. A blueprint with no constructors
  /// fails with [`Error::NoConstructor`].
  pub fn factory<S>(blueprint: Blueprint<S>) -> Result<Self, Error>
  where
    S: ?Sized + Send + Sync + 'static,
  {
    let implementation = blueprint.implementation;

    let mut selected: Option<Constructor<S>> = None;
    for candidate in blueprint.constructors {
      let greedier = selected
        .as_ref()
        .map_or(true, |current| candidate.params.len() > current.params.len());
      if greedier {
        selected = Some(candidate);
      }
    }
    let constructor = selected.ok_or(Error::NoConstructor {
      implementation: implementation.label(),
    })?;

    let produce = constructor.produce;
    Ok(Self {
      kind: ActivatorKind::Factory(FactoryCore {
        implementation,
        params: constructor.params.into(),
        produce: Arc::new(move |args: &mut Args| produce(args).map(ServiceInstance::new)),
      }),
    })
  }

  /// Wraps `inner` so it runs at most once; later activations return the
  /// remembered instance. Failed activations are not remembered.
  pub fn cached(inner: Activator) -> Self {
    Self {
      kind: ActivatorKind::Cached {
        inner: Box::new(inner),
        cell: OnceCell::new(),
      },
    }
  }

  pub(crate) fn activate(&self, cx: &Resolver) -> Result<ServiceInstance, Error> {
    match &self.kind {
      ActivatorKind::Instance(instance) => Ok(instance.clone()),
      ActivatorKind::Factory(core) => core.activate(cx),
      ActivatorKind::Cached { inner, cell } => {
        cell.get_or_try_init(|| inner.activate(cx)).cloned()
      }
    }
  }

  /// A structurally identical activator with independent cached state.
  ///
  /// Instance copies share the wrapped object and factory copies share the
  /// stateless constructor; a cached copy starts out empty rather than
  /// inheriting the original's memoized instance.
  pub fn create_copy(&self) -> Self {
    match &self.kind {
      ActivatorKind::Instance(instance) => Self {
        kind: ActivatorKind::Instance(instance.clone()),
      },
      ActivatorKind::Factory(core) => Self {
        kind: ActivatorKind::Factory(core.share()),
      },
      ActivatorKind::Cached { inner, .. } => Self {
        kind: ActivatorKind::Cached {
          inner: Box::new(inner.create_copy()),
          cell: OnceCell::new(),
        },
      },
    }
  }
}
