//! The keyed registry: activators bound under one or more lookup keys.

use crate::activator::Activator;
use crate::core::{ServiceInstance, ServiceKey};
use crate::error::Error;
use crate::resolver::Resolver;

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A binding of one activator to one or more lookup keys.
pub struct Registration {
  implementation: ServiceKey,
  activator: Activator,
  keys: Vec<ServiceKey>,
}

impl Registration {
  /// Creates a registration reachable under `keys`.
  ///
  /// An empty `keys` iterator defaults to the implementation key itself, so
  /// every registration is reachable under at least one key.
  pub fn new(
    implementation: ServiceKey,
    activator: Activator,
    keys: impl IntoIterator<Item = ServiceKey>,
  ) -> Self {
    let mut keys: Vec<ServiceKey> = keys.into_iter().collect();
    if keys.is_empty() {
      keys.push(implementation);
    }
    Self {
      implementation,
      activator,
      keys,
    }
  }

  /// The key of the implementation this registration builds.
  pub fn implementation(&self) -> ServiceKey {
    self.implementation
  }

  /// The keys this registration is reachable under.
  pub fn keys(&self) -> &[ServiceKey] {
    &self.keys
  }

  pub(crate) fn activate(&self, cx: &Resolver) -> Result<ServiceInstance, Error> {
    self.activator.activate(cx)
  }

  /// A structurally identical registration whose activator has independent
  /// cached state. See [`Activator::create_copy`].
  pub fn create_copy(&self) -> Self {
    Self {
      implementation: self.implementation,
      activator: self.activator.create_copy(),
      keys: self.keys.clone(),
    }
  }
}

/// The mapping from lookup key to the registrations bound under it.
///
/// Insertion order within a key is preserved and is semantically
/// meaningful: single-value resolution serves the last registration,
/// collection resolution serves all of them in order. Membership is pointer
/// identity, so registering the same `Arc` under a key twice is a no-op for
/// that key while a distinct registration with equal contents is kept
/// alongside the first.
pub struct Registry {
  entries: DashMap<ServiceKey, Vec<Arc<Registration>>>,
  disposed: AtomicBool,
}

impl Registry {
  pub fn new() -> Self {
    Self {
      entries: DashMap::new(),
      disposed: AtomicBool::new(false),
    }
  }

  /// Inserts `registration` under every one of its keys.
  pub fn register(&self, registration: Arc<Registration>) {
    debug_assert!(!self.is_disposed(), "register on a disposed registry");

    let mut seen: Vec<ServiceKey> = Vec::with_capacity(registration.keys().len());
    for &key in registration.keys() {
      if seen.contains(&key) {
        continue;
      }
      seen.push(key);

      let mut entry = self.entries.entry(key).or_default();
      if !entry.iter().any(|existing| Arc::ptr_eq(existing, &registration)) {
        entry.push(Arc::clone(&registration));
      }
    }
  }

  /// All registrations bound under `key`, in insertion order. Unknown keys
  /// yield an empty vector, never an error.
  ///
  /// The entries are cloned out so no map guard is held while activators
  /// run; activation of one key is free to resolve others.
  pub fn lookup(&self, key: ServiceKey) -> Vec<Arc<Registration>> {
    debug_assert!(!self.is_disposed(), "lookup on a disposed registry");

    self
      .entries
      .get(&key)
      .map(|entry| entry.value().clone())
      .unwrap_or_default()
  }

  /// A new registry containing an independent copy of every distinct
  /// registration.
  ///
  /// A registration reachable under several keys is copied exactly once
  /// and stays shared under those keys in the copy; per-key order is
  /// preserved. Copying and the original's caches are independent in both
  /// directions.
  pub fn create_copy(&self) -> Registry {
    let copy = Registry::new();
    let mut copies: HashMap<usize, Arc<Registration>> = HashMap::new();

    for entry in self.entries.iter() {
      let copied: Vec<Arc<Registration>> = entry
        .value()
        .iter()
        .map(|registration| {
          let identity = Arc::as_ptr(registration) as usize;
          Arc::clone(
            copies
              .entry(identity)
              .or_insert_with(|| Arc::new(registration.create_copy())),
          )
        })
        .collect();
      copy.entries.insert(*entry.key(), copied);
    }
    copy
  }

  /// Clears every entry. Querying or mutating a disposed registry is a
  /// precondition violation and trips a debug assertion rather than being
  /// given a defined meaning.
  pub fn dispose(&self) {
    self.entries.clear();
    self.disposed.store(true, Ordering::Release);
  }

  fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire)
  }
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}
