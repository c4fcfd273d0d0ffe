//! A small, embeddable dependency-resolution container with two-tier
//! composition.
//!
//! The crate separates the write phase from the read phase. A [`Registrar`]
//! accumulates registration intents without materializing anything;
//! [`Registrar::build`] drains them, in order, into an immutable
//! [`Resolver`] that serves lookups from then on. Services are identified
//! by [`ServiceKey`] (type identity, so trait objects are first-class) and
//! travel as cheaply cloneable [`ServiceInstance`] handles.
//!
//! Constructed services are described by [`Blueprint`]s: each declares one
//! or more typed [`Constructor`]s, the greediest of which is selected at
//! registration time. Parameters are resolved through the same container,
//! recursively, with required, optional, and context (the resolver itself)
//! flavors. Pre-built and build-time-lazy objects are registered directly
//! and served as singletons.
//!
//! For embedding inside a larger application, [`TieredRegistrar`] layers
//! the container in front of an externally-owned [`ServiceProvider`]: the
//! owned tier is consulted first and the provider answers whatever the
//! owned tier does not know, without ever being mutated.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use strata::{Blueprint, Constructor, Param, Registrar, ResolverExt};
//!
//! trait Writer: Send + Sync {
//!   fn write(&self, line: &str) -> String;
//! }
//!
//! struct PlainWriter;
//!
//! impl Writer for PlainWriter {
//!   fn write(&self, line: &str) -> String {
//!     line.to_string()
//!   }
//! }
//!
//! struct Greeter {
//!   writer: Arc<dyn Writer>,
//! }
//!
//! let mut registrar = Registrar::new();
//! registrar.bind::<dyn Writer>(
//!   Blueprint::of::<PlainWriter>().constructor(Constructor::<dyn Writer>::from_fn(|| Arc::new(PlainWriter))),
//! )?;
//! registrar.bind::<Greeter>(Blueprint::of::<Greeter>().constructor(Constructor::new(
//!   [Param::required::<dyn Writer>()],
//!   |args| {
//!     Ok(Arc::new(Greeter {
//!       writer: args.take()?,
//!     }))
//!   },
//! )))?;
//!
//! let resolver = registrar.build();
//! let greeter = resolver.resolve::<Greeter>()?.unwrap();
//! assert_eq!(greeter.writer.write("hello"), "hello");
//! # Ok::<(), strata::Error>(())
//! ```

mod activator;
mod blueprint;
mod core;
mod error;
mod registrar;
mod registry;
mod resolver;
mod tiered;

pub use self::core::{ServiceInstance, ServiceKey, ServiceProvider};
pub use activator::Activator;
pub use blueprint::{Args, Blueprint, Constructor, Param};
pub use error::Error;
pub use registrar::{LazyFactory, Registrar};
pub use registry::{Registration, Registry};
pub use resolver::{Resolver, ResolverExt, ServiceResolver};
pub use tiered::{TieredRegistrar, TieredResolver};
