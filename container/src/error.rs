//! Errors reported by registration and resolution.

use std::fmt;

/// Errors that can occur while registering services or resolving them.
///
/// All of these are deterministic, local failures. They propagate to the
/// immediate caller; nothing in the crate retries, logs-and-swallows, or
/// falls back to a partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// A blueprint declared no constructor, so there is no way to ever build
  /// its implementation. Raised when the blueprint is registered, not at
  /// first use.
  NoConstructor {
    /// Label of the implementation type that has no constructor.
    implementation: &'static str,
  },
  /// A required constructor parameter could not be resolved: the dependency
  /// has no registration and no fallback provider supplied it.
  MissingDependency {
    /// Label of the dependency type that could not be resolved.
    dependency: &'static str,
    /// Label of the implementation whose constructor needed it, when known.
    requested_by: Option<&'static str>,
  },
  /// A lazy registration was submitted without a factory.
  MissingFactory,
  /// A deferred tiered registrar was built before its external provider was
  /// attached. This is a startup-ordering mistake in the host.
  ResolverNotReady,
  /// Constructor resolution looped back onto a key that is already being
  /// resolved on this thread.
  DependencyCycle {
    /// Type labels along the cycle, first visit through revisit, so the
    /// first and last entries name the same type.
    chain: Vec<&'static str>,
  },
  /// A registration exists under the requested key, but the instance it
  /// produced is not of the requested type.
  TypeMismatch {
    /// Label of the type the caller asked for.
    requested: &'static str,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::NoConstructor { implementation } => {
        write!(f, "no constructor declared for '{implementation}'")
      }
      Error::MissingDependency {
        dependency,
        requested_by: Some(implementation),
      } => {
        write!(
          f,
          "could not resolve '{dependency}' required by '{implementation}'"
        )
      }
      Error::MissingDependency {
        dependency,
        requested_by: None,
      } => {
        write!(f, "could not resolve '{dependency}'")
      }
      Error::MissingFactory => {
        write!(f, "a lazy registration requires a factory")
      }
      Error::ResolverNotReady => {
        write!(
          f,
          "a provider must be attached before the tiered resolver can be built"
        )
      }
      Error::DependencyCycle { chain } => {
        write!(f, "dependency cycle detected: {}", chain.join(" -> "))
      }
      Error::TypeMismatch { requested } => {
        write!(
          f,
          "the registered instance is not of the requested type '{requested}'"
        )
      }
    }
  }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_spells_out_the_cycle() {
    let error = Error::DependencyCycle {
      chain: vec!["A", "B", "A"],
    };
    assert_eq!(error.to_string(), "dependency cycle detected: A -> B -> A");
  }

  #[test]
  fn display_names_the_requesting_implementation_when_known() {
    let anonymous = Error::MissingDependency {
      dependency: "Db",
      requested_by: None,
    };
    let attributed = Error::MissingDependency {
      dependency: "Db",
      requested_by: Some("Repo"),
    };

    assert_eq!(anonymous.to_string(), "could not resolve 'Db'");
    assert_eq!(
      attributed.to_string(),
      "could not resolve 'Db' required by 'Repo'"
    );
  }
}
