use std::sync::Arc;

use strata::{Blueprint, Constructor, Registrar, ResolverExt};

// A pipeline stage. Several implementations are registered under the same
// trait, and the consumer asks for all of them at once.
trait Stage: Send + Sync {
  fn apply(&self, input: String) -> String;
}

struct Trim;
impl Stage for Trim {
  fn apply(&self, input: String) -> String {
    input.trim().to_string()
  }
}

struct Uppercase;
impl Stage for Uppercase {
  fn apply(&self, input: String) -> String {
    input.to_uppercase()
  }
}

struct Exclaim;
impl Stage for Exclaim {
  fn apply(&self, input: String) -> String {
    format!("{}!", input)
  }
}

fn main() -> Result<(), strata::Error> {
  let mut registrar = Registrar::new();

  // Register three stages under the one `dyn Stage` key, in the order they
  // should run.
  registrar.bind::<dyn Stage>(
    Blueprint::of::<Trim>().constructor(Constructor::<dyn Stage>::from_fn(|| Arc::new(Trim))),
  )?;
  registrar.bind::<dyn Stage>(
    Blueprint::of::<Uppercase>().constructor(Constructor::<dyn Stage>::from_fn(|| Arc::new(Uppercase))),
  )?;
  registrar.bind::<dyn Stage>(
    Blueprint::of::<Exclaim>().constructor(Constructor::<dyn Stage>::from_fn(|| Arc::new(Exclaim))),
  )?;

  let resolver = registrar.build();

  // Collection resolution returns every stage, in registration order.
  let stages = resolver.resolve_all::<dyn Stage>()?;
  println!("Resolved {} stages.", stages.len());

  let output = stages
    .iter()
    .fold(String::from("  hello  "), |acc, stage| stage.apply(acc));
  println!("Pipeline output: {:?}", output);
  assert_eq!(output, "HELLO!");

  // Single resolution of the same key serves only the *last* registration.
  let last = resolver.resolve_required::<dyn Stage>()?;
  println!("Single resolution applied: {:?}", last.apply("last".into()));

  Ok(())
}
