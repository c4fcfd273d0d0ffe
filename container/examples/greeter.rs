use std::sync::Arc;

use strata::{Blueprint, Constructor, Param, Registrar, ResolverExt};

// 1. Define the abstraction (the trait)
trait Writer: Send + Sync {
  fn write(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleWriter;
impl Writer for ConsoleWriter {
  fn write(&self, message: &str) {
    println!("[CONSOLE]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct Greeter {
  writer: Arc<dyn Writer>,
}

impl Greeter {
  fn greet(&self, name: &str) {
    self.writer.write(&format!("Hello, {}!", name));
  }
}

fn main() -> Result<(), strata::Error> {
  let mut registrar = Registrar::new();

  // Register the concrete ConsoleWriter as the implementation for the
  // `dyn Writer` trait. The container stores Arc<ConsoleWriter> but serves
  // it as Arc<dyn Writer>.
  registrar.bind::<dyn Writer>(
    Blueprint::of::<ConsoleWriter>().constructor(Constructor::<dyn Writer>::from_fn(|| Arc::new(ConsoleWriter))),
  )?;

  // Register the Greeter. Its constructor *declares* its dependency; the
  // container resolves it at activation time. This is the inversion of
  // control: Greeter never creates its writer.
  registrar.bind::<Greeter>(Blueprint::of::<Greeter>().constructor(Constructor::new(
    [Param::required::<dyn Writer>()],
    |args| {
      Ok(Arc::new(Greeter {
        writer: args.take()?,
      }))
    },
  )))?;

  // --- Resolution and Usage ---
  println!("Building the resolver...");
  let resolver = registrar.build();

  println!("Resolving the high-level service...");
  let greeter = resolver.resolve_required::<Greeter>()?;

  println!("Using the service...");
  greeter.greet("world");

  Ok(())
}
