use std::sync::Arc;

use strata::{
  ResolverExt, ServiceInstance, ServiceKey, ServiceProvider, TieredRegistrar,
};

// The services the *host* owns. This crate never registers into it and
// never mutates it; it is only read as a fallback.
struct HostServices {
  version: Arc<String>,
}

impl ServiceProvider for HostServices {
  fn get_service(&self, key: ServiceKey) -> Option<ServiceInstance> {
    if key == ServiceKey::of::<String>() {
      return Some(ServiceInstance::new(Arc::clone(&self.version)));
    }
    None
  }
}

struct Banner {
  text: &'static str,
}

fn main() -> Result<(), strata::Error> {
  // 1. The host exists first and owns its own services.
  let host = Arc::new(HostServices {
    version: Arc::new(String::from("2.4.0")),
  });

  // 2. Layer an owned registrar in front of it.
  let mut registrar = TieredRegistrar::from_provider(host);
  registrar.bind_instance(Arc::new(Banner {
    text: "resolution demo",
  }));

  let resolver = registrar.build()?;

  // 3. Keys the owned tier knows resolve locally...
  let banner = resolver.resolve_required::<Banner>()?;
  println!("Banner (owned tier): {}", banner.text);

  // ...and keys it does not know fall through to the host.
  let version = resolver.resolve_required::<String>()?;
  println!("Version (host tier): {}", version);

  // 4. Keys neither tier knows resolve to nothing, never an error.
  let missing = resolver.resolve::<usize>()?;
  println!("Unknown key resolved to: {:?}", missing.is_some());

  Ok(())
}
