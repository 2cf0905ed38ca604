//! Entry-point binary staged into the sandbox's code mount. Invoked with
//! three positional arguments: the io directory, the component's source file
//! name, and the component's symbol name. The component registry is compiled
//! in; relative base paths resolve against the container working directory.

use std::env;
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        anyhow::bail!(
            "usage: {} <io-dir> <component-source-file> <component-name>",
            args.first().map(String::as_str).unwrap_or("runner")
        );
    }

    let registry = demo_components::registry()?;
    let work_root = env::current_dir()?;
    stepbox::entrypoint::run(Path::new(&args[1]), &args[2], &args[3], &registry, &work_root)?;
    info!(component = %args[3], "component run complete");
    Ok(())
}
