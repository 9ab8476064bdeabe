mod app;
pub use app::App;

use inputlab_analysis::LabConfig;
use tracing_subscriber::EnvFilter;

fn load_config() -> anyhow::Result<LabConfig> {
    match std::env::var_os("INPUTLAB_CONFIG") {
        Some(path) => Ok(LabConfig::load(path)?),
        None => Ok(LabConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = App::new(load_config()?)?;
    app.run()?;

    Ok(())
}
