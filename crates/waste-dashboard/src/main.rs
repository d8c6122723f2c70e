mod bootstrap;
mod render;

use anyhow::{Context, Result};
use waste_core::settings::Settings;
use waste_runtime::data_manager::DataManager;
use waste_runtime::pages::{run_page, Page};

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Waste dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Page: {}, data dir: {}, format: {}",
        settings.page,
        settings.data_dir.display(),
        settings.format
    );

    let page: Page = settings.page.parse()?;
    let mut data = DataManager::from_settings(&settings);

    let output = run_page(page, &settings, &mut data)
        .with_context(|| format!("page \"{page}\" failed"))?;
    let text = render::render(&output, settings.json_output(), settings.show_raw)?;
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }

    Ok(())
}
