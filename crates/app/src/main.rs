//! vitrine-preview - render an engraving for a configured model set
//!
//! Loads the material and model documents, applies the default tags plus
//! any `--tag` extras, sets the engraving text and writes the generated
//! alpha and normal rasters as PNG files.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitrine::args::PreviewArgs;
use vitrine::Configurator;
use vitrine_config::{RuntimeConfig, CONFIG_ENV_VAR};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = PreviewArgs::parse();
    let config = RuntimeConfig::from_env()
        .with_context(|| format!("loading runtime config from ${CONFIG_ENV_VAR}"))?;

    info!(
        "Starting vitrine-preview with tags {:?} + {:?}",
        config.default_tags, args.tags
    );

    let mut configurator = Configurator::load(config, &args.materials, &args.models)
        .context("loading configurator documents")?;

    for tag in &args.tags {
        configurator.set_tag_active(tag, true);
    }
    if let Some(aspect) = args.aspect {
        if !configurator.set_aspect(Some(aspect)) {
            warn!("Ignoring invalid aspect {}", aspect);
        }
    }

    let report = configurator.set_text(&args.text);
    for skipped in &report.skipped {
        warn!(
            "{} kept its previous material: {}",
            skipped.mesh_name, skipped.error
        );
    }

    let (alpha, normal) = configurator
        .save_engraving(&args.out_dir)
        .context("saving engraving rasters")?;
    info!("Wrote {} and {}", alpha.display(), normal.display());

    if let Some(path) = &args.export {
        configurator
            .save_materials(path)
            .with_context(|| format!("exporting materials to {}", path.display()))?;
        info!("Exported materials to {}", path.display());
    }

    Ok(())
}
