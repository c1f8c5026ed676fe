//! TOML configuration file for monitored artists.
//!
//! ```toml
//! [[artists]]
//! name = "MyGO!!!!!"
//!
//! [[artists.sources]]
//! id = "official-news"
//! url = "https://band.example/news"
//! filter_keywords = ["live", "ticket", "news"]
//! max_detail_pages = 10
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracker::types::ArtistConfig;

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub artists: Vec<ArtistConfig>,
}

/// Load and validate the sources file.
pub fn load_sources(path: &Path) -> Result<Vec<ArtistConfig>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources config {}", path.display()))?;
    let file: SourcesFile = toml::from_str(&contents)
        .with_context(|| format!("parsing sources config {}", path.display()))?;

    anyhow::ensure!(
        !file.artists.is_empty(),
        "sources config {} defines no artists",
        path.display()
    );
    for artist in &file.artists {
        anyhow::ensure!(
            !artist.sources.is_empty(),
            "artist {:?} has no sources configured",
            artist.name
        );
    }

    Ok(file.artists)
}
