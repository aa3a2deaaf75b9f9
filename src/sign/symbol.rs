//! Symbol resolution
//!
//! Maps a single (already uppercased) character to the sign it is presented
//! with. Only A-Z, 0-9 and the space character have a sign; everything else
//! resolves to [`SignDescriptor::Unsupported`].

use serde::Serialize;
use std::path::Path;

use crate::config::AssetConfig;

/// Presentation type of one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignDescriptor {
    /// A hand-sign clip addressed by URI
    Video { src: String },
    /// The space character
    Space,
    /// No sign exists for this symbol
    Unsupported,
}

impl SignDescriptor {
    pub fn is_video(&self) -> bool {
        matches!(self, SignDescriptor::Video { .. })
    }
}

/// Symbols that have a sign clip
pub fn supported_symbols() -> impl Iterator<Item = char> {
    ('A'..='Z').chain('0'..='9')
}

/// Resolves symbols to sign descriptors using the asset naming convention
/// `{url_prefix}/{SYMBOL}.{extension}`.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    url_prefix: String,
    extension: String,
}

impl SymbolResolver {
    pub fn new(url_prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(config.url_prefix.clone(), config.extension.clone())
    }

    /// Resolve a symbol. Total over all characters.
    pub fn resolve(&self, symbol: char) -> SignDescriptor {
        match symbol {
            'A'..='Z' | '0'..='9' => SignDescriptor::Video {
                src: format!("{}/{}.{}", self.url_prefix, symbol, self.extension),
            },
            ' ' => SignDescriptor::Space,
            _ => SignDescriptor::Unsupported,
        }
    }

    /// File name of the clip for a supported symbol
    pub fn asset_file_name(&self, symbol: char) -> String {
        format!("{}.{}", symbol, self.extension)
    }

    /// Supported symbols whose clip is missing from `dir`.
    ///
    /// Missing clips are not fatal; playback falls back to a timed step when
    /// the viewer fails to load them.
    pub fn missing_assets(&self, dir: &Path) -> Vec<char> {
        supported_symbols()
            .filter(|&symbol| !dir.join(self.asset_file_name(symbol)).is_file())
            .collect()
    }
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::from_config(&AssetConfig::default())
    }
}
