//! Error types for the viewer core
//!
//! Every failure the viewer can observe is non-fatal to the animation loop.
//! These enums exist so callers can log, report or reject a request without
//! the frame clock ever stopping.

use thiserror::Error;

/// Errors raised while loading or validating a [`ViewerConfig`](crate::config::ViewerConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension does not name a supported format
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The file contents could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// The page map references an asset id that is not configured
    #[error("page {page} refers to unknown asset '{asset}'")]
    UnknownAsset { page: u32, asset: String },

    /// Two assets share the same id
    #[error("duplicate asset id '{0}'")]
    DuplicateAsset(String),

    /// A numeric constant is outside its allowed range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors reported by an [`AssetLoader`](crate::assets::AssetLoader)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The loader has no asset with this id
    #[error("asset not found: {0}")]
    NotFound(String),

    /// The asset exists but could not be turned into a scene node
    #[error("failed to load asset '{id}': {reason}")]
    LoadFailed { id: String, reason: String },
}

/// Errors reported by a [`DocumentRenderer`](crate::document::DocumentRenderer)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The document could not be opened
    #[error("failed to open document: {0}")]
    OpenFailed(String),

    /// A page could not be rasterized
    #[error("failed to render page {page}: {reason}")]
    RenderFailed { page: u32, reason: String },
}

/// Errors reported by a [`RendererSurface`](crate::scheduler::RendererSurface)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("surface error: {0}")]
pub struct SurfaceError(pub String);

/// Errors returned by viewer event handling
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Page navigation outside `[1, page_count]`
    #[error("page {page} is out of range (document has {page_count} pages)")]
    InvalidPage { page: u32, page_count: u32 },

    /// A page was requested before the document finished opening
    #[error("no document is open")]
    NoDocument,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_page_message_names_bounds() {
        let err = ViewerError::InvalidPage {
            page: 13,
            page_count: 12,
        };
        assert_eq!(
            err.to_string(),
            "page 13 is out of range (document has 12 pages)"
        );
    }

    #[test]
    fn asset_error_converts_transparently() {
        let err: ViewerError = AssetError::NotFound("ID1f-CD".to_string()).into();
        assert_eq!(err.to_string(), "asset not found: ID1f-CD");
    }

    #[test]
    fn config_unknown_asset_message() {
        let err = ConfigError::UnknownAsset {
            page: 8,
            asset: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "page 8 refers to unknown asset 'missing'");
    }
}
