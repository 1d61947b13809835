//! Report theming.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stylesheet used when none is configured or the configured one is unreadable.
pub const DEFAULT_STYLESHEET: &str = r#".main-header {
    background: linear-gradient(90deg, #00C9FF 0%, #92FE9D 100%);
    padding: 20px;
    border-radius: 10px;
    color: white;
    text-align: center;
    margin-bottom: 30px;
}
blockquote.warning { border-left: 4px solid #e67e22; }
table { border-collapse: collapse; }
th, td { padding: 4px 10px; }
"#;

/// Stylesheet embedded into Markdown reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub css: String,
    /// File the stylesheet was read from; `None` for the built-in one.
    pub source: Option<PathBuf>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            css: DEFAULT_STYLESHEET.to_string(),
            source: None,
        }
    }
}

/// Reads the stylesheet at `path`, falling back to the default theme.
pub fn load_theme(path: Option<&Path>) -> Theme {
    let Some(path) = path else {
        return Theme::default();
    };

    match std::fs::read_to_string(path) {
        Ok(css) => {
            info!("Loaded stylesheet from {}", path.display());
            Theme {
                css,
                source: Some(path.to_path_buf()),
            }
        }
        Err(e) => {
            warn!(
                "Style file {} could not be read ({}). Using default styles.",
                path.display(),
                e
            );
            Theme::default()
        }
    }
}
