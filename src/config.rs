use crate::loader::{CopyQueue, ImmediateCopyQueue, RayonCopyQueue};
use crate::shape_button::DEFAULT_ALPHA_THRESHOLD;
use crate::texture::{HitTexture, RasterTexture, TextureError};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use winit::window::CursorIcon;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown cursor name {0:?}")]
    UnknownCursor(String),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyQueueKind {
    #[default]
    Rayon,
    Immediate,
}

impl CopyQueueKind {
    pub fn build(self) -> Arc<dyn CopyQueue> {
        match self {
            CopyQueueKind::Rayon => Arc::new(RayonCopyQueue),
            CopyQueueKind::Immediate => Arc::new(ImmediateCopyQueue),
        }
    }
}

/// Button settings as authored in a TOML file.
///
/// ```toml
/// alpha_threshold = 16
/// texture = "play_button.svg"
/// svg_scale = 2.0
/// cursor = "pointer"
/// tooltip = "Start a new round"
/// copy_queue = "rayon"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeButtonConfig {
    pub alpha_threshold: u8,
    pub texture: Option<PathBuf>,
    pub svg_scale: f32,
    pub is_focusable: bool,
    pub cursor: Option<String>,
    pub tooltip: Option<String>,
    pub copy_queue: CopyQueueKind,
}

impl Default for ShapeButtonConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            texture: None,
            svg_scale: 1.0,
            is_focusable: true,
            cursor: None,
            tooltip: None,
            copy_queue: CopyQueueKind::default(),
        }
    }
}

impl ShapeButtonConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ShapeButtonConfig = toml::from_str(s)?;
        config.cursor_icon()?;
        Ok(config)
    }

    /// Loads a config file; a relative texture path is resolved against the
    /// directory holding the config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&read_to_string(path)?)?;
        if let (Some(texture), Some(dir)) = (config.texture.as_mut(), path.parent()) {
            if texture.is_relative() {
                *texture = dir.join(&*texture);
            }
        }
        Ok(config)
    }

    pub fn cursor_icon(&self) -> Result<Option<CursorIcon>, ConfigError> {
        self.cursor
            .as_deref()
            .map(|name| {
                name.parse::<CursorIcon>()
                    .map_err(|_| ConfigError::UnknownCursor(name.to_string()))
            })
            .transpose()
    }

    /// Loads the configured texture; SVG files are rasterised at `svg_scale`.
    pub fn load_texture(&self) -> Result<Option<Arc<dyn HitTexture>>, ConfigError> {
        let Some(path) = self.texture.as_deref() else {
            return Ok(None);
        };
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        let texture = if is_svg {
            RasterTexture::from_svg_file(path, self.svg_scale)?
        } else {
            Self::load_raster(path)?
        };
        Ok(Some(Arc::new(texture)))
    }

    #[cfg(feature = "raster")]
    fn load_raster(path: &Path) -> Result<RasterTexture, TextureError> {
        RasterTexture::from_path(path)
    }

    #[cfg(not(feature = "raster"))]
    fn load_raster(path: &Path) -> Result<RasterTexture, TextureError> {
        Err(TextureError::UnsupportedFormat(format!(
            "{} (raster support disabled)",
            path.display()
        )))
    }
}
