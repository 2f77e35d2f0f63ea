pub mod renderer;
pub mod artifact;

pub use renderer::{render, fill_color, fill_width, ICON_HEIGHT, ICON_WIDTH};
pub use artifact::{encode_png, write_icon};

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Icon artifact write failed for {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IconError>;
