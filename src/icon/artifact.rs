use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{ImageFormat, RgbaImage};

use super::{IconError, Result};

/// Encode an icon as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Persist an icon so readers of `path` only ever see a complete file.
///
/// The PNG is written to a hidden sibling first and then renamed over the
/// target, which is atomic on the same filesystem.
pub fn write_icon(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    let write_err = |source| IconError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp = temp_path(path);
    if let Err(e) = fs::write(&temp, &bytes).and_then(|_| fs::rename(&temp, path)) {
        let _ = fs::remove_file(&temp);
        return Err(write_err(e));
    }

    log::debug!("Wrote {} byte icon to {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| OsStr::new("icon")));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_is_hidden_sibling() {
        assert_eq!(temp_path(Path::new("/tmp/x/battery_icon.png")), PathBuf::from("/tmp/x/.battery_icon.png.tmp"));
        assert_eq!(temp_path(Path::new("battery_icon.png")), PathBuf::from(".battery_icon.png.tmp"));
    }
}
