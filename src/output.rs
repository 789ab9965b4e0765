use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::InputError;

/// Suffix appended to the input stem when no output name is given.
const PROCESSED_SUFFIX: &str = "_processed";

/// Appends `.gif` unless the path already ends with it.
pub fn ensure_gif_extension(path: PathBuf) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gif") => path,
        _ => {
            let mut name = path.into_os_string();
            name.push(".gif");
            PathBuf::from(name)
        }
    }
}

/// Finds a name that does not collide with an existing file by appending
/// `_1`, `_2`, ... to the stem.
pub fn unique_path(base: &Path) -> PathBuf {
    let base = ensure_gif_extension(base.to_path_buf());
    if !base.exists() {
        return base;
    }

    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let ext = base.extension().unwrap_or_default().to_string_lossy();
    let mut counter = 1;
    loop {
        let candidate = base.with_file_name(format!("{stem}_{counter}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Decides where the processed copy of `input` goes.
///
/// An explicit `output` must be a bare file name; `output_dir` picks the
/// directory (defaulting to the input's own). Without `output` the input
/// stem gets a `_processed` suffix. Existing files are never overwritten
/// unless `force` is set; a numbered unique name is chosen instead.
pub fn resolve_output(
    input: &Path,
    output: Option<&str>,
    output_dir: Option<&Path>,
    force: bool,
) -> Result<PathBuf, InputError> {
    let candidate = match output {
        Some(name) => {
            if Path::new(name).is_absolute() || name.contains(['/', '\\']) {
                return Err(InputError::OutputWithPath(name.to_string()));
            }
            let dir = output_dir.unwrap_or_else(|| Path::new("."));
            ensure_gif_extension(dir.join(name))
        }
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            let name = format!("{stem}{PROCESSED_SUFFIX}.gif");
            match output_dir {
                Some(dir) => dir.join(name),
                None => input.with_file_name(name),
            }
        }
    };

    if candidate.exists() && !force {
        Ok(unique_path(&candidate))
    } else {
        Ok(candidate)
    }
}

/// Extracts the file name from a path, for user-facing messages.
pub fn file_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Creates the directory a file will be written into, if it is missing.
pub fn make_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
