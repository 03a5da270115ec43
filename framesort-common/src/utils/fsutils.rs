use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Collects all files in the given directories, does not walk them recursively.
/// Subdirectories are skipped, symlinks to files are kept.
pub fn all_files<R>(folders: impl IntoIterator<Item = impl AsRef<Path>>) -> io::Result<R>
where
    R: FromIterator<PathBuf>,
{
    let iters: Result<Vec<_>, _> =
        folders.into_iter().map(|path| fs::read_dir(path)).collect();

    iters?
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                path.is_file().then_some(Ok(path))
            }
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// Checks whether the extension of `path` is one of `extensions`, ignoring ASCII case.
/// The extensions are given without the leading dot.
pub fn has_extension(path: impl AsRef<Path>, extensions: &[&str]) -> bool {
    let Some(ext) = path.as_ref().extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Try to read the file, return None if it doesn't exist
pub fn read_optional_file(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
        Ok(s) => Ok(Some(s)),
    }
}
