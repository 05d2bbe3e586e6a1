use std::path::Path;

const MAX_DISPLAY_CHARS: usize = 40;

/// Build the list label of a track from its file name.
///
/// Anything that is not a word character, whitespace, `-` or `.` is replaced
/// by a space, and names longer than 40 characters are cut and suffixed with
/// `...`.
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || c == '-' || c == '.' {
                c
            } else {
                ' '
            }
        })
        .collect();

    if cleaned.chars().count() > MAX_DISPLAY_CHARS {
        let mut cut: String = cleaned.chars().take(MAX_DISPLAY_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        cleaned
    }
}

/// Last path component of a folder, or the full path for `/`.
pub fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
