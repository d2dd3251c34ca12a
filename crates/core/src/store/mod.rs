pub mod traits;

// Store backends
pub mod firebase;
pub mod memory;

/// Join path segments with `/`, dropping stray slashes and empty segments.
///
/// `join_path(&["electricity_usage", "1112/", "2024-03-01"])`
/// → `"electricity_usage/1112/2024-03-01"`
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .flat_map(|s| s.as_ref().split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
