//! Path normalization shared by the diff engine and the renderer.

/// Strip `prefix` from `path` when it is present; otherwise return `path`
/// unchanged. An empty prefix is a no-op.
#[must_use]
pub fn normalize<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}
