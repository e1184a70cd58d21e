use std::sync::OnceLock;

/// Semver version with git build metadata when available.
///
/// Returns formats like:
/// - `0.2.0+abc1234` for a clean build from a known commit
/// - `0.2.0+abc1234-dirty` when uncommitted changes were present
/// - `0.2.0` when git info is unavailable (e.g. tarball build)
pub fn version_long() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| match option_env!("SPINAL_GIT_HASH") {
        Some(hash) => format!("{}+{}", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    })
}
