//! Process-wide logging setup shared by bloodbank binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide structured logging at `info`, overridable via `RUST_LOG`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with_default("info");
}
