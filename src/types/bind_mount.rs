// ABOUTME: Volume bind specifications in external:internal[:mode] form.
// ABOUTME: Fills in the default read-write mode when none is given.

/// Mode appended to binds that do not carry one.
pub const DEFAULT_BIND_MODE: &str = "rw";

/// Normalize a bind spec: `ext:int` becomes `ext:int:rw`, anything else is
/// returned unchanged.
pub fn normalize_bind(spec: &str) -> String {
    if spec.split(':').count() == 2 {
        format!("{spec}:{DEFAULT_BIND_MODE}")
    } else {
        spec.to_string()
    }
}
