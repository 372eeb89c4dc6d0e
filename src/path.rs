//! Parameter path construction
//!
//! A parameter path is a `/`-delimited hierarchy: the configured path prefix
//! covers levels 0..N-2, the filename (extension stripped) is level N-1, and
//! an optional key is level N. The same string doubles as the list prefix
//! (no key) and as a full parameter name (with key).

/// Build an SSM parameter path or name.
///
/// A missing filename is encoded as the `$` root sentinel. If the filename
/// contains a `.`, everything from the last `.` onward is stripped. An empty
/// key is treated the same as no key.
pub fn build_parameter_path(
    path_prefix: Option<&str>,
    filename: Option<&str>,
    key: Option<&str>,
) -> String {
    let mut path = String::new();
    if let Some(prefix) = path_prefix {
        path.push_str(prefix);
    }
    if !path.ends_with('/') {
        path.push('/');
    }
    match filename {
        None => path.push('$'),
        Some(name) => match name.rfind('.') {
            Some(dot) => path.push_str(&name[..dot]),
            None => path.push_str(name),
        },
    }
    if let Some(key) = key {
        if !key.is_empty() {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(key);
        }
    }
    path
}
