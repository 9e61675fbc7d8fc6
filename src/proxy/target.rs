//! Outbound URL construction

use url::Url;

/// Strip the gateway prefix from an inbound path.
///
/// Returns the remainder (possibly empty), or `None` if the path is outside
/// the prefix. The prefix only matches on a segment boundary.
pub fn strip_gateway_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix == "/" {
        return Some(path);
    }
    let remainder = path.strip_prefix(prefix)?;
    if remainder.is_empty() || remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}

/// Compute the outbound URL for a request.
///
/// An empty remainder keeps the base path as is. Otherwise the remainder is
/// joined to the base path with exactly one slash, however many trailing
/// slashes the base has or leading slashes the remainder has. The inbound
/// query replaces whatever query the base URL carried.
pub fn resolve_target(base: &Url, remainder: &str, query: Option<&str>) -> Url {
    let mut target = base.clone();

    if !remainder.is_empty() {
        let base_path = base.path().trim_end_matches('/');
        let tail = remainder.trim_start_matches('/');
        target.set_path(&format!("{}/{}", base_path, tail));
    }

    target.set_query(query.filter(|q| !q.is_empty()));
    target
}
