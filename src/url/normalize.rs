use crate::url::filter::{denied_segment, matching_extension};
use crate::url::{CanonicalUrl, Rejection, SiteScope};
use url::Url;

/// Schemes that never lead to a crawlable page
const PSEUDO_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Canonicalizes and classifies a link found on `base`
///
/// # Canonicalization Steps
///
/// 1. Reject pseudo-links (`javascript:`, `mailto:`, `tel:`, `data:`)
/// 2. Resolve `raw` against `base`; reject if malformed or not HTTP(S)
/// 3. Reject if the host or port differs from the site origin
/// 4. Rebuild on the site origin (fixing the scheme)
/// 5. Normalize path:
///    - Remove empty segments (from repeated slashes)
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 6. Drop query string and fragment
/// 7. Reject denylisted path segments
/// 8. Route document extensions to the document pipeline
/// 9. Reject forbidden extensions
///
/// The result is idempotent: canonicalizing a canonical URL returns it
/// unchanged.
///
/// # Examples
///
/// ```
/// use sumi_glean::config::FilterConfig;
/// use sumi_glean::url::{canonicalize, Rejection, SiteScope};
/// use url::Url;
///
/// let seed = Url::parse("https://example.test/").unwrap();
/// let scope = SiteScope::new(&seed, &FilterConfig::default());
///
/// let url = canonicalize(&scope, &seed, "/page-two/?ref=nav#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.test/page-two");
///
/// assert_eq!(
///     canonicalize(&scope, &seed, "https://other.test/"),
///     Err(Rejection::CrossOrigin)
/// );
/// ```
pub fn canonicalize(scope: &SiteScope, base: &Url, raw: &str) -> Result<CanonicalUrl, Rejection> {
    let raw = raw.trim();
    let lower = raw.to_lowercase();
    if PSEUDO_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Err(Rejection::PseudoLink);
    }

    let resolved = base.join(raw).map_err(|_| Rejection::Malformed)?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Err(Rejection::PseudoLink);
    }

    if !scope.is_same_origin(&resolved) {
        return Err(Rejection::CrossOrigin);
    }

    let path = normalize_path(resolved.path());
    let mut url = scope.origin().clone();
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    if let Some(segment) = denied_segment(url.path(), scope.denied_segments()) {
        return Err(Rejection::Denylisted {
            segment: segment.to_string(),
        });
    }

    let canonical = CanonicalUrl::from_normalized(url);

    if let Some(extension) = matching_extension(canonical.as_url().path(), scope.document_extensions())
    {
        tracing::trace!("{} routed to documents ({})", canonical, extension);
        return Err(Rejection::Document(canonical));
    }

    if let Some(extension) =
        matching_extension(canonical.as_url().path(), scope.forbidden_extensions())
    {
        return Err(Rejection::ForbiddenExtension { extension });
    }

    Ok(canonical)
}

/// Normalizes a URL path by removing empty segments and trailing slashes
///
/// Dot segments are already resolved by [`Url::join`].
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
