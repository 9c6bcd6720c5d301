//! URL splitting and the sites' relative-link convention.
//!
//! Relative links on the meeting pages are relative to the *directory* of the
//! page that holds them, and are joined textually as
//! `base + "/" + prefix + "/" + href`. Standard RFC 3986 joining produces
//! different, frequently broken, URLs for these sites, so it is not used here.

use crate::models::{Cell, Link};

/// A URL cut into `scheme://host`, directory prefix and final segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    /// `scheme://host`, or just the host part when there is no scheme.
    pub base: &'a str,
    /// Everything between the host and the last `/`, without outer slashes.
    pub prefix: &'a str,
    /// The last `/`-separated segment, including any query or fragment.
    pub leaf: &'a str,
}

/// Split `url` into [`UrlParts`].
///
/// # Examples
///
/// ```ignore
/// let parts = split("https://h/central/tc_chi/meetings/a.php?x=1");
/// assert_eq!(parts.base, "https://h");
/// assert_eq!(parts.prefix, "central/tc_chi/meetings");
/// assert_eq!(parts.leaf, "a.php?x=1");
/// ```
pub fn split(url: &str) -> UrlParts<'_> {
    let (scheme_len, addr) = match url.find("://") {
        Some(idx) => (idx + 3, &url[idx + 3..]),
        None => (0, url),
    };
    let host_end = addr.find('/').unwrap_or(addr.len());
    let base = &url[..scheme_len + host_end];
    let rest = addr.get(host_end + 1..).unwrap_or("");
    if host_end == addr.len() {
        return UrlParts {
            base,
            prefix: "",
            leaf: "",
        };
    }
    match rest.rfind('/') {
        Some(idx) => UrlParts {
            base,
            prefix: &rest[..idx],
            leaf: &rest[idx + 1..],
        },
        None => UrlParts {
            base,
            prefix: "",
            leaf: rest,
        },
    }
}

/// Resolve an anchor's `href` against the URL of the page it was found on.
///
/// External links (`rel` containing `external`) are joined to the host only;
/// all others to the page's directory. Hrefs that already carry a scheme are
/// returned unchanged.
pub fn resolve(page_url: &str, href: &str, external: bool) -> String {
    let href = href.trim();
    if href.contains("://") {
        return href.to_string();
    }
    let parts = split(page_url);
    if external {
        format!("{}/{}", parts.base, href)
    } else {
        format!("{}/{}/{}", parts.base, parts.prefix, href)
    }
}

/// Resolve every anchor of a cell into a [`Link`].
pub fn extract_links(cell: &Cell, page_url: &str) -> Vec<Link> {
    cell.anchors
        .iter()
        .map(|a| Link {
            url: resolve(page_url, &a.href, a.external),
            label: a.text.clone(),
        })
        .collect()
}

/// The fragment identifier of `url`, if any.
pub fn fragment(url: &str) -> Option<&str> {
    url.split_once('#').map(|(_, f)| f)
}

/// File extension of the URL's final segment, query and fragment removed.
pub fn extension(url: &str) -> &str {
    let leaf = split(url).leaf;
    let leaf = leaf.split(['?', '#']).next().unwrap_or("");
    crate::utils::split_extension(leaf).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Anchor;

    const PAGE: &str =
        "https://www.districtcouncils.gov.hk/central/tc_chi/meetings/dcmeetings/dc_meetings.php";

    #[test]
    fn test_split_full_url() {
        let parts = split(PAGE);
        assert_eq!(parts.base, "https://www.districtcouncils.gov.hk");
        assert_eq!(parts.prefix, "central/tc_chi/meetings/dcmeetings");
        assert_eq!(parts.leaf, "dc_meetings.php");
    }

    #[test]
    fn test_split_without_scheme() {
        let parts = split("host/a/b/c.pdf");
        assert_eq!(parts.base, "host");
        assert_eq!(parts.prefix, "a/b");
        assert_eq!(parts.leaf, "c.pdf");
    }

    #[test]
    fn test_split_keeps_query_in_leaf() {
        let parts = split("https://h/x/doc.php?year=2019&meeting_id=circulate#16690");
        assert_eq!(parts.prefix, "x");
        assert_eq!(parts.leaf, "doc.php?year=2019&meeting_id=circulate#16690");
    }

    #[test]
    fn test_split_host_only() {
        let parts = split("https://h");
        assert_eq!(parts.base, "https://h");
        assert_eq!(parts.prefix, "");
        assert_eq!(parts.leaf, "");
    }

    #[test]
    fn test_resolve_relative_to_page_directory() {
        assert_eq!(
            resolve(PAGE, "doc/2016/agenda.pdf", false),
            "https://www.districtcouncils.gov.hk/central/tc_chi/meetings/dcmeetings/doc/2016/agenda.pdf"
        );
    }

    #[test]
    fn test_resolve_external_joins_host_only() {
        assert_eq!(
            resolve(PAGE, "doc/central/a.pdf", true),
            "https://www.districtcouncils.gov.hk/doc/central/a.pdf"
        );
    }

    #[test]
    fn test_resolve_does_not_normalise_dot_segments() {
        assert_eq!(
            resolve("https://h/a/b/page.php", "../c.pdf", false),
            "https://h/a/b/../c.pdf"
        );
    }

    #[test]
    fn test_resolve_absolute_href_is_untouched() {
        assert_eq!(resolve(PAGE, "https://other/x.mp3", false), "https://other/x.mp3");
    }

    #[test]
    fn test_extract_links_keeps_labels() {
        let cell = Cell {
            text: "議程 附件".to_string(),
            anchors: vec![
                Anchor {
                    href: "a.pdf".to_string(),
                    external: false,
                    text: "議程".to_string(),
                },
                Anchor {
                    href: "doc/b.pdf".to_string(),
                    external: true,
                    text: "附件".to_string(),
                },
            ],
        };
        let links = extract_links(&cell, "https://h/x/p.php");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://h/x/a.pdf");
        assert_eq!(links[0].label, "議程");
        assert_eq!(links[1].url, "https://h/doc/b.pdf");
    }

    #[test]
    fn test_fragment_and_extension() {
        assert_eq!(fragment("https://h/a.php?x=1#16690"), Some("16690"));
        assert_eq!(fragment("https://h/a.php"), None);
        assert_eq!(extension("https://h/d/file.name.pdf"), ".pdf");
        assert_eq!(extension("https://h/d/audio.mp3?dl=1"), ".mp3");
        assert_eq!(extension("https://h/d/noext"), "");
    }
}
