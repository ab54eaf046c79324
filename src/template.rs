//! Per-page request URL derivation from a templated base URL.
//!
//! A base URL copied from an image viewer points at one page. Each supported
//! [`Site`] knows which token in that URL carries the page number; the
//! templater rewrites that token once per page to produce the work list.
//!
//! # Example
//!
//! ```
//! use cookbooker_core::template::{Site, derive_work_items};
//!
//! let base = "https://babel.hathitrust.org/cgi/imgsrv/image?id=coo.319;seq=7;size=125";
//! let site = Site::detect(base)?;
//! let items = derive_work_items(base, 3, site)?;
//! assert_eq!(items[2].request_url, "https://babel.hathitrust.org/cgi/imgsrv/image?id=coo.319;seq=3;size=125");
//! # Ok::<(), cookbooker_core::template::TemplateError>(())
//! ```

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use thiserror::Error;
use tracing::{debug, instrument};

#[allow(clippy::expect_used)]
static HATHITRUST_SEQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"seq=\d+").expect("seq regex is valid")); // Static pattern, safe to panic

/// Errors raised while turning a base URL into work items.
///
/// All of these are precondition violations: they are raised before any
/// network activity and are fatal to the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The URL belongs to no supported site.
    #[error("unrecognized site for URL: {url}")]
    UnrecognizedSite {
        /// The rejected URL.
        url: String,
    },

    /// The URL belongs to a supported site but lacks its page token.
    #[error("URL for {site} has no `{token}<digits>` page token: {url}")]
    PatternNotFound {
        /// Site the URL was matched to.
        site: Site,
        /// Token key that was expected (e.g. `seq=`).
        token: &'static str,
        /// The rejected URL.
        url: String,
    },

    /// Page count must be at least one.
    #[error("invalid page count {0}: must be at least 1")]
    InvalidPageCount(u32),
}

/// Supported image servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    /// HathiTrust `babel` image server (`...;seq=<n>;...`).
    HathiTrust,
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HathiTrust => f.write_str("babel.hathitrust.org"),
        }
    }
}

/// How a site encodes the page number in its URLs.
#[derive(Debug, Clone, Copy)]
pub struct SiteRule {
    /// Matches the page token including its digits.
    pub pattern: &'static LazyLock<Regex>,
    /// Key written back in front of the new page number.
    pub key: &'static str,
}

impl Site {
    const ALL: [Self; 1] = [Self::HathiTrust];

    /// Host marker identifying the site inside a URL.
    fn host_marker(self) -> &'static str {
        match self {
            Self::HathiTrust => "babel.hathitrust.org",
        }
    }

    /// Returns the substitution rule for this site.
    #[must_use]
    pub fn rule(self) -> SiteRule {
        match self {
            Self::HathiTrust => SiteRule {
                pattern: &HATHITRUST_SEQ,
                key: "seq=",
            },
        }
    }

    /// Identifies which supported site a URL belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnrecognizedSite`] when no site matches.
    pub fn detect(url: &str) -> Result<Self, TemplateError> {
        Self::ALL
            .into_iter()
            .find(|site| url.contains(site.host_marker()))
            .ok_or_else(|| TemplateError::UnrecognizedSite {
                url: url.to_string(),
            })
    }
}

/// One page's request URL and the page index it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based page number.
    pub page_index: u32,
    /// Fully substituted URL for this page.
    pub request_url: String,
}

/// Derives one [`WorkItem`] per page, indices `1..=page_count` ascending.
///
/// Only the first occurrence of the site's page token is rewritten.
///
/// # Errors
///
/// - [`TemplateError::InvalidPageCount`] when `page_count` is zero
/// - [`TemplateError::PatternNotFound`] when `base_url` lacks the page token
#[instrument(level = "debug", skip(base_url), fields(site = %site))]
pub fn derive_work_items(
    base_url: &str,
    page_count: u32,
    site: Site,
) -> Result<Vec<WorkItem>, TemplateError> {
    if page_count == 0 {
        return Err(TemplateError::InvalidPageCount(page_count));
    }

    let rule = site.rule();
    if !rule.pattern.is_match(base_url) {
        return Err(TemplateError::PatternNotFound {
            site,
            token: rule.key,
            url: base_url.to_string(),
        });
    }

    let items: Vec<WorkItem> = (1..=page_count)
        .map(|page_index| {
            let replacement = format!("{}{page_index}", rule.key);
            WorkItem {
                page_index,
                request_url: rule
                    .pattern
                    .replacen(base_url, 1, NoExpand(&replacement))
                    .into_owned(),
            }
        })
        .collect();

    debug!(count = items.len(), "derived work items");
    Ok(items)
}
