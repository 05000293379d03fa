//! Remote address resolution for paginated listings.
//!
//! A resolver maps a [`ResourceKind`] to a [`PageUrlTemplate`]; the template
//! then yields one URL per page index and media filter.

use url::Url;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::types::{MediaKind, PageIndex, ResourceKind};

/// How the media filter is encoded in a listing URL
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaParam {
    /// `mediaType=game` / `mediaType=movie`
    Name,
    /// `mediaType=1` / `mediaType=2`
    Numeric,
}

/// Base address of a paginated listing, ready to be specialized per page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageUrlTemplate {
    base: Url,
    media_param: MediaParam,
}

impl PageUrlTemplate {
    /// Create a template from a base URL (without page or media parameters)
    pub fn new(base: Url, media_param: MediaParam) -> Self {
        Self { base, media_param }
    }

    /// Base URL of the listing
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of one page of the listing
    pub fn page_url(&self, page: PageIndex, media: MediaKind) -> Url {
        let mut url = self.base.clone();
        let media_value = match self.media_param {
            MediaParam::Name => media.as_str().to_string(),
            MediaParam::Numeric => media.numeric_code().to_string(),
        };
        url.query_pairs_mut()
            .append_pair("mediaType", &media_value)
            .append_pair("page", &page.key());
        url
    }
}

/// Resolves listing addresses for resource kinds
pub trait AddressResolver: Send + Sync {
    /// Base template for a resource kind
    fn resolve(&self, kind: ResourceKind) -> Result<PageUrlTemplate>;

    /// Address of one page
    fn page_url(&self, template: &PageUrlTemplate, page: PageIndex, media: MediaKind) -> Url {
        template.page_url(page, media)
    }
}

/// Default resolver for store and account listings
#[derive(Clone, Debug)]
pub struct UrlResolver {
    store_host: Url,
    embed_host: Url,
}

impl UrlResolver {
    /// Build a resolver from the configured hosts
    pub fn from_config(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            store_host: parse_host(&http.store_host, "store_host")?,
            embed_host: parse_host(&http.embed_host, "embed_host")?,
        })
    }
}

impl AddressResolver for UrlResolver {
    fn resolve(&self, kind: ResourceKind) -> Result<PageUrlTemplate> {
        let (host, path, media_param) = match kind {
            ResourceKind::StoreProducts => {
                (&self.store_host, "games/ajax/filtered", MediaParam::Name)
            }
            ResourceKind::AccountProducts => (
                &self.embed_host,
                "account/getFilteredProducts",
                MediaParam::Numeric,
            ),
            ResourceKind::Wishlist => {
                (&self.embed_host, "user/wishlist/search", MediaParam::Numeric)
            }
            ResourceKind::Details | ResourceKind::ApiProducts => {
                return Err(Error::Resolution {
                    kind,
                    message: "resource is not a paginated listing".to_string(),
                });
            }
        };

        let base = host.join(path).map_err(|e| Error::Resolution {
            kind,
            message: format!("cannot join {path:?} onto {host}: {e}"),
        })?;
        Ok(PageUrlTemplate::new(base, media_param))
    }
}

/// Parse a host URL, making sure relative joins keep its path
fn parse_host(host: &str, key: &str) -> Result<Url> {
    let mut normalized = host.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| Error::config(format!("invalid URL {host:?}: {e}"), key))
}
