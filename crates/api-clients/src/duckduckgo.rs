//! DuckDuckGo web and image search.
//!
//! Searches need a per-query `vqd` token scraped from the results page. The
//! token is cached per query and shared by both kinds of search; the results
//! themselves are not cached.

use crate::error::FetchError;
use crate::http::{build_client, check_status};
use crate::resolver::{CachePolicy, EntityResolver, EntitySource, Resolved};
use api_cache::CacheSweeper;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

static VQD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"vqd=["']?([\d-]+)["'&]"#).expect("Invalid vqd regex")
});

static RESULTS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)DDG\.pageLayout\.load\('d',(\[.+\])\);DDG\.duckbar\.load\(")
        .expect("Invalid results regex")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SafeSearch {
    #[default]
    Strict,
    Moderate,
    Off,
}

impl SafeSearch {
    /// Parse the integer values the command option uses (0, -1, -2).
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(SafeSearch::Strict),
            -1 => Some(SafeSearch::Moderate),
            -2 => Some(SafeSearch::Off),
            _ => None,
        }
    }

    fn value(self) -> i64 {
        match self {
            SafeSearch::Strict => 0,
            SafeSearch::Moderate => -1,
            SafeSearch::Off => -2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    #[default]
    All,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(TimeRange::All),
            "d" => Some(TimeRange::Day),
            "w" => Some(TimeRange::Week),
            "m" => Some(TimeRange::Month),
            "y" => Some(TimeRange::Year),
            _ => None,
        }
    }

    fn code(self) -> &'static str {
        match self {
            TimeRange::All => "a",
            TimeRange::Day => "d",
            TimeRange::Week => "w",
            TimeRange::Month => "m",
            TimeRange::Year => "y",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub safe_search: SafeSearch,
    pub time: TimeRange,
}

/// Defines an image filter enum whose variants map to and from the codes the
/// search engine puts in its `f` parameter. `Any` sends no filter.
macro_rules! image_filter {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub enum $name {
            #[default]
            Any,
            $($variant),+
        }

        impl $name {
            /// Parse a command option value. An empty string means `Any`.
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    "" => Some($name::Any),
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn code(self) -> &'static str {
                match self {
                    $name::Any => "",
                    $($name::$variant => $code),+
                }
            }
        }
    };
}

image_filter!(ImageSize {
    Small => "Small",
    Medium => "Medium",
    Large => "Large",
    Wallpaper => "Wallpaper",
});

image_filter!(ImageType {
    Photo => "photo",
    Clipart => "clipart",
    Gif => "gif",
    Transparent => "transparent",
});

image_filter!(ImageLayout {
    Square => "Square",
    Tall => "Tall",
    Wide => "Wide",
});

image_filter!(ImageColor {
    Color => "color",
    Monochrome => "Monochrome",
    Red => "Red",
    Orange => "Orange",
    Yellow => "Yellow",
    Green => "Green",
    Blue => "Blue",
    Pink => "Pink",
    Brown => "Brown",
    Black => "Black",
    Gray => "Gray",
    Teal => "Teal",
    White => "White",
});

image_filter!(
    /// Usage rights. `CreativeCommons` is any Creative Commons license.
    ImageLicense {
        CreativeCommons => "Any",
        PublicDomain => "Public",
        Share => "Share",
        ShareCommercially => "ShareCommercially",
        Modify => "Modify",
        ModifyCommercially => "ModifyCommercially",
    }
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Image search only distinguishes strict from not strict.
    pub safe_search: SafeSearch,
    pub size: ImageSize,
    pub kind: ImageType,
    pub layout: ImageLayout,
    pub color: ImageColor,
    pub license: ImageLicense,
}

impl ImageOptions {
    /// The `f` parameter: `size:..,type:..,layout:..,color:..,license:..`,
    /// with empty slots for unset filters.
    fn filters(&self) -> String {
        [
            ("size", self.size.code()),
            ("type", self.kind.code()),
            ("layout", self.layout.code()),
            ("color", self.color.code()),
            ("license", self.license.code()),
        ]
        .iter()
        .map(|(name, code)| {
            if code.is_empty() {
                String::new()
            } else {
                format!("{}:{}", name, code)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageResult {
    #[serde(default)]
    pub title: String,
    /// Direct link to the image.
    pub image: String,
    #[serde(default)]
    pub thumbnail: String,
    /// Page the image was found on.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct ImagePage {
    #[serde(default)]
    results: Vec<ImageResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Snippet with `<b>` highlighting left in place.
    pub description: String,
    pub hostname: String,
    pub icon: String,
}

/// Raw result entry as embedded in the `d.js` payload.
#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    t: String,
    #[serde(default)]
    u: String,
    #[serde(default)]
    a: String,
    #[serde(default)]
    i: String,
    /// Present only on the trailing "next page" marker.
    #[serde(default)]
    n: Option<String>,
}

/// Scrapes the `vqd` token for a query.
pub struct VqdSource {
    client: Client,
    base_url: String,
}

impl VqdSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EntitySource for VqdSource {
    type Record = String;

    fn domain(&self) -> &'static str {
        "ddg-vqd"
    }

    async fn fetch(&self, key: &str) -> Result<Resolved<String>, FetchError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", key), ("ia", "web")])
            .send()
            .await?;
        let body = check_status(response, "search").await?.text().await?;

        let vqd = VQD_REGEX
            .captures(&body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| FetchError::Decode("search token missing from page".into()))?;
        Ok(Resolved::new(key, vqd))
    }
}

/// Web search client with a cached token resolver.
pub struct SearchClient {
    client: Client,
    links_url: String,
    tokens: EntityResolver<VqdSource>,
}

impl SearchClient {
    pub fn new(
        base_url: impl Into<String>,
        links_url: impl Into<String>,
        timeout: Duration,
        policy: CachePolicy,
    ) -> Result<Self, FetchError> {
        let client = build_client(timeout)?;
        Ok(Self {
            tokens: EntityResolver::new(VqdSource::new(client.clone(), base_url), policy),
            client,
            links_url: links_url.into(),
        })
    }

    pub fn tokens(&self) -> &EntityResolver<VqdSource> {
        &self.tokens
    }

    /// Search the web. An empty result list means nothing matched.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>, FetchError> {
        let vqd = self.tokens.resolve(query).await?;

        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("l", "en-us".into()),
            ("kl", "wt-wt".into()),
            ("s", "0".into()),
            ("dl", "en".into()),
            ("ct", "US".into()),
            ("df", options.time.code().into()),
            ("vqd", vqd),
            ("sp", "1".into()),
            ("bpa", "1".into()),
        ];
        match options.safe_search {
            SafeSearch::Strict => params.push(("p", "1".into())),
            other => {
                params.push(("t", "D".into()));
                params.push(("ex", other.value().to_string()));
            }
        }

        let response = self
            .client
            .get(format!("{}/d.js", self.links_url))
            .query(&params)
            .send()
            .await?;
        let body = check_status(response, "search").await?.text().await?;

        let results = parse_results(&body)?;
        debug!(count = results.len(), "Search complete");
        Ok(results)
    }

    /// Search images. An empty result list means nothing matched.
    #[instrument(skip(self))]
    pub async fn images(
        &self,
        query: &str,
        options: ImageOptions,
    ) -> Result<Vec<ImageResult>, FetchError> {
        let vqd = self.tokens.resolve(query).await?;
        let safe = if options.safe_search == SafeSearch::Strict { "1" } else { "-1" };

        let response = self
            .client
            .get(format!("{}/i.js", self.links_url))
            .query(&[
                ("l", "wt-wt"),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", options.filters().as_str()),
                ("p", safe),
            ])
            .send()
            .await?;
        let page: ImagePage = check_status(response, "image search").await?.json().await?;

        let results: Vec<ImageResult> = page
            .results
            .into_iter()
            .filter(|r| !r.image.is_empty())
            .map(|r| ImageResult {
                title: html_escape::decode_html_entities(&r.title).into_owned(),
                ..r
            })
            .collect();
        debug!(count = results.len(), "Image search complete");
        Ok(results)
    }

    pub fn register_sweeps(&self, sweeper: &mut CacheSweeper) {
        self.tokens.register_sweeps(sweeper);
    }
}

fn parse_results(body: &str) -> Result<Vec<SearchResult>, FetchError> {
    if body.contains("DDG.deep.is506") {
        return Err(FetchError::Upstream(
            "The search engine rejected the request! Try again later!".into(),
        ));
    }

    let Some(captures) = RESULTS_REGEX.captures(body) else {
        return Ok(Vec::new());
    };
    let raw: Vec<RawResult> = serde_json::from_str(&captures[1])?;

    Ok(raw
        .into_iter()
        .filter(|r| r.n.is_none() && r.t != "EOF" && !r.u.is_empty())
        .map(|r| SearchResult {
            title: html_escape::decode_html_entities(&r.t).into_owned(),
            icon: format!("https://external-content.duckduckgo.com/ip3/{}.ico", r.i),
            url: r.u,
            description: html_escape::decode_html_entities(&r.a).into_owned(),
            hostname: r.i,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_BODY: &str = concat!(
        "if (DDG.deep && DDG.deep.setUpstream) DDG.deep.setUpstream(\"bingv7aa\");",
        "DDG.pageLayout.load('d',[",
        r#"{"t":"The Rust Programming Language","u":"https://www.rust-lang.org/","a":"A language empowering <b>everyone</b>","i":"www.rust-lang.org"},"#,
        r#"{"t":"Rust &amp; Cargo","u":"https://doc.rust-lang.org/cargo/","a":"The Cargo book","i":"doc.rust-lang.org"},"#,
        r#"{"n":"/d.js?q=rust&s=2"}"#,
        "]);DDG.duckbar.load('images');"
    );

    fn client(server: &MockServer) -> SearchClient {
        SearchClient::new(
            server.uri(),
            server.uri(),
            Duration::from_secs(5),
            CachePolicy::new(Duration::from_secs(3600)),
        )
        .unwrap()
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "rust"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<script>nrj('/d.js?q=rust&vqd=4-123456789&p=1')</script>"),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_parses_results_and_caches_token() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/d.js"))
            .and(query_param("vqd", "4-123456789"))
            .and(query_param("p", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_BODY))
            .expect(2)
            .mount(&server)
            .await;

        let search = client(&server);
        let results = search.search("rust", SearchOptions::default()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hostname, "www.rust-lang.org");
        assert_eq!(results[1].title, "Rust & Cargo");
        assert_eq!(
            results[0].icon,
            "https://external-content.duckduckgo.com/ip3/www.rust-lang.org.ico"
        );

        // The second search reuses the cached token.
        search.search("rust", SearchOptions::default()).await.unwrap();
        assert_eq!(search.tokens().cached("rust").as_deref(), Some("4-123456789"));
    }

    #[tokio::test]
    async fn test_non_strict_search_sends_safe_search_value() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/d.js"))
            .and(query_param("ex", "-2"))
            .and(query_param("df", "w"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let options = SearchOptions {
            safe_search: SafeSearch::Off,
            time: TimeRange::Week,
        };
        let results = client(&server).search("rust", options).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .search("rust", SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert_eq!(err.user_message(), "An error occurred with the API!");
    }

    const IMAGES_BODY: &str = r#"{
        "query": "ferris",
        "results": [
            {"title": "Ferris &amp; friends", "image": "https://img.example/ferris.png",
             "thumbnail": "https://tse.example/th?id=1", "url": "https://rustacean.net/",
             "width": 1200, "height": 800, "source": "Bing"},
            {"title": "broken", "image": "", "url": "https://example.com/"},
            {"title": "Ferris plush", "image": "https://img.example/plush.jpg",
             "url": "https://shop.example/plush", "width": 640, "height": 640}
        ],
        "next": "i.js?q=ferris&s=100"
    }"#;

    #[tokio::test]
    async fn test_image_search_sends_filters_and_reuses_token() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/d.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_BODY))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("q", "rust"))
            .and(query_param("vqd", "4-123456789"))
            .and(query_param("o", "json"))
            .and(query_param("f", "size:Large,,,color:Monochrome,license:Public"))
            .and(query_param("p", "-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(IMAGES_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let search = client(&server);
        search.search("rust", SearchOptions::default()).await.unwrap();

        let options = ImageOptions {
            safe_search: SafeSearch::Off,
            size: ImageSize::Large,
            color: ImageColor::Monochrome,
            license: ImageLicense::PublicDomain,
            ..ImageOptions::default()
        };
        let images = search.images("rust", options).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].title, "Ferris & friends");
        assert_eq!(images[0].image, "https://img.example/ferris.png");
        assert_eq!((images[0].width, images[0].height), (1200, 800));
        assert_eq!(images[1].source, "");
    }

    #[tokio::test]
    async fn test_image_search_without_results() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("p", "1"))
            .and(query_param("f", ",,,,"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
            .mount(&server)
            .await;

        let images = client(&server)
            .images("rust", ImageOptions::default())
            .await
            .unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_image_filter_codes() {
        assert_eq!(ImageType::from_code("gif"), Some(ImageType::Gif));
        assert_eq!(ImageLayout::from_code(""), Some(ImageLayout::Any));
        assert_eq!(ImageColor::from_code("purple"), None);

        let options = ImageOptions {
            kind: ImageType::Transparent,
            layout: ImageLayout::Wide,
            ..ImageOptions::default()
        };
        assert_eq!(options.filters(), ",type:transparent,layout:Wide,,");
    }

    #[test]
    fn test_parse_results_without_payload_is_empty() {
        assert!(parse_results("DDG.search.noResults()").unwrap().is_empty());
    }

    #[test]
    fn test_option_codes() {
        assert_eq!(SafeSearch::from_value(-1), Some(SafeSearch::Moderate));
        assert_eq!(SafeSearch::from_value(3), None);
        assert_eq!(TimeRange::from_code("y"), Some(TimeRange::Year));
        assert_eq!(TimeRange::from_code("x"), None);
    }
}
