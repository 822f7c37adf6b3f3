//! G1 PEGN (Pequenas Empresas & Grandes Negócios) article scraper.
//!
//! The listing page at `https://g1.globo.com/empreendedorismo/pegn/` links to
//! entrepreneurship stories. Links are found with URL-shaped regular
//! expressions over the raw HTML rather than a DOM walk, and kept when they
//! look like article paths.
//!
//! Each article page goes through readability extraction (title, byline,
//! publication time, main content) and two substring heuristics that assign
//! keyword tags and a single [`Category`].

use crate::api::{FetchError, HttpClient, HttpGet};
use crate::models::{Article, Category};
use crate::utils::{generate_summary, title_case};
use chrono::Local;
use dom_smoothie::{Config, Readability};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Listing page scraped for article links.
pub const LISTING_URL: &str = "https://g1.globo.com/empreendedorismo/pegn/";

/// Author recorded when the page has no byline.
pub const DEFAULT_AUTHOR: &str = "G1 PEGN";

/// Upper bound on links taken from one listing page.
pub const MAX_LINKS: usize = 20;

/// Articles processed per run unless the caller asks otherwise.
pub const DEFAULT_MAX_ARTICLES: usize = 15;

/// Articles whose body is shorter than this are dropped.
pub const MIN_CONTENT_CHARS: usize = 200;

/// Pause between consecutive article fetches.
pub const ARTICLE_DELAY: Duration = Duration::from_secs(1);

/// Links splitting into more `/`-pieces than this count as article paths.
const MIN_ARTICLE_PATH_PIECES: usize = 6;

static LINK_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r#"href="(https://g1\.globo\.com/empreendedorismo/[^"]+)""#)
            .expect("valid section link pattern"),
        Regex::new(r#"href="(https://g1\.globo\.com/[^"]+/empreendedorismo/[^"]+)""#)
            .expect("valid nested section link pattern"),
    ]
});

/// Keywords scanned for in the lower-cased page HTML. Matching is verbatim,
/// so the upper-case `MEI` entry never fires.
const TAG_KEYWORDS: [&str; 15] = [
    "startup",
    "empreendedorismo",
    "negócio",
    "empresa",
    "inovação",
    "tecnologia",
    "investimento",
    "mercado",
    "vendas",
    "marketing",
    "gestão",
    "liderança",
    "pequena empresa",
    "MEI",
    "microempresa",
];

/// Elements whose text becomes one paragraph of the article body.
const BLOCK_TAGS: [&str; 6] = ["p", "h2", "h3", "h4", "li", "blockquote"];

/// Readability output reduced to the fields an [`Article`] needs.
#[derive(Debug, Clone, PartialEq)]
struct ExtractedContent {
    title: String,
    text: String,
    author: Option<String>,
    date: Option<String>,
}

/// Extract candidate article URLs from listing-page HTML.
///
/// A matched href is kept when it contains `noticia` or `artigo`, or when it
/// splits into more than six `/`-separated pieces. Duplicates are dropped
/// (first occurrence wins) and at most [`MAX_LINKS`] are returned.
pub fn extract_article_links(html: &str) -> Vec<String> {
    LINK_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(html))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|href| looks_like_article(href))
        .unique()
        .take(MAX_LINKS)
        .map(str::to_string)
        .collect()
}

fn looks_like_article(href: &str) -> bool {
    href.contains("noticia")
        || href.contains("artigo")
        || href.split('/').count() > MIN_ARTICLE_PATH_PIECES
}

/// Title-cased keywords present in the page, sorted and deduplicated.
pub fn extract_tags(html: &str) -> Vec<String> {
    let html_lower = html.to_lowercase();
    TAG_KEYWORDS
        .iter()
        .filter(|keyword| html_lower.contains(*keyword))
        .map(|keyword| title_case(keyword))
        .sorted()
        .dedup()
        .collect()
}

/// Pick the single category for a page.
///
/// Rules are checked in order against the lower-cased URL and HTML and the
/// first hit wins: startups, small business, large business, investments.
/// Anything else is [`Category::Entrepreneurship`].
pub fn extract_category(url: &str, html: &str) -> Category {
    let url = url.to_lowercase();
    let html = html.to_lowercase();
    let mentions = |in_url: &str, in_html: &str| url.contains(in_url) || html.contains(in_html);

    if mentions("startup", "startup") {
        Category::Startups
    } else if mentions("pequenas-empresas", "pequena empresa") {
        Category::SmallBusiness
    } else if mentions("grandes-empresas", "grande empresa") {
        Category::LargeBusiness
    } else if mentions("investimento", "investimento") {
        Category::Investments
    } else {
        Category::Entrepreneurship
    }
}

/// Run readability over a page and keep the article fields.
///
/// Body text is rebuilt from the block elements of the cleaned content so
/// paragraphs stay separated by a blank line. Returns `None` when the page
/// yields neither a title nor any text.
fn extract_content(html: &str, url: Option<&str>) -> Option<ExtractedContent> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };

    let mut readability = Readability::new(html, url, Some(cfg)).ok()?;
    let article = readability.parse().ok()?;

    let text = formatted_text(&article.content)
        .unwrap_or_else(|| article.text_content.trim().to_string());
    let title = article.title.trim().to_string();
    if title.is_empty() && text.is_empty() {
        return None;
    }

    Some(ExtractedContent {
        title,
        text,
        author: non_blank(article.byline.as_deref()),
        date: non_blank(article.published_time.as_deref()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Paragraph text of a cleaned content fragment, blank-line separated.
///
/// Only the outermost block is kept when blocks nest, so a `<p>` inside a
/// `<blockquote>` or `<li>` is not emitted twice.
fn formatted_text(content_html: &str) -> Option<String> {
    let block_selector = Selector::parse(&BLOCK_TAGS.join(", ")).ok()?;
    let fragment = Html::parse_fragment(content_html);

    let paragraphs = fragment
        .select(&block_selector)
        .filter(|el| !has_block_ancestor(el))
        .map(|el| el.text().flat_map(str::split_whitespace).join(" "))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn has_block_ancestor(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()))
}

/// Build an [`Article`] from a fetched page, or `None` when the page has no
/// usable content, an empty title, or a body under [`MIN_CONTENT_CHARS`].
pub fn build_article(url: &str, html: &str) -> Option<Article> {
    let Some(extracted) = extract_content(html, Some(url)) else {
        debug!(%url, "Readability found no content");
        return None;
    };

    let scraped_at = Local::now().to_rfc3339();
    let title = extracted.title.trim().to_string();
    let content = extracted.text.trim().to_string();

    if content.chars().count() < MIN_CONTENT_CHARS || title.is_empty() {
        debug!(
            %url,
            title_empty = title.is_empty(),
            chars = content.chars().count(),
            "Article below content threshold"
        );
        return None;
    }

    Some(Article {
        summary: generate_summary(&extracted.text),
        author: extracted
            .author
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        date: extracted.date.unwrap_or_else(|| scraped_at.clone()),
        url: url.to_string(),
        category: extract_category(url, html),
        tags: extract_tags(html),
        title,
        content,
        scraped_at,
    })
}

/// Fetch one article page and extract it.
///
/// Network errors and non-2xx responses are returned as errors; pages that
/// fail the content rules come back as `Ok(None)`.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn scrape_article<C: HttpGet>(
    client: &C,
    url: &str,
) -> Result<Option<Article>, FetchError> {
    let html = client.get_text(url).await?;
    let article = build_article(url, &html);
    if let Some(ref a) = article {
        info!(title = %a.title, category = %a.category, tags = a.tags.len(), "Parsed PEGN article");
    }
    Ok(article)
}

/// Sequential scraper for the PEGN listing page.
#[derive(Debug, Clone)]
pub struct PegnScraper<C> {
    client: C,
    listing_url: String,
    delay: Duration,
}

impl PegnScraper<HttpClient> {
    /// Scraper over the live site with the page client.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_client(HttpClient::for_pages()?))
    }
}

impl<C: HttpGet> PegnScraper<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            listing_url: LISTING_URL.to_string(),
            delay: ARTICLE_DELAY,
        }
    }

    /// Override the pause between article fetches.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Scrape up to `max_articles` articles from the listing page.
    ///
    /// Returns an empty collection when the listing page cannot be fetched or
    /// has no extractable content. Individual article failures are logged and
    /// skipped. Articles keep the order their links were discovered in.
    #[instrument(level = "info", skip(self), fields(listing_url = %self.listing_url))]
    pub async fn fetch_latest_news(&self, max_articles: usize) -> Vec<Article> {
        info!("Fetching PEGN listing page");
        let html = match self.client.get_text(&self.listing_url).await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "Failed to fetch listing page");
                return Vec::new();
            }
        };

        if extract_content(&html, Some(&self.listing_url)).is_none() {
            error!("Listing page has no extractable content");
            return Vec::new();
        }

        let links = extract_article_links(&html);
        let total = links.len();
        info!(count = total, "Indexed PEGN article URLs");
        debug!(urls = ?links, "PEGN URLs");

        let articles: Vec<Article> = stream::iter(links.into_iter().take(max_articles).enumerate())
            .then(|(i, url)| async move {
                if i > 0 {
                    sleep(self.delay).await;
                }
                info!(index = i + 1, total, %url, "Processing article");
                match scrape_article(&self.client, &url).await {
                    Ok(Some(article)) => Some(article),
                    Ok(None) => {
                        warn!(%url, "PEGN page produced no usable article");
                        None
                    }
                    Err(e) => {
                        error!(error = %e, %url, "PEGN article fetch failed");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await;

        info!(count = articles.len(), "Total articles processed");
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::StubClient;

    const ARTICLE_A: &str = "https://g1.globo.com/empreendedorismo/pegn/noticia/2025/05/06/startup-do-sertao.ghtml";
    const ARTICLE_B: &str = "https://g1.globo.com/empreendedorismo/pegn/noticia/2025/05/07/feira-de-negocios.ghtml";
    const ARTICLE_C: &str = "https://g1.globo.com/ba/bahia/empreendedorismo/pegn/2025/05/08/cooperativa.ghtml";

    fn paragraph(seed: &str) -> String {
        format!(
            "{seed} O empreendedor do interior da Bahia encontrou no artesanato uma forma de \
             gerar renda para a família e para a comunidade, reunindo dezenas de produtores \
             em uma cooperativa que hoje vende para todo o país e exporta parte da produção."
        )
    }

    fn article_page(title: &str, extra: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <meta name="author" content="Maria Souza">
</head>
<body>
  <nav><a href="/">Início</a><a href="/economia">Economia</a></nav>
  <article>
    <h1>{title}</h1>
    <p>{p1}</p>
    <p>{p2}</p>
    <p>{p3}</p>
    <p>{extra}</p>
  </article>
  <footer><p>© Globo Comunicação e Participações S.A.</p></footer>
</body>
</html>"#,
            p1 = paragraph("Primeiro parágrafo."),
            p2 = paragraph("Segundo parágrafo."),
            p3 = paragraph("Terceiro parágrafo."),
        )
    }

    fn listing_page() -> String {
        format!(
            r#"<html><head><title>PEGN</title></head><body>
<article>
  <h1>Pequenas Empresas &amp; Grandes Negócios</h1>
  <p>{intro}</p>
  <p>{intro2}</p>
  <ul>
    <li><a href="{ARTICLE_A}">Startup do sertão</a></li>
    <li><a href="{ARTICLE_B}">Feira de negócios</a></li>
    <li><a href="{ARTICLE_C}">Cooperativa</a></li>
    <li><a href="https://g1.globo.com/empreendedorismo/pegn/">PEGN</a></li>
    <li><a href="https://g1.globo.com/economia/">Economia</a></li>
  </ul>
</article>
</body></html>"#,
            intro = paragraph("Listagem."),
            intro2 = paragraph("Mais notícias."),
        )
    }

    #[test]
    fn test_extract_links_keeps_only_article_paths() {
        let links = extract_article_links(&listing_page());
        assert_eq!(links, vec![ARTICLE_A, ARTICLE_B, ARTICLE_C]);
    }

    #[test]
    fn test_extract_links_deduplicates() {
        let html = format!(r#"<a href="{ARTICLE_A}">a</a><a href="{ARTICLE_A}">again</a>"#);
        assert_eq!(extract_article_links(&html), vec![ARTICLE_A]);
    }

    #[test]
    fn test_extract_links_caps_at_twenty() {
        let html = (0..40)
            .map(|i| {
                format!(r#"<a href="https://g1.globo.com/empreendedorismo/pegn/noticia/2025/{i}.ghtml">n</a>"#)
            })
            .join("\n");
        let links = extract_article_links(&html);
        assert_eq!(links.len(), MAX_LINKS);
        assert!(links.iter().all(|l| looks_like_article(l)));
        assert_eq!(links.iter().unique().count(), MAX_LINKS);
    }

    #[test]
    fn test_extract_links_path_depth_rule() {
        // 6 pieces: rejected; 7 pieces: admitted.
        let shallow = r#"<a href="https://g1.globo.com/empreendedorismo/pegn/video">v</a>"#;
        let deep = r#"<a href="https://g1.globo.com/empreendedorismo/pegn/video/2025">v</a>"#;
        assert!(extract_article_links(shallow).is_empty());
        assert_eq!(extract_article_links(deep).len(), 1);
    }

    #[test]
    fn test_extract_links_ignores_other_hosts_and_quotes() {
        let html = r#"
            <a href="https://globo.com/empreendedorismo/noticia/x.ghtml">other host</a>
            <a href='https://g1.globo.com/empreendedorismo/noticia/y.ghtml'>single quotes</a>
        "#;
        assert!(extract_article_links(html).is_empty());
    }

    #[test]
    fn test_extract_tags() {
        let html = "<p>A STARTUP aposta em Inovação e tecnologia para a pequena empresa.</p>";
        let tags = extract_tags(html);
        assert_eq!(
            tags,
            vec!["Empresa", "Inovação", "Pequena Empresa", "Startup", "Tecnologia"]
        );
    }

    #[test]
    fn test_extract_tags_never_matches_uppercase_keyword() {
        assert!(extract_tags("<p>O MEI cresceu</p>").is_empty());
    }

    #[test]
    fn test_extract_category_precedence() {
        let url = "https://g1.globo.com/empreendedorismo/pegn/noticia/x.ghtml";
        assert_eq!(
            extract_category(url, "grande empresa investe em Startup"),
            Category::Startups
        );
        assert_eq!(
            extract_category("https://g1.globo.com/pequenas-empresas/x", "investimento"),
            Category::SmallBusiness
        );
        assert_eq!(
            extract_category(url, "uma GRANDE EMPRESA e seu investimento"),
            Category::LargeBusiness
        );
        assert_eq!(extract_category(url, "novo investimento"), Category::Investments);
        assert_eq!(extract_category(url, "feira de artesanato"), Category::Entrepreneurship);
    }

    #[test]
    fn test_extract_category_is_deterministic() {
        let url = "https://g1.globo.com/grandes-empresas/x";
        let html = "investimento";
        assert_eq!(extract_category(url, html), extract_category(url, html));
        assert_eq!(extract_category(url, html), Category::LargeBusiness);
    }

    #[test]
    fn test_formatted_text_separates_paragraphs() {
        let text = formatted_text("<div><p>Um  dois</p><p>três\nquatro</p><p>  </p></div>").unwrap();
        assert_eq!(text, "Um dois\n\ntrês quatro");
        assert_eq!(formatted_text("<div>sem blocos</div>"), None);
    }

    #[test]
    fn test_formatted_text_nested_blocks_once() {
        let text = formatted_text(
            "<div><blockquote><p>Citação única</p></blockquote><ul><li><p>Item</p></li></ul></div>",
        )
        .unwrap();
        assert_eq!(text, "Citação única\n\nItem");
    }

    #[test]
    fn test_build_article_populates_fields() {
        let html = article_page("Startup do sertão conquista investidores", "Inovação no campo.");
        let article = build_article(ARTICLE_A, &html).expect("article should be extracted");

        assert!(!article.title.is_empty());
        assert!(article.content.chars().count() >= MIN_CONTENT_CHARS);
        assert!(article.content.contains("\n\n"));
        assert_eq!(article.url, ARTICLE_A);
        assert_eq!(article.category, Category::Startups);
        assert!(article.tags.contains(&"Startup".to_string()));
        assert!(!article.summary.is_empty());
        assert!(article.summary.chars().count() <= 300);
        assert!(!article.author.is_empty());
        assert!(!article.date.is_empty());
        assert!(!article.scraped_at.is_empty());
    }

    #[test]
    fn test_build_article_rejects_thin_pages() {
        let html = r#"<html><head><title>Curta</title></head><body><article><h1>Curta</h1><p>Pouco texto.</p></article></body></html>"#;
        assert_eq!(build_article(ARTICLE_A, html), None);
    }

    #[test]
    fn test_build_article_rejects_blank_title() {
        let html = format!(
            r#"<html><head><title>   </title></head><body><article><p>{}</p><p>{}</p></article></body></html>"#,
            paragraph("Primeiro parágrafo."),
            paragraph("Segundo parágrafo."),
        );
        assert!(paragraph("").chars().count() * 2 >= MIN_CONTENT_CHARS);
        assert_eq!(build_article(ARTICLE_A, &html), None);
    }

    #[tokio::test]
    async fn test_scrape_article_propagates_http_errors() {
        let client = StubClient::new().fail("startup-do-sertao", 503);
        let result = scrape_article(&client, ARTICLE_A).await;
        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn test_fetch_latest_news_skips_failed_articles() {
        let client = StubClient::new()
            .respond(ARTICLE_A, &article_page("Startup do sertão", "Mais um parágrafo."))
            .fail(ARTICLE_B, 500)
            .respond(ARTICLE_C, &article_page("Cooperativa exporta", "Fim."))
            .respond(LISTING_URL, &listing_page());
        let scraper = PegnScraper::with_client(client).with_delay(Duration::ZERO);

        let news = scraper.fetch_latest_news(DEFAULT_MAX_ARTICLES).await;

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].url, ARTICLE_A);
        assert_eq!(news[1].url, ARTICLE_C);
        assert!(
            news.iter()
                .all(|a| !a.title.is_empty() && a.content.chars().count() >= MIN_CONTENT_CHARS)
        );
    }

    #[tokio::test]
    async fn test_fetch_latest_news_respects_max_articles() {
        let client = StubClient::new()
            .respond(ARTICLE_A, &article_page("Startup do sertão", "x"))
            .respond(ARTICLE_B, &article_page("Feira de negócios", "y"))
            .respond(ARTICLE_C, &article_page("Cooperativa", "z"))
            .respond(LISTING_URL, &listing_page());
        let scraper = PegnScraper::with_client(client).with_delay(Duration::ZERO);

        let news = scraper.fetch_latest_news(1).await;
        assert_eq!(news.len(), 1);
        assert_eq!(scraper.client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_latest_news_empty_when_listing_fails() {
        let client = StubClient::new().fail(LISTING_URL, 500);
        let scraper = PegnScraper::with_client(client).with_delay(Duration::ZERO);

        assert!(scraper.fetch_latest_news(DEFAULT_MAX_ARTICLES).await.is_empty());
        assert_eq!(scraper.client.calls(), vec![LISTING_URL]);
    }
}
