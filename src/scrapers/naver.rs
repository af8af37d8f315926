//! Naver News IT/science section scraper.
//!
//! The section page lists stories in `div.sa_text` blocks. Each block carries
//! an anchor pointing at `n.news.naver.com/mnews/article/<office>/<id>` and a
//! `strong.sa_text_strong` headline. Article pages keep their body in
//! `article#dic_area`.
//!
//! Extraction never fails: markup that does not match yields no links or an
//! empty body. Only the network calls return errors.

use crate::error::FetchError;
use crate::fetch::PageSource;
use crate::models::NewsLink;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Headline used when the title element is present but empty.
pub const UNTITLED: &str = "제목 없음";

static CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.sa_text").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("strong.sa_text_strong").expect("static selector"));
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article#dic_area").expect("static selector"));
static ARTICLE_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|n\.news\.naver\.com)/mnews/article/\d+/\d+").expect("static regex")
});

/// Concatenate an element's text nodes, trimming each. Inline markup such
/// as `<b>신</b>제품` stays one word.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).join("")
}

/// Resolve an article href against the site origin.
///
/// Hrefs that already carry a scheme are returned untouched.
pub fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    match Url::parse(origin).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!("{}{}", origin.trim_end_matches('/'), href),
    }
}

/// Pull up to `max` unique article links out of the listing page HTML.
///
/// Containers missing either the article anchor or the headline are skipped.
/// The first occurrence of a URL wins and document order is kept. Duplicates
/// are dropped before the cap is applied.
///
/// # Arguments
///
/// * `html` - Raw section page markup
/// * `origin` - Site origin used to resolve relative hrefs
/// * `max` - Maximum number of links to return
///
/// # Returns
///
/// At most `max` links. Malformed or unrelated markup yields an empty list,
/// never an error.
pub fn extract_links(html: &str, origin: &str, max: usize) -> Vec<NewsLink> {
    let document = Html::parse_document(html);

    let links = document
        .select(&CONTAINER)
        .filter_map(|container| {
            let href = container
                .select(&ANCHOR)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| ARTICLE_HREF.is_match(href))?;
            let title_el = container.select(&TITLE).next()?;

            let url = absolutize(href, origin);
            let title = match element_text(title_el) {
                t if t.is_empty() => UNTITLED.to_string(),
                t => t,
            };
            debug!(%url, %title, "Found article link");
            Some(NewsLink { title, url })
        })
        .unique_by(|link| link.url.clone())
        .take(max)
        .collect::<Vec<_>>();

    debug!(count = links.len(), "Extracted listing links");
    links
}

/// Return the trimmed text of the article body container, or `""` when the
/// page has none.
pub fn extract_article_body(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&BODY)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Fetch the section page and extract its article links.
#[instrument(level = "info", skip(source))]
pub async fn index_articles<S: PageSource>(
    source: &S,
    listing_url: &str,
    origin: &str,
    max: usize,
) -> Result<Vec<NewsLink>, FetchError> {
    let html = source.fetch(listing_url).await?;
    let links = extract_links(&html, origin, max);
    info!(count = links.len(), source = listing_url, "Indexed Naver article links");
    debug!(urls = ?links.iter().map(|l| &l.url).collect::<Vec<_>>(), "Naver URLs");
    Ok(links)
}

/// Fetch a single article and return its body text.
#[instrument(level = "info", skip(source))]
pub async fn fetch_article<S: PageSource>(source: &S, url: &str) -> Result<String, FetchError> {
    let html = source.fetch(url).await?;
    let body = extract_article_body(&html);
    info!(chars = body.chars().count(), "Parsed Naver article");
    debug!(preview = %truncate_for_log(&body, 80), "Article body");
    Ok(body)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::config::DEFAULT_ORIGIN;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn n_containers(n: u32) -> Vec<String> {
        (1..=n)
            .map(|i| container(&article_url(1, i), &format!("기사 {i}")))
            .collect()
    }

    #[test]
    fn test_output_length_is_min_of_n_and_five() {
        for n in [0u32, 3, 5, 8] {
            let html = listing(&n_containers(n));
            let links = extract_links(&html, DEFAULT_ORIGIN, 5);
            assert_eq!(links.len(), (n as usize).min(5), "n = {n}");
        }
    }

    #[test]
    fn test_document_order_is_preserved() {
        let html = listing(&n_containers(7));
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        let titles: Vec<_> = links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["기사 1", "기사 2", "기사 3", "기사 4", "기사 5"]);
    }

    #[test]
    fn test_missing_anchor_or_title_contributes_nothing() {
        let html = listing(&[
            // No title element.
            format!(
                r#"<div class="sa_text"><a href="{}">no strong</a></div>"#,
                article_url(1, 1)
            ),
            // No anchor at all.
            r#"<div class="sa_text"><strong class="sa_text_strong">orphan</strong></div>"#
                .to_string(),
            // Anchor that is not an article link.
            container("https://news.naver.com/section/105", "section"),
            container(&article_url(2, 2), "kept"),
        ]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(
            links,
            vec![NewsLink {
                title: "kept".into(),
                url: article_url(2, 2)
            }]
        );
    }

    #[test]
    fn test_relative_href_gets_origin_prefix() {
        let html = listing(&[container("/mnews/article/001/0000000042", "relative")]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(
            links[0].url,
            "https://news.naver.com/mnews/article/001/0000000042"
        );
    }

    #[test]
    fn test_absolute_href_passes_through_unchanged() {
        let href = "https://n.news.naver.com/mnews/article/015/0005012345?sid=105";
        let html = listing(&[container(href, "absolute")]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(links[0].url, href);
    }

    #[test]
    fn test_duplicate_hrefs_keep_first_occurrence() {
        let url = article_url(9, 9);
        let html = listing(&[
            container(&url, "first"),
            container(&article_url(1, 1), "other"),
            container(&url, "second"),
        ]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "first");
        let unique: HashSet<_> = links.iter().map(|l| &l.url).collect();
        assert_eq!(unique.len(), links.len());
    }

    #[test]
    fn test_duplicates_do_not_count_against_cap() {
        let dup = article_url(1, 1);
        let mut containers = vec![container(&dup, "a"), container(&dup, "a again")];
        containers.extend((2..=6).map(|i| container(&article_url(1, i), "x")));
        let links = extract_links(&listing(&containers), DEFAULT_ORIGIN, 5);
        assert_eq!(links.len(), 5);
        assert_eq!(links[1].url, article_url(1, 2));
    }

    #[test]
    fn test_blank_title_uses_placeholder() {
        let html = listing(&[container(&article_url(1, 1), "   ")]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(links[0].title, UNTITLED);
    }

    #[test]
    fn test_title_is_trimmed() {
        let html = listing(&[container(&article_url(1, 1), "\n   삼성전자 신제품 공개  \n")]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(links[0].title, "삼성전자 신제품 공개");
    }

    #[test]
    fn test_garbage_html_yields_empty_list() {
        assert!(extract_links("<<<not html", DEFAULT_ORIGIN, 5).is_empty());
        assert!(extract_links("", DEFAULT_ORIGIN, 5).is_empty());
    }

    #[test]
    fn test_article_body_is_trimmed_text() {
        let html = article_page("  <p>첫 문장.</p>\n<p>  둘째 문장. </p>  ");
        assert_eq!(extract_article_body(&html), "첫 문장.둘째 문장.");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let html = listing(&[container(&article_url(1, 1), "<b>신</b>제품 <em>공개</em>")]);
        let links = extract_links(&html, DEFAULT_ORIGIN, 5);
        assert_eq!(links[0].title, "신제품공개");

        let body = extract_article_body(&article_page("<p>반도체 <b>수출</b>이 늘었다.</p>"));
        assert_eq!(body, "반도체수출이 늘었다.");
    }

    #[test]
    fn test_article_body_absent_is_empty() {
        let html = "<html><body><div id=\"other\">nothing</div></body></html>";
        assert_eq!(extract_article_body(html), "");
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("/mnews/article/1/2", "https://news.naver.com"),
            "https://news.naver.com/mnews/article/1/2"
        );
        assert_eq!(
            absolutize("//n.news.naver.com/mnews/article/1/2", "https://news.naver.com"),
            "https://n.news.naver.com/mnews/article/1/2"
        );
        assert_eq!(
            absolutize("http://example.com/a", "https://news.naver.com"),
            "http://example.com/a"
        );
    }

    #[tokio::test]
    async fn test_index_and_fetch_against_server() {
        let mut server = mockito::Server::new_async().await;
        let listing_html = listing(&n_containers(3));
        let _listing = server
            .mock("GET", "/section/105")
            .with_status(200)
            .with_body(listing_html)
            .create_async()
            .await;
        let _article = server
            .mock("GET", "/article")
            .with_status(200)
            .with_body(article_page("<p>본문 내용</p>"))
            .create_async()
            .await;
        let _no_body = server
            .mock("GET", "/nobody")
            .with_status(200)
            .with_body("<html><body>moved</body></html>")
            .create_async()
            .await;

        let fetcher =
            crate::fetch::Fetcher::from_config(&crate::config::FetchConfig::default()).unwrap();
        let links = index_articles(
            &fetcher,
            &format!("{}/section/105", server.url()),
            DEFAULT_ORIGIN,
            5,
        )
        .await
        .unwrap();
        assert_eq!(links.len(), 3);

        let body = fetch_article(&fetcher, &format!("{}/article", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "본문 내용");

        let empty = fetch_article(&fetcher, &format!("{}/nobody", server.url()))
            .await
            .unwrap();
        assert_eq!(empty, "");
    }
}
