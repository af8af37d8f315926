//! Terminal presentation: an eager list of every article, or a selector that
//! fetches and summarizes only the chosen one.
//!
//! Rendering goes to any `io::Write` so both modes can be driven in tests;
//! spinners draw on stderr and hide themselves when it is not a terminal.
//! Select mode blocks on the prompt, so it needs the multi-threaded runtime.

use crate::fetch::PageSource;
use crate::models::{ArticleDigest, Digest, NewsLink, Notice, NoticeLevel};
use crate::pipeline::Pipeline;
use crate::summarizer::SummaryModel;
use chrono::Local;
use console::style;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::pin::pin;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SPIN_LISTING: &str = "뉴스 목록을 가져오는 중...";
const SPIN_ARTICLE: &str = "기사를 요약하는 중...";

/// Run `fut` while a spinner with `message` ticks on stderr.
pub async fn with_spinner<F: Future>(message: &str, fut: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(sty) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(sty);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    let out = fut.await;
    spinner.finish_and_clear();
    out
}

fn write_notice(out: &mut impl Write, notice: &Notice) -> io::Result<()> {
    match notice.level {
        NoticeLevel::Warning => writeln!(
            out,
            "  {} {}",
            style("⚠").yellow(),
            style(&notice.message).yellow()
        ),
        NoticeLevel::Error => writeln!(
            out,
            "  {} {}",
            style("✗").red(),
            style(&notice.message).red()
        ),
    }
}

pub fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", style("📰 IT 뉴스 요약기").bold())?;
    writeln!(
        out,
        "{}",
        style("네이버 IT/과학 뉴스를 자동으로 가져와 AI로 요약합니다.").dim()
    )?;
    writeln!(out)
}

/// Render one article panel: headline, original link, then the summary or
/// whatever went wrong.
pub fn write_article(out: &mut impl Write, digest: &ArticleDigest) -> io::Result<()> {
    writeln!(out, "{} {}", style("🗞️").bold(), style(&digest.title).bold())?;
    writeln!(out, "  원문 읽기: {}", style(&digest.url).cyan().underlined())?;
    for notice in &digest.notices {
        write_notice(out, notice)?;
    }
    if let Some(summary) = &digest.summary {
        writeln!(out, "  {}", style("요약").bold().green())?;
        writeln!(out, "  {summary}")?;
    }
    writeln!(out)
}

/// Fetch the listing and summarize every article, one after another.
///
/// Each panel is written and flushed as soon as its article is done, before
/// the next article is fetched.
///
/// # Arguments
///
/// * `pipeline` - Fetcher, scraper and summarizer to drive.
/// * `out` - Destination for the rendered panels.
///
/// # Returns
///
/// The [`Digest`] of the run, suitable for [`crate::outputs::json::write_digest`].
#[instrument(level = "info", skip_all)]
pub async fn run_eager<S: PageSource, M: SummaryModel>(
    pipeline: &Pipeline<S, M>,
    out: &mut impl Write,
) -> io::Result<Digest> {
    write_header(out)?;

    let (links, notices) = with_spinner(SPIN_LISTING, pipeline.load_listing()).await;
    for notice in &notices {
        write_notice(out, notice)?;
    }
    out.flush()?;

    let now = Local::now();
    let mut digest = Digest {
        local_date: now.date_naive().to_string(),
        local_time: now.time().format("%H:%M:%S").to_string(),
        source_url: pipeline.listing_url().to_string(),
        articles: Vec::with_capacity(links.len()),
        notices,
    };

    let mut articles = pin!(
        stream::iter(links.iter())
            .then(|link| with_spinner(SPIN_ARTICLE, pipeline.digest_article(link)))
    );
    while let Some(article) = articles.next().await {
        write_article(out, &article)?;
        out.flush()?;
        digest.articles.push(article);
    }

    let summarized = digest.articles.iter().filter(|a| a.summary.is_some()).count();
    info!(
        total = digest.articles.len(),
        summarized,
        "Eager run complete"
    );
    Ok(digest)
}

/// Source of the user's pick in select mode.
pub trait Chooser {
    /// Return the index of the chosen title, or `None` to quit.
    fn choose(&mut self, titles: &[String]) -> io::Result<Option<usize>>;
}

/// Interactive single-choice prompt on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalChooser;

impl Chooser for TerminalChooser {
    fn choose(&mut self, titles: &[String]) -> io::Result<Option<usize>> {
        let mut items: Vec<&str> = titles.iter().map(String::as_str).collect();
        items.push("종료");
        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("요약할 기사를 선택하세요")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(picked.filter(|&i| i < titles.len()))
    }
}

/// Fetch the listing once, then summarize whatever the user picks until they
/// quit. A failed pick only affects that pick.
///
/// The prompt is not shown again until the current article has finished, so
/// there is never more than one request in flight. The chooser runs under
/// `block_in_place` so a waiting prompt does not hold a runtime worker.
#[instrument(level = "info", skip_all)]
pub async fn run_select<S: PageSource, M: SummaryModel>(
    pipeline: &Pipeline<S, M>,
    chooser: &mut impl Chooser,
    out: &mut impl Write,
) -> io::Result<Vec<ArticleDigest>> {
    write_header(out)?;

    let (links, notices) = with_spinner(SPIN_LISTING, pipeline.load_listing()).await;
    for notice in &notices {
        write_notice(out, notice)?;
    }
    out.flush()?;
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let titles: Vec<String> = links.iter().map(|l: &NewsLink| l.title.clone()).collect();
    let mut shown = Vec::new();
    while let Some(index) = tokio::task::block_in_place(|| chooser.choose(&titles))? {
        let Some(link) = links.get(index) else {
            continue;
        };
        debug!(index, url = %link.url, "Article selected");
        let digest = with_spinner(SPIN_ARTICLE, pipeline.digest_article(link)).await;
        write_article(out, &digest)?;
        out.flush()?;
        shown.push(digest);
    }
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::config::{AppConfig, DEFAULT_LISTING_URL};
    use crate::pipeline::testing::StaticPages;
    use crate::pipeline::{MSG_NO_BODY, MSG_NO_NEWS};
    use crate::scrapers::naver::fixtures::*;
    use crate::summarizer::mock::{EchoModel, summarizer};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct Scripted(VecDeque<Option<usize>>);

    impl Chooser for Scripted {
        fn choose(&mut self, _titles: &[String]) -> io::Result<Option<usize>> {
            Ok(self.0.pop_front().flatten())
        }
    }

    fn pipeline(pages: StaticPages) -> Pipeline<StaticPages, EchoModel> {
        let cache = ResponseCache::disabled();
        let (summarizer, _) = summarizer(cache.clone());
        Pipeline::new(pages, summarizer, cache, &AppConfig::default())
    }

    fn three_articles() -> StaticPages {
        StaticPages::default()
            .with_page(
                DEFAULT_LISTING_URL,
                listing(&[
                    container(&article_url(3, 1), "하나"),
                    container(&article_url(3, 2), "둘"),
                    container(&article_url(3, 3), "셋"),
                ]),
            )
            .with_status(&article_url(3, 1), 502)
            .with_page(&article_url(3, 2), article_page("<p>둘째 기사 본문 텍스트</p>"))
            .with_page(&article_url(3, 3), article_page("<p>셋째 기사 본문 텍스트</p>"))
    }

    fn rendered(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_article_with_summary() {
        let digest = ArticleDigest {
            title: "제목".into(),
            url: "https://n.news.naver.com/mnews/article/1/2".into(),
            summary: Some("요약문".into()),
            notices: vec![],
        };
        let mut buf = Vec::new();
        write_article(&mut buf, &digest).unwrap();
        let text = rendered(buf);
        assert!(text.contains("제목"));
        assert!(text.contains("https://n.news.naver.com/mnews/article/1/2"));
        assert!(text.contains("원문 읽기"));
        assert!(text.contains("요약문"));
    }

    #[test]
    fn test_write_article_with_notices_only() {
        let digest = ArticleDigest {
            title: "제목".into(),
            url: "u".into(),
            summary: None,
            notices: vec![Notice::error("Failed: timeout"), Notice::warning(MSG_NO_BODY)],
        };
        let mut buf = Vec::new();
        write_article(&mut buf, &digest).unwrap();
        let text = rendered(buf);
        assert!(text.contains("Failed: timeout"));
        assert!(text.contains(MSG_NO_BODY));
        assert!(!text.contains("요약"));
    }

    #[tokio::test]
    async fn test_eager_run_covers_every_link() {
        let pipeline = pipeline(three_articles());
        let mut buf = Vec::new();
        let digest = run_eager(&pipeline, &mut buf).await.unwrap();

        assert_eq!(digest.articles.len(), 3);
        assert!(digest.articles[0].summary.is_none());
        assert!(digest.articles[1].summary.is_some());
        assert!(digest.articles[2].summary.is_some());
        assert_eq!(digest.source_url, DEFAULT_LISTING_URL);

        let text = rendered(buf);
        assert!(text.contains("HTTP 502"));
        assert!(text.contains("하나") && text.contains("둘") && text.contains("셋"));
    }

    /// Records the buffer length and the number of page requests at every
    /// flush.
    struct FlushLog {
        buf: Vec<u8>,
        requests: Arc<Mutex<Vec<String>>>,
        flushes: Vec<(String, usize)>,
    }

    impl Write for FlushLog {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.write(data)
        }

        fn flush(&mut self) -> io::Result<()> {
            let seen = self.requests.lock().unwrap().len();
            self.flushes
                .push((String::from_utf8_lossy(&self.buf).into_owned(), seen));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_eager_panel_is_flushed_before_next_fetch() {
        let pages = three_articles();
        let requests = pages.request_log();
        let pipeline = pipeline(pages);
        let mut out = FlushLog {
            buf: Vec::new(),
            requests,
            flushes: Vec::new(),
        };
        run_eager(&pipeline, &mut out).await.unwrap();

        let (first_panel, requested) = out
            .flushes
            .iter()
            .find(|(text, _)| text.contains("하나"))
            .unwrap();
        // Listing plus the first article only.
        assert_eq!(*requested, 2);
        assert!(!first_panel.contains("둘"));
        assert!(first_panel.contains("HTTP 502"));
        assert_eq!(out.flushes.last().unwrap().1, 4);
    }

    /// Answers only after a task spawned from inside the prompt has run, which
    /// cannot happen if the prompt occupies the single runtime worker.
    struct NeedsFreeWorker {
        asked: bool,
    }

    impl Chooser for NeedsFreeWorker {
        fn choose(&mut self, _titles: &[String]) -> io::Result<Option<usize>> {
            if self.asked {
                return Ok(None);
            }
            self.asked = true;
            let (tx, rx) = std::sync::mpsc::channel();
            tokio::runtime::Handle::current().spawn(async move {
                let _ = tx.send(());
            });
            rx.recv_timeout(Duration::from_secs(5))
                .map_err(|e| io::Error::other(e.to_string()))?;
            Ok(Some(1))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_prompt_does_not_hold_runtime_worker() {
        // Spawned so the session runs on the only worker thread.
        let shown = tokio::spawn(async move {
            let pipeline = pipeline(three_articles());
            let mut chooser = NeedsFreeWorker { asked: false };
            let mut buf = Vec::new();
            run_select(&pipeline, &mut chooser, &mut buf).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "둘");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_select_recovers_after_failed_pick() {
        let pipeline = pipeline(three_articles());
        let mut chooser = Scripted(VecDeque::from([Some(0), Some(2), Some(1), None]));
        let mut buf = Vec::new();
        let shown = run_select(&pipeline, &mut chooser, &mut buf).await.unwrap();

        assert_eq!(shown.len(), 3);
        assert_eq!(shown[0].title, "하나");
        assert!(shown[0].summary.is_none());
        assert!(shown[0].notices.contains(&Notice::warning(MSG_NO_BODY)));
        assert_eq!(shown[1].title, "셋");
        assert!(shown[1].summary.is_some());
        assert_eq!(shown[2].title, "둘");
        assert!(shown[2].summary.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_select_only_fetches_chosen_article() {
        let pipeline = pipeline(three_articles());
        let mut chooser = Scripted(VecDeque::from([Some(1), None]));
        let mut buf = Vec::new();
        run_select(&pipeline, &mut chooser, &mut buf).await.unwrap();
        let text = rendered(buf);
        assert!(text.contains("둘"));
        assert!(!text.contains("HTTP 502"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_select_with_empty_listing_never_prompts() {
        let pages = StaticPages::default().with_page(DEFAULT_LISTING_URL, "<html></html>");
        let pipeline = pipeline(pages);
        let mut chooser = Scripted(VecDeque::from([Some(99)]));
        let mut buf = Vec::new();
        let shown = run_select(&pipeline, &mut chooser, &mut buf).await.unwrap();
        assert!(shown.is_empty());
        assert!(rendered(buf).contains(MSG_NO_NEWS));
        assert_eq!(chooser.0.len(), 1);
    }
}
