use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use scraper::{Html, Selector};

use crate::error::ScrapeError;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Starts browser sessions. One session per scraping task, never shared.
pub trait Launcher: Send + Sync + 'static {
    type Session: Page;

    fn open(&self, headless: bool) -> Result<Self::Session, ScrapeError>;
}

/// A single loaded tab. Every call blocks the calling thread.
pub trait Page: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    fn page_height(&self) -> Result<i64, ScrapeError>;

    fn scroll_to_bottom(&self) -> Result<(), ScrapeError>;

    /// Every element currently rendered that matches `selector`, in page order.
    fn listing_cards(&self, selector: &str) -> Result<Vec<Box<dyn Card>>, ScrapeError>;

    /// Waits up to `timeout` for the node at `xpath` and returns its text.
    fn wait_for_text(&self, xpath: &str, timeout: Duration) -> Result<String, ScrapeError>;

    fn close(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

/// One listing element on the results page.
///
/// `Ok(None)` means the lookup ran and found nothing; `Err` means the lookup
/// itself broke.
pub trait Card {
    fn text(&self, selector: &str) -> Result<Option<String>, ScrapeError>;

    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScrapeError>;
}

#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

impl Launcher for ChromeLauncher {
    type Session = ChromeSession;

    fn open(&self, headless: bool) -> Result<ChromeSession, ScrapeError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_USER_AGENT);
        let ua_arg = format!("--user-agent={}", user_agent);

        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&ua_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless,
            window_size: Some((1920, 1080)),
            path: self.chrome_path.clone(),
            idle_browser_timeout: Duration::from_secs(300),
            args,
            ..Default::default()
        })
        .map_err(|e| ScrapeError::Session(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        tracing::debug!(headless, "Browser session opened");
        Ok(ChromeSession {
            _browser: browser,
            tab,
        })
    }
}

/// A Chrome process and the tab it drives. Dropping it kills the process.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl Page for ChromeSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn page_height(&self) -> Result<i64, ScrapeError> {
        let height = self
            .tab
            .evaluate("document.body.scrollHeight", false)
            .map_err(|e| ScrapeError::Element(e.to_string()))?;
        height
            .value
            .as_ref()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ScrapeError::Element("page height is not a number".to_string()))
    }

    fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.tab
            .evaluate("window.scrollTo(0, document.body.scrollHeight);", false)
            .map_err(|e| ScrapeError::Element(e.to_string()))?;
        Ok(())
    }

    fn listing_cards(&self, selector: &str) -> Result<Vec<Box<dyn Card>>, ScrapeError> {
        let html = self
            .tab
            .get_content()
            .map_err(|e| ScrapeError::Element(e.to_string()))?;
        HtmlCard::all_in(&html, selector)
    }

    fn wait_for_text(&self, xpath: &str, timeout: Duration) -> Result<String, ScrapeError> {
        self.tab
            .wait_for_xpath_with_custom_timeout(xpath, timeout)
            .and_then(|element| element.get_inner_text())
            .map(|text| text.trim().to_string())
            .map_err(|e| ScrapeError::Element(e.to_string()))
    }

    fn close(self) {
        if let Err(e) = self.tab.close(false) {
            tracing::debug!("Tab close failed, dropping browser anyway: {}", e);
        }
    }
}

/// A listing element snapshotted out of the rendered page.
pub struct HtmlCard {
    fragment: Html,
}

impl HtmlCard {
    pub fn new(html: &str) -> Self {
        Self {
            fragment: Html::parse_fragment(html),
        }
    }

    /// Snapshots every element matching `selector` in `page_html`.
    pub fn all_in(page_html: &str, selector: &str) -> Result<Vec<Box<dyn Card>>, ScrapeError> {
        let document = Html::parse_document(page_html);
        let selector = parse_selector(selector)?;
        Ok(document
            .select(&selector)
            .map(|element| Box::new(HtmlCard::new(&element.html())) as Box<dyn Card>)
            .collect())
    }
}

impl Card for HtmlCard {
    fn text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        let selector = parse_selector(selector)?;
        Ok(self.fragment.select(&selector).next().map(|el| {
            el.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        }))
    }

    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScrapeError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .fragment
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr(name))
            .map(|value| value.trim().to_string()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Element(format!("invalid selector {selector:?}: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul>
            <li class="card"><h3>First   role</h3><a class="link" href="https://a.example/jobs/1">open</a></li>
            <li class="card"><h3>Second role</h3></li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn snapshots_cards_in_page_order() {
        let cards = HtmlCard::all_in(PAGE, "li.card").unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].text("h3").unwrap().as_deref(), Some("First role"));
        assert_eq!(cards[1].text("h3").unwrap().as_deref(), Some("Second role"));
    }

    #[test]
    fn missing_element_is_none_not_error() {
        let cards = HtmlCard::all_in(PAGE, "li.card").unwrap();
        assert_eq!(cards[1].attribute("a.link", "href").unwrap(), None);
        assert_eq!(
            cards[0].attribute("a.link", "href").unwrap().as_deref(),
            Some("https://a.example/jobs/1")
        );
    }

    #[test]
    fn broken_selector_is_an_error() {
        let card = HtmlCard::new("<div><p>x</p></div>");
        assert!(matches!(card.text("p[["), Err(ScrapeError::Element(_))));
    }
}
