//! Scripted stand-ins for Chrome, used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::browser::{Card, HtmlCard, Launcher, Page};
use crate::collector::selectors;
use crate::details::{QUALIFICATIONS_XPATH, RESPONSIBILITIES_XPATH};
use crate::error::ScrapeError;

pub fn card_html(id: usize, work_arrangement: &str) -> String {
    format!(
        r#"<li class="sc-4d881605-0">
             <a class="sc-4d881605-1" href="https://acme.gupy.io/jobs/{id}">Ver vaga</a>
             <h3 class="sc-4d881605-4">Data Analyst {id}</h3>
             <p class="sc-4d881605-5">Acme {id}</p>
             <div aria-label="Local de trabalho: São Paulo - SP">São Paulo - SP</div>
             <p class="sc-d9e69618-0">Publicada em: 10/10/2026</p>
             <div aria-label="Modelo de trabalho: {work_arrangement}"><span>{work_arrangement}</span></div>
             <div aria-label="Essa vaga é do tipo Efetivo"><span>Efetivo</span></div>
           </li>"#
    )
}

pub fn job_link(id: usize) -> String {
    format!("https://acme.gupy.io/jobs/{id}")
}

#[derive(Clone)]
pub struct ScriptedCard {
    html: String,
    broken_selector: Option<&'static str>,
}

impl ScriptedCard {
    pub fn listing(id: usize) -> Self {
        Self::with_arrangement(id, "Presencial")
    }

    pub fn with_arrangement(id: usize, work_arrangement: &str) -> Self {
        Self {
            html: card_html(id, work_arrangement),
            broken_selector: None,
        }
    }

    pub fn raw(html: &str) -> Self {
        Self {
            html: html.to_string(),
            broken_selector: None,
        }
    }

    /// A card whose work-arrangement lookup blows up.
    pub fn broken(id: usize) -> Self {
        Self {
            html: card_html(id, "Presencial"),
            broken_selector: Some(selectors::WORK_ARRANGEMENT),
        }
    }
}

struct LiveCard {
    inner: HtmlCard,
    broken_selector: Option<&'static str>,
}

impl LiveCard {
    fn check(&self, selector: &str) -> Result<(), ScrapeError> {
        match self.broken_selector {
            Some(broken) if broken == selector => {
                Err(ScrapeError::Element("stale element reference".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl Card for LiveCard {
    fn text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        self.check(selector)?;
        self.inner.text(selector)
    }

    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScrapeError> {
        self.check(selector)?;
        self.inner.attribute(selector, name)
    }
}

#[derive(Clone, Default)]
pub struct DetailScript {
    pub responsibilities: Option<String>,
    pub qualifications: Option<String>,
    pub delay: Duration,
    pub fail_navigation: bool,
    pub panic: bool,
}

impl DetailScript {
    pub fn full(id: usize) -> Self {
        Self {
            responsibilities: Some(format!("Build dashboards {id}")),
            qualifications: Some(format!("SQL and Python {id}")),
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct Script {
    /// Each scroll reveals the next batch of cards.
    rounds: Vec<Vec<ScriptedCard>>,
    /// Height grows on every scroll even when nothing new renders.
    endless: bool,
    fail_results_navigation: bool,
    details: HashMap<String, DetailScript>,
}

/// Launches [`ScriptedPage`]s and counts how many were opened and closed.
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    script: Arc<Script>,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    pub fn new(rounds: Vec<Vec<ScriptedCard>>) -> Self {
        let details = rounds
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, _)| (job_link(i + 1), DetailScript::full(i + 1)))
            .collect();
        Self {
            script: Arc::new(Script {
                rounds,
                details,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn with_details(mut self, details: HashMap<String, DetailScript>) -> Self {
        self.script_mut().details = details;
        self
    }

    pub fn endless(mut self) -> Self {
        self.script_mut().endless = true;
        self
    }

    pub fn failing_results_navigation(mut self) -> Self {
        self.script_mut().fail_results_navigation = true;
        self
    }

    pub fn failing_to_open() -> Self {
        Self {
            fail_open: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn page(&self) -> ScriptedPage {
        self.opened.fetch_add(1, Ordering::SeqCst);
        ScriptedPage {
            script: Arc::clone(&self.script),
            round: AtomicUsize::new(0),
            scrolls: AtomicUsize::new(0),
            url: Mutex::new(None),
            closed: Arc::clone(&self.closed),
        }
    }

    fn script_mut(&mut self) -> &mut Script {
        Arc::get_mut(&mut self.script).expect("script is configured before launching")
    }
}

impl Launcher for ScriptedLauncher {
    type Session = ScriptedPage;

    fn open(&self, _headless: bool) -> Result<ScriptedPage, ScrapeError> {
        if self.fail_open {
            return Err(ScrapeError::Session("chromedriver not found".to_string()));
        }
        Ok(self.page())
    }
}

pub struct ScriptedPage {
    script: Arc<Script>,
    round: AtomicUsize,
    scrolls: AtomicUsize,
    url: Mutex<Option<String>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedPage {
    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> Option<String> {
        self.url.lock().unwrap().clone()
    }

    fn detail(&self) -> DetailScript {
        self.url()
            .and_then(|url| self.script.details.get(&url).cloned())
            .unwrap_or_default()
    }
}

impl Drop for ScriptedPage {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Page for ScriptedPage {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        *self.url.lock().unwrap() = Some(url.to_string());
        let failing = if url.contains("/job-search/") {
            self.script.fail_results_navigation
        } else {
            let detail = self.detail();
            if detail.panic {
                panic!("renderer crashed while loading {url}");
            }
            detail.fail_navigation
        };
        if failing {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        Ok(())
    }

    fn page_height(&self) -> Result<i64, ScrapeError> {
        let step = if self.script.endless {
            self.scrolls.load(Ordering::SeqCst)
        } else {
            self.round.load(Ordering::SeqCst)
        };
        Ok(1000 * (step as i64 + 1))
    }

    fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        let last = self.script.rounds.len().saturating_sub(1);
        let next = (self.round.load(Ordering::SeqCst) + 1).min(last);
        self.round.store(next, Ordering::SeqCst);
        Ok(())
    }

    fn listing_cards(&self, _selector: &str) -> Result<Vec<Box<dyn Card>>, ScrapeError> {
        let round = self.round.load(Ordering::SeqCst);
        Ok(self
            .script
            .rounds
            .iter()
            .take(round + 1)
            .flatten()
            .map(|card| {
                Box::new(LiveCard {
                    inner: HtmlCard::new(&card.html),
                    broken_selector: card.broken_selector,
                }) as Box<dyn Card>
            })
            .collect())
    }

    fn wait_for_text(&self, xpath: &str, _timeout: Duration) -> Result<String, ScrapeError> {
        let detail = self.detail();
        std::thread::sleep(detail.delay);
        let text = if xpath == RESPONSIBILITIES_XPATH {
            detail.responsibilities
        } else if xpath == QUALIFICATIONS_XPATH {
            detail.qualifications
        } else {
            None
        };
        text.ok_or_else(|| ScrapeError::Element(format!("timed out waiting for {xpath}")))
    }
}
