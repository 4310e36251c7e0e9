use std::collections::HashSet;

use crate::browser::{Card, Page};
use crate::config::ScrapeOptions;
use crate::error::ScrapeError;
use crate::model::{JobListing, RunStats, NOT_INFORMED};

/// Portal markup the collector relies on. A markup change degrades the
/// affected fields to the placeholder.
pub mod selectors {
    pub const CARD: &str = ".sc-4d881605-0";
    pub const TITLE: &str = "h3.sc-4d881605-4";
    pub const COMPANY: &str = "p.sc-4d881605-5";
    pub const LOCATION: &str = "div[aria-label*='Local']";
    pub const PUBLISHED_AT: &str = "p.sc-d9e69618-0";
    pub const WORK_ARRANGEMENT: &str = "div[aria-label*='Modelo de trabalho'] span";
    pub const EMPLOYMENT_TYPE: &str = "div[aria-label*='Essa vaga é do tipo'] span";
    pub const LINK: &str = "a.sc-4d881605-1";
}

const PUBLISHED_PREFIX: &str = "Publicada em:";

#[derive(Debug, Default)]
pub struct Collected {
    pub listings: Vec<JobListing>,
    pub stats: RunStats,
}

/// Search results page for `term`. Spaces become `%20`, not `+`.
pub fn search_url(portal_url: &str, term: &str) -> String {
    format!(
        "{}/job-search/term={}",
        portal_url.trim_end_matches('/'),
        urlencoding::encode(term.trim())
    )
}

/// Loads the results page for `term` and reads up to `max_count` listings,
/// scrolling to trigger lazy loading until enough are rendered or the page
/// stops growing.
///
/// Only navigation failures are returned as errors; a broken listing is
/// skipped and counted in the returned stats.
pub fn collect<P: Page + ?Sized>(
    page: &P,
    term: &str,
    max_count: usize,
    options: &ScrapeOptions,
) -> Result<Collected, ScrapeError> {
    let url = search_url(&options.portal_url, term);
    tracing::info!(term, max_count, "Loading search results: {}", url);
    page.navigate(&url)?;
    std::thread::sleep(options.settle_delay);

    let mut collected = Collected::default();
    if max_count == 0 {
        return Ok(collected);
    }

    let mut seen_links = HashSet::new();
    let mut visited = 0;
    let mut scrolls = 0;

    let mut last_height = match page.page_height() {
        Ok(height) => Some(height),
        Err(e) => {
            tracing::warn!("Could not measure results page, reading once: {}", e);
            None
        }
    };

    loop {
        let cards = match page.listing_cards(selectors::CARD) {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!("Listing query failed, keeping what was read: {}", e);
                break;
            }
        };

        for card in cards.iter().skip(visited) {
            if collected.listings.len() >= max_count {
                break;
            }
            visited += 1;

            let mut missing = 0;
            match read_listing(card.as_ref(), &options.portal_url, &mut missing) {
                Ok(listing) if seen_links.insert(listing.link.clone()) => {
                    collected.stats.missing_fields += missing;
                    collected.listings.push(listing);
                }
                Ok(listing) => {
                    tracing::debug!(link = %listing.link, "Duplicate listing ignored");
                }
                Err(e) => {
                    collected.stats.skipped_listings += 1;
                    tracing::warn!(position = visited, "Skipping listing: {}", e);
                }
            }
        }

        if collected.listings.len() >= max_count {
            break;
        }
        let Some(previous_height) = last_height else {
            break;
        };
        if scrolls >= options.max_scroll_rounds {
            tracing::warn!(
                scrolls,
                "Scroll limit reached with {} of {} listings",
                collected.listings.len(),
                max_count
            );
            break;
        }

        if let Err(e) = page.scroll_to_bottom() {
            tracing::warn!("Scroll failed, keeping what was read: {}", e);
            break;
        }
        scrolls += 1;
        std::thread::sleep(options.settle_delay);

        let new_height = match page.page_height() {
            Ok(height) => height,
            Err(e) => {
                tracing::warn!("Could not measure results page: {}", e);
                break;
            }
        };
        if new_height == previous_height {
            tracing::debug!(scrolls, "Page stopped growing");
            break;
        }
        last_height = Some(new_height);
    }

    tracing::info!(
        term,
        collected = collected.listings.len(),
        skipped = collected.stats.skipped_listings,
        "Search results read"
    );
    Ok(collected)
}

/// Reads one card. Missing fields become the placeholder; a lookup that
/// fails outright, or a card without a link, is an error.
fn read_listing(
    card: &dyn Card,
    portal_url: &str,
    missing: &mut usize,
) -> Result<JobListing, ScrapeError> {
    let link = card
        .attribute(selectors::LINK, "href")?
        .filter(|href| !href.is_empty())
        .ok_or_else(|| ScrapeError::Element("listing has no link".to_string()))?;

    let mut field = |name: &'static str, selector: &str| -> Result<String, ScrapeError> {
        match card.text(selector)? {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                *missing += 1;
                tracing::debug!(field = name, "Field not found on listing");
                Ok(NOT_INFORMED.to_string())
            }
        }
    };

    let mut listing = JobListing::new(absolute_link(portal_url, &link));
    listing.title = field("title", selectors::TITLE)?;
    listing.company = field("company", selectors::COMPANY)?;
    listing.location = field("location", selectors::LOCATION)?;
    listing.published_at = field("published_at", selectors::PUBLISHED_AT)?
        .trim_start_matches(PUBLISHED_PREFIX)
        .trim()
        .to_string();
    listing.work_arrangement = field("work_arrangement", selectors::WORK_ARRANGEMENT)?;
    listing.employment_type = field("employment_type", selectors::EMPLOYMENT_TYPE)?;
    listing.apply_remote_override();

    Ok(listing)
}

fn absolute_link(portal_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", portal_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
