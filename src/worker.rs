use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::browser::{Launcher, Page};
use crate::collector::{collect, Collected};
use crate::config::ScrapeOptions;
use crate::details::fetch_details;
use crate::error::ScrapeError;
use crate::model::{JobListing, RunStats, NOT_INFORMED};

/// Fields filled from a listing's detail page.
const DETAIL_FIELDS: usize = 2;

/// Listings of one search, in results-page order, with detail fields merged.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub listings: Vec<JobListing>,
    pub stats: RunStats,
}

/// Runs one search end to end: reads the results page in a single session,
/// then fetches every listing's detail page on a bounded pool of blocking
/// workers, each with its own browser.
///
/// Detail results are merged by submission index, so the output order is the
/// results-page order no matter which fetch finishes first. A failed or
/// panicking detail fetch leaves placeholders in its own row only.
pub async fn run<L: Launcher>(
    launcher: Arc<L>,
    term: &str,
    max_count: usize,
    options: &ScrapeOptions,
) -> Result<ScrapeOutcome, ScrapeError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(ScrapeError::InvalidInput("search term is empty".to_string()));
    }
    if max_count == 0 {
        return Err(ScrapeError::InvalidInput(
            "max_count must be at least 1".to_string(),
        ));
    }

    tracing::info!(term, max_count, headless = options.headless, "Search started");

    // 1. Results page
    let Collected {
        mut listings,
        mut stats,
    } = {
        let launcher = Arc::clone(&launcher);
        let term = term.to_string();
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            let session = launcher.open(options.headless)?;
            let collected = collect(&session, &term, max_count, &options);
            session.close();
            collected
        })
        .await
        .map_err(|e| ScrapeError::Session(format!("results page task aborted: {e}")))??
    };

    // 2. Detail pages
    let semaphore = Arc::new(Semaphore::new(options.worker_count.max(1)));
    let mut handles = Vec::with_capacity(listings.len());

    for (index, listing) in listings.iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;
        let launcher = Arc::clone(&launcher);
        let link = listing.link.clone();
        let options = options.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            tracing::debug!(index, link = %link, "Fetching details");
            fetch_details(launcher.as_ref(), &link, &options)
        }));
    }

    // 3. Merge by index
    for (index, (listing, handle)) in listings.iter_mut().zip(handles).enumerate() {
        match handle.await {
            Ok(Ok(details)) => {
                stats.missing_fields += [&details.responsibilities, &details.qualifications]
                    .into_iter()
                    .filter(|text| text.as_str() == NOT_INFORMED)
                    .count();
                listing.apply_details(details);
            }
            Ok(Err(e)) => {
                stats.failed_details += 1;
                stats.missing_fields += DETAIL_FIELDS;
                tracing::warn!(index, link = %listing.link, "Detail fetch failed: {}", e);
            }
            Err(e) => {
                stats.failed_details += 1;
                stats.missing_fields += DETAIL_FIELDS;
                tracing::error!(index, link = %listing.link, "Detail fetch aborted: {}", e);
            }
        }
    }

    tracing::info!(
        term,
        listings = listings.len(),
        skipped = stats.skipped_listings,
        failed_details = stats.failed_details,
        "Search completed"
    );

    Ok(ScrapeOutcome { listings, stats })
}
