use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder stored whenever a field could not be extracted.
pub const NOT_INFORMED: &str = "Not informed";

/// Location forced onto listings whose work arrangement is remote.
pub const REMOTE_LOCATION: &str = "Remote";

const LOCATION_SEPARATOR: char = '-';

/// One job posting, identified by its permalink.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    /// Raw "City - Region" string as shown on the results page.
    pub location: String,
    /// Free text, e.g. "17/10/2026".
    pub published_at: String,
    pub work_arrangement: String,
    pub employment_type: String,
    pub link: String,
    pub responsibilities: String,
    pub qualifications: String,
}

impl JobListing {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            title: NOT_INFORMED.to_string(),
            company: NOT_INFORMED.to_string(),
            location: NOT_INFORMED.to_string(),
            published_at: NOT_INFORMED.to_string(),
            work_arrangement: NOT_INFORMED.to_string(),
            employment_type: NOT_INFORMED.to_string(),
            link: link.into(),
            responsibilities: NOT_INFORMED.to_string(),
            qualifications: NOT_INFORMED.to_string(),
        }
    }

    /// Forces the location to [`REMOTE_LOCATION`] for remote postings.
    pub fn apply_remote_override(&mut self) {
        if is_remote(&self.work_arrangement) {
            self.location = REMOTE_LOCATION.to_string();
        }
    }

    pub fn apply_details(&mut self, details: JobDetails) {
        self.responsibilities = details.responsibilities;
        self.qualifications = details.qualifications;
    }
}

/// Long-form text read from a listing's own page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub responsibilities: String,
    pub qualifications: String,
}

impl Default for JobDetails {
    fn default() -> Self {
        Self {
            responsibilities: NOT_INFORMED.to_string(),
            qualifications: NOT_INFORMED.to_string(),
        }
    }
}

/// Counters that tell a best-effort run apart from a clean one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunStats {
    /// Listing cards dropped because reading one of their fields failed.
    pub skipped_listings: usize,
    /// Detail pages that could not be opened; their rows keep the placeholder.
    pub failed_details: usize,
    /// Individual fields that fell back to the placeholder.
    pub missing_fields: usize,
}

/// The portal writes "Remoto"; other boards write "Remote".
pub fn is_remote(work_arrangement: &str) -> bool {
    let lowered = work_arrangement.to_lowercase();
    lowered.contains("remote") || lowered.contains("remoto")
}

/// Splits "City - Region" into `(city, region)`.
///
/// The last separator wins so hyphenated city names stay whole. Without a
/// separator the whole string is the city and the region is empty.
pub fn split_location(location: &str) -> (String, String) {
    match location.rsplit_once(LOCATION_SEPARATOR) {
        Some((city, region)) => (city.trim().to_string(), region.trim().to_string()),
        None => (location.trim().to_string(), String::new()),
    }
}
