use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{split_location, JobListing};

/// Column headers, in export order.
pub const COLUMNS: [&str; 10] = [
    "Title",
    "Company",
    "Publication Date",
    "Work Arrangement",
    "Employment Type",
    "Listing Link",
    "Responsibilities",
    "Qualifications",
    "City",
    "Region",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobRow {
    pub title: String,
    pub company: String,
    pub published_at: String,
    pub work_arrangement: String,
    pub employment_type: String,
    pub link: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub city: String,
    pub region: String,
}

impl JobRow {
    /// Cell values lined up with [`COLUMNS`].
    pub fn cells(&self) -> [&str; 10] {
        [
            &self.title,
            &self.company,
            &self.published_at,
            &self.work_arrangement,
            &self.employment_type,
            &self.link,
            &self.responsibilities,
            &self.qualifications,
            &self.city,
            &self.region,
        ]
    }
}

impl From<JobListing> for JobRow {
    fn from(listing: JobListing) -> Self {
        let (city, region) = split_location(&listing.location);
        Self {
            title: listing.title,
            company: listing.company,
            published_at: listing.published_at,
            work_arrangement: listing.work_arrangement,
            employment_type: listing.employment_type,
            link: listing.link,
            responsibilities: listing.responsibilities,
            qualifications: listing.qualifications,
            city,
            region,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobTable {
    pub rows: Vec<JobRow>,
}

impl JobTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row per listing, same order; the combined location becomes city and
/// region.
pub fn assemble(listings: impl IntoIterator<Item = JobListing>) -> JobTable {
    JobTable {
        rows: listings.into_iter().map(JobRow::from).collect(),
    }
}
