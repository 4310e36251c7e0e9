use std::thread;

use crate::browser::{Launcher, Page};
use crate::config::ScrapeOptions;
use crate::error::ScrapeError;
use crate::model::{JobDetails, NOT_INFORMED};

pub const RESPONSIBILITIES_XPATH: &str =
    "//h2[contains(text(), 'Responsabilidades')]/following-sibling::div";
pub const QUALIFICATIONS_XPATH: &str =
    "//h2[contains(text(), 'Requisitos')]/following-sibling::div";

/// Opens `link` in a fresh browser session and reads the responsibilities and
/// qualifications blocks.
///
/// Each block is awaited on its own thread with its own timeout, so a missing
/// block never delays or hides the other one. The session is released on
/// every path, unwinding included.
pub fn fetch_details<L: Launcher + ?Sized>(
    launcher: &L,
    link: &str,
    options: &ScrapeOptions,
) -> Result<JobDetails, ScrapeError> {
    let session = launcher.open(options.headless)?;
    let details = read_details(&session, link, options);
    session.close();
    details
}

fn read_details<P: Page>(
    page: &P,
    link: &str,
    options: &ScrapeOptions,
) -> Result<JobDetails, ScrapeError> {
    page.navigate(link)?;
    thread::sleep(options.settle_delay);

    let (responsibilities, qualifications) = thread::scope(|scope| {
        let responsibilities =
            scope.spawn(|| page.wait_for_text(RESPONSIBILITIES_XPATH, options.detail_timeout));
        let qualifications =
            scope.spawn(|| page.wait_for_text(QUALIFICATIONS_XPATH, options.detail_timeout));
        (
            or_placeholder(link, "responsibilities", responsibilities.join()),
            or_placeholder(link, "qualifications", qualifications.join()),
        )
    });

    Ok(JobDetails {
        responsibilities,
        qualifications,
    })
}

fn or_placeholder(
    link: &str,
    field: &'static str,
    outcome: thread::Result<Result<String, ScrapeError>>,
) -> String {
    match outcome {
        Ok(Ok(text)) if !text.is_empty() => text,
        Ok(Ok(_)) => {
            tracing::warn!(link, field, "Detail block is empty");
            NOT_INFORMED.to_string()
        }
        Ok(Err(e)) => {
            tracing::warn!(link, field, "Detail block not found: {}", e);
            NOT_INFORMED.to_string()
        }
        Err(_) => {
            tracing::error!(link, field, "Detail lookup panicked");
            NOT_INFORMED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{job_link, DetailScript, ScriptedCard, ScriptedLauncher};
    use std::collections::HashMap;
    use std::time::Duration;

    fn options() -> ScrapeOptions {
        ScrapeOptions {
            settle_delay: Duration::ZERO,
            detail_timeout: Duration::ZERO,
            ..Default::default()
        }
    }

    fn launcher_with(script: DetailScript) -> ScriptedLauncher {
        ScriptedLauncher::new(vec![vec![ScriptedCard::listing(1)]])
            .with_details(HashMap::from([(job_link(1), script)]))
    }

    #[test]
    fn reads_both_blocks() {
        let launcher = launcher_with(DetailScript::full(1));

        let details = fetch_details(&launcher, &job_link(1), &options()).unwrap();

        assert_eq!(details.responsibilities, "Build dashboards 1");
        assert_eq!(details.qualifications, "SQL and Python 1");
    }

    #[test]
    fn only_requirements_heading_found() {
        let launcher = launcher_with(DetailScript {
            qualifications: Some("Power BI avançado".to_string()),
            ..Default::default()
        });

        let details = fetch_details(&launcher, &job_link(1), &options()).unwrap();

        assert_eq!(details.qualifications, "Power BI avançado");
        assert_eq!(details.responsibilities, NOT_INFORMED);
    }

    #[test]
    fn no_blocks_gives_placeholders() {
        let launcher = launcher_with(DetailScript::default());

        let details = fetch_details(&launcher, &job_link(1), &options()).unwrap();

        assert_eq!(details, JobDetails::default());
    }

    #[test]
    fn session_is_closed_after_success() {
        let launcher = launcher_with(DetailScript::full(1));

        fetch_details(&launcher, &job_link(1), &options()).unwrap();

        assert_eq!(launcher.opened(), 1);
        assert_eq!(launcher.closed(), 1);
    }

    #[test]
    fn session_is_closed_after_navigation_failure() {
        let launcher = launcher_with(DetailScript {
            fail_navigation: true,
            ..Default::default()
        });

        let err = fetch_details(&launcher, &job_link(1), &options()).unwrap_err();

        assert!(matches!(err, ScrapeError::Navigation { .. }));
        assert_eq!(launcher.closed(), 1);
    }

    #[test]
    fn session_is_closed_when_the_page_panics() {
        let launcher = launcher_with(DetailScript {
            panic: true,
            ..Default::default()
        });

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fetch_details(&launcher, &job_link(1), &options())
        }));

        assert!(outcome.is_err());
        assert_eq!(launcher.closed(), 1);
    }

    #[test]
    fn launch_failure_is_a_session_error() {
        let launcher = ScriptedLauncher::failing_to_open();

        let err = fetch_details(&launcher, &job_link(1), &options()).unwrap_err();

        assert!(matches!(err, ScrapeError::Session(_)));
    }
}
