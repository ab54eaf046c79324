//! Exit code logic for the cookbooker process.
//!
//! Single responsibility: map a download report to the process exit outcome.

use cookbooker_core::DownloadReport;

use crate::ProcessExit;

/// Determines the process exit outcome from a download report.
///
/// Pages written with an unknown content type never reach the document, so
/// they count as missing alongside failed pages.
pub(crate) fn determine_exit_outcome(report: &DownloadReport) -> ProcessExit {
    let usable = report.written.len().saturating_sub(report.unknown_type.len());
    if report.is_complete() {
        ProcessExit::Success
    } else if usable > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}
