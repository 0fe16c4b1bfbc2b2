pub mod apply;
pub mod line;
pub mod version;
pub mod vhost;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::tasks::TaskReport;

/// Report the executed tasks and bail if any of them failed.
///
/// With `--json` the reports are printed to stdout as a JSON array;
/// otherwise the logger's summary is shown.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure.
#[allow(clippy::print_stdout)]
pub fn finish(reports: &[TaskReport], global: &GlobalOpts, log: &Logger) -> Result<()> {
    if global.json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        log.print_summary();
    }

    let count = reports.iter().filter(|r| r.failed()).count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::TaskStatus;

    fn report(status: TaskStatus) -> TaskReport {
        TaskReport {
            name: "t".to_string(),
            status,
            changed: false,
            message: String::new(),
            affected: 0,
            found: None,
            backup: None,
        }
    }

    fn global() -> GlobalOpts {
        GlobalOpts {
            dry_run: false,
            json: true,
        }
    }

    #[test]
    fn finish_ok_when_nothing_failed() {
        let log = Logger::with_log_file(None);
        let reports = [report(TaskStatus::Ok), report(TaskStatus::Changed)];
        assert!(finish(&reports, &global(), &log).is_ok());
    }

    #[test]
    fn finish_counts_failures() {
        let log = Logger::with_log_file(None);
        let reports = [report(TaskStatus::Failed), report(TaskStatus::Ok), report(TaskStatus::Failed)];
        let err = finish(&reports, &global(), &log).unwrap_err();
        assert_eq!(err.to_string(), "2 task(s) failed");
    }
}
