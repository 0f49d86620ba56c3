//! Final run report.

use std::fmt::Write;

use mediafetch_core::{JobOutcome, RunReport, RunStatus};

/// Process exit code for a finished run.
///
/// 0 when every job succeeded, 2 on partial failure, 1 when every job failed
/// or nothing ran.
pub fn exit_code(report: &RunReport) -> i32 {
    match report.status() {
        RunStatus::AllSucceeded => 0,
        RunStatus::PartialFailure => 2,
        RunStatus::AllFailed | RunStatus::Empty => 1,
    }
}

/// Human-readable summary with one line per job.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    match report.status() {
        RunStatus::AllSucceeded => {
            let _ = writeln!(out, "All downloads finished ({}/{})", report.succeeded, report.total());
        }
        RunStatus::Empty => {
            let _ = writeln!(out, "Nothing was downloaded");
        }
        _ => {
            let _ = writeln!(
                out,
                "Finished. Succeeded: {}, failed: {}",
                report.succeeded, report.failed
            );
        }
    }

    for result in &report.results {
        match &result.outcome {
            JobOutcome::Succeeded { output_path, .. } => {
                let name = output_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| output_path.display().to_string());
                let _ = writeln!(out, " - [OK] {}", name);
            }
            JobOutcome::Failed { reason } => {
                let _ = writeln!(out, " - [FAIL] {} ({})", result.url, reason);
            }
        }
    }

    if report.not_dispatched > 0 {
        let _ = writeln!(out, "{} job(s) not started because of interrupt", report.not_dispatched);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediafetch_core::{JobId, JobResult};
    use std::path::PathBuf;

    fn ok(name: &str) -> JobResult {
        JobResult {
            job_id: JobId::new(),
            url: format!("https://x/{}", name),
            attempts: 1,
            outcome: JobOutcome::Succeeded {
                output_path: PathBuf::from(format!("/out/{}.mp4", name)),
                title: name.to_string(),
                post_processed: false,
            },
        }
    }

    fn failed(name: &str) -> JobResult {
        JobResult {
            job_id: JobId::new(),
            url: format!("https://x/{}", name),
            attempts: 3,
            outcome: JobOutcome::Failed {
                reason: "Max retries exceeded".to_string(),
            },
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&RunReport::new(vec![ok("a"), ok("b")], 0)), 0);
        assert_eq!(exit_code(&RunReport::new(vec![ok("a"), failed("b")], 0)), 2);
        assert_eq!(exit_code(&RunReport::new(vec![failed("a")], 0)), 1);
        assert_eq!(exit_code(&RunReport::new(vec![], 0)), 1);
    }

    #[test]
    fn test_render_lists_every_job() {
        let report = RunReport::new(vec![ok("a"), failed("b")], 1);
        let text = render(&report);

        assert!(text.starts_with("Finished. Succeeded: 1, failed: 1"));
        assert!(text.contains(" - [OK] a.mp4"));
        assert!(text.contains(" - [FAIL] https://x/b (Max retries exceeded)"));
        assert!(text.contains("1 job(s) not started"));
    }

    #[test]
    fn test_render_all_succeeded() {
        let text = render(&RunReport::new(vec![ok("a")], 0));
        assert!(text.starts_with("All downloads finished (1/1)"));
    }
}
