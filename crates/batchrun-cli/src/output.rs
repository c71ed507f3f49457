//! Human-readable rendering of reports.

use batchrun_core::{ItemStatus, Report};
use chrono::{DateTime, Utc};

pub fn print_report(report: &Report) {
    println!("Batches ({}):", report.batch_results().len());
    println!(
        "{:<6}  {:<8}  {:<6}  {:<6}  {:<7}  {:<10}  {}",
        "INDEX", "STARTED", "OK", "FAILED", "SKIPPED", "DURATION", "ITEMS"
    );
    println!("{}", "-".repeat(72));

    for result in report.batch_results() {
        println!(
            "{:<6}  {:<8}  {:<6}  {:<6}  {:<7}  {:<10}  {}",
            result.batch_index,
            format_time(result.started_at),
            result.count(ItemStatus::Success),
            result.count(ItemStatus::Failure),
            result.count(ItemStatus::Skipped),
            format_duration(result.duration_ms()),
            result.outcomes.len()
        );
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!();
        println!("Failures ({}):", failures.len());
        for outcome in failures {
            let message = outcome.message.as_deref().unwrap_or("");
            println!("  - {}: {}", outcome.item_id, first_line(message));
        }
    }

    println!();
    println!(
        "Overall: {}  total={} succeeded={} failed={} skipped={}",
        report.overall_status(),
        report.total_items(),
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M:%S").to_string()
}

fn format_duration(ms: i64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1_000.0)
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1_500), "1.5s");
    }

    #[test]
    fn test_format_time() {
        let ts: DateTime<Utc> = "2024-05-01T09:07:03Z".parse().unwrap();
        assert_eq!(format_time(ts), "09:07:03");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("exit status 1: a\nb"), "exit status 1: a");
        assert_eq!(first_line(""), "");
    }
}
