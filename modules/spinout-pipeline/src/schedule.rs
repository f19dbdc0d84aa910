use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },
}

/// A parsed cron expression (seconds-first, optional year; times in UTC).
#[derive(Debug, Clone)]
pub struct CronSchedule {
    schedule: Schedule,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let schedule = Schedule::from_str(expr).map_err(|e| ScheduleError::InvalidCron {
            expression: expr.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { schedule })
    }

    /// Next fire time strictly after `from`.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).next()
    }

    /// Run `pass` at every fire time until cancelled, optionally once up front.
    pub async fn run<F, Fut>(&self, run_immediately: bool, cancel: &CancellationToken, mut pass: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        if run_immediately && !cancel.is_cancelled() {
            info!("Running immediately");
            pass().await;
        }

        while !cancel.is_cancelled() {
            let Some(next) = self.next_after(Utc::now()) else {
                info!("Schedule has no future fire times, stopping");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            info!(next = %next, "Waiting for next scheduled run");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => pass().await,
            }
        }
        info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn weekly_default_fires_monday_midnight() {
        let schedule = CronSchedule::parse("0 0 0 * * Mon *").unwrap();
        // Wednesday
        let from = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let next = schedule.next_after(from).unwrap();

        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!((next.hour(), next.minute(), next.second()), (0, 0, 0));
        assert_eq!(next.date_naive().to_string(), "2024-05-20");
    }

    #[test]
    fn bad_expression_is_rejected() {
        let err = CronSchedule::parse("every monday").unwrap_err();
        assert!(err.to_string().contains("every monday"));
    }

    #[tokio::test]
    async fn runs_immediately_then_stops_on_cancel() {
        let schedule = CronSchedule::parse("0 0 0 1 1 * 2099").unwrap();
        let cancel = CancellationToken::new();
        let passes = AtomicU32::new(0);

        let counter = &passes;
        let token = cancel.clone();
        schedule
            .run(true, &cancel, move || {
                let token = token.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    token.cancel();
                }
            })
            .await;

        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fires_on_schedule() {
        let schedule = CronSchedule::parse("* * * * * * *").unwrap();
        let cancel = CancellationToken::new();
        let passes = AtomicU32::new(0);

        let counter = &passes;
        let token = cancel.clone();
        schedule
            .run(false, &cancel, move || {
                let token = token.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                        token.cancel();
                    }
                }
            })
            .await;

        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }
}
