use std::fmt;

use serde::Serialize;

/// Counters from one pipeline pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub fetched: u32,
    pub invalid: u32,
    pub skipped_duplicates: u32,
    pub stored: u32,
    /// Already stored but never marked processed, analyzed again.
    pub resumed: u32,
    pub analyzed: u32,
    /// Analyzed with one or more criteria missing from detailed scoring.
    pub degraded: u32,
    pub notified: u32,
    pub processed: u32,
    pub storage_failures: u32,
    pub analysis_failures: u32,
    pub dispatch_failures: u32,
    pub collection_failures: u32,
    pub cancelled: bool,
    /// (title, score) for every analyzed publication, in processing order.
    pub scores: Vec<(String, f64)>,
}

impl RunStats {
    pub fn failures(&self) -> u32 {
        self.storage_failures + self.analysis_failures + self.dispatch_failures + self.collection_failures
    }

    /// One-line summary for trigger responses.
    pub fn summary(&self) -> String {
        format!(
            "fetched {}, new {}, duplicates {}, analyzed {}, notified {}, processed {}, failures {}",
            self.fetched,
            self.stored,
            self.skipped_duplicates,
            self.analyzed,
            self.notified,
            self.processed,
            self.failures()
        )
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Spinout Run {} ===", if self.cancelled { "Cancelled" } else { "Complete" })?;
        writeln!(f, "Fetched:             {}", self.fetched)?;
        writeln!(f, "Invalid:             {}", self.invalid)?;
        writeln!(f, "Duplicates skipped:  {}", self.skipped_duplicates)?;
        writeln!(f, "Stored (new):        {}", self.stored)?;
        writeln!(f, "Resumed:             {}", self.resumed)?;
        writeln!(f, "Analyzed:            {} ({} degraded)", self.analyzed, self.degraded)?;
        writeln!(f, "Notified:            {}", self.notified)?;
        writeln!(f, "Marked processed:    {}", self.processed)?;
        writeln!(f, "\nFailures:")?;
        writeln!(f, "  Collection: {}", self.collection_failures)?;
        writeln!(f, "  Storage:    {}", self.storage_failures)?;
        writeln!(f, "  Analysis:   {}", self.analysis_failures)?;
        writeln!(f, "  Dispatch:   {}", self.dispatch_failures)?;

        if !self.scores.is_empty() {
            let mut top: Vec<_> = self.scores.iter().collect();
            top.sort_by(|a, b| b.1.total_cmp(&a.1));
            writeln!(f, "\nTop scores:")?;
            for (title, score) in top.into_iter().take(5) {
                writeln!(f, "  {score:>4.1}  {title}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_all_failure_kinds() {
        let stats = RunStats {
            fetched: 4,
            stored: 2,
            storage_failures: 1,
            dispatch_failures: 2,
            collection_failures: 0,
            analysis_failures: 1,
            ..Default::default()
        };
        assert_eq!(stats.failures(), 4);
        assert!(stats.summary().contains("fetched 4, new 2"));
        assert!(stats.summary().ends_with("failures 4"));
    }

    #[test]
    fn display_lists_top_scores_highest_first() {
        let stats = RunStats {
            scores: vec![("Low".into(), 2.5), ("High".into(), 8.0)],
            ..Default::default()
        };
        let text = stats.to_string();
        let high = text.find("High").unwrap();
        let low = text.find("Low").unwrap();
        assert!(high < low);
        assert!(text.contains(" 8.0  High"));
    }
}
