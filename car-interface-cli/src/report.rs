//! Session report generation (TXT)

use anyhow::{Context, Result};
use car_interface::CycleOutput;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Accumulated statistics for one harness session
pub struct SessionReport {
    started: DateTime<Utc>,
    model: Option<String>,
    cycles: usize,
    event_counts: BTreeMap<String, usize>,
    button_count: usize,
}

impl SessionReport {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            model: None,
            cycles: 0,
            event_counts: BTreeMap::new(),
            button_count: 0,
        }
    }

    pub fn set_model(&mut self, model: &str) {
        self.model = Some(model.to_string());
    }

    /// Record one cycle's output
    pub fn record(&mut self, out: &CycleOutput) {
        self.cycles += 1;
        for event in &out.events {
            *self.event_counts.entry(event.kind.to_string()).or_insert(0) += 1;
        }
        self.button_count += out.button_events.len();
    }

    /// Render the report as text
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str("═══════════════════════════════════════════════\n");
        text.push_str("  Car Interface - Session Report\n");
        text.push_str("═══════════════════════════════════════════════\n\n");
        text.push_str(&format!("Started: {}\n", self.started.format("%Y-%m-%d %H:%M:%S UTC")));
        text.push_str(&format!(
            "Model:   {}\n",
            self.model.as_deref().unwrap_or("(not identified)")
        ));
        text.push_str(&format!("Cycles:  {}\n", self.cycles));
        text.push_str(&format!("Button events: {}\n", self.button_count));

        text.push_str("\nEvents by kind:\n");
        if self.event_counts.is_empty() {
            text.push_str("  (none)\n");
        } else {
            for (kind, count) in &self.event_counts {
                text.push_str(&format!("  {:<22} {}\n", kind, count));
            }
        }
        text
    }

    /// Write the rendered report to a file
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write report: {:?}", path))
    }
}

impl Default for SessionReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use car_interface::{EventFlags, EventKind, EventRecord, SignalSnapshot};

    fn sample_output() -> CycleOutput {
        let state = car_interface::normalize(
            &SignalSnapshot::default(),
            car_interface::brand_for("TOYOTA RAV4 2017").unwrap(),
        );
        CycleOutput {
            state,
            events: vec![
                EventRecord::new(EventKind::PcmDisable, EventFlags::USER_DISABLE),
                EventRecord::new(EventKind::DoorOpen, EventFlags::NO_ENTRY),
            ],
            button_events: vec![],
        }
    }

    #[test]
    fn test_report_counts_events() {
        let mut report = SessionReport::new();
        report.set_model("TOYOTA RAV4 2017");
        report.record(&sample_output());
        report.record(&sample_output());

        let text = report.render();
        assert!(text.contains("TOYOTA RAV4 2017"));
        assert!(text.contains("Cycles:  2"));
        assert!(text.contains("pcmDisable"));
        assert!(text.contains("doorOpen"));
    }

    #[test]
    fn test_empty_report() {
        let text = SessionReport::new().render();
        assert!(text.contains("(not identified)"));
        assert!(text.contains("(none)"));
    }
}
