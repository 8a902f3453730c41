//! Per-phase latency log for demo workflows.

use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};

/// Wall-clock durations keyed by phase, in the order phases first ran.
#[derive(Debug, Clone)]
pub struct PerfLog {
    model: String,
    phases: Vec<(String, Duration)>,
}

impl PerfLog {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            phases: Vec::new(),
        }
    }

    /// Await `fut`, record how long it took under `phase` and print a `[perf]` line.
    ///
    /// The duration is recorded even when the future resolves to an error.
    pub async fn timed<F, T>(&mut self, phase: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let output = fut.await;
        let elapsed = start.elapsed();

        println!("{}", self.record(phase, elapsed));
        output
    }

    /// Store `elapsed` for `phase`, replacing an earlier value, and return the log line.
    pub fn record(&mut self, phase: &str, elapsed: Duration) -> String {
        match self.phases.iter_mut().find(|(name, _)| name == phase) {
            Some((_, duration)) => *duration = elapsed,
            None => self.phases.push((phase.to_string(), elapsed)),
        }
        tracing::debug!(phase, latency_s = elapsed.as_secs_f64(), "phase finished");
        self.line(phase, elapsed)
    }

    pub fn total(&self) -> Duration {
        self.phases.iter().map(|(_, duration)| *duration).sum()
    }

    pub fn total_line(&self) -> String {
        self.line("total_workflow", self.total())
    }

    /// `{"model": .., "<phase>": secs, .., "total": secs}` with 4-decimal rounding.
    pub fn summary(&self) -> Value {
        let mut summary = Map::new();
        summary.insert("model".to_string(), json!(self.model));
        for (phase, duration) in &self.phases {
            summary.insert(phase.clone(), json!(round4(duration.as_secs_f64())));
        }
        summary.insert("total".to_string(), json!(round4(self.total().as_secs_f64())));
        Value::Object(summary)
    }

    /// Print the total line and the `[perf-summary]` line.
    pub fn report(&self) {
        println!("{}", self.total_line());
        println!("[perf-summary] {}", self.summary());
    }

    fn line(&self, phase: &str, elapsed: Duration) -> String {
        format!(
            "[perf] model={} phase={} latency_s={:.3}",
            self.model,
            phase,
            elapsed.as_secs_f64()
        )
    }
}

fn round4(secs: f64) -> f64 {
    (secs * 10_000.0).round() / 10_000.0
}
