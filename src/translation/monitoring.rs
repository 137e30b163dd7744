/*!
 * LLM call tracing.
 *
 * Every completion call made for a chunk is wrapped by `CallTracer::record`,
 * which times it and keeps the outcome in a bounded ring buffer. The buffer
 * backs the statistics shown by status reports.
 */

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Timing and outcome of one finished call
#[derive(Debug, Clone)]
pub struct CallTrace {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub success: bool,
    pub error_message: Option<String>,
}

/// A call that has started but not finished yet
struct OpenTrace {
    start_time: DateTime<Utc>,
    started: Instant,
}

impl OpenTrace {
    fn start() -> Self {
        Self {
            start_time: Utc::now(),
            started: Instant::now(),
        }
    }

    fn close(self, error_message: Option<String>) -> CallTrace {
        CallTrace {
            start_time: self.start_time,
            end_time: Utc::now(),
            duration: self.started.elapsed(),
            success: error_message.is_none(),
            error_message,
        }
    }
}

/// Serializable view of a trace for status reports
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TraceRecord {
    pub start_time: String,
    pub end_time: String,
    /// Seconds
    pub duration: f64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl From<&CallTrace> for TraceRecord {
    fn from(trace: &CallTrace) -> Self {
        Self {
            start_time: trace.start_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            end_time: trace.end_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            duration: trace.duration.as_secs_f64(),
            success: trace.success,
            error_message: trace.error_message.clone(),
        }
    }
}

/// Aggregate statistics over the traces currently in the buffer
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LlmStats {
    pub total_calls: usize,
    pub success_calls: usize,
    pub failed_calls: usize,
    /// Percentage in [0, 100]
    pub success_rate: f64,
    /// Mean duration of successful calls, in seconds
    pub average_duration: f64,
    /// Newest first
    pub recent_traces: Vec<TraceRecord>,
}

/// Records completion calls into a fixed-capacity ring buffer
#[derive(Debug)]
pub struct CallTracer {
    traces: Mutex<VecDeque<CallTrace>>,
    capacity: usize,
}

impl CallTracer {
    /// Create a tracer keeping the `capacity` most recent traces
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            traces: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Run `operation`, recording its duration and outcome.
    ///
    /// The operation's result is returned unchanged.
    pub async fn record<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let trace = OpenTrace::start();
        let result = operation.await;
        let error_message = result.as_ref().err().map(|e| e.to_string());
        self.push(trace.close(error_message));
        result
    }

    fn push(&self, trace: CallTrace) {
        let mut traces = self.traces.lock();
        if traces.len() == self.capacity {
            traces.pop_front();
        }
        traces.push_back(trace);
    }

    /// Compute statistics over the buffered traces
    pub fn stats(&self) -> LlmStats {
        let traces: Vec<CallTrace> = self.traces.lock().iter().cloned().collect();

        let total_calls = traces.len();
        let success_durations: Vec<f64> = traces
            .iter()
            .filter(|t| t.success)
            .map(|t| t.duration.as_secs_f64())
            .collect();
        let success_calls = success_durations.len();

        let success_rate = if total_calls > 0 {
            success_calls as f64 / total_calls as f64 * 100.0
        } else {
            0.0
        };
        let average_duration = if success_calls > 0 {
            success_durations.iter().sum::<f64>() / success_calls as f64
        } else {
            0.0
        };

        LlmStats {
            total_calls,
            success_calls,
            failed_calls: total_calls - success_calls,
            success_rate,
            average_duration,
            recent_traces: traces.iter().rev().map(TraceRecord::from).collect(),
        }
    }

    /// Number of buffered traces
    pub fn len(&self) -> usize {
        self.traces.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all buffered traces
    pub fn clear(&self) {
        self.traces.lock().clear();
    }
}

impl Default for CallTracer {
    fn default() -> Self {
        Self::new(100)
    }
}
