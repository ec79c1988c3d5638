use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use lex_domain::RetrievalMode;
use lex_storage::models::ApiUsage;

use crate::TelemetrySink;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
	pub request_id: String,
	pub kb_mode: RetrievalMode,
	pub practice_mode: RetrievalMode,
	pub retrieval_mode: RetrievalMode,
	pub rerank_ok: bool,
	pub rerank_errors: Vec<String>,
	pub kb_count: usize,
	pub practice_count: usize,
	pub kb_fallback_used: bool,
	pub practice_fallback_used: bool,
	pub cancelled: bool,
	pub elapsed_ms: u64,
}

pub struct TelemetryRecorder {
	tx: Option<Sender<TelemetryEvent>>,
}
impl TelemetryRecorder {
	pub fn spawn(cfg: &lex_config::Telemetry, sink: Arc<dyn TelemetrySink>) -> Self {
		if !cfg.enabled {
			return Self::disabled();
		}

		let (tx, rx) = mpsc::channel(cfg.queue_capacity);
		let worker = Worker {
			sink,
			service_type: cfg.service_type.clone(),
			model_name: cfg.model_name.clone(),
			send_timeout: Duration::from_millis(cfg.send_timeout_ms),
		};

		tokio::spawn(worker.run(rx));

		Self { tx: Some(tx) }
	}

	pub fn disabled() -> Self {
		Self { tx: None }
	}

	/// Queues `event` without waiting. Returns whether the event was accepted.
	pub fn record(&self, event: TelemetryEvent) -> bool {
		let Some(tx) = &self.tx else {
			return false;
		};

		match tx.try_send(event) {
			Ok(()) => true,
			Err(TrySendError::Full(event)) => {
				tracing::warn!(request_id = %event.request_id, "Telemetry queue is full. Dropping event.");

				false
			},
			Err(TrySendError::Closed(event)) => {
				tracing::warn!(request_id = %event.request_id, "Telemetry worker stopped. Dropping event.");

				false
			},
		}
	}
}

struct Worker {
	sink: Arc<dyn TelemetrySink>,
	service_type: String,
	model_name: String,
	send_timeout: Duration,
}
impl Worker {
	async fn run(self, mut rx: Receiver<TelemetryEvent>) {
		while let Some(event) = rx.recv().await {
			let request_id = event.request_id.clone();
			let metadata = match serde_json::to_value(&event) {
				Ok(metadata) => metadata,
				Err(err) => {
					tracing::warn!(error = %err, request_id = %request_id, "Failed to encode telemetry event.");

					continue;
				},
			};
			let usage = ApiUsage {
				service_type: self.service_type.clone(),
				model_name: self.model_name.clone(),
				tokens_used: 0,
				estimated_cost: 0.0,
				metadata,
			};

			match tokio::time::timeout(self.send_timeout, self.sink.record(&usage)).await {
				Ok(Ok(())) => tracing::debug!(request_id = %request_id, "Telemetry recorded."),
				Ok(Err(err)) => {
					tracing::warn!(error = %err, request_id = %request_id, "Failed to record telemetry.")
				},
				Err(_) => tracing::warn!(request_id = %request_id, "Telemetry sink timed out."),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use super::*;
	use crate::{BoxFuture, Error, Result};

	struct CollectingSink {
		seen: Mutex<Vec<ApiUsage>>,
		fail: bool,
	}
	impl TelemetrySink for CollectingSink {
		fn record<'a>(&'a self, usage: &'a ApiUsage) -> BoxFuture<'a, Result<()>> {
			Box::pin(async move {
				self.seen.lock().unwrap_or_else(|err| err.into_inner()).push(usage.clone());

				if self.fail {
					Err(Error::Storage { message: "insert failed".to_string() })
				} else {
					Ok(())
				}
			})
		}
	}

	fn event(request_id: &str) -> TelemetryEvent {
		TelemetryEvent {
			request_id: request_id.to_string(),
			kb_mode: RetrievalMode::KeywordRerank,
			practice_mode: RetrievalMode::KeywordOnly,
			retrieval_mode: RetrievalMode::KeywordRerank,
			rerank_ok: true,
			rerank_errors: Vec::new(),
			kb_count: 3,
			practice_count: 2,
			kb_fallback_used: false,
			practice_fallback_used: false,
			cancelled: false,
			elapsed_ms: 12,
		}
	}

	fn config(queue_capacity: usize) -> lex_config::Telemetry {
		lex_config::Telemetry { queue_capacity, ..Default::default() }
	}

	#[tokio::test]
	async fn worker_writes_usage_rows() {
		let sink = Arc::new(CollectingSink { seen: Mutex::new(Vec::new()), fail: false });
		let recorder = TelemetryRecorder::spawn(&config(4), sink.clone());

		assert!(recorder.record(event("req-1")));

		for _ in 0..50 {
			if !sink.seen.lock().unwrap_or_else(|err| err.into_inner()).is_empty() {
				break;
			}

			tokio::task::yield_now().await;
		}

		let seen = sink.seen.lock().unwrap_or_else(|err| err.into_inner());

		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].service_type, "legal_search");
		assert_eq!(seen[0].metadata["request_id"], "req-1");
		assert_eq!(seen[0].metadata["kb_mode"], "keyword+rerank");
		assert_eq!(seen[0].metadata["practice_count"], 2);
	}

	#[tokio::test]
	async fn full_queue_drops_without_blocking() {
		let sink = Arc::new(CollectingSink { seen: Mutex::new(Vec::new()), fail: true });
		let recorder = TelemetryRecorder::spawn(&config(1), sink);

		// The current-thread runtime has not polled the worker yet, so the second event finds
		// the single slot occupied.
		assert!(recorder.record(event("req-1")));
		assert!(!recorder.record(event("req-2")));
	}

	#[test]
	fn disabled_recorder_accepts_nothing() {
		assert!(!TelemetryRecorder::disabled().record(event("req-1")));
	}
}
