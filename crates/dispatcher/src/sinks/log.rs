//! LogSink - logs batch summary via tracing

use contracts::{ContractError, DataSink, EventBatch};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &EventBatch) {
        let first_timestamp = batch.events.first().map(|e| e.timestamp);
        let last_timestamp = batch.events.last().map(|e| e.timestamp);

        info!(
            sink = %self.name,
            sub_hal = %batch.sub_hal_index,
            events = batch.len(),
            wakeup_count = batch.wakeup_count,
            first_timestamp = ?first_timestamp,
            last_timestamp = ?last_timestamp,
            "EventBatch received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, sub_hal = %batch.sub_hal_index)
    )]
    async fn write(&mut self, batch: &EventBatch) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
