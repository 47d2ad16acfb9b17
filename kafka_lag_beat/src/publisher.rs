use crate::events::Event;
use anyhow::{anyhow, Context};
use std::io::Write;
use std::sync::Mutex;

pub trait EventPublisher: Send + Sync {
    fn publish(&self, events: &[Event]) -> Result<(), anyhow::Error>;
}

/// Writes each event as one line of JSON.
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl JsonLinesPublisher<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, anyhow::Error> {
        self.writer
            .into_inner()
            .map_err(|_| anyhow!("Publisher writer lock is poisoned"))
    }
}

impl<W: Write + Send> EventPublisher for JsonLinesPublisher<W> {
    fn publish(&self, events: &[Event]) -> Result<(), anyhow::Error> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Publisher writer lock is poisoned"))?;

        for event in events {
            serde_json::to_writer(&mut *writer, event).context("While serializing event")?;
            writer.write_all(b"\n").context("While writing event")?;
        }
        writer.flush().context("While flushing events")?;

        Ok(())
    }
}
