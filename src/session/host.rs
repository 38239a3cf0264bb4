//! Host session protocol
//!
//! The orchestration host hears `sessionStarted` once, then exactly one of
//! `sessionFinished` or `sessionFailed`.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::common::{Error, HostError, Result};

use super::reducer::RunResult;

/// Receiver of session outcome reports
pub trait SessionHost {
    fn session_started(&mut self) -> Result<()>;
    fn session_finished(&mut self, result: RunResult) -> Result<()>;
    fn session_failed(&mut self, error: Error) -> Result<()>;
}

impl<H: SessionHost + ?Sized> SessionHost for &mut H {
    fn session_started(&mut self) -> Result<()> {
        (**self).session_started()
    }

    fn session_finished(&mut self, result: RunResult) -> Result<()> {
        (**self).session_finished(result)
    }

    fn session_failed(&mut self, error: Error) -> Result<()> {
        (**self).session_failed(error)
    }
}

/// One line of the JSON-lines host protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    SessionStarted,
    SessionFinished { result: RunResult },
    SessionFailed { error: HostError },
}

/// Writes each report as a JSON line
pub struct JsonLinesHost<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesHost<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, message: &HostMessage) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> SessionHost for JsonLinesHost<W> {
    fn session_started(&mut self) -> Result<()> {
        self.send(&HostMessage::SessionStarted)
    }

    fn session_finished(&mut self, result: RunResult) -> Result<()> {
        self.send(&HostMessage::SessionFinished { result })
    }

    fn session_failed(&mut self, error: Error) -> Result<()> {
        self.send(&HostMessage::SessionFailed {
            error: HostError::from(&error),
        })
    }
}

/// A report as seen by [`RecordingHost`]
#[cfg(test)]
#[derive(Debug)]
pub enum HostCall {
    Started,
    Finished(RunResult),
    Failed(Error),
}

/// Keeps every report in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
}

#[cfg(test)]
impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminal reports received
    pub fn terminal_reports(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, HostCall::Started))
            .count()
    }
}

#[cfg(test)]
impl SessionHost for RecordingHost {
    fn session_started(&mut self) -> Result<()> {
        self.calls.push(HostCall::Started);
        Ok(())
    }

    fn session_finished(&mut self, result: RunResult) -> Result<()> {
        self.calls.push(HostCall::Finished(result));
        Ok(())
    }

    fn session_failed(&mut self, error: Error) -> Result<()> {
        self.calls.push(HostCall::Failed(error));
        Ok(())
    }
}
