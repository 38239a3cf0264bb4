//! Framework hosted in a child process
//!
//! The child speaks Content-Length framed JSON on stdin/stdout. Requests
//! get exactly one response; lifecycle events may arrive at any time and
//! are forwarded to the registered reporter. One task reads, one task
//! writes, so a boot trigger can fire from synchronous code.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::{json, Value};
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::common::{Error, Result};

use super::assets::{Asset, BootStage};
use super::codec;
use super::framework::{BootTrigger, Framework, ReadyState, Reporter};
use super::types::{EventMessage, LifecycleEvent, RequestMessage, ResponseMessage};

/// Requests waiting for responses; `None` once the framework is gone
type PendingMap = Arc<Mutex<Option<HashMap<i64, oneshot::Sender<ResponseMessage>>>>>;

/// Fail every outstanding request and refuse new ones
async fn close_pending(pending: &PendingMap) {
    pending.lock().await.take();
}

/// Cloneable handle for talking to the framework process
#[derive(Clone)]
pub struct FrameworkClient {
    /// Serialized frames for the writer task
    outgoing: mpsc::UnboundedSender<String>,
    /// Requests waiting for responses
    pending: PendingMap,
    /// Sequence number for requests
    seq: Arc<AtomicI64>,
    /// Where lifecycle events go once a reporter is registered
    reporter: Arc<Mutex<Option<Reporter>>>,
}

impl FrameworkClient {
    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn encode(&self, seq: i64, command: &str, arguments: Option<Value>) -> Result<String> {
        let request = RequestMessage {
            seq,
            message_type: "request".to_string(),
            command: command.to_string(),
            arguments,
        };
        Ok(serde_json::to_string(&request)?)
    }

    /// Send a request and wait for its response body
    pub async fn request(&self, command: &str, arguments: Option<Value>) -> Result<Value> {
        let seq = self.next_seq();
        let json = self.encode(seq, command, arguments)?;

        let (tx, rx) = oneshot::channel();
        match self.pending.lock().await.as_mut() {
            Some(pending) => pending.insert(seq, tx),
            None => return Err(Error::FrameworkCrashed),
        };

        tracing::debug!(seq, command, "framework request");
        if self.outgoing.send(json).is_err() {
            if let Some(pending) = self.pending.lock().await.as_mut() {
                pending.remove(&seq);
            }
            return Err(Error::FrameworkCrashed);
        }

        let response = rx.await.map_err(|_| Error::FrameworkCrashed)?;
        if response.success {
            Ok(response.body.unwrap_or(Value::Null))
        } else {
            Err(Error::request_failed(
                command,
                response.message.as_deref().unwrap_or("Unknown error"),
            ))
        }
    }

    /// Send a request without waiting for the response
    pub fn notify(&self, command: &str, arguments: Option<Value>) -> Result<()> {
        let json = self.encode(self.next_seq(), command, arguments)?;
        tracing::debug!(command, "framework notification");
        self.outgoing.send(json).map_err(|_| Error::FrameworkCrashed)
    }

    /// Import spec files so their declarations register with the environment
    pub async fn import_specs(&self, files: &[PathBuf]) -> Result<()> {
        let files: Vec<String> = files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();
        self.request("importSpecs", Some(json!({ "files": files })))
            .await?;
        Ok(())
    }
}

/// Framework backed by a spawned process
pub struct ProcessFramework {
    child: Child,
    client: FrameworkClient,
    /// Set when `boot1` reported an installed boot routine
    boot_installed: bool,
}

impl ProcessFramework {
    /// Spawn the framework process and start the I/O tasks
    pub async fn spawn(path: &Path, args: &[String]) -> Result<Self> {
        let mut cmd = Command::new(path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            Error::FrameworkStartFailed(format!("Failed to start {}: {}", path.display(), e))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            Error::FrameworkStartFailed("Failed to get framework stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            Error::FrameworkStartFailed("Failed to get framework stdout".to_string())
        })?;

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let client = FrameworkClient {
            outgoing,
            pending: Arc::new(Mutex::new(Some(HashMap::new()))),
            seq: Arc::new(AtomicI64::new(1)),
            reporter: Arc::new(Mutex::new(None)),
        };

        let writer_pending = Arc::clone(&client.pending);
        tokio::spawn(async move {
            let mut writer = tokio::io::BufWriter::new(stdin);
            while let Some(json) = outgoing_rx.recv().await {
                if let Err(e) = codec::write_frame(&mut writer, &json).await {
                    tracing::warn!("Failed to write to framework: {}", e);
                    close_pending(&writer_pending).await;
                    break;
                }
            }
        });

        tokio::spawn(read_loop(
            BufReader::new(stdout),
            Arc::clone(&client.pending),
            Arc::clone(&client.reporter),
        ));

        tracing::info!(framework = %path.display(), pid = ?child.id(), "Spawned framework process");

        Ok(Self {
            child,
            client,
            boot_installed: false,
        })
    }

    /// Handle usable from spec registration callbacks
    pub fn client(&self) -> FrameworkClient {
        self.client.clone()
    }
}

impl Drop for ProcessFramework {
    fn drop(&mut self) {
        // Best effort, drop cannot await the exit
        let _ = self.child.start_kill();
    }
}

/// Route frames from the framework until its stdout closes
async fn read_loop(
    mut reader: BufReader<ChildStdout>,
    pending: PendingMap,
    reporter: Arc<Mutex<Option<Reporter>>>,
) {
    loop {
        let msg = match codec::read_value(&mut reader).await {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                tracing::debug!("Framework closed its output");
                break;
            }
            Err(e) => {
                tracing::warn!("Framework read failed: {}", e);
                break;
            }
        };

        let msg_type = msg
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        match msg_type {
            "response" => match serde_json::from_value::<ResponseMessage>(msg) {
                Ok(response) => {
                    let waiting = pending
                        .lock()
                        .await
                        .as_mut()
                        .and_then(|p| p.remove(&response.request_seq));
                    if let Some(tx) = waiting {
                        let _ = tx.send(response);
                    } else {
                        tracing::trace!(
                            request_seq = response.request_seq,
                            "Response without waiting request"
                        );
                    }
                }
                Err(e) => tracing::warn!("Malformed response: {}", e),
            },
            "event" => match serde_json::from_value::<EventMessage>(msg) {
                Ok(event_msg) => match LifecycleEvent::from_message(&event_msg) {
                    Some(Ok(event)) => {
                        tracing::trace!(event = event.tag(), "lifecycle event");
                        match reporter.lock().await.as_ref() {
                            Some(r) => {
                                r.report(event);
                            }
                            None => tracing::warn!(
                                event = event.tag(),
                                "Dropping lifecycle event, no reporter registered"
                            ),
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(event = %event_msg.event, "Malformed lifecycle payload: {}", e)
                    }
                    None => tracing::debug!(event = %event_msg.event, "Ignoring framework event"),
                },
                Err(e) => tracing::warn!("Malformed event: {}", e),
            },
            _ => tracing::warn!("Unknown message type: {}", msg_type),
        }
    }

    // Dropping the senders fails outstanding requests and closes the
    // reporter channel.
    close_pending(&pending).await;
    reporter.lock().await.take();
}

fn asset_failure(asset: &Asset, e: Error) -> Error {
    match e {
        Error::FrameworkRequestFailed { message, .. } => {
            Error::AssetLoadFailure(format!("{}: {}", asset.url, message))
        }
        other => other,
    }
}

#[async_trait]
impl Framework for ProcessFramework {
    type Options = Value;

    async fn load_assets(&mut self, assets: &[Asset]) -> Result<()> {
        let client = &self.client;
        try_join_all(assets.iter().map(|asset| async move {
            client
                .request("loadAsset", Some(serde_json::to_value(asset)?))
                .await
                .map_err(|e| asset_failure(asset, e))
        }))
        .await?;
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<ReadyState> {
        let body = self.client.request("readyState", None).await?;
        let state = body.get("readyState").cloned().unwrap_or(Value::Null);
        serde_json::from_value(state)
            .map_err(|e| Error::FrameworkProtocol(format!("Invalid readyState: {}", e)))
    }

    async fn wait_for_load(&mut self) -> Result<()> {
        self.client.request("waitForLoad", None).await?;
        Ok(())
    }

    async fn run_boot_script(&mut self, stage: BootStage, script: &Asset) -> Result<()> {
        let body = self
            .client
            .request(
                "runBootScript",
                Some(json!({ "stage": stage, "url": script.url })),
            )
            .await
            .map_err(|e| asset_failure(script, e))?;

        if stage == BootStage::Boot1 {
            self.boot_installed = body
                .get("bootInstalled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
        }
        Ok(())
    }

    fn take_boot_trigger(&mut self) -> Option<BootTrigger> {
        if !std::mem::take(&mut self.boot_installed) {
            return None;
        }
        let client = self.client.clone();
        Some(BootTrigger::new(move || {
            if let Err(e) = client.notify("boot", None) {
                tracing::error!("Failed to trigger framework boot: {}", e);
            }
        }))
    }

    async fn configure(&mut self, options: &Value) -> Result<()> {
        self.client
            .request("configure", Some(json!({ "options": options })))
            .await?;
        Ok(())
    }

    async fn add_reporter(&mut self, reporter: Reporter) -> Result<()> {
        // Install before asking, so no event can slip past.
        *self.client.reporter.lock().await = Some(reporter);
        self.client.request("addReporter", None).await?;
        Ok(())
    }
}
