//! Mock framework binary for integration testing
//!
//! Speaks the framework process protocol on stdin/stdout without a real
//! browser. Spec files are YAML plans describing suites and spec outcomes;
//! booting plays them back as Jasmine lifecycle events.
//!
//! Behavior switches (environment):
//! - `MOCK_FRAMEWORK_HANG`: `loadAsset`, `waitForLoad`, `boot0` or `boot1`;
//!   that request never gets a response
//! - `MOCK_FRAMEWORK_READY_STATE`: `loading` (default) or `complete`
//! - `MOCK_FRAMEWORK_NO_BOOT`: boot1 installs no boot routine
//! - `MOCK_FRAMEWORK_EXIT_AFTER`: a command or boot stage after which the
//!   process exits; `boot` exits right after `jasmineStarted`

use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};

fn main() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    let mut state = MockState::from_env();

    loop {
        // Read Content-Length header
        let mut header_line = String::new();
        if reader.read_line(&mut header_line).unwrap_or(0) == 0 {
            break; // EOF
        }

        if !header_line.starts_with("Content-Length:") {
            continue;
        }

        let content_length: usize = header_line
            .trim_start_matches("Content-Length:")
            .trim()
            .parse()
            .unwrap_or(0);

        // Read empty line
        let mut empty_line = String::new();
        reader.read_line(&mut empty_line).ok();

        // Read JSON body
        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            break;
        }

        let message: Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(_) => continue,
        };

        for outgoing in state.process_message(&message) {
            send_message(&mut writer, &outgoing);
        }
        if state.exiting {
            std::process::exit(0);
        }
    }
}

fn send_message<W: Write>(writer: &mut W, message: &Value) {
    let body = serde_json::to_string(message).unwrap();
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).ok();
    writer.write_all(body.as_bytes()).ok();
    writer.flush().ok();
}

/// Spec file contents
#[derive(Debug, Default, Deserialize)]
struct Plan {
    #[serde(default)]
    specs: Vec<PlannedSpec>,
    #[serde(default)]
    suites: Vec<PlannedSuite>,
}

#[derive(Debug, Deserialize)]
struct PlannedSuite {
    name: String,
    #[serde(default)]
    specs: Vec<PlannedSpec>,
    #[serde(default)]
    suites: Vec<PlannedSuite>,
}

#[derive(Debug, Deserialize)]
struct PlannedSpec {
    name: String,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    failures: Vec<String>,
}

fn default_status() -> String {
    "passed".to_string()
}

struct MockState {
    seq: i64,
    hang: Option<String>,
    ready_state: String,
    install_boot: bool,
    exit_after: Option<String>,
    exiting: bool,
    reporter_added: bool,
    options: Value,
    plan: Plan,
    next_id: usize,
}

impl MockState {
    fn from_env() -> Self {
        Self {
            seq: 1,
            hang: std::env::var("MOCK_FRAMEWORK_HANG").ok(),
            ready_state: std::env::var("MOCK_FRAMEWORK_READY_STATE")
                .unwrap_or_else(|_| "loading".to_string()),
            install_boot: std::env::var_os("MOCK_FRAMEWORK_NO_BOOT").is_none(),
            exit_after: std::env::var("MOCK_FRAMEWORK_EXIT_AFTER").ok(),
            exiting: false,
            reporter_added: false,
            options: Value::Null,
            plan: Plan::default(),
            next_id: 0,
        }
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn hangs_on(&self, step: &str) -> bool {
        self.hang.as_deref() == Some(step)
    }

    fn exits_after(&self, step: &str) -> bool {
        self.exit_after.as_deref() == Some(step)
    }

    fn event(&mut self, event: &str, body: Value) -> Value {
        json!({
            "seq": self.next_seq(),
            "type": "event",
            "event": event,
            "body": body
        })
    }

    fn process_message(&mut self, message: &Value) -> Vec<Value> {
        let Some(command) = message.get("command").and_then(|c| c.as_str()) else {
            return Vec::new();
        };
        if message.get("type").and_then(|t| t.as_str()) != Some("request") {
            return Vec::new();
        }
        let request_seq = message.get("seq").and_then(|s| s.as_i64()).unwrap_or(0);
        let arguments = message.get("arguments").cloned().unwrap_or(json!({}));

        let mut after = Vec::new();
        if command != "runBootScript" && command != "boot" {
            self.exiting = self.exits_after(command);
        }
        let result: Option<Result<Value, String>> = match command {
            "loadAsset" => (!self.hangs_on("loadAsset")).then(|| Ok(json!(null))),
            "readyState" => Some(Ok(json!({ "readyState": self.ready_state }))),
            "waitForLoad" => (!self.hangs_on("waitForLoad")).then(|| Ok(json!(null))),
            "runBootScript" => {
                let stage = arguments
                    .get("stage")
                    .and_then(|s| s.as_str())
                    .unwrap_or("")
                    .to_string();
                self.exiting = self.exits_after(&stage);
                if self.hangs_on(&stage) {
                    None
                } else if stage == "boot1" {
                    Some(Ok(json!({ "bootInstalled": self.install_boot })))
                } else {
                    Some(Ok(json!(null)))
                }
            }
            "configure" => {
                self.options = arguments.get("options").cloned().unwrap_or(Value::Null);
                Some(Ok(json!(null)))
            }
            "addReporter" => {
                self.reporter_added = true;
                Some(Ok(json!(null)))
            }
            "importSpecs" => Some(self.import_specs(&arguments)),
            "boot" => {
                after = self.play();
                if self.exits_after("boot") {
                    // consoleLog, jasmineStarted
                    after.truncate(2);
                    self.exiting = true;
                }
                Some(Ok(json!(null)))
            }
            other => Some(Err(format!("Unknown command: {}", other))),
        };

        let Some(result) = result else {
            return Vec::new();
        };

        let seq = self.next_seq();
        let response = match result {
            Ok(body) => json!({
                "seq": seq,
                "type": "response",
                "request_seq": request_seq,
                "success": true,
                "command": command,
                "body": body
            }),
            Err(message) => json!({
                "seq": seq,
                "type": "response",
                "request_seq": request_seq,
                "success": false,
                "command": command,
                "message": message
            }),
        };

        let mut out = vec![response];
        out.extend(after);
        out
    }

    fn import_specs(&mut self, arguments: &Value) -> Result<Value, String> {
        let files = arguments
            .get("files")
            .and_then(|f| f.as_array())
            .cloned()
            .unwrap_or_default();

        for file in files {
            let path = file.as_str().unwrap_or("");
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to fetch dynamically imported module: {} ({})", path, e))?;
            let plan: Plan = serde_yaml::from_str(&content)
                .map_err(|e| format!("SyntaxError in {}: {}", path, e))?;
            self.plan.specs.extend(plan.specs);
            self.plan.suites.extend(plan.suites);
        }
        Ok(json!(null))
    }

    /// Lifecycle events for a full run of the registered plan
    fn play(&mut self) -> Vec<Value> {
        if !self.reporter_added {
            return Vec::new();
        }

        let plan = std::mem::take(&mut self.plan);
        let mut events = vec![
            // Not a reporter callback; must be ignored by the client
            self.event("consoleLog", json!({ "message": "booting" })),
            self.event(
                "jasmineStarted",
                json!({ "totalSpecsDefined": count_specs(&plan), "order": { "random": self.options.get("random").cloned().unwrap_or(json!(true)) } }),
            ),
        ];

        let mut failed = false;
        for spec in &plan.specs {
            failed |= self.play_spec(spec, "", &mut events);
        }
        for suite in &plan.suites {
            failed |= self.play_suite(suite, "", &mut events);
        }

        let status = if failed { "failed" } else { "passed" };
        let done = self.event("jasmineDone", json!({ "overallStatus": status, "totalTime": 12 }));
        events.push(done);
        // Emitted after jasmineDone; must not reach the report
        let stray = self.event("suiteStarted", json!({ "description": "after done" }));
        events.push(stray);
        events
    }

    fn play_suite(&mut self, suite: &PlannedSuite, parent: &str, events: &mut Vec<Value>) -> bool {
        self.next_id += 1;
        let id = format!("suite{}", self.next_id);
        let full_name = join_name(parent, &suite.name);
        let info = json!({ "id": id, "description": suite.name, "fullName": full_name });

        let started = self.event("suiteStarted", info.clone());
        events.push(started);

        let mut failed = false;
        for spec in &suite.specs {
            failed |= self.play_spec(spec, &full_name, events);
        }
        for child in &suite.suites {
            failed |= self.play_suite(child, &full_name, events);
        }

        let done = self.event("suiteDone", info);
        events.push(done);
        failed
    }

    fn play_spec(&mut self, spec: &PlannedSpec, parent: &str, events: &mut Vec<Value>) -> bool {
        self.next_id += 1;
        let id = format!("spec{}", self.next_id);
        let full_name = join_name(parent, &spec.name);

        let started = self.event(
            "specStarted",
            json!({ "id": id, "description": spec.name, "fullName": full_name }),
        );
        events.push(started);

        let failed_expectations: Vec<Value> = spec
            .failures
            .iter()
            .map(|m| json!({ "message": m, "stack": format!("Error: {}\n    at <Jasmine>", m), "passed": false }))
            .collect();
        let done = self.event(
            "specDone",
            json!({
                "id": id,
                "description": spec.name,
                "fullName": full_name,
                "status": spec.status,
                "failedExpectations": failed_expectations
            }),
        );
        events.push(done);

        spec.status != "passed" && spec.status != "excluded"
    }
}

fn join_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", parent, name)
    }
}

fn count_specs(plan: &Plan) -> usize {
    fn in_suite(suite: &PlannedSuite) -> usize {
        suite.specs.len() + suite.suites.iter().map(in_suite).sum::<usize>()
    }
    plan.specs.len() + plan.suites.iter().map(in_suite).sum::<usize>()
}
