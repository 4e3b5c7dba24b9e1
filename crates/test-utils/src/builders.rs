use livesync::api::Snapshot;
use livesync::types::ControlStatus;
use serde_json::{json, Value};

/// Builder for `Snapshot`, going through the same JSON decoding the HTTP
/// client uses.
pub struct SnapshotBuilder {
    execution: Value,
    steps: Vec<Value>,
    logs: Vec<Value>,
    screenshot: Option<String>,
    control: Option<Value>,
}

impl SnapshotBuilder {
    pub fn new(status: ControlStatus) -> Self {
        Self {
            execution: json!({
                "status": status.to_string(),
                "task_id": 7,
                "total_steps": 0,
                "completed_steps": 0,
                "started_at": "2026-01-01T10:00:00",
            }),
            steps: Vec::new(),
            logs: Vec::new(),
            screenshot: None,
            control: None,
        }
    }

    pub fn running() -> Self {
        Self::new(ControlStatus::Running)
    }

    pub fn progress(mut self, completed: u32, total: u32) -> Self {
        self.execution["completed_steps"] = json!(completed);
        self.execution["total_steps"] = json!(total);
        self
    }

    pub fn result(mut self, result: &str) -> Self {
        self.execution["result"] = json!(result);
        self
    }

    pub fn step(mut self, step_number: u32, status: &str, description: &str) -> Self {
        self.steps.push(json!({
            "step_number": step_number,
            "status": status,
            "description": description,
            "action_type": "click",
        }));
        self
    }

    pub fn log(mut self, level: &str, message: &str) -> Self {
        self.logs.push(json!({
            "timestamp": "2026-01-01T10:00:01",
            "level": level,
            "message": message,
        }));
        self
    }

    pub fn logs(mut self, count: usize) -> Self {
        for i in 0..count {
            self = self.log("INFO", &format!("seed line {i}"));
        }
        self
    }

    pub fn screenshot(mut self, data: &str) -> Self {
        self.screenshot = Some(data.to_string());
        self
    }

    pub fn stopping(mut self) -> Self {
        self.control = Some(json!({
            "is_paused": false,
            "is_stopping": true,
            "is_running": true,
        }));
        self
    }

    /// The JSON body as the backend would send it.
    pub fn to_json(&self) -> Value {
        json!({
            "execution": self.execution,
            "steps": self.steps,
            "logs": self.logs,
            "screenshot": self.screenshot,
            "control": self.control,
        })
    }

    pub fn build(self) -> Snapshot {
        serde_json::from_value(self.to_json()).expect("builder produced an invalid snapshot")
    }
}

/// Text frames as the live stream pushes them.
pub mod frames {
    use serde_json::{json, Value};

    fn frame(kind: &str, data: Value) -> String {
        json!({ "type": kind, "data": data }).to_string()
    }

    pub fn step_update(step_number: u32, status: &str) -> String {
        frame(
            "step_update",
            json!({ "step_number": step_number, "status": status }),
        )
    }

    /// A `step_update` carrying arbitrary extra fields.
    pub fn step_update_with(step_number: u32, fields: Value) -> String {
        let mut data = json!({ "step_number": step_number });
        if let (Some(data), Some(fields)) = (data.as_object_mut(), fields.as_object()) {
            for (k, v) in fields {
                data.insert(k.clone(), v.clone());
            }
        }
        frame("step_update", data)
    }

    pub fn screenshot(data: &str) -> String {
        frame("screenshot_update", json!({ "screenshot": data }))
    }

    pub fn log(level: &str, message: &str) -> String {
        frame(
            "log",
            json!({ "level": level, "message": message, "timestamp": "2026-01-01T10:00:02" }),
        )
    }

    pub fn initial_logs(messages: &[&str]) -> String {
        let logs: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "level": "INFO", "message": m }))
            .collect();
        frame("initial_logs", json!({ "logs": logs }))
    }

    pub fn progress(current_step: u32, total_steps: u32) -> String {
        frame(
            "progress_update",
            json!({ "current_step": current_step, "total_steps": total_steps }),
        )
    }

    pub fn control(status: &str) -> String {
        frame("control_update", json!({ "status": status }))
    }

    pub fn complete(status: &str, error: Option<&str>) -> String {
        frame(
            "execution_complete",
            json!({ "status": status, "error": error }),
        )
    }
}
