//! Out-of-process adapters for the two external collaborators.
//!
//! The page driver and the CAPTCHA recognizer run as child processes
//! speaking newline-delimited JSON over stdin/stdout. The driver owns the
//! actual browser, one child per portal connection; dropping the page
//! kills the child, which is what tears a session down. The recognizer is
//! long-lived and shared across workers.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use base64::Engine as _;
use gradewatch_core::{LoginUrl, PageProbe};
use gradewatch_engine::{
    CaptchaOracle, Control, Field, PortalConnector, PortalError, PortalFaultKind, PortalPage,
};
use portal_logging::watch_warn;
use serde::Deserialize;
use serde_json::json;

/// Spawns driver children for one portal connection each. The login URL is
/// handed to the child as its last argument.
pub struct CommandConnector {
    cmd: Vec<String>,
    login_url: LoginUrl,
}

impl CommandConnector {
    pub fn new(cmd: Vec<String>, login_url: LoginUrl) -> Self {
        Self { cmd, login_url }
    }
}

impl PortalConnector for CommandConnector {
    fn connect(&self) -> Result<Box<dyn PortalPage>, PortalError> {
        let (child, stdin, stdout) = spawn_child(&self.cmd, Some(self.login_url.as_str()))?;
        Ok(Box::new(DriverPage {
            child,
            stdin,
            stdout,
        }))
    }
}

struct DriverPage {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl DriverPage {
    fn request(&mut self, payload: serde_json::Value) -> Result<serde_json::Value, PortalError> {
        writeln!(self.stdin, "{payload}").map_err(|err| {
            PortalError::new(PortalFaultKind::ConnectionLost, err.to_string())
        })?;
        self.stdin.flush().map_err(|err| {
            PortalError::new(PortalFaultKind::ConnectionLost, err.to_string())
        })?;

        let mut reply = String::new();
        let read = self.stdout.read_line(&mut reply).map_err(|err| {
            PortalError::new(PortalFaultKind::ConnectionLost, err.to_string())
        })?;
        if read == 0 {
            return Err(PortalError::new(
                PortalFaultKind::ConnectionLost,
                "driver closed its stdout",
            ));
        }

        let value: serde_json::Value = serde_json::from_str(reply.trim()).map_err(|err| {
            PortalError::new(PortalFaultKind::Driver, format!("bad driver reply: {err}"))
        })?;
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            let kind = match value.get("kind").and_then(|v| v.as_str()) {
                Some("missing_element") => PortalFaultKind::MissingElement,
                Some("stale_page") => PortalFaultKind::StalePage,
                Some("timeout") => PortalFaultKind::Timeout,
                _ => PortalFaultKind::Driver,
            };
            return Err(PortalError::new(kind, message));
        }
        Ok(value)
    }
}

impl Drop for DriverPage {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProbeReply {
    #[serde(default)]
    challenge: bool,
    #[serde(default)]
    login_form: bool,
    #[serde(default)]
    consent_present: bool,
    #[serde(default)]
    consent_visible: bool,
    #[serde(default)]
    main_menu: bool,
    #[serde(default)]
    results_table: bool,
}

impl PortalPage for DriverPage {
    fn probe(&mut self) -> Result<PageProbe, PortalError> {
        let value = self.request(json!({ "op": "probe" }))?;
        let reply: ProbeReply = serde_json::from_value(value).map_err(|err| {
            PortalError::new(PortalFaultKind::Driver, format!("bad probe reply: {err}"))
        })?;
        Ok(PageProbe {
            challenge: reply.challenge,
            login_form: reply.login_form,
            consent_present: reply.consent_present,
            consent_visible: reply.consent_visible,
            main_menu: reply.main_menu,
            results_table: reply.results_table,
        })
    }

    fn fill(&mut self, field: Field, value: &str) -> Result<(), PortalError> {
        self.request(json!({ "op": "fill", "field": field_name(field), "value": value }))?;
        Ok(())
    }

    fn click(&mut self, control: Control) -> Result<(), PortalError> {
        self.request(json!({ "op": "click", "control": control_name(control) }))?;
        Ok(())
    }

    fn captcha_image(&mut self) -> Result<Vec<u8>, PortalError> {
        let value = self.request(json!({ "op": "captcha_image" }))?;
        let encoded = value
            .get("image_b64")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PortalError::new(PortalFaultKind::Driver, "captcha reply without image")
            })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|err| {
                PortalError::new(PortalFaultKind::Driver, format!("bad captcha image: {err}"))
            })
    }

    fn reload(&mut self) -> Result<(), PortalError> {
        self.request(json!({ "op": "reload" }))?;
        Ok(())
    }

    fn results_table_html(&mut self) -> Result<String, PortalError> {
        let value = self.request(json!({ "op": "results_table" }))?;
        value
            .get("html")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| PortalError::new(PortalFaultKind::Driver, "results reply without html"))
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Username => "username",
        Field::Password => "password",
        Field::Captcha => "captcha",
    }
}

fn control_name(control: Control) -> &'static str {
    match control {
        Control::Login => "login",
        Control::ConsentAccept => "consent_accept",
        Control::MenuGrades => "menu_grades",
        Control::MenuExamResults => "menu_exam_results",
        Control::MenuShowAll => "menu_show_all",
    }
}

/// Long-lived recognizer child. A fault kills it; the next call respawns.
pub struct CommandOracle {
    cmd: Vec<String>,
    proc: Mutex<Option<OracleProc>>,
}

struct OracleProc {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for OracleProc {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl CommandOracle {
    pub fn new(cmd: Vec<String>) -> Self {
        Self {
            cmd,
            proc: Mutex::new(None),
        }
    }
}

impl CaptchaOracle for CommandOracle {
    fn recognize(&self, image: &[u8]) -> Option<u32> {
        let mut guard = self.proc.lock().expect("lock recognizer process");
        match recognize_via(&mut guard, &self.cmd, image) {
            Ok(answer) => answer,
            Err(err) => {
                watch_warn!("CAPTCHA recognizer failed: {}. Respawning next time.", err);
                *guard = None;
                None
            }
        }
    }
}

fn recognize_via(
    proc: &mut Option<OracleProc>,
    cmd: &[String],
    image: &[u8],
) -> Result<Option<u32>, PortalError> {
    if proc.is_none() {
        let (child, stdin, stdout) = spawn_child(cmd, None)?;
        *proc = Some(OracleProc {
            child,
            stdin,
            stdout,
        });
    }
    let active = proc.as_mut().ok_or_else(|| {
        PortalError::new(PortalFaultKind::Driver, "recognizer process unavailable")
    })?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    writeln!(active.stdin, "{}", json!({ "image_b64": encoded })).map_err(|err| {
        PortalError::new(PortalFaultKind::ConnectionLost, err.to_string())
    })?;

    let mut reply = String::new();
    let read = active.stdout.read_line(&mut reply).map_err(|err| {
        PortalError::new(PortalFaultKind::ConnectionLost, err.to_string())
    })?;
    if read == 0 {
        return Err(PortalError::new(
            PortalFaultKind::ConnectionLost,
            "recognizer closed its stdout",
        ));
    }

    let value: serde_json::Value = serde_json::from_str(reply.trim()).map_err(|err| {
        PortalError::new(
            PortalFaultKind::Driver,
            format!("bad recognizer reply: {err}"),
        )
    })?;
    Ok(value
        .get("value")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok()))
}

fn spawn_child(
    cmd: &[String],
    extra_arg: Option<&str>,
) -> Result<(Child, ChildStdin, BufReader<ChildStdout>), PortalError> {
    let program = cmd
        .first()
        .ok_or_else(|| PortalError::new(PortalFaultKind::Driver, "empty adapter command"))?;
    let mut command = Command::new(program);
    command.args(&cmd[1..]);
    if let Some(arg) = extra_arg {
        command.arg(arg);
    }
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|err| {
            PortalError::new(
                PortalFaultKind::Driver,
                format!("failed to spawn {program}: {err}"),
            )
        })?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| PortalError::new(PortalFaultKind::Driver, "child stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PortalError::new(PortalFaultKind::Driver, "child stdout unavailable"))?;
    Ok((child, stdin, BufReader::new(stdout)))
}
