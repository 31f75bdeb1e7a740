use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use std::io;
use std::process::Command;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl FetchRequest {
    /// Build a request from a `fetch(url, options)` style options object.
    pub fn from_options(url: impl Into<String>, options: &Value) -> Self {
        let method = options
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let headers = options
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(name, value)| {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (name.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let body = match options.get("body") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Self {
            url: url.into(),
            method,
            headers,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// Perform an HTTP request on behalf of a snippet script.
pub fn fetch(request: &FetchRequest) -> Result<FetchResponse, String> {
    let method = Method::from_bytes(request.method.as_bytes())
        .map_err(|_| format!("invalid HTTP method '{}'", request.method))?;

    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;

    let mut builder = client.request(method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    tracing::debug!(url = %request.url, method = %request.method, "snippet fetch");
    let response = builder.send().map_err(|e| e.to_string())?;
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let body = response.text().map_err(|e| e.to_string())?;

    Ok(FetchResponse { status, url, body })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` through the user's shell and collect its output.
pub fn run_shell(command: &str) -> io::Result<ShellOutput> {
    tracing::debug!(command, "snippet exec");

    #[cfg(target_os = "windows")]
    let output = Command::new("cmd").args(["/c", command]).output()?;

    #[cfg(not(target_os = "windows"))]
    let output = {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        Command::new(&shell).args(["-c", command]).output()?
    };

    Ok(ShellOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
