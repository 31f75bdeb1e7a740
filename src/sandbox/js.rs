use super::host::{self, FetchRequest};
use super::{run_with_deadline, ScriptSandbox};
use crate::error::ScriptError;
use async_trait::async_trait;
use boa_engine::builtins::promise::PromiseState;
use boa_engine::job::SimpleJobQueue;
use boa_engine::object::builtins::JsPromise;
use boa_engine::{
    js_string, Context, JsNativeError, JsResult, JsString, JsValue, NativeFunction, Source,
};
use serde_json::json;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

const PROMISE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Wraps the raw host functions in the shapes scripts expect: a promise
/// returning `fetch` and a Node-style `exec`.
const PRELUDE: &str = r#"
(function (global) {
    const hostFetch = global.__quickwriteFetch;
    const hostExec = global.__quickwriteExec;

    global.fetch = function (url, options) {
        return new Promise(function (resolve) {
            const raw = hostFetch(String(url), options);
            resolve({
                status: raw.status,
                ok: raw.status >= 200 && raw.status < 300,
                url: raw.url,
                text: function () { return Promise.resolve(raw.body); },
                json: function () {
                    return Promise.resolve().then(function () { return JSON.parse(raw.body); });
                },
            });
        });
    };

    global.exec = function (command, callback) {
        const result = hostExec(String(command));
        if (typeof callback !== 'function') {
            return result;
        }
        let error = null;
        if (result.code !== 0) {
            error = new Error('Command failed: ' + command + '\n' + result.stderr);
            error.code = result.code;
        }
        callback(error, result.stdout, result.stderr);
        return undefined;
    };
})(globalThis);
"#;

/// JavaScript snippets: the source is an expression evaluating to a function.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsSandbox;

#[async_trait]
impl ScriptSandbox for JsSandbox {
    async fn evaluate(
        &self,
        trigger: &str,
        source: &str,
        deadline: Duration,
    ) -> Result<String, ScriptError> {
        let trigger = trigger.to_string();
        let source = source.to_string();
        run_with_deadline("js", deadline, move || evaluate_js(&trigger, &source, deadline)).await
    }
}

fn host_fetch(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let url = args
        .first()
        .cloned()
        .unwrap_or_else(JsValue::undefined)
        .to_string(context)?
        .to_std_string_escaped();

    let options = match args.get(1) {
        Some(value) if value.is_object() => value.to_json(context)?,
        _ => serde_json::Value::Null,
    };

    let request = FetchRequest::from_options(url, &options);
    let response = host::fetch(&request)
        .map_err(|err| JsNativeError::typ().with_message(format!("fetch failed: {}", err)))?;

    JsValue::from_json(
        &json!({
            "status": response.status,
            "url": response.url,
            "body": response.body,
        }),
        context,
    )
}

fn host_exec(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let command = args
        .first()
        .cloned()
        .unwrap_or_else(JsValue::undefined)
        .to_string(context)?
        .to_std_string_escaped();

    let output = host::run_shell(&command)
        .map_err(|err| JsNativeError::error().with_message(format!("exec failed: {}", err)))?;

    JsValue::from_json(
        &json!({
            "code": output.code,
            "stdout": output.stdout,
            "stderr": output.stderr,
        }),
        context,
    )
}

fn build_context() -> JsResult<Context> {
    let mut context = Context::builder()
        .job_queue(Rc::new(SimpleJobQueue::new()))
        .build()?;

    context.register_global_callable(
        js_string!("__quickwriteFetch"),
        2,
        NativeFunction::from_fn_ptr(host_fetch),
    )?;
    context.register_global_callable(
        js_string!("__quickwriteExec"),
        1,
        NativeFunction::from_fn_ptr(host_exec),
    )?;
    context.eval(Source::from_bytes(PRELUDE))?;

    Ok(context)
}

fn to_expansion(value: &JsValue, context: &mut Context) -> Result<String, ScriptError> {
    if !(value.is_string() || value.is_number()) {
        return Err(ScriptError::Type(
            "User-defined function returned invalid type. Expected a Promise, string or number."
                .to_string(),
        ));
    }

    value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .map_err(|e| ScriptError::Runtime(e.to_string()))
}

/// Drive the job queue until `promise` settles or `expires` passes.
fn settle(
    promise: &JsPromise,
    context: &mut Context,
    expires: Instant,
    deadline_ms: u64,
) -> Result<String, ScriptError> {
    loop {
        context.run_jobs();
        match promise.state() {
            PromiseState::Fulfilled(value) => return to_expansion(&value, context),
            PromiseState::Rejected(reason) => {
                return Err(ScriptError::Runtime(reason.display().to_string()))
            }
            PromiseState::Pending => {
                if Instant::now() >= expires {
                    return Err(ScriptError::Timeout(deadline_ms));
                }
                thread::sleep(PROMISE_POLL_INTERVAL);
            }
        }
    }
}

/// Evaluate a JavaScript snippet synchronously on the current thread.
/// A returned promise is given until `deadline` to settle.
pub fn evaluate_js(trigger: &str, source: &str, deadline: Duration) -> Result<String, ScriptError> {
    let expires = Instant::now() + deadline;
    let deadline_ms = deadline.as_millis() as u64;
    let mut context = build_context().map_err(|e| ScriptError::Load(e.to_string()))?;

    // Newlines keep a trailing line comment in the source from eating the paren
    let wrapped = format!("(\n{}\n)", source);
    let value = context
        .eval(Source::from_bytes(&wrapped))
        .map_err(|e| ScriptError::Load(e.to_string()))?;

    let Some(function) = value.as_callable().cloned() else {
        return Err(ScriptError::InvalidSnippet(
            "Used snippet code is not a function".to_string(),
        ));
    };

    let returned = function
        .call(
            &JsValue::undefined(),
            &[JsValue::from(JsString::from(trigger))],
            &mut context,
        )
        .map_err(|e| ScriptError::Runtime(e.to_string()))?;

    if returned.is_object() {
        // Promises pass through unchanged; other objects settle on their `then`
        let promise = JsPromise::resolve(returned, &mut context);
        return settle(&promise, &mut context, expires, deadline_ms);
    }
    to_expansion(&returned, &mut context)
}
