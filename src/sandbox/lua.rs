use super::{run_with_deadline, ScriptSandbox};
use crate::error::ScriptError;
use async_trait::async_trait;
use mlua::{Function, HookTriggers, Lua, LuaOptions, StdLib, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Global the script must define; called with the matched trigger.
pub const ENTRY_FUNCTION: &str = "qw";
/// Host function appending to the expansion.
pub const OUTPUT_FUNCTION: &str = "qprint";
/// VM instructions between deadline checks.
pub const INSTRUCTION_HOOK_INTERVAL: u32 = 1000;

/// Lua snippets: no io, os, package or debug libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaSandbox;

#[async_trait]
impl ScriptSandbox for LuaSandbox {
    async fn evaluate(
        &self,
        trigger: &str,
        source: &str,
        deadline: Duration,
    ) -> Result<String, ScriptError> {
        let trigger = trigger.to_string();
        let source = source.to_string();
        run_with_deadline("lua", deadline, move || {
            evaluate_lua(&trigger, &source, deadline)
        })
        .await
    }
}

fn lua_text(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string_lossy().into_owned(),
        other => other.type_name().to_string(),
    }
}

/// Evaluate a Lua snippet synchronously on the current thread. An
/// instruction hook aborts the script once `deadline` has passed, so the
/// thread always finishes.
pub fn evaluate_lua(
    trigger: &str,
    source: &str,
    deadline: Duration,
) -> Result<String, ScriptError> {
    let libs = StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8;
    let lua = Lua::new_with(libs, LuaOptions::default())
        .map_err(|e| ScriptError::Load(e.to_string()))?;

    let expires = Instant::now() + deadline;
    let timed_out = Rc::new(Cell::new(false));
    let flag = Rc::clone(&timed_out);
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(INSTRUCTION_HOOK_INTERVAL),
        move |lua, _| {
            if Instant::now() < expires {
                return Ok(());
            }
            flag.set(true);
            // Fail every instruction from here on so `pcall` cannot keep the script alive
            lua.set_hook(HookTriggers::new().every_nth_instruction(1), |_, _| {
                Err(mlua::Error::runtime("snippet timed out"))
            });
            Err(mlua::Error::runtime("snippet timed out"))
        },
    );
    let timeout = || ScriptError::Timeout(deadline.as_millis() as u64);

    let output = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&output);
    let qprint = lua
        .create_function(move |_, value: Value| {
            sink.borrow_mut().push_str(&lua_text(&value));
            Ok(())
        })
        .map_err(|e| ScriptError::Load(e.to_string()))?;
    lua.globals()
        .set(OUTPUT_FUNCTION, qprint)
        .map_err(|e| ScriptError::Load(e.to_string()))?;

    if let Err(e) = lua.load(source).set_name("snippet").exec() {
        return Err(if timed_out.get() {
            timeout()
        } else {
            ScriptError::Load(e.to_string())
        });
    }

    let entry: Function = lua.globals().get(ENTRY_FUNCTION).map_err(|_| {
        ScriptError::Runtime(format!("global function '{}' is not defined", ENTRY_FUNCTION))
    })?;
    if let Err(e) = entry.call::<_, ()>(trigger) {
        return Err(if timed_out.get() {
            timeout()
        } else {
            ScriptError::Runtime(e.to_string())
        });
    }

    let result = output.borrow().clone();
    Ok(result)
}
