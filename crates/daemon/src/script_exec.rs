// Script execution (C9): runs a caller-supplied Lua source file inside the
// daemon process with the live adapter and capture metadata injected.
//
// The original tool embeds Python directly in the daemon's address space;
// since the replay controller here is an opaque Rust trait object rather
// than a live Python object, the idiomatic equivalent the example pack
// actually reaches for is `mlua` (grounded on `crucible-lua`'s
// `LuaExecutor`: a persistent `mlua::Lua`, host state exposed as globals,
// `print` captured instead of going to the daemon's real stdout).

use std::collections::HashMap;
use std::time::Instant;

use mlua::{Lua, MultiValue, Value as LuaValue, Variadic};
use serde_json::Value as JsonValue;

use crate::adapter::ReplayAdapter;

pub struct ScriptOutcome {
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
    pub return_value: JsonValue,
}

/// Run `source` with `args` and the capture's current state injected.
///
/// Never panics and never propagates a Lua error to the caller as an
/// `Err` — a script that throws still produces an `Ok(ScriptOutcome)`
/// with a populated `stderr` and `return_value: null`, so a misbehaving
/// script can't take the daemon down with it.
pub fn run_script(
    source: &str,
    args: &HashMap<String, String>,
    adapter: &ReplayAdapter,
    capture_path: &str,
) -> ScriptOutcome {
    let started = Instant::now();
    let lua = Lua::new();

    let stdout = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
    install_print_capture(&lua, std::rc::Rc::clone(&stdout));
    install_args_table(&lua, args);
    install_capture_table(&lua, adapter, capture_path);

    let exec_result = lua.load(source).exec();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let stderr = match &exec_result {
        Ok(()) => String::new(),
        Err(error) => error.to_string(),
    };

    let return_value = if exec_result.is_ok() {
        lua.globals()
            .get::<_, LuaValue>("result")
            .ok()
            .map(|value| lua_value_to_json(&lua, value))
            .unwrap_or(JsonValue::Null)
    } else {
        JsonValue::Null
    };

    ScriptOutcome { stdout: stdout.borrow().clone(), stderr, elapsed_ms, return_value }
}

fn install_print_capture(lua: &Lua, buffer: std::rc::Rc<std::cell::RefCell<String>>) {
    let print = lua
        .create_function(move |_, values: Variadic<LuaValue>| {
            let mut out = buffer.borrow_mut();
            let rendered: Vec<String> = values.iter().map(render_for_print).collect();
            out.push_str(&rendered.join("\t"));
            out.push('\n');
            Ok(())
        })
        .expect("print capture closure should construct");
    lua.globals().set("print", print).expect("globals should accept `print`");
}

fn render_for_print(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => n.to_string(),
        LuaValue::String(s) => s.to_str().unwrap_or("<invalid utf8>").to_string(),
        other => format!("{other:?}"),
    }
}

fn install_args_table(lua: &Lua, args: &HashMap<String, String>) {
    let table = lua.create_table().expect("args table should construct");
    for (key, value) in args {
        table.set(key.as_str(), value.as_str()).expect("args entry should set");
    }
    lua.globals().set("args", table).expect("globals should accept `args`");
}

fn install_capture_table(lua: &Lua, adapter: &ReplayAdapter, capture_path: &str) {
    let table = lua.create_table().expect("capture table should construct");
    table.set("path", capture_path).expect("capture.path should set");
    table.set("max_eid", adapter.max_eid()).expect("capture.max_eid should set");
    table.set("current_eid", adapter.current_eid()).expect("capture.current_eid should set");
    lua.globals().set("capture", table).expect("globals should accept `capture`");
}

fn lua_value_to_json(lua: &Lua, value: LuaValue) -> JsonValue {
    match value {
        LuaValue::Nil => JsonValue::Null,
        LuaValue::Boolean(b) => JsonValue::Bool(b),
        LuaValue::Integer(i) => JsonValue::Number(i.into()),
        LuaValue::Number(n) => {
            serde_json::Number::from_f64(n).map(JsonValue::Number).unwrap_or(JsonValue::Null)
        }
        LuaValue::String(s) => JsonValue::String(s.to_str().unwrap_or_default().to_string()),
        LuaValue::Table(table) => {
            let is_array = table.clone().pairs::<LuaValue, LuaValue>().enumerate().all(
                |(index, pair)| matches!(pair, Ok((LuaValue::Integer(i), _)) if i as usize == index + 1),
            );
            if is_array {
                let mut items = Vec::new();
                for pair in table.sequence_values::<LuaValue>() {
                    let item = pair.unwrap_or(LuaValue::Nil);
                    items.push(lua_value_to_json(lua, item));
                }
                JsonValue::Array(items)
            } else {
                let mut map = serde_json::Map::new();
                for pair in table.pairs::<LuaValue, LuaValue>().flatten() {
                    let (key, value) = pair;
                    let key = render_for_print(&key);
                    map.insert(key, lua_value_to_json(lua, value));
                }
                JsonValue::Object(map)
            }
        }
        other => JsonValue::String(tostring(lua, &other)),
    }
}

fn tostring(lua: &Lua, value: &LuaValue) -> String {
    lua.globals()
        .get::<_, mlua::Function>("tostring")
        .ok()
        .and_then(|f| f.call::<_, MultiValue>(value.clone()).ok())
        .and_then(|multi| multi.into_iter().next())
        .map(|v| render_for_print(&v))
        .unwrap_or_else(|| "<unrepresentable>".to_string())
}
