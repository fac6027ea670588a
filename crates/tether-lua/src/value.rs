use mlua::Value;
use tether_engine::host::{ScriptValue, ValueKind};

/// Lua value, as inspected by the debugger.
#[derive(Clone, Debug, PartialEq)]
pub struct LuaValue(pub Value);

impl LuaValue {
    /// Returns the wrapped Lua value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for LuaValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl ScriptValue for LuaValue {
    fn kind(&self) -> ValueKind {
        match &self.0 {
            Value::Nil => ValueKind::Nil,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::LightUserData(_) => ValueKind::LightUserdata,
            Value::Integer(_) | Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Table(_) => ValueKind::Table,
            Value::Function(_) => ValueKind::Function,
            Value::Thread(_) => ValueKind::Thread,
            Value::UserData(_) | Value::Error(_) => ValueKind::Userdata,
            _ => ValueKind::None,
        }
    }

    /// Renders the value the way `tostring` does, without calling
    /// `__tostring` metamethods.
    fn render(&self) -> String {
        match &self.0 {
            Value::Nil => "nil".into(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => render_number(*n),
            Value::String(s) => s.to_string_lossy().into(),
            Value::Error(e) => e.to_string(),
            value => format!("{}: {:p}", self.kind().name(), value.to_pointer()),
        }
    }

    /// Returns the entries of a table, in `next` order.
    fn entries(&self) -> Vec<(Self, Self)> {
        let Value::Table(table) = &self.0 else {
            return Vec::new();
        };

        table
            .clone()
            .pairs::<Value, Value>()
            .filter_map(|entry| match entry {
                Ok((key, value)) => Some((Self(key), Self(value))),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read table entry");
                    None
                }
            })
            .collect()
    }
}

fn render_number(n: f64) -> String {
    if n.is_nan() {
        "nan".into()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.into()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}
