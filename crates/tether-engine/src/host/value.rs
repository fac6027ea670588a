/// Language-level type tag of a script value.
///
/// The numeric codes are part of the wire format and do not depend on the
/// internal type codes of the embedded interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absence of a value.
    None,

    /// The `nil` value.
    Nil,

    /// A boolean.
    Boolean,

    /// A raw host pointer.
    LightUserdata,

    /// A number.
    Number,

    /// A string.
    String,

    /// A table (the only composite kind).
    Table,

    /// A script or builtin function.
    Function,

    /// A host object.
    Userdata,

    /// A coroutine.
    Thread,
}

impl ValueKind {
    /// Returns the wire code of this kind.
    pub const fn code(self) -> i32 {
        match self {
            Self::None => -1,
            Self::Nil => 0,
            Self::Boolean => 1,
            Self::LightUserdata => 2,
            Self::Number => 3,
            Self::String => 4,
            Self::Table => 5,
            Self::Function => 6,
            Self::Userdata => 7,
            Self::Thread => 8,
        }
    }

    /// Returns the display name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "no value",
            Self::Nil => "nil",
            Self::Boolean => "boolean",
            Self::LightUserdata | Self::Userdata => "userdata",
            Self::Number => "number",
            Self::String => "string",
            Self::Table => "table",
            Self::Function => "function",
            Self::Thread => "thread",
        }
    }

    /// Returns whether values of this kind have children.
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Table)
    }
}

/// Trait providing generic introspection of a script value.
pub trait ScriptValue: Clone {
    /// Type tag of the value.
    fn kind(&self) -> ValueKind;

    /// String rendering of the value.
    fn render(&self) -> String;

    /// Key/value entries of a composite value.
    ///
    /// The entries are returned in insertion order. Leaf values have no
    /// entries.
    fn entries(&self) -> Vec<(Self, Self)>;
}
