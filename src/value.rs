use std::fmt;

use config_model::{Primitive, ScalarTag, TypeTag};

use crate::schema::ParameterType;

/// A live parameter value.
///
/// Colors are held as normalized `#RRGGBB` text and value-list selections as
/// their explicit value string; option-list selections are positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset. Only required parameters without a stored value are ever null.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Index(usize),
    List(Vec<Value>),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn ints<I: IntoIterator<Item = i64>>(items: I) -> Self {
        Self::List(items.into_iter().map(Self::Int).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value may be held by a parameter of type `ty`.
    pub fn conforms_to(&self, ty: &ParameterType) -> bool {
        match (ty, self) {
            (_, Self::Null) => true,
            (ParameterType::Options(list), Self::Index(index)) => list.contains(*index),
            (ParameterType::Values(list), Self::Text(text)) => list.contains_value(text),
            (ParameterType::Scalar(tag), value) => value.conforms_to_tag(*tag),
            _ => false,
        }
    }

    fn conforms_to_tag(&self, tag: TypeTag) -> bool {
        if tag.is_array() {
            return match self {
                Self::List(items) => items
                    .iter()
                    .all(|item| item.conforms_to_tag(tag.element())),
                _ => false,
            };
        }
        match (tag.primitive(), self) {
            (_, Self::Null) => true,
            (Primitive::Boolean, Self::Bool(_)) => true,
            (Primitive::Number, Self::Int(_)) => tag.scalar_tag() == ScalarTag::Integer,
            (Primitive::Number, Self::Float(_)) => tag.scalar_tag() == ScalarTag::Float,
            (Primitive::String, Self::Text(_)) => true,
            _ => false,
        }
    }
}

/// Raw text form: option-list selections print as their index, lists as
/// comma-separated items, null as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Index(index) => write!(f, "{index}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
