use std::fmt;

use anyhow::{Result, bail, ensure};

/// Modifier bit that turns any scalar type code into "ordered sequence of".
pub const ARRAY_MODIFIER: u16 = 0x1000;
const MODIFIER_MASK: u16 = 0xF000;

/// Closed set of scalar value types a parameter can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    Bool,
    Integer,
    Float,
    Str,
    Alpha,
    AlphaNum,
    Url,
    /// URL-like, but also accepts a `~` local shorthand and protocol-less forms.
    Source,
    Path,
    Page,
    File,
    Color,
}

/// What a scalar decodes to once it leaves the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Number,
    String,
}

impl ScalarTag {
    pub const ALL: [Self; 12] = [
        Self::Bool,
        Self::Integer,
        Self::Float,
        Self::Str,
        Self::Alpha,
        Self::AlphaNum,
        Self::Url,
        Self::Source,
        Self::Path,
        Self::Page,
        Self::File,
        Self::Color,
    ];

    pub const fn code(self) -> u16 {
        match self {
            Self::Bool => 0x01,
            Self::Integer => 0x02,
            Self::Float => 0x03,
            Self::Str => 0x10,
            Self::Alpha => 0x11,
            Self::AlphaNum => 0x12,
            Self::Url => 0x20,
            Self::Source => 0x30,
            Self::Path => 0x40,
            Self::Page => 0x50,
            Self::File => 0x60,
            Self::Color => 0x70,
        }
    }

    pub fn from_code(code: u16) -> Result<Self> {
        match Self::ALL.iter().find(|tag| tag.code() == code) {
            Some(tag) => Ok(*tag),
            None => bail!("unsupported scalar type code {code:#06x}"),
        }
    }

    pub const fn primitive(self) -> Primitive {
        match self {
            Self::Bool => Primitive::Boolean,
            Self::Integer | Self::Float => Primitive::Number,
            Self::Str
            | Self::Alpha
            | Self::AlphaNum
            | Self::Url
            | Self::Source
            | Self::Path
            | Self::Page
            | Self::File
            | Self::Color => Primitive::String,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Alpha => "alpha",
            Self::AlphaNum => "alphanumeric",
            Self::Url => "url",
            Self::Source => "source",
            Self::Path => "path",
            Self::Page => "page",
            Self::File => "file",
            Self::Color => "color",
        }
    }
}

impl fmt::Display for ScalarTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar tag plus the array modifier. Arrays never nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    scalar: ScalarTag,
    array: bool,
}

impl TypeTag {
    pub const fn scalar(scalar: ScalarTag) -> Self {
        Self {
            scalar,
            array: false,
        }
    }

    pub const fn array(scalar: ScalarTag) -> Self {
        Self {
            scalar,
            array: true,
        }
    }

    /// Decodes a packed type code (`scalar | ARRAY_MODIFIER?`).
    pub fn from_code(code: u16) -> Result<Self> {
        let modifiers = code & MODIFIER_MASK;
        ensure!(
            modifiers == 0 || modifiers == ARRAY_MODIFIER,
            "unsupported type modifier {modifiers:#06x}"
        );
        let scalar = ScalarTag::from_code(code & !MODIFIER_MASK)?;
        Ok(Self {
            scalar,
            array: modifiers == ARRAY_MODIFIER,
        })
    }

    pub const fn code(self) -> u16 {
        if self.array {
            self.scalar.code() | ARRAY_MODIFIER
        } else {
            self.scalar.code()
        }
    }

    pub const fn scalar_tag(self) -> ScalarTag {
        self.scalar
    }

    pub const fn is_array(self) -> bool {
        self.array
    }

    pub const fn primitive(self) -> Primitive {
        self.scalar.primitive()
    }

    /// The element type of an array, or the type itself for scalars.
    pub const fn element(self) -> Self {
        Self::scalar(self.scalar)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array {
            write!(f, "{}[]", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}
