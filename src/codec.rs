//! Conversions between parameter values, user-entered text, and the compact
//! tokens of the persisted blob.

use config_model::{
    DecodedInt, INVALID_MARKER, OptionList, ScalarTag, TypeTag, ValueList, crc32, decode_int,
    encode_int, encode_number, lookup_color,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::{ParamName, ParameterDeclaration, ParameterType, SCHEMA_VERSION, Schema};
use crate::value::Value;

/// Everything but the unreserved URI component characters is escaped, which
/// covers both blob delimiters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TOKEN_DELIMITER: &str = ",";
const ELEMENT_DELIMITER: &str = ":";

static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]*$").expect("valid regex"));
static ALPHA_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]*$").expect("valid regex"));
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:\w+:?\w*@)?\S+$").expect("valid regex"));
static SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:https?://)?~?(?:\w+:?\w*@)?\S+$").expect("valid regex"));
static PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-/]*$").expect("valid regex"));
static PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-]*$").expect("valid regex"));
static FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-.]*$").expect("valid regex"));
static NUMERIC_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?[0-9a-f]+$").expect("valid regex"));
static RGB_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\(\s*([0-9]+)\s*,\s*([0-9]+)\s*,\s*([0-9]+)\s*\)$").expect("valid regex")
});

/// Parses user-entered text into a value of the declared type.
///
/// Input is trimmed first; blank input yields the declared default, or a
/// configuration error when the parameter is required. Every rejection is a
/// [`Error::Config`] naming the parameter by its description.
pub fn parse(decl: &ParameterDeclaration, raw: &str) -> Result<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return decl
            .default
            .clone()
            .ok_or_else(|| blank(decl.description));
    }
    match &decl.ty {
        ParameterType::Options(list) => parse_option(decl, list, raw),
        ParameterType::Values(list) => parse_value_choice(decl, list, raw),
        ParameterType::Scalar(tag) if tag.is_array() => parse_array(decl, raw),
        ParameterType::Scalar(tag) => parse_scalar(decl, tag.scalar_tag(), decl.description, raw),
    }
}

fn blank(description: &str) -> Error {
    Error::config(format!("'{description}' may not be left blank"))
}

fn parse_option(decl: &ParameterDeclaration, list: &OptionList, raw: &str) -> Result<Value> {
    list.index_of_value(raw)
        .or_else(|| list.index_of_name(raw))
        .or_else(|| list.index_of_text(raw))
        .map(Value::Index)
        .ok_or_else(|| Error::config(format!("Invalid {}", decl.name)).with_info(raw))
}

/// Value lists accept the explicit value only, with no case folding.
fn parse_value_choice(decl: &ParameterDeclaration, list: &ValueList, raw: &str) -> Result<Value> {
    if list.contains_value(raw) {
        Ok(Value::text(raw))
    } else {
        Err(Error::config(format!("Invalid {}", decl.name)).with_info(raw))
    }
}

fn parse_array(decl: &ParameterDeclaration, raw: &str) -> Result<Value> {
    let items: Vec<&str> = raw.split(TOKEN_DELIMITER).map(str::trim).collect();
    let description = decl.description;
    if let Some(min) = decl.min_size
        && items.len() < min
    {
        return Err(
            Error::config(format!("'{description}' must have at least {min} entries"))
                .with_info(raw),
        );
    }
    if let Some(max) = decl.max_size
        && items.len() > max
    {
        return Err(
            Error::config(format!("'{description}' may not have more than {max} entries"))
                .with_info(raw),
        );
    }
    let Some(tag) = decl.scalar_tag() else {
        return Err(Error::assertion("Array parse on a list type").with_info(decl.name));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let label = format!("{description}[{index}]");
            if item.is_empty() {
                return Err(blank(&label));
            }
            parse_scalar(decl, tag.scalar_tag(), &label, item)
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

fn parse_scalar(
    decl: &ParameterDeclaration,
    tag: ScalarTag,
    label: &str,
    raw: &str,
) -> Result<Value> {
    let invalid = |what: &str| Error::config(format!("'{label}' is not a valid {what}")).with_info(raw);
    match tag {
        ScalarTag::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean")),
        },
        ScalarTag::Integer => {
            let value: i64 = raw.parse().map_err(|_| invalid("integer"))?;
            check_bounds(decl, label, value as f64, &value)?;
            Ok(Value::Int(value))
        }
        ScalarTag::Float => {
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| invalid("floating point decimal"))?;
            check_bounds(decl, label, value, &value)?;
            Ok(Value::Float(value))
        }
        ScalarTag::Str => text_in_bounds(decl, label, raw),
        ScalarTag::Alpha => {
            if !ALPHA.is_match(raw) {
                return Err(invalid("alphabetic string"));
            }
            text_in_bounds(decl, label, raw)
        }
        ScalarTag::AlphaNum => {
            if !ALPHA_NUM.is_match(raw) {
                return Err(invalid("alphanumeric string"));
            }
            text_in_bounds(decl, label, raw)
        }
        ScalarTag::Url => matching(&URL, raw).ok_or_else(|| invalid("URL")),
        ScalarTag::Source => matching(&SOURCE, raw).ok_or_else(|| invalid("source")),
        ScalarTag::Path => matching(&PATH, raw).ok_or_else(|| invalid("path")),
        ScalarTag::Page => matching(&PAGE, raw).ok_or_else(|| invalid("page")),
        ScalarTag::File => matching(&FILE, raw).ok_or_else(|| invalid("file")),
        ScalarTag::Color => parse_color(label, raw).map(Value::Text),
    }
}

fn matching(pattern: &Regex, raw: &str) -> Option<Value> {
    pattern.is_match(raw).then(|| Value::text(raw))
}

fn check_bounds(
    decl: &ParameterDeclaration,
    label: &str,
    value: f64,
    shown: &dyn std::fmt::Display,
) -> Result<()> {
    if let Some(min) = decl.min
        && value < min
    {
        return Err(Error::config(format!("'{label}' may not be less than {min}")).with_info(shown));
    }
    if let Some(max) = decl.max
        && value > max
    {
        return Err(
            Error::config(format!("'{label}' may not be greater than {max}")).with_info(shown),
        );
    }
    Ok(())
}

/// For string types the numeric bounds limit the length in characters.
fn text_in_bounds(decl: &ParameterDeclaration, label: &str, raw: &str) -> Result<Value> {
    let length = raw.chars().count() as f64;
    if let Some(min) = decl.min
        && length < min
    {
        return Err(
            Error::config(format!("'{label}' must have at least {min} characters")).with_info(raw),
        );
    }
    if let Some(max) = decl.max
        && length > max
    {
        return Err(
            Error::config(format!("'{label}' may not have more than {max} characters"))
                .with_info(raw),
        );
    }
    Ok(Value::text(raw))
}

/// Normalized `#RRGGBB` form of a packed RGB value.
pub fn hex_color(rgb: u32) -> String {
    format!("#{rgb:06X}")
}

/// Accepts `#hex`, bare hex digits, `rgb(r,g,b)` or a CSS color name.
pub fn parse_color(label: &str, raw: &str) -> Result<String> {
    let lower = raw.to_ascii_lowercase();
    if NUMERIC_COLOR.is_match(&lower) {
        let digits = lower.strip_prefix('#').unwrap_or(&lower);
        return match u32::from_str_radix(digits, 16) {
            Ok(rgb) if rgb <= 0xFF_FFFF => Ok(hex_color(rgb)),
            _ => Err(
                Error::config(format!("'{label}' is outside the valid color range")).with_info(raw),
            ),
        };
    }
    if let Some(captures) = RGB_COLOR.captures(&lower) {
        let mut rgb = 0u32;
        for channel in 1..=3 {
            let component = captures[channel]
                .parse::<u32>()
                .ok()
                .filter(|component| *component <= 255)
                .ok_or_else(|| {
                    Error::config(format!("'{label}' is not a valid RGB color")).with_info(raw)
                })?;
            rgb = (rgb << 8) | component;
        }
        return Ok(hex_color(rgb));
    }
    lookup_color(&lower)
        .map(hex_color)
        .ok_or_else(|| Error::config(format!("'{label}' is not a valid color")).with_info(raw))
}

/// Encodes a value as one blob token.
///
/// Scalars are packed and then percent-escaped; array elements are joined with
/// `:`. A value that does not fit the type encodes as the invalid marker.
pub fn encode(value: &Value, ty: &ParameterType) -> String {
    match (ty, value) {
        (_, Value::Null) => String::new(),
        (ParameterType::Scalar(tag), Value::List(items)) if tag.is_array() => {
            let element = tag.element();
            items
                .iter()
                .map(|item| escape(&encode_scalar(item, element)))
                .collect::<Vec<_>>()
                .join(ELEMENT_DELIMITER)
        }
        (ParameterType::Scalar(tag), _) if tag.is_array() => INVALID_MARKER.to_string(),
        (ParameterType::Scalar(tag), value) => escape(&encode_scalar(value, *tag)),
        (ParameterType::Options(_), Value::Index(index)) => escape(&encode_int(*index as i64)),
        (ParameterType::Values(_), Value::Text(text)) => escape(text),
        (ParameterType::Options(_) | ParameterType::Values(_), _) => INVALID_MARKER.to_string(),
    }
}

fn escape(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

fn encode_scalar(value: &Value, tag: TypeTag) -> String {
    let invalid = || INVALID_MARKER.to_string();
    match (tag.scalar_tag(), value) {
        (_, Value::Null) => String::new(),
        (ScalarTag::Bool, Value::Bool(false)) => "0".to_string(),
        (ScalarTag::Bool, Value::Bool(true)) => "1".to_string(),
        (ScalarTag::Integer, Value::Int(value)) => encode_int(*value),
        (ScalarTag::Integer, Value::Float(value)) => encode_number(*value),
        (ScalarTag::Float, Value::Float(value)) => value.to_string(),
        (ScalarTag::Float, Value::Int(value)) => value.to_string(),
        (ScalarTag::Color, Value::Text(text)) if text.is_empty() => String::new(),
        (ScalarTag::Color, Value::Text(text)) => text
            .strip_prefix('#')
            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
            .map(|rgb| encode_int(i64::from(rgb)))
            .unwrap_or_else(invalid),
        (
            ScalarTag::Str
            | ScalarTag::Alpha
            | ScalarTag::AlphaNum
            | ScalarTag::Url
            | ScalarTag::Source
            | ScalarTag::Path
            | ScalarTag::Page
            | ScalarTag::File,
            Value::Text(text),
        ) => text.clone(),
        _ => invalid(),
    }
}

/// Inverse of [`encode`]. An empty token decodes to [`Value::Null`], except
/// for free-text types where it is the empty string and arrays where it is
/// the empty sequence.
pub fn decode(token: &str, ty: &ParameterType) -> Result<Value> {
    match ty {
        ParameterType::Scalar(tag) if tag.is_array() => {
            if token.is_empty() {
                return Ok(Value::List(Vec::new()));
            }
            token
                .split(ELEMENT_DELIMITER)
                .map(|element| decode_scalar(&unescape(element)?, tag.element()))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        ParameterType::Scalar(tag) => decode_scalar(&unescape(token)?, *tag),
        ParameterType::Options(_) => match decode_int(&unescape(token)?) {
            DecodedInt::Null => Ok(Value::Null),
            DecodedInt::Int(index) => usize::try_from(index)
                .map(Value::Index)
                .map_err(|_| undecodable(token)),
            DecodedInt::Invalid => Err(undecodable(token)),
        },
        ParameterType::Values(_) => {
            let raw = unescape(token)?;
            Ok(if raw.is_empty() {
                Value::Null
            } else {
                Value::Text(raw)
            })
        }
    }
}

fn undecodable(token: &str) -> Error {
    Error::config("Undecodable value").with_info(token)
}

fn unescape(token: &str) -> Result<String> {
    percent_decode_str(token)
        .decode_utf8()
        .map(|raw| raw.into_owned())
        .map_err(|_| undecodable(token))
}

fn decode_scalar(raw: &str, tag: TypeTag) -> Result<Value> {
    let scalar = tag.scalar_tag();
    if raw.is_empty() {
        return Ok(match scalar {
            ScalarTag::Bool | ScalarTag::Integer | ScalarTag::Float | ScalarTag::Color => {
                Value::Null
            }
            _ => Value::text(""),
        });
    }
    match scalar {
        ScalarTag::Bool => match raw {
            "0" => Ok(Value::Bool(false)),
            "1" => Ok(Value::Bool(true)),
            _ => Err(undecodable(raw)),
        },
        ScalarTag::Integer => decode_int(raw)
            .int()
            .map(Value::Int)
            .ok_or_else(|| undecodable(raw)),
        ScalarTag::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| undecodable(raw)),
        ScalarTag::Color => decode_int(raw)
            .int()
            .and_then(|rgb| u32::try_from(rgb).ok())
            .filter(|rgb| *rgb <= 0xFF_FFFF)
            .map(|rgb| Value::Text(hex_color(rgb)))
            .ok_or_else(|| undecodable(raw)),
        _ => Ok(Value::text(raw)),
    }
}

/// Serializes every persisted parameter, in schema order, behind a seeded CRC.
pub fn write_blob(schema: &Schema, values: &IndexMap<ParamName, Value>) -> String {
    let tokens = schema
        .iter()
        .filter(|decl| decl.flag.is_persisted())
        .map(|decl| encode(values.get(&decl.name).unwrap_or(&Value::Null), &decl.ty))
        .collect::<Vec<_>>()
        .join(TOKEN_DELIMITER);
    format!("{}{TOKEN_DELIMITER}{tokens}", checksum(&tokens))
}

/// The CRC is rendered as a signed 32-bit quantity.
fn checksum(tokens: &str) -> String {
    encode_int(i64::from(crc32(tokens.as_bytes(), SCHEMA_VERSION) as i32))
}

/// Verifies and decodes a blob produced by [`write_blob`].
///
/// Returns the persisted parameters in schema order. Values are decoded but
/// not parsed; the caller runs them through [`parse`] once the theme is known.
pub fn read_blob(schema: &Schema, blob: &str) -> Result<Vec<(ParamName, Value)>> {
    let integrity = || Error::config("Config read error: Data Integrity Fail");
    let (crc, tokens) = blob.split_once(TOKEN_DELIMITER).ok_or_else(integrity)?;
    if crc != checksum(tokens) {
        return Err(integrity());
    }
    let mut chunks: Vec<&str> = if tokens.is_empty() {
        Vec::new()
    } else {
        tokens.split(TOKEN_DELIMITER).collect()
    };
    let persisted: Vec<&ParameterDeclaration> =
        schema.iter().filter(|decl| decl.flag.is_persisted()).collect();
    if chunks.len() != persisted.len() {
        return Err(Error::config("Config read error: Parameter count mismatch")
            .with_info(format!("{} of {}", chunks.len(), persisted.len())));
    }
    chunks.reverse();
    persisted
        .into_iter()
        .map(|decl| {
            let chunk = chunks.pop().unwrap_or_default();
            decode(chunk, &decl.ty)
                .map(|value| (decl.name, value))
                .map_err(|_| {
                    Error::config(format!("Config read error: {}", decl.name)).with_info(chunk)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::ThemeFlag;

    fn schema() -> Schema {
        Schema::photofeed().unwrap()
    }

    #[test]
    fn integer_bounds_are_inclusive() {
        let schema = schema();
        let decl = schema.require("frameWidthA").unwrap();
        assert_eq!(parse(decl, "1").unwrap(), Value::Int(1));
        assert_eq!(parse(decl, " 20 ").unwrap(), Value::Int(20));
        let low = parse(decl, "0").unwrap_err();
        assert_eq!(low.cause(), "'Frame Width A' may not be less than 1");
        let high = parse(decl, "21").unwrap_err();
        assert_eq!(high.cause(), "'Frame Width A' may not be greater than 20");
        assert_eq!(high.kind(), ErrorKind::Config);
        assert_eq!(
            parse(decl, "wide").unwrap_err().cause(),
            "'Frame Width A' is not a valid integer"
        );
    }

    #[test]
    fn blank_input_falls_back_to_default_or_fails_when_required() {
        let schema = schema();
        assert_eq!(
            parse(schema.require("padding").unwrap(), "   ").unwrap(),
            Value::Int(0)
        );
        let err = parse(schema.require("cabName").unwrap(), "").unwrap_err();
        assert_eq!(err.cause(), "'Cabinet Name' may not be left blank");
    }

    #[test]
    fn colors_normalize_to_upper_hex() {
        let schema = schema();
        let decl = schema.require("hoverColor").unwrap();
        for raw in ["red", "RED", "#FF0000", "#ff0000", "rgb(255,0,0)", "FF0000"] {
            assert_eq!(parse(decl, raw).unwrap(), Value::text("#FF0000"), "{raw}");
        }
        assert_eq!(parse(decl, "12").unwrap(), Value::text("#000012"));
        assert!(parse(decl, "rgb(256,0,0)").is_err());
        assert!(parse(decl, "#1000000").is_err());
        assert!(parse(decl, "reddish").is_err());
    }

    #[test]
    fn option_lists_accept_index_name_or_text() {
        let schema = schema();
        let decl = schema.require("shapeStyleA").unwrap();
        assert_eq!(parse(decl, "2").unwrap(), Value::Index(2));
        assert_eq!(parse(decl, "roundPC").unwrap(), Value::Index(2));
        assert_eq!(parse(decl, "round %").unwrap(), Value::Index(2));
        let err = parse(decl, "oval").unwrap_err();
        assert_eq!(err.text(), "CONFIG ERROR\nInvalid shapeStyleA\noval");
    }

    #[test]
    fn arrays_check_sizes_and_name_elements() {
        let schema = schema();
        let decl = schema.require("grid").unwrap();
        assert_eq!(parse(decl, "1, 2,3").unwrap(), Value::ints([1, 2, 3]));
        let err = parse(decl, "1,0").unwrap_err();
        assert_eq!(err.cause(), "'Grid[1]' may not be less than 1");
        let err = parse(decl, "1,,2").unwrap_err();
        assert_eq!(err.cause(), "'Grid[1]' may not be left blank");
        let too_many = vec!["1"; 21].join(",");
        assert_eq!(
            parse(decl, &too_many).unwrap_err().cause(),
            "'Grid' may not have more than 20 entries"
        );
    }

    #[test]
    fn string_subtypes_apply_patterns() {
        let schema = schema();
        let page = schema.require("cabName").unwrap();
        assert!(parse(page, "my-photos").is_ok());
        assert!(parse(page, "my photos").is_err());
        let file = schema.require("leadPhotoName").unwrap();
        assert!(parse(file, "lead.jpg").is_ok());
        assert!(parse(file, "lead/jpg").is_err());
        let url = schema.require("link").unwrap();
        assert!(parse(url, "https://example.com/a?b=c").is_ok());
        assert!(parse(url, "example.com").is_err());
        let source = schema.require("cabSource").unwrap();
        assert!(parse(source, "~gallery").is_ok());
        assert!(parse(source, "https://example.com/photos").is_ok());
    }

    #[test]
    fn booleans_accept_words_and_digits() {
        let schema = schema();
        let decl = schema.require("wrap").unwrap();
        assert_eq!(parse(decl, "Yes").unwrap(), Value::Bool(true));
        assert_eq!(parse(decl, "0").unwrap(), Value::Bool(false));
        assert!(parse(decl, "maybe").is_err());
    }

    #[test]
    fn tokens_are_compact_and_escaped() {
        let schema = schema();
        let color = &schema.require("hoverColor").unwrap().ty;
        assert_eq!(encode(&Value::text("#FF0000"), color), ")m00");
        let grid = &schema.require("grid").unwrap().ty;
        assert_eq!(encode(&Value::ints([1, 2, 64]), grid), "1:2:10");
        let text = &schema.require("text").unwrap().ty;
        assert_eq!(encode(&Value::text("a,b:c"), text), "a%2Cb%3Ac");
        assert_eq!(decode("a%2Cb%3Ac", text).unwrap(), Value::text("a,b:c"));
        let wrap = &schema.require("wrap").unwrap().ty;
        assert_eq!(encode(&Value::Int(3), wrap), "!");
        assert!(decode("!", wrap).is_err());
        assert_eq!(decode("", wrap).unwrap(), Value::Null);
    }

    #[test]
    fn array_lengths_survive_encoding() {
        let grid = ParameterType::Scalar(TypeTag::array(ScalarTag::Integer));
        for value in [Value::ints([]), Value::ints([7]), Value::ints(1..=20)] {
            assert_eq!(decode(&encode(&value, &grid), &grid).unwrap(), value);
        }
        let floats = ParameterType::Scalar(TypeTag::array(ScalarTag::Float));
        let value = Value::List(vec![Value::Float(0.1), Value::Float(-2.5)]);
        assert_eq!(decode(&encode(&value, &floats), &floats).unwrap(), value);
    }

    #[test]
    fn blob_round_trips_and_detects_corruption() {
        let schema = schema();
        let mut values = IndexMap::new();
        for decl in schema.iter() {
            values.insert(decl.name, decl.default.clone().unwrap_or(Value::Null));
        }
        let parent = schema.name("parent").unwrap();
        values.insert(parent, Value::text("https://example.com/page"));
        let blob = write_blob(&schema, &values);

        let read = read_blob(&schema, &blob).unwrap();
        assert!(read.iter().all(|(name, _)| {
            schema.require(name.as_str()).unwrap().flag != ThemeFlag::ThemeOnly
        }));
        for (name, value) in &read {
            let expected = &values[name];
            if expected.is_null() {
                assert!(value.is_null() || value == &Value::text(""), "{name}");
            } else {
                assert_eq!(value, expected, "{name}");
            }
        }

        let mut corrupted = blob.clone().into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'0' { b'1' } else { b'0' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        let err = read_blob(&schema, &corrupted).unwrap_err();
        assert_eq!(err.cause(), "Config read error: Data Integrity Fail");
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn checksum_depends_on_schema_version() {
        let tokens = "1,2,3";
        assert_ne!(
            crc32(tokens.as_bytes(), SCHEMA_VERSION),
            crc32(tokens.as_bytes(), SCHEMA_VERSION + 1)
        );
        assert!(read_blob(&schema(), "no-delimiter").is_err());
    }

    #[test]
    fn value_list_parse_is_exact() {
        let list = Arc::new(ValueList::new([("blue", "Blue", "Blue")]).unwrap());
        let decl = ParameterDeclaration::new(
            ThemeFlag::NotThemeable,
            "theme",
            "Theme",
            ParameterType::Values(list),
            Some(Value::text("Blue")),
        );
        assert_eq!(parse(&decl, "Blue").unwrap(), Value::text("Blue"));
        assert!(parse(&decl, "blue").is_err());
    }
}
