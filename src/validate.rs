//! Cross-parameter checks run before a configuration is considered usable.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::{ParamName, ParameterType, Schema};
use crate::value::Value;

/// Smallest usable content height, in pixels.
pub const MIN_CONTENT_HEIGHT: i64 = 50;

/// Smallest height of a photo in the selection grid, in pixels.
pub const MIN_PHOTO_HEIGHT: i64 = 50;

/// Validates the value set. `height` is the widget height when it is known,
/// which enables the selection-grid sizing checks.
pub fn validate(
    schema: &Schema,
    values: &IndexMap<ParamName, Value>,
    height: Option<i64>,
) -> Result<()> {
    let view = View { schema, values };
    let grid = view.grid()?;
    for (i, pair) in grid.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(Error::config(format!(
                "Select Grid: Max photos in Column {} must not be less than previous column",
                i + 2
            ))
            .with_info(pair[1]));
        }
    }

    match height {
        Some(height) => check_sizing(&view, &grid, height),
        None => Ok(()),
    }
}

/// Set-A decorations must fit in a fixed widget height; slides resize the
/// widget instead and need no check.
fn check_sizing(view: &View<'_>, grid: &[i64], height: i64) -> Result<()> {
    let frame = view.styled_width("frameStyleA", "frameWidthA")?;
    let mat = view.styled_width("matStyleA", "matWidthA")?;
    let edge = view.styled_width("edgeStyleA", "edgeWidthA")?;
    let reveal = view.styled_width("revealStyleA", "revealWidthA")?;
    let shadow = view.styled_width("shadowStyleA", "shadowWidthA")?;
    let space = view.int("spaceWidthA")?;
    let footer = view.styled_width("footerStyle", "footerHeight")?;

    let content = height - 2 * view.int("padding")?;
    if content < MIN_CONTENT_HEIGHT {
        return Err(Error::config("Gadget height is too small to be usable!").with_info(content));
    }
    let available = content - footer;

    let per_photo = 2 * frame + 2 * mat + 2 * edge + 2 * reveal + shadow + MIN_PHOTO_HEIGHT;
    for (i, photos) in grid.iter().enumerate() {
        let required = photos * per_photo + (photos - 1) * space;
        if required > available {
            return Err(Error::config(format!(
                "Gadget height is not sufficient for {photos} photos in column {} with configured metrics",
                i + 1
            ))
            .with_info(format!("{required} > {available}")));
        }
    }
    Ok(())
}

struct View<'a> {
    schema: &'a Schema,
    values: &'a IndexMap<ParamName, Value>,
}

impl View<'_> {
    fn value(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::assertion("Missing parameter value").with_info(name))
    }

    fn int(&self, name: &str) -> Result<i64> {
        self.value(name)?
            .as_int()
            .ok_or_else(|| Error::assertion("Parameter is not an integer").with_info(name))
    }

    fn grid(&self) -> Result<Vec<i64>> {
        let Some(items) = self.value("grid")?.as_list() else {
            return Err(Error::assertion("Parameter is not a list").with_info("grid"));
        };
        items
            .iter()
            .map(|item| {
                item.as_int()
                    .ok_or_else(|| Error::assertion("Grid entry is not an integer").with_info(item))
            })
            .collect()
    }

    /// `width` unless the paired style is the list's `none` entry.
    fn styled_width(&self, style: &str, width: &str) -> Result<i64> {
        let decl = self.schema.require(style)?;
        let ParameterType::Options(list) = &decl.ty else {
            return Err(Error::assertion("Style parameter is not an option list").with_info(style));
        };
        let selected = self.value(style)?.as_index();
        if selected.is_some() && selected == list.index_of_name("none") {
            return Ok(0);
        }
        self.int(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn defaults(schema: &Schema) -> IndexMap<ParamName, Value> {
        schema
            .iter()
            .map(|decl| (decl.name, decl.default.clone().unwrap_or(Value::Null)))
            .collect()
    }

    fn put(schema: &Schema, values: &mut IndexMap<ParamName, Value>, name: &str, value: Value) {
        values.insert(schema.name(name).unwrap(), value);
    }

    #[test]
    fn grid_must_not_decrease() {
        let schema = Schema::photofeed().unwrap();
        let mut values = defaults(&schema);
        put(&schema, &mut values, "grid", Value::ints([2, 3]));
        assert!(validate(&schema, &values, None).is_ok());

        put(&schema, &mut values, "grid", Value::ints([3, 2]));
        let err = validate(&schema, &values, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(
            err.cause(),
            "Select Grid: Max photos in Column 2 must not be less than previous column"
        );
    }

    #[test]
    fn sizing_names_the_offending_column() {
        let schema = Schema::photofeed().unwrap();
        let mut values = defaults(&schema);
        put(&schema, &mut values, "grid", Value::ints([1, 4]));
        // Per photo: 2*5 + 2*5 + 2*1 + 2*1 + 5 + 50 = 79; footer 25.
        let err = validate(&schema, &values, Some(300)).unwrap_err();
        assert_eq!(
            err.cause(),
            "Gadget height is not sufficient for 4 photos in column 2 with configured metrics"
        );
        assert!(validate(&schema, &values, Some(25 + 4 * 79 + 3 * 5)).is_ok());
    }

    #[test]
    fn tiny_widget_is_rejected() {
        let schema = Schema::photofeed().unwrap();
        let mut values = defaults(&schema);
        put(&schema, &mut values, "padding", Value::Int(10));
        let err = validate(&schema, &values, Some(60)).unwrap_err();
        assert_eq!(err.cause(), "Gadget height is too small to be usable!");
    }

    #[test]
    fn none_styles_contribute_no_width() {
        let schema = Schema::photofeed().unwrap();
        let mut values = defaults(&schema);
        for style in ["frameStyleA", "matStyleA", "edgeStyleA", "revealStyleA", "shadowStyleA", "footerStyle"] {
            put(&schema, &mut values, style, Value::Index(0));
        }
        assert!(validate(&schema, &values, Some(MIN_CONTENT_HEIGHT)).is_ok());
    }
}
