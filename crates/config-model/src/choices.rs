use anyhow::{Result, ensure};

/// One entry of an [`OptionList`]; its value is its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub name: String,
    pub text: String,
}

/// Ordered choices whose implicit values are their zero-based indices.
///
/// Names are unique (case-sensitive) and display texts are unique
/// ignoring case, so either can be used to look an entry up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    entries: Vec<OptionEntry>,
}

impl OptionList {
    pub fn new<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut list = Self::default();
        for (name, text) in pairs {
            list.push(name, text)?;
        }
        Ok(list)
    }

    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) -> Result<usize> {
        let name = name.into();
        let text = text.into();
        ensure!(
            self.index_of_name(&name).is_none(),
            "option name already in use: {name}"
        );
        ensure!(
            self.index_of_text(&text).is_none(),
            "option text is not unique: {text}"
        );
        self.entries.push(OptionEntry { name, text });
        Ok(self.entries.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.entries.len()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.name.as_str())
    }

    pub fn text_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.text.as_str())
    }

    /// Interprets `raw` as a numeric index.
    pub fn index_of_value(&self, raw: &str) -> Option<usize> {
        raw.parse::<usize>().ok().filter(|index| self.contains(*index))
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn index_of_text(&self, text: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.text.eq_ignore_ascii_case(text))
    }
}

/// One entry of a [`ValueList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    pub name: String,
    pub text: String,
    pub value: String,
}

/// Ordered choices with explicit, human-legible string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueList {
    entries: Vec<ValueEntry>,
}

impl ValueList {
    pub fn new<'a, I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut list = Self::default();
        for (name, text, value) in triples {
            list.push(name, text, value)?;
        }
        Ok(list)
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<usize> {
        let name = name.into();
        let text = text.into();
        let value = value.into();
        ensure!(
            self.index_of_name(&name).is_none(),
            "value name already in use: {name}"
        );
        ensure!(
            self.entries.iter().all(|entry| entry.text != text),
            "value text is not unique: {text}"
        );
        ensure!(
            self.index_of_value(&value).is_none(),
            "value is not unique: {value}"
        );
        self.entries.push(ValueEntry { name, text, value });
        Ok(self.entries.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueEntry> {
        self.entries.iter()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.name.as_str())
    }

    pub fn text_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.text.as_str())
    }

    pub fn value_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.value.as_str())
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.index_of_value(value).is_some()
    }

    pub fn index_of_value(&self, value: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.value == value)
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn index_of_text(&self, text: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.text == text)
    }
}
