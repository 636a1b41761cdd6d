//! Theme documents: fetching, parsing, and merging them into the live
//! parameter set.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::PathBuf;

use config_model::ValueList;
use indexmap::IndexMap;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{Error, ErrorKind, Result};
use crate::schema::{ParamName, ParamTheming, Schema, THEME, THEME_DISABLED, ThemeFlag};
use crate::value::Value;

/// File name of the theme document under a site root.
pub const THEME_FILE: &str = "sys/themes/photofeed.xml";

const GOOGLE_SITES_HOST: &str = "sites.google.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThemeStatus {
    #[default]
    Unknown,
    /// No document, and theming is disabled.
    Unavailable,
    /// No document, but a theme is still selected.
    Missing,
    /// The document allows theming to be disabled.
    Optional,
    /// The document does not allow theming to be disabled.
    Forced,
    /// The document was rejected; see the theme error.
    Invalid,
}

impl ThemeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
            Self::Missing => "missing",
            Self::Optional => "optional",
            Self::Forced => "forced",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ThemeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `<p>` override as written in the document; checked only when its
/// option is the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeParam {
    pub name: Option<String>,
    pub value: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeOption {
    pub name: String,
    pub params: Vec<ThemeParam>,
}

/// A parsed theme document with validated option names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDocument {
    pub forced: bool,
    pub options: Vec<ThemeOption>,
}

impl ThemeDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let package = parser::parse(xml)
            .map_err(|err| Error::config("Theme file: Malformed XML").with_info(format!("{err:?}")))?;
        let document = package.as_document();

        let mut themes = Vec::new();
        for child in document.root().children() {
            if let ChildOfRoot::Element(element) = child {
                collect_named(element, "theme", &mut themes);
            }
        }
        let [theme] = themes[..] else {
            return Err(Error::config("Theme file: Expected single <theme> node")
                .with_info(themes.len()));
        };

        let forced = match theme.attribute_value("forced") {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(
                    Error::config("Theme file: <theme> node has invalid forced attribute value")
                        .with_info(other),
                );
            }
        };

        let mut option_nodes = Vec::new();
        descendants_named(theme, "option", &mut option_nodes);
        if option_nodes.is_empty() {
            return Err(Error::config("Theme file: At least one <option> node required"));
        }

        let mut options: Vec<ThemeOption> = Vec::with_capacity(option_nodes.len());
        for node in option_nodes {
            let name = node
                .attribute_value("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::config("Theme file: <option> node has no name attribute"))?;
            if name.eq_ignore_ascii_case(THEME_DISABLED) {
                return Err(Error::config("Theme file: <option> node name is reserved").with_info(name));
            }
            if options.iter().any(|option| option.name == name) {
                return Err(
                    Error::config("Theme file: <option> node with duplicate name").with_info(name),
                );
            }
            let mut param_nodes = Vec::new();
            descendants_named(node, "p", &mut param_nodes);
            let params = param_nodes
                .into_iter()
                .map(|p| ThemeParam {
                    name: p.attribute_value("name").map(str::to_string),
                    value: p.attribute_value("value").map(str::to_string),
                    default: p.attribute_value("default").map(str::to_string),
                })
                .collect();
            options.push(ThemeOption {
                name: name.to_string(),
                params,
            });
        }

        Ok(Self { forced, options })
    }

    pub fn option(&self, name: &str) -> Option<&ThemeOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

fn collect_named<'d>(element: Element<'d>, name: &str, out: &mut Vec<Element<'d>>) {
    if element.name().local_part() == name {
        out.push(element);
    }
    descendants_named(element, name, out);
}

/// Document-order search below `element`.
fn descendants_named<'d>(element: Element<'d>, name: &str, out: &mut Vec<Element<'d>>) {
    for child in element.children() {
        if let ChildOfElement::Element(child) = child {
            collect_named(child, name, out);
        }
    }
}

/// One per-parameter effect of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamUpdate {
    pub name: ParamName,
    pub theming: ParamTheming,
    /// New effective default, for [`ParamTheming::Default`].
    pub default: Option<Value>,
    /// New pinned value, for [`ParamTheming::Value`].
    pub value: Option<Value>,
}

/// The change-set produced by [`resolve`].
#[derive(Debug, Clone)]
pub struct ThemeOutcome {
    pub status: ThemeStatus,
    /// Why the document was rejected, when status is [`ThemeStatus::Invalid`].
    pub error: Option<Error>,
    pub forced: bool,
    /// Replacement choice list for the theme parameter.
    pub choices: ValueList,
    /// Theme value to select; also becomes the theme parameter's default.
    pub selected: String,
    pub updates: Vec<ParamUpdate>,
}

/// Inputs to a merge beyond the document itself.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub schema: &'a Schema,
    pub values: &'a IndexMap<ParamName, Value>,
    pub is_new_config: bool,
}

impl MergeContext<'_> {
    fn current_theme(&self) -> &str {
        self.values
            .get(THEME)
            .and_then(Value::as_str)
            .unwrap_or(THEME_DISABLED)
    }

    fn theme_forced(&self) -> bool {
        self.values
            .get("themeForced")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Merges a fetched theme document (or its absence) against the live values.
///
/// A document that fails validation is downgraded to [`ThemeStatus::Invalid`]
/// with no partial effects. Internal faults are returned as errors.
pub fn resolve(document: Option<&str>, context: MergeContext<'_>) -> Result<ThemeOutcome> {
    let attempt = match document {
        None => None,
        Some(xml) => Some(merge_document(xml, context)),
    };
    let (status, error) = match attempt {
        None => (ThemeStatus::Unknown, None),
        Some(Ok(outcome)) => return Ok(outcome),
        Some(Err(err)) if matches!(err.kind(), ErrorKind::Config | ErrorKind::Web) => {
            debug!(error = %err.cause(), "theme document rejected");
            (ThemeStatus::Invalid, Some(err))
        }
        Some(Err(err)) => return Err(err),
    };
    fallback(status, error, context)
}

fn disabled_only() -> Result<ValueList> {
    crate::schema::initial_themes()
}

fn merge_document(xml: &str, context: MergeContext<'_>) -> Result<ThemeOutcome> {
    let document = ThemeDocument::parse(xml)?;
    let current = context.current_theme();

    let mut choices = if document.forced {
        ValueList::default()
    } else {
        disabled_only()?
    };
    for option in &document.options {
        let compact: String = option.name.split_whitespace().collect();
        choices
            .push(compact, option.name.clone(), option.name.clone())
            .map_err(|_| {
                Error::config("Theme file: <option> node with duplicate name")
                    .with_info(&option.name)
            })?;
    }

    let mut active = document.option(current);
    if current != THEME_DISABLED && active.is_none() {
        return Err(
            Error::config("Theme file: live <option> has been removed from theme file")
                .with_info(current),
        );
    }
    if context.is_new_config || (document.forced && current == THEME_DISABLED) {
        active = document.options.first();
    }

    // A later <p> for the same parameter replaces an earlier one.
    let mut updates = IndexMap::new();
    if let Some(option) = active {
        for param in &option.params {
            let update = param_update(&option.name, param, context.schema)?;
            updates.insert(update.name, update);
        }
    }

    let selected = match active {
        Some(option) => option.name.clone(),
        None => THEME_DISABLED.to_string(),
    };
    Ok(ThemeOutcome {
        status: if document.forced {
            ThemeStatus::Forced
        } else {
            ThemeStatus::Optional
        },
        error: None,
        forced: document.forced,
        choices,
        selected,
        updates: updates.into_values().collect(),
    })
}

fn param_update(option: &str, param: &ThemeParam, schema: &Schema) -> Result<ParamUpdate> {
    let name = param.name.as_deref().ok_or_else(|| {
        Error::config("Theme file: <p> node has no name attribute").with_info(option)
    })?;
    let location = format!("{option}:{name}");
    let decl = match (&param.value, &param.default) {
        (None, None) => {
            return Err(
                Error::config("Theme file: <p> node has no value or default attribute")
                    .with_info(location),
            );
        }
        (Some(_), Some(_)) => {
            return Err(
                Error::config("Theme file: <p> node has BOTH value and default attributes")
                    .with_info(location),
            );
        }
        _ => schema.get(name).ok_or_else(|| {
            Error::config("Theme file: <p> node has an unrecognised parameter name")
                .with_info(&location)
        })?,
    };

    if let Some(raw) = &param.default {
        if !decl.flag.accepts_theme_default() {
            return Err(Error::config(
                "Theme file: <p> node specified default for an unthemeable parameter",
            )
            .with_info(location));
        }
        return Ok(ParamUpdate {
            name: decl.name,
            theming: ParamTheming::Default,
            default: Some(codec::parse(decl, raw)?),
            value: None,
        });
    }

    let raw = param.value.as_deref().unwrap_or_default();
    if !decl.flag.accepts_theme_value() {
        let cause = if decl.flag == ThemeFlag::DefaultThemeable {
            "Theme file: <p> node specified value for a default-only themable parameter"
        } else {
            "Theme file: <p> node specified value for an unthemeable parameter"
        };
        return Err(Error::config(cause).with_info(location));
    }
    Ok(ParamUpdate {
        name: decl.name,
        theming: ParamTheming::Value,
        default: None,
        value: Some(codec::parse(decl, raw)?),
    })
}

/// No usable document: keep a non-disabled selection alive and pin every
/// fully themeable parameter at its current value.
fn fallback(
    status: ThemeStatus,
    error: Option<Error>,
    context: MergeContext<'_>,
) -> Result<ThemeOutcome> {
    let current = context.current_theme();
    let mut choices = disabled_only()?;

    if current == THEME_DISABLED {
        return Ok(ThemeOutcome {
            status: match status {
                ThemeStatus::Unknown => ThemeStatus::Unavailable,
                other => other,
            },
            error,
            forced: false,
            choices,
            selected: THEME_DISABLED.to_string(),
            updates: Vec::new(),
        });
    }

    let compact: String = current.split_whitespace().collect();
    choices.push(compact, current, current)?;
    let updates = context
        .schema
        .iter()
        .filter(|decl| decl.flag == ThemeFlag::ValueThemeable)
        .map(|decl| ParamUpdate {
            name: decl.name,
            theming: ParamTheming::Value,
            default: None,
            value: Some(context.values.get(&decl.name).cloned().unwrap_or(Value::Null)),
        })
        .collect();

    Ok(ThemeOutcome {
        status: match status {
            ThemeStatus::Unknown => ThemeStatus::Missing,
            other => other,
        },
        error,
        forced: context.theme_forced(),
        choices,
        selected: current.to_string(),
        updates,
    })
}

/// Derives the theme document URL from the parent page URL.
///
/// Google Sites pages resolve against their site root; any other host
/// resolves against `/`.
pub fn theme_url(parent: &str, no_cache: bool, serve_time: i64) -> Result<String> {
    let (protocol, rest) = match parent.strip_prefix("https://") {
        Some(rest) => ("https://", rest),
        None => (
            "http://",
            parent.strip_prefix("http://").unwrap_or(parent),
        ),
    };
    let (host, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, "/"),
    };

    let root = if host == GOOGLE_SITES_HOST {
        google_site_root(path).ok_or_else(|| {
            Error::web("Unknown google host path").with_info(parent)
        })?
    } else {
        "/".to_string()
    };

    let mut url = format!("{protocol}{host}{root}{THEME_FILE}");
    if no_cache {
        url.push_str(&format!("?nocache={serve_time}"));
    }
    Ok(url)
}

/// `/a/<domain>/<site>/` or `/site/<site>/`; the final slash may be absent
/// when the parent is the site home page.
fn google_site_root(path: &str) -> Option<String> {
    let segments = if path.starts_with("/a/") {
        3
    } else if path.starts_with("/site/") {
        2
    } else {
        return None;
    };
    let parts: Vec<&str> = path.split('/').skip(1).take(segments).collect();
    if parts.len() < segments || parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    Some(format!("/{}/", parts.join("/")))
}

/// Source of theme documents. `Ok(None)` means the document is absent.
pub trait ThemeFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Serves theme documents from the local filesystem.
///
/// `file://` URLs are read directly; `http(s)` URLs are mapped onto `root`
/// by path, when a root is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalThemeFetcher {
    root: Option<PathBuf>,
}

impl LocalThemeFetcher {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn locate(&self, url: &str) -> Option<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Some(PathBuf::from(path));
        }
        let root = self.root.as_ref()?;
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let path = rest.find('/').map(|index| &rest[index + 1..])?;
        let path = path.split('?').next().unwrap_or_default();
        Some(root.join(path))
    }
}

impl ThemeFetcher for LocalThemeFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let Some(path) = self.locate(url) else {
            debug!(url, "no local mapping for theme url");
            return Ok(None);
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "theme document not found");
                Ok(None)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read theme document");
                Ok(None)
            }
        }
    }
}
