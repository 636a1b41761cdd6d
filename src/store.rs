//! The configuration store: owns the live parameter values and drives the
//! initialization lifecycle.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::host::{HostEnvironment, View};
use crate::prefs::{CONFIG_KEY, PrefStore};
use crate::schema::{
    ParamName, ParamTheming, ParameterDeclaration, ParameterType, Schema, THEME, ThemeFlag,
};
use crate::theme::{self, MergeContext, ThemeFetcher, ThemeOutcome, ThemeStatus};
use crate::validate;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Initializing,
    Errored,
    Ready,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Errored => "errored",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handed out by [`ConfigStore::begin_init`]; only the ticket of the most
/// recent init is honoured by [`ConfigStore::complete_init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitTicket {
    pub generation: u64,
    pub theme_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(LifecycleState),
    /// The ticket belonged to a superseded init and was ignored.
    Stale,
}

/// Everything a single init rebuilds.
#[derive(Debug, Clone, Default)]
struct Live {
    schema: Schema,
    values: IndexMap<ParamName, Value>,
    theming: IndexMap<ParamName, ParamTheming>,
    theme_status: ThemeStatus,
    theme_error: Option<Error>,
    theme_url: Option<String>,
    is_new_config: bool,
    revert: String,
}

pub struct ConfigStore<P> {
    host: HostEnvironment,
    prefs: P,
    live: Live,
    state: LifecycleState,
    error: Option<Error>,
    generation: u64,
    last_ready: Option<Live>,
}

impl<P: PrefStore> ConfigStore<P> {
    pub fn new(host: HostEnvironment, prefs: P) -> Self {
        Self {
            host,
            prefs,
            live: Live::default(),
            state: LifecycleState::Idle,
            error: None,
            generation: 0,
            last_ready: None,
        }
    }

    /// Runs a full init: prepares values, fetches and merges the theme, then
    /// validates. Configuration problems end in [`LifecycleState::Errored`]
    /// and are reported through [`ConfigStore::error`]; internal faults are
    /// returned after restoring the last ready configuration, if any.
    pub async fn init<F: ThemeFetcher>(&mut self, fetcher: &F) -> Result<LifecycleState> {
        let Some(ticket) = self.begin_init()? else {
            return Ok(self.state);
        };
        let document = match fetcher.fetch(&ticket.theme_url).await {
            Ok(document) => document,
            Err(err) => {
                warn!(url = %ticket.theme_url, error = %err, "theme fetch failed");
                None
            }
        };
        match self.complete_init(&ticket, document)? {
            Completion::Applied(state) => Ok(state),
            Completion::Stale => Ok(self.state),
        }
    }

    /// First half of an init, up to the theme fetch.
    ///
    /// Returns `Ok(None)` when the store already ended `Errored` and there is
    /// nothing to fetch.
    pub fn begin_init(&mut self) -> Result<Option<InitTicket>> {
        self.generation += 1;
        if self.state == LifecycleState::Ready {
            self.last_ready = Some(self.live.clone());
        }
        self.state = LifecycleState::Initializing;
        self.error = None;
        info!(
            generation = self.generation,
            view = %self.host.view,
            "configuration init started"
        );

        match self.prepare() {
            Ok(theme_url) => {
                self.live.theme_url = Some(theme_url.clone());
                Ok(Some(InitTicket {
                    generation: self.generation,
                    theme_url,
                }))
            }
            Err(err) if err.is_fatal() => Err(self.abort(err)),
            Err(err) => {
                self.fail(err);
                Ok(None)
            }
        }
    }

    /// Second half of an init: merges the fetched theme document (`None` when
    /// absent) and validates the result.
    pub fn complete_init(
        &mut self,
        ticket: &InitTicket,
        document: Option<String>,
    ) -> Result<Completion> {
        if ticket.generation != self.generation || self.state != LifecycleState::Initializing {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "ignoring stale theme completion"
            );
            return Ok(Completion::Stale);
        }

        match self.merge(document.as_deref()) {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                self.last_ready = None;
                info!(
                    generation = self.generation,
                    theme_status = %self.live.theme_status,
                    "configuration ready"
                );
            }
            Err(err) if err.is_fatal() => return Err(self.abort(err)),
            Err(err) => self.fail(err),
        }
        Ok(Completion::Applied(self.state))
    }

    fn merge(&mut self, document: Option<&str>) -> Result<()> {
        let outcome = theme::resolve(
            document,
            MergeContext {
                schema: &self.live.schema,
                values: &self.live.values,
                is_new_config: self.live.is_new_config,
            },
        )?;
        self.apply_theme(outcome)?;
        self.finish()
    }

    fn fail(&mut self, err: Error) {
        warn!(generation = self.generation, error = %err, "configuration errored");
        self.state = LifecycleState::Errored;
        self.error = Some(err);
        self.last_ready = None;
    }

    /// Internal fault: fall back to the last ready configuration, if any.
    fn abort(&mut self, err: Error) -> Error {
        match self.last_ready.take() {
            Some(live) => {
                warn!(error = %err, "init aborted, restoring last ready configuration");
                self.live = live;
                self.state = LifecycleState::Ready;
            }
            None => {
                warn!(error = %err, "init aborted");
                self.state = LifecycleState::Errored;
                self.error = Some(err.clone());
            }
        }
        err
    }

    /// Rebuilds the schema and loads values; yields the theme URL.
    fn prepare(&mut self) -> Result<String> {
        let schema = Schema::photofeed()?;
        let revert = self.prefs.get(CONFIG_KEY)?;
        self.live = Live {
            values: schema
                .iter()
                .map(|decl| (decl.name, decl.default.clone().unwrap_or(Value::Null)))
                .collect(),
            theming: schema
                .iter()
                .map(|decl| (decl.name, ParamTheming::None))
                .collect(),
            is_new_config: revert.is_empty(),
            revert,
            schema,
            ..Live::default()
        };

        let loaded = if self.host.view == View::Config && self.live.is_new_config {
            self.put("origParent", Value::text(&self.host.parent))
        } else {
            self.read_revert()
        };
        self.put("parent", Value::text(&self.host.parent))?;
        self.put("serveTime", Value::Int(self.host.serve_time))?;
        loaded?;

        theme::theme_url(&self.host.parent, self.host.no_cache, self.host.serve_time)
    }

    fn read_revert(&mut self) -> Result<()> {
        let blob = self.live.revert.clone();
        self.load_blob(&blob)?;
        if self.host.view == View::Config && self.generation == 1 {
            self.expire_deferred_cache()?;
        }
        Ok(())
    }

    /// A deferred cache left on since a long-past session is switched off.
    /// Only meaningful on the first init, before the serve time is refreshed.
    fn expire_deferred_cache(&mut self) -> Result<()> {
        let deferred = self.live.values.get("deferCache").and_then(Value::as_bool);
        if deferred != Some(true) {
            return Ok(());
        }
        let stored = self.live.values.get("serveTime").and_then(Value::as_int);
        let limit = self
            .live
            .values
            .get("cacheDeferTime")
            .and_then(Value::as_int)
            .unwrap_or(0);
        if let Some(stored) = stored
            && self.host.serve_time.abs_diff(stored) > limit.unsigned_abs()
        {
            info!(stored, now = self.host.serve_time, "deferred cache expired");
            self.put("deferCache", Value::Bool(false))?;
        }
        Ok(())
    }

    /// All-or-nothing bulk read of `blob` into the live values.
    fn load_blob(&mut self, blob: &str) -> Result<()> {
        let entries = codec::read_blob(&self.live.schema, blob).inspect_err(|err| {
            warn!(error = %err, "bulk read failed");
        })?;
        for (name, value) in entries {
            let decl = self.live.schema.require(name.as_str())?;
            let value = match value {
                Value::Text(text) if text.is_empty() && decl.default.is_none() => Value::Null,
                value => value,
            };
            self.live.values.insert(name, value);
        }
        let resets: Vec<(ParamName, Value)> = self
            .live
            .schema
            .iter()
            .filter(|decl| {
                matches!(decl.flag, ThemeFlag::ThemeOnly | ThemeFlag::ForcedPending)
            })
            .map(|decl| (decl.name, decl.default.clone().unwrap_or(Value::Null)))
            .collect();
        self.live.values.extend(resets);
        Ok(())
    }

    fn apply_theme(&mut self, outcome: ThemeOutcome) -> Result<()> {
        let reapply_defaults = self.live.is_new_config || self.generation > 1;
        for theming in self.live.theming.values_mut() {
            *theming = ParamTheming::None;
        }

        for update in outcome.updates {
            self.live.theming.insert(update.name, update.theming);
            match update.theming {
                ParamTheming::Default => {
                    let decl = self
                        .live
                        .schema
                        .require(update.name.as_str())?
                        .with_default(update.default.clone());
                    self.live.schema.replace(decl)?;
                    if reapply_defaults {
                        self.put(update.name.as_str(), update.default.unwrap_or(Value::Null))?;
                    }
                }
                ParamTheming::Value => {
                    self.put(update.name.as_str(), update.value.unwrap_or(Value::Null))?;
                }
                ParamTheming::None => {}
            }
        }

        let theme = self
            .live
            .schema
            .require(THEME)?
            .with_type(ParameterType::Values(Arc::new(outcome.choices)))
            .with_default(Some(Value::text(&outcome.selected)));
        self.live.schema.replace(theme)?;
        self.put(THEME, Value::text(&outcome.selected))?;
        self.put("themeForced", Value::Bool(outcome.forced))?;

        info!(
            status = %outcome.status,
            theme = %outcome.selected,
            forced = outcome.forced,
            "theme resolved"
        );
        self.live.theme_status = outcome.status;
        self.live.theme_error = outcome.error;
        Ok(())
    }

    /// Self-consistency pass, cross-parameter validation, then bulk write in
    /// config view.
    fn finish(&mut self) -> Result<()> {
        self.parse_all()?;
        self.validate()?;
        if self.host.view == View::Config {
            self.write()?;
        }
        Ok(())
    }

    fn parse_all(&mut self) -> Result<()> {
        let mut parsed = Vec::with_capacity(self.live.values.len());
        for decl in self.live.schema.iter() {
            let current = self.live.values.get(&decl.name).unwrap_or(&Value::Null);
            if current.is_null() && decl.default.is_none() {
                continue;
            }
            parsed.push((decl.name, codec::parse(decl, &current.to_string())?));
        }
        self.live.values.extend(parsed);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let height = match self.host.view {
            View::Home => self.host.height,
            View::Config => None,
        };
        validate::validate(&self.live.schema, &self.live.values, height)
    }

    fn write(&mut self) -> Result<()> {
        if self.host.view != View::Config {
            return Err(Error::assertion("Bulk write is only allowed in config view"));
        }
        let blob = self.to_wire_text();
        self.prefs.set(CONFIG_KEY, &blob)?;
        debug!(bytes = blob.len(), "configuration written");
        Ok(())
    }

    /// Unchecked assignment used by the lifecycle itself.
    fn put(&mut self, name: &str, value: Value) -> Result<()> {
        let name = self
            .live
            .schema
            .name(name)
            .ok_or_else(|| Error::assertion("Unknown parameter name").with_info(name))?;
        self.live.values.insert(name, value);
        Ok(())
    }

    /// Type-checked assignment. Not persisted until the next bulk write.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let decl = self.live.schema.require(name)?;
        if !value.conforms_to(&decl.ty) {
            return Err(Error::assertion("Value is not the correct type")
                .with_info(name)
                .with_info(&value));
        }
        self.put(name, value)
    }

    /// Assigns the current effective default, or null for required parameters.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let default = self
            .live
            .schema
            .require(name)?
            .default
            .clone()
            .unwrap_or(Value::Null);
        self.put(name, default)
    }

    /// Parses `raw`, assigns it, and re-runs cross-parameter validation.
    /// On failure the previous value is kept and the error returned.
    pub fn parse_and_validate(&mut self, name: &str, raw: &str) -> Result<Value> {
        let decl = self.live.schema.require(name)?;
        let parsed = codec::parse(decl, raw)?;
        let key = decl.name;
        let previous = self.live.values.insert(key, parsed.clone());
        if let Err(err) = self.validate() {
            self.live
                .values
                .insert(key, previous.unwrap_or(Value::Null));
            return Err(err);
        }
        Ok(parsed)
    }

    /// The user-edit path: applies `raw` to a user-editable parameter and
    /// bulk-writes the result. Returns whether anything changed. The previous
    /// value is kept when parsing, validation or the write fails.
    pub fn save(&mut self, name: &str, raw: &str) -> Result<bool> {
        if self.host.view != View::Config {
            return Err(Error::assertion("Save is only allowed in config view").with_info(name));
        }
        let key = self.live.schema.require(name)?.name;
        if !self.is_user_editable(name) {
            debug!(name, "ignoring save of a non-editable parameter");
            return Ok(false);
        }
        if raw == self.to_string(name)? {
            return Ok(false);
        }
        let previous = self.live.values.get(name).cloned().unwrap_or(Value::Null);
        let value = self.parse_and_validate(name, raw)?;
        if let Err(err) = self.write() {
            self.live.values.insert(key, previous);
            return Err(err);
        }
        info!(name, value = %value, "parameter saved");
        Ok(true)
    }

    /// User-level defaults reset. Themed parameters and the theme selection
    /// itself are left alone. Returns whether a default was applied.
    pub fn reset_to_default(&mut self, name: &str) -> Result<bool> {
        let decl = self.live.schema.require(name)?;
        let themed = self.theming(name) != ParamTheming::None;
        let Some(default) = decl.default.clone() else {
            return Ok(false);
        };
        if name == THEME || !decl.flag.is_user_configurable() || themed {
            return Ok(false);
        }
        self.put(name, default)?;
        Ok(true)
    }

    /// Validates and bulk-writes the current values.
    pub fn commit(&mut self) -> Result<()> {
        self.validate()?;
        self.write()
    }

    /// The bulk blob for the current values.
    pub fn to_wire_text(&self) -> String {
        codec::write_blob(&self.live.schema, &self.live.values)
    }

    /// Replaces the persisted values with those of `blob`. Theme-only
    /// parameters return to their defaults. Nothing changes on failure.
    pub fn from_wire_text(&mut self, blob: &str) -> Result<()> {
        self.load_blob(blob)
    }

    /// User-configurable and not pinned by the theme.
    pub fn is_user_editable(&self, name: &str) -> bool {
        match self.live.schema.get(name) {
            Some(decl) => {
                decl.flag.is_user_configurable() && self.theming(name) != ParamTheming::Value
            }
            None => false,
        }
    }

    /// Raw text of a value; option-list selections print as their index.
    pub fn to_string(&self, name: &str) -> Result<String> {
        self.live.schema.require(name)?;
        Ok(self.value(name).map(Value::to_string).unwrap_or_default())
    }

    /// Friendly text of a value; option-list selections print as their label.
    pub fn to_text(&self, name: &str) -> Result<String> {
        let decl = self.live.schema.require(name)?;
        let value = self.value(name).unwrap_or(&Value::Null);
        Ok(match (&decl.ty, value) {
            (ParameterType::Options(list), Value::Index(index)) => {
                list.text_of(*index).map(str::to_string).unwrap_or_default()
            }
            _ => value.to_string(),
        })
    }

    /// Renders the live configuration as a single-option theme document.
    pub fn export_theme_xml(&self) -> Result<String> {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\n");
        xml.push_str("<theme forced=\"false\">\n\n");
        xml.push_str("    <option name=\"Exported\">\n\n");
        for decl in self.live.schema.iter() {
            let attribute = match decl.flag {
                ThemeFlag::ThemeOnly | ThemeFlag::ValueThemeable => "value",
                ThemeFlag::DefaultThemeable => "default",
                _ => continue,
            };
            xml.push_str(&format!(
                "        <p name=\"{}\" {attribute}=\"{}\"/>\n",
                decl.name,
                escape_xml(&self.to_text(decl.name.as_str())?)
            ));
        }
        xml.push_str("\n    </option>\n\n</theme>\n");
        Ok(xml)
    }

    /// The blob that was in the preference slot when the last init began.
    pub fn revert_text(&self) -> &str {
        &self.live.revert
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn theme_status(&self) -> ThemeStatus {
        self.live.theme_status
    }

    pub fn theme_error(&self) -> Option<&Error> {
        self.live.theme_error.as_ref()
    }

    pub fn theme_url(&self) -> Option<&str> {
        self.live.theme_url.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_new_config(&self) -> bool {
        self.live.is_new_config
    }

    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn schema(&self) -> &Schema {
        &self.live.schema
    }

    pub fn declaration(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.live.schema.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.live.values.get(name)
    }

    pub fn theming(&self, name: &str) -> ParamTheming {
        self.live
            .theming
            .get(name)
            .copied()
            .unwrap_or_default()
    }
}

fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
