use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use config_model::{OptionList, ScalarTag, TypeTag, ValueList};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Folded into the blob checksum; bumping it invalidates every stored blob.
pub const SCHEMA_VERSION: u32 = 217;

/// Name of the value-list parameter holding the theme selection.
pub const THEME: &str = "theme";

/// Value of the synthetic selection that turns theming off.
pub const THEME_DISABLED: &str = "Disabled";

/// A parameter name that is known to the schema it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamName(&'static str);

impl ParamName {
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl Borrow<str> for ParamName {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Who may configure a parameter, and what a theme may do to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeFlag {
    /// `V`: user-configurable; a theme may pin its value or its default.
    ValueThemeable,
    /// `D`: user-configurable; a theme may only override its default.
    DefaultThemeable,
    /// `N`: user-configurable, never themed.
    NotThemeable,
    /// `F`: reserved for future user configuration; held at its default.
    ForcedPending,
    /// `S`: assigned by the host environment only.
    System,
    /// `T`: set by themes only and never persisted.
    ThemeOnly,
}

impl ThemeFlag {
    const ALL: [Self; 6] = [
        Self::ValueThemeable,
        Self::DefaultThemeable,
        Self::NotThemeable,
        Self::ForcedPending,
        Self::System,
        Self::ThemeOnly,
    ];

    pub const fn code(self) -> char {
        match self {
            Self::ValueThemeable => 'V',
            Self::DefaultThemeable => 'D',
            Self::NotThemeable => 'N',
            Self::ForcedPending => 'F',
            Self::System => 'S',
            Self::ThemeOnly => 'T',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.code() == code)
    }

    pub fn is_user_configurable(self) -> bool {
        matches!(
            self,
            Self::ValueThemeable | Self::DefaultThemeable | Self::NotThemeable
        )
    }

    pub fn is_persisted(self) -> bool {
        self != Self::ThemeOnly
    }

    pub fn accepts_theme_value(self) -> bool {
        matches!(self, Self::ValueThemeable | Self::ThemeOnly)
    }

    pub fn accepts_theme_default(self) -> bool {
        matches!(self, Self::ValueThemeable | Self::DefaultThemeable)
    }
}

impl fmt::Display for ThemeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How the active theme currently affects a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParamTheming {
    #[default]
    None,
    /// Value forced by the theme; not user-editable.
    Value,
    /// Default overridden by the theme; still user-editable.
    Default,
}

impl ParamTheming {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Value => "value",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ParamTheming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    Scalar(TypeTag),
    /// Index-valued choice.
    Options(Arc<OptionList>),
    /// String-valued choice.
    Values(Arc<ValueList>),
}

impl ParameterType {
    pub fn is_list(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(tag) => write!(f, "{tag}"),
            Self::Options(list) => write!(f, "options({})", list.len()),
            Self::Values(list) => write!(f, "values({})", list.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    pub name: ParamName,
    pub flag: ThemeFlag,
    pub description: &'static str,
    pub ty: ParameterType,
    /// `None` marks a required parameter.
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
}

impl ParameterDeclaration {
    pub fn new(
        flag: ThemeFlag,
        name: &'static str,
        description: &'static str,
        ty: ParameterType,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: ParamName(name),
            flag,
            description,
            ty,
            default,
            min: None,
            max: None,
            min_size: None,
            max_size: None,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn sizes(mut self, min_size: usize, max_size: usize) -> Self {
        self.min_size = Some(min_size);
        self.max_size = Some(max_size);
        self
    }

    /// Copy of this declaration with a different default.
    pub fn with_default(&self, default: Option<Value>) -> Self {
        Self {
            default,
            ..self.clone()
        }
    }

    /// Copy of this declaration with a different type.
    pub fn with_type(&self, ty: ParameterType) -> Self {
        Self {
            ty,
            ..self.clone()
        }
    }

    pub fn scalar_tag(&self) -> Option<TypeTag> {
        match self.ty {
            ParameterType::Scalar(tag) => Some(tag),
            _ => None,
        }
    }

    fn check(&self) -> Result<()> {
        let name = self.name;
        if self.ty.is_list() && self.default.is_none() {
            return Err(Error::assertion("List parameter must have a default").with_info(name));
        }
        if let Some(default) = &self.default
            && !default.conforms_to(&self.ty)
        {
            return Err(Error::assertion("Parameter default is not the correct type")
                .with_info(name)
                .with_info(default));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size)
            && min > max
        {
            return Err(Error::assertion("Array size bounds are inverted").with_info(name));
        }
        Ok(())
    }
}

/// Ordered, immutable-by-convention map from parameter name to declaration.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    params: IndexMap<ParamName, ParameterDeclaration>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: ParameterDeclaration) -> Result<()> {
        decl.check()?;
        if self.params.contains_key(decl.name.as_str()) {
            return Err(Error::assertion("Duplicate parameter name").with_info(decl.name));
        }
        self.params.insert(decl.name, decl);
        Ok(())
    }

    /// Swaps in a new declaration for an existing parameter, keeping its position.
    pub fn replace(&mut self, decl: ParameterDeclaration) -> Result<()> {
        decl.check()?;
        match self.params.get_mut(decl.name.as_str()) {
            Some(slot) => {
                *slot = decl;
                Ok(())
            }
            None => Err(Error::assertion("Unknown parameter name").with_info(decl.name)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.params.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ParameterDeclaration> {
        self.get(name)
            .ok_or_else(|| Error::assertion("Unknown parameter name").with_info(name))
    }

    pub fn name(&self, name: &str) -> Option<ParamName> {
        self.params.get_key_value(name).map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.params.values()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The photofeed widget's full parameter table.
    pub fn photofeed() -> Result<Self> {
        let lists = Lists::build()?;
        let mut schema = Self::new();
        for decl in photofeed_params(&lists)? {
            schema.insert(decl)?;
        }
        Ok(schema)
    }
}

/// The theme selection list before any theme document has been seen.
pub fn initial_themes() -> Result<ValueList> {
    Ok(ValueList::new([(
        "disabled",
        THEME_DISABLED,
        THEME_DISABLED,
    )])?)
}

struct Lists {
    themes: Arc<ValueList>,
    aligns: Arc<OptionList>,
    layouts: Arc<OptionList>,
    frame_styles: Arc<OptionList>,
    edge_styles: Arc<OptionList>,
    reveal_styles: Arc<OptionList>,
    space_styles: Arc<OptionList>,
    shape_styles: Arc<OptionList>,
    shadow_styles: Arc<OptionList>,
    mat_styles: Arc<OptionList>,
    text_styles: Arc<OptionList>,
    panel_styles: Arc<OptionList>,
    button_styles: Arc<OptionList>,
    spread_styles: Arc<OptionList>,
}

const BORDER_STYLES: &[(&str, &str)] = &[
    ("none", "None"),
    ("solid", "Solid"),
    ("double", "Double"),
    ("groove", "Groove"),
    ("ridge", "Ridge"),
    ("inset", "Inset"),
    ("outset", "Outset"),
    ("dotted", "Dotted"),
    ("dashed", "Dashed"),
];

fn options(pairs: &[(&str, &str)]) -> Result<Arc<OptionList>> {
    Ok(Arc::new(OptionList::new(pairs.iter().copied())?))
}

fn mat_styles() -> Result<Arc<OptionList>> {
    let mut list = OptionList::new([
        ("none", "None"),
        ("solid", "Solid"),
        ("dotS1", "Dot"),
    ])?;
    for (prefix, text) in [("grid", "Grid"), ("diag", "Diag"), ("checker", "Checker"), ("weave", "Weave")] {
        for variant in ['A', 'B', 'C'] {
            list.push(format!("{prefix}{variant}S0"), format!("{text} {variant}"))?;
        }
    }
    for (prefix, text) in [("spot", "Spot"), ("cross", "Cross")] {
        for size in 1..=4 {
            list.push(format!("{prefix}S{size}"), format!("{text} {size}"))?;
        }
    }
    for variant in ['A', 'B', 'C', 'D'] {
        for size in 1..=4 {
            list.push(
                format!("square{variant}S{size}"),
                format!("Square {variant} {size}"),
            )?;
        }
    }
    Ok(Arc::new(list))
}

impl Lists {
    fn build() -> Result<Self> {
        Ok(Self {
            themes: Arc::new(initial_themes()?),
            aligns: options(&[("left", "Left"), ("right", "Right"), ("center", "Center")])?,
            layouts: options(&[
                ("exact", "Exact"),
                ("trimMin", "Trim Min"),
                ("trimMax", "Trim Max"),
                ("pushMin", "Push Min"),
                ("pushMax", "Push Max"),
                ("pullMin", "Pull Min"),
                ("pullMax", "Pull Max"),
            ])?,
            frame_styles: options(BORDER_STYLES)?,
            edge_styles: options(BORDER_STYLES)?,
            reveal_styles: options(&[("none", "None"), ("solid", "Solid")])?,
            space_styles: options(&[("clear", "Clear"), ("solid", "Solid")])?,
            shape_styles: options(&[
                ("rect", "Rect"),
                ("roundPX", "Round px"),
                ("roundPC", "Round %"),
                ("innerPX", "Inner px"),
                ("innerPC", "Inner %"),
                ("outerPX", "Outer px"),
                ("outerPC", "Outer %"),
            ])?,
            shadow_styles: options(&[
                ("none", "None"),
                ("solid", "Solid"),
                ("translucent", "Translucent"),
                ("blurS", "Blur S"),
                ("blurT", "Blur T"),
                ("hazeS", "Haze S"),
                ("hazeT", "Haze T"),
                ("dotS1", "Dot S"),
                ("dotT1", "Dot T"),
            ])?,
            mat_styles: mat_styles()?,
            text_styles: options(&[
                ("none", "None"),
                ("defSN", "Normal S"),
                ("defMN", "Normal M"),
                ("defLN", "Normal L"),
                ("defSB", "Bold S"),
                ("defMB", "Bold M"),
                ("defLB", "Bold L"),
            ])?,
            panel_styles: options(&[
                ("none", "None"),
                ("padSN", "Slim S"),
                ("padMN", "Slim M"),
                ("padLN", "Slim L"),
                ("padSB", "Wide S"),
                ("padMB", "Wide M"),
                ("padLB", "Wide L"),
                ("strSN", "Strip S"),
                ("strMN", "Strip M"),
                ("strLN", "Strip L"),
            ])?,
            button_styles: options(&[
                ("bare", "Bare"),
                ("dotted", "Dotted"),
                ("light", "Light"),
                ("medium", "Medium"),
                ("heavy", "Heavy"),
                ("double", "Double"),
                ("fillBare", "Fill Bare"),
                ("fillDotted", "Fill Dotted"),
                ("fillLight", "Fill Light"),
                ("fillMedium", "Fill Medium"),
                ("fillHeavy", "Fill Heavy"),
                ("fillDouble", "Fill Double"),
                ("fillInset", "Fill Inset"),
                ("fillOutset", "Fill Outset"),
            ])?,
            spread_styles: options(&[("clear", "Clear"), ("solid", "Solid"), ("blur", "Blur")])?,
        })
    }
}

/// Default selection `name` of an option list.
fn pick(list: &OptionList, name: &str) -> Result<Option<Value>> {
    list.index_of_name(name)
        .map(|index| Some(Value::Index(index)))
        .ok_or_else(|| Error::assertion("Unknown option name").with_info(name))
}

fn scalar(tag: ScalarTag) -> ParameterType {
    ParameterType::Scalar(TypeTag::scalar(tag))
}

fn int(value: i64) -> Option<Value> {
    Some(Value::Int(value))
}

fn flag(value: bool) -> Option<Value> {
    Some(Value::Bool(value))
}

fn text(value: &str) -> Option<Value> {
    Some(Value::text(value))
}

/// Pushes the color, style and metric parameters of one decorated layer.
macro_rules! layer {
    ($params:ident, $list:expr, $set:literal, $layer:literal, $label:literal, $metric:literal,
     $color:literal, $style:literal, $value:literal, $min:literal, $max:literal) => {
        $params.push(ParameterDeclaration::new(
            ThemeFlag::ValueThemeable,
            concat!($layer, "Color", $set),
            concat!($label, " Color ", $set),
            scalar(ScalarTag::Color),
            text($color),
        ));
        $params.push(ParameterDeclaration::new(
            ThemeFlag::ValueThemeable,
            concat!($layer, "Style", $set),
            concat!($label, " Style ", $set),
            ParameterType::Options($list.clone()),
            pick(&$list, $style)?,
        ));
        $params.push(
            ParameterDeclaration::new(
                ThemeFlag::ValueThemeable,
                concat!($layer, $metric, $set),
                concat!($label, " ", $metric, " ", $set),
                scalar(ScalarTag::Integer),
                int($value),
            )
            .range($min as f64, $max as f64),
        );
    };
}

/// Decoration metrics for the selection grid.
fn selection_set_a(lists: &Lists, params: &mut Vec<ParameterDeclaration>) -> Result<()> {
    layer!(params, lists.frame_styles, "A", "frame", "Frame", "Width", "#0000FF", "solid", 5, 1, 20);
    layer!(params, lists.shape_styles, "A", "shape", "Shape", "Radius", "#FFFFFF", "roundPX", 5, 2, 50);
    layer!(params, lists.mat_styles, "A", "mat", "Mat", "Width", "#FFFFFF", "solid", 5, 1, 30);
    layer!(params, lists.edge_styles, "A", "edge", "Edge", "Width", "#000000", "solid", 1, 1, 5);
    layer!(params, lists.reveal_styles, "A", "reveal", "Reveal", "Width", "#FFFFFF", "solid", 1, 1, 5);
    layer!(params, lists.shadow_styles, "A", "shadow", "Shadow", "Width", "#888888", "blurS", 5, 5, 20);
    layer!(params, lists.space_styles, "A", "space", "Space", "Width", "#FFFFFF", "clear", 5, 0, 20);
    Ok(())
}

/// Decoration metrics for slides.
fn selection_set_b(lists: &Lists, params: &mut Vec<ParameterDeclaration>) -> Result<()> {
    layer!(params, lists.frame_styles, "B", "frame", "Frame", "Width", "#0000FF", "solid", 10, 1, 20);
    layer!(params, lists.shape_styles, "B", "shape", "Shape", "Radius", "#FFFFFF", "roundPX", 10, 2, 50);
    layer!(params, lists.mat_styles, "B", "mat", "Mat", "Width", "#FFFFFF", "solid", 10, 1, 30);
    layer!(params, lists.edge_styles, "B", "edge", "Edge", "Width", "#000000", "solid", 2, 1, 5);
    layer!(params, lists.reveal_styles, "B", "reveal", "Reveal", "Width", "#FFFFFF", "solid", 2, 1, 5);
    layer!(params, lists.shadow_styles, "B", "shadow", "Shadow", "Width", "#888888", "blurS", 10, 5, 20);
    layer!(params, lists.space_styles, "B", "space", "Space", "Width", "#FFFFFF", "clear", 10, 0, 20);
    Ok(())
}

fn photofeed_params(lists: &Lists) -> Result<Vec<ParameterDeclaration>> {
    use ParameterDeclaration as P;
    use ScalarTag::{Bool, Color, File, Integer, Page, Source, Str, Url};
    use ThemeFlag::{
        DefaultThemeable as D, NotThemeable as N, System as S, ThemeOnly as T,
        ValueThemeable as V,
    };

    let opts = |list: &Arc<OptionList>| ParameterType::Options(list.clone());
    let mut params = vec![
        // Theme-only switches and timings.
        P::new(T, "cacheDeferTime", "Cache Defer Time", scalar(Integer), int(4_000_000))
            .range(0.0, 7_200_000.0),
        P::new(T, "showLoadingDelay", "Show Loading Delay", scalar(Integer), int(3000))
            .range(1000.0, 10_000.0),
        P::new(T, "useImageProxy", "Use Image Proxy", scalar(Bool), flag(true)),
        P::new(T, "captureKeys", "Capture Keys", scalar(Bool), flag(true)),
        P::new(T, "cleanCaption", "Clean Caption", scalar(Bool), flag(true)),
        P::new(T, "cleanTitle", "Clean Title", scalar(Bool), flag(true)),
    ];

    for (name, desc, label) in [
        ("langHelp", "Lang Help", "Help"),
        ("langClose", "Lang Close", "Close"),
        ("langFirst", "Lang First", "First"),
        ("langLast", "Lang Last", "Last"),
        ("langPrevious", "Lang Previous", "Previous"),
        ("langNext", "Lang Next", "Next"),
        ("langSkipBack", "Lang Skip Back", "Skip Back"),
        ("langSkipAhead", "Lang Skip Ahead", "Skip Ahead"),
        ("langViewMore", "Lang View More", "View More"),
        ("langViewNext", "Lang View Next", "View Next"),
        ("langReadMore", "Lang Read More", "Read More"),
        ("langLoading", "Lang Loading", "Loading"),
    ] {
        params.push(P::new(T, name, desc, scalar(Str), text(label)));
    }

    params.extend([
        P::new(S, "origParent", "Original Parent URL", scalar(Url), None),
        P::new(S, "parent", "Parent URL", scalar(Url), None),
        P::new(S, "serveTime", "Serve Time", scalar(Integer), None),
        P::new(S, "themeForced", "Theme Forced", scalar(Bool), flag(false)),
        P::new(
            N,
            THEME,
            "Theme",
            ParameterType::Values(lists.themes.clone()),
            text(THEME_DISABLED),
        ),
        P::new(D, "cabSource", "Cabinet Source", scalar(Source), text("photos")),
        P::new(N, "cabName", "Cabinet Name", scalar(Page), None),
        P::new(N, "leadPhotoName", "Lead Photo Name", scalar(File), None),
        P::new(N, "deferCache", "Defer Cache", scalar(Bool), flag(false)),
        P::new(V, "noSlides", "No Slides", scalar(Bool), flag(false)),
        P::new(V, "noSymbols", "No Symbols", scalar(Bool), flag(false)),
        P::new(V, "padding", "Padding", scalar(Integer), int(0)).range(0.0, 20.0),
        P::new(V, "align", "Align", opts(&lists.aligns), pick(&lists.aligns, "left")?),
        P::new(V, "refHeight", "Reference Height", scalar(Integer), int(400))
            .range(150.0, 1200.0),
        P::new(
            V,
            "grid",
            "Grid",
            ParameterType::Scalar(TypeTag::array(Integer)),
            Some(Value::ints([1])),
        )
        .range(1.0, 20.0)
        .sizes(1, 20),
        P::new(V, "wrap", "Wrap", scalar(Bool), flag(false)),
        P::new(N, "text", "Text", scalar(Str), text("")),
        P::new(N, "link", "Link", scalar(Url), text("")),
        P::new(V, "linkNew", "Link New", scalar(Bool), flag(false)),
        P::new(V, "layout", "Layout", opts(&lists.layouts), pick(&lists.layouts, "exact")?),
        P::new(V, "footerColor", "Footer Color", scalar(Color), text("#888888")),
        P::new(
            V,
            "footerStyle",
            "Footer Style",
            opts(&lists.text_styles),
            pick(&lists.text_styles, "defMN")?,
        ),
        P::new(V, "footerHeight", "Footer Height", scalar(Integer), int(25)).range(20.0, 60.0),
        P::new(V, "hoverColor", "Hover Color", scalar(Color), text("#FF0000")),
    ]);

    selection_set_a(lists, &mut params)?;

    let ranged = |name, desc, value: i64, min: f64, max: f64| {
        P::new(V, name, desc, scalar(Integer), int(value)).range(min, max)
    };
    let color = |name, desc, value| P::new(V, name, desc, scalar(Color), text(value));
    params.extend([
        color("panelColor", "Panel Color", "#0000FF"),
        P::new(
            V,
            "panelStyle",
            "Panel Style",
            opts(&lists.panel_styles),
            pick(&lists.panel_styles, "padMB")?,
        ),
        ranged("panelHeight", "Panel Height", 30, 20.0, 50.0),
        ranged("panelOpacity", "Panel Opacity", 40, 10.0, 100.0),
        color("buttonColor", "Button Color", "#FFFFFF"),
        P::new(
            V,
            "buttonStyle",
            "Button Style",
            opts(&lists.button_styles),
            pick(&lists.button_styles, "fillBare")?,
        ),
        ranged("buttonRadius", "Button Radius", 10, 0.0, 50.0),
        color("spreadColor", "Spread Color", "#888888"),
        P::new(
            V,
            "spreadStyle",
            "Spread Style",
            opts(&lists.spread_styles),
            pick(&lists.spread_styles, "clear")?,
        ),
        ranged("spreadWidth", "Spread Width", 0, 0.0, 8.0),
        color("glowColor", "Glow Color", "#00FF00"),
        color("beckonColor", "Beckon Color", "#FF0000"),
        color("upperColor", "Upper Color", "#888888"),
        P::new(
            V,
            "upperStyle",
            "Upper Style",
            opts(&lists.text_styles),
            pick(&lists.text_styles, "defMN")?,
        ),
        ranged("upperHeight", "Upper Height", 30, 20.0, 60.0),
        color("lowerColor", "Lower Color", "#888888"),
        P::new(
            V,
            "lowerStyle",
            "Lower Style",
            opts(&lists.text_styles),
            pick(&lists.text_styles, "defMN")?,
        ),
        ranged("lowerHeight", "Lower Height", 30, 20.0, 60.0),
    ]);

    selection_set_b(lists, &mut params)?;
    Ok(params)
}
