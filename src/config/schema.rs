//! Standard Gradle project properties.
//!
//! | name | element | merge |
//! |---|---|---|
//! | `source-level` | `<source-level>17</source-level>` | profile overrides |
//! | `source-encoding` | `<source-encoding>UTF-8</source-encoding>` | profile overrides |
//! | `target-platform` | `<target-platform name="jdk-17" version="17"/>` | profile overrides |
//! | `script-platform` | `<script-platform name="jdk-17" version="17"/>` | profile overrides |
//! | `gradle-home` | `<gradle-home>?VER=8.5</gradle-home>` | profile overrides |
//! | `model-loading` | `<model-loading>best</model-loading>` | profile overrides |
//! | `daemon-timeout` | `<gradle-daemon><timeout>30</timeout></gradle-daemon>` | profile overrides |
//! | `jvm-args` | `<jvm-args><arg>-Xmx2g</arg></jvm-args>` | union, default profile first |
//! | `license-header` | `<license-header>...</license-header>` | profile overrides |
//! | `show-gradle-version` | `<gradle-version-hint>true</gradle-version-hint>` | first `true` wins |

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

use crate::gradle::{
    GradleCapability, GradleLocation, GradleVersion, JavaPlatform, PlatformId, PlatformOrder,
    PlatformProvider, StaticPlatformProvider, select_platform,
};
use crate::property::{ConstProperty, EditContext, MutableProperty, SharedSource};
use crate::settings::{
    ActiveSettingsQuery, CompositeEditorFactory, DefaultedValueDef, FirstNonDefault, FnEncoding,
    OptionalValueDef, ProfileEditor, ProfileSettings, ProfileSettingsEditor, PropertyDef,
    PropertyEditor, PropertyEditorFactory, SettingsSchema, StringListEncoding, TextEncoding,
    TreeEncoding, UnionMerger, ValueDef,
};
use crate::storage::format;
use crate::tree::{ConfigKey, ConfigPath, ConfigTree, OrderedNodeProperty, PreservedNodeProperty};
use crate::{Error, Result};

use super::resolver::{ValueSource, value_source};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How project models are loaded from Gradle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelLoadingStrategy {
    /// The newest model API the Gradle version supports
    #[default]
    Best,
    /// Always the newest model API
    Newest,
    /// The model API of older Gradle versions
    Older,
    /// Plain tooling API models only
    UseToolingApi,
}

impl ModelLoadingStrategy {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "best" => Some(ModelLoadingStrategy::Best),
            "newest" => Some(ModelLoadingStrategy::Newest),
            "older" => Some(ModelLoadingStrategy::Older),
            "use-tooling-api" => Some(ModelLoadingStrategy::UseToolingApi),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelLoadingStrategy::Best => "best",
            ModelLoadingStrategy::Newest => "newest",
            ModelLoadingStrategy::Older => "older",
            ModelLoadingStrategy::UseToolingApi => "use-tooling-api",
        }
    }

    /// The concrete strategy for `version`; `Best` picks by capability.
    pub fn resolve(&self, version: &GradleVersion) -> ModelLoadingStrategy {
        match self {
            ModelLoadingStrategy::Best if version.supports(GradleCapability::ToolingApiModels) => {
                ModelLoadingStrategy::Newest
            }
            ModelLoadingStrategy::Best => ModelLoadingStrategy::Older,
            other => *other,
        }
    }
}

impl std::fmt::Display for ModelLoadingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelLoadingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Invalid model loading strategy '{}' (expected best, newest, older or use-tooling-api)",
                s
            ))
        })
    }
}

/// Maps a requested platform to an installed one.
struct PlatformValueDef {
    provider: Arc<dyn PlatformProvider>,
    order: PlatformOrder,
}

impl ValueDef<PlatformId, Option<JavaPlatform>> for PlatformValueDef {
    fn property(&self, key: Option<PlatformId>) -> SharedSource<Option<JavaPlatform>> {
        match key {
            Some(id) => Arc::new(ConstProperty::of(select_platform(
                &id,
                self.provider.as_ref(),
                &self.order,
            ))),
            None => Arc::new(ConstProperty::default_of(self.provider.default_platform())),
        }
    }

    fn key_from_value(&self, value: &Option<JavaPlatform>) -> Option<PlatformId> {
        value.as_ref().map(JavaPlatform::id)
    }
}

fn platform_encoding() -> FnEncoding<PlatformId> {
    FnEncoding::new(
        |node: &ConfigTree| {
            let Some(version) = node.attribute("version").or(node.value()) else {
                return if node.is_empty() {
                    Ok(None)
                } else {
                    Err(Error::decode("platform", "missing version"))
                };
            };
            let name = node.attribute("name").unwrap_or_default();
            Ok(Some(PlatformId::new(name, version)))
        },
        |id: &PlatformId| {
            let builder = ConfigTree::builder();
            let builder = if id.name.is_empty() {
                builder
            } else {
                builder.attribute("name", id.name.clone())
            };
            builder.attribute("version", id.version.clone()).build()
        },
    )
}

fn text_def<K>(name: &str, path: &str, default: K) -> PropertyDef<K, K>
where
    K: FromStr + ToString + Clone + Send + Sync + 'static,
    K::Err: std::fmt::Display,
{
    PropertyDef::new(
        name,
        ConfigPath::parse(path),
        Arc::new(TextEncoding::<K>::new()),
        Arc::new(DefaultedValueDef::new(default)),
    )
}

/// The standard property definitions of a Gradle project.
pub struct ProjectProperties {
    pub source_level: Arc<PropertyDef<String, String>>,
    pub source_encoding: Arc<PropertyDef<String, String>>,
    pub target_platform: Arc<PropertyDef<PlatformId, Option<JavaPlatform>>>,
    pub script_platform: Arc<PropertyDef<PlatformId, Option<JavaPlatform>>>,
    pub gradle_home: Arc<PropertyDef<GradleLocation, GradleLocation>>,
    pub model_loading: Arc<PropertyDef<ModelLoadingStrategy, ModelLoadingStrategy>>,
    pub daemon_timeout: Arc<PropertyDef<u32, Option<u32>>>,
    pub jvm_args: Arc<PropertyDef<Vec<String>, Vec<String>>>,
    pub license_header: Arc<PropertyDef<ConfigTree, Option<ConfigTree>>>,
    pub show_gradle_version: Arc<PropertyDef<bool, bool>>,
}

impl ProjectProperties {
    pub fn new(provider: Arc<dyn PlatformProvider>, order: PlatformOrder) -> Self {
        let platform = |name: &str| {
            Arc::new(PropertyDef::new(
                name,
                ConfigPath::parse(name),
                Arc::new(platform_encoding()),
                Arc::new(PlatformValueDef {
                    provider: provider.clone(),
                    order: order.clone(),
                }),
            ))
        };

        Self {
            source_level: Arc::new(text_def("source-level", "source-level", "17".to_string())),
            source_encoding: Arc::new(text_def(
                "source-encoding",
                "source-encoding",
                "UTF-8".to_string(),
            )),
            target_platform: platform("target-platform"),
            script_platform: platform("script-platform"),
            gradle_home: Arc::new(text_def(
                "gradle-home",
                "gradle-home",
                GradleLocation::Default,
            )),
            model_loading: Arc::new(text_def(
                "model-loading",
                "model-loading",
                ModelLoadingStrategy::Best,
            )),
            daemon_timeout: Arc::new(PropertyDef::new(
                "daemon-timeout",
                ConfigPath::parse("gradle-daemon/timeout"),
                Arc::new(TextEncoding::<u32>::new()),
                Arc::new(OptionalValueDef),
            )),
            jvm_args: Arc::new(
                PropertyDef::new(
                    "jvm-args",
                    ConfigPath::parse("jvm-args"),
                    Arc::new(StringListEncoding::new("arg")),
                    Arc::new(DefaultedValueDef::new(Vec::new())),
                )
                .with_merger(Arc::new(UnionMerger))
                .with_node_property(Arc::new(OrderedNodeProperty)),
            ),
            license_header: Arc::new(
                PropertyDef::new(
                    "license-header",
                    ConfigPath::parse("license-header"),
                    Arc::new(TreeEncoding),
                    Arc::new(OptionalValueDef),
                )
                .with_node_property(Arc::new(PreservedNodeProperty)),
            ),
            show_gradle_version: Arc::new(
                text_def("show-gradle-version", "gradle-version-hint", false)
                    .with_merger(Arc::new(FirstNonDefault)),
            ),
        }
    }

    /// Properties using the platforms listed in the environment.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(StaticPlatformProvider::from_env()),
            PlatformOrder::default(),
        )
    }

    /// Schema claiming every standard property.
    pub fn schema(&self) -> SettingsSchema {
        SettingsSchema::builder()
            .register(&self.source_level)
            .register(&self.source_encoding)
            .register(&self.target_platform)
            .register(&self.script_platform)
            .register(&self.gradle_home)
            .register(&self.model_loading)
            .register(&self.daemon_timeout)
            .register(&self.jvm_args)
            .register(&self.license_header)
            .register(&self.show_gradle_version)
            .build()
    }

    /// Editor factory covering every standard property.
    pub fn editor_factory(&self) -> CompositeEditorFactory {
        CompositeEditorFactory::new()
            .with(Arc::new(PropertyEditorFactory::new(self.source_level.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.source_encoding.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.target_platform.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.script_platform.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.gradle_home.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.model_loading.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.daemon_timeout.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.jvm_args.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.license_header.clone())))
            .with(Arc::new(PropertyEditorFactory::new(self.show_gradle_version.clone())))
    }

    /// Text bindings for every standard property, in schema order.
    pub fn text_properties(&self) -> Vec<Arc<dyn TextProperty>> {
        vec![
            binding(&self.source_level, parse_token, show_text),
            binding(&self.source_encoding, parse_token, show_text),
            binding(&self.target_platform, PlatformId::parse, show_platform),
            binding(&self.script_platform, PlatformId::parse, show_platform),
            binding(&self.gradle_home, GradleLocation::parse, show_text),
            binding(&self.model_loading, parse_token, show_text),
            binding(&self.daemon_timeout, parse_token, show_optional),
            binding(&self.jvm_args, parse_args, |args: &Vec<String>| json!(args)),
            binding(&self.license_header, parse_fragment, show_fragment),
            binding(&self.show_gradle_version, parse_token, |v: &bool| json!(v)),
        ]
    }

    /// Text binding of the property called `name`.
    pub fn text_property(&self, name: &str) -> Result<Arc<dyn TextProperty>> {
        self.text_properties()
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }
}

/// The effective value of a property, for display.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyReport {
    pub name: String,
    pub path: String,
    pub value: serde_json::Value,
    pub is_default: bool,
    pub source: String,
}

/// A property read and written as text.
pub trait TextProperty: Send + Sync {
    fn name(&self) -> &str;

    fn path(&self) -> &ConfigPath;

    /// The merged value for the profile selected in `query`.
    fn report(&self, query: &ActiveSettingsQuery) -> PropertyReport;

    /// Set (or with `None`, unset) the value `settings` stores, through a
    /// profile editor, and persist it.
    fn set_text(
        &self,
        ctx: &EditContext,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
        text: Option<&str>,
    ) -> Result<()>;
}

struct TextBinding<K, V> {
    def: Arc<PropertyDef<K, V>>,
    parse: fn(&str) -> Result<K>,
    show: fn(&V) -> serde_json::Value,
}

fn binding<K, V>(
    def: &Arc<PropertyDef<K, V>>,
    parse: fn(&str) -> Result<K>,
    show: fn(&V) -> serde_json::Value,
) -> Arc<dyn TextProperty>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    Arc::new(TextBinding {
        def: def.clone(),
        parse,
        show,
    })
}

impl<K, V> TextProperty for TextBinding<K, V>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.def.name()
    }

    fn path(&self) -> &ConfigPath {
        self.def.path()
    }

    fn report(&self, query: &ActiveSettingsQuery) -> PropertyReport {
        let selected = query.current_profile_settings().value();
        let own = self.def.profile_source(&selected).value();
        let from_default = if selected == *query.default_profile() {
            None
        } else {
            self.def.profile_source(query.default_profile()).value()
        };
        let merged = query.merged_key(&self.def).value();
        let value = query.get_property(&self.def);
        let source = value_source(
            selected.key(),
            own.is_some(),
            from_default.is_some(),
            merged != own,
        );
        PropertyReport {
            name: self.def.name().to_string(),
            path: self.def.path().to_string(),
            value: (self.show)(&value.value()),
            is_default: value.is_default(),
            source: source.to_string(),
        }
    }

    fn set_text(
        &self,
        ctx: &EditContext,
        settings: &ProfileSettings,
        query: &ActiveSettingsQuery,
        text: Option<&str>,
    ) -> Result<()> {
        let key = text.map(self.parse).transpose()?;
        let editor = PropertyEditor::new(&self.def, settings, query);
        let field = editor.field().clone();
        let profile_editor = ProfileSettingsEditor::new(
            settings.clone(),
            vec![Box::new(editor) as Box<dyn ProfileEditor>],
        );
        profile_editor.read_from_settings().display_settings(ctx);
        field.set_value(ctx, key);
        profile_editor.read_from_gui().save_settings(ctx)
    }
}

/// Parse a token-like value; surrounding whitespace is not part of it.
fn parse_token<K>(text: &str) -> Result<K>
where
    K: FromStr,
    K::Err: std::fmt::Display,
{
    text.trim()
        .parse()
        .map_err(|e: K::Err| Error::InvalidInput(format!("Invalid value '{}': {}", text, e)))
}

fn parse_args(text: &str) -> Result<Vec<String>> {
    Ok(text.split_whitespace().map(str::to_string).collect())
}

fn parse_fragment(text: &str) -> Result<ConfigTree> {
    let (_, tree) = format::parse_element(text)?;
    Ok(tree)
}

fn show_text<V: ToString>(value: &V) -> serde_json::Value {
    json!(value.to_string())
}

fn show_optional<V: ToString>(value: &Option<V>) -> serde_json::Value {
    match value {
        Some(v) => json!(v.to_string()),
        None => serde_json::Value::Null,
    }
}

fn show_platform(value: &Option<JavaPlatform>) -> serde_json::Value {
    json!(value)
}

fn show_fragment(value: &Option<ConfigTree>) -> serde_json::Value {
    match value {
        Some(tree) => json!(format::render_element(
            &ConfigKey::new("license-header"),
            tree
        )),
        None => serde_json::Value::Null,
    }
}
