//! Command implementations for the gprops CLI.
//!
//! Every command works on a [`Session`]: the project's profile container and
//! the standard property definitions. Commands return serializable results
//! that implement [`Output`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ProjectProperties, PropertyReport, open_persister};
use crate::property::EditContext;
use crate::settings::{
    ActiveSettingsQuery, AuxConfig, ProfileKey, ProfileSettings, ProfileSettingsContainer,
    SingleProfileSettings, SingleProfileSettingsEx,
};
use crate::storage::{ConfigSaveOptions, LineSeparator};
use crate::tree::ConfigKey;
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// An opened project.
pub struct Session {
    project_dir: PathBuf,
    properties: ProjectProperties,
    container: ProfileSettingsContainer,
}

impl Session {
    /// Open the project at `project_dir` with file storage.
    pub fn open(project_dir: &Path) -> Result<Self> {
        if !project_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Project directory does not exist: {}",
                project_dir.display()
            )));
        }
        let properties = ProjectProperties::from_env();
        let persister = open_persister(project_dir)?;
        let container =
            ProfileSettingsContainer::new(Arc::new(persister), Arc::new(properties.schema()))?;
        Ok(Self::with_parts(project_dir, properties, container))
    }

    pub fn with_parts(
        project_dir: &Path,
        properties: ProjectProperties,
        container: ProfileSettingsContainer,
    ) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            properties,
            container,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn profile(&self, name: Option<&str>) -> Result<(ProfileSettings, ActiveSettingsQuery)> {
        let key = match name {
            Some(name) => ProfileKey::parse(name)?,
            None => ProfileKey::Default,
        };
        let settings = self.container.load_profile(&key)?;
        let query = ActiveSettingsQuery::new(settings.clone(), self.container.default_profile()?);
        Ok((settings, query))
    }
}

fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

fn aux_key(key: &str) -> Result<ConfigKey> {
    ConfigKey::parse(key)
        .ok_or_else(|| Error::InvalidInput(format!("Invalid element name '{}'", key)))
}

// === Profiles ===

#[derive(Serialize)]
pub struct ProfileEntry {
    pub key: String,
    pub location: String,
    pub is_default: bool,
    pub is_private: bool,
}

#[derive(Serialize)]
pub struct ProfilesResult {
    pub profiles: Vec<ProfileEntry>,
}

impl Output for ProfilesResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} profile(s):", self.profiles.len())];
        for profile in &self.profiles {
            lines.push(format!("  {:<24} {}", profile.key, profile.location));
        }
        lines.join("\n")
    }
}

/// List the default profile and every profile file of the project.
pub fn profiles(session: &Session) -> Result<ProfilesResult> {
    let persister = session.container.persister();
    let profiles = session
        .container
        .available_profiles()?
        .into_iter()
        .map(|key| ProfileEntry {
            location: persister.location(&key),
            is_default: key.is_default(),
            is_private: key.is_private(),
            key: key.to_string(),
        })
        .collect();
    Ok(ProfilesResult { profiles })
}

// === Properties ===

#[derive(Serialize)]
pub struct PropertiesResult {
    pub profile: String,
    pub properties: Vec<PropertyReport>,
}

impl Output for PropertiesResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Profile {}:", self.profile)];
        for report in &self.properties {
            lines.push(format!(
                "  {:<20} {:<24} ({})",
                report.name,
                human_value(&report.value),
                report.source
            ));
        }
        lines.join("\n")
    }
}

fn human_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(human_value)
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::Object(map) => match (map.get("name"), map.get("version")) {
            (Some(name), Some(version)) => format!("{} ({})", human_value(name), human_value(version)),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Effective values of every standard property.
pub fn properties(session: &Session, profile: Option<&str>) -> Result<PropertiesResult> {
    let (settings, query) = session.profile(profile)?;
    let properties = session
        .properties
        .text_properties()
        .iter()
        .map(|property| property.report(&query))
        .collect();
    Ok(PropertiesResult {
        profile: settings.key().to_string(),
        properties,
    })
}

// === Get / Set / Unset ===

#[derive(Serialize)]
pub struct PropertyResult {
    pub profile: String,
    #[serde(flatten)]
    pub report: PropertyReport,
}

impl Output for PropertyResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} = {}", self.report.name, human_value(&self.report.value));
        out.push_str(&format!("\n  profile: {}", self.profile));
        out.push_str(&format!("\n  source:  {}", self.report.source));
        if self.report.is_default {
            out.push_str("\n  (default value)");
        }
        out
    }
}

/// Effective value of `property`.
pub fn get(session: &Session, property: &str, profile: Option<&str>) -> Result<PropertyResult> {
    let binding = session.properties.text_property(property)?;
    let (settings, query) = session.profile(profile)?;
    Ok(PropertyResult {
        profile: settings.key().to_string(),
        report: binding.report(&query),
    })
}

/// Store `value` for `property` in the profile and save it.
pub fn set(
    session: &Session,
    property: &str,
    value: Option<&str>,
    profile: Option<&str>,
) -> Result<PropertyResult> {
    let binding = session.properties.text_property(property)?;
    let (settings, query) = session.profile(profile)?;
    {
        let ctx = EditContext::enter();
        binding.set_text(&ctx, &settings, &query, value)?;
    }
    tracing::debug!(
        property = %property,
        profile = %settings.key(),
        cleared = value.is_none(),
        "Stored property"
    );
    Ok(PropertyResult {
        profile: settings.key().to_string(),
        report: binding.report(&query),
    })
}

// === Aux ===

#[derive(Serialize)]
pub struct AuxListResult {
    pub profile: String,
    pub elements: Vec<String>,
}

impl Output for AuxListResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.elements.is_empty() {
            return format!("No auxiliary elements in profile {}.", self.profile);
        }
        let mut lines = vec![format!("Auxiliary elements in profile {}:", self.profile)];
        lines.extend(self.elements.iter().map(|key| format!("  {}", key)));
        lines.join("\n")
    }
}

/// Auxiliary elements of the profile, in key order.
pub fn aux_list(session: &Session, profile: Option<&str>) -> Result<AuxListResult> {
    let (settings, _) = session.profile(profile)?;
    Ok(AuxListResult {
        profile: settings.key().to_string(),
        elements: settings.aux_configs().iter().map(ConfigKey::to_string).collect(),
    })
}

#[derive(Serialize)]
pub struct AuxElementResult {
    pub profile: String,
    pub element: String,
    pub xml: Option<String>,
}

impl Output for AuxElementResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.xml {
            Some(xml) => xml.clone(),
            None => format!("Removed {} from profile {}.", self.element, self.profile),
        }
    }
}

/// The auxiliary element `key` as XML.
pub fn aux_get(session: &Session, key: &str, profile: Option<&str>) -> Result<AuxElementResult> {
    let key = aux_key(key)?;
    let (settings, _) = session.profile(profile)?;
    let config = settings.aux_config(&key).ok_or_else(|| {
        Error::NotFound(format!(
            "No auxiliary element {} in profile {}",
            key,
            settings.key()
        ))
    })?;
    Ok(AuxElementResult {
        profile: settings.key().to_string(),
        element: key.to_string(),
        xml: Some(config.to_xml()),
    })
}

/// Store the auxiliary element given as XML text.
pub fn aux_set(session: &Session, xml: &str, profile: Option<&str>) -> Result<AuxElementResult> {
    let config = AuxConfig::parse(xml)?;
    let key = config.key().clone();
    let (settings, _) = session.profile(profile)?;
    if settings.schema().knows(&key) {
        return Err(Error::InvalidInput(format!(
            "{} is a standard property; use `gprops set`",
            key
        )));
    }
    {
        let ctx = EditContext::enter();
        settings.set_aux_config(&ctx, &key, Some(config));
    }
    settings.save_and_wait()?;
    aux_get(session, &key.to_string(), profile)
}

/// Remove the auxiliary element `key`.
pub fn aux_remove(
    session: &Session,
    key: &str,
    profile: Option<&str>,
) -> Result<AuxElementResult> {
    let key = aux_key(key)?;
    let (settings, _) = session.profile(profile)?;
    if settings.aux_config(&key).is_none() {
        return Err(Error::NotFound(format!(
            "No auxiliary element {} in profile {}",
            key,
            settings.key()
        )));
    }
    {
        let ctx = EditContext::enter();
        settings.set_aux_config(&ctx, &key, None);
    }
    settings.save_and_wait()?;
    Ok(AuxElementResult {
        profile: settings.key().to_string(),
        element: key.to_string(),
        xml: None,
    })
}

// === Normalize ===

#[derive(Serialize)]
pub struct NormalizeResult {
    pub profile: String,
    pub location: String,
    pub line_separator: String,
}

impl Output for NormalizeResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Rewrote {} ({} line endings).",
            self.location, self.line_separator
        )
    }
}

/// Rewrite the profile's file from its sorted tree.
pub fn normalize(
    session: &Session,
    profile: Option<&str>,
    separator: Option<LineSeparator>,
) -> Result<NormalizeResult> {
    let (settings, _) = session.profile(profile)?;
    {
        let ctx = EditContext::enter();
        settings.discard_source_text(&ctx);
        if let Some(separator) = separator {
            settings.set_save_options(&ctx, ConfigSaveOptions::new(Some(separator)));
        }
    }
    settings.force_save_and_wait()?;
    Ok(NormalizeResult {
        profile: settings.key().to_string(),
        location: settings.location(),
        line_separator: settings.save_options().line_separator().name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn session(env: &TestEnv) -> Session {
        Session::with_parts(env.path(), env.properties(), env.container())
    }

    // ==================== Property Tests ====================

    #[test]
    fn test_set_then_get_in_profile() {
        let env = TestEnv::new();
        let session = session(&env);

        set(&session, "daemon-timeout", Some("30"), None).unwrap();
        let result = set(&session, "daemon-timeout", Some("10"), Some("debug")).unwrap();
        assert_eq!(result.report.value, serde_json::json!("10"));
        assert_eq!(result.report.source, "profile:debug");

        let default = get(&session, "daemon-timeout", None).unwrap();
        assert_eq!(default.report.value, serde_json::json!("30"));
        assert!(
            env.read_file(".gradle-props/profiles/debug.xml")
                .contains("<timeout>10</timeout>")
        );
    }

    #[test]
    fn test_unset_falls_back_to_default_profile() {
        let env = TestEnv::new();
        let session = session(&env);
        set(&session, "source-level", Some("11"), None).unwrap();
        set(&session, "source-level", Some("21"), Some("debug")).unwrap();

        let result = set(&session, "source-level", None, Some("debug")).unwrap();
        assert_eq!(result.report.value, serde_json::json!("11"));
        assert_eq!(result.report.source, "default-profile");
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let env = TestEnv::new();
        let session = session(&env);
        assert!(matches!(
            get(&session, "colour", None),
            Err(Error::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_properties_lists_all() {
        let env = TestEnv::new();
        let session = session(&env);
        let result = properties(&session, None).unwrap();
        assert_eq!(result.profile, "<default>");
        assert_eq!(result.properties.len(), 10);
        assert!(result.properties.iter().all(|p| p.source == "builtin"));
        assert!(result.to_human().contains("source-level"));
    }

    // ==================== Profile Tests ====================

    #[test]
    fn test_profiles_lists_files() {
        let env = TestEnv::new();
        env.write_file(".gradle-props/profiles/debug.xml", "<gradle-props/>");
        let session = session(&env);
        let result = profiles(&session).unwrap();
        let keys: Vec<&str> = result.profiles.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["<default>", "debug"]);
        assert!(result.profiles[0].is_default);
    }

    // ==================== Aux Tests ====================

    #[test]
    fn test_aux_round_trip() {
        let env = TestEnv::new();
        let session = session(&env);
        let xml = "<vendor-ext mode=\"fast\"><!-- keep --><flag>on</flag></vendor-ext>";

        let stored = aux_set(&session, xml, None).unwrap();
        assert_eq!(stored.xml.as_deref(), Some(xml));
        assert!(env.read_file("gradle-props.xml").contains(xml));

        let listed = aux_list(&session, None).unwrap();
        assert_eq!(listed.elements, vec!["vendor-ext".to_string()]);

        aux_remove(&session, "vendor-ext", None).unwrap();
        assert!(matches!(
            aux_get(&session, "vendor-ext", None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_aux_set_empty_element() {
        let env = TestEnv::new();
        let session = session(&env);
        let stored = aux_set(&session, "<marker/>", None).unwrap();
        assert_eq!(stored.xml.as_deref(), Some("<marker/>"));
        assert_eq!(
            aux_list(&session, None).unwrap().elements,
            vec!["marker".to_string()]
        );
    }

    #[test]
    fn test_aux_set_strips_prolog() {
        let env = TestEnv::new();
        let session = session(&env);
        let stored = aux_set(&session, "<?xml version=\"1.0\"?><ext>1</ext>", None).unwrap();
        assert_eq!(stored.xml.as_deref(), Some("<ext>1</ext>"));

        let reopened = Session::with_parts(env.path(), env.properties(), env.container());
        let listed = aux_list(&reopened, None).unwrap();
        assert_eq!(listed.elements, vec!["ext".to_string()]);
        set(&reopened, "source-level", Some("11"), None).unwrap();
    }

    #[test]
    fn test_aux_set_rejects_standard_property() {
        let env = TestEnv::new();
        let session = session(&env);
        assert!(matches!(
            aux_set(&session, "<source-level>8</source-level>", None),
            Err(Error::InvalidInput(_))
        ));
    }

    // ==================== Normalize Tests ====================

    #[test]
    fn test_normalize_rewrites_with_crlf() {
        let env = TestEnv::new();
        env.write_file(
            "gradle-props.xml",
            "<gradle-props><source-level>  11 </source-level></gradle-props>",
        );
        let session = session(&env);
        let result = normalize(&session, None, Some(LineSeparator::CrLf)).unwrap();
        assert_eq!(result.line_separator, LineSeparator::CrLf.name());

        let text = env.read_file("gradle-props.xml");
        assert!(text.contains("\r\n  <source-level>11</source-level>\r\n"));
    }
}
