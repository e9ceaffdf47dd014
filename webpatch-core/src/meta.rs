//! Patch descriptors and eligibility metadata.
//!
//! A [`PatchMeta`] captures everything the dispatcher needs to decide
//! *whether* a patch runs: URL patterns, execution world, load-phase
//! timing, run policy, and device scope. Descriptors are immutable once
//! built; the builder applies defaults at construction time so every
//! eligibility check is a plain comparison against a concrete value.

use crate::error::{MetaError, PatternError};
use crate::setting::SettingDef;
use bitflags::bitflags;
use std::collections::HashSet;

/// The script isolation world a patch's code runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum World {
    /// The extension-isolated world.
    #[default]
    Isolated,
    /// The world shared with the page's own scripts.
    Main,
}

/// The load-phase invocation a patch attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunAt {
    /// Before the document begins loading resources.
    DocumentStart,
    /// After the DOM is complete but before subresources finish.
    DocumentEnd,
    /// After the page has settled.
    #[default]
    DocumentIdle,
}

/// Whether a patch may re-execute on navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Execute at most once per in-memory session.
    Once,
    /// Re-evaluate (and potentially re-run) on every navigation.
    #[default]
    OnUrlChange,
}

bitflags! {
    /// Device classes a patch applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceScope: u8 {
        /// Viewports at or above the mobile cutoff.
        const DESKTOP = 1 << 0;
        /// Viewports below the mobile cutoff.
        const MOBILE = 1 << 1;
    }
}

impl Default for DeviceScope {
    fn default() -> Self {
        Self::all()
    }
}

impl DeviceScope {
    /// Whether this scope covers the given device class.
    pub fn allows(self, device: DeviceType) -> bool {
        match device {
            DeviceType::Desktop => self.contains(Self::DESKTOP),
            DeviceType::Mobile => self.contains(Self::MOBILE),
        }
    }
}

/// Viewport widths below this many pixels are classified as mobile.
pub const MOBILE_VIEWPORT_CUTOFF: u32 = 768;

/// Device class derived from the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Wide viewport.
    Desktop,
    /// Narrow viewport.
    Mobile,
}

impl DeviceType {
    /// Classify a viewport width.
    pub fn from_viewport_width(width: u32) -> Self {
        if width < MOBILE_VIEWPORT_CUTOFF {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

/// A compiled URL predicate.
#[derive(Debug, Clone)]
pub struct UrlPattern(regex::Regex);

impl UrlPattern {
    /// Compile a pattern. The pattern is a regular expression matched
    /// against the full URL.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        regex::Regex::new(pattern)
            .map(Self)
            .map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Whether the pattern matches the given URL.
    pub fn is_match(&self, url: &str) -> bool {
        self.0.is_match(url)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Immutable metadata for a patch.
///
/// Construct via [`PatchMeta::builder`]; every optional field has the
/// defaults of the builder applied, so consumers compare concrete values.
#[derive(Debug, Clone)]
pub struct PatchMeta {
    /// Globally unique, stable identifier; the persistence key.
    pub id: String,
    /// Human-readable name, used in failure logs.
    pub name: String,
    /// Brief description of what the patch does.
    pub description: String,
    /// URL predicates; the patch is eligible iff at least one matches.
    pub matches: Vec<UrlPattern>,
    /// Script world the patch runs in.
    pub world: World,
    /// Load-phase invocation the patch attaches to.
    pub run_at: RunAt,
    /// Re-execution policy across navigations.
    pub run_policy: RunPolicy,
    /// Device classes the patch applies to.
    pub device_scope: DeviceScope,
    /// Declared settings, possibly empty.
    pub settings: Vec<SettingDef>,
}

impl PatchMeta {
    /// Start building a descriptor. Defaults: [`World::Isolated`],
    /// [`RunAt::DocumentIdle`], [`RunPolicy::OnUrlChange`], all devices,
    /// no settings.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> PatchMetaBuilder {
        PatchMetaBuilder {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            matches: Vec::new(),
            world: World::default(),
            run_at: RunAt::default(),
            run_policy: RunPolicy::default(),
            device_scope: DeviceScope::default(),
            settings: Vec::new(),
        }
    }

    /// Whether any declared pattern matches the URL.
    pub fn matches_url(&self, url: &str) -> bool {
        self.matches.iter().any(|pattern| pattern.is_match(url))
    }
}

/// Builder for [`PatchMeta`]. Validation happens in [`build`].
///
/// [`build`]: PatchMetaBuilder::build
#[derive(Debug)]
pub struct PatchMetaBuilder {
    id: String,
    name: String,
    description: String,
    matches: Vec<UrlPattern>,
    world: World,
    run_at: RunAt,
    run_policy: RunPolicy,
    device_scope: DeviceScope,
    settings: Vec<SettingDef>,
}

impl PatchMetaBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add one URL predicate.
    pub fn match_url(mut self, pattern: UrlPattern) -> Self {
        self.matches.push(pattern);
        self
    }

    /// Set the execution world.
    pub fn world(mut self, world: World) -> Self {
        self.world = world;
        self
    }

    /// Set the load-phase timing.
    pub fn run_at(mut self, run_at: RunAt) -> Self {
        self.run_at = run_at;
        self
    }

    /// Set the re-execution policy.
    pub fn run_policy(mut self, policy: RunPolicy) -> Self {
        self.run_policy = policy;
        self
    }

    /// Restrict the device scope.
    pub fn device_scope(mut self, scope: DeviceScope) -> Self {
        self.device_scope = scope;
        self
    }

    /// Declare one setting.
    pub fn setting(mut self, def: SettingDef) -> Self {
        self.settings.push(def);
        self
    }

    /// Validate and build the descriptor.
    ///
    /// Fails fast on an empty id, an empty pattern list, or duplicate
    /// setting ids.
    pub fn build(self) -> Result<PatchMeta, MetaError> {
        if self.id.is_empty() {
            return Err(MetaError::EmptyId);
        }
        if self.matches.is_empty() {
            return Err(MetaError::NoMatches { patch: self.id });
        }
        let mut seen = HashSet::new();
        for def in &self.settings {
            if !seen.insert(def.id.as_str()) {
                return Err(MetaError::DuplicateSetting {
                    patch: self.id.clone(),
                    setting: def.id.clone(),
                });
            }
        }
        Ok(PatchMeta {
            id: self.id,
            name: self.name,
            description: self.description,
            matches: self.matches,
            world: self.world,
            run_at: self.run_at,
            run_policy: self.run_policy,
            device_scope: self.device_scope,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::SettingKind;

    fn any_url() -> UrlPattern {
        UrlPattern::new(".*").unwrap()
    }

    #[test]
    fn builder_applies_defaults() {
        let meta = PatchMeta::builder("p", "Patch")
            .match_url(any_url())
            .build()
            .unwrap();
        assert_eq!(meta.world, World::Isolated);
        assert_eq!(meta.run_at, RunAt::DocumentIdle);
        assert_eq!(meta.run_policy, RunPolicy::OnUrlChange);
        assert_eq!(meta.device_scope, DeviceScope::all());
    }

    #[test]
    fn builder_rejects_missing_patterns() {
        let err = PatchMeta::builder("p", "Patch").build().unwrap_err();
        assert!(matches!(err, MetaError::NoMatches { .. }));
    }

    #[test]
    fn builder_rejects_duplicate_setting_ids() {
        let err = PatchMeta::builder("p", "Patch")
            .match_url(any_url())
            .setting(SettingDef::new("a", "A", SettingKind::Boolean { default: true }))
            .setting(SettingDef::new("a", "A2", SettingKind::Boolean { default: false }))
            .build()
            .unwrap_err();
        assert!(matches!(err, MetaError::DuplicateSetting { .. }));
    }

    #[test]
    fn url_matching() {
        let meta = PatchMeta::builder("p", "Patch")
            .match_url(UrlPattern::new(r"^https://example\.com/").unwrap())
            .build()
            .unwrap();
        assert!(meta.matches_url("https://example.com/feed"));
        assert!(!meta.matches_url("https://other.example/feed"));
    }

    #[test]
    fn device_classification_cutoff() {
        assert_eq!(DeviceType::from_viewport_width(767), DeviceType::Mobile);
        assert_eq!(DeviceType::from_viewport_width(768), DeviceType::Desktop);
    }

    #[test]
    fn device_scope_filtering() {
        assert!(DeviceScope::all().allows(DeviceType::Mobile));
        assert!(!DeviceScope::DESKTOP.allows(DeviceType::Mobile));
        assert!(DeviceScope::DESKTOP.allows(DeviceType::Desktop));
    }
}
