//! Strict candidate-record schema returned by the extraction oracle.
//!
//! Every field the oracle may omit is explicit `Option`/`Vec`. Unknown fields
//! and unknown enum values fail to parse; partial records are kept but score
//! lower and cannot pass approval validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::common::string_enum::string_enum;
use crate::common::utils::{canonicalize_url, identity_key, name_key};
use crate::common::{PipelineError, PipelineResult};

string_enum! {
    pub enum PatternCategory {
        DryFly => "dry_fly" | "dry",
        WetFly => "wet_fly" | "wet" | "soft_hackle",
        Nymph => "nymph",
        Emerger => "emerger",
        Streamer => "streamer",
        Terrestrial => "terrestrial",
        Saltwater => "saltwater" | "salt",
        Other => "other",
    }
}

string_enum! {
    pub enum Difficulty {
        Beginner => "beginner" | "easy",
        Intermediate => "intermediate" | "medium",
        Advanced => "advanced" | "hard" | "expert",
    }
}

string_enum! {
    pub enum WaterType {
        Freshwater => "freshwater" | "fresh" | "fresh_water",
        Saltwater => "saltwater" | "salt" | "salt_water",
        Both => "both" | "any",
    }
}

string_enum! {
    pub enum MaterialType {
        Hook => "hook",
        Thread => "thread",
        Bead => "bead" | "cone",
        Weight => "weight" | "lead_wire",
        Tail => "tail",
        Body => "body" | "chenille",
        Dubbing => "dubbing",
        Rib => "rib" | "ribbing" | "wire",
        Hackle => "hackle",
        Wing => "wing",
        Flash => "flash",
        Eyes => "eyes",
        Other => "other",
    }
}

string_enum! {
    pub enum ResourceType {
        Video => "video",
        Blog => "blog",
        Article => "article",
        Pdf => "pdf",
        Other => "other",
    }
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaterialEntry {
    pub material_type: MaterialType,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl MaterialEntry {
    /// Identity of a material in the shared catalog.
    pub fn material_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.material_type,
            name_key(&self.name),
            self.color.as_deref().map(name_key).unwrap_or_default(),
            self.size.as_deref().map(name_key).unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VariationEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubstitutionEntry {
    pub original: String,
    pub substitute: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceEntry {
    pub resource_type: ResourceType,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One structured candidate record for a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractedPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identity_key: Option<String>,
    #[serde(default)]
    pub category: Option<PatternCategory>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub water_type: Option<WaterType>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub variations: Vec<VariationEntry>,
    #[serde(default)]
    pub substitutions: Vec<SubstitutionEntry>,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ExtractedPayload {
    /// Parse an untrusted JSON value into the strict schema.
    pub fn from_json(value: serde_json::Value) -> PipelineResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PipelineError::Validation(format!("payload does not match schema: {}", e)))
    }

    /// Trimmed, non-empty pattern name.
    pub fn pattern_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Normalized identity key: the explicit key if it slugs to something,
    /// otherwise derived from the name.
    pub fn resolved_identity_key(&self) -> Option<String> {
        self.identity_key
            .as_deref()
            .and_then(identity_key)
            .or_else(|| self.pattern_name().and_then(identity_key))
    }

    pub fn has_material_type(&self, material_type: MaterialType) -> bool {
        self.materials.iter().any(|m| m.material_type == material_type)
    }

    /// Structural checks applied when a record enters the store.
    pub fn validate_ingress(&self) -> PipelineResult<()> {
        if let Some(key) = self.identity_key.as_deref() {
            if identity_key(key).is_none() {
                return Err(PipelineError::Validation(format!(
                    "identity key '{}' normalizes to nothing",
                    key
                )));
            }
        }
        if let Some(position) = self.materials.iter().position(|m| m.name.trim().is_empty()) {
            return Err(PipelineError::Validation(format!(
                "material #{} has an empty name",
                position + 1
            )));
        }
        for resource in &self.resources {
            canonicalize_url(&resource.url).map_err(|_| {
                PipelineError::Validation(format!("resource URL '{}' is not valid", resource.url))
            })?;
        }
        if let Some(image) = self.image_url.as_deref().filter(|s| !s.trim().is_empty()) {
            canonicalize_url(image).map_err(|_| {
                PipelineError::Validation(format!("image URL '{}' is not valid", image))
            })?;
        }
        Ok(())
    }

    /// Mandatory fields for approval: a name, a usable identity key and at
    /// least one material.
    pub fn validate_for_approval(&self) -> PipelineResult<()> {
        if self.pattern_name().is_none() {
            return Err(PipelineError::Validation("pattern name is missing".into()));
        }
        if self.resolved_identity_key().is_none() {
            return Err(PipelineError::Validation(
                "no identity key can be derived from the pattern name".into(),
            ));
        }
        if self.materials.is_empty() {
            return Err(PipelineError::Validation(
                "at least one material is required".into(),
            ));
        }
        Ok(())
    }

    /// Canonical form: trimmed strings, empty strings dropped, identity key
    /// resolved, duplicate materials/resources/variations removed (first wins).
    pub fn normalized(&self) -> Self {
        let mut seen_materials = HashSet::new();
        let materials = self
            .materials
            .iter()
            .map(|m| MaterialEntry {
                material_type: m.material_type,
                name: m.name.trim().to_string(),
                color: clean(&m.color),
                size: clean(&m.size),
                required: m.required,
            })
            .filter(|m| !m.name.is_empty())
            .filter(|m| seen_materials.insert(m.material_key()))
            .collect();

        let mut seen_variations = HashSet::new();
        let variations = self
            .variations
            .iter()
            .map(|v| VariationEntry {
                name: v.name.trim().to_string(),
                description: clean(&v.description),
            })
            .filter(|v| !v.name.is_empty())
            .filter(|v| seen_variations.insert(name_key(&v.name)))
            .collect();

        let mut seen_substitutions = HashSet::new();
        let substitutions = self
            .substitutions
            .iter()
            .map(|s| SubstitutionEntry {
                original: s.original.trim().to_string(),
                substitute: s.substitute.trim().to_string(),
                notes: clean(&s.notes),
            })
            .filter(|s| !s.original.is_empty() && !s.substitute.is_empty())
            .filter(|s| seen_substitutions.insert((name_key(&s.original), name_key(&s.substitute))))
            .collect();

        let mut seen_resources = HashSet::new();
        let resources = self
            .resources
            .iter()
            .filter_map(|r| {
                let url = canonicalize_url(&r.url).ok()?;
                Some(ResourceEntry {
                    resource_type: r.resource_type,
                    url,
                    title: clean(&r.title),
                })
            })
            .filter(|r| seen_resources.insert(r.url.clone()))
            .collect();

        Self {
            name: self.pattern_name().map(str::to_string),
            identity_key: self.resolved_identity_key(),
            category: self.category,
            difficulty: self.difficulty,
            water_type: self.water_type,
            origin: clean(&self.origin),
            description: clean(&self.description),
            image_url: clean(&self.image_url),
            instructions: self
                .instructions
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            materials,
            variations,
            substitutions,
            resources,
        }
    }
}
