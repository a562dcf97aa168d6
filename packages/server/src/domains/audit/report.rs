use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::common::utils::name_key;

use super::snapshot::{CatalogSnapshot, PatternSnapshot};

/// Patterns missing at least this many dimensions are listed as incomplete.
pub const INCOMPLETE_THRESHOLD: usize = 4;

/// Minimum material count for the `withMinMaterials` dimension.
pub const MIN_MATERIALS: usize = 3;

const UNCATEGORIZED: &str = "uncategorized";

/// The data-quality dimensions every pattern is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dimension {
    #[serde(rename = "withImages")]
    Images,
    #[serde(rename = "withInstructions")]
    Instructions,
    #[serde(rename = "withMinMaterials")]
    MinMaterials,
    #[serde(rename = "withHook")]
    Hook,
    #[serde(rename = "withThread")]
    Thread,
    #[serde(rename = "withVideo")]
    Video,
    #[serde(rename = "withArticle")]
    Article,
    #[serde(rename = "withOrigin")]
    Origin,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Images,
        Dimension::Instructions,
        Dimension::MinMaterials,
        Dimension::Hook,
        Dimension::Thread,
        Dimension::Video,
        Dimension::Article,
        Dimension::Origin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Images => "withImages",
            Dimension::Instructions => "withInstructions",
            Dimension::MinMaterials => "withMinMaterials",
            Dimension::Hook => "withHook",
            Dimension::Thread => "withThread",
            Dimension::Video => "withVideo",
            Dimension::Article => "withArticle",
            Dimension::Origin => "withOrigin",
        }
    }

    pub fn is_satisfied(&self, pattern: &PatternSnapshot) -> bool {
        match self {
            Dimension::Images => has_text(&pattern.image_url),
            Dimension::Instructions => pattern.instructions.iter().any(|s| !s.trim().is_empty()),
            Dimension::MinMaterials => pattern.materials.len() >= MIN_MATERIALS,
            Dimension::Hook => has_material(pattern, "hook"),
            Dimension::Thread => has_material(pattern, "thread"),
            Dimension::Video => has_resource(pattern, &["video"]),
            Dimension::Article => has_resource(pattern, &["blog", "article"]),
            Dimension::Origin => has_text(&pattern.origin),
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn has_material(pattern: &PatternSnapshot, material_type: &str) -> bool {
    pattern
        .materials
        .iter()
        .any(|m| m.material_type.trim().eq_ignore_ascii_case(material_type))
}

fn has_resource(pattern: &PatternSnapshot, types: &[&str]) -> bool {
    pattern.resources.iter().any(|r| {
        types
            .iter()
            .any(|t| r.resource_type.trim().eq_ignore_ascii_case(t))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionStat {
    pub complete: usize,
    pub total: usize,
    pub percent: f64,
}

impl DimensionStat {
    fn new(complete: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (complete as f64 * 1000.0 / total as f64).round() / 10.0
        };
        Self {
            complete,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub pattern_count: usize,
    pub dimensions: BTreeMap<Dimension, DimensionStat>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompletePattern {
    pub name: String,
    pub category: Option<String>,
    pub missing_count: usize,
    pub missing: Vec<Dimension>,
}

/// Structured completeness report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub total_patterns: usize,
    pub dimensions: BTreeMap<Dimension, DimensionStat>,
    pub by_category: BTreeMap<String, CategoryBreakdown>,
    pub incomplete_patterns: Vec<IncompletePattern>,
    pub missing_expected: Vec<String>,
}

fn missing_dimensions(pattern: &PatternSnapshot) -> Vec<Dimension> {
    Dimension::ALL
        .iter()
        .copied()
        .filter(|d| !d.is_satisfied(pattern))
        .collect()
}

fn dimension_stats<'a>(
    patterns: impl Iterator<Item = &'a PatternSnapshot> + Clone,
) -> BTreeMap<Dimension, DimensionStat> {
    let total = patterns.clone().count();
    Dimension::ALL
        .iter()
        .map(|d| {
            let complete = patterns.clone().filter(|p| d.is_satisfied(p)).count();
            (*d, DimensionStat::new(complete, total))
        })
        .collect()
}

fn category_of(pattern: &PatternSnapshot) -> String {
    pattern
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Evaluate a snapshot. Pure: the snapshot is only read.
pub fn audit_catalog(snapshot: &CatalogSnapshot, expected: &[String]) -> AuditReport {
    let patterns = &snapshot.patterns;

    let mut categories: BTreeMap<String, Vec<&PatternSnapshot>> = BTreeMap::new();
    for pattern in patterns {
        categories.entry(category_of(pattern)).or_default().push(pattern);
    }
    let by_category = categories
        .into_iter()
        .map(|(category, members)| {
            let breakdown = CategoryBreakdown {
                pattern_count: members.len(),
                dimensions: dimension_stats(members.iter().copied()),
            };
            (category, breakdown)
        })
        .collect();

    let mut incomplete_patterns: Vec<IncompletePattern> = patterns
        .iter()
        .filter_map(|p| {
            let missing = missing_dimensions(p);
            (missing.len() >= INCOMPLETE_THRESHOLD).then(|| IncompletePattern {
                name: p.name.clone(),
                category: p.category.clone(),
                missing_count: missing.len(),
                missing,
            })
        })
        .collect();
    incomplete_patterns.sort_by(|a, b| {
        b.missing_count
            .cmp(&a.missing_count)
            .then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
    });

    let present: HashSet<String> = patterns.iter().map(|p| p.name_key()).collect();
    let mut seen = HashSet::new();
    let missing_expected = expected
        .iter()
        .filter(|name| !name.trim().is_empty())
        .filter(|name| !present.contains(&name_key(name)))
        .filter(|name| seen.insert(name_key(name)))
        .map(|name| name.trim().to_string())
        .collect();

    AuditReport {
        total_patterns: patterns.len(),
        dimensions: dimension_stats(patterns.iter()),
        by_category,
        incomplete_patterns,
        missing_expected,
    }
}

fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{:.0}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

impl AuditReport {
    /// One line per dimension ("withInstructions: 4/10 (40%)").
    pub fn dimension_lines(&self) -> Vec<String> {
        Dimension::ALL
            .iter()
            .filter_map(|d| {
                self.dimensions.get(d).map(|stat| {
                    format!(
                        "{}: {}/{} ({})",
                        d.label(),
                        stat.complete,
                        stat.total,
                        format_percent(stat.percent)
                    )
                })
            })
            .collect()
    }

    /// Short human-readable summary for the console.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Catalog completeness: {} patterns", self.total_patterns);
        for line in self.dimension_lines() {
            let _ = writeln!(out, "  {}", line);
        }

        if !self.by_category.is_empty() {
            let _ = writeln!(out, "By category:");
            for (category, breakdown) in &self.by_category {
                let complete: usize = breakdown.dimensions.values().map(|s| s.complete).sum();
                let possible = breakdown.pattern_count * Dimension::ALL.len();
                let _ = writeln!(
                    out,
                    "  {}: {} patterns, {}/{} dimensions filled",
                    category, breakdown.pattern_count, complete, possible
                );
            }
        }

        let _ = writeln!(
            out,
            "Patterns missing {}+ dimensions: {}",
            INCOMPLETE_THRESHOLD,
            self.incomplete_patterns.len()
        );
        for pattern in &self.incomplete_patterns {
            let missing: Vec<&str> = pattern.missing.iter().map(|d| d.label()).collect();
            let _ = writeln!(
                out,
                "  {} ({} missing: {})",
                pattern.name,
                pattern.missing_count,
                missing.join(", ")
            );
        }

        if !self.missing_expected.is_empty() {
            let _ = writeln!(
                out,
                "Expected patterns not in catalog: {}",
                self.missing_expected.len()
            );
            for name in &self.missing_expected {
                let _ = writeln!(out, "  {}", name);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::audit::snapshot::{SnapshotMaterial, SnapshotResource};

    fn material(material_type: &str, name: &str) -> SnapshotMaterial {
        SnapshotMaterial {
            material_type: material_type.into(),
            name: name.into(),
        }
    }

    fn complete(name: &str) -> PatternSnapshot {
        PatternSnapshot {
            name: name.into(),
            category: Some("nymph".into()),
            image_url: Some("https://img.example.com/fly.jpg".into()),
            instructions: vec!["Bead on hook".into(), "Wrap thread".into()],
            origin: Some("Colorado".into()),
            materials: vec![
                material("hook", "Scud hook"),
                material("thread", "8/0"),
                material("bead", "Tungsten bead"),
            ],
            resources: vec![
                SnapshotResource {
                    resource_type: "video".into(),
                    url: "https://video.example.com/1".into(),
                },
                SnapshotResource {
                    resource_type: "blog".into(),
                    url: "https://blog.example.com/1".into(),
                },
            ],
        }
    }

    /// Ten patterns, none with images, six without instructions. The six also
    /// lack video and origin so they cross the incomplete threshold.
    fn scenario_snapshot() -> CatalogSnapshot {
        let patterns = (0..10)
            .map(|i| {
                let mut p = complete(&format!("Pattern {:02}", i));
                p.image_url = None;
                if i >= 4 {
                    p.instructions.clear();
                    p.resources.retain(|r| r.resource_type != "video");
                    p.origin = None;
                }
                p
            })
            .collect();
        CatalogSnapshot { patterns }
    }

    #[test]
    fn reports_dimension_percentages() {
        let report = audit_catalog(&scenario_snapshot(), &[]);
        let lines = report.dimension_lines();

        assert!(lines.contains(&"withInstructions: 4/10 (40%)".to_string()));
        assert!(lines.contains(&"withImages: 0/10 (0%)".to_string()));
        assert!(lines.contains(&"withHook: 10/10 (100%)".to_string()));
        assert_eq!(report.total_patterns, 10);
    }

    #[test]
    fn lists_patterns_missing_four_or_more() {
        let report = audit_catalog(&scenario_snapshot(), &[]);
        let names: Vec<&str> = report
            .incomplete_patterns
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        assert_eq!(
            names,
            vec!["Pattern 04", "Pattern 05", "Pattern 06", "Pattern 07", "Pattern 08", "Pattern 09"]
        );
        assert!(report.incomplete_patterns.iter().all(|p| p.missing_count == 4));
        assert!(report.summary().contains("Pattern 07 (4 missing"));
    }

    #[test]
    fn incomplete_list_ranks_by_missing_count() {
        let mut worst = complete("Bare Hook");
        worst.image_url = None;
        worst.instructions.clear();
        worst.origin = None;
        worst.resources.clear();
        worst.materials.truncate(1);

        let mut some = complete("Almost");
        some.image_url = None;
        some.instructions.clear();
        some.origin = None;
        some.resources.clear();

        let snapshot = CatalogSnapshot {
            patterns: vec![some, worst, complete("Fine")],
        };
        let report = audit_catalog(&snapshot, &[]);
        assert_eq!(report.incomplete_patterns.len(), 2);
        assert_eq!(report.incomplete_patterns[0].name, "Bare Hook");
        assert_eq!(report.incomplete_patterns[0].missing_count, 7);
        assert_eq!(report.incomplete_patterns[1].name, "Almost");
    }

    #[test]
    fn expected_names_compare_case_and_whitespace_insensitively() {
        let snapshot = CatalogSnapshot {
            patterns: vec![complete("Woolly Bugger"), complete("Zebra  Midge")],
        };
        let expected = vec![
            "woolly   bugger".to_string(),
            " ZEBRA MIDGE".to_string(),
            "Adams".to_string(),
            "adams".to_string(),
        ];
        let report = audit_catalog(&snapshot, &expected);
        assert_eq!(report.missing_expected, vec!["Adams".to_string()]);
    }

    #[test]
    fn breaks_down_by_category() {
        let mut streamer = complete("Woolly Bugger");
        streamer.category = Some("Streamer".into());
        streamer.image_url = None;
        let mut loose = complete("Mystery");
        loose.category = None;

        let snapshot = CatalogSnapshot {
            patterns: vec![complete("Zebra Midge"), streamer, loose],
        };
        let report = audit_catalog(&snapshot, &[]);

        assert_eq!(report.by_category.len(), 3);
        let streamers = &report.by_category["streamer"];
        assert_eq!(streamers.pattern_count, 1);
        assert_eq!(streamers.dimensions[&Dimension::Images].complete, 0);
        assert!(report.by_category.contains_key(UNCATEGORIZED));
    }

    #[test]
    fn empty_snapshot_reports_zero() {
        let report = audit_catalog(&CatalogSnapshot::default(), &[]);
        assert_eq!(report.total_patterns, 0);
        assert!(report.incomplete_patterns.is_empty());
        assert!(report
            .dimension_lines()
            .contains(&"withOrigin: 0/0 (0%)".to_string()));
    }
}
