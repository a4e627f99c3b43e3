//! Quality scoring of synthesized blueprints.
//!
//! Five dimensions, each a deterministic function of the blueprint and its
//! run context. The composite is the weighted sum of the dimensions; the
//! weights are validated to sum to 1.0 at configuration load time, so the
//! composite stays in [0, 1] by construction.

use std::collections::HashSet;

use serpsmith_core::QualitySettings;

use crate::types::{Blueprint, Coverage, DimensionScores, PageAnalysis, QualityScore};

/// Run context the dimensions are evaluated against.
pub struct ScoreContext<'a> {
    pub analyses: &'a [PageAnalysis],
    pub coverage: Coverage,
}

/// Scores one blueprint version against its run context.
#[must_use]
pub fn score(
    blueprint: &Blueprint,
    ctx: &ScoreContext<'_>,
    settings: &QualitySettings,
) -> QualityScore {
    let dimensions = DimensionScores {
        factual_accuracy: factual_accuracy(ctx),
        content_relevance: content_relevance(blueprint, ctx),
        structural_quality: structural_quality(blueprint, ctx),
        originality: originality(blueprint, ctx),
        bias: bias(ctx),
    };

    let w = &settings.weights;
    let composite = w.factual_accuracy * dimensions.factual_accuracy
        + w.content_relevance * dimensions.content_relevance
        + w.structural_quality * dimensions.structural_quality
        + w.originality * dimensions.originality
        + w.bias * dimensions.bias;

    QualityScore {
        dimensions,
        composite,
        pass: composite >= settings.pass_threshold,
    }
}

/// Grounding breadth: how much of the intended competitor field actually
/// backs the blueprint, blended with entity support per profile (saturating
/// at five entities).
#[allow(clippy::cast_precision_loss)]
fn factual_accuracy(ctx: &ScoreContext<'_>) -> f64 {
    if ctx.coverage.attempted == 0 || ctx.analyses.is_empty() {
        return 0.0;
    }
    let coverage = ctx.coverage.extracted as f64 / ctx.coverage.attempted as f64;
    let avg_entities = ctx
        .analyses
        .iter()
        .map(|a| a.profile.entities.len())
        .sum::<usize>() as f64
        / ctx.analyses.len() as f64;
    let entity_support = (avg_entities / 5.0).min(1.0);
    0.5 * coverage + 0.5 * entity_support
}

/// Share of the field's topical mass (weight × inverse rank) captured by the
/// outline's headings and sub-topics.
fn content_relevance(blueprint: &Blueprint, ctx: &ScoreContext<'_>) -> f64 {
    let covered: HashSet<String> = blueprint
        .sections
        .iter()
        .flat_map(|s| {
            std::iter::once(s.heading.to_lowercase()).chain(s.sub_topics.iter().map(|t| t.to_lowercase()))
        })
        .collect();

    let mut captured = 0.0;
    let mut total = 0.0;
    for analysis in ctx.analyses {
        let inverse_rank = 1.0 / f64::from(analysis.rank.max(1));
        for topic in &analysis.profile.topics {
            let mass = topic.weight * inverse_rank;
            total += mass;
            if covered.contains(&topic.label.to_lowercase()) {
                captured += mass;
            }
        }
    }
    if total > 0.0 {
        captured / total
    } else {
        0.0
    }
}

/// Mean competitor structural score, blended with outline adequacy
/// (saturating at five sections).
#[allow(clippy::cast_precision_loss)]
fn structural_quality(blueprint: &Blueprint, ctx: &ScoreContext<'_>) -> f64 {
    if ctx.analyses.is_empty() {
        return 0.0;
    }
    let mean = ctx
        .analyses
        .iter()
        .map(|a| a.profile.structural_score)
        .sum::<f64>()
        / ctx.analyses.len() as f64;
    let adequacy = (blueprint.sections.len() as f64 / 5.0).min(1.0);
    0.7 * mean + 0.3 * adequacy
}

/// Penalizes outlines that merely mirror what every competitor already
/// covers: one minus the mean fraction of profiles that carry each section's
/// topic.
#[allow(clippy::cast_precision_loss)]
fn originality(blueprint: &Blueprint, ctx: &ScoreContext<'_>) -> f64 {
    if blueprint.sections.is_empty() || ctx.analyses.is_empty() {
        return 0.0;
    }
    let mut presence_sum = 0.0;
    for section in &blueprint.sections {
        let label = section.heading.to_lowercase();
        let present = ctx
            .analyses
            .iter()
            .filter(|a| a.profile.topics.iter().any(|t| t.label.to_lowercase() == label))
            .count();
        presence_sum += present as f64 / ctx.analyses.len() as f64;
    }
    1.0 - presence_sum / blueprint.sections.len() as f64
}

/// Neutrality of the competitor field: a strongly one-sided field suggests
/// the synthesized angle inherits that slant.
#[allow(clippy::cast_precision_loss)]
fn bias(ctx: &ScoreContext<'_>) -> f64 {
    if ctx.analyses.is_empty() {
        return 0.0;
    }
    let mean = ctx.analyses.iter().map(|a| a.profile.sentiment).sum::<f64>()
        / ctx.analyses.len() as f64;
    1.0 - mean.abs()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use serpsmith_analyze::{Entity, SemanticProfile, Topic};
    use serpsmith_core::QualityWeights;
    use serpsmith_extract::ExtractedPage;

    use super::*;
    use crate::types::BlueprintSection;

    fn analysis(rank: u32, topics: &[(&str, f64)], sentiment: f64) -> PageAnalysis {
        PageAnalysis {
            page: ExtractedPage {
                source_url: format!("https://r{rank}.example.com"),
                headings: Vec::new(),
                paragraph_count: 8,
                word_count: 1000,
                extraction_timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
            },
            profile: SemanticProfile {
                source_url: format!("https://r{rank}.example.com"),
                entities: vec![
                    Entity {
                        name: "hemp".to_owned(),
                        entity_type: "SUBSTANCE".to_owned(),
                        salience: 0.6,
                    },
                    Entity {
                        name: "FDA".to_owned(),
                        entity_type: "ORG".to_owned(),
                        salience: 0.4,
                    },
                ],
                topics: topics
                    .iter()
                    .map(|(label, weight)| Topic {
                        label: (*label).to_owned(),
                        weight: *weight,
                    })
                    .collect(),
                sentiment,
                structural_score: 0.8,
            },
            rank,
        }
    }

    fn blueprint(headings: &[&str]) -> Blueprint {
        Blueprint {
            keyword: "hemp beverages".to_owned(),
            title_suggestion: "Hemp Beverages".to_owned(),
            sections: headings
                .iter()
                .map(|h| BlueprintSection {
                    heading: (*h).to_owned(),
                    sub_topics: Vec::new(),
                    paa_questions: Vec::new(),
                })
                .collect(),
            recommended_word_count: 1210,
            version: 1,
            source_urls: Vec::new(),
        }
    }

    fn settings(threshold: f64) -> QualitySettings {
        QualitySettings {
            weights: QualityWeights::default(),
            pass_threshold: threshold,
            max_synthesis_retries: 2,
        }
    }

    #[test]
    fn composite_is_the_weighted_sum_of_dimensions() {
        let analyses = vec![
            analysis(1, &[("dosage", 0.6), ("flavor", 0.4)], 0.2),
            analysis(2, &[("dosage", 1.0)], -0.2),
        ];
        let ctx = ScoreContext {
            analyses: &analyses,
            coverage: Coverage {
                extracted: 2,
                attempted: 2,
            },
        };
        let quality = score(&blueprint(&["Dosage", "Flavor"]), &ctx, &settings(0.6));

        let w = QualityWeights::default();
        let d = &quality.dimensions;
        let expected = w.factual_accuracy * d.factual_accuracy
            + w.content_relevance * d.content_relevance
            + w.structural_quality * d.structural_quality
            + w.originality * d.originality
            + w.bias * d.bias;
        assert!((quality.composite - expected).abs() < 1e-12);
    }

    #[test]
    fn all_dimensions_stay_in_unit_interval() {
        let analyses = vec![analysis(1, &[("dosage", 1.0)], -0.9)];
        let ctx = ScoreContext {
            analyses: &analyses,
            coverage: Coverage {
                extracted: 1,
                attempted: 5,
            },
        };
        let quality = score(&blueprint(&["Dosage"]), &ctx, &settings(0.6));
        let d = &quality.dimensions;
        for value in [
            d.factual_accuracy,
            d.content_relevance,
            d.structural_quality,
            d.originality,
            d.bias,
        ] {
            assert!((0.0..=1.0).contains(&value), "dimension out of range: {value}");
        }
        assert!((0.0..=1.0).contains(&quality.composite));
    }

    #[test]
    fn pass_reflects_the_configured_threshold() {
        let analyses = vec![analysis(1, &[("dosage", 1.0)], 0.0)];
        let ctx = ScoreContext {
            analyses: &analyses,
            coverage: Coverage {
                extracted: 1,
                attempted: 1,
            },
        };
        let bp = blueprint(&["Dosage"]);
        assert!(score(&bp, &ctx, &settings(0.0)).pass);
        assert!(!score(&bp, &ctx, &settings(1.0)).pass);
    }

    #[test]
    fn ubiquitous_topics_score_lower_on_originality() {
        let everywhere = vec![
            analysis(1, &[("dosage", 1.0)], 0.0),
            analysis(2, &[("dosage", 1.0)], 0.0),
        ];
        let rare = vec![
            analysis(1, &[("dosage", 1.0)], 0.0),
            analysis(2, &[("flavor", 1.0)], 0.0),
        ];
        let bp = blueprint(&["Dosage"]);
        let ctx_everywhere = ScoreContext {
            analyses: &everywhere,
            coverage: Coverage {
                extracted: 2,
                attempted: 2,
            },
        };
        let ctx_rare = ScoreContext {
            analyses: &rare,
            coverage: Coverage {
                extracted: 2,
                attempted: 2,
            },
        };
        let mirrored = score(&bp, &ctx_everywhere, &settings(0.6)).dimensions.originality;
        let distinctive = score(&bp, &ctx_rare, &settings(0.6)).dimensions.originality;
        assert!(mirrored < distinctive, "{mirrored} vs {distinctive}");
    }

    #[test]
    fn partial_coverage_lowers_factual_accuracy() {
        let analyses = vec![analysis(1, &[("dosage", 1.0)], 0.0)];
        let full = ScoreContext {
            analyses: &analyses,
            coverage: Coverage {
                extracted: 1,
                attempted: 1,
            },
        };
        let partial = ScoreContext {
            analyses: &analyses,
            coverage: Coverage {
                extracted: 1,
                attempted: 5,
            },
        };
        let bp = blueprint(&["Dosage"]);
        let a = score(&bp, &full, &settings(0.6)).dimensions.factual_accuracy;
        let b = score(&bp, &partial, &settings(0.6)).dimensions.factual_accuracy;
        assert!(b < a, "{b} should be below {a}");
    }
}
