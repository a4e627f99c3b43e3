//! Deterministic blueprint synthesis.
//!
//! Combines SERP features with analyzed competitor pages into a versioned
//! outline. No randomness anywhere: identical inputs and configuration
//! produce byte-identical serialized output.

use std::collections::HashMap;

use serpsmith_core::SynthesisParams;
use serpsmith_serp::SerpResultSet;

use crate::types::{Blueprint, BlueprintSection, PageAnalysis};

/// Candidate outline topic with its accumulated weight.
struct Candidate {
    label: String,
    score: f64,
}

/// Builds one blueprint version.
///
/// Algorithm: (a) union competitor topics, each weighted by its page topic
/// weight times the page's inverse SERP rank; (b) take the top
/// `candidate_count` as section headings; (c) assign leftover candidates to
/// sections round-robin as sub-topics; (d) place each People-Also-Ask
/// question under the section with the highest weighted token overlap, ties
/// going to the first-seen section; (e) recommend the median competitor word
/// count scaled by the configured multiplier.
#[must_use]
pub fn synthesize(
    serp: &SerpResultSet,
    analyses: &[PageAnalysis],
    params: &SynthesisParams,
    candidate_count: usize,
    version: u32,
) -> Blueprint {
    let candidates = ranked_candidates(analyses);
    let split = candidate_count.min(candidates.len());

    let mut sections: Vec<BlueprintSection> = candidates[..split]
        .iter()
        .map(|c| BlueprintSection {
            heading: title_case(&c.label),
            sub_topics: Vec::new(),
            paa_questions: Vec::new(),
        })
        .collect();

    if !sections.is_empty() {
        for (idx, leftover) in candidates[split..].iter().enumerate() {
            sections[idx % split].sub_topics.push(leftover.label.clone());
        }
        place_paa_questions(serp, &candidates[..split], &mut sections);
    }

    let title_suggestion = match candidates.first() {
        Some(top) => format!("{}: {}", title_case(&serp.keyword), title_case(&top.label)),
        None => title_case(&serp.keyword),
    };

    Blueprint {
        keyword: serp.keyword.clone(),
        title_suggestion,
        sections,
        recommended_word_count: recommended_word_count(analyses, params.word_count_multiplier),
        version,
        source_urls: analyses.iter().map(|a| a.page.source_url.clone()).collect(),
    }
}

/// Accumulates topic weight × inverse rank per label, preserving first-seen
/// order so equal scores sort stably.
fn ranked_candidates(analyses: &[PageAnalysis]) -> Vec<Candidate> {
    let mut order: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for analysis in analyses {
        let inverse_rank = 1.0 / f64::from(analysis.rank.max(1));
        for topic in &analysis.profile.topics {
            let contribution = topic.weight * inverse_rank;
            match index.get(&topic.label) {
                Some(&at) => order[at].score += contribution,
                None => {
                    index.insert(topic.label.clone(), order.len());
                    order.push(Candidate {
                        label: topic.label.clone(),
                        score: contribution,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-seen order for equal scores.
    order.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    order
}

/// Greedy PAA placement: each question lands under the section with the
/// highest weighted token overlap; zero overlap everywhere falls back to the
/// first section.
fn place_paa_questions(
    serp: &SerpResultSet,
    selected: &[Candidate],
    sections: &mut [BlueprintSection],
) {
    for question in serp.paa_questions() {
        let question_tokens = tokens(question);
        let mut best_idx = 0;
        let mut best_overlap = 0.0_f64;
        for (idx, candidate) in selected.iter().enumerate() {
            let shared = tokens(&candidate.label)
                .iter()
                .filter(|t| question_tokens.contains(*t))
                .count();
            #[allow(clippy::cast_precision_loss)]
            let overlap = shared as f64 * candidate.score;
            if overlap > best_overlap {
                best_overlap = overlap;
                best_idx = idx;
            }
        }
        sections[best_idx].paa_questions.push(question.to_owned());
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Median competitor word count (even counts average the two middle values)
/// scaled by the multiplier and rounded to the nearest word.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn recommended_word_count(analyses: &[PageAnalysis], multiplier: f64) -> usize {
    let mut counts: Vec<usize> = analyses.iter().map(|a| a.page.word_count).collect();
    if counts.is_empty() {
        return 0;
    }
    counts.sort_unstable();
    let mid = counts.len() / 2;
    let median = if counts.len() % 2 == 0 {
        (counts[mid - 1] + counts[mid]) as f64 / 2.0
    } else {
        counts[mid] as f64
    };
    (median * multiplier).round() as usize
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use serpsmith_analyze::{SemanticProfile, Topic};
    use serpsmith_extract::ExtractedPage;
    use serpsmith_serp::{SerpEntry, SerpFeature};

    use super::*;

    fn params() -> SynthesisParams {
        SynthesisParams {
            target_heading_count: 3,
            word_count_multiplier: 1.1,
        }
    }

    fn analysis(url: &str, rank: u32, word_count: usize, topics: &[(&str, f64)]) -> PageAnalysis {
        PageAnalysis {
            page: ExtractedPage {
                source_url: url.to_owned(),
                headings: Vec::new(),
                paragraph_count: 6,
                word_count,
                extraction_timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
            },
            profile: SemanticProfile {
                source_url: url.to_owned(),
                entities: Vec::new(),
                topics: topics
                    .iter()
                    .map(|(label, weight)| Topic {
                        label: (*label).to_owned(),
                        weight: *weight,
                    })
                    .collect(),
                sentiment: 0.0,
                structural_score: 0.8,
            },
            rank,
        }
    }

    fn serp_set(paa: &[&str]) -> SerpResultSet {
        let mut features = Vec::new();
        if !paa.is_empty() {
            features.push(SerpFeature::PeopleAlsoAsk {
                questions: paa.iter().map(|q| (*q).to_owned()).collect(),
            });
        }
        SerpResultSet {
            keyword: "hemp beverages".to_owned(),
            results: vec![SerpEntry {
                url: "https://one.example.com".to_owned(),
                rank: 1,
                title: "t".to_owned(),
                snippet: "s".to_owned(),
            }],
            features,
        }
    }

    #[test]
    fn rank_one_topics_outweigh_equal_topics_on_lower_ranks() {
        let analyses = vec![
            analysis("https://one.example.com", 1, 1000, &[("dosage", 0.5)]),
            analysis("https://two.example.com", 2, 1000, &[("flavor", 0.5)]),
        ];
        let blueprint = synthesize(&serp_set(&[]), &analyses, &params(), 3, 1);
        assert_eq!(blueprint.sections[0].heading, "Dosage");
        assert_eq!(blueprint.sections[1].heading, "Flavor");
    }

    #[test]
    fn equal_scores_keep_first_seen_order() {
        let analyses = vec![analysis(
            "https://one.example.com",
            1,
            1000,
            &[("zeta topic", 0.25), ("alpha topic", 0.25)],
        )];
        let blueprint = synthesize(&serp_set(&[]), &analyses, &params(), 2, 1);
        assert_eq!(blueprint.sections[0].heading, "Zeta Topic");
        assert_eq!(blueprint.sections[1].heading, "Alpha Topic");
    }

    #[test]
    fn leftover_candidates_become_sub_topics() {
        let analyses = vec![analysis(
            "https://one.example.com",
            1,
            1000,
            &[
                ("dosage", 0.4),
                ("flavor", 0.3),
                ("regulation", 0.2),
                ("packaging", 0.1),
            ],
        )];
        let blueprint = synthesize(&serp_set(&[]), &analyses, &params(), 2, 1);
        assert_eq!(blueprint.sections.len(), 2);
        assert_eq!(blueprint.sections[0].sub_topics, vec!["regulation"]);
        assert_eq!(blueprint.sections[1].sub_topics, vec!["packaging"]);
    }

    #[test]
    fn paa_questions_land_under_best_matching_heading() {
        let analyses = vec![analysis(
            "https://one.example.com",
            1,
            1000,
            &[("dosage", 0.6), ("flavor", 0.4)],
        )];
        let serp = serp_set(&["what is the right dosage?", "which flavor is best?"]);
        let blueprint = synthesize(&serp, &analyses, &params(), 2, 1);
        assert_eq!(
            blueprint.sections[0].paa_questions,
            vec!["what is the right dosage?"]
        );
        assert_eq!(
            blueprint.sections[1].paa_questions,
            vec!["which flavor is best?"]
        );
    }

    #[test]
    fn unmatched_paa_question_falls_back_to_first_section() {
        let analyses = vec![analysis(
            "https://one.example.com",
            1,
            1000,
            &[("dosage", 0.6), ("flavor", 0.4)],
        )];
        let serp = serp_set(&["is it legal in texas?"]);
        let blueprint = synthesize(&serp, &analyses, &params(), 2, 1);
        assert_eq!(blueprint.sections[0].paa_questions, vec!["is it legal in texas?"]);
        assert!(blueprint.sections[1].paa_questions.is_empty());
    }

    #[test]
    fn even_word_counts_average_the_middle_pair() {
        let analyses = vec![
            analysis("https://a.example.com", 1, 800, &[("t", 1.0)]),
            analysis("https://b.example.com", 2, 1200, &[("t", 1.0)]),
            analysis("https://c.example.com", 3, 1000, &[("t", 1.0)]),
            analysis("https://d.example.com", 4, 1500, &[("t", 1.0)]),
        ];
        let blueprint = synthesize(&serp_set(&[]), &analyses, &params(), 3, 1);
        // median of [800, 1000, 1200, 1500] = 1100; × 1.1 = 1210
        assert_eq!(blueprint.recommended_word_count, 1210);
    }

    #[test]
    fn odd_word_counts_use_the_middle_value() {
        let analyses = vec![
            analysis("https://a.example.com", 1, 900, &[("t", 1.0)]),
            analysis("https://b.example.com", 2, 1000, &[("t", 1.0)]),
            analysis("https://c.example.com", 3, 2000, &[("t", 1.0)]),
        ];
        let blueprint = synthesize(&serp_set(&[]), &analyses, &params(), 3, 1);
        assert_eq!(blueprint.recommended_word_count, 1100);
    }

    #[test]
    fn identical_inputs_produce_byte_identical_output() {
        let analyses = vec![
            analysis(
                "https://one.example.com",
                1,
                1000,
                &[("dosage", 0.5), ("flavor", 0.3), ("regulation", 0.2)],
            ),
            analysis(
                "https://two.example.com",
                2,
                1400,
                &[("flavor", 0.6), ("packaging", 0.4)],
            ),
        ];
        let serp = serp_set(&["what is a safe dosage?"]);
        let first = serde_json::to_vec(&synthesize(&serp, &analyses, &params(), 3, 1))
            .expect("serialize");
        let second = serde_json::to_vec(&synthesize(&serp, &analyses, &params(), 3, 1))
            .expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn no_analyses_yields_empty_outline() {
        let blueprint = synthesize(&serp_set(&[]), &[], &params(), 3, 1);
        assert!(blueprint.sections.is_empty());
        assert_eq!(blueprint.recommended_word_count, 0);
        assert_eq!(blueprint.title_suggestion, "Hemp Beverages");
    }
}
