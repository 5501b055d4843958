//! Stage 3 — sequence generators (§4.4).
//!
//! Each generator expands the ordered sequences stage 2 produced into a
//! (possibly larger) set of candidate orderings. The combined output across
//! every enabled generator is capped to `beam_width`, ranked by the
//! "rough pre-score" the ordering/tie-break rule defines: sum of action
//! priorities, descending, lexicographic-by-ISIN to break ties.

use crate::registry::{ModuleConfig, ModuleSettings};
use glidepath_core::plan::ActionCandidate;
use glidepath_core::trade::Side;
use itertools::Itertools;
use rust_decimal::Decimal;

pub const COMBINATORIAL: &str = "combinatorial";
pub const ENHANCED_COMBINATORIAL: &str = "enhanced_combinatorial";
pub const PARTIAL_EXECUTION: &str = "partial_execution";
pub const CONSTRAINT_RELAXATION: &str = "constraint_relaxation";

pub const KNOWN_GENERATORS: &[&str] = &[
    COMBINATORIAL,
    ENHANCED_COMBINATORIAL,
    PARTIAL_EXECUTION,
    CONSTRAINT_RELAXATION,
];

const DEFAULT_BEAM_WIDTH: usize = 50;
/// Permuting beyond this length is `n!`-expensive; generators fall back to
/// the original ordering unchanged above this bound.
const MAX_PERMUTE_LEN: usize = 6;

fn rough_pre_score(sequence: &[ActionCandidate]) -> f64 {
    sequence.iter().map(|a| a.priority).sum()
}

fn sort_and_cap(mut sequences: Vec<Vec<ActionCandidate>>, beam_width: usize) -> Vec<Vec<ActionCandidate>> {
    sequences.sort_by(|a, b| {
        rough_pre_score(b)
            .partial_cmp(&rough_pre_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let a_isin = a.first().map(|c| c.isin.clone());
                let b_isin = b.first().map(|c| c.isin.clone());
                a_isin.cmp(&b_isin)
            })
    });
    sequences.truncate(beam_width);
    sequences
}

/// `combinatorial`: enumerate every ordering of a sequence up to `max_depth`
/// actions; longer sequences pass through unchanged (enumerating them would
/// be factorial-expensive for no benefit at stage 3's cap).
fn combinatorial(sequences: &[Vec<ActionCandidate>], settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let max_depth = settings.param_usize("max_depth", 4);
    let mut out = Vec::new();
    for sequence in sequences {
        if sequence.len() <= 1 || sequence.len() > max_depth.min(MAX_PERMUTE_LEN) {
            out.push(sequence.clone());
            continue;
        }
        for permutation in sequence.iter().cloned().permutations(sequence.len()) {
            out.push(permutation);
        }
    }
    out
}

/// `enhanced_combinatorial`: like `combinatorial`, but prunes to the
/// `per_input_keep` (default 3) highest rough-pre-score orderings per input
/// sequence instead of keeping every permutation.
fn enhanced_combinatorial(
    sequences: &[Vec<ActionCandidate>],
    settings: &ModuleSettings,
) -> Vec<Vec<ActionCandidate>> {
    let max_depth = settings.param_usize("max_depth", 4);
    let keep = settings.param_usize("per_input_keep", 3);
    let mut out = Vec::new();
    for sequence in sequences {
        if sequence.len() <= 1 || sequence.len() > max_depth.min(MAX_PERMUTE_LEN) {
            out.push(sequence.clone());
            continue;
        }
        let mut candidates: Vec<Vec<ActionCandidate>> =
            sequence.iter().cloned().permutations(sequence.len()).collect();
        candidates.sort_by(|a, b| {
            rough_pre_score(b)
                .partial_cmp(&rough_pre_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(keep);
        out.extend(candidates);
    }
    out
}

/// `partial_execution`: walks each sequence against an estimated cash
/// budget (`starting_cash_eur`, default `0`) and truncates it at the point
/// a BUY would exhaust the budget — a rough pre-evaluator screen, not a
/// substitute for C5's full per-currency simulation.
fn partial_execution(sequences: &[Vec<ActionCandidate>], settings: &ModuleSettings) -> Vec<Vec<ActionCandidate>> {
    let starting_cash_eur =
        Decimal::try_from(settings.param_f64("starting_cash_eur", 0.0)).unwrap_or(Decimal::ZERO);
    sequences
        .iter()
        .map(|sequence| {
            let mut cash = starting_cash_eur;
            let mut truncated = Vec::new();
            for action in sequence {
                match action.side {
                    Side::Sell => {
                        cash += action.value_eur;
                        truncated.push(action.clone());
                    }
                    Side::Buy => {
                        if action.value_eur > cash {
                            break;
                        }
                        cash -= action.value_eur;
                        truncated.push(action.clone());
                    }
                }
            }
            truncated
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// `constraint_relaxation`: alongside the sequence as given, offers a
/// shorter variant with the lowest-priority action dropped — a stand-in for
/// "retry with softened bounds" at a stage that has no optimizer context of
/// its own to re-solve against.
fn constraint_relaxation(
    sequences: &[Vec<ActionCandidate>],
    _settings: &ModuleSettings,
) -> Vec<Vec<ActionCandidate>> {
    let mut out = Vec::new();
    for sequence in sequences {
        out.push(sequence.clone());
        if sequence.len() > 1 {
            if let Some((idx, _)) = sequence
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.priority.partial_cmp(&b.priority).unwrap_or(std::cmp::Ordering::Equal))
            {
                let mut relaxed = sequence.clone();
                relaxed.remove(idx);
                out.push(relaxed);
            }
        }
    }
    out
}

/// Runs every enabled, known sequence generator over `sequences` (stage 2's
/// output) and returns the combined, beam-capped result for stage 4.
pub fn run_enabled(
    sequences: Vec<Vec<ActionCandidate>>,
    config: &ModuleConfig,
    beam_width: Option<usize>,
) -> Vec<Vec<ActionCandidate>> {
    let mut expanded = Vec::new();
    let mut any_enabled = false;
    for name in config.enabled_names(KNOWN_GENERATORS) {
        any_enabled = true;
        let settings = config.settings(name);
        let produced = match name {
            COMBINATORIAL => combinatorial(&sequences, &settings),
            ENHANCED_COMBINATORIAL => enhanced_combinatorial(&sequences, &settings),
            PARTIAL_EXECUTION => partial_execution(&sequences, &settings),
            CONSTRAINT_RELAXATION => constraint_relaxation(&sequences, &settings),
            _ => unreachable!("validated against KNOWN_GENERATORS at config load"),
        };
        expanded.extend(produced);
    }
    if !any_enabled {
        expanded = sequences;
    }
    sort_and_cap(expanded, beam_width.unwrap_or(DEFAULT_BEAM_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::security::Isin;
    use glidepath_core::Currency;
    use rust_decimal_macros::dec;

    fn action(side: Side, isin: &str, priority: f64, value_eur: Decimal) -> ActionCandidate {
        ActionCandidate {
            side,
            isin: Isin::from(isin),
            quantity: dec!(1),
            price: value_eur,
            value_eur,
            currency: Currency::eur(),
            priority,
            reason: "test".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn combinatorial_enumerates_all_orderings_of_short_sequences() {
        let sequences = vec![vec![
            action(Side::Sell, "A", 0.5, dec!(100)),
            action(Side::Buy, "B", 0.5, dec!(100)),
        ]];
        let settings = ModuleSettings::enabled(serde_json::json!({"max_depth": 4}));
        let result = combinatorial(&sequences, &settings);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn partial_execution_truncates_when_cash_runs_out() {
        let sequences = vec![vec![
            action(Side::Buy, "A", 0.9, dec!(600)),
            action(Side::Buy, "B", 0.5, dec!(600)),
        ]];
        let settings = ModuleSettings::enabled(serde_json::json!({"starting_cash_eur": 1000.0}));
        let result = partial_execution(&sequences, &settings);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 1);
    }

    #[test]
    fn constraint_relaxation_offers_a_shorter_variant() {
        let sequences = vec![vec![
            action(Side::Sell, "A", 0.9, dec!(100)),
            action(Side::Buy, "B", 0.1, dec!(100)),
        ]];
        let settings = ModuleSettings::enabled(serde_json::Value::Null);
        let result = constraint_relaxation(&sequences, &settings);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].len(), 1);
    }

    #[test]
    fn run_enabled_caps_output_to_beam_width() {
        let sequences = vec![
            vec![action(Side::Buy, "A", 0.9, dec!(100))],
            vec![action(Side::Buy, "B", 0.8, dec!(100))],
            vec![action(Side::Buy, "C", 0.7, dec!(100))],
        ];
        let mut map = std::collections::BTreeMap::new();
        map.insert(
            CONSTRAINT_RELAXATION.to_string(),
            ModuleSettings::enabled(serde_json::Value::Null),
        );
        let config = ModuleConfig(map);
        let result = run_enabled(sequences, &config, Some(2));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn unknown_generator_name_is_rejected_at_config_validation() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("bogus".to_string(), ModuleSettings::enabled(serde_json::Value::Null));
        let config = ModuleConfig(map);
        assert!(config.validate_known(KNOWN_GENERATORS).is_err());
    }
}
