//! End-to-end decision tests with mock and trained classifiers

use commentguard_classifiers::{
    Classifier, EnsembleParams, FeatureBuilder, FeatureVector, LexiconScorer, LexiconTier,
    Normalizer, ToxicityModel, VocabularyParams,
};
use commentguard_core::{ConfidenceTier, Error, Label, Result, Stage};
use commentguard_policy::{Evidence, HybridDecisionEngine, OverridePolicy};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Classifier that always answers with a fixed label
struct MockClassifier {
    label: Label,
    fail: bool,
    call_count: AtomicU32,
}

impl MockClassifier {
    fn new(label: Label) -> Self {
        Self {
            label,
            fail: false,
            call_count: AtomicU32::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Label::Acceptable)
        }
    }

    fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(Error::Dimension {
                expected: 3,
                found: features.first().map_or(0, |f| f.dimension()),
            });
        }
        Ok(vec![self.label; features.len()])
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn normalizer() -> Arc<Normalizer> {
    Arc::new(Normalizer::with_builtin_slang().unwrap())
}

fn fitted_features(scorer: Arc<LexiconScorer>) -> FeatureBuilder {
    let corpus = normalizer().normalize_all(&[
        "giày đẹp giao nhanh",
        "shop lừa đảo",
        "giao hàng chậm",
    ]);
    let mut features = FeatureBuilder::new(
        scorer,
        VocabularyParams {
            min_df: 1,
            max_df: 1.0,
            ..VocabularyParams::default()
        },
    );
    features.fit_vocabulary(&corpus).unwrap();
    features
}

fn engine_with(classifier: Arc<dyn Classifier>) -> HybridDecisionEngine {
    let scorer = Arc::new(LexiconScorer::builtin().unwrap());
    let features = fitted_features(scorer.clone());
    HybridDecisionEngine::new(normalizer(), scorer, OverridePolicy::standard())
        .with_model(features, classifier)
        .unwrap()
}

#[test]
fn abusive_scenario_blocks_regardless_of_model() {
    for model_label in [Label::Acceptable, Label::Toxic] {
        let engine = engine_with(Arc::new(MockClassifier::new(model_label)));
        let decision = engine.decide("đm shop lừa đảo").unwrap();
        assert_eq!(decision.label, Label::Toxic);
        assert_eq!(decision.tier, ConfidenceTier::High);
        assert!(decision.rule_score >= 10);
        assert_eq!(decision.model_label, model_label);
    }
}

#[test]
fn mild_complaint_is_accepted_even_if_model_flags_it() {
    let engine = engine_with(Arc::new(MockClassifier::new(Label::Toxic)));
    let decision = engine.decide("giao hàng chậm, hơi buồn").unwrap();
    assert_eq!(decision.label, Label::Acceptable);
    assert_eq!(decision.rule_score, 0);
    assert_eq!(decision.tier, ConfidenceTier::Low);
    assert!(decision.overridden());
    assert_eq!(decision.fired_rules, vec!["model-label", "benign-feedback"]);
}

#[test]
fn praise_is_accepted_even_if_model_flags_it() {
    let engine = engine_with(Arc::new(MockClassifier::new(Label::Toxic)));
    let decision = engine
        .decide("cảm ơn shop, sản phẩm rất tốt, giao nhanh")
        .unwrap();
    assert_eq!(decision.label, Label::Acceptable);
    assert!(decision.rule_score <= -2);
}

#[test]
fn medium_evidence_needs_model_agreement() {
    // "mày" + "đểu" + "dỏm": three medium hits, score 6
    let text = "mày đểu, hàng dỏm";
    let flagged = engine_with(Arc::new(MockClassifier::new(Label::Toxic)))
        .decide(text)
        .unwrap();
    assert_eq!(flagged.tier, ConfidenceTier::Medium);
    assert_eq!(flagged.label, Label::Toxic);

    // score 2, low tier: model decides
    let text = "hàng hơi dỏm";
    let passed = engine_with(Arc::new(MockClassifier::new(Label::Acceptable)))
        .decide(text)
        .unwrap();
    assert_eq!(passed.rule_score, 2);
    assert_eq!(passed.label, Label::Acceptable);
    let flagged = engine_with(Arc::new(MockClassifier::new(Label::Toxic)))
        .decide(text)
        .unwrap();
    assert_eq!(flagged.label, Label::Toxic);
}

#[test]
fn empty_input_does_not_crash() {
    let engine = engine_with(Arc::new(MockClassifier::new(Label::Toxic)));
    let decision = engine.decide("").unwrap();
    assert_eq!(decision.normalized, "empty");
    assert_eq!(decision.label, Label::Acceptable);
}

#[test]
fn prediction_failure_reports_stage_and_text() {
    let mock = Arc::new(MockClassifier::failing());
    let engine = engine_with(mock.clone());

    let err = engine.decide("giày đẹp").unwrap_err();
    match &err {
        Error::Stage { stage, text, source } => {
            assert_eq!(*stage, Stage::Predict);
            assert_eq!(text, "giày đẹp");
            assert!(matches!(**source, Error::Dimension { .. }));
        }
        other => panic!("expected a stage error, got {other:?}"),
    }
    assert!(!err.is_model_not_loaded());
    assert_eq!(mock.call_count(), 1);

    // the engine keeps serving after a failed request
    let results = engine.decide_all(&["a", "b"]);
    assert!(results.iter().all(|r| r.is_err()));
    assert_eq!(mock.call_count(), 3);
}

#[test]
fn model_not_loaded_is_distinct() {
    let engine = HybridDecisionEngine::new(
        normalizer(),
        Arc::new(LexiconScorer::builtin().unwrap()),
        OverridePolicy::standard(),
    );
    assert!(matches!(engine.decide("đm"), Err(Error::ModelNotLoaded)));
}

fn trained_engine() -> HybridDecisionEngine {
    let texts = [
        "đm shop lừa đảo",
        "hàng dỏm, shop đểu",
        "mày ngu à, giày fake",
        "cút đi đồ lừa đảo",
        "giày đẹp, giao nhanh",
        "cảm ơn shop, giày đẹp",
        "giao hàng chậm, hơi buồn",
        "giày êm, shop nhiệt tình",
    ];
    let labels = [1, 1, 1, 1, 0, 0, 0, 0].map(|v| Label::from_u8(v).unwrap());

    let normalizer = normalizer();
    let (model, _) = ToxicityModel::train(
        &normalizer,
        Arc::new(LexiconScorer::builtin().unwrap()),
        VocabularyParams {
            min_df: 1,
            ..VocabularyParams::default()
        },
        EnsembleParams::default(),
        &texts,
        &labels,
    )
    .unwrap();
    HybridDecisionEngine::from_model(normalizer, model, OverridePolicy::standard()).unwrap()
}

#[test]
fn trained_model_decisions_are_deterministic() {
    let engine = trained_engine();
    for text in ["shop lừa đảo!!!", "giày đẹp", "bình thường", ""] {
        assert_eq!(engine.decide(text).unwrap(), engine.decide(text).unwrap());
    }
    assert_eq!(engine.decide("đm shop lừa đảo").unwrap().label, Label::Toxic);
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HybridDecisionEngine>();
    assert_send_sync::<Arc<HybridDecisionEngine>>();
}

#[test]
fn concurrent_decisions_match_sequential_ones() {
    let engine = trained_engine();
    let texts = [
        "đm shop lừa đảo",
        "giao hàng chậm, hơi buồn",
        "cảm ơn shop, sản phẩm rất tốt, giao nhanh",
        "mày đểu, hàng dỏm",
        "mn oi sp ni dc ko",
        "",
    ];
    let expected: Vec<_> = texts.iter().map(|t| engine.decide(t).unwrap()).collect();

    let results: Vec<Vec<_>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let engine = &engine;
                scope.spawn(move || {
                    // each worker walks the batch from a different offset
                    (0..texts.len() * 4)
                        .map(|i| {
                            let index = (i + worker) % texts.len();
                            (index, engine.decide(texts[index]).unwrap())
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for worker in results {
        for (index, decision) in worker {
            assert_eq!(decision, expected[index]);
        }
    }
}

/// The override list written out as plain branches
fn reference_decision(evidence: &Evidence) -> Label {
    let mut label = evidence.model_label;
    if evidence.rule_score <= 0 && evidence.tier == ConfidenceTier::Low {
        label = Label::Acceptable;
    }
    if evidence.tier == ConfidenceTier::High {
        label = Label::Toxic;
    } else if evidence.rule_score >= 4 && evidence.model_label == Label::Toxic {
        label = Label::Toxic;
    }
    if evidence.rule_score >= 6 {
        label = Label::Toxic;
    }
    if evidence.rule_score <= -2 {
        label = Label::Acceptable;
    }
    label
}

fn any_tier() -> impl Strategy<Value = ConfidenceTier> {
    prop_oneof![
        Just(ConfidenceTier::Low),
        Just(ConfidenceTier::Medium),
        Just(ConfidenceTier::High),
    ]
}

fn any_label() -> impl Strategy<Value = Label> {
    prop_oneof![Just(Label::Acceptable), Just(Label::Toxic)]
}

/// Sentences mixing lexicon entries from every tier with neutral words
fn lexicon_sentence() -> impl Strategy<Value = String> {
    let words: Vec<&'static str> = [LexiconTier::Strong, LexiconTier::Medium, LexiconTier::Positive]
        .into_iter()
        .flat_map(|tier| tier.builtin_entries().iter().copied())
        .chain(["giày", "size", "hàng", "giao"])
        .collect();
    prop::collection::vec(prop::sample::select(words), 0..8).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn standard_policy_matches_reference(
        rule_score in -20i32..20,
        tier in any_tier(),
        model_label in any_label(),
    ) {
        let evidence = Evidence { rule_score, tier, model_label };
        let verdict = OverridePolicy::standard().evaluate(&evidence);
        prop_assert_eq!(verdict.label, reference_decision(&evidence));
    }

    #[test]
    fn floor_and_ceiling_ignore_the_model(
        sentence in lexicon_sentence(),
        model_label in any_label(),
    ) {
        let engine = engine_with(Arc::new(MockClassifier::new(model_label)));
        let decision = engine.decide(&sentence).unwrap();
        if decision.rule_score >= 6 {
            prop_assert_eq!(decision.label, Label::Toxic);
        }
        if decision.rule_score <= -2 {
            prop_assert_eq!(decision.label, Label::Acceptable);
        }
        prop_assert_eq!(decision.rule_score, engine.inspect(&sentence).rules.score);
    }

    #[test]
    fn decide_is_deterministic(raw in "\\PC{0,60}", model_label in any_label()) {
        let engine = engine_with(Arc::new(MockClassifier::new(model_label)));
        prop_assert_eq!(engine.decide(&raw).unwrap(), engine.decide(&raw).unwrap());
    }
}
