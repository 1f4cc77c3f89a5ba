use super::common::*;

use crate::workflows::triage::{
    classify, derive_priority, explain, Answer, AnswerSet, Priority, Question, TriageRule,
};

fn expected(breathing: bool, conscious: bool, walking: bool, bleeding: bool) -> Priority {
    if !breathing || !conscious || (bleeding && !walking) {
        Priority::Critical
    } else if bleeding || !walking {
        Priority::Urgent
    } else {
        Priority::Stable
    }
}

#[test]
fn every_answer_combination_matches_the_precedence_table() {
    for mask in 0u8..16 {
        let (breathing, conscious, walking, bleeding) =
            (mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, mask & 8 != 0);
        let triage = answers(breathing, conscious, walking, bleeding);

        let priority = classify(&triage);
        assert_eq!(
            priority,
            expected(breathing, conscious, walking, bleeding),
            "answers {triage:?}"
        );

        let matched = explain(&triage);
        assert_eq!(matched.priority, priority);
        assert_eq!(matched.rule.priority(), priority);
        assert_eq!(matched.rationale, matched.rule.rationale());
    }
}

#[test]
fn reference_scenarios() {
    assert_eq!(classify(&answers(false, true, true, false)), Priority::Critical);
    assert_eq!(classify(&answers(true, true, false, true)), Priority::Critical);
    assert_eq!(classify(&answers(true, true, true, true)), Priority::Urgent);
    assert_eq!(classify(&answers(true, true, true, false)), Priority::Stable);
}

#[test]
fn explain_reports_the_first_matching_rule() {
    assert_eq!(
        explain(&answers(false, false, false, true)).rule,
        TriageRule::NotBreathing
    );
    assert_eq!(
        explain(&answers(true, false, true, false)).rule,
        TriageRule::Unconscious
    );
    assert_eq!(
        explain(&answers(true, true, false, true)).rule,
        TriageRule::BleedingAndImmobile
    );
    assert_eq!(
        explain(&answers(true, true, true, true)).rule,
        TriageRule::Bleeding
    );
    assert_eq!(
        explain(&answers(true, true, false, false)).rule,
        TriageRule::Immobile
    );
    assert_eq!(
        explain(&answers(true, true, true, false)).rule,
        TriageRule::NoRedFlags
    );
}

#[test]
fn partial_answers_never_produce_a_priority() {
    let partial = AnswerSet {
        breathing: Answer::No,
        conscious: Answer::Unknown,
        walking: Answer::Yes,
        bleeding: Answer::Unknown,
    };

    let incomplete = derive_priority(&partial).expect_err("partial answers are incomplete");
    assert_eq!(
        incomplete.missing,
        vec![Question::Conscious, Question::Bleeding]
    );
    assert_eq!(
        incomplete.to_string(),
        "assessment incomplete: unanswered conscious, bleeding"
    );

    let empty = derive_priority(&AnswerSet::default()).expect_err("nothing answered");
    assert_eq!(empty.missing, Question::ORDER.to_vec());
}

#[test]
fn derive_priority_agrees_with_classify_once_complete() {
    let triage = answers(true, true, false, false);
    assert_eq!(
        derive_priority(&AnswerSet::from(triage)),
        Ok(classify(&triage))
    );
}
