// src/core/grouping.rs - Group raw answers by question and decide what needs judging

use std::collections::{HashMap, HashSet};

use super::types::{AnswerItem, AnswerRow, IdentityKey, QuestionGroup, ScoredRef};

/// Identity keys that already have a stored score.
#[derive(Debug, Clone, Default)]
pub struct ScoredIndex {
    keys: HashSet<IdentityKey>,
}

impl ScoredIndex {
    pub fn from_rows(rows: &[ScoredRef]) -> Self {
        Self {
            keys: rows.iter().map(IdentityKey::from).collect(),
        }
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Partition raw rows by `question_id`.
///
/// Groups come out in first-seen order and so do the models inside a group.
/// The first row's question text wins. A repeated `(question_id, model)`
/// replaces the earlier answer text but keeps the earlier position.
pub fn group_by_question(rows: &[AnswerRow]) -> Vec<QuestionGroup> {
    let mut groups: Vec<QuestionGroup> = Vec::new();
    let mut by_id: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let idx = *by_id.entry(row.question_id.as_str()).or_insert_with(|| {
            groups.push(QuestionGroup {
                question_id: row.question_id.clone(),
                question: row.question.clone(),
                items: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[idx];

        match group.items.iter_mut().find(|it| it.model == row.model) {
            Some(existing) => {
                tracing::warn!(
                    question_id = %row.question_id,
                    model = %row.model,
                    "Duplicate answer row; keeping the later one"
                );
                existing.answer_text = row.answer_text.clone();
            }
            None => group.items.push(AnswerItem {
                model: row.model.clone(),
                answer_text: row.answer_text.clone(),
            }),
        }
    }

    groups
}

/// Keep the groups with at least one unscored model, or all of them when forced.
///
/// A single new answer pulls the whole group back in: answers are judged
/// relative to each other, so the judge always sees the full set.
pub fn pending_groups(
    groups: Vec<QuestionGroup>,
    scored: &ScoredIndex,
    force: bool,
) -> Vec<QuestionGroup> {
    if force {
        return groups;
    }
    groups
        .into_iter()
        .filter(|g| g.items.iter().any(|it| !scored.contains(&g.key_for(it))))
        .collect()
}

/// Models in `group` that have no stored score yet.
pub fn unscored_models<'a>(group: &'a QuestionGroup, scored: &ScoredIndex) -> Vec<&'a str> {
    group
        .items
        .iter()
        .filter(|it| !scored.contains(&group.key_for(it)))
        .map(|it| it.model.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(qid: &str, question: &str, model: &str, text: &str) -> AnswerRow {
        AnswerRow {
            question_id: qid.into(),
            question: question.into(),
            model: model.into(),
            answer_text: text.into(),
            created_at: None,
        }
    }

    fn scored(pairs: &[(&str, &str)]) -> ScoredIndex {
        let rows: Vec<ScoredRef> = pairs
            .iter()
            .map(|(q, m)| ScoredRef {
                question_id: q.to_string(),
                model: m.to_string(),
            })
            .collect();
        ScoredIndex::from_rows(&rows)
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let rows = vec![
            row("q2", "Second?", "b", "b2"),
            row("q1", "First?", "a", "a1"),
            row("q2", "ignored text", "a", "a2"),
            row("q1", "First?", "c", "c1"),
        ];
        let groups = group_by_question(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].question_id, "q2");
        assert_eq!(groups[0].question, "Second?");
        let models: Vec<&str> = groups[0].items.iter().map(|i| i.model.as_str()).collect();
        assert_eq!(models, vec!["b", "a"]);
        assert_eq!(groups[1].question_id, "q1");
    }

    #[test]
    fn test_duplicate_model_keeps_last_text_first_position() {
        let rows = vec![
            row("q1", "Q", "a", "old"),
            row("q1", "Q", "b", "b"),
            row("q1", "Q", "a", "new"),
        ];
        let groups = group_by_question(&rows);
        assert_eq!(
            groups[0].items,
            vec![
                AnswerItem {
                    model: "a".into(),
                    answer_text: "new".into()
                },
                AnswerItem {
                    model: "b".into(),
                    answer_text: "b".into()
                },
            ]
        );
    }

    #[test]
    fn test_fully_scored_group_not_pending() {
        let groups = group_by_question(&[row("q1", "Q", "a", "x"), row("q1", "Q", "b", "y")]);
        let index = scored(&[("q1", "a"), ("q1", "b")]);
        assert!(pending_groups(groups, &index, false).is_empty());
    }

    #[test]
    fn test_one_new_model_pulls_whole_group() {
        let groups = group_by_question(&[
            row("q1", "Q", "a", "x"),
            row("q1", "Q", "b", "y"),
            row("q1", "Q", "c", "z"),
        ]);
        let index = scored(&[("q1", "a"), ("q1", "b")]);
        let pending = pending_groups(groups, &index, false);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].items.len(), 3);
        assert_eq!(unscored_models(&pending[0], &index), vec!["c"]);
    }

    #[test]
    fn test_force_includes_everything() {
        let groups = group_by_question(&[row("q1", "Q", "a", "x"), row("q2", "Q2", "a", "y")]);
        let index = scored(&[("q1", "a"), ("q2", "a")]);
        assert_eq!(pending_groups(groups, &index, true).len(), 2);
    }

    #[test]
    fn test_scores_for_other_question_do_not_count() {
        let groups = group_by_question(&[row("q1", "Q", "a", "x")]);
        let index = scored(&[("q2", "a")]);
        assert_eq!(pending_groups(groups, &index, false).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_question(&[]).is_empty());
        assert!(ScoredIndex::default().is_empty());
    }
}
