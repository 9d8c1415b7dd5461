use std::collections::VecDeque;

use crate::models::QuizState;

/// Most questions retained in a session's history.
pub const MAX_HISTORY: usize = 100;

/// Bounded log of questions with a cursor at the one on screen.
///
/// The log is never empty. Appending after stepping back discards the entries
/// past the cursor, and the oldest entry is dropped once the bound is reached.
#[derive(Debug, Clone)]
pub struct QuestionHistory {
    entries: VecDeque<QuizState>,
    cursor: usize,
    limit: usize,
}

impl QuestionHistory {
    /// Start a history holding only `initial`.
    pub fn new(initial: QuizState) -> Self {
        Self::with_limit(initial, MAX_HISTORY)
    }

    /// Start a history with a custom bound, clamped to `1..=MAX_HISTORY`.
    pub fn with_limit(initial: QuizState, limit: usize) -> Self {
        let mut history = Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.clamp(1, MAX_HISTORY),
        };
        history.reset(initial);
        history
    }

    /// Discard everything and start over from `initial`.
    pub fn reset(&mut self, initial: QuizState) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    /// Record a new question after the cursor and move onto it.
    pub fn append(&mut self, state: QuizState) -> &QuizState {
        if self.cursor + 1 < self.entries.len() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(state);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        self.current()
    }

    /// Step to the previous question; stays put at the oldest entry.
    pub fn go_back(&mut self) -> &QuizState {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step to the next recorded question; stays put at the newest entry.
    pub fn go_forward(&mut self) -> &QuizState {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Question under the cursor.
    pub fn current(&self) -> &QuizState {
        &self.entries[self.cursor]
    }

    /// Rewrite the hint flags of the current question in place.
    pub fn update_current_hint_flags(&mut self, origin_expanded: bool, destination_expanded: bool) {
        self.entries[self.cursor].set_hint_flags(origin_expanded, destination_expanded);
    }

    /// Index of the question on screen.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of recorded questions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound on retained questions.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Recorded questions, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &QuizState> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::models::Station;

    fn state(n: usize) -> QuizState {
        QuizState::new(
            Station::new(format!("origin-{n}"), "ward", ["line"]),
            Station::new(format!("destination-{n}"), "ward", ["line"]),
        )
        .unwrap()
    }

    fn origins(history: &QuestionHistory) -> Vec<String> {
        history
            .entries()
            .map(|entry| entry.origin().name.clone())
            .collect()
    }

    #[test]
    fn starts_with_single_entry() {
        let history = QuestionHistory::new(state(0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current(), &state(0));
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
        assert_eq!(history.limit(), MAX_HISTORY);
    }

    #[test]
    fn append_moves_cursor_to_new_entry() {
        let mut history = QuestionHistory::new(state(0));
        let current = history.append(state(1)).clone();
        assert_eq!(current, state(1));
        assert_eq!(history.cursor(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn go_back_at_start_is_a_no_op() {
        let mut history = QuestionHistory::new(state(0));
        history.append(state(1));
        history.go_back();
        let before = (origins(&history), history.cursor());

        let current = history.go_back().clone();
        assert_eq!(current, state(0));
        assert_eq!((origins(&history), history.cursor()), before);
    }

    #[test]
    fn append_after_going_back_discards_forward_entries() {
        let mut history = QuestionHistory::new(state(0));
        history.append(state(1));
        history.append(state(2));
        history.go_back();
        assert_eq!(history.cursor(), 1);

        history.append(state(3));
        assert_eq!(origins(&history), ["origin-0", "origin-1", "origin-3"]);
        assert_eq!(history.cursor(), 2);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn go_forward_replays_until_newest() {
        let mut history = QuestionHistory::new(state(0));
        history.append(state(1));
        history.append(state(2));
        history.go_back();
        history.go_back();
        assert_eq!(history.go_forward(), &state(1));
        assert_eq!(history.go_forward(), &state(2));
        assert_eq!(history.go_forward(), &state(2));
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn full_history_drops_oldest_entry() {
        let mut history = QuestionHistory::new(state(0));
        for n in 1..MAX_HISTORY {
            history.append(state(n));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.cursor(), MAX_HISTORY - 1);
        let previous = origins(&history);

        history.append(state(1000));
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.cursor(), MAX_HISTORY - 1);
        let current = origins(&history);
        assert_eq!(current[0], previous[1]);
        assert_eq!(current[MAX_HISTORY - 1], "origin-1000");
        assert_eq!(history.current(), &state(1000));
    }

    #[test]
    fn custom_limit_is_clamped() {
        let mut history = QuestionHistory::with_limit(state(0), 0);
        assert_eq!(history.limit(), 1);
        history.append(state(1));
        assert_eq!(origins(&history), ["origin-1"]);

        let history = QuestionHistory::with_limit(state(0), 10_000);
        assert_eq!(history.limit(), MAX_HISTORY);
    }

    #[test]
    fn hint_flags_update_in_place() {
        let mut history = QuestionHistory::new(state(0));
        history.append(state(1));
        history.update_current_hint_flags(true, false);
        assert_eq!(history.len(), 2);
        assert!(history.current().origin_hint_expanded());
        assert!(!history.current().destination_hint_expanded());

        history.go_back();
        assert_eq!(history.current(), &state(0));
        assert!(!history.current().origin_hint_expanded());
        history.go_forward();
        assert!(history.current().origin_hint_expanded());
    }

    #[test]
    fn reset_replaces_everything() {
        let mut history = QuestionHistory::new(state(0));
        history.append(state(1));
        history.append(state(2));
        history.reset(state(9));
        assert_eq!(origins(&history), ["origin-9"]);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn invariants_hold_across_random_operations() {
        for seed in 0..20u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut history = QuestionHistory::new(state(0));
            let mut next = 1usize;
            for _ in 0..1_000 {
                match rng.gen_range(0..10) {
                    0..=4 => {
                        let appended = state(next);
                        next += 1;
                        assert_eq!(history.append(appended.clone()), &appended);
                    }
                    5 | 6 => {
                        let before = history.cursor();
                        history.go_back();
                        assert_eq!(history.cursor(), before.saturating_sub(1));
                    }
                    7 => {
                        history.go_forward();
                    }
                    8 => {
                        let flags = (rng.gen_bool(0.5), rng.gen_bool(0.5));
                        let len = history.len();
                        let cursor = history.cursor();
                        history.update_current_hint_flags(flags.0, flags.1);
                        assert_eq!((history.len(), history.cursor()), (len, cursor));
                    }
                    _ => {
                        if rng.gen_bool(0.05) {
                            history.reset(state(next));
                            next += 1;
                        }
                    }
                }
                assert!(!history.is_empty());
                assert!(history.cursor() < history.len());
                assert!(history.len() <= MAX_HISTORY);
            }
        }
    }
}
