//! Lesson widgets and their XP rewards
//!
//! Widgets keep their own interaction state and report engagement to the
//! tracker. Reward amounts come from [`Rewards`], which is part of the
//! config file.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::curriculum::LevelId;
use crate::error::ProgressError;
use crate::navigation;
use crate::tracker::ProgressTracker;

/// XP per engagement kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// All cards of a tap-reveal deck opened
    pub tap_reveal_complete: i64,
    /// One card swiped
    pub swipe: i64,
    /// Comparison slider moved
    pub slider: i64,
    /// Simulation parameters changed
    pub simulation: i64,
    /// Quiz finished
    pub quiz_complete: i64,
    /// Level completed through the API
    pub level_complete: i64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            tap_reveal_complete: 5,
            swipe: 1,
            slider: 0,
            simulation: 0,
            quiz_complete: 10,
            level_complete: 50,
        }
    }
}

/// Engagement event reported by a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    TapRevealComplete,
    Swipe,
    SliderMoved,
    SimulationRun,
    QuizComplete,
}

impl Rewards {
    pub fn xp_for(&self, engagement: Engagement) -> i64 {
        match engagement {
            Engagement::TapRevealComplete => self.tap_reveal_complete,
            Engagement::Swipe => self.swipe,
            Engagement::SliderMoved => self.slider,
            Engagement::SimulationRun => self.simulation,
            Engagement::QuizComplete => self.quiz_complete,
        }
    }
}

/// Award the XP an engagement is worth. Returns the amount awarded.
pub fn record_engagement(
    tracker: &mut ProgressTracker,
    rewards: &Rewards,
    engagement: Engagement,
) -> i64 {
    let xp = rewards.xp_for(engagement);
    if tracker.award_xp(xp) {
        debug!(user_id = %tracker.user_id(), ?engagement, xp, "Engagement rewarded");
        xp
    } else {
        0
    }
}

/// Grid of cards the learner taps open. Opening every card completes the
/// deck's level.
#[derive(Debug, Clone)]
pub struct TapRevealDeck {
    level: LevelId,
    revealed: Vec<bool>,
    finished: bool,
}

impl TapRevealDeck {
    pub fn new(level: LevelId, cards: usize) -> Self {
        Self {
            level,
            revealed: vec![false; cards],
            finished: false,
        }
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Flip a card. The first time all cards are open, the tap-reveal
    /// reward is awarded and the level is completed.
    pub fn toggle(
        &mut self,
        card: usize,
        tracker: &mut ProgressTracker,
        rewards: &Rewards,
    ) -> Result<bool, ProgressError> {
        let cards = self.revealed.len();
        let Some(slot) = self.revealed.get_mut(card) else {
            warn!(card, cards, "Tap on a card outside the deck");
            return Ok(false);
        };
        *slot = !*slot;
        let open = *slot;

        if !self.finished && self.revealed.iter().all(|r| *r) {
            navigation::access(tracker, self.level.as_str())?;
            self.finished = true;
            record_engagement(tracker, rewards, Engagement::TapRevealComplete);
            tracker.complete_level(self.level.as_str());
        }

        Ok(open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Which side a swipe card belongs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSide {
    /// Swipe right
    Benefit,
    /// Swipe left
    Concern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeCard {
    pub id: String,
    pub text: String,
    pub side: CardSide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub card_id: String,
    pub direction: SwipeDirection,
    /// Direction agreed with the card's side
    pub matched: bool,
    pub xp_awarded: i64,
}

/// Stack of benefit/concern cards sorted by swiping
#[derive(Debug, Clone)]
pub struct SwipeDeck {
    cards: Vec<SwipeCard>,
    position: usize,
}

impl SwipeDeck {
    pub fn new(cards: Vec<SwipeCard>) -> Self {
        Self { cards, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.position
    }

    /// Swipe the top card. `None` once the deck is exhausted.
    pub fn swipe(
        &mut self,
        direction: SwipeDirection,
        tracker: &mut ProgressTracker,
        rewards: &Rewards,
    ) -> Option<SwipeOutcome> {
        let card = self.cards.get(self.position)?;
        self.position += 1;

        let matched = matches!(
            (card.side, direction),
            (CardSide::Benefit, SwipeDirection::Right) | (CardSide::Concern, SwipeDirection::Left)
        );
        let xp_awarded = record_engagement(tracker, rewards, Engagement::Swipe);

        Some(SwipeOutcome {
            card_id: card.id.clone(),
            direction,
            matched,
            xp_awarded,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Multiple-choice quiz answered question by question.
/// Finishing the quiz earns the quiz reward once.
#[derive(Debug, Clone)]
pub struct QuizRound {
    questions: Vec<QuizQuestion>,
    index: usize,
    correct: usize,
}

impl QuizRound {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            index: 0,
            correct: 0,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// Submit an answer for the current question. Returns whether it was
    /// correct, or `None` if the quiz is already over.
    pub fn answer(
        &mut self,
        choice: usize,
        tracker: &mut ProgressTracker,
        rewards: &Rewards,
    ) -> Option<bool> {
        let question = self.questions.get(self.index)?;
        let correct = choice == question.correct;
        if correct {
            self.correct += 1;
        }
        self.index += 1;

        if self.is_done() {
            record_engagement(tracker, rewards, Engagement::QuizComplete);
        }
        Some(correct)
    }

    pub fn score(&self) -> QuizScore {
        QuizScore {
            correct: self.correct,
            total: self.questions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Curriculum;
    use crate::state::UserId;
    use std::sync::Arc;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(UserId::new("widgets"), Arc::new(Curriculum::civic_default()))
    }

    fn cards() -> Vec<SwipeCard> {
        vec![
            SwipeCard {
                id: "b1".into(),
                text: "Cost savings from fewer elections".into(),
                side: CardSide::Benefit,
            },
            SwipeCard {
                id: "c1".into(),
                text: "Concerns about federal focus".into(),
                side: CardSide::Concern,
            },
            SwipeCard {
                id: "b2".into(),
                text: "Policy continuity improves".into(),
                side: CardSide::Benefit,
            },
        ]
    }

    #[test]
    fn test_three_swipes_award_three_xp() {
        let mut t = tracker();
        let rewards = Rewards::default();
        let mut deck = SwipeDeck::new(cards());

        let first = deck.swipe(SwipeDirection::Right, &mut t, &rewards).unwrap();
        assert!(first.matched);
        let second = deck.swipe(SwipeDirection::Right, &mut t, &rewards).unwrap();
        assert!(!second.matched);
        deck.swipe(SwipeDirection::Left, &mut t, &rewards).unwrap();

        assert_eq!(t.state().xp(), 3);
        assert_eq!(deck.remaining(), 0);
        assert!(deck.swipe(SwipeDirection::Left, &mut t, &rewards).is_none());
        assert_eq!(t.state().xp(), 3);
    }

    #[test]
    fn test_tap_reveal_completes_level_once() {
        let mut t = tracker();
        let rewards = Rewards::default();
        let mut deck = TapRevealDeck::new(LevelId::from("level-1"), 4);

        for card in 0..3 {
            assert!(deck.toggle(card, &mut t, &rewards).unwrap());
        }
        assert!(!deck.is_finished());
        assert!(!deck.toggle(0, &mut t, &rewards).unwrap());
        deck.toggle(3, &mut t, &rewards).unwrap();
        assert!(!deck.is_finished());
        deck.toggle(0, &mut t, &rewards).unwrap();

        assert!(deck.is_finished());
        assert_eq!(t.state().xp(), 5);
        assert!(t.state().is_completed("level-1"));

        // closing and reopening pays nothing more
        deck.toggle(2, &mut t, &rewards).unwrap();
        deck.toggle(2, &mut t, &rewards).unwrap();
        assert_eq!(t.state().xp(), 5);
        assert!(!deck.toggle(10, &mut t, &rewards).unwrap());
    }

    #[test]
    fn test_tap_reveal_on_locked_level_reports_error() {
        let mut t = tracker();
        let rewards = Rewards::default();
        let mut deck = TapRevealDeck::new(LevelId::from("level-3"), 1);

        let result = deck.toggle(0, &mut t, &rewards);
        assert!(matches!(result, Err(ProgressError::LevelLocked { .. })));
        assert!(!t.state().is_completed("level-3"));
        assert!(!deck.is_finished());
        assert_eq!(t.state().xp(), 0);
    }

    #[test]
    fn test_zero_rewards_do_not_touch_state() {
        let mut t = tracker();
        let rewards = Rewards::default();
        assert_eq!(record_engagement(&mut t, &rewards, Engagement::SliderMoved), 0);
        assert_eq!(record_engagement(&mut t, &rewards, Engagement::SimulationRun), 0);
        assert_eq!(t.state().xp(), 0);
        assert!(t.state().updated_at().is_none());
    }

    #[test]
    fn test_quiz_awards_once_on_finish() {
        let mut t = tracker();
        let rewards = Rewards::default();
        let mut quiz = QuizRound::new(vec![
            QuizQuestion {
                prompt: "Minimum voting age?".into(),
                options: vec!["16".into(), "18".into(), "21".into()],
                correct: 1,
            },
            QuizQuestion {
                prompt: "ONOE stands for?".into(),
                options: vec!["One Nation, One Election".into(), "Other".into()],
                correct: 0,
            },
        ]);

        assert_eq!(quiz.answer(1, &mut t, &rewards), Some(true));
        assert_eq!(t.state().xp(), 0);
        assert_eq!(quiz.answer(1, &mut t, &rewards), Some(false));
        assert!(quiz.is_done());
        assert_eq!(t.state().xp(), 10);
        assert_eq!(quiz.answer(0, &mut t, &rewards), None);
        assert_eq!(quiz.score(), QuizScore { correct: 1, total: 2 });
        assert_eq!(quiz.score().percentage(), 50);
    }
}
