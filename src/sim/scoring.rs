//! Scoring state machine
//!
//! Score, lives, the two one-shot target banks and the jackpot sequence.
//! The card bank and the icon bank reset differently: completing the card
//! bank starts a timed jackpot and only re-arms when the countdown expires,
//! completing the icon bank re-arms it immediately with no bonus.

use serde::{Deserialize, Serialize};

/// Point values
pub mod points {
    pub const SLING: u32 = 50;
    pub const KICKER: u32 = 200;
    pub const CARD: u32 = 500;
    pub const ICON: u32 = 1000;
    pub const JACKPOT_BONUS: u32 = 10_000;
}

/// Jackpot countdown (2 seconds at 60 Hz)
pub const JACKPOT_DURATION_TICKS: u32 = 120;

/// Something scoring-related that happened during play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreEvent {
    BumperHit { index: usize, points: u32 },
    SlingHit { index: usize },
    KickerHit { index: usize },
    CardHit { index: usize },
    IconHit { index: usize },
    Jackpot,
    JackpotEnded,
    IconBankReset,
    BallLost { lives_left: u32 },
    GameOver,
}

/// Hit flags for one bank of one-shot targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBank {
    hits: Vec<bool>,
}

impl TargetBank {
    pub fn new(len: usize) -> Self {
        Self {
            hits: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_hit(&self, index: usize) -> bool {
        self.hits.get(index).copied().unwrap_or(false)
    }

    /// Flag a target; returns true only on the unhit -> hit transition
    pub fn mark(&mut self, index: usize) -> bool {
        match self.hits.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }

    /// Non-empty and every flag set
    pub fn complete(&self) -> bool {
        !self.hits.is_empty() && self.hits.iter().all(|&h| h)
    }

    pub fn reset(&mut self) {
        self.hits.fill(false);
    }

    pub fn flags(&self) -> &[bool] {
        &self.hits
    }
}

/// Target indices hit in one tick, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickHits {
    /// (bumper index, points)
    pub bumpers: Vec<(usize, u32)>,
    pub slings: Vec<usize>,
    pub kickers: Vec<usize>,
    pub cards: Vec<usize>,
    pub icons: Vec<usize>,
}

/// Mutable scoring state of one play session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub lives: u32,
    starting_lives: u32,
    pub cards: TargetBank,
    pub icons: TargetBank,
    pub jackpot_active: bool,
    /// Ticks left in the jackpot sequence (0 = inactive)
    pub jackpot_timer: u32,
    #[serde(skip)]
    events: Vec<ScoreEvent>,
}

impl Scoreboard {
    pub fn new(card_count: usize, icon_count: usize, starting_lives: u32) -> Self {
        Self {
            score: 0,
            lives: starting_lives,
            starting_lives,
            cards: TargetBank::new(card_count),
            icons: TargetBank::new(icon_count),
            jackpot_active: false,
            jackpot_timer: 0,
            events: Vec::new(),
        }
    }

    fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(u64::from(points));
    }

    /// Apply one tick's worth of detected hits
    pub fn apply_hits(&mut self, hits: &TickHits) {
        // Stateless targets score on every qualifying tick
        for &(index, points) in &hits.bumpers {
            self.award(points);
            self.events.push(ScoreEvent::BumperHit { index, points });
        }
        for &index in &hits.slings {
            self.award(points::SLING);
            self.events.push(ScoreEvent::SlingHit { index });
        }
        for &index in &hits.kickers {
            self.award(points::KICKER);
            self.events.push(ScoreEvent::KickerHit { index });
        }

        for &index in &hits.cards {
            self.card_hit(index);
        }

        for &index in &hits.icons {
            if self.icons.mark(index) {
                self.award(points::ICON);
                self.events.push(ScoreEvent::IconHit { index });
            }
        }
        if self.icons.complete() {
            self.icons.reset();
            self.events.push(ScoreEvent::IconBankReset);
        }
    }

    fn card_hit(&mut self, index: usize) {
        if !self.cards.mark(index) {
            return;
        }
        self.award(points::CARD);
        self.events.push(ScoreEvent::CardHit { index });

        if self.cards.complete() && !self.jackpot_active {
            self.jackpot_active = true;
            self.jackpot_timer = JACKPOT_DURATION_TICKS;
            self.award(points::JACKPOT_BONUS);
            self.events.push(ScoreEvent::Jackpot);
            log::info!("Jackpot! score {}", self.score);
        }
    }

    /// Once-per-tick countdown; expiry re-arms the card bank
    pub fn tick_jackpot(&mut self) {
        if self.jackpot_timer == 0 {
            return;
        }
        self.jackpot_timer -= 1;
        if self.jackpot_timer == 0 {
            self.jackpot_active = false;
            self.cards.reset();
            self.events.push(ScoreEvent::JackpotEnded);
        }
    }

    /// Consume one life; returns true when the game is over
    pub fn drain(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(ScoreEvent::BallLost {
            lives_left: self.lives,
        });
        if self.lives == 0 {
            self.events.push(ScoreEvent::GameOver);
            log::info!("Game over with score {}", self.score);
            true
        } else {
            false
        }
    }

    /// Fresh game: full lives, zero score, all banks and jackpot cleared
    pub fn reset(&mut self) {
        self.score = 0;
        self.lives = self.starting_lives;
        self.cards.reset();
        self.icons.reset();
        self.jackpot_active = false;
        self.jackpot_timer = 0;
        self.events.clear();
    }

    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    /// Hand over every event raised since the last call
    pub fn take_events(&mut self) -> Vec<ScoreEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(indices: &[usize]) -> TickHits {
        TickHits {
            cards: indices.to_vec(),
            ..Default::default()
        }
    }

    fn icons(indices: &[usize]) -> TickHits {
        TickHits {
            icons: indices.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_card_bank_triggers_single_jackpot() {
        let mut board = Scoreboard::new(4, 0, 3);
        for i in 0..4 {
            board.apply_hits(&cards(&[i]));
            board.tick_jackpot();
        }
        assert!(board.jackpot_active);
        assert_eq!(board.score, 4 * 500 + 10_000);
        assert_eq!(board.events().iter().filter(|e| **e == ScoreEvent::Jackpot).count(), 1);

        // Re-hitting cards during the jackpot does nothing
        board.apply_hits(&cards(&[0, 1, 2, 3]));
        assert_eq!(board.score, 4 * 500 + 10_000);
    }

    #[test]
    fn test_jackpot_expiry_rearms_bank() {
        let mut board = Scoreboard::new(2, 0, 3);
        board.apply_hits(&cards(&[0, 1]));
        let mut ticks = 0;
        while board.jackpot_active {
            board.tick_jackpot();
            ticks += 1;
            assert!(ticks <= JACKPOT_DURATION_TICKS);
        }
        assert_eq!(ticks, JACKPOT_DURATION_TICKS);
        assert!(board.cards.flags().iter().all(|h| !h));
        assert_eq!(board.jackpot_timer, 0);
        assert!(board.events().contains(&ScoreEvent::JackpotEnded));

        // Second round pays again
        board.apply_hits(&cards(&[0, 1]));
        assert_eq!(board.score, 2 * (2 * 500 + 10_000));
    }

    #[test]
    fn test_icon_bank_resets_without_bonus() {
        let mut board = Scoreboard::new(0, 3, 3);
        board.apply_hits(&icons(&[0]));
        board.apply_hits(&icons(&[2]));
        assert_eq!(board.icons.flags(), &[true, false, true]);
        board.apply_hits(&icons(&[1]));
        assert_eq!(board.icons.flags(), &[false, false, false]);
        assert_eq!(board.score, 3 * 1000);
        assert!(board.events().contains(&ScoreEvent::IconBankReset));
        assert!(!board.jackpot_active);
    }

    #[test]
    fn test_icon_already_hit_does_not_score() {
        let mut board = Scoreboard::new(0, 2, 3);
        board.apply_hits(&icons(&[0]));
        board.apply_hits(&icons(&[0]));
        assert_eq!(board.score, 1000);
    }

    #[test]
    fn test_stateless_targets_score_every_hit() {
        let mut board = Scoreboard::new(0, 0, 3);
        let hits = TickHits {
            bumpers: vec![(0, 100), (1, 250)],
            slings: vec![0],
            kickers: vec![1],
            ..Default::default()
        };
        board.apply_hits(&hits);
        board.apply_hits(&hits);
        assert_eq!(board.score, 2 * (100 + 250 + 50 + 200));
    }

    #[test]
    fn test_drain_counts_down_to_game_over() {
        let mut board = Scoreboard::new(0, 0, 2);
        assert!(!board.drain());
        assert_eq!(board.lives, 1);
        assert!(board.drain());
        assert_eq!(board.lives, 0);
        assert!(board.events().contains(&ScoreEvent::GameOver));
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut board = Scoreboard::new(1, 2, 3);
        board.apply_hits(&TickHits {
            cards: vec![0],
            icons: vec![1],
            ..Default::default()
        });
        board.drain();
        board.reset();
        assert_eq!(board.score, 0);
        assert_eq!(board.lives, 3);
        assert!(!board.jackpot_active);
        assert_eq!(board.jackpot_timer, 0);
        assert!(!board.cards.is_hit(0));
        assert!(!board.icons.is_hit(1));
        assert!(board.events().is_empty());
    }

    #[test]
    fn test_events_accumulate_until_taken() {
        let mut board = Scoreboard::new(2, 0, 3);
        board.apply_hits(&cards(&[0]));
        board.tick_jackpot();
        board.apply_hits(&cards(&[1]));
        assert_eq!(
            board.take_events(),
            vec![
                ScoreEvent::CardHit { index: 0 },
                ScoreEvent::CardHit { index: 1 },
                ScoreEvent::Jackpot
            ]
        );
        assert!(board.take_events().is_empty());
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut board = Scoreboard::new(1, 1, 3);
        board.apply_hits(&TickHits {
            cards: vec![5],
            icons: vec![9],
            ..Default::default()
        });
        assert_eq!(board.score, 0);
    }
}
