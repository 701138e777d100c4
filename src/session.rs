//! Card lifecycle and score for one quiz session.
//!
//! The session is a small state machine. Each generate bumps an epoch so
//! results from an abandoned fetch can be recognised and dropped.

use std::fmt;
use tracing::{debug, info};

use crate::error::QuizError;
use crate::question::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Flipped,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub total: u32,
    pub correct: u32,
}

impl Score {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct, self.total)
    }
}

pub struct Session {
    phase: Phase,
    epoch: u64,
    card: Option<Card>,
    /// Which face is showing; only meaningful once the card was revealed
    showing_answer: bool,
    answered: bool,
    score: Score,
    status: String,
    /// Text for the card front after a failed generate
    failure: Option<&'static str>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            epoch: 0,
            card: None,
            showing_answer: false,
            answered: false,
            score: Score::default(),
            status: String::new(),
            failure: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn failure(&self) -> Option<&'static str> {
        self.failure
    }

    pub fn showing_answer(&self) -> bool {
        self.showing_answer
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn can_generate(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Ready | Phase::Answered)
    }

    pub fn can_mark(&self) -> bool {
        self.phase == Phase::Flipped && self.card.is_some() && !self.answered
    }

    /// Enter Loading and return the epoch the pending card belongs to
    pub fn begin_generate(&mut self) -> u64 {
        self.epoch += 1;
        self.phase = Phase::Loading;
        self.card = None;
        self.showing_answer = false;
        self.answered = false;
        self.failure = None;
        self.status = "جاري التحميل...".to_string();
        debug!(epoch = self.epoch, "generate started");
        self.epoch
    }

    /// Install a freshly built card. Stale epochs are ignored.
    pub fn card_ready(&mut self, epoch: u64, card: Card, timer_secs: u64) -> bool {
        if !self.is_current(epoch) || self.phase != Phase::Loading {
            debug!(epoch, current = self.epoch, "dropping stale card");
            return false;
        }

        let timer_text = if timer_secs == 0 {
            "بدون مؤقت".to_string()
        } else {
            format!("{} ثانية", timer_secs)
        };
        self.status = format!("جاهز. النوع: {} | المؤقت: {}", card.mode.label(), timer_text);
        info!(page = card.source_page, mode = card.mode.as_str(), "card ready");

        self.card = Some(card);
        self.phase = Phase::Ready;
        self.showing_answer = false;
        self.answered = false;
        true
    }

    /// Report a failed generate. Stale epochs are ignored.
    pub fn generation_failed(&mut self, epoch: u64, err: &QuizError) -> bool {
        if !self.is_current(epoch) || self.phase != Phase::Loading {
            debug!(epoch, current = self.epoch, "dropping stale failure");
            return false;
        }
        info!(error = %err, "card generation failed");
        self.phase = Phase::Idle;
        self.card = None;
        self.failure = Some(err.card_message());
        self.status = err.user_message().to_string();
        true
    }

    /// Turn the card over. The first flip reveals the answer and locks
    /// generation until the card is marked; later flips only swap faces.
    pub fn flip(&mut self) -> bool {
        match self.phase {
            Phase::Ready => {
                self.reveal();
                self.status = "اختر ✅/❌ لفتح زر \"سؤال جديد\".".to_string();
                true
            }
            Phase::Flipped | Phase::Answered => {
                self.showing_answer = !self.showing_answer;
                true
            }
            Phase::Idle | Phase::Loading => false,
        }
    }

    /// Timer ran out on the current card
    pub fn expire(&mut self) -> bool {
        if self.card.is_none() {
            return false;
        }
        match self.phase {
            Phase::Ready => self.reveal(),
            Phase::Flipped => self.showing_answer = true,
            _ => return false,
        }
        self.status = "انتهى الوقت — اختر ✅ صحيح أو ❌ خطأ للمتابعة.".to_string();
        info!("timer expired");
        true
    }

    fn reveal(&mut self) {
        self.phase = Phase::Flipped;
        self.showing_answer = true;
    }

    /// Record the user's verdict on the current card, at most once
    pub fn mark(&mut self, correct: bool) -> bool {
        if !self.can_mark() {
            return false;
        }
        self.answered = true;
        self.score.record(correct);
        self.phase = Phase::Answered;
        self.status = if correct {
            "تم التسجيل: ✅ صحيح".to_string()
        } else {
            "تم التسجيل: ❌ خطأ".to_string()
        };
        info!(correct, score = %self.score, "card marked");
        true
    }
}
