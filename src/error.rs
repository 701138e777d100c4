use thiserror::Error;

use crate::question::QuizMode;

/// Failures surfaced while building a card.
///
/// Neither variant touches the score or the page cache; the caller re-enables
/// the generate action after reporting it.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to fetch page {page}: {reason}")]
    Fetch { page: u16, reason: String },

    #[error("page {page} cannot produce a `{}` question", .mode.as_str())]
    GenerationImpossible { mode: QuizMode, page: u16 },
}

impl QuizError {
    pub fn fetch(page: u16, reason: impl ToString) -> Self {
        QuizError::Fetch {
            page,
            reason: reason.to_string(),
        }
    }

    /// Status line shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            QuizError::Fetch { .. } => "فشل التحميل. تأكد من الإنترنت وحاول مجددًا.",
            QuizError::GenerationImpossible { .. } => "حصلت مشكلة. جرّب مرة ثانية.",
        }
    }

    /// Text placed on the card front in place of a question
    pub fn card_message(&self) -> &'static str {
        match self {
            QuizError::Fetch { .. } => "خطأ في الشبكة أو في الـ API.",
            QuizError::GenerationImpossible { .. } => "تعذر إنشاء سؤال. حاول مرة أخرى.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = QuizError::fetch(12, "HTTP 500");
        assert_eq!(err.to_string(), "failed to fetch page 12: HTTP 500");
    }

    #[test]
    fn test_generation_impossible_display() {
        let err = QuizError::GenerationImpossible {
            mode: QuizMode::Previous,
            page: 1,
        };
        assert_eq!(err.to_string(), "page 1 cannot produce a `previous` question");
        assert_ne!(err.user_message(), QuizError::fetch(1, "x").user_message());
    }
}
