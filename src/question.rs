//! Card generation: turning one mushaf page into a question/answer pair.
//!
//! Every mode is a small pure function over the page's verses, so selection
//! logic can be exercised without a network or a terminal.

use rand::Rng;

use crate::quran::Verse;
use crate::range::{MAX_PAGE, MIN_PAGE};

const UNKNOWN_SURAH: &str = "غير معروف";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizMode {
    #[default]
    First,
    Last,
    Previous,
    Surah,
    PageNumber,
    AyahCount,
    NextPageFirst,
    PrevPageFirst,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::First => "first",
            QuizMode::Last => "last",
            QuizMode::Previous => "previous",
            QuizMode::Surah => "surah",
            QuizMode::PageNumber => "pageNumber",
            QuizMode::AyahCount => "ayahCount",
            QuizMode::NextPageFirst => "nextPageFirst",
            QuizMode::PrevPageFirst => "prevPageFirst",
        }
    }

    /// Accepts the camelCase tags as well as case-insensitive spellings
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "first" => Some(QuizMode::First),
            "last" => Some(QuizMode::Last),
            "previous" => Some(QuizMode::Previous),
            "surah" => Some(QuizMode::Surah),
            "pagenumber" => Some(QuizMode::PageNumber),
            "ayahcount" => Some(QuizMode::AyahCount),
            "nextpagefirst" => Some(QuizMode::NextPageFirst),
            "prevpagefirst" => Some(QuizMode::PrevPageFirst),
            _ => None,
        }
    }

    pub fn all() -> Vec<QuizMode> {
        vec![
            QuizMode::First,
            QuizMode::Last,
            QuizMode::Previous,
            QuizMode::Surah,
            QuizMode::PageNumber,
            QuizMode::AyahCount,
            QuizMode::NextPageFirst,
            QuizMode::PrevPageFirst,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuizMode::First => "خمن الآية الأولى بالصفحة",
            QuizMode::Last => "خمن الآية الأخيرة بالصفحة",
            QuizMode::Previous => "خمن الآية السابقة",
            QuizMode::Surah => "خمن السورة",
            QuizMode::PageNumber => "خمن رقم الصفحة",
            QuizMode::AyahCount => "خمن كم عدد آيات الصفحة؟",
            QuizMode::NextPageFirst => "خمن أول آية بالصفحة التالية",
            QuizMode::PrevPageFirst => "خمن أول آية بالصفحة السابقة",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QuizMode::First => {
                "سيظهر لك آية من نفس الصفحة، والمطلوب أن تتذكر الآية الأولى في هذه الصفحة."
            }
            QuizMode::Last => {
                "سيظهر لك آية من نفس الصفحة، والمطلوب أن تتذكر الآية الأخيرة في هذه الصفحة."
            }
            QuizMode::Previous => "سيظهر لك آية، والمطلوب أن تتذكر الآية التي تسبقها في نفس الصفحة.",
            QuizMode::Surah => "سيظهر لك آية، والمطلوب أن تحدد اسم السورة التي تنتمي لها.",
            QuizMode::PageNumber => "سيظهر لك آية، والمطلوب أن تخمّن رقم الصفحة.",
            QuizMode::AyahCount => "السؤال هو أول آية في الصفحة، والمطلوب أن تخمّن عدد آيات الصفحة.",
            QuizMode::NextPageFirst => {
                "السؤال هو أول آية في الصفحة، والجواب هو أول آية في الصفحة التالية."
            }
            QuizMode::PrevPageFirst => {
                "السؤال هو أول آية في الصفحة، والجواب هو أول آية في الصفحة السابقة."
            }
        }
    }

    /// Help line shown on the card front
    pub fn help_text(&self) -> String {
        format!("النوع: {} — {}", self.label(), self.description())
    }

    /// The neighbouring page whose first ayah is the answer, if the mode needs one
    pub fn adjacent_page(&self, page: u16) -> Option<u16> {
        match self {
            QuizMode::NextPageFirst => page.checked_add(1).filter(|p| *p <= MAX_PAGE),
            QuizMode::PrevPageFirst => page.checked_sub(1).filter(|p| *p >= MIN_PAGE),
            _ => None,
        }
    }

    /// Every page needed to build a card for `page`, in fetch order
    pub fn pages_needed(&self, page: u16) -> Vec<u16> {
        let mut pages = vec![page];
        pages.extend(self.adjacent_page(page));
        pages
    }
}

/// Keep the neighbour of an adjacent-page question inside the mushaf.
pub fn clamp_source_page(mode: QuizMode, page: u16) -> u16 {
    match mode {
        QuizMode::NextPageFirst => page.clamp(MIN_PAGE, MAX_PAGE - 1),
        QuizMode::PrevPageFirst => page.clamp(MIN_PAGE + 1, MAX_PAGE),
        _ => page.clamp(MIN_PAGE, MAX_PAGE),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub question: String,
    pub answer: String,
    pub mode: QuizMode,
    pub source_page: u16,
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, verses: &'a [Verse]) -> Option<&'a Verse> {
    if verses.is_empty() {
        None
    } else {
        Some(&verses[rng.gen_range(0..verses.len())])
    }
}

fn surah_name(verse: &Verse) -> String {
    let name = verse.surah_name.trim();
    if name.is_empty() {
        UNKNOWN_SURAH.to_string()
    } else {
        name.to_string()
    }
}

fn first_of_page<R: Rng + ?Sized>(rng: &mut R, verses: &[Verse]) -> Option<(String, String)> {
    let (first, rest) = verses.split_first()?;
    let candidate = pick(rng, rest)?;
    Some((candidate.text.clone(), first.text.clone()))
}

fn last_of_page<R: Rng + ?Sized>(rng: &mut R, verses: &[Verse]) -> Option<(String, String)> {
    let (last, rest) = verses.split_last()?;
    let candidate = pick(rng, rest)?;
    Some((candidate.text.clone(), last.text.clone()))
}

/// A verse and the one right before it on the same page
fn consecutive_pair<'a, R: Rng + ?Sized>(
    rng: &mut R,
    verses: &'a [Verse],
) -> Option<(&'a Verse, &'a Verse)> {
    if verses.len() < 2 {
        return None;
    }
    let idx = rng.gen_range(1..verses.len());
    Some((&verses[idx], &verses[idx - 1]))
}

fn previous_ayah<R: Rng + ?Sized>(rng: &mut R, verses: &[Verse]) -> Option<(String, String)> {
    let (question, answer) = consecutive_pair(rng, verses)?;
    Some((question.text.clone(), answer.text.clone()))
}

fn surah_of_ayah<R: Rng + ?Sized>(rng: &mut R, verses: &[Verse]) -> Option<(String, String)> {
    let candidate = pick(rng, verses)?;
    Some((candidate.text.clone(), surah_name(candidate)))
}

fn page_of_ayah<R: Rng + ?Sized>(
    rng: &mut R,
    verses: &[Verse],
    page: u16,
) -> Option<(String, String)> {
    let candidate = pick(rng, verses)?;
    Some((candidate.text.clone(), page.to_string()))
}

fn ayah_count(verses: &[Verse]) -> Option<(String, String)> {
    let first = verses.first()?;
    Some((first.text.clone(), verses.len().to_string()))
}

fn adjacent_first(verses: &[Verse], adjacent: Option<&[Verse]>) -> Option<(String, String)> {
    let first = verses.first()?;
    let other = adjacent?.first()?;
    Some((first.text.clone(), other.text.clone()))
}

/// Build a card for `page` from its verses.
///
/// `adjacent` carries the verses of the neighbouring page for the
/// `NextPageFirst`/`PrevPageFirst` modes and is ignored otherwise. Returns
/// `None` when the page cannot support the mode (too few ayat, missing
/// neighbour, or blank text).
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    mode: QuizMode,
    verses: &[Verse],
    page: u16,
    adjacent: Option<&[Verse]>,
) -> Option<Card> {
    let (question, answer) = match mode {
        QuizMode::First => first_of_page(rng, verses),
        QuizMode::Last => last_of_page(rng, verses),
        QuizMode::Previous => previous_ayah(rng, verses),
        QuizMode::Surah => surah_of_ayah(rng, verses),
        QuizMode::PageNumber => page_of_ayah(rng, verses, page),
        QuizMode::AyahCount => ayah_count(verses),
        QuizMode::NextPageFirst | QuizMode::PrevPageFirst => adjacent_first(verses, adjacent),
    }?;

    if question.trim().is_empty() || answer.trim().is_empty() {
        return None;
    }

    Some(Card {
        question,
        answer,
        mode,
        source_page: page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::tests::{page_of, verse};
    use crate::range::{resolve, RangePreset};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_first_mode() {
        let mut rng = rng();
        let verses = page_of(15);
        for _ in 0..200 {
            let card = generate(&mut rng, QuizMode::First, &verses, 10, None).unwrap();
            assert_eq!(card.answer, "ayah 1");
            assert_ne!(card.question, card.answer);
        }
    }

    #[test]
    fn test_last_mode() {
        let mut rng = rng();
        let verses = page_of(7);
        for _ in 0..200 {
            let card = generate(&mut rng, QuizMode::Last, &verses, 10, None).unwrap();
            assert_eq!(card.answer, "ayah 7");
            assert_ne!(card.question, card.answer);
        }
    }

    #[test]
    fn test_first_mode_covers_every_other_ayah() {
        let mut rng = rng();
        let verses = page_of(4);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            let card = generate(&mut rng, QuizMode::First, &verses, 1, None).unwrap();
            seen.insert(card.question);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_previous_mode_is_consecutive() {
        let mut rng = rng();
        // Repeated text must not matter; only page position counts
        let verses: Vec<Verse> = (0..12).map(|i| verse(i, "مُدْهَامَّتَانِ", "سُورَةُ الرَّحْمَٰنِ")).collect();
        for _ in 0..200 {
            let (question, answer) = consecutive_pair(&mut rng, &verses).unwrap();
            assert!(question.position >= 1);
            assert_eq!(answer.position, question.position - 1);
        }
        assert!(consecutive_pair(&mut rng, &verses[..1]).is_none());

        let card = generate(&mut rng, QuizMode::Previous, &verses, 3, None).unwrap();
        assert_eq!(card.answer, "مُدْهَامَّتَانِ");
    }

    #[test]
    fn test_two_verse_modes_reject_single_ayah_page() {
        let mut rng = rng();
        let verses = page_of(1);
        for mode in [QuizMode::First, QuizMode::Last, QuizMode::Previous] {
            assert_eq!(generate(&mut rng, mode, &verses, 1, None), None, "{mode:?}");
        }
    }

    #[test]
    fn test_single_verse_modes_accept_single_ayah_page() {
        let mut rng = rng();
        let verses = page_of(1);
        for mode in [QuizMode::Surah, QuizMode::PageNumber, QuizMode::AyahCount] {
            assert!(generate(&mut rng, mode, &verses, 1, None).is_some(), "{mode:?}");
        }
    }

    #[test]
    fn test_empty_page_produces_nothing() {
        let mut rng = rng();
        for mode in QuizMode::all() {
            let adjacent = page_of(3);
            assert_eq!(generate(&mut rng, mode, &[], 5, Some(adjacent.as_slice())), None, "{mode:?}");
        }
    }

    #[test]
    fn test_ayah_count_mode() {
        let mut rng = rng();
        let verses = page_of(9);
        let card = generate(&mut rng, QuizMode::AyahCount, &verses, 44, None).unwrap();
        assert_eq!(card.question, "ayah 1");
        assert_eq!(card.answer, "9");
        assert_eq!(card.source_page, 44);
    }

    #[test]
    fn test_surah_mode_with_fallback() {
        let mut rng = rng();
        let verses = vec![verse(0, "x", "  ")];
        let card = generate(&mut rng, QuizMode::Surah, &verses, 1, None).unwrap();
        assert_eq!(card.answer, UNKNOWN_SURAH);

        let verses = vec![verse(0, "y", "سُورَةُ يسٓ")];
        let card = generate(&mut rng, QuizMode::Surah, &verses, 440, None).unwrap();
        assert_eq!(card.answer, "سُورَةُ يسٓ");
    }

    #[test]
    fn test_juz30_page_number_scenario() {
        let mut rng = rng();
        let range = resolve(RangePreset::Juz30, "", "");
        assert_eq!((range.min, range.max), (582, 604));

        for _ in 0..50 {
            let page = range.sample(&mut rng);
            let card = generate(&mut rng, QuizMode::PageNumber, &page_of(14), page, None).unwrap();
            let answered: u16 = card.answer.parse().unwrap();
            assert_eq!(answered, page);
            assert!((582..=604).contains(&answered));
        }
    }

    #[test]
    fn test_adjacent_modes() {
        let mut rng = rng();
        let here = page_of(6);
        let next = vec![verse(0, "next first", "s")];

        let card = generate(&mut rng, QuizMode::NextPageFirst, &here, 20, Some(next.as_slice())).unwrap();
        assert_eq!(card.question, "ayah 1");
        assert_eq!(card.answer, "next first");

        assert_eq!(generate(&mut rng, QuizMode::PrevPageFirst, &here, 20, Some(&[][..])), None);
        assert_eq!(generate(&mut rng, QuizMode::PrevPageFirst, &here, 20, None), None);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let mut rng = rng();
        let verses = vec![verse(0, "", "s")];
        assert_eq!(generate(&mut rng, QuizMode::AyahCount, &verses, 1, None), None);
    }

    #[test]
    fn test_clamp_source_page() {
        assert_eq!(clamp_source_page(QuizMode::NextPageFirst, 604), 603);
        assert_eq!(clamp_source_page(QuizMode::NextPageFirst, 1), 1);
        assert_eq!(clamp_source_page(QuizMode::PrevPageFirst, 1), 2);
        assert_eq!(clamp_source_page(QuizMode::PrevPageFirst, 604), 604);
        assert_eq!(clamp_source_page(QuizMode::Surah, 604), 604);
    }

    #[test]
    fn test_next_page_first_on_last_page_targets_604() {
        let page = clamp_source_page(QuizMode::NextPageFirst, 604);
        assert_eq!(page, 603);
        assert_eq!(QuizMode::NextPageFirst.adjacent_page(page), Some(604));
        assert_eq!(QuizMode::NextPageFirst.pages_needed(page), vec![603, 604]);
        assert_eq!(QuizMode::Last.pages_needed(page), vec![603]);
        assert_eq!(QuizMode::NextPageFirst.adjacent_page(604), None);
        assert_eq!(QuizMode::PrevPageFirst.adjacent_page(1), None);
    }

    #[test]
    fn test_mode_tags() {
        for mode in QuizMode::all() {
            assert_eq!(QuizMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(QuizMode::from_str("next-page-first"), Some(QuizMode::NextPageFirst));
        assert_eq!(QuizMode::from_str("bogus"), None);
        assert!(QuizMode::Surah.help_text().starts_with("النوع: خمن السورة — "));
    }
}
