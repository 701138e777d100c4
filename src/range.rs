use rand::Rng;

pub const MIN_PAGE: u16 = 1;
pub const MAX_PAGE: u16 = 604;

/// Inclusive page bounds, always within [MIN_PAGE, MAX_PAGE] with min <= max
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub min: u16,
    pub max: u16,
}

impl PageRange {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, page: u16) -> bool {
        (self.min..=self.max).contains(&page)
    }

    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    /// Draw a page uniformly from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u16 {
        rng.gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePreset {
    #[default]
    All,
    First100,
    Juz1,
    Juz30,
    Baqarah,
    Imran,
    Zahrawain,
    Custom,
}

impl RangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::All => "all",
            RangePreset::First100 => "first100",
            RangePreset::Juz1 => "juz1",
            RangePreset::Juz30 => "juz30",
            RangePreset::Baqarah => "baqarah",
            RangePreset::Imran => "imran",
            RangePreset::Zahrawain => "zahrawain",
            RangePreset::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(RangePreset::All),
            "first100" => Some(RangePreset::First100),
            "juz1" => Some(RangePreset::Juz1),
            "juz30" => Some(RangePreset::Juz30),
            "baqarah" => Some(RangePreset::Baqarah),
            "imran" => Some(RangePreset::Imran),
            "zahrawain" => Some(RangePreset::Zahrawain),
            "custom" => Some(RangePreset::Custom),
            _ => None,
        }
    }

    pub fn all() -> Vec<RangePreset> {
        vec![
            RangePreset::All,
            RangePreset::First100,
            RangePreset::Juz1,
            RangePreset::Juz30,
            RangePreset::Baqarah,
            RangePreset::Imran,
            RangePreset::Zahrawain,
            RangePreset::Custom,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RangePreset::All => "المصحف كاملًا",
            RangePreset::First100 => "أول 100 صفحة",
            RangePreset::Juz1 => "الجزء الأول",
            RangePreset::Juz30 => "جزء عمّ",
            RangePreset::Baqarah => "سورة البقرة",
            RangePreset::Imran => "سورة آل عمران",
            RangePreset::Zahrawain => "الزهراوين",
            RangePreset::Custom => "نطاق مخصص",
        }
    }

    /// Fixed bounds of a preset; `None` for `Custom`
    pub fn bounds(&self) -> Option<PageRange> {
        match self {
            RangePreset::All => Some(PageRange::new(MIN_PAGE, MAX_PAGE)),
            RangePreset::First100 => Some(PageRange::new(1, 100)),
            RangePreset::Juz1 => Some(PageRange::new(1, 21)),
            RangePreset::Juz30 => Some(PageRange::new(582, 604)),
            RangePreset::Baqarah => Some(PageRange::new(2, 49)),
            RangePreset::Imran => Some(PageRange::new(50, 76)),
            RangePreset::Zahrawain => Some(PageRange::new(2, 76)),
            RangePreset::Custom => None,
        }
    }
}

/// Parse the leading integer of `s`, ignoring surrounding whitespace and any
/// trailing garbage ("12abc" -> 12). Returns `None` when no digits lead.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate absurdly long inputs
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

fn clamp_page(n: i64) -> u16 {
    n.clamp(MIN_PAGE as i64, MAX_PAGE as i64) as u16
}

/// Resolve a range selection to concrete page bounds.
///
/// Unparseable custom bounds fall back to the mushaf edges. The result is
/// clamped into [1, 604] and swapped when min ends up above max.
pub fn resolve(preset: RangePreset, custom_min: &str, custom_max: &str) -> PageRange {
    if let Some(bounds) = preset.bounds() {
        return bounds;
    }

    let min = clamp_page(parse_leading_int(custom_min).unwrap_or(MIN_PAGE as i64));
    let max = clamp_page(parse_leading_int(custom_max).unwrap_or(MAX_PAGE as i64));

    if min > max {
        PageRange::new(max, min)
    } else {
        PageRange::new(min, max)
    }
}
