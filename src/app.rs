use futures_util::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::QuizError;
use crate::question::{clamp_source_page, generate, QuizMode};
use crate::quran::{PageFetcher, PageSource, QuranClient, Verse};
use crate::range::{resolve, PageRange, RangePreset};
use crate::session::Session;
use crate::timer::{next_timer_choice, CountdownTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomField {
    #[default]
    Min,
    Max,
}

/// What a pending fetch is for
#[derive(Debug, Clone, Copy)]
struct CardRequest {
    epoch: u64,
    mode: QuizMode,
    page: u16,
}

/// Pages that arrived before a fetch stopped, plus the error that stopped it
#[derive(Debug, Default)]
struct FetchedPages {
    pages: Vec<(u16, Vec<Verse>)>,
    error: Option<QuizError>,
}

struct PendingFetch {
    request: CardRequest,
    task: JoinHandle<FetchedPages>,
}

/// Fetch `pages` in order, stopping at the first failure or at an empty
/// source page (its neighbour would be useless).
async fn fetch_pages(source: Arc<dyn PageSource>, pages: Vec<u16>) -> FetchedPages {
    let mut fetched = FetchedPages::default();
    for page in pages {
        match source.fetch_page(page).await {
            Ok(verses) => {
                let empty = verses.is_empty();
                fetched.pages.push((page, verses));
                if empty {
                    break;
                }
            }
            Err(err) => {
                fetched.error = Some(err);
                break;
            }
        }
    }
    fetched
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Quiz selection
    pub mode: QuizMode,
    pub range_preset: RangePreset,
    pub custom_min: String,
    pub custom_max: String,
    pub timer_secs: u64,

    // Pickers
    pub show_mode_picker: bool,
    pub mode_picker_state: ListState,
    pub show_range_picker: bool,
    pub range_picker_state: ListState,

    // Custom range editor
    pub custom_field: CustomField,
    pub custom_min_input: String,
    pub custom_max_input: String,

    // Session context
    pub session: Session,
    pub timer: CountdownTimer,
    pub fetcher: PageFetcher,
    pending: Vec<PendingFetch>,
    rng: StdRng,

    // Animation state
    pub animation_frame: u8,
    tick_count: u64,

    // Layout areas for mouse hit-testing (set during render)
    pub card_area: Option<Rect>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let client = QuranClient::new(config.api_base(), config.edition());
        Self::with_source(config, Arc::new(client))
    }

    pub fn with_source(config: &Config, source: Arc<dyn PageSource>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            mode: config.quiz_mode(),
            range_preset: config.range_preset(),
            custom_min: config.custom_min.clone().unwrap_or_else(|| "1".to_string()),
            custom_max: config.custom_max.clone().unwrap_or_else(|| "604".to_string()),
            timer_secs: config.timer_seconds(),

            show_mode_picker: false,
            mode_picker_state: ListState::default(),
            show_range_picker: false,
            range_picker_state: ListState::default(),

            custom_field: CustomField::default(),
            custom_min_input: String::new(),
            custom_max_input: String::new(),

            session: Session::new(),
            timer: CountdownTimer::new(),
            fetcher: PageFetcher::from_shared(source),
            pending: Vec::new(),
            rng: StdRng::from_entropy(),

            animation_frame: 0,
            tick_count: 0,

            card_area: None,
        }
    }

    #[cfg(test)]
    fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Resolve the selected range, writing normalized custom bounds back
    pub fn resolve_range(&mut self) -> PageRange {
        let range = resolve(self.range_preset, &self.custom_min, &self.custom_max);
        if self.range_preset == RangePreset::Custom {
            self.custom_min = range.min.to_string();
            self.custom_max = range.max.to_string();
        }
        range
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    // Card actions

    pub fn generate_card(&mut self) {
        if !self.session.can_generate() {
            return;
        }

        let range = self.resolve_range();
        let page = clamp_source_page(self.mode, range.sample(&mut self.rng));

        self.timer.stop();
        let epoch = self.session.begin_generate();
        let request = CardRequest {
            epoch,
            mode: self.mode,
            page,
        };
        debug!(epoch, page, mode = self.mode.as_str(), "card requested");

        let missing = self.fetcher.missing(&request.mode.pages_needed(page));
        if missing.is_empty() {
            self.finish_request(request);
            return;
        }

        let source = self.fetcher.source();
        let task = tokio::spawn(fetch_pages(source, missing));
        self.pending.push(PendingFetch { request, task });
    }

    /// Collect finished fetches, cache what arrived, and build the card if
    /// the fetch still belongs to the current epoch.
    pub fn poll_pending(&mut self) {
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut pending in std::mem::take(&mut self.pending) {
            let Some(joined) = (&mut pending.task).now_or_never() else {
                still_pending.push(pending);
                continue;
            };

            let request = pending.request;
            let fetched = joined.unwrap_or_else(|e| FetchedPages {
                pages: Vec::new(),
                error: Some(QuizError::fetch(request.page, e)),
            });

            for (page, verses) in fetched.pages {
                self.fetcher.store(page, verses);
            }
            debug!(cached = self.fetcher.cached_pages(), "pages cached");

            match fetched.error {
                Some(err) => {
                    warn!(error = %err, "page fetch failed");
                    self.session.generation_failed(request.epoch, &err);
                }
                None => self.finish_request(request),
            }
        }

        self.pending = still_pending;
    }

    fn finish_request(&mut self, request: CardRequest) {
        if !self.session.is_current(request.epoch) {
            debug!(
                epoch = request.epoch,
                current = self.session.epoch(),
                "ignoring stale page response"
            );
            return;
        }

        let verses = self.fetcher.cached(request.page);
        let adjacent = request
            .mode
            .adjacent_page(request.page)
            .and_then(|page| self.fetcher.cached(page));

        let card = generate(
            &mut self.rng,
            request.mode,
            verses.as_deref().unwrap_or(&[]),
            request.page,
            adjacent.as_deref(),
        );

        match card {
            Some(card) => {
                if self.session.card_ready(request.epoch, card, self.timer_secs) {
                    self.timer.start(self.timer_secs, Instant::now());
                }
            }
            None => {
                let err = QuizError::GenerationImpossible {
                    mode: request.mode,
                    page: request.page,
                };
                self.session.generation_failed(request.epoch, &err);
            }
        }
    }

    pub fn flip_card(&mut self) {
        if self.session.flip() {
            self.timer.stop();
        }
    }

    pub fn mark(&mut self, correct: bool) {
        self.session.mark(correct);
    }

    /// Called by Tick event
    pub fn on_tick(&mut self, now: Instant) {
        self.tick_count += 1;
        if self.is_loading() && self.tick_count % 3 == 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if self.timer.tick(now).expired {
            self.session.expire();
        }

        self.poll_pending();
    }

    // Selection

    pub fn select_mode(&mut self, mode: QuizMode) {
        self.mode = mode;
    }

    pub fn cycle_timer(&mut self) {
        self.timer_secs = next_timer_choice(self.timer_secs);
        let text = if self.timer_secs == 0 {
            "بدون مؤقت".to_string()
        } else {
            format!("{} ثانية", self.timer_secs)
        };
        self.session.set_status(format!("المؤقت: {}", text));
    }

    pub fn open_mode_picker(&mut self) {
        let idx = QuizMode::all().iter().position(|m| *m == self.mode);
        self.mode_picker_state.select(idx.or(Some(0)));
        self.show_mode_picker = true;
    }

    pub fn mode_picker_nav_down(&mut self) {
        let len = QuizMode::all().len();
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn mode_picker_nav_up(&mut self) {
        let i = self.mode_picker_state.selected().unwrap_or(0);
        self.mode_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn confirm_mode_picker(&mut self) {
        if let Some(mode) = self
            .mode_picker_state
            .selected()
            .and_then(|i| QuizMode::all().get(i).copied())
        {
            self.select_mode(mode);
        }
        self.show_mode_picker = false;
    }

    pub fn open_range_picker(&mut self) {
        let idx = RangePreset::all().iter().position(|r| *r == self.range_preset);
        self.range_picker_state.select(idx.or(Some(0)));
        self.show_range_picker = true;
    }

    pub fn range_picker_nav_down(&mut self) {
        let len = RangePreset::all().len();
        let i = self.range_picker_state.selected().unwrap_or(0);
        self.range_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn range_picker_nav_up(&mut self) {
        let i = self.range_picker_state.selected().unwrap_or(0);
        self.range_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn confirm_range_picker(&mut self) {
        self.show_range_picker = false;
        let Some(preset) = self
            .range_picker_state
            .selected()
            .and_then(|i| RangePreset::all().get(i).copied())
        else {
            return;
        };

        if preset == RangePreset::Custom {
            self.begin_custom_range();
        } else {
            self.range_preset = preset;
        }
    }

    // Custom range editor

    pub fn begin_custom_range(&mut self) {
        self.custom_min_input = self.custom_min.clone();
        self.custom_max_input = self.custom_max.clone();
        self.custom_field = CustomField::Min;
        self.input_mode = InputMode::Editing;
    }

    pub fn custom_input_mut(&mut self) -> &mut String {
        match self.custom_field {
            CustomField::Min => &mut self.custom_min_input,
            CustomField::Max => &mut self.custom_max_input,
        }
    }

    pub fn toggle_custom_field(&mut self) {
        self.custom_field = match self.custom_field {
            CustomField::Min => CustomField::Max,
            CustomField::Max => CustomField::Min,
        };
    }

    pub fn apply_custom_range(&mut self) {
        self.custom_min = std::mem::take(&mut self.custom_min_input);
        self.custom_max = std::mem::take(&mut self.custom_max_input);
        self.range_preset = RangePreset::Custom;
        self.input_mode = InputMode::Normal;

        let range = self.resolve_range();
        self.session
            .set_status(format!("النطاق: من صفحة {} إلى {}", range.min, range.max));
    }

    pub fn cancel_custom_range(&mut self) {
        self.custom_min_input.clear();
        self.custom_max_input.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Remember the current selection for the next run
    pub fn save_selection(&self, config: &mut Config) {
        config.mode = Some(self.mode.as_str().to_string());
        config.range = Some(self.range_preset.as_str().to_string());
        config.custom_min = Some(self.custom_min.clone());
        config.custom_max = Some(self.custom_max.clone());
        config.timer_seconds = Some(self.timer_secs);

        if let Err(e) = config.save() {
            warn!(error = %e, "could not save config");
        }
    }
}
