use super::SLOT_COUNT;
use crate::commands::Command;
use crate::config::{Config, ContextKind};
use crate::gui::color::{Color, Gradient};
use crate::gui::geometry::{
    self, Bounds, Direction, Rect, Size, ease_out, round_half_up, slot_position,
};
use crate::locale::Locale;
use mkctl::wm::Point;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

/// Measures label text in the item font. The menu adds padding and border.
pub trait Measure {
    fn text_size(&self, text: &str) -> Size;
}

/// Visual parameters shared by every item of a menu, parsed once from the
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuStyle {
    pub background: Gradient,
    pub foreground: Gradient,
    pub active_background: Color,
    pub active_foreground: Color,
    pub border_width: f64,
    /// Top, right, bottom, left.
    pub border_colors: [Color; 4],
    pub shadow: Option<Color>,
    pub opacity: f64,
    pub padding: [f64; 2],
    pub spacing: f64,
    pub font_family: String,
    pub font_size: f64,
}

impl MenuStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            background: Gradient::parse(&config.background),
            foreground: Gradient::parse(&config.foreground),
            active_background: Color::parse(&config.active_background),
            active_foreground: Color::parse(&config.active_foreground),
            border_width: config.border.width,
            border_colors: config.border.colors.each_ref().map(|c| Color::parse(c)),
            shadow: Some(config.shadow.trim())
                .filter(|s| !s.is_empty())
                .map(Color::parse),
            opacity: config.opacity.clamp(0.0, 1.0),
            padding: config.item_padding,
            spacing: config.item_spacing,
            font_family: config.font.primary_family().to_string(),
            font_size: config.font.size_px(),
        }
    }

    /// Outer box of an item whose label measures `text`.
    pub fn item_size(&self, text: Size) -> Size {
        let [pad_v, pad_h] = self.padding;
        Size::new(
            text.width + 2.0 * (pad_h + self.border_width),
            text.height + 2.0 * (pad_v + self.border_width),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuSlot {
    pub command: Option<Command>,
    pub label: String,
    pub size: Size,
    /// Top-left corner relative to the menu center.
    pub offset: Point,
    pub opacity: f64,
}

impl MenuSlot {
    fn empty() -> Self {
        Self {
            command: None,
            label: String::new(),
            size: Size::default(),
            offset: Point::default(),
            opacity: 1.0,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.command.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStep {
    Running,
    Finished,
    /// The loop belongs to an animation that has since been replaced.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    generation: u64,
    start: Instant,
    duration: Duration,
    slot: Option<Direction>,
}

fn progress(start: Instant, duration: Duration, now: Instant) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    now.saturating_duration_since(start).as_secs_f64() / duration.as_secs_f64()
}

/// The ring of eight items for one context. Built once per context and
/// reused for every gesture.
#[derive(Debug, Clone)]
pub struct Menu {
    context: ContextKind,
    style: MenuStyle,
    slots: Vec<MenuSlot>,
    bounds: Bounds,
    highlighted: Option<Direction>,
    anchor: Point,
    visible: bool,
    attached: bool,
    scale: f64,
    opacity: f64,
    fade: Option<Fade>,
    generation: u64,
}

impl Menu {
    pub fn new(
        config: &Config,
        context: ContextKind,
        locale: &dyn Locale,
        measure: &dyn Measure,
    ) -> Self {
        let mut menu = Self {
            context,
            style: MenuStyle::from_config(config),
            slots: vec![MenuSlot::empty(); SLOT_COUNT],
            bounds: Bounds::default(),
            highlighted: None,
            anchor: Point::default(),
            visible: false,
            attached: false,
            scale: 1.0,
            opacity: 1.0,
            fade: None,
            generation: 0,
        };

        let table = config.bindings.table(context);
        for slot in Direction::iter() {
            let command = table[slot.as_index()].0;
            // search slots are labelled with the engine name
            let label = match command {
                Some(Command::Search(engine)) if context == ContextKind::Text => config
                    .search_engine(engine as usize)
                    .map(|engine| engine.name.as_str())
                    .filter(|name| !name.is_empty()),
                _ => None,
            };
            menu.set_command(slot, command, label, locale);
        }
        menu.layout(measure);
        menu
    }

    /// Binds `command` to `slot`, or clears the slot when `command` is `None`.
    /// Without an explicit `label` the localized command name is shown.
    pub fn set_command(
        &mut self,
        slot: Direction,
        command: Option<Command>,
        label: Option<&str>,
        locale: &dyn Locale,
    ) {
        let item = &mut self.slots[slot.as_index()];
        item.command = command;
        item.label = match (command, label) {
            (None, _) => String::new(),
            (Some(_), Some(label)) => label.to_string(),
            (Some(Command::Search(engine)), None) => {
                locale.lookup("cmdSearch", &[&(engine + 1).to_string()])
            }
            (Some(cmd), None) => locale.lookup(cmd.message_id(), &[]),
        };
    }

    /// Measures every item and places it around the center, recomputing the
    /// bounds used for screen clamping.
    pub fn layout(&mut self, measure: &dyn Measure) {
        let mut bounds = Bounds::default();
        for slot in Direction::iter() {
            let item = &mut self.slots[slot.as_index()];
            let text = if item.is_bound() {
                measure.text_size(&item.label)
            } else {
                Size::default()
            };
            item.size = self.style.item_size(text);
            item.offset = slot_position(slot, item.size, self.style.spacing, Point::default());
            bounds.include(slot, item.offset, item.size);
        }
        self.bounds = bounds;
    }

    pub fn context(&self) -> ContextKind {
        self.context
    }

    pub fn style(&self) -> &MenuStyle {
        &self.style
    }

    pub fn slot(&self, slot: Direction) -> &MenuSlot {
        &self.slots[slot.as_index()]
    }

    pub fn slots(&self) -> impl Iterator<Item = (Direction, &MenuSlot)> {
        Direction::iter().zip(self.slots.iter())
    }

    pub fn command(&self, slot: Direction) -> Option<Command> {
        self.slot(slot).command
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn highlighted(&self) -> Option<Direction> {
        self.highlighted
    }

    /// Marks `slot` as active. Returns whether anything changed.
    pub fn highlight(&mut self, slot: Option<Direction>) -> bool {
        if self.highlighted == slot {
            return false;
        }
        self.highlighted = slot;
        true
    }

    /// Background and foreground of an item, taking the highlight into
    /// account.
    pub fn slot_colors(&self, slot: Direction) -> (Color, Color) {
        if self.highlighted == Some(slot) {
            (self.style.active_background, self.style.active_foreground)
        } else {
            (self.style.background.at(slot), self.style.foreground.at(slot))
        }
    }

    /// Item box in overlay coordinates at full scale.
    pub fn slot_rect(&self, slot: Direction) -> Rect {
        let item = self.slot(slot);
        Rect::new(
            self.anchor.offset(item.offset.x, item.offset.y),
            item.size,
        )
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.anchor = Point::new(x, y);
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Removes the menu from the overlay. Any running fade is abandoned.
    pub fn detach(&mut self) {
        self.attached = false;
        self.fade = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether anything of this menu should be painted.
    pub fn is_displayed(&self) -> bool {
        self.attached && self.visible
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whole-menu opacity including the configured base opacity.
    pub fn opacity(&self) -> f64 {
        self.opacity * self.style.opacity
    }

    /// Starts fading the whole menu (growing from nothing) or a single item
    /// in. The returned generation identifies this fade for [`Menu::tick`].
    pub fn fade_in(&mut self, now: Instant, duration: Duration, slot: Option<Direction>) -> u64 {
        self.generation += 1;
        match slot {
            Some(slot) => self.slots[slot.as_index()].opacity = 0.0,
            None => {
                self.scale = 0.0;
                self.opacity = 0.0;
            }
        }
        self.visible = true;
        self.fade = Some(Fade {
            generation: self.generation,
            start: now,
            duration,
            slot,
        });
        self.generation
    }

    /// Advances the fade started as `generation`.
    pub fn tick(&mut self, generation: u64, now: Instant) -> AnimationStep {
        let Some(fade) = self.fade.filter(|f| f.generation == generation) else {
            return AnimationStep::Stale;
        };

        let t = progress(fade.start, fade.duration, now);
        let u = ease_out(t);
        match fade.slot {
            Some(slot) => self.slots[slot.as_index()].opacity = u,
            None => {
                self.scale = u;
                self.opacity = u;
            }
        }

        if t < 1.0 {
            AnimationStep::Running
        } else {
            self.fade = None;
            AnimationStep::Finished
        }
    }

    /// Copies the highlighted item into a free-standing ghost. With `at` the
    /// ghost is centered there, otherwise it stays where the item is.
    pub fn ghost(
        &self,
        at: Option<Point>,
        delay: Duration,
        duration: Duration,
        now: Instant,
    ) -> Option<Ghost> {
        let slot = self.highlighted?;
        let item = self.slot(slot);
        let rect = match at {
            Some(p) => Rect::new(
                Point::new(
                    round_half_up(p.x - item.size.width / 2.0),
                    round_half_up(p.y - item.size.height / 2.0),
                ),
                item.size,
            ),
            None => self.slot_rect(slot),
        };
        let (background, foreground) = self.slot_colors(slot);

        Some(Ghost {
            slot,
            label: item.label.clone(),
            rect,
            background,
            foreground,
            style: self.style.clone(),
            opacity: 1.0,
            start: now,
            delay,
            duration,
        })
    }
}

/// A detached copy of the chosen item that lingers for `delay` and then fades
/// out over `duration`.
#[derive(Debug, Clone)]
pub struct Ghost {
    pub slot: Direction,
    pub label: String,
    pub rect: Rect,
    pub background: Color,
    pub foreground: Color,
    pub style: MenuStyle,
    opacity: f64,
    start: Instant,
    delay: Duration,
    duration: Duration,
}

impl Ghost {
    pub fn opacity(&self) -> f64 {
        self.opacity * self.style.opacity
    }

    pub fn tick(&mut self, now: Instant) -> AnimationStep {
        let elapsed = now.saturating_duration_since(self.start);
        if elapsed < self.delay {
            return AnimationStep::Running;
        }
        let t = progress(self.start + self.delay, self.duration, now);
        self.opacity = 1.0 - geometry::swing(t);
        if t < 1.0 {
            AnimationStep::Running
        } else {
            self.opacity = 0.0;
            AnimationStep::Finished
        }
    }
}
