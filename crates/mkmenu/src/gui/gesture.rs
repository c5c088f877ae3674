//! Press, drag and release handling for the marking menu.
//!
//! The controller never touches GTK. Every entry point returns a [`Reaction`]
//! telling the shell which timers to arm, whether to redraw and whether the
//! overlay is done. Timers and animation loops carry generation tokens, so a
//! callback that fires after its gesture was replaced is simply ignored.

use super::geometry::{Size, slot_from_drag};
use super::menu::{AnimationStep, FADE_IN, GHOST_FADE, Ghost, Measure, Menu};
use super::ray::Ray;
use crate::commands::{Dispatch, Disposal};
use crate::config::{Config, ContextKind, Modifiers, MouseButton};
use crate::locale::Locale;
use mkctl::wm::Point;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPress {
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub position: Point,
}

impl PointerPress {
    pub fn new(button: MouseButton, modifiers: Modifiers, position: Point) -> Self {
        Self {
            button,
            modifiers,
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerRelease {
    pub button: MouseButton,
    pub position: Point,
}

impl PointerRelease {
    pub fn new(button: MouseButton, position: Point) -> Self {
        Self { button, position }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pressed,
    Popped,
}

/// A popup delay to arm. Hand it back to [`GestureController::popup_elapsed`]
/// once `delay` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupTimer {
    pub generation: u64,
    pub delay: Duration,
}

/// An animation loop to run. Tick it with [`GestureController::tick`] until
/// it stops reporting [`AnimationStep::Running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Fade { context: ContextKind, generation: u64 },
    Ghost { generation: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reaction {
    pub redraw: bool,
    pub popup: Option<PopupTimer>,
    pub animation: Option<Animation>,
    /// The overlay has nothing left to show.
    pub dismiss: bool,
}

impl Reaction {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    fn dismiss() -> Self {
        Self {
            redraw: true,
            dismiss: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    context: ContextKind,
    /// Where the button went down.
    origin: Point,
    /// Clamped menu center.
    anchor: Point,
    popped: bool,
    timer: u64,
}

impl Session {
    /// Drags are measured from the menu once it is visible.
    fn drag_origin(&self) -> Point {
        if self.popped { self.anchor } else { self.origin }
    }
}

pub struct GestureController {
    config: Arc<Config>,
    menus: HashMap<ContextKind, Menu>,
    ray: Ray,
    session: Option<Session>,
    ghost: Option<(u64, Ghost)>,
    timers: u64,
    ghosts: u64,
    suppress_context_menu: bool,
}

fn build_menus(
    config: &Config,
    locale: &dyn Locale,
    measure: &dyn Measure,
) -> HashMap<ContextKind, Menu> {
    ContextKind::iter()
        .map(|ctx| (ctx, Menu::new(config, ctx, locale, measure)))
        .collect()
}

impl GestureController {
    pub fn new(config: Arc<Config>, locale: &dyn Locale, measure: &dyn Measure) -> Self {
        Self {
            menus: build_menus(&config, locale, measure),
            ray: Ray::new(&config.ray),
            config,
            session: None,
            ghost: None,
            timers: 0,
            ghosts: 0,
            suppress_context_menu: false,
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        match self.session {
            None => Phase::Idle,
            Some(s) if s.popped => Phase::Popped,
            Some(_) => Phase::Pressed,
        }
    }

    pub fn menu(&self, context: ContextKind) -> Option<&Menu> {
        self.menus.get(&context)
    }

    /// The menu currently on screen, if any.
    pub fn displayed_menu(&self) -> Option<&Menu> {
        self.session
            .and_then(|s| self.menus.get(&s.context))
            .filter(|m| m.is_displayed())
    }

    pub fn ghost(&self) -> Option<&Ghost> {
        self.ghost.as_ref().map(|(_, g)| g)
    }

    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    pub fn ray_mut(&mut self) -> &mut Ray {
        &mut self.ray
    }

    /// Generation of the popup timer the current gesture is waiting on.
    pub fn pending_popup(&self) -> Option<u64> {
        self.session.filter(|s| !s.popped).map(|s| s.timer)
    }

    fn arm_popup(&mut self) -> PopupTimer {
        self.timers += 1;
        if let Some(session) = self.session.as_mut() {
            session.timer = self.timers;
        }
        PopupTimer {
            generation: self.timers,
            delay: self.config.popup_delay(),
        }
    }

    fn detach_all(&mut self) {
        if let Some(session) = self.session.take()
            && let Some(menu) = self.menus.get_mut(&session.context)
        {
            menu.highlight(None);
            menu.hide();
            menu.detach();
        }
        self.ray.detach();
    }

    pub fn press(
        &mut self,
        press: &PointerPress,
        has_selection: bool,
        viewport: Size,
    ) -> Reaction {
        if press.button != self.config.mouse_button
            || !self.config.modifier.is_held(press.modifiers)
        {
            return Reaction::default();
        }
        if self.session.is_some() {
            log::debug!("Press during an active gesture, starting over");
            self.detach_all();
        }

        let context = ContextKind::resolve(has_selection);
        let Some(menu) = self.menus.get_mut(&context) else {
            return Reaction::default();
        };
        let anchor = menu.bounds().clamp_anchor(press.position, viewport);
        menu.set_offset(anchor.x, anchor.y);
        menu.highlight(None);
        menu.hide();
        menu.attach();
        self.ray.attach();

        log::debug!("Gesture started in {} context at {:?}", context, press.position);
        self.session = Some(Session {
            context,
            origin: press.position,
            anchor,
            popped: false,
            timer: 0,
        });
        Reaction {
            popup: Some(self.arm_popup()),
            ..Reaction::redraw()
        }
    }

    pub fn motion(&mut self, position: Point) -> Reaction {
        let Some(session) = self.session else {
            return Reaction::default();
        };
        // keep postponing the popup while the pointer moves
        let popup = (!session.popped).then(|| self.arm_popup());

        let origin = session.drag_origin();
        let slot = slot_from_drag(position.x - origin.x, position.y - origin.y);
        if let Some(menu) = self.menus.get_mut(&session.context) {
            menu.highlight(slot);
        }
        self.ray.update(origin, position);

        Reaction {
            popup,
            ..Reaction::redraw()
        }
    }

    pub fn popup_elapsed(&mut self, timer: PopupTimer, now: Instant) -> Reaction {
        let Some(session) = self.session.as_mut() else {
            return Reaction::default();
        };
        if session.popped || session.timer != timer.generation {
            return Reaction::default();
        }
        session.popped = true;
        let context = session.context;

        let Some(menu) = self.menus.get_mut(&context) else {
            return Reaction::default();
        };
        let animation = if self.config.animation {
            let generation = menu.fade_in(now, FADE_IN, None);
            Some(Animation::Fade {
                context,
                generation,
            })
        } else {
            let generation = menu.fade_in(now, Duration::ZERO, None);
            menu.tick(generation, now);
            None
        };
        log::debug!("Menu popped at {:?}", menu.anchor());

        Reaction {
            animation,
            ..Reaction::redraw()
        }
    }

    pub fn release(
        &mut self,
        release: &PointerRelease,
        dispatcher: &mut dyn Dispatch,
        now: Instant,
    ) -> Reaction {
        let Some(session) = self.session else {
            return Reaction::default();
        };
        if release.button != self.config.mouse_button {
            return Reaction::default();
        }

        let Some(menu) = self.menus.get(&session.context) else {
            self.detach_all();
            return Reaction::dismiss();
        };
        let Some(slot) = menu.highlighted() else {
            if session.popped {
                self.suppress_context_menu = true;
            }
            self.detach_all();
            return Reaction::dismiss();
        };
        // a flick pops the menu where it was released
        let ghost_at = (!session.popped).then_some(release.position);
        self.suppress_context_menu = true;

        let Some(command) = menu.command(slot) else {
            log::debug!("Released on empty slot {}", slot);
            self.detach_all();
            return Reaction::dismiss();
        };
        let ghost = menu.ghost(ghost_at, self.config.hide_delay(), GHOST_FADE, now);

        log::info!("Running '{}' from slot {}", command, slot);
        let outcome = dispatcher.dispatch(command, &self.config, release);
        self.detach_all();

        match outcome {
            Err(e) => {
                log::error!("Command '{}' failed: {}", command, e);
                Reaction::dismiss()
            }
            Ok(Disposal::Immediate) => Reaction::dismiss(),
            Ok(Disposal::Linger) => match ghost.filter(|_| self.config.animation) {
                Some(ghost) => {
                    self.ghosts += 1;
                    self.ghost = Some((self.ghosts, ghost));
                    Reaction {
                        animation: Some(Animation::Ghost {
                            generation: self.ghosts,
                        }),
                        ..Reaction::redraw()
                    }
                }
                None => Reaction::dismiss(),
            },
        }
    }

    /// Called when the platform is about to open its own context menu.
    /// Returns whether to swallow it; this happens once per popped gesture.
    pub fn context_menu(&mut self) -> bool {
        std::mem::take(&mut self.suppress_context_menu)
    }

    pub fn tick(&mut self, animation: Animation, now: Instant) -> (AnimationStep, Reaction) {
        match animation {
            Animation::Fade {
                context,
                generation,
            } => {
                let step = self
                    .menus
                    .get_mut(&context)
                    .map_or(AnimationStep::Stale, |m| m.tick(generation, now));
                let reaction = match step {
                    AnimationStep::Stale => Reaction::default(),
                    _ => Reaction::redraw(),
                };
                (step, reaction)
            }
            Animation::Ghost { generation } => {
                let Some((_, ghost)) = self.ghost.as_mut().filter(|(g, _)| *g == generation)
                else {
                    return (AnimationStep::Stale, Reaction::default());
                };
                match ghost.tick(now) {
                    AnimationStep::Finished => {
                        self.ghost = None;
                        // a new gesture may already own the overlay
                        let reaction = if self.session.is_some() {
                            Reaction::redraw()
                        } else {
                            Reaction::dismiss()
                        };
                        (AnimationStep::Finished, reaction)
                    }
                    step => (step, Reaction::redraw()),
                }
            }
        }
    }

    /// Abandons the gesture and any lingering ghost.
    pub fn cancel(&mut self) -> Reaction {
        self.detach_all();
        self.ghost = None;
        Reaction::dismiss()
    }

    /// Rebuilds every menu from a freshly loaded configuration.
    pub fn reconfigure(&mut self, config: Arc<Config>, locale: &dyn Locale, measure: &dyn Measure) {
        self.cancel();
        self.menus = build_menus(&config, locale, measure);
        self.ray = Ray::new(&config.ray);
        self.config = config;
        self.suppress_context_menu = false;
    }
}
