use crate::commands::{ChannelHost, HostDispatcher};
use crate::config::{self, Config, Preferences, SharedConfig};
use crate::events::AppEvent;
use crate::gui::geometry::Size;
use crate::gui::gesture::{
    Animation, GestureController, PointerPress, PointerRelease, PopupTimer, Reaction,
};
use crate::gui::menu::{self, ANIMATION_TICK, AnimationStep, CairoMeasure};
use crate::gui::{theme, window};
use crate::locale::Messages;
use gdk4 as gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use mkctl::wm::{self, Point};
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

pub struct AppModel {
    pub controller: Rc<RefCell<GestureController>>,
    pub visible: bool,
    /// Primary selection captured when the overlay was shown.
    pub selection: Option<String>,
    pub shared: SharedConfig,
    pub host: ChannelHost,
    pub locale: Messages,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    pub ray_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Show,
    Hide,
    Selection(Option<String>),
    Press(PointerPress),
    Motion(Point),
    Release(PointerRelease),
    ContextMenu,
    PopupElapsed(PopupTimer),
    Dismiss,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show,
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

fn measure_for(config: &Config) -> CairoMeasure {
    CairoMeasure::new(config.font.primary_family(), config.font.size_px())
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        Arc<Config>,
        SharedConfig,
        ChannelHost,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("mkmenu"),
            #[watch]
            set_visible: model.visible,
            add_css_class: "mkmenu-window",
            set_decorated: false,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gdk::Key::Escape {
                        sender.input(AppMsg::Hide);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::Overlay {
                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                    add_css_class: "mkmenu-drawing-area",

                    add_controller = gtk::EventControllerMotion {
                        connect_motion[sender] => move |_, x, y| {
                            sender.input(AppMsg::Motion(Point::new(x, y)));
                        }
                    },

                    add_controller = gtk::GestureDrag {
                        set_button: 0, // Listen to all buttons
                        connect_drag_begin[sender] => move |gesture, x, y| {
                            if let Some(button) = window::pointer_button(gesture.current_button()) {
                                let modifiers = window::modifiers(gesture.current_event_state());
                                sender.input(AppMsg::Press(PointerPress::new(
                                    button,
                                    modifiers,
                                    Point::new(x, y),
                                )));
                            }
                        },
                        connect_drag_end[sender] => move |gesture, dx, dy| {
                            let Some(button) = window::pointer_button(gesture.current_button()) else {
                                return;
                            };
                            let Some(position) = window::drag_end(gesture.start_point(), dx, dy) else {
                                return;
                            };
                            sender.input(AppMsg::Release(PointerRelease::new(button, position)));
                            if button == config::MouseButton::Right {
                                sender.input(AppMsg::ContextMenu);
                            }
                        }
                    }
                },

                // the ray clears its own stale pixels, so it gets its own layer
                add_overlay: ray_area = &gtk::DrawingArea {
                    set_can_target: false,
                    add_css_class: "mkmenu-drawing-area",
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, shared, host, rx) = init;

        theme::load_css();
        window::init_layer_shell(&root);

        let locale = Messages::english();
        let controller = GestureController::new(config.clone(), &locale, &measure_for(&config));

        let model = AppModel {
            controller: Rc::new(RefCell::new(controller)),
            visible: false,
            selection: None,
            shared,
            host,
            locale,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            ray_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.ray_area = widgets.ray_area.clone();

        let controller = model.controller.clone();
        widgets.drawing_area.set_draw_func(move |_, cr, _, _| {
            let controller = controller.borrow();
            if let Err(e) = menu::draw(cr, controller.displayed_menu(), controller.ghost()) {
                log::error!("Drawing error: {}", e);
            }
        });

        let controller = model.controller.clone();
        widgets.ray_area.set_draw_func(move |_, cr, _, _| {
            if let Err(e) = controller.borrow_mut().ray_mut().paint(cr) {
                log::error!("Drawing error: {}", e);
            }
        });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        root.set_visible(false);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Show => {
                if let Some(name) = wm::get_active_monitor() {
                    window::set_window_monitor(&self.root, &name);
                }
                self.selection = None;
                self.read_selection(&sender);
                self.visible = true;
                self.drawing_area.queue_draw();
                self.ray_area.queue_draw();
            }
            AppMsg::Hide => {
                let reaction = self.controller.borrow_mut().cancel();
                self.apply(reaction, &sender);
            }
            AppMsg::Selection(text) => {
                self.selection = text.filter(|s| !s.trim().is_empty());
            }
            AppMsg::Press(press) => {
                if !self.visible {
                    return;
                }
                let viewport = Size::new(
                    self.drawing_area.width() as f64,
                    self.drawing_area.height() as f64,
                );
                let reaction = self.controller.borrow_mut().press(
                    &press,
                    self.selection.is_some(),
                    viewport,
                );
                self.apply(reaction, &sender);
            }
            AppMsg::Motion(point) => {
                if !self.visible {
                    return;
                }
                let reaction = self.controller.borrow_mut().motion(point);
                self.apply(reaction, &sender);
            }
            AppMsg::Release(release) => {
                let mut dispatcher = HostDispatcher::new(&self.host, self.selection.as_deref());
                let reaction =
                    self.controller
                        .borrow_mut()
                        .release(&release, &mut dispatcher, Instant::now());
                self.apply(reaction, &sender);
            }
            AppMsg::ContextMenu => {
                if self.controller.borrow_mut().context_menu() {
                    log::debug!("Context menu suppressed after gesture");
                } else if self.controller.borrow().ghost().is_none() {
                    // nothing of ours is showing, let the click through
                    self.visible = false;
                }
            }
            AppMsg::PopupElapsed(timer) => {
                let reaction = self
                    .controller
                    .borrow_mut()
                    .popup_elapsed(timer, Instant::now());
                self.apply(reaction, &sender);
            }
            AppMsg::Dismiss => {
                self.visible = false;
            }
            AppMsg::ConfigReload => match Preferences::locate().and_then(|p| p.get()) {
                Ok(new_config) => {
                    let new_config = Arc::new(new_config);
                    *self.shared.write() = new_config.clone();
                    let measure = measure_for(&new_config);
                    self.controller
                        .borrow_mut()
                        .reconfigure(new_config, &self.locale, &measure);
                    self.drawing_area.queue_draw();
                    self.ray_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    fn read_selection(&self, sender: &ComponentSender<Self>) {
        let Some(display) = gdk::Display::default() else {
            return;
        };
        let clipboard = display.primary_clipboard();
        let sender = sender.clone();
        relm4::spawn_local(async move {
            let text = match clipboard.read_text_future().await {
                Ok(text) => text.map(|t| t.to_string()),
                Err(e) => {
                    log::debug!("No primary selection: {}", e);
                    None
                }
            };
            sender.input(AppMsg::Selection(text));
        });
    }

    fn apply(&mut self, reaction: Reaction, sender: &ComponentSender<Self>) {
        if let Some(timer) = reaction.popup {
            let sender = sender.clone();
            glib::timeout_add_local_once(timer.delay, move || {
                sender.input(AppMsg::PopupElapsed(timer));
            });
        }
        if let Some(animation) = reaction.animation {
            self.animate(animation, sender);
        }
        if reaction.redraw {
            self.drawing_area.queue_draw();
            self.ray_area.queue_draw();
        }
        if reaction.dismiss {
            self.visible = false;
        }
    }

    fn animate(&self, animation: Animation, sender: &ComponentSender<Self>) {
        let controller = self.controller.clone();
        let drawing_area = self.drawing_area.clone();
        let sender = sender.clone();
        glib::timeout_add_local(ANIMATION_TICK, move || {
            let (step, reaction) = controller.borrow_mut().tick(animation, Instant::now());
            if reaction.redraw {
                drawing_area.queue_draw();
            }
            if reaction.dismiss {
                sender.input(AppMsg::Dismiss);
            }
            match step {
                AnimationStep::Running => glib::ControlFlow::Continue,
                AnimationStep::Finished | AnimationStep::Stale => glib::ControlFlow::Break,
            }
        });
    }
}
