pub mod commands;
pub mod config;
pub mod events;
pub mod locale;

pub mod gui {
    pub mod app;
    pub mod color;
    pub mod geometry;
    pub mod gesture;
    pub mod menu;
    pub mod ray;
    pub mod theme;
    pub mod window;
}

pub mod sys {
    pub mod host;
    pub mod runtime;
    pub mod server;
}
