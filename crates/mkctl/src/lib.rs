mod macros;

pub mod wm;

/// Control socket the overlay listens on for `show`, `hide` and `reload`.
pub const SOCKET_PATH: &str = "/tmp/mkmenu.sock";
