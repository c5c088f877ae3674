use mkmenu::commands::ChannelHost;
use mkmenu::config;
use mkmenu::gui::app::AppModel;
use mkmenu::sys::runtime;
use relm4::prelude::*;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let config = Arc::new(config::load_or_default());
    let shared = config::share(config.clone());

    let (tx, rx) = async_channel::bounded(32);
    let (host_tx, host_rx) = async_channel::bounded(8);

    // Start Background Services
    runtime::start_background_services(tx, host_rx, shared.clone());

    let app = RelmApp::new("org.mkmenu.overlay");

    app.run::<AppModel>((config, shared, ChannelHost::new(host_tx), rx));
}
