use crate::commands::Request;
use crate::config::SharedConfig;
use crate::events::AppEvent;
use async_channel::{Receiver, Sender};
use std::thread;
use tokio::runtime::Runtime;

pub fn start_background_services(
    tx: Sender<AppEvent>,
    requests: Receiver<Request>,
    config: SharedConfig,
) {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create Tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::sys::server::run_server(tx).await;
                });
            }

            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::config::run_async_watcher(tx).await;
                });
            }

            tokio::spawn(async move {
                crate::sys::host::run_host(requests, config).await;
            });

            std::future::pending::<()>().await;
        });
    });
}
