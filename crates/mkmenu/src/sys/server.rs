use crate::events::AppEvent;
use async_channel::Sender;
use mkctl::SOCKET_PATH;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;

fn parse_line(line: &str) -> Option<AppEvent> {
    match line.trim() {
        "show" => Some(AppEvent::Show),
        "hide" => Some(AppEvent::Hide),
        "reload" => Some(AppEvent::ConfigReload),
        _ => None,
    }
}

pub async fn run_server(tx: Sender<AppEvent>) {
    // Cleanup old socket if it exists
    if fs_err::metadata(SOCKET_PATH).is_ok() {
        let _ = fs_err::remove_file(SOCKET_PATH);
    }

    let listener = match UnixListener::bind(SOCKET_PATH) {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind unix socket: {}", e);
            return;
        }
    };
    log::debug!("Listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(&mut stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        match parse_line(&line) {
                            Some(event) => {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            None => log::warn!("Ignoring unknown control command '{}'", line),
                        }
                    }
                });
            }
            Err(e) => {
                log::error!("Failed to accept connection: {}", e);
            }
        }
    }
}
