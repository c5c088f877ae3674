//! Executes host requests sent by commands. Requests are handled one at a
//! time in arrival order; a failure is logged and never reported back.

use crate::commands::Request;
use crate::config::{Config, SharedConfig};
use async_channel::Receiver;
use mkctl::wm::ShellCommand;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("No search engine at index {0}")]
    UnknownEngine(usize),
    #[error("No action configured for '{0}'")]
    EmptyTemplate(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: ShellCommand,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Shell command that carries out `request` under `config`.
pub fn resolve(request: &Request, config: &Config) -> Result<ShellCommand, HostError> {
    let actions = &config.actions;
    let (name, command) = match request {
        Request::ScrollTop => ("scroll_top", actions.scroll_top.clone()),
        Request::ScrollBottom => ("scroll_bottom", actions.scroll_bottom.clone()),
        Request::Back => ("back", actions.back.clone()),
        Request::Forward => ("forward", actions.forward.clone()),
        Request::Home => ("home", actions.home.clone()),
        Request::NewWindow => ("new_window", actions.new_window.clone()),
        Request::NewTab => ("new_tab", actions.new_tab.clone()),
        Request::NextTab => ("next_tab", actions.next_tab.clone()),
        Request::PrevTab => ("prev_tab", actions.prev_tab.clone()),
        Request::Search { engine, keyword } => {
            let engine = config
                .search_engine(*engine)
                .filter(|e| !e.url.trim().is_empty())
                .ok_or(HostError::UnknownEngine(*engine))?;
            let url = engine.url.replace("%s", &urlencoding::encode(keyword));
            ("open_url", actions.open_url.expand(&url))
        }
    };

    if command.trim().is_empty() {
        return Err(HostError::EmptyTemplate(name));
    }
    Ok(command)
}

async fn execute(command: &ShellCommand) -> Result<(), HostError> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command.as_str())
        .output()
        .await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(HostError::Failed {
            command: command.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

pub async fn run_host(requests: Receiver<Request>, config: SharedConfig) {
    while let Ok(request) = requests.recv().await {
        let current = config.read().clone();
        let result = match resolve(&request, &current) {
            Ok(command) => {
                log::debug!("Running '{}' for {:?}", command, request);
                execute(&command).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => log::debug!("Host handled {:?}", request),
            Err(e) => log::error!("Host request {:?} failed: {}", request, e),
        }
    }
    log::debug!("Host request channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_actions() {
        let config = Config::default();
        assert_eq!(
            resolve(&Request::NewTab, &config).unwrap().as_str(),
            "hyprctl dispatch sendshortcut CTRL, T, activewindow"
        );
        assert_eq!(
            resolve(&Request::PrevTab, &config).unwrap().as_str(),
            "hyprctl dispatch sendshortcut CTRL SHIFT, Tab, activewindow"
        );
    }

    #[test]
    fn search_encodes_and_quotes_the_url() {
        let config = Config::default();
        let request = Request::Search {
            engine: 1,
            keyword: "rust & 'lifetimes'".to_string(),
        };
        let command = resolve(&request, &config).unwrap();
        let words = shell_words::split(command.as_str()).unwrap();
        assert_eq!(
            words,
            vec![
                "xdg-open".to_string(),
                "https://www.google.com/search?q=rust%20%26%20%27lifetimes%27".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_engine_is_an_error() {
        let mut config = Config::default();
        config.search_engines.truncate(2);
        config.search_engines[1].url.clear();
        for engine in [1, 5] {
            let request = Request::Search {
                engine,
                keyword: "x".to_string(),
            };
            assert!(matches!(
                resolve(&request, &config),
                Err(HostError::UnknownEngine(e)) if e == engine
            ));
        }
    }

    #[test]
    fn empty_template_is_an_error() {
        let mut config = Config::default();
        config.actions.home = ShellCommand::from("  ");
        assert!(matches!(
            resolve(&Request::Home, &config),
            Err(HostError::EmptyTemplate("home"))
        ));
    }

    #[tokio::test]
    async fn execute_reports_exit_status() {
        assert!(execute(&ShellCommand::from("true")).await.is_ok());
        let err = execute(&ShellCommand::from("echo oops >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            HostError::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
