//! Commands bound to menu slots, and the channel they use to reach the
//! background host.

use crate::config::Config;
use crate::gui::gesture::PointerRelease;
use async_channel::{Sender, TrySendError};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum Command {
    #[strum(to_string = "top")]
    Top,
    #[strum(to_string = "bottom")]
    Bottom,
    #[strum(to_string = "home")]
    Home,
    #[strum(to_string = "back")]
    Back,
    #[strum(to_string = "forward")]
    Forward,
    #[strum(to_string = "new-window")]
    NewWindow,
    #[strum(to_string = "new-tab")]
    NewTab,
    #[strum(to_string = "next-tab")]
    NextTab,
    #[strum(to_string = "prev-tab")]
    PrevTab,
    /// Search the selection with the engine at this index.
    #[strum(to_string = "search")]
    Search(u8),
    #[strum(to_string = "copy-alt")]
    CopyAlt,
    #[strum(to_string = "copy-img")]
    CopyImg,
    #[strum(to_string = "view-img")]
    ViewImg,
    #[strum(to_string = "save-img")]
    SaveImg,
    #[strum(to_string = "copy-img-loc")]
    CopyImgLoc,
    #[strum(to_string = "view-img-info")]
    ViewImgInfo,
    #[strum(to_string = "send-img")]
    SendImg,
    #[strum(to_string = "bookmark")]
    Bookmark,
    #[strum(to_string = "copy-link-text")]
    CopyLinkText,
    #[strum(to_string = "open-new-tab")]
    OpenNewTab,
    #[strum(to_string = "open-new-win")]
    OpenNewWin,
    #[strum(to_string = "save-link")]
    SaveLink,
    #[strum(to_string = "copy-link")]
    CopyLink,
    #[strum(to_string = "send-link")]
    SendLink,
    #[strum(to_string = "select-link")]
    SelectLink,
    #[strum(to_string = "submit-new-tab")]
    SubmitNewTab,
    #[strum(to_string = "submit-new-win")]
    SubmitNewWin,
    #[strum(to_string = "copy-submit-loc")]
    CopySubmitLoc,
    #[strum(to_string = "add-search")]
    AddSearch,
    /// Placeholder for ids that no longer resolve to anything.
    #[strum(to_string = "noop")]
    Noop,
}

pub const SEARCH_SLOTS: u8 = 8;

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(engine) => write!(f, "search-{}", engine),
            other => f.write_str(<&'static str>::from(other)),
        }
    }
}

impl Command {
    /// Accepts `new-tab` as well as the older `cmdNewTab` spelling.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        if let Some(engine) = parse_search(id) {
            return Some(Self::Search(engine));
        }
        Self::iter()
            .filter(|c| !matches!(c, Self::Search(_)))
            .find(|c| {
                c.to_string().eq_ignore_ascii_case(id) || c.message_id().eq_ignore_ascii_case(id)
            })
    }

    /// Key into the message table for this command's label.
    pub fn message_id(&self) -> &'static str {
        match self {
            Self::Top => "cmdTop",
            Self::Bottom => "cmdBottom",
            Self::Home => "cmdHome",
            Self::Back => "cmdBack",
            Self::Forward => "cmdForward",
            Self::NewWindow => "cmdNewWindow",
            Self::NewTab => "cmdNewTab",
            Self::NextTab => "cmdNextTab",
            Self::PrevTab => "cmdPrevTab",
            Self::Search(_) => "cmdSearch",
            Self::CopyAlt => "cmdCopyAlt",
            Self::CopyImg => "cmdCopyImg",
            Self::ViewImg => "cmdViewImg",
            Self::SaveImg => "cmdSaveImg",
            Self::CopyImgLoc => "cmdCopyImgLoc",
            Self::ViewImgInfo => "cmdViewImgInfo",
            Self::SendImg => "cmdSendImg",
            Self::Bookmark => "cmdBookmark",
            Self::CopyLinkText => "cmdCopyLinkText",
            Self::OpenNewTab => "cmdOpenNewTab",
            Self::OpenNewWin => "cmdOpenNewWin",
            Self::SaveLink => "cmdSaveLink",
            Self::CopyLink => "cmdCopyLink",
            Self::SendLink => "cmdSendLink",
            Self::SelectLink => "cmdSelectLink",
            Self::SubmitNewTab => "cmdSubmitNewTab",
            Self::SubmitNewWin => "cmdSubmitNewWin",
            Self::CopySubmitLoc => "cmdCopySubmitLoc",
            Self::AddSearch => "cmdAddSearch",
            Self::Noop => "cmdNoop",
        }
    }

    /// Runs the command. `Disposal` tells the caller whether to play the
    /// confirmation ghost.
    pub fn run(self, cx: &mut CommandContext<'_>) -> Result<Disposal, CommandError> {
        use Disposal::*;

        match self {
            Self::Top => cx.send(Request::ScrollTop, Linger),
            Self::Bottom => cx.send(Request::ScrollBottom, Linger),
            Self::Home => cx.send(Request::Home, Linger),
            Self::Back => cx.send(Request::Back, Linger),
            Self::Forward => cx.send(Request::Forward, Linger),
            Self::NewWindow => cx.send(Request::NewWindow, Linger),
            // these move focus elsewhere, nothing would see the ghost
            Self::NewTab => cx.send(Request::NewTab, Immediate),
            Self::NextTab => cx.send(Request::NextTab, Immediate),
            Self::PrevTab => cx.send(Request::PrevTab, Immediate),
            Self::Search(engine) => match cx.selection.filter(|s| !s.trim().is_empty()) {
                Some(keyword) => cx.send(
                    Request::Search {
                        engine: engine as usize,
                        keyword: keyword.to_string(),
                    },
                    Linger,
                ),
                None => Ok(Linger),
            },
            Self::Noop => Ok(Linger),
            Self::CopyAlt
            | Self::CopyImg
            | Self::ViewImg
            | Self::SaveImg
            | Self::CopyImgLoc
            | Self::ViewImgInfo
            | Self::SendImg
            | Self::Bookmark
            | Self::CopyLinkText
            | Self::OpenNewTab
            | Self::OpenNewWin
            | Self::SaveLink
            | Self::CopyLink
            | Self::SendLink
            | Self::SelectLink
            | Self::SubmitNewTab
            | Self::SubmitNewWin
            | Self::CopySubmitLoc
            | Self::AddSearch => Err(CommandError::Unsupported(self)),
        }
    }
}

fn parse_search(id: &str) -> Option<u8> {
    let lower = id.to_ascii_lowercase();
    let digits = lower
        .strip_prefix("search-")
        .or_else(|| lower.strip_prefix("cmdsearch"))?;
    digits.parse().ok().filter(|&n| n < SEARCH_SLOTS)
}

/// What to do with the menu once a command has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    /// Tear the overlay down right away.
    Immediate,
    /// Leave a fading copy of the chosen item behind.
    Linger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ScrollTop,
    ScrollBottom,
    Back,
    Forward,
    Home,
    NewWindow,
    NewTab,
    NextTab,
    PrevTab,
    Search { engine: usize, keyword: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Background host is not running")]
    HostDisconnected,
    #[error("Background host is busy")]
    HostBusy,
    #[error("'{0}' is not available")]
    Unsupported(Command),
}

/// Message channel to the background host. Sending never waits for the
/// request to complete.
pub trait Host {
    fn send(&self, request: Request) -> Result<(), CommandError>;
}

#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: Sender<Request>,
}

impl ChannelHost {
    pub fn new(tx: Sender<Request>) -> Self {
        Self { tx }
    }
}

impl Host for ChannelHost {
    fn send(&self, request: Request) -> Result<(), CommandError> {
        self.tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => CommandError::HostBusy,
            TrySendError::Closed(_) => CommandError::HostDisconnected,
        })
    }
}

pub struct CommandContext<'a> {
    pub config: &'a Config,
    pub event: &'a PointerRelease,
    pub selection: Option<&'a str>,
    pub host: &'a dyn Host,
}

impl CommandContext<'_> {
    fn send(&self, request: Request, disposal: Disposal) -> Result<Disposal, CommandError> {
        log::debug!("Sending {:?} to host", request);
        self.host.send(request)?;
        Ok(disposal)
    }
}

/// Runs a resolved command on behalf of the gesture controller.
pub trait Dispatch {
    fn dispatch(
        &mut self,
        command: Command,
        config: &Config,
        event: &PointerRelease,
    ) -> Result<Disposal, CommandError>;
}

/// Dispatches through the background host, with the selection captured
/// when the overlay was shown.
pub struct HostDispatcher<'a> {
    host: &'a dyn Host,
    selection: Option<&'a str>,
}

impl<'a> HostDispatcher<'a> {
    pub fn new(host: &'a dyn Host, selection: Option<&'a str>) -> Self {
        Self { host, selection }
    }
}

impl Dispatch for HostDispatcher<'_> {
    fn dispatch(
        &mut self,
        command: Command,
        config: &Config,
        event: &PointerRelease,
    ) -> Result<Disposal, CommandError> {
        let mut cx = CommandContext {
            config,
            event,
            selection: self.selection,
            host: self.host,
        };
        command.run(&mut cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MouseButton;
    use mkctl::wm::Point;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHost {
        sent: RefCell<Vec<Request>>,
    }

    impl Host for RecordingHost {
        fn send(&self, request: Request) -> Result<(), CommandError> {
            self.sent.borrow_mut().push(request);
            Ok(())
        }
    }

    fn release() -> PointerRelease {
        PointerRelease::new(MouseButton::Right, Point::new(10.0, 10.0))
    }

    fn run(
        command: Command,
        selection: Option<&str>,
        host: &dyn Host,
    ) -> Result<Disposal, CommandError> {
        let config = Config::default();
        let event = release();
        HostDispatcher::new(host, selection).dispatch(command, &config, &event)
    }

    #[test]
    fn ids_accept_both_spellings() {
        assert_eq!(Command::from_id("new-tab"), Some(Command::NewTab));
        assert_eq!(Command::from_id("cmdNewTab"), Some(Command::NewTab));
        assert_eq!(Command::from_id("CMDPREVTAB"), Some(Command::PrevTab));
        assert_eq!(Command::from_id("search-7"), Some(Command::Search(7)));
        assert_eq!(Command::from_id("cmdSearch0"), Some(Command::Search(0)));
        assert_eq!(Command::from_id("search-8"), None);
        assert_eq!(Command::from_id("search"), None);
        assert_eq!(Command::from_id("cmdTeleport"), None);
    }

    #[test]
    fn display_round_trips_through_from_id() {
        assert_eq!(Command::Search(0).to_string(), "search-0");
        assert_eq!(Command::NewWindow.to_string(), "new-window");
        for cmd in Command::iter().chain((0..SEARCH_SLOTS).map(Command::Search)) {
            assert_eq!(Command::from_id(&cmd.to_string()), Some(cmd), "{cmd}");
        }
    }

    #[test]
    fn tab_commands_dispose_immediately() {
        let host = RecordingHost::default();
        assert_eq!(run(Command::NewTab, None, &host), Ok(Disposal::Immediate));
        assert_eq!(run(Command::NextTab, None, &host), Ok(Disposal::Immediate));
        assert_eq!(run(Command::Top, None, &host), Ok(Disposal::Linger));
        assert_eq!(
            *host.sent.borrow(),
            vec![Request::NewTab, Request::NextTab, Request::ScrollTop]
        );
    }

    #[test]
    fn search_needs_a_selection() {
        let host = RecordingHost::default();
        assert_eq!(run(Command::Search(1), None, &host), Ok(Disposal::Linger));
        assert_eq!(run(Command::Search(1), Some("  "), &host), Ok(Disposal::Linger));
        assert!(host.sent.borrow().is_empty());

        assert_eq!(run(Command::Search(1), Some("rust"), &host), Ok(Disposal::Linger));
        assert_eq!(
            *host.sent.borrow(),
            vec![Request::Search {
                engine: 1,
                keyword: "rust".to_string()
            }]
        );
    }

    #[test]
    fn legacy_commands_report_unsupported() {
        let host = RecordingHost::default();
        assert_eq!(
            run(Command::CopyLink, None, &host),
            Err(CommandError::Unsupported(Command::CopyLink))
        );
        assert_eq!(run(Command::Noop, None, &host), Ok(Disposal::Linger));
        assert!(host.sent.borrow().is_empty());
    }

    #[test]
    fn channel_host_reports_closed_and_full() {
        let (tx, rx) = async_channel::bounded(1);
        let host = ChannelHost::new(tx);
        assert_eq!(host.send(Request::Home), Ok(()));
        assert_eq!(host.send(Request::Back), Err(CommandError::HostBusy));
        drop(rx);
        assert_eq!(host.send(Request::Back), Err(CommandError::HostDisconnected));
    }
}
