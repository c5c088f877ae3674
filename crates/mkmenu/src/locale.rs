use std::collections::HashMap;

pub trait Locale {
    /// Message for `id` with `$1`..`$9` replaced by `substitutions`.
    /// Unknown ids yield an empty string.
    fn lookup(&self, id: &str, substitutions: &[&str]) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
    ("cmdTop", "Top"),
    ("cmdBottom", "Bottom"),
    ("cmdHome", "Home"),
    ("cmdBack", "Back"),
    ("cmdForward", "Forward"),
    ("cmdNewWindow", "New Window"),
    ("cmdNewTab", "New Tab"),
    ("cmdNextTab", "Next Tab"),
    ("cmdPrevTab", "Previous Tab"),
    ("cmdSearch", "Search #$1"),
    ("cmdCopyAlt", "Copy Alt Text"),
    ("cmdCopyImg", "Copy Image"),
    ("cmdViewImg", "View Image"),
    ("cmdSaveImg", "Save Image"),
    ("cmdCopyImgLoc", "Copy Image Location"),
    ("cmdViewImgInfo", "View Image Info"),
    ("cmdSendImg", "Send Image"),
    ("cmdBookmark", "Bookmark Link"),
    ("cmdCopyLinkText", "Copy Link Text"),
    ("cmdOpenNewTab", "Open in New Tab"),
    ("cmdOpenNewWin", "Open in New Window"),
    ("cmdSaveLink", "Save Link"),
    ("cmdCopyLink", "Copy Link"),
    ("cmdSendLink", "Send Link"),
    ("cmdSelectLink", "Select Link"),
    ("cmdSubmitNewTab", "Submit in New Tab"),
    ("cmdSubmitNewWin", "Submit in New Window"),
    ("cmdCopySubmitLoc", "Copy Form Location"),
    ("cmdAddSearch", "Add as Search Engine"),
    ("cmdNoop", "Nothing"),
];

#[derive(Debug, Clone)]
pub struct Messages {
    table: HashMap<&'static str, &'static str>,
}

impl Messages {
    pub fn english() -> Self {
        Self {
            table: ENGLISH.iter().copied().collect(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::english()
    }
}

impl Locale for Messages {
    fn lookup(&self, id: &str, substitutions: &[&str]) -> String {
        let Some(template) = self.table.get(id) else {
            return String::new();
        };
        // highest index first so `$1` does not eat the front of `$10`
        substitutions
            .iter()
            .enumerate()
            .take(9)
            .rev()
            .fold(template.to_string(), |msg, (i, sub)| {
                msg.replace(&format!("${}", i + 1), sub)
            })
    }
}
