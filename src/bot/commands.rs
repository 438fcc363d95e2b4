use regex::Regex;
use std::sync::LazyLock;

use super::telegram::ReplyMarkup;

pub const BUTTON_PRODUCTS: &str = "📦 My products";
pub const BUTTON_SITES: &str = "🏪 My sites";
pub const BUTTON_ADD_PRODUCT: &str = "➕ Add product";
pub const BUTTON_ADD_SITE: &str = "➕ Add site";
pub const BUTTON_CHECK: &str = "🔍 Check now";
pub const BUTTON_SETTINGS: &str = "⚙️ Settings";

// "/name", "/name@BotName" and an optional argument tail
static COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^/([A-Za-z_]+)(?:@\w+)?(?:\s+(.*))?$").expect("command pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
    Settings,
    Cancel,
    /// 1-based list position, `None` when missing or not a number
    DeleteProduct(Option<usize>),
    DeleteSite(Option<usize>),
    ShowProducts,
    ShowSites,
    AddProduct,
    AddSite,
    Unknown(String),
    Text(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        match input {
            BUTTON_PRODUCTS => return Self::ShowProducts,
            BUTTON_SITES => return Self::ShowSites,
            BUTTON_ADD_PRODUCT => return Self::AddProduct,
            BUTTON_ADD_SITE => return Self::AddSite,
            BUTTON_CHECK => return Self::Check,
            BUTTON_SETTINGS => return Self::Settings,
            _ => {}
        }

        let Some(captures) = COMMAND_REGEX.captures(input) else {
            return Self::Text(input.to_string());
        };
        let argument = captures
            .get(2)
            .and_then(|m| m.as_str().split_whitespace().next())
            .and_then(|arg| arg.parse::<usize>().ok());

        match captures[1].to_lowercase().as_str() {
            "start" => Self::Start,
            "check" => Self::Check,
            "settings" => Self::Settings,
            "cancel" => Self::Cancel,
            "delete_product" => Self::DeleteProduct(argument),
            "delete_site" => Self::DeleteSite(argument),
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Free text is the only input a dialogue step consumes.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

pub fn main_keyboard() -> ReplyMarkup {
    ReplyMarkup::keyboard(&[
        &[BUTTON_PRODUCTS, BUTTON_SITES],
        &[BUTTON_ADD_PRODUCT, BUTTON_ADD_SITE],
        &[BUTTON_CHECK, BUTTON_SETTINGS],
    ])
}
