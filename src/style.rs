#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseStyle {
    #[default]
    Default,
    Concierge,
    TourGuide,
    Friendly,
    Family,
}

impl ResponseStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStyle::Default => "default",
            ResponseStyle::Concierge => "concierge",
            ResponseStyle::TourGuide => "tourguide",
            ResponseStyle::Friendly => "friendly",
            ResponseStyle::Family => "family",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" => Some(ResponseStyle::Default),
            "concierge" => Some(ResponseStyle::Concierge),
            "tourguide" => Some(ResponseStyle::TourGuide),
            "friendly" => Some(ResponseStyle::Friendly),
            "family" => Some(ResponseStyle::Family),
            _ => None,
        }
    }

    pub fn all() -> Vec<ResponseStyle> {
        vec![
            ResponseStyle::Default,
            ResponseStyle::Concierge,
            ResponseStyle::TourGuide,
            ResponseStyle::Friendly,
            ResponseStyle::Family,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResponseStyle::Default => "Default",
            ResponseStyle::Concierge => "Concierge (polished)",
            ResponseStyle::TourGuide => "Tour Guide (detailed)",
            ResponseStyle::Friendly => "Friendly (casual)",
            ResponseStyle::Family => "Family (kid-friendly)",
        }
    }
}
