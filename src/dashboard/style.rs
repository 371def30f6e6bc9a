//! Color scheme and styles, grounded on the prior generation's `Theme`/
//! `Styles` split, with the health/severity palette the ES dashboard needs
//! in place of the process-monitor's diff-highlight palette.

use ratatui::style::{Color, Modifier, Style};

use crate::derive::{Category, Severity};
use crate::model::HealthStatus;

pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Reset;
    pub const HEADER_BG: Color = Color::Blue;
    pub const SELECTED_BG: Color = Color::DarkGray;

    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const HEADER_FG: Color = Color::White;

    pub const HEALTH_GREEN: Color = Color::Green;
    pub const HEALTH_YELLOW: Color = Color::Yellow;
    pub const HEALTH_RED: Color = Color::Red;

    pub const WARNING: Color = Color::Yellow;
    pub const CRITICAL: Color = Color::Red;

    pub const TAB_ACTIVE: Color = Color::Cyan;
    pub const TAB_INACTIVE: Color = Color::DarkGray;
}

pub struct Styles;

impl Styles {
    pub fn default() -> Style {
        Style::default().fg(Theme::FG).bg(Theme::BG)
    }

    pub fn header() -> Style {
        Style::default().fg(Theme::HEADER_FG).bg(Theme::HEADER_BG).add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default().bg(Theme::SELECTED_BG).add_modifier(Modifier::BOLD)
    }

    pub fn table_header() -> Style {
        Style::default().fg(Theme::HEADER_FG).bg(Theme::HEADER_BG).add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default().fg(Theme::WARNING)
    }

    pub fn critical() -> Style {
        Style::default().fg(Theme::CRITICAL).add_modifier(Modifier::BOLD)
    }

    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn tab_active() -> Style {
        Style::default().fg(Theme::TAB_ACTIVE).add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive() -> Style {
        Style::default().fg(Theme::TAB_INACTIVE)
    }

    pub fn filter_input() -> Style {
        Style::default().fg(Theme::FG).add_modifier(Modifier::UNDERLINED)
    }

    pub fn help() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn help_key() -> Style {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    }

    pub fn health(status: HealthStatus) -> Style {
        match status {
            HealthStatus::Green => Style::default().fg(Theme::HEALTH_GREEN).add_modifier(Modifier::BOLD),
            HealthStatus::Yellow => Style::default().fg(Theme::HEALTH_YELLOW).add_modifier(Modifier::BOLD),
            HealthStatus::Red => Style::default().fg(Theme::HEALTH_RED).add_modifier(Modifier::BOLD),
            HealthStatus::Unknown => Style::default().fg(Theme::FG_DIM),
        }
    }

    pub fn severity(sev: Severity) -> Style {
        match sev {
            Severity::Warning => Self::warning(),
            Severity::Critical => Self::critical(),
        }
    }

    pub fn category_label(cat: Category) -> &'static str {
        match cat {
            Category::Resource => "resource",
            Category::Shard => "shard",
            Category::IndexConfig => "index",
            Category::Hotspot => "hotspot",
        }
    }
}
