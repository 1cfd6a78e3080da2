use clap::ValueEnum;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Colors the renderer pulls from; one per theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub cursor_bg: Color,
    pub time: Color,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: Color::Rgb(17, 24, 39),
                text: Color::White,
                muted: Color::Rgb(156, 163, 175),
                accent: Color::Rgb(96, 165, 250),
                correct: Color::Rgb(74, 222, 128),
                incorrect: Color::Rgb(248, 113, 113),
                cursor_bg: Color::Rgb(55, 65, 81),
                time: Color::Rgb(192, 132, 252),
            },
            Theme::Light => Palette {
                background: Color::Rgb(248, 250, 252),
                text: Color::Rgb(17, 24, 39),
                muted: Color::Rgb(107, 114, 128),
                accent: Color::Rgb(59, 130, 246),
                correct: Color::Rgb(34, 197, 94),
                incorrect: Color::Rgb(239, 68, 68),
                cursor_bg: Color::Rgb(229, 231, 235),
                time: Color::Rgb(168, 85, 247),
            },
        }
    }
}
