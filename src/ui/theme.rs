//! cliclack theme

use cliclack::ThemeState;
use console::Style;

/// Orange accents for active prompts, green on submit
#[derive(Debug, Clone, Default)]
pub struct AwsmapTheme;

impl cliclack::Theme for AwsmapTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().color256(208),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel | ThemeState::Submit => Style::new().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().color256(208),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

pub fn init_theme() {
    cliclack::set_theme(AwsmapTheme);
}
