/// Debug panel overlay and keyboard mapping
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use galaxy_core::debug::{Button, Control};
use galaxy_core::{Command, ControlValue, Experience, ParamKey};

/// Orbit step per key press, in radians
const ORBIT_STEP: f32 = 0.15;
/// Zoom factor per key press
const ZOOM_STEP: f32 = 0.9;
/// Share of a control's range moved per `[` / `]` press
const NUDGE_FRACTION: f32 = 0.01;
/// Brightness change per nudge on colour controls
const COLOR_NUDGE: f32 = 0.1;

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Orbit { azimuth: f32, polar: f32 },
    Zoom(f32),
    Select(i32),
    Nudge(f32),
    Commit,
    TogglePanel,
    Regenerate,
    Quit,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('w') | KeyCode::Up => Action::Orbit {
                azimuth: 0.0,
                polar: ORBIT_STEP,
            },
            KeyCode::Char('s') | KeyCode::Down => Action::Orbit {
                azimuth: 0.0,
                polar: -ORBIT_STEP,
            },
            KeyCode::Char('a') | KeyCode::Left => Action::Orbit {
                azimuth: ORBIT_STEP,
                polar: 0.0,
            },
            KeyCode::Char('d') | KeyCode::Right => Action::Orbit {
                azimuth: -ORBIT_STEP,
                polar: 0.0,
            },
            KeyCode::Char('+') | KeyCode::Char('=') => Action::Zoom(ZOOM_STEP),
            KeyCode::Char('-') => Action::Zoom(1.0 / ZOOM_STEP),
            KeyCode::Tab => Action::Select(1),
            KeyCode::BackTab => Action::Select(-1),
            KeyCode::Char('[') => Action::Nudge(-1.0),
            KeyCode::Char(']') => Action::Nudge(1.0),
            KeyCode::Enter => Action::Commit,
            KeyCode::Char('h') => Action::TogglePanel,
            KeyCode::Char('r') => Action::Regenerate,
            _ => return None,
        };
        Some(action)
    }
}

/// A selectable panel row
#[derive(Debug, Clone, Copy)]
enum Entry<'a> {
    Control(&'a Control),
    Button(&'a Button),
}

/// Selectable rows in display order: each folder's controls, then its buttons
fn entries(experience: &Experience) -> impl Iterator<Item = Entry<'_>> {
    experience.debug.folders.iter().flat_map(|folder| {
        folder
            .controls
            .iter()
            .map(Entry::Control)
            .chain(folder.buttons.iter().map(Entry::Button))
    })
}

/// Which control or button the keyboard is pointing at
#[derive(Debug, Clone, Default)]
pub struct PanelCursor {
    selected: usize,
}

impl PanelCursor {
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, experience: &Experience, step: i32) {
        let count = entries(experience).count();
        if count == 0 {
            return;
        }
        let next = (self.selected as i64 + step as i64).rem_euclid(count as i64);
        self.selected = next as usize;
    }

    pub fn control<'a>(&self, experience: &'a Experience) -> Option<&'a Control> {
        match entries(experience).nth(self.selected)? {
            Entry::Control(control) => Some(control),
            Entry::Button(_) => None,
        }
    }

    /// Command of the selected button, if a button is selected
    pub fn button(&self, experience: &Experience) -> Option<Command> {
        match entries(experience).nth(self.selected)? {
            Entry::Button(button) => Some(button.command),
            Entry::Control(_) => None,
        }
    }

    /// Value the selected control would move to after one nudge
    pub fn nudged(&self, experience: &Experience, direction: f32) -> Option<(ParamKey, ControlValue)> {
        let control = self.control(experience)?;
        let current = shown_value(experience, control.key)?;
        let value = match (current, control.range) {
            (ControlValue::Number(n), Some(range)) => {
                let step = ((range.max - range.min) * NUDGE_FRACTION).max(range.step);
                ControlValue::Number(range.constrain(n + step * direction))
            }
            (ControlValue::Color(c), _) => ControlValue::Color(c.scale(1.0 + COLOR_NUDGE * direction)),
            (ControlValue::Number(_), None) => return None,
        };
        Some((control.key, value))
    }

    /// Panel text, one line per entry
    pub fn lines(&self, experience: &Experience) -> Vec<String> {
        let mut lines = Vec::new();
        let mut index = 0;
        for folder in &experience.debug.folders {
            lines.push(format!("[{}]", folder.name));
            for control in &folder.controls {
                let marker = if index == self.selected { '>' } else { ' ' };
                let pending = matches!(experience.debug.pending(), Some((k, _)) if k == control.key);
                let value = shown_value(experience, control.key)
                    .map(|v| control.format(v))
                    .unwrap_or_default();
                lines.push(format!(
                    "{} {:<18} {}{}",
                    marker,
                    control.label,
                    value,
                    if pending { " *" } else { "" }
                ));
                index += 1;
            }
            for button in &folder.buttons {
                let marker = if index == self.selected { '>' } else { ' ' };
                lines.push(format!("{} <{}>", marker, button.label));
                index += 1;
            }
        }
        lines
    }
}

/// The pending drag value if there is one, otherwise the committed value
fn shown_value(experience: &Experience, key: ParamKey) -> Option<ControlValue> {
    match experience.debug.pending() {
        Some((k, value)) if k == key => Some(value),
        _ => experience.value(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::debug::GalaxyParam;
    use galaxy_core::{AppConfig, Sizes};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn experience() -> Experience {
        let config = AppConfig {
            debug: true,
            ..AppConfig::default()
        };
        Experience::new(&config, Sizes::new(80, 48, 1.0), StdRng::seed_from_u64(3))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Action::from_key(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(Action::from_key(press(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(
            Action::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(Action::from_key(press(KeyCode::BackTab)), Some(Action::Select(-1)));
        assert_eq!(Action::from_key(press(KeyCode::Enter)), Some(Action::Commit));
        assert_eq!(Action::from_key(press(KeyCode::Char('x'))), None);
        assert!(matches!(
            Action::from_key(press(KeyCode::Char('-'))),
            Some(Action::Zoom(f)) if f > 1.0
        ));
    }

    #[test]
    fn test_select_wraps() {
        let experience = experience();
        let total = experience.debug.controls().count() + experience.debug.buttons().count();
        let mut cursor = PanelCursor::default();
        cursor.select(&experience, -1);
        assert_eq!(cursor.selected(), total - 1);
        cursor.select(&experience, 1);
        assert_eq!(cursor.selected(), 0);
    }

    #[test]
    fn test_buttons_are_selectable() {
        let experience = experience();
        let mut cursor = PanelCursor::default();
        assert_eq!(cursor.button(&experience), None);

        cursor.select(&experience, -1);
        assert_eq!(cursor.button(&experience), Some(Command::ResetBodies));
        assert!(cursor.control(&experience).is_none());
        assert!(cursor.nudged(&experience, 1.0).is_none());
        let lines = cursor.lines(&experience);
        assert_eq!(lines.last().map(String::as_str), Some("> <reset>"));
    }

    #[test]
    fn test_nudge_moves_within_range() {
        let mut experience = experience();
        let cursor = PanelCursor::default();
        let (key, value) = cursor.nudged(&experience, 1.0).unwrap();
        assert_eq!(key, ParamKey::Galaxy(GalaxyParam::Count));
        let ControlValue::Number(count) = value else {
            panic!("count is numeric");
        };
        assert!(count > 90_000.0);

        // A drag keeps the value pending and the next nudge starts from it
        experience
            .input(key, value, galaxy_core::Phase::Changing)
            .unwrap();
        let (_, again) = cursor.nudged(&experience, 1.0).unwrap();
        assert!(again.as_number().unwrap() > count);
        assert!(cursor.lines(&experience)[1].ends_with(" *"));
    }

    #[test]
    fn test_lines_list_every_control() {
        let experience = experience();
        let cursor = PanelCursor::default();
        let lines = cursor.lines(&experience);
        let rows = experience.debug.controls().count() + experience.debug.buttons().count();
        assert_eq!(lines.len(), rows + experience.debug.folders.len());
        assert_eq!(lines[0], "[Galaxy]");
        assert!(lines[1].starts_with("> count"));
        assert!(lines[1].contains("90000"));
    }
}
