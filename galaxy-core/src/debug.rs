//! Debug panel model
//!
//! Describes the tunable parameters, their ranges and when a change takes
//! effect. Front ends draw the controls; values live in the objects that
//! implement [`Tunable`].

use crate::color::Color;
use crate::config::GalaxyConfig;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalaxyParam {
    Count,
    Size,
    Radius,
    Branches,
    Spin,
    Randomness,
    RandomnessPower,
    InsideColor,
    OutsideColor,
    SpinSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentParam {
    SunIntensity,
    SunX,
    SunY,
    SunZ,
    AmbientIntensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Galaxy(GalaxyParam),
    Environment(EnvironmentParam),
}

/// One-shot panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SpawnSphere,
    SpawnBox,
    ResetBodies,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Number(f32),
    Color(Color),
}

impl ControlValue {
    pub fn as_number(self) -> Option<f32> {
        match self {
            ControlValue::Number(n) => Some(n),
            ControlValue::Color(_) => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            ControlValue::Color(c) => Some(c),
            ControlValue::Number(_) => None,
        }
    }
}

/// When a control change reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Cheap parameters: every intermediate value is applied
    Immediate,
    /// Expensive parameters: applied once the user releases the control
    OnFinishChange,
}

/// Stage of a user interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Changing,
    Finished,
}

/// What the owner of the value must do after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Apply,
    Regenerate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Clamp into range and snap to the nearest step from `min`.
    ///
    /// Snapping runs in f64 and rounds to the step's decimal places, so a
    /// value already on a step comes back unchanged.
    pub fn constrain(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let (min, step) = (self.min as f64, self.step as f64);
        let steps = ((clamped as f64 - min) / step).round();
        let scale = 10f64.powi(self.decimals() as i32);
        let snapped = ((min + steps * step) * scale).round() / scale;
        (snapped as f32).clamp(self.min, self.max)
    }

    /// Decimal places needed to show a value at this step
    pub fn decimals(&self) -> usize {
        let mut step = self.step;
        let mut places = 0;
        while places < 6 && (step - step.round()).abs() > 1e-6 {
            step *= 10.0;
            places += 1;
        }
        places
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub key: ParamKey,
    pub label: &'static str,
    /// `None` for colour pickers
    pub range: Option<Range>,
    pub trigger: Trigger,
}

impl Control {
    fn number(key: ParamKey, label: &'static str, range: Range, trigger: Trigger) -> Self {
        Self {
            key,
            label,
            range: Some(range),
            trigger,
        }
    }

    fn color(key: ParamKey, label: &'static str) -> Self {
        Self {
            key,
            label,
            range: None,
            trigger: Trigger::OnFinishChange,
        }
    }

    pub fn format(&self, value: ControlValue) -> String {
        match (value, self.range) {
            (ControlValue::Number(n), Some(range)) => format!("{:.*}", range.decimals(), n),
            (ControlValue::Number(n), None) => format!("{}", n),
            (ControlValue::Color(c), _) => c.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Button {
    pub command: Command,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: &'static str,
    pub controls: Vec<Control>,
    pub buttons: Vec<Button>,
}

/// A validated change ready to be written to its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub key: ParamKey,
    pub value: ControlValue,
    pub effect: Effect,
}

/// Read/write access to values addressed by [`ParamKey`]
pub trait Tunable {
    fn get(&self, key: ParamKey) -> Option<ControlValue>;
    /// Returns `false` when the key does not belong to this object
    fn set(&mut self, key: ParamKey, value: ControlValue) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugPanel {
    pub active: bool,
    pub folders: Vec<Folder>,
    pending: Option<(ParamKey, ControlValue)>,
}

impl DebugPanel {
    pub fn new(active: bool) -> Self {
        use EnvironmentParam as E;
        use GalaxyParam as G;
        use ParamKey::{Environment, Galaxy};
        use Trigger::{Immediate, OnFinishChange};

        let galaxy = Folder {
            name: "Galaxy",
            controls: vec![
                Control::number(Galaxy(G::Count), "count", Range::new(100.0, 100_000.0, 100.0), OnFinishChange),
                Control::number(Galaxy(G::Size), "size", Range::new(0.001, 0.1, 0.001), OnFinishChange),
                Control::number(Galaxy(G::Radius), "radius", Range::new(0.01, 20.0, 0.01), OnFinishChange),
                Control::number(Galaxy(G::Branches), "branches", Range::new(2.0, 20.0, 1.0), OnFinishChange),
                Control::number(Galaxy(G::Spin), "spin", Range::new(-5.0, 5.0, 0.001), OnFinishChange),
                Control::number(Galaxy(G::Randomness), "randomness", Range::new(0.0, 2.0, 0.001), OnFinishChange),
                Control::number(Galaxy(G::RandomnessPower), "randomness power", Range::new(1.0, 10.0, 0.001), OnFinishChange),
                Control::color(Galaxy(G::InsideColor), "inside color"),
                Control::color(Galaxy(G::OutsideColor), "outside color"),
                Control::number(Galaxy(G::SpinSpeed), "spin speed", Range::new(-5.0, 5.0, 0.001), Immediate),
            ],
            buttons: Vec::new(),
        };
        let environment = Folder {
            name: "Environment",
            controls: vec![
                Control::number(Environment(E::SunIntensity), "sun intensity", Range::new(0.0, 10.0, 0.001), Immediate),
                Control::number(Environment(E::SunX), "sun x", Range::new(-5.0, 5.0, 0.001), Immediate),
                Control::number(Environment(E::SunY), "sun y", Range::new(0.0, 5.0, 0.001), Immediate),
                Control::number(Environment(E::SunZ), "sun z", Range::new(-5.0, 5.0, 0.001), Immediate),
                Control::number(Environment(E::AmbientIntensity), "ambient intensity", Range::new(0.0, 3.0, 0.001), Immediate),
            ],
            buttons: Vec::new(),
        };
        let physics = Folder {
            name: "Physics",
            controls: Vec::new(),
            buttons: vec![
                Button { command: Command::SpawnSphere, label: "create sphere" },
                Button { command: Command::SpawnBox, label: "create box" },
                Button { command: Command::ResetBodies, label: "reset" },
            ],
        };

        Self {
            active,
            folders: vec![galaxy, environment, physics],
            pending: None,
        }
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.folders.iter().flat_map(|f| f.controls.iter())
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.folders.iter().flat_map(|f| f.buttons.iter())
    }

    pub fn control(&self, key: ParamKey) -> Option<&Control> {
        self.controls().find(|c| c.key == key)
    }

    /// Value being dragged but not yet committed
    pub fn pending(&self) -> Option<(ParamKey, ControlValue)> {
        self.pending
    }

    /// Validate a user edit.
    ///
    /// Immediate controls always produce an `Apply` change. Finish-change
    /// controls keep the value pending while `Changing` and produce a
    /// `Regenerate` change once `Finished`.
    pub fn input(&mut self, key: ParamKey, value: ControlValue, phase: Phase) -> Result<Option<Change>> {
        let control = self
            .control(key)
            .ok_or_else(|| CoreError::invalid("debug", format!("no control for {:?}", key)))?;

        let value = match (value, control.range) {
            (ControlValue::Number(n), Some(range)) if n.is_finite() => ControlValue::Number(range.constrain(n)),
            (ControlValue::Color(c), None) => ControlValue::Color(c),
            _ => {
                return Err(CoreError::invalid(
                    control.label,
                    format!("unsupported value {:?}", value),
                ))
            }
        };

        let change = match (control.trigger, phase) {
            (Trigger::Immediate, _) => Some(Change {
                key,
                value,
                effect: Effect::Apply,
            }),
            (Trigger::OnFinishChange, Phase::Changing) => {
                self.pending = Some((key, value));
                return Ok(None);
            }
            (Trigger::OnFinishChange, Phase::Finished) => Some(Change {
                key,
                value,
                effect: Effect::Regenerate,
            }),
        };

        if matches!(self.pending, Some((k, _)) if k == key) {
            self.pending = None;
        }
        tracing::debug!(?key, ?value, "debug control changed");
        Ok(change)
    }

    /// Commit the pending drag value, if any
    pub fn finish(&mut self) -> Option<Change> {
        let (key, value) = self.pending.take()?;
        self.input(key, value, Phase::Finished).ok().flatten()
    }

    /// Throw away the pending drag value
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Tunable for GalaxyConfig {
    fn get(&self, key: ParamKey) -> Option<ControlValue> {
        let ParamKey::Galaxy(param) = key else {
            return None;
        };
        let value = match param {
            GalaxyParam::Count => ControlValue::Number(self.count as f32),
            GalaxyParam::Size => ControlValue::Number(self.size),
            GalaxyParam::Radius => ControlValue::Number(self.radius),
            GalaxyParam::Branches => ControlValue::Number(self.branches as f32),
            GalaxyParam::Spin => ControlValue::Number(self.spin),
            GalaxyParam::Randomness => ControlValue::Number(self.randomness),
            GalaxyParam::RandomnessPower => ControlValue::Number(self.randomness_power),
            GalaxyParam::InsideColor => ControlValue::Color(self.inside_color),
            GalaxyParam::OutsideColor => ControlValue::Color(self.outside_color),
            GalaxyParam::SpinSpeed => ControlValue::Number(self.spin_speed),
        };
        Some(value)
    }

    fn set(&mut self, key: ParamKey, value: ControlValue) -> bool {
        let ParamKey::Galaxy(param) = key else {
            return false;
        };
        match (param, value) {
            (GalaxyParam::Count, ControlValue::Number(n)) => self.count = n.round().max(1.0) as u32,
            (GalaxyParam::Size, ControlValue::Number(n)) => self.size = n,
            (GalaxyParam::Radius, ControlValue::Number(n)) => self.radius = n,
            (GalaxyParam::Branches, ControlValue::Number(n)) => self.branches = n.round().max(1.0) as u32,
            (GalaxyParam::Spin, ControlValue::Number(n)) => self.spin = n,
            (GalaxyParam::Randomness, ControlValue::Number(n)) => self.randomness = n,
            (GalaxyParam::RandomnessPower, ControlValue::Number(n)) => self.randomness_power = n,
            (GalaxyParam::InsideColor, ControlValue::Color(c)) => self.inside_color = c,
            (GalaxyParam::OutsideColor, ControlValue::Color(c)) => self.outside_color = c,
            (GalaxyParam::SpinSpeed, ControlValue::Number(n)) => self.spin_speed = n,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: ParamKey = ParamKey::Galaxy(GalaxyParam::Count);
    const SPIN_SPEED: ParamKey = ParamKey::Galaxy(GalaxyParam::SpinSpeed);

    #[test]
    fn test_range_constrain_and_decimals() {
        let range = Range::new(100.0, 100_000.0, 100.0);
        assert_eq!(range.constrain(149.0), 100.0);
        assert_eq!(range.constrain(151.0), 200.0);
        assert_eq!(range.constrain(1e9), 100_000.0);
        assert_eq!(range.decimals(), 0);
        assert_eq!(Range::new(0.0, 1.0, 0.001).decimals(), 3);
    }

    #[test]
    fn test_constrain_keeps_on_step_values_exact() {
        let range = Range::new(-5.0, 5.0, 0.001);
        assert_eq!(range.constrain(1.5), 1.5);
        assert_eq!(range.constrain(-0.25), -0.25);
        assert_eq!(range.constrain(0.0104), 0.01);
        assert_eq!(Range::new(0.001, 0.1, 0.001).constrain(0.02), 0.02);
    }

    #[test]
    fn test_expensive_control_waits_for_finish() {
        let mut debug = DebugPanel::new(true);
        let change = debug
            .input(COUNT, ControlValue::Number(5_049.0), Phase::Changing)
            .unwrap();
        assert!(change.is_none());
        assert_eq!(debug.pending(), Some((COUNT, ControlValue::Number(5_000.0))));

        let change = debug.finish().unwrap();
        assert_eq!(change.effect, Effect::Regenerate);
        assert_eq!(change.value, ControlValue::Number(5_000.0));
        assert!(debug.pending().is_none());
    }

    #[test]
    fn test_cheap_control_applies_immediately() {
        let mut debug = DebugPanel::new(true);
        let change = debug
            .input(SPIN_SPEED, ControlValue::Number(9.0), Phase::Changing)
            .unwrap()
            .unwrap();
        assert_eq!(change.effect, Effect::Apply);
        assert_eq!(change.value, ControlValue::Number(5.0));
    }

    #[test]
    fn test_mismatched_value_rejected() {
        let mut debug = DebugPanel::new(true);
        let inside = ParamKey::Galaxy(GalaxyParam::InsideColor);
        assert!(debug.input(inside, ControlValue::Number(1.0), Phase::Finished).is_err());
        assert!(debug.input(COUNT, ControlValue::Number(f32::NAN), Phase::Finished).is_err());
        let change = debug
            .input(inside, ControlValue::Color(Color::WHITE), Phase::Finished)
            .unwrap()
            .unwrap();
        assert_eq!(change.effect, Effect::Regenerate);
    }

    #[test]
    fn test_galaxy_config_tunable() {
        let mut config = GalaxyConfig::default();
        let branches = ParamKey::Galaxy(GalaxyParam::Branches);
        assert!(config.set(branches, ControlValue::Number(6.4)));
        assert_eq!(config.branches, 6);
        assert_eq!(config.get(branches), Some(ControlValue::Number(6.0)));
        assert!(!config.set(ParamKey::Environment(EnvironmentParam::SunX), ControlValue::Number(1.0)));
        assert!(!config.set(branches, ControlValue::Color(Color::WHITE)));
    }

    #[test]
    fn test_physics_folder_has_buttons_only() {
        let debug = DebugPanel::new(true);
        let physics = debug.folders.iter().find(|f| f.name == "Physics").unwrap();
        assert!(physics.controls.is_empty());
        let commands: Vec<Command> = debug.buttons().map(|b| b.command).collect();
        assert_eq!(commands, [Command::SpawnSphere, Command::SpawnBox, Command::ResetBodies]);
    }

    #[test]
    fn test_every_control_has_a_value() {
        let debug = DebugPanel::new(false);
        let config = GalaxyConfig::default();
        for control in debug.folders[0].controls.iter() {
            assert!(config.get(control.key).is_some(), "{}", control.label);
        }
    }
}
