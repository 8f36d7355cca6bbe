/// Browser input translated into core types, kept free of DOM calls
use galaxy_core::debug::{Control, Trigger};
use galaxy_core::{Color, ControlValue, CoreError, Phase, Result};
use std::f32::consts::PI;

/// Zoom factor per wheel notch
const WHEEL_ZOOM: f32 = 0.95;

/// The panel is shown when the URL fragment names `debug`, e.g. `#debug`
pub fn debug_requested(hash: &str) -> bool {
    hash.trim_start_matches('#')
        .split(['&', ','])
        .any(|part| part.trim() == "debug")
}

/// DOM events to listen for on a control, and the phase each one reports.
///
/// Finish-change controls see every `input` while dragging but only commit
/// on `change`, which fires on release.
pub fn events_for(trigger: Trigger) -> &'static [(&'static str, Phase)] {
    match trigger {
        Trigger::Immediate => &[("input", Phase::Changing)],
        Trigger::OnFinishChange => &[("input", Phase::Changing), ("change", Phase::Finished)],
    }
}

/// `type` attribute of the `<input>` for a control
pub fn input_type(control: &Control) -> &'static str {
    if control.range.is_some() {
        "range"
    } else {
        "color"
    }
}

/// Parse an `<input>` value for a control
pub fn parse_value(control: &Control, raw: &str) -> Result<ControlValue> {
    if control.range.is_none() {
        return Color::from_hex(raw).map(ControlValue::Color);
    }
    raw.trim()
        .parse::<f32>()
        .map(ControlValue::Number)
        .map_err(|e| CoreError::invalid(control.label, format!("{:?}: {}", raw, e)))
}

/// Orbit angles for a pointer drag; a full viewport height is one turn
pub fn drag_rotation(dx: f32, dy: f32, viewport_height: f32) -> (f32, f32) {
    let height = viewport_height.max(1.0);
    (2.0 * PI * dx / height, 2.0 * PI * dy / height)
}

/// Zoom factor for a wheel event; scrolling down moves away
pub fn wheel_zoom(delta_y: f64) -> f32 {
    if delta_y > 0.0 {
        1.0 / WHEEL_ZOOM
    } else if delta_y < 0.0 {
        WHEEL_ZOOM
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::debug::{GalaxyParam, ParamKey};
    use galaxy_core::DebugPanel;

    fn control(param: GalaxyParam) -> Control {
        DebugPanel::new(true)
            .control(ParamKey::Galaxy(param))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_debug_from_hash() {
        assert!(debug_requested("#debug"));
        assert!(debug_requested("#fullscreen&debug"));
        assert!(!debug_requested(""));
        assert!(!debug_requested("#debugger"));
    }

    #[test]
    fn test_finish_change_controls_listen_for_change() {
        let count = control(GalaxyParam::Count);
        let events = events_for(count.trigger);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ("change", Phase::Finished));

        let spin_speed = control(GalaxyParam::SpinSpeed);
        assert_eq!(events_for(spin_speed.trigger), &[("input", Phase::Changing)]);
    }

    #[test]
    fn test_parse_values() {
        let size = control(GalaxyParam::Size);
        assert_eq!(input_type(&size), "range");
        assert_eq!(parse_value(&size, "0.05").unwrap(), ControlValue::Number(0.05));
        assert!(parse_value(&size, "wide").is_err());

        let inside = control(GalaxyParam::InsideColor);
        assert_eq!(input_type(&inside), "color");
        assert_eq!(
            parse_value(&inside, "#ff6030").unwrap(),
            ControlValue::Color(Color::from_rgb8(0xff, 0x60, 0x30))
        );
    }

    #[test]
    fn test_pointer_helpers() {
        let (azimuth, polar) = drag_rotation(100.0, 0.0, 200.0);
        assert!((azimuth - PI).abs() < 1e-6);
        assert_eq!(polar, 0.0);
        assert!(wheel_zoom(3.0) > 1.0);
        assert!(wheel_zoom(-3.0) < 1.0);
        assert_eq!(wheel_zoom(0.0), 1.0);
    }
}
