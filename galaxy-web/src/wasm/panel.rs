//! DOM debug panel: one `<input>` per control

use std::cell::RefCell;
use std::rc::Rc;

use galaxy_core::debug::{Button, Control};
use galaxy_core::ControlValue;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlLabelElement};

use super::{warn, App};
use crate::bindings::{events_for, input_type, parse_value};

const PANEL_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("top", "0"),
    ("right", "0"),
    ("width", "280px"),
    ("max-height", "100%"),
    ("overflow-y", "auto"),
    ("padding", "8px"),
    ("background", "rgba(0, 0, 0, 0.75)"),
    ("color", "#eee"),
    ("font", "12px monospace"),
];

pub fn build(document: &Document, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let root: HtmlElement = document.create_element("div")?.dyn_into()?;
    root.set_class_name("debug-panel");
    let style = root.style();
    for (property, value) in PANEL_STYLE {
        style.set_property(property, value)?;
    }

    let folders: Vec<(&'static str, Vec<Control>, Vec<Button>)> = app
        .borrow()
        .experience
        .debug
        .folders
        .iter()
        .map(|folder| (folder.name, folder.controls.clone(), folder.buttons.clone()))
        .collect();

    for (name, controls, buttons) in folders {
        let title = document.create_element("div")?;
        title.set_text_content(Some(name));
        root.append_child(&title)?;
        for control in controls {
            root.append_child(&row(document, app, control)?)?;
        }
        for button in buttons {
            root.append_child(&button_row(document, app, button)?)?;
        }
    }

    document.body().ok_or("document has no body")?.append_child(&root)?;
    Ok(())
}

fn row(document: &Document, app: &Rc<RefCell<App>>, control: Control) -> Result<Element, JsValue> {
    let row = document.create_element("div")?;
    let id = format!("debug-{}", control.label.replace(' ', "-"));

    let label: HtmlLabelElement = document.create_element("label")?.dyn_into()?;
    label.set_html_for(&id);
    label.set_text_content(Some(control.label));

    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_id(&id);
    input.set_type(input_type(&control));
    if let Some(range) = control.range {
        input.set_min(&range.min.to_string());
        input.set_max(&range.max.to_string());
        input.set_step(&range.step.to_string());
    }

    let readout = document.create_element("span")?;
    if let Some(value) = app.borrow().experience.value(control.key) {
        input.set_value(&raw_value(value));
        readout.set_text_content(Some(&control.format(value)));
    }

    for &(event, phase) in events_for(control.trigger) {
        let app = app.clone();
        let control = control.clone();
        let input_ref = input.clone();
        let readout = readout.clone();
        let handler = Closure::wrap(Box::new(move || {
            let result = parse_value(&control, &input_ref.value()).and_then(|value| {
                app.borrow_mut()
                    .experience
                    .input(control.key, value, phase)
                    .map(|_| value)
            });
            match result {
                Ok(value) => readout.set_text_content(Some(&control.format(value))),
                Err(e) => warn(&format!("{}: {}", control.label, e)),
            }
        }) as Box<dyn FnMut()>);
        input.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    row.append_child(&label)?;
    row.append_child(&input)?;
    row.append_child(&readout)?;
    Ok(row)
}

fn button_row(document: &Document, app: &Rc<RefCell<App>>, button: Button) -> Result<Element, JsValue> {
    let element = document.create_element("button")?;
    element.set_text_content(Some(button.label));

    let app = app.clone();
    let on_click = Closure::wrap(Box::new(move || {
        app.borrow_mut().experience.press(button.command);
    }) as Box<dyn FnMut()>);
    element.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let row = document.create_element("div")?;
    row.append_child(&element)?;
    Ok(row)
}

fn raw_value(value: ControlValue) -> String {
    match value {
        ControlValue::Number(n) => n.to_string(),
        ControlValue::Color(c) => c.to_string(),
    }
}
