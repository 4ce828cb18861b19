//! Event classification and target formatting.

use beacon_core::EventType;
use scraper::ElementRef;

/// Classify a DOM event name and target tag into the analytics taxonomy.
/// Tag names compare case-insensitively; event names compare exactly.
pub fn classify(dom_event_type: &str, tag_name: &str) -> EventType {
    let is = |name: &str| tag_name.eq_ignore_ascii_case(name);

    match dom_event_type {
        "click" if is("a") => EventType::Link,
        "click" if is("button") => EventType::Navigation,
        "click" if is("input") || is("textarea") || is("select") => EventType::UserInput,
        "click" => EventType::Other,
        "change" | "input" => EventType::UserInput,
        "error" => EventType::Error,
        _ => EventType::Other,
    }
}

pub fn map_event_type(dom_event_type: &str, target: ElementRef<'_>) -> EventType {
    classify(dom_event_type, target.value().name())
}

/// Human-readable target: `"<text> <<href>>"` for links, the element's
/// outer HTML otherwise.
pub fn format_target(event_type_label: &str, target: ElementRef<'_>) -> String {
    if event_type_label == EventType::Link.as_str() {
        let text = target.text().collect::<String>();
        let href = target.value().attr("href").unwrap_or_default();
        return format!("{} <{}>", text.trim(), href);
    }
    target.html()
}
