//! Selector validation and closest-ancestor matching for include/exclude
//! rules.

use beacon_core::DiagnosticSink;
use scraper::{ElementRef, Selector};

/// Keep the entries that are non-blank and parse as a selector list, in
/// their original order. Each rejected entry is reported once.
///
/// This is a syntax check only; a valid selector need not match anything in
/// the current document.
pub fn validate_and_filter_selectors<S: AsRef<str>>(
    selectors: &[S],
    diagnostics: &dyn DiagnosticSink,
) -> Vec<String> {
    selectors
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|sel| {
            let valid = !sel.trim().is_empty() && Selector::parse(sel).is_ok();
            if !valid {
                diagnostics.warn(&format!("Invalid selector syntax provided: {sel}"));
            }
            valid
        })
        .map(str::to_string)
        .collect()
}

/// True when any selector matches `target` or one of its ancestors.
///
/// A selector that fails to parse is skipped with a warning; the remaining
/// selectors are still tried.
pub fn element_matches_any<S: AsRef<str>>(
    selectors: &[S],
    target: ElementRef<'_>,
    diagnostics: &dyn DiagnosticSink,
) -> bool {
    selectors.iter().map(AsRef::<str>::as_ref).any(|sel| match Selector::parse(sel) {
        Ok(selector) => closest(&selector, target).is_some(),
        Err(_) => {
            diagnostics.warn(&format!("Invalid selector provided: {sel}"));
            false
        }
    })
}

/// Nearest inclusive ancestor of `element` matching `selector`.
pub fn closest<'a>(selector: &Selector, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| selector.matches(el))
}
