use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::screen::visibility::{VisibleViews, ancestor_ids};

/// An interaction type a widget supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Touch,
    LongTouch,
    Scroll,
    SetText,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Touch => "touch",
            Capability::LongTouch => "long_touch",
            Capability::Scroll => "scroll",
            Capability::SetText => "set_text",
        }
    }
}

/// Tag every enabled visible view with its interaction capabilities.
///
/// A clickable or checkable view that is a structural ancestor of another
/// clickable/checkable view is excluded from `touch`: the innermost target
/// wins, so a tap is never ambiguous between a row and the button inside it.
/// Editable views ending in `Spinner` expose only `touch`: dropdowns are
/// opened, never typed into.
pub fn classify_interactable(views: &VisibleViews<'_>) -> BTreeMap<usize, Vec<Capability>> {
    let mut touch_excluded: HashSet<usize> = HashSet::new();
    for &view in views.values() {
        if view.is_disabled() {
            continue;
        }
        if view.clickable || view.checkable {
            touch_excluded.extend(ancestor_ids(view, views));
        }
    }

    let mut capabilities: BTreeMap<usize, Vec<Capability>> = BTreeMap::new();
    for (&view_id, &view) in views {
        if view.is_disabled() {
            continue;
        }

        let mut tags = Vec::new();
        if (view.clickable || view.checkable) && !touch_excluded.contains(&view_id) {
            tags.push(Capability::Touch);
        }
        if view.long_clickable {
            tags.push(Capability::LongTouch);
        }
        if view.scrollable {
            tags.push(Capability::Scroll);
        }
        if view.editable && !view.class.ends_with("Spinner") {
            tags.push(Capability::SetText);
        }

        if !tags.is_empty() {
            capabilities.insert(view_id, tags);
        }
    }

    capabilities
}
