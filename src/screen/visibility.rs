use std::collections::{BTreeMap, HashSet};

use crate::device::device_model::ViewNode;

/// The visible-view arena for one snapshot: view id → node, ascending by id.
/// Ids are positions in the snapshot's flat `views` list, so iteration order
/// equals the driver's enumeration order.
pub type VisibleViews<'a> = BTreeMap<usize, &'a ViewNode>;

pub fn visible_views(views: &[ViewNode]) -> VisibleViews<'_> {
    views
        .iter()
        .enumerate()
        .filter(|(_, view)| view.visible)
        .collect()
}

/// Walk the parent chain of `view` upward, collecting ancestor ids.
///
/// The walk stops at a non-positive parent id, and the visited set guards
/// against malformed chains that loop back on themselves. An ancestor id is
/// collected even when the ancestor itself is not visible; the walk just
/// cannot continue past it.
pub fn ancestor_ids(view: &ViewNode, views: &VisibleViews<'_>) -> Vec<usize> {
    let mut ancestors = Vec::new();
    let mut seen = HashSet::new();
    let mut current = view;

    while let Some(parent_id) = current.parent_id() {
        if !seen.insert(parent_id) {
            break;
        }
        ancestors.push(parent_id);
        match views.get(&parent_id) {
            Some(&parent) => current = parent,
            None => break,
        }
    }

    ancestors
}

/// All ids in the child closure of `view`. Invisible direct children are
/// included as ids, but the recursion only descends through visible nodes.
pub fn descendant_ids(view: &ViewNode, views: &VisibleViews<'_>) -> HashSet<usize> {
    let mut out = HashSet::new();
    collect_descendants(view, views, &mut out);
    out
}

fn collect_descendants(view: &ViewNode, views: &VisibleViews<'_>, out: &mut HashSet<usize>) {
    for &child_id in &view.children {
        if !out.insert(child_id) {
            continue;
        }
        if let Some(&child) = views.get(&child_id) {
            collect_descendants(child, views, out);
        }
    }
}
