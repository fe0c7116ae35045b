use std::collections::HashSet;

use crate::device::device_model::ViewNode;
use crate::screen::visibility::{VisibleViews, descendant_ids};

const MAX_OWN_TEXT_CHARS: usize = 50;
const MAX_CONTAINED_ITEMS: usize = 4;

/// Textual description of a view, assembled from the view itself and, when
/// that is not enough, from its children, ancestors, and siblings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribedText {
    pub text: Vec<String>,
    pub content_description: Vec<String>,
    pub resource_id: Vec<String>,
    pub contained_items: Vec<String>,
    pub parent: Option<Box<DescribedText>>,
    pub siblings: Option<Box<DescribedText>>,
    pub is_password: bool,
}

impl DescribedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.content_description.is_empty()
            && self.resource_id.is_empty()
            && self.contained_items.is_empty()
            && self.parent.is_none()
            && self.siblings.is_none()
            && !self.is_password
    }
}

/// Whether a description carries enough content to stop borrowing.
///
/// Image-like views are also satisfied by a content description or resource
/// id alone; everything else needs text or a content description, possibly
/// inherited through an attached parent or siblings sub-description.
pub fn is_sufficient(class_name: &str, description: &DescribedText) -> bool {
    if (class_name.contains("ImageButton") || class_name.contains("ImageView"))
        && (!description.content_description.is_empty() || !description.resource_id.is_empty())
    {
        return true;
    }

    if !description.text.is_empty() || !description.content_description.is_empty() {
        return true;
    }

    if let Some(parent) = &description.parent {
        if !parent.text.is_empty() || !parent.content_description.is_empty() {
            return true;
        }
    }
    if let Some(siblings) = &description.siblings {
        if !siblings.text.is_empty() || !siblings.content_description.is_empty() {
            return true;
        }
    }

    false
}

/// A view's own text, truncated and with line breaks normalized away.
fn normalize_own_text(raw: &str) -> Option<String> {
    let mut text: String = raw.chars().take(MAX_OWN_TEXT_CHARS).collect();
    if raw.chars().count() > MAX_OWN_TEXT_CHARS {
        text.push_str("[...]");
    }
    let text = text
        .replace('\n', "<newline>")
        .replace('\r', " ")
        .replace('\t', " ");

    if text.trim().is_empty() { None } else { Some(text) }
}

/// Describe a view from its own attributes, folding in the text and content
/// descriptions of visible children when the view's own content is not
/// sufficient. Resource ids are only taken from the view itself, and only
/// when the caller asks for them.
pub fn describe_view(
    view: &ViewNode,
    views: &VisibleViews<'_>,
    with_children: bool,
    with_resource_id: bool,
) -> DescribedText {
    let mut description = DescribedText::default();

    if with_resource_id {
        if let Some(resource_id) = &view.resource_id {
            description.resource_id.push(resource_id.clone());
        }
    }
    if let Some(text) = view.text.as_deref().and_then(normalize_own_text) {
        description.text.push(text);
    }
    if let Some(content_description) = &view.content_description {
        description.content_description.push(content_description.clone());
    }

    if is_sufficient(&view.class, &description) {
        return description;
    }

    if with_children {
        for child_id in &view.children {
            let Some(&child) = views.get(child_id) else {
                continue;
            };
            let child_description = describe_view(child, views, true, true);
            description.text.extend(child_description.text);
            description
                .content_description
                .extend(child_description.content_description);
        }
    }

    description
}

/// Describe a view, borrowing from ancestors and siblings when the view and
/// its children have nothing usable. Returns the description together with
/// every view id consumed while producing it, so consumed views are not
/// re-emitted as standalone widgets.
///
/// The ancestor walk terminates at the root, at an invisible parent, or at
/// the first already-visited id (malformed chains never loop).
pub fn describe_with_context(
    view_id: usize,
    view: &ViewNode,
    views: &VisibleViews<'_>,
) -> (DescribedText, HashSet<usize>) {
    let mut description = describe_view(view, views, true, true);
    let mut visited: HashSet<usize> = descendant_ids(view, views);
    visited.insert(view_id);

    if view.is_password() {
        description.is_password = true;
    }
    if is_sufficient(&view.class, &description) {
        return (description, visited);
    }

    let mut current_id = match view.parent_id() {
        Some(parent_id) => parent_id,
        None => return (description, visited),
    };

    loop {
        let Some(&current) = views.get(&current_id) else {
            break;
        };
        if current.parent_id().is_none() {
            break;
        }
        if visited.contains(&current_id) {
            break;
        }

        let parent_description = describe_view(current, views, true, true);
        visited.insert(current_id);
        if is_sufficient(&view.class, &parent_description) {
            description.parent = Some(Box::new(parent_description));
            break;
        }

        let mut siblings_description = DescribedText::default();
        for &sibling_id in &current.children {
            if sibling_id == view_id {
                continue;
            }
            let Some(&sibling) = views.get(&sibling_id) else {
                continue;
            };
            let sibling_description = describe_view(sibling, views, true, true);
            visited.insert(sibling_id);
            siblings_description.text.extend(sibling_description.text);
            siblings_description
                .content_description
                .extend(sibling_description.content_description);
        }
        if is_sufficient(&view.class, &siblings_description) {
            description.siblings = Some(Box::new(siblings_description));
            break;
        }

        match current.parent_id() {
            Some(parent_id) => current_id = parent_id,
            None => break,
        }
    }

    (description, visited)
}

/// Whether a view is a list-style container whose children are worth
/// sampling as `contained_items`.
pub fn is_list_container(class_name: &str) -> bool {
    class_name.ends_with("RecyclerView") || class_name.ends_with("ListView")
}

/// Sample the text of up to four visible children, skipping children with
/// nothing usable.
pub fn sample_contained_items(view: &ViewNode, views: &VisibleViews<'_>) -> Vec<String> {
    let mut items = Vec::new();
    for child_id in &view.children {
        let Some(&child) = views.get(child_id) else {
            continue;
        };
        if items.len() >= MAX_CONTAINED_ITEMS {
            break;
        }
        let child_description = describe_view(child, views, true, false);
        if let Some(first_text) = child_description.text.first() {
            items.push(first_text.clone());
        }
    }
    items
}
