use app_pilot::screen::describe::{
    DescribedText, describe_view, describe_with_context, is_sufficient, sample_contained_items,
};
use app_pilot::screen::visibility::visible_views;

use crate::common::utils::{labeled, view};

mod common;

// =========================================================================
// Own-content description
// =========================================================================

#[test]
fn own_text_is_enough() {
    let views = vec![labeled("android.widget.TextView", "Hello")];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert_eq!(description.text, vec!["Hello"]);
    assert!(description.content_description.is_empty());
}

#[test]
fn long_text_is_truncated_with_marker() {
    let long = "x".repeat(60);
    let views = vec![labeled("android.widget.TextView", &long)];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert_eq!(description.text, vec![format!("{}[...]", "x".repeat(50))]);
}

#[test]
fn line_breaks_are_normalized() {
    let views = vec![labeled("android.widget.TextView", "line1\nline2\tend\r")];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert_eq!(description.text, vec!["line1<newline>line2 end "]);
}

#[test]
fn whitespace_only_text_is_ignored() {
    let views = vec![labeled("android.widget.TextView", "   ")];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, false, true);
    assert!(description.is_empty());
}

#[test]
fn image_views_are_satisfied_by_resource_id() {
    let mut image = view("android.widget.ImageView");
    image.resource_id = Some("com.example.app:id/avatar".to_string());
    let views = vec![image];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert!(is_sufficient("android.widget.ImageView", &description));
    assert!(
        !is_sufficient("android.widget.TextView", &description),
        "A bare resource id is not sufficient for non-image views"
    );
}

// =========================================================================
// Child folding
// =========================================================================

#[test]
fn children_text_is_folded_when_own_content_is_missing() {
    let mut root = view("android.widget.LinearLayout");
    root.children = vec![1, 2];
    let mut first = labeled("android.widget.TextView", "A");
    first.parent = 0;
    let mut second = labeled("android.widget.TextView", "B");
    second.parent = 0;

    let views = vec![root, first, second];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert_eq!(description.text, vec!["A", "B"]);
}

#[test]
fn child_with_own_text_does_not_descend_further() {
    let mut root = view("android.widget.LinearLayout");
    root.children = vec![1];
    let mut child = labeled("android.widget.TextView", "A");
    child.parent = 0;
    child.children = vec![2];
    let mut grandchild = labeled("android.widget.TextView", "B");
    grandchild.parent = 1;

    let views = vec![root, child, grandchild];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert_eq!(
        description.text,
        vec!["A"],
        "Sufficiency short-circuits per child"
    );
}

#[test]
fn invisible_children_are_skipped() {
    let mut root = view("android.widget.LinearLayout");
    root.children = vec![1];
    let mut child = labeled("android.widget.TextView", "hidden");
    child.visible = false;
    child.parent = 0;

    let views = vec![root, child];
    let visible = visible_views(&views);

    let description = describe_view(visible[&0], &visible, true, true);
    assert!(description.is_empty());
}

// =========================================================================
// Context borrowing
// =========================================================================

fn password_field_views() -> Vec<app_pilot::device::device_model::ViewNode> {
    // root(0) -> container(1) -> label-parent(2, "Password") -> field(3)
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut container = view("android.widget.LinearLayout");
    container.parent = 0;
    container.children = vec![2];
    let mut label_parent = labeled("android.widget.LinearLayout", "Password");
    label_parent.parent = 1;
    label_parent.children = vec![3];
    let mut field = view("android.widget.EditText");
    field.parent = 2;
    field.editable = true;
    field.is_password = Some(true);
    vec![root, container, label_parent, field]
}

#[test]
fn empty_field_borrows_parent_text() {
    let views = password_field_views();
    let visible = visible_views(&views);

    let (description, visited) = describe_with_context(3, visible[&3], &visible);

    let parent = description.parent.expect("parent description attached");
    assert_eq!(parent.text, vec!["Password"]);
    assert!(description.siblings.is_none(), "Parent wins over siblings");
    assert!(description.is_password, "Password flag attached verbatim");
    assert!(visited.contains(&3) && visited.contains(&2));
}

#[test]
fn sibling_text_is_borrowed_when_the_ancestor_has_none() {
    // root(0) -> wrap(1) -> image row(2, resource id only) -> {field(3), label(4)}
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut wrap = view("android.widget.FrameLayout");
    wrap.parent = 0;
    wrap.children = vec![2];
    let mut row = view("android.widget.ImageButton");
    row.parent = 1;
    row.children = vec![3, 4];
    row.resource_id = Some("com.example.app:id/row_bg".to_string());
    let mut field = view("android.widget.EditText");
    field.parent = 2;
    field.editable = true;
    let mut label = labeled("android.widget.TextView", "Username");
    label.parent = 2;

    let views = vec![root, wrap, row, field, label];
    let visible = visible_views(&views);

    let (description, visited) = describe_with_context(3, visible[&3], &visible);

    assert!(
        description.parent.is_none(),
        "The image row's own description is not sufficient for a textfield"
    );
    let siblings = description.siblings.expect("siblings description attached");
    assert_eq!(siblings.text, vec!["Username"]);
    assert!(visited.contains(&4), "Described siblings are consumed");
}

#[test]
fn sufficient_views_do_not_walk_ancestors() {
    let mut root = labeled("android.widget.LinearLayout", "Header");
    root.children = vec![1];
    let mut button = labeled("android.widget.Button", "OK");
    button.parent = 0;

    let views = vec![root, button];
    let visible = visible_views(&views);

    let (description, visited) = describe_with_context(1, visible[&1], &visible);
    assert_eq!(description.text, vec!["OK"]);
    assert!(description.parent.is_none());
    assert_eq!(visited.len(), 1, "Only the view itself is consumed");
}

#[test]
fn context_walk_terminates_on_cyclic_parent_chain() {
    // 1 and 2 point at each other; the walk must not loop.
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut a = view("android.widget.LinearLayout");
    a.parent = 2;
    a.children = vec![3];
    let mut b = view("android.widget.LinearLayout");
    b.parent = 1;
    let mut field = view("android.widget.EditText");
    field.parent = 1;
    field.editable = true;

    let views = vec![root, a, b, field];
    let visible = visible_views(&views);

    let (description, _) = describe_with_context(3, visible[&3], &visible);
    assert!(description.parent.is_none());
    assert!(description.siblings.is_none());
}

// =========================================================================
// Contained-item sampling
// =========================================================================

#[test]
fn list_containers_sample_at_most_four_children() {
    let mut list = view("androidx.recyclerview.widget.RecyclerView");
    list.children = (1..=6).collect();
    let mut views = vec![list];
    for i in 1..=6 {
        let mut item = labeled("android.widget.TextView", &format!("Item {i}"));
        item.parent = 0;
        views.push(item);
    }

    let visible = visible_views(&views);
    let items = sample_contained_items(visible[&0], &visible);
    assert_eq!(items, vec!["Item 1", "Item 2", "Item 3", "Item 4"]);
}

#[test]
fn children_without_text_are_skipped_when_sampling() {
    let mut list = view("android.widget.ListView");
    list.children = vec![1, 2];
    let mut divider = view("android.widget.ImageView");
    divider.parent = 0;
    let mut item = labeled("android.widget.TextView", "Only entry");
    item.parent = 0;

    let views = vec![list, divider, item];
    let visible = visible_views(&views);
    let items = sample_contained_items(visible[&0], &visible);
    assert_eq!(items, vec!["Only entry"]);
}

// =========================================================================
// DescribedText emptiness
// =========================================================================

#[test]
fn empty_description_is_insufficient() {
    let description = DescribedText::default();
    assert!(description.is_empty());
    assert!(!is_sufficient("android.widget.TextView", &description));
}
