use app_pilot::action::action_model::ActionType;
use app_pilot::device::activity::ActivityNameMap;
use app_pilot::screen::classifier::Capability;
use app_pilot::state::gui_state::{DescribeMode, GuiState};

use crate::common::utils::{build_state, labeled, snapshot, view};

mod common;

// =========================================================================
// Construction scenarios
// =========================================================================

#[test]
fn single_button_screen_yields_touch_then_go_back() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut button = labeled("android.widget.Button", "Submit");
    button.clickable = true;
    button.parent = 0;

    let state = build_state(vec![root, button]);

    assert_eq!(state.possible_actions.len(), 2);
    assert_eq!(state.possible_actions[0].action_type, ActionType::Touch);
    assert_eq!(state.possible_actions[1].action_type, ActionType::GoBack);
    assert!(
        !state
            .possible_actions
            .iter()
            .any(|a| a.action_type == ActionType::EnterKey),
        "No editable widget, no enter-key action"
    );
}

#[test]
fn text_entry_screens_append_enter_key_last() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut field = labeled("android.widget.EditText", "query");
    field.editable = true;
    field.parent = 0;
    let mut button = labeled("android.widget.Button", "Search");
    button.clickable = true;
    button.parent = 0;

    let state = build_state(vec![root, field, button]);

    let kinds: Vec<ActionType> = state
        .possible_actions
        .iter()
        .map(|a| a.action_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ActionType::SetText,
            ActionType::Touch,
            ActionType::GoBack,
            ActionType::EnterKey,
        ],
        "Widget actions in registration order, then go-back, then enter-key"
    );
}

#[test]
fn empty_screen_has_no_actions_at_all() {
    let state = build_state(vec![view("android.widget.FrameLayout")]);
    assert!(state.possible_actions.is_empty(), "No go-back without widget actions");
    assert_eq!(
        state.describe_screen(DescribeMode::NaturalLanguage, None, true),
        "There are no widgets on this screen."
    );
}

#[test]
fn widgets_with_equal_signatures_keep_the_first_occurrence() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut first = labeled("android.widget.Button", "Buy");
    first.clickable = true;
    first.parent = 0;
    let mut second = labeled("android.widget.Button", "Buy");
    second.clickable = true;
    second.parent = 0;
    second.bounds = [[0, 200], [100, 260]];

    let state = build_state(vec![root, first, second]);

    assert_eq!(state.interactable_widgets.len(), 1, "Duplicate row dropped");
    assert_eq!(state.interactable_widgets[0].view_id, 1, "First wins");
    assert_eq!(state.possible_actions.len(), 2, "One touch plus go-back");
}

#[test]
fn consumed_context_views_are_not_reemitted_as_annotations() {
    // The label is consumed while describing the field, so it must not show
    // up again as a standalone widget.
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

    let state = build_state(vec![root, container, label_parent, field]);

    assert_eq!(state.interactable_widgets.len(), 1);
    assert!(
        state.non_interactable_widgets.is_empty(),
        "The borrowed label was consumed"
    );
    assert_eq!(
        state.interactable_widgets[0].stringify(true),
        "a password textfield that has adjacent_text \"Password\""
    );
}

#[test]
fn leftover_text_views_become_annotation_widgets() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut button = labeled("android.widget.Button", "OK");
    button.clickable = true;
    button.parent = 0;
    let mut banner = labeled("android.widget.TextView", "Welcome back!");
    banner.parent = 0;

    let state = build_state(vec![root, button, banner]);

    assert_eq!(state.non_interactable_widgets.len(), 1);
    assert_eq!(state.non_interactable_widgets[0].view_id, 2);
    assert!(
        state.non_interactable_widgets[0].possible_actions.is_empty(),
        "Annotation widgets carry no actions"
    );
}

#[test]
fn duplicate_annotations_are_deduplicated_too() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut first = labeled("android.widget.TextView", "item");
    first.parent = 0;
    let mut second = labeled("android.widget.TextView", "item");
    second.parent = 0;
    second.bounds = [[0, 50], [100, 80]];

    let state = build_state(vec![root, first, second]);
    assert_eq!(state.non_interactable_widgets.len(), 1);
}

#[test]
fn list_containers_expose_contained_item_samples() {
    let mut list = view("androidx.recyclerview.widget.RecyclerView");
    list.scrollable = true;
    list.children = vec![1, 2];
    let mut first = labeled("android.widget.TextView", "Inbox");
    first.parent = 0;
    let mut second = labeled("android.widget.TextView", "Archive");
    second.parent = 0;

    let state = build_state(vec![list, first, second]);

    let widget = &state.interactable_widgets[0];
    assert_eq!(
        widget.contained_items.as_deref(),
        Some(["Inbox".to_string(), "Archive".to_string()].as_slice())
    );
}

#[test]
fn capability_index_points_back_at_registered_widgets() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut field = labeled("android.widget.EditText", "query");
    field.editable = true;
    field.parent = 0;

    let state = build_state(vec![root, field]);

    let by_settext = state
        .widgets_by_capability
        .get(&Capability::SetText)
        .expect("set_text index exists");
    let widget_index = by_settext[&1];
    assert_eq!(state.interactable_widgets[widget_index].view_id, 1);
}

#[test]
fn temp_id_mismatch_is_rejected() {
    let mut bad = view("android.widget.Button");
    bad.temp_id = Some(3);

    let snap = snapshot(vec![bad]);
    let mut names = ActivityNameMap::new();
    let result = GuiState::from_snapshot(&snap, &mut names);
    assert!(result.is_err(), "temp_id must agree with list position");
}

// =========================================================================
// Activity handling
// =========================================================================

#[test]
fn activity_names_are_normalized_with_a_restore_map() {
    let mut names = ActivityNameMap::new();
    assert_eq!(names.shorten("com.example.app.SettingsActivity"), "Settings");
    assert_eq!(names.shorten("com.example.app.Mainactivity}"), "Main");
    assert_eq!(
        names.original("Settings"),
        Some("com.example.app.SettingsActivity")
    );

    let state = build_state(vec![view("android.widget.FrameLayout")]);
    assert_eq!(state.activity, "Main");
}

#[test]
fn app_activity_depth_finds_the_first_stack_entry() {
    let mut snap = snapshot(vec![view("android.widget.FrameLayout")]);
    snap.activity_stack = vec![
        "com.android.launcher.Home".to_string(),
        "com.example.app.MainActivity".to_string(),
    ];
    let mut names = ActivityNameMap::new();
    let state = GuiState::from_snapshot(&snap, &mut names).unwrap();

    assert_eq!(state.app_activity_depth("com.example.app"), Some(1));
    assert_eq!(state.app_activity_depth("com.missing"), None);
}

// =========================================================================
// Screen rendering
// =========================================================================

#[test]
fn natural_language_rendering_is_position_sorted_with_activity_preamble() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut lower = labeled("android.widget.Button", "Bottom");
    lower.clickable = true;
    lower.parent = 0;
    lower.bounds = [[0, 500], [100, 560]];
    let mut upper = labeled("android.widget.TextView", "Top");
    upper.parent = 0;
    upper.bounds = [[0, 10], [100, 40]];

    let state = build_state(vec![root, lower, upper]);
    let rendering = state.describe_screen(DescribeMode::NaturalLanguage, None, true);

    assert_eq!(
        rendering,
        "Main page: a textview that has text \"Top\", a button that has text \"Bottom\""
    );
}

#[test]
fn jsonl_rendering_groups_widgets_under_section_headers() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut button = labeled("android.widget.Button", "OK");
    button.clickable = true;
    button.parent = 0;
    let mut banner = labeled("android.widget.TextView", "Welcome");
    banner.parent = 0;
    banner.bounds = [[0, 50], [100, 80]];

    let state = build_state(vec![root, button, banner]);
    let rendering = state.describe_screen(DescribeMode::Jsonl, None, true);

    assert!(rendering.starts_with("Interactable widgets:\n"));
    assert!(rendering.contains("\n\nNon-interactable widgets:\n"));
    assert!(rendering.contains("\"ID\":1"), "Interactable records carry IDs");
    assert!(
        !rendering.contains("\"ID\":2"),
        "Annotation records never carry IDs"
    );
    assert!(rendering.contains("\"possible_action_types\":[\"touch\"]"));
}

#[test]
fn oversized_renderings_are_truncated_with_a_marker() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1];
    let mut button = labeled("android.widget.Button", "A very long label indeed");
    button.clickable = true;
    button.parent = 0;

    let state = build_state(vec![root, button]);
    let rendering = state.describe_screen(DescribeMode::NaturalLanguage, Some(10), true);

    assert!(rendering.ends_with("[...truncated...]"));
    assert_eq!(rendering.chars().count(), 10 + "[...truncated...]".len());
}

#[test]
fn possible_action_list_is_enumerated_in_registration_order() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut field = labeled("android.widget.EditText", "query");
    field.editable = true;
    field.parent = 0;
    let mut button = labeled("android.widget.Button", "Search");
    button.clickable = true;
    button.parent = 0;

    let state = build_state(vec![root, field, button]);
    let listing = state.describe_possible_actions(false);
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), state.possible_actions.len());
    for (index, line) in lines.iter().enumerate() {
        assert!(
            line.starts_with(&format!("[Action ID: {index}]")),
            "Line {index} addresses the action at that index: {line}"
        );
    }
    assert!(lines[0].contains("fill in"));
    assert!(lines[1].contains("touch on a button"));
    assert!(lines[2].contains("BACK"));
    assert!(lines[3].contains("enter key"));
}

#[test]
fn construction_and_rendering_are_deterministic() {
    let build = || {
        let mut root = view("android.widget.FrameLayout");
        root.children = vec![1, 2];
        let mut field = labeled("android.widget.EditText", "query");
        field.editable = true;
        field.parent = 0;
        let mut button = labeled("android.widget.Button", "Search");
        button.clickable = true;
        button.parent = 0;
        build_state(vec![root, field, button])
    };

    let first = build();
    let second = build();
    assert_eq!(
        first.describe_screen(DescribeMode::Jsonl, None, true),
        second.describe_screen(DescribeMode::Jsonl, None, true)
    );
    assert_eq!(
        first.describe_possible_actions(true),
        second.describe_possible_actions(true)
    );
}

#[test]
fn widget_lookup_by_view_id_covers_both_lists() {
    let mut root = view("android.widget.FrameLayout");
    root.children = vec![1, 2];
    let mut button = labeled("android.widget.Button", "OK");
    button.clickable = true;
    button.parent = 0;
    let mut banner = labeled("android.widget.TextView", "Welcome");
    banner.parent = 0;

    let state = build_state(vec![root, button, banner]);

    assert!(state.get_widget_by_id(1).is_some());
    assert!(state.get_widget_by_id(2).is_some());
    assert!(state.get_widget_by_id(99).is_none());
}
