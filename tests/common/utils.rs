use app_pilot::device::activity::ActivityNameMap;
use app_pilot::device::device_model::{Snapshot, ViewNode};
use app_pilot::state::gui_state::GuiState;

/// A visible, enabled view with no content and no parent.
pub fn view(class: &str) -> ViewNode {
    ViewNode {
        temp_id: None,
        class: class.to_string(),
        bounds: [[0, 0], [100, 100]],
        visible: true,
        enabled: Some(true),
        clickable: false,
        checkable: false,
        long_clickable: false,
        scrollable: false,
        editable: false,
        text: None,
        content_description: None,
        resource_id: None,
        parent: -1,
        children: vec![],
        focused: None,
        checked: None,
        selected: None,
        is_password: None,
    }
}

pub fn labeled(class: &str, text: &str) -> ViewNode {
    let mut v = view(class);
    v.text = Some(text.to_string());
    v
}

pub fn clickable(class: &str) -> ViewNode {
    let mut v = view(class);
    v.clickable = true;
    v
}

pub fn snapshot(views: Vec<ViewNode>) -> Snapshot {
    Snapshot {
        tag: "state_1".to_string(),
        views,
        foreground_activity: "com.example.app.MainActivity".to_string(),
        activity_stack: vec!["com.example.app.MainActivity".to_string()],
    }
}

pub fn build_state(views: Vec<ViewNode>) -> GuiState {
    let snap = snapshot(views);
    let mut activity_names = ActivityNameMap::new();
    GuiState::from_snapshot(&snap, &mut activity_names).expect("snapshot should be well-formed")
}
