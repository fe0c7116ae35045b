use std::collections::{BTreeMap, HashMap, HashSet};

use crate::action::action_model::PossibleAction;
use crate::agent::error::AgentError;
use crate::device::activity::ActivityNameMap;
use crate::device::device_model::Snapshot;
use crate::screen::classifier::{Capability, classify_interactable};
use crate::screen::describe::{
    describe_view, describe_with_context, is_list_container, sample_contained_items,
};
use crate::screen::visibility::visible_views;
use crate::screen::widget::Widget;

pub const DEFAULT_SCREEN_LIMIT: usize = 6000;
const TRUNCATION_MARKER: &str = "[...truncated...]";

/// Screen rendering mode: a natural-language sentence or one structured
/// record per widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeMode {
    NaturalLanguage,
    Jsonl,
}

/// The aggregate for one snapshot: described widgets plus the concrete,
/// index-addressable candidate-action list. Built once, read-only after.
#[derive(Debug)]
pub struct GuiState {
    pub tag: String,
    pub activity: String,
    pub activity_stack: Vec<String>,
    pub interactable_widgets: Vec<Widget>,
    pub non_interactable_widgets: Vec<Widget>,
    /// The action index in this list is the action's external identity for
    /// the lifetime of the snapshot.
    pub possible_actions: Vec<PossibleAction>,
    /// capability → view id → index into `interactable_widgets`.
    pub widgets_by_capability: HashMap<Capability, BTreeMap<usize, usize>>,
}

impl GuiState {
    /// Convert one raw snapshot into a GUI state.
    ///
    /// Enumeration follows the classifier's (ascending view id) order. A
    /// widget whose signature was already registered this snapshot is
    /// dropped, keeping the first occurrence. The global "go back" action is
    /// appended iff any widget action was registered, and "enter key" after
    /// it iff any widget accepts text.
    pub fn from_snapshot(
        snapshot: &Snapshot,
        activity_names: &mut ActivityNameMap,
    ) -> Result<GuiState, AgentError> {
        for (index, view) in snapshot.views.iter().enumerate() {
            if let Some(temp_id) = view.temp_id {
                if temp_id != index {
                    return Err(AgentError::Snapshot(format!(
                        "view temp_id {temp_id} does not match its position {index}"
                    )));
                }
            }
        }

        let views = visible_views(&snapshot.views);
        let capabilities = classify_interactable(&views);

        let mut state = GuiState {
            tag: snapshot.tag.clone(),
            activity: activity_names.shorten(&snapshot.foreground_activity),
            activity_stack: snapshot.activity_stack.clone(),
            interactable_widgets: Vec::new(),
            non_interactable_widgets: Vec::new(),
            possible_actions: Vec::new(),
            widgets_by_capability: HashMap::new(),
        };

        let mut seen_signatures: HashSet<String> = HashSet::new();
        let mut used_ids: HashSet<usize> = HashSet::new();
        let mut has_textfield = false;

        for (&view_id, tags) in &capabilities {
            let view = views[&view_id];
            let (mut description, visited) = describe_with_context(view_id, view, &views);
            used_ids.extend(visited);

            if is_list_container(&view.class) {
                let items = sample_contained_items(view, &views);
                if !items.is_empty() {
                    description.contained_items = items;
                }
            }

            let mut widget = Widget::new(view_id, view, description, tags.clone());
            if !seen_signatures.insert(widget.signature.clone()) {
                continue;
            }

            for &capability in tags {
                let actions = widget.register_actions(capability);
                state.possible_actions.extend(actions);
                if capability == Capability::SetText {
                    has_textfield = true;
                }
            }

            let widget_index = state.interactable_widgets.len();
            for &capability in tags {
                state
                    .widgets_by_capability
                    .entry(capability)
                    .or_default()
                    .insert(view_id, widget_index);
            }
            state.interactable_widgets.push(widget);
        }

        if !state.possible_actions.is_empty() {
            state.possible_actions.push(PossibleAction::go_back());
        }
        if has_textfield {
            state.possible_actions.push(PossibleAction::enter_key());
        }

        // Leftover visible views that still carry text of their own become
        // annotation-only widgets: described context-free, no actions.
        for (&view_id, &view) in &views {
            if used_ids.contains(&view_id) {
                continue;
            }
            let description = describe_view(view, &views, false, false);
            if description.is_empty() {
                continue;
            }
            let widget = Widget::new(view_id, view, description, Vec::new());
            if !seen_signatures.insert(widget.signature.clone()) {
                continue;
            }
            state.non_interactable_widgets.push(widget);
        }

        Ok(state)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.interactable_widgets
            .iter()
            .chain(self.non_interactable_widgets.iter())
    }

    pub fn get_widget_by_id(&self, view_id: usize) -> Option<&Widget> {
        self.widgets().find(|widget| widget.view_id == view_id)
    }

    /// Depth of the first activity-stack entry belonging to the package, or
    /// None when the app is nowhere on the stack.
    pub fn app_activity_depth(&self, package_name: &str) -> Option<usize> {
        self.activity_stack
            .iter()
            .position(|activity| activity.contains(package_name))
    }

    /// Render the screen, truncating to `length_limit` characters with an
    /// explicit marker. Truncation is a best-effort safeguard against
    /// oversized prompts, not a semantic operation.
    pub fn describe_screen(
        &self,
        mode: DescribeMode,
        length_limit: Option<usize>,
        show_id: bool,
    ) -> String {
        let description = match mode {
            DescribeMode::Jsonl => self.describe_screen_jsonl(show_id),
            DescribeMode::NaturalLanguage => self.describe_screen_nl(),
        };

        match length_limit {
            Some(limit) if description.chars().count() > limit => {
                let mut truncated: String = description.chars().take(limit).collect();
                truncated.push_str(TRUNCATION_MARKER);
                truncated
            }
            _ => description,
        }
    }

    fn describe_screen_jsonl(&self, show_id: bool) -> String {
        let interactable = render_records(&self.interactable_widgets, show_id);
        let non_interactable = render_records(&self.non_interactable_widgets, false);

        format!("Interactable widgets:\n{interactable}\n\nNon-interactable widgets:\n{non_interactable}")
    }

    fn describe_screen_nl(&self) -> String {
        let mut widgets: Vec<&Widget> = self.widgets().collect();
        widgets.sort_by_key(|widget| widget.position);

        if widgets.is_empty() {
            return "There are no widgets on this screen.".to_string();
        }

        let parts: Vec<String> = widgets
            .iter()
            .map(|widget| widget.stringify(true))
            .collect();
        format!("{} page: {}", self.activity, parts.join(", "))
    }

    /// The enumerated candidate list shown to the responder in the matching
    /// phase, one `[Action ID: i]` line per action.
    pub fn describe_possible_actions(&self, show_widget_id: bool) -> String {
        self.possible_actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                format!("[Action ID: {index}] {}", action.describe(show_widget_id))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_records(widgets: &[Widget], with_id: bool) -> String {
    let mut sorted: Vec<&Widget> = widgets.iter().collect();
    sorted.sort_by_key(|widget| widget.position);

    sorted
        .iter()
        .map(|widget| widget.to_record(with_id).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
