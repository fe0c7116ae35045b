use serde_json::{Map, Value, json};
use sha1::{Digest, Sha1};

use crate::action::action_model::PossibleAction;
use crate::device::device_model::ViewNode;
use crate::screen::classifier::Capability;
use crate::screen::describe::DescribedText;

const MAX_LIST_ITEMS: usize = 5;
const ELLIPSIS: &str = "...";

/// Flattened textual description attached to a widget. `adjacent_text`
/// carries labels borrowed from the parent or siblings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetDescription {
    pub text: Vec<String>,
    pub adjacent_text: Vec<String>,
    pub content_description: Vec<String>,
    pub resource_id: Vec<String>,
}

impl WidgetDescription {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.adjacent_text.is_empty()
            && self.content_description.is_empty()
            && self.resource_id.is_empty()
    }
}

/// A described, classified view exposed to the rest of the system.
///
/// Built once per visible view per snapshot. After construction only
/// `possible_actions` accumulates, during action registration.
#[derive(Debug, Clone)]
pub struct Widget {
    pub view_id: usize,
    pub class_name: String,
    /// Row-major screen position `(y, x)`, the sort key for rendering.
    pub position: (i32, i32),
    pub is_password: bool,
    pub contained_items: Option<Vec<String>>,
    pub state: Vec<&'static str>,
    pub description: Option<WidgetDescription>,
    pub capabilities: Vec<Capability>,
    pub possible_actions: Vec<PossibleAction>,
    /// Stable, state-excluding fingerprint used for dedup and for
    /// cross-snapshot correlation by the memory collaborator.
    pub signature: String,
}

impl Widget {
    pub fn new(
        view_id: usize,
        view: &ViewNode,
        description: DescribedText,
        capabilities: Vec<Capability>,
    ) -> Self {
        let mut state = Vec::new();
        if view.focused == Some(true) {
            state.push("focused");
        }
        if view.checked == Some(true) {
            state.push("checked");
        }
        if view.selected == Some(true) {
            state.push("selected");
        }

        let contained_items = if description.contained_items.is_empty() {
            None
        } else {
            Some(description.contained_items.clone())
        };

        let mut widget = Self {
            view_id,
            class_name: view.class.clone(),
            position: (view.bounds[0][1], view.bounds[0][0]),
            is_password: view.is_password(),
            contained_items,
            state,
            description: flatten_description(&description),
            capabilities,
            possible_actions: Vec::new(),
            signature: String::new(),
        };
        widget.signature = format!("{}-{}", widget.class_name, widget.stringify(false));
        widget
    }

    /// SHA-1 hex digest of the signature; the compact correlation key handed
    /// to external memory.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.signature.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Materialize the concrete actions for one capability and keep a copy
    /// on the widget.
    pub fn register_actions(&mut self, capability: Capability) -> Vec<PossibleAction> {
        let actions = PossibleAction::for_capability(capability, self);
        self.possible_actions.extend(actions.iter().cloned());
        actions
    }

    /// Compact record form for the structured screen rendering, one JSON
    /// object per widget.
    pub fn to_record(&self, with_id: bool) -> Value {
        let mut record = Map::new();
        if with_id {
            record.insert("ID".to_string(), json!(self.view_id));
        }
        record.insert("widget_type".to_string(), json!(self.class_name));

        if let Some(description) = &self.description {
            insert_text_value(&mut record, "text", &description.text);
            insert_text_value(&mut record, "adjacent_text", &description.adjacent_text);
            insert_text_value(
                &mut record,
                "content_description",
                &description.content_description,
            );
            insert_text_value(&mut record, "resource_id", &description.resource_id);
        }
        if self.is_password {
            record.insert("is_password".to_string(), json!(true));
        }
        if let Some(items) = &self.contained_items {
            record.insert("contained_items".to_string(), json!(items));
        }
        if !self.state.is_empty() {
            record.insert("state".to_string(), json!(self.state));
        }
        if !self.capabilities.is_empty() {
            let tags: Vec<&str> = self.capabilities.iter().map(Capability::as_str).collect();
            record.insert("possible_action_types".to_string(), json!(tags));
        }

        Value::Object(record)
    }

    /// English noun-phrase rendering of the widget.
    ///
    /// With `include_mutable` the state flags, contained items, and current
    /// text of editable widgets are rendered; without it they are omitted, so
    /// the result is stable across snapshots and usable as an identity.
    pub fn stringify(&self, include_mutable: bool) -> String {
        let mut repr = String::new();
        if include_mutable && !self.state.is_empty() {
            repr.push_str(&self.state.join(", "));
            repr.push(' ');
        }
        repr.push_str(self.kind_phrase());

        let article = match repr.chars().next() {
            Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
            _ => "a",
        };
        let repr = format!("{article} {repr}");

        let empty = WidgetDescription::default();
        let description = self.description.as_ref().unwrap_or(&empty);

        let include_text = include_mutable || !self.capabilities.contains(&Capability::SetText);

        let mut clauses = Vec::new();
        if include_text {
            clauses.extend(literal_clause("text", "texts", &description.text));
        }
        clauses.extend(literal_clause(
            "adjacent_text",
            "adjacent_texts",
            &description.adjacent_text,
        ));
        if include_mutable {
            if let Some(items) = &self.contained_items {
                let quoted: Vec<String> = items.iter().map(|item| format!("\"{item}\"")).collect();
                clauses.push(format!("contained items such as {}", quoted.join(", ")));
            }
        }
        clauses.extend(literal_clause(
            "content_desc",
            "content_descs",
            &description.content_description,
        ));
        clauses.extend(literal_clause(
            "resource_id",
            "resource_ids",
            &description.resource_id,
        ));

        if clauses.is_empty() {
            repr
        } else {
            format!("{repr} that has {}", clauses.join(" and "))
        }
    }

    // Class-name substring dispatch, in fixed priority order; later entries
    // are fallbacks only reached when earlier ones do not match.
    fn kind_phrase(&self) -> &'static str {
        let class = self.class_name.as_str();
        if self.is_password {
            "password textfield"
        } else if class.contains("EditText") {
            "textfield"
        } else if class.contains("Button") {
            "button"
        } else if class.contains("CheckBox") {
            "checkbox"
        } else if class.contains("RadioButton") {
            "radio button"
        } else if class.contains("Spinner") {
            "dropdown field"
        } else if class.ends_with("Tab") {
            "tab"
        } else if self.capabilities.contains(&Capability::Touch) {
            "button"
        } else if self.capabilities.contains(&Capability::Scroll) {
            "scrollable area"
        } else if self.capabilities.contains(&Capability::SetText) {
            "textfield"
        } else if class.contains("TextView") {
            "textview"
        } else if class.contains("ImageView") {
            "imageview"
        } else if class.contains("LinearLayout") {
            "linearlayout"
        } else if class.contains("RelativeLayout") {
            "relativelayout"
        } else if class.contains("FrameLayout") {
            "framelayout"
        } else if class.contains("GridLayout") {
            "gridlayout"
        } else if class.contains("RecyclerView") {
            "recyclerview"
        } else if class.contains("ListView") {
            "listview"
        } else {
            "widget"
        }
    }
}

/// Flatten a context-borrowing description into the widget's record form:
/// parent text fills `adjacent_text` only when the widget has no text of its
/// own, sibling text always lands there.
fn flatten_description(description: &DescribedText) -> Option<WidgetDescription> {
    let text = description.text.clone();

    let mut adjacent_text = Vec::new();
    if let Some(parent) = &description.parent {
        if text.is_empty() {
            adjacent_text.extend(parent.text.iter().cloned());
        }
    }
    if let Some(siblings) = &description.siblings {
        adjacent_text.extend(siblings.text.iter().cloned());
    }

    let resource_id: Vec<String> = description
        .resource_id
        .iter()
        .map(|id| id.rsplit('/').next().unwrap_or(id).to_string())
        .collect();

    let flattened = WidgetDescription {
        text: cap_list(text),
        adjacent_text: cap_list(adjacent_text),
        content_description: cap_list(description.content_description.clone()),
        resource_id: cap_list(resource_id),
    };

    if flattened.is_empty() {
        None
    } else {
        Some(flattened)
    }
}

fn cap_list(mut values: Vec<String>) -> Vec<String> {
    if values.len() > MAX_LIST_ITEMS {
        values.truncate(MAX_LIST_ITEMS);
        values.push(ELLIPSIS.to_string());
    }
    values
}

fn insert_text_value(record: &mut Map<String, Value>, key: &str, values: &[String]) {
    match values {
        [] => {}
        [single] => {
            record.insert(key.to_string(), json!(single));
        }
        many => {
            record.insert(key.to_string(), json!(many));
        }
    }
}

/// Quoted-literal clause for one description key: scalar values render under
/// the singular label, lists under the plural one with a literal `...` kept
/// for a truncated tail.
fn literal_clause(singular: &str, plural: &str, values: &[String]) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(format!("{singular} \"{single}\"")),
        many => {
            let mut quoted: Vec<String> = many.iter().map(|v| format!("\"{v}\"")).collect();
            if quoted.last().map(String::as_str) == Some("\"...\"") {
                let last = quoted.len() - 1;
                quoted[last] = ELLIPSIS.to_string();
            }
            Some(format!("{plural} {}", quoted.join(", ")))
        }
    }
}
