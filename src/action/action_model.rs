use serde::Serialize;

use crate::screen::classifier::Capability;
use crate::screen::widget::Widget;

/// The concrete event a chosen action maps to: one per capability, plus the
/// global back-navigation and enter-key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Touch,
    LongTouch,
    Scroll,
    SetText,
    GoBack,
    EnterKey,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Touch => "touch",
            ActionType::LongTouch => "long_touch",
            ActionType::Scroll => "scroll",
            ActionType::SetText => "set_text",
            ActionType::GoBack => "go_back",
            ActionType::EnterKey => "enter_key",
        }
    }

    pub fn from_capability(capability: Capability) -> Self {
        match capability {
            Capability::Touch => ActionType::Touch,
            Capability::LongTouch => ActionType::LongTouch,
            Capability::Scroll => ActionType::Scroll,
            Capability::SetText => ActionType::SetText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "UP",
            ScrollDirection::Down => "DOWN",
            ScrollDirection::Left => "LEFT",
            ScrollDirection::Right => "RIGHT",
        }
    }

    /// First direction token found in a free-form reply, if any.
    pub fn parse(reply: &str) -> Option<Self> {
        let upper = reply.to_uppercase();
        for (token, direction) in [
            ("UP", ScrollDirection::Up),
            ("DOWN", ScrollDirection::Down),
            ("LEFT", ScrollDirection::Left),
            ("RIGHT", ScrollDirection::Right),
        ] {
            if upper
                .split(|c: char| !c.is_ascii_alphabetic())
                .any(|word| word == token)
            {
                return Some(direction);
            }
        }
        None
    }
}

/// The widget an action is bound to, captured as the view id plus its
/// rendered summary so the action can describe itself after the widget list
/// is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionTarget {
    pub view_id: usize,
    pub summary: String,
}

/// One concrete, executable action candidate. Scroll and text-entry actions
/// carry a parameter that is bound only after the action is chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossibleAction {
    pub action_type: ActionType,
    pub target: Option<ActionTarget>,
    pub direction: Option<ScrollDirection>,
    pub input_text: Option<String>,
}

impl PossibleAction {
    pub fn for_capability(capability: Capability, widget: &Widget) -> Vec<PossibleAction> {
        vec![PossibleAction {
            action_type: ActionType::from_capability(capability),
            target: Some(ActionTarget {
                view_id: widget.view_id,
                summary: widget.stringify(true),
            }),
            direction: None,
            input_text: None,
        }]
    }

    pub fn go_back() -> PossibleAction {
        PossibleAction {
            action_type: ActionType::GoBack,
            target: None,
            direction: None,
            input_text: None,
        }
    }

    pub fn enter_key() -> PossibleAction {
        PossibleAction {
            action_type: ActionType::EnterKey,
            target: None,
            direction: None,
            input_text: None,
        }
    }

    pub fn bind_direction(&mut self, direction: ScrollDirection) {
        self.direction = Some(direction);
    }

    pub fn bind_input_text(&mut self, input_text: String) {
        self.input_text = Some(input_text);
    }

    /// Human-readable form shown in the candidate list handed to the
    /// responder.
    pub fn describe(&self, show_widget_id: bool) -> String {
        let target = self.target.as_ref().map(|target| {
            if show_widget_id {
                format!("{} (widget ID: {})", target.summary, target.view_id)
            } else {
                target.summary.clone()
            }
        });

        match (&self.action_type, target) {
            (ActionType::Touch, Some(target)) => format!("touch on {target}"),
            (ActionType::LongTouch, Some(target)) => format!("long touch on {target}"),
            (ActionType::Scroll, Some(target)) => match self.direction {
                Some(direction) => {
                    format!("scroll {} on {target}", direction.as_str().to_lowercase())
                }
                None => format!("scroll on {target}"),
            },
            (ActionType::SetText, Some(target)) => format!("fill in {target}"),
            (ActionType::GoBack, _) => {
                "press \"BACK\" button to return to the previous screen".to_string()
            }
            (ActionType::EnterKey, _) => "press the enter key".to_string(),
            // Widget-bound action types always carry a target; render
            // something sensible if a caller builds one by hand.
            (action_type, None) => action_type.as_str().to_string(),
        }
    }
}
