use serde::Deserialize;

/// One node of the raw view hierarchy, as reported by the device driver.
///
/// A node's identity is its position in the snapshot's flat `views` list;
/// `parent` and `children` reference those positions. Only a `parent`
/// value greater than zero is followed as an edge.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewNode {
    #[serde(default)]
    pub temp_id: Option<usize>,
    pub class: String,
    pub bounds: [[i32; 2]; 2],
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub checkable: bool,
    #[serde(default)]
    pub long_clickable: bool,
    #[serde(default)]
    pub scrollable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content_description: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default = "default_parent")]
    pub parent: i64,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub focused: Option<bool>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default)]
    pub is_password: Option<bool>,
}

fn default_parent() -> i64 {
    -1
}

impl ViewNode {
    /// Parent edge, if any. Non-positive parent values mean "no parent".
    pub fn parent_id(&self) -> Option<usize> {
        if self.parent > 0 {
            Some(self.parent as usize)
        } else {
            None
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.enabled == Some(false)
    }

    pub fn is_password(&self) -> bool {
        self.is_password == Some(true)
    }
}

/// One captured view hierarchy plus the foreground activity stack.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub tag: String,
    pub views: Vec<ViewNode>,
    pub foreground_activity: String,
    #[serde(default)]
    pub activity_stack: Vec<String>,
}
