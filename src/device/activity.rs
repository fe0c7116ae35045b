use std::collections::HashMap;

/// Normalizes activity names for display and remembers the original
/// fully-qualified name of each normalized form.
///
/// One instance lives per exploration run; the map only grows.
#[derive(Debug, Default)]
pub struct ActivityNameMap {
    restore: HashMap<String, String>,
}

impl ActivityNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip the package-qualified prefix, a trailing `}`, and a trailing
    /// `Activity`/`activity` suffix. The first original spelling seen for a
    /// normalized name wins.
    pub fn shorten(&mut self, activity: &str) -> String {
        let mut name = activity.rsplit('.').next().unwrap_or(activity).to_string();
        if let Some(stripped) = name.strip_suffix('}') {
            name = stripped.to_string();
        }
        if let Some(stripped) = name.strip_suffix("Activity") {
            name = stripped.to_string();
        } else if let Some(stripped) = name.strip_suffix("activity") {
            name = stripped.to_string();
        }

        self.restore
            .entry(name.clone())
            .or_insert_with(|| activity.to_string());

        name
    }

    /// The original fully-qualified name recorded for a normalized name.
    pub fn original(&self, name: &str) -> Option<&str> {
        self.restore.get(name).map(String::as_str)
    }
}
