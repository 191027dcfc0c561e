use super::*;

const SPEAKER_NAME_PREFIX: &str = "SpeakerName.";

impl Dialogue {
    /// The current speaker line with `{name}` placeholders filled from the
    /// dialogue variables. Unknown names are left as written.
    pub fn text(&self) -> String {
        self.render(self.raw_text())
    }

    pub fn raw_text(&self) -> &str {
        match self.speaker_kind() {
            Some(NodeKind::Text { text, .. }) => text.as_str(),
            _ => "",
        }
    }

    pub fn speaker_id(&self) -> &str {
        match self.speaker_kind() {
            Some(NodeKind::Text { speaker_id, .. }) => speaker_id.as_str(),
            _ => "",
        }
    }

    /// `SpeakerName.<id>` when the script or host has set it, else the id.
    pub fn speaker_display_name(&self) -> String {
        let speaker_id = self.speaker_id();
        let key = format!("{}{}", SPEAKER_NAME_PREFIX, speaker_id);
        match self.variables.get(&key) {
            Some(value) => value.to_string(),
            None => speaker_id.to_string(),
        }
    }

    pub fn choice_text(&self, index: usize) -> Option<String> {
        self.choices.get(index).map(|item| self.render(&item.text))
    }

    /// Variable names referenced by the speaker line and the offered options.
    pub fn parameters_in_use(&self) -> BTreeSet<String> {
        let mut params = BTreeSet::new();
        if let Some(NodeKind::Text { param_names, .. }) = self.speaker_kind() {
            params.extend(param_names.iter().cloned());
        }
        for item in &self.choices {
            if let Some(edge) = self.graph.edge(item.edge) {
                params.extend(edge.param_names.iter().cloned());
            }
        }
        params
    }

    fn speaker_kind(&self) -> Option<&NodeKind> {
        self.speaker
            .and_then(|index| self.graph.node(index))
            .map(|node| &node.kind)
    }

    fn render(&self, raw: &str) -> String {
        fill_placeholders(raw, |name| self.variables.get(name).map(ToString::to_string))
    }
}
