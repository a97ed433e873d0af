use serde::{Deserialize, Serialize};

/// Kind of visual element a sync point targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Background,
    Transition,
    /// Generic animation target, used when nothing more specific is known
    Animation,
}

impl ElementKind {
    /// Guess the kind from naming conventions in the element id.
    ///
    /// Only used when the registry entry carries no explicit kind. Ids that
    /// do not follow the `text`/`image`/`img`/`bg`/`background`/`transition`
    /// convention
    /// fall back to [`ElementKind::Animation`].
    pub fn infer(element_id: &str) -> Self {
        let id = element_id.to_lowercase();
        if id.contains("text") {
            ElementKind::Text
        } else if id.contains("image") || id.contains("img") {
            ElementKind::Image
        } else if id.contains("bg") || id.contains("background") {
            ElementKind::Background
        } else if id.contains("transition") {
            ElementKind::Transition
        } else {
            ElementKind::Animation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Background => "background",
            ElementKind::Transition => "transition",
            ElementKind::Animation => "animation",
        }
    }
}

/// One entry of the element registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEntry {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl ElementEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            section_id: None,
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Explicit kind if the registry provides one, otherwise inferred from the id.
    pub fn resolved_kind(&self) -> ElementKind {
        self.kind.unwrap_or_else(|| ElementKind::infer(&self.id))
    }
}

/// The authoring document's element set, as seen by the engine.
pub trait ElementRegistry {
    /// Ordered snapshot taken at generation time.
    fn snapshot(&self) -> Vec<ElementEntry>;

    fn contains(&self, element_id: &str) -> bool;

    /// Section owning the element, if one can be resolved.
    fn section_of(&self, element_id: &str) -> Option<&str>;
}

/// Registry backed by a plain ordered list.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: Vec<ElementEntry>,
}

impl StaticRegistry {
    pub fn new(entries: Vec<ElementEntry>) -> Self {
        Self { entries }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(ElementEntry::new).collect())
    }

    pub fn insert(&mut self, entry: ElementEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.push(entry);
    }

    pub fn remove(&mut self, element_id: &str) -> Option<ElementEntry> {
        let index = self.entries.iter().position(|e| e.id == element_id)?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ElementRegistry for StaticRegistry {
    fn snapshot(&self) -> Vec<ElementEntry> {
        self.entries.clone()
    }

    fn contains(&self, element_id: &str) -> bool {
        self.entries.iter().any(|e| e.id == element_id)
    }

    fn section_of(&self, element_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == element_id)
            .and_then(|e| e.section_id.as_deref())
    }
}
