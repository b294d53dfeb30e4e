use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Maps a free-text gender label ("female", "trans woman", "male organism", ...)
    /// onto the three rendered categories.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("female") || label.contains("woman") {
            Self::Female
        } else if label.contains("male") || label.contains("man") {
            Self::Male
        } else {
            Self::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relative {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub life_span: Option<String>,
}

/// A child of the record's subject, together with the child's other known parents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    #[serde(flatten)]
    pub person: Relative,
    #[serde(default)]
    pub other_parents: Vec<String>,
}

impl Child {
    pub fn id(&self) -> &str {
        &self.person.id
    }

    pub fn has_other_parent(&self, parent_id: &str) -> bool {
        self.other_parents.iter().any(|other| other == parent_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Family {
    #[serde(default)]
    pub parents: Vec<Relative>,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub siblings: Vec<Relative>,
    #[serde(default)]
    pub spouses: Vec<Relative>,
}

impl Family {
    /// Children shared with `other_parent`, i.e. the children of that couple's union.
    pub fn children_with(&self, other_parent: &str) -> Vec<Child> {
        self.children
            .iter()
            .filter(|child| child.has_other_parent(other_parent))
            .cloned()
            .collect()
    }
}

/// Resolved family data for one person. Immutable once cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRecord {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub life_span: Option<String>,
    #[serde(default)]
    pub family: Family,
}

impl FamilyRecord {
    pub fn as_relative(&self) -> Relative {
        Relative {
            id: self.id.clone(),
            label: self.label.clone(),
            gender: self.gender,
            life_span: self.life_span.clone(),
        }
    }

    /// Siblings other than the subject itself.
    pub fn siblings(&self) -> impl Iterator<Item = &Relative> {
        self.family
            .siblings
            .iter()
            .filter(move |sibling| sibling.id != self.id)
    }
}
