use eframe::egui::{Color32, Vec2, vec2};

use crate::family::{Child, Gender};

const MALE_FILL: Color32 = Color32::from_rgb(0xAD, 0xD8, 0xE6);
const FEMALE_FILL: Color32 = Color32::from_rgb(0xFF, 0xB6, 0xC1);
const UNKNOWN_FILL: Color32 = Color32::from_rgb(0xE0, 0xE0, 0xE0);
const UNION_FILL: Color32 = Color32::from_rgb(0x44, 0x44, 0x44);
const BORDER: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
const RING_BORDER: Color32 = Color32::from_rgb(0xFF, 0xD7, 0x00);
const SIBLING_BORDER: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);
const SIBLING_EDGE: Color32 = Color32::from_rgb(0xE0, 0xE0, 0xE0);

pub fn gender_color(gender: Gender) -> Color32 {
    match gender {
        Gender::Male => MALE_FILL,
        Gender::Female => FEMALE_FILL,
        Gender::Unknown => UNKNOWN_FILL,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub fill: Color32,
    pub border: Color32,
    pub border_width: f32,
    pub fill_opacity: f32,
    pub label_opacity: f32,
}

impl NodeStyle {
    pub fn person(gender: Gender) -> Self {
        Self {
            fill: gender_color(gender),
            border: BORDER,
            border_width: 1.0,
            fill_opacity: 1.0,
            label_opacity: 1.0,
        }
    }

    pub fn union(state: UnionState) -> Self {
        let fill = match state {
            UnionState::Empty => UNION_FILL,
            UnionState::Collapsed(_) | UnionState::Expanded => Color32::WHITE,
        };
        Self {
            fill,
            border: UNION_FILL,
            border_width: 1.0,
            fill_opacity: 1.0,
            label_opacity: 1.0,
        }
    }

    pub fn trigger(kind: TriggerKind) -> Self {
        let border = match kind {
            TriggerKind::Parents => Color32::from_rgb(0xCC, 0xCC, 0xCC),
            TriggerKind::Spouses => RING_BORDER,
            TriggerKind::Siblings => SIBLING_BORDER,
        };
        Self {
            fill: Color32::WHITE,
            border,
            border_width: 1.0,
            fill_opacity: 1.0,
            label_opacity: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Parents,
    Spouses,
    Siblings,
}

impl TriggerKind {
    pub const ALL: [Self; 3] = [Self::Parents, Self::Spouses, Self::Siblings];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Parents => "parents",
            Self::Spouses => "spouses",
            Self::Siblings => "siblings",
        }
    }

    /// Where the trigger sits relative to its owner.
    pub fn offset(self) -> Vec2 {
        match self {
            Self::Parents => vec2(0.0, -35.0),
            Self::Siblings => vec2(-55.0, -35.0),
            Self::Spouses => vec2(55.0, -35.0),
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Parents => "▲",
            Self::Spouses => "💍",
            Self::Siblings => "⇄",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnionState {
    #[default]
    Empty,
    Collapsed(usize),
    Expanded,
}

impl UnionState {
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Empty
        } else {
            Self::Collapsed(count)
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Collapsed(count) => format!("{count} ▼"),
            Self::Expanded => "✕".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub label: String,
    pub gender: Gender,
    pub life_span: Option<String>,
    /// `false` while the node is a placeholder named after a search term.
    pub resolved: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Union {
    /// Sorted pair of spouse ids.
    pub spouses: [String; 2],
    pub children: Vec<Child>,
    pub state: UnionState,
}

impl Union {
    pub fn other_spouse(&self, id: &str) -> Option<&str> {
        match &self.spouses {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub person_id: String,
    pub pending: usize,
    /// Siblings only: the owner's siblings are currently shown.
    pub toggled: bool,
}

impl Trigger {
    pub fn label(&self) -> String {
        if self.toggled {
            return "✕".to_owned();
        }
        match self.kind {
            TriggerKind::Parents => self.kind.icon().to_owned(),
            TriggerKind::Spouses | TriggerKind::Siblings if self.pending > 0 => {
                format!("{}\n{}", self.pending, self.kind.icon())
            }
            TriggerKind::Spouses | TriggerKind::Siblings => self.kind.icon().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Person(Person),
    Union(Union),
    Trigger(Trigger),
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub font_size: f32,
    pub pinned: bool,
    /// Temporary anchor lock, released by the frame clock.
    pub locked_until: Option<f64>,
    pub style: NodeStyle,
}

impl GraphNode {
    pub fn person(id: impl Into<String>, person: Person, pos: Vec2, font_size: f32) -> Self {
        let style = NodeStyle::person(person.gender);
        Self::new(id.into(), NodeKind::Person(person), pos, font_size, style)
    }

    pub fn union(id: impl Into<String>, union: Union, pos: Vec2) -> Self {
        let style = NodeStyle::union(union.state);
        Self::new(id.into(), NodeKind::Union(union), pos, 14.0, style)
    }

    pub fn trigger(id: impl Into<String>, trigger: Trigger, pos: Vec2) -> Self {
        let style = NodeStyle::trigger(trigger.kind);
        Self::new(id.into(), NodeKind::Trigger(trigger), pos, 12.0, style)
    }

    fn new(id: String, kind: NodeKind, pos: Vec2, font_size: f32, style: NodeStyle) -> Self {
        Self {
            id,
            kind,
            pos,
            velocity: Vec2::ZERO,
            font_size,
            pinned: false,
            locked_until: None,
            style,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.pinned || self.locked_until.is_some()
    }

    pub fn is_person(&self) -> bool {
        matches!(self.kind, NodeKind::Person(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, NodeKind::Union(_))
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, NodeKind::Trigger(_))
    }

    pub fn as_person(&self) -> Option<&Person> {
        match &self.kind {
            NodeKind::Person(person) => Some(person),
            _ => None,
        }
    }

    pub fn as_person_mut(&mut self) -> Option<&mut Person> {
        match &mut self.kind {
            NodeKind::Person(person) => Some(person),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Union> {
        match &self.kind {
            NodeKind::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_union_mut(&mut self) -> Option<&mut Union> {
        match &mut self.kind {
            NodeKind::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_trigger(&self) -> Option<&Trigger> {
        match &self.kind {
            NodeKind::Trigger(trigger) => Some(trigger),
            _ => None,
        }
    }

    pub fn as_trigger_mut(&mut self) -> Option<&mut Trigger> {
        match &mut self.kind {
            NodeKind::Trigger(trigger) => Some(trigger),
            _ => None,
        }
    }

    /// Text drawn inside the node.
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Person(person) => person.label.clone(),
            NodeKind::Union(union) => union.state.label(),
            NodeKind::Trigger(trigger) => trigger.label(),
        }
    }

    /// Horizontal footprint used by the overlap resolver.
    pub fn width(&self, person_width: f32, compact_width: f32) -> f32 {
        if self.is_person() {
            person_width
        } else {
            compact_width
        }
    }

    pub(crate) fn set_union_state(&mut self, state: UnionState) {
        if let NodeKind::Union(union) = &mut self.kind {
            union.state = state;
            let (opacity, label_opacity) = (self.style.fill_opacity, self.style.label_opacity);
            self.style = NodeStyle {
                fill_opacity: opacity,
                label_opacity,
                ..NodeStyle::union(state)
            };
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Person or union to child. Visible, arrowed.
    Descent,
    /// Spouse to the couple's union.
    Partner,
    /// Spouse to spouse. Invisible, physics only.
    SpouseBind,
    /// Dashed link between siblings. Leash only, no spring.
    Sibling,
}

impl EdgeKind {
    pub fn default_style(self) -> EdgeStyle {
        match self {
            Self::Descent => EdgeStyle {
                color: BORDER,
                width: 1.0,
                dashed: false,
                visible: true,
            },
            Self::Partner => EdgeStyle {
                color: BORDER,
                width: 1.5,
                dashed: false,
                visible: true,
            },
            Self::SpouseBind => EdgeStyle {
                color: Color32::TRANSPARENT,
                width: 0.0,
                dashed: false,
                visible: false,
            },
            Self::Sibling => EdgeStyle {
                color: SIBLING_EDGE,
                width: 1.0,
                dashed: true,
                visible: true,
            },
        }
    }

    /// Rest length of the base-physics spring. `None` for edges without a spring.
    pub fn rest_length(self) -> Option<f32> {
        match self {
            Self::Descent => Some(150.0),
            Self::Partner => Some(120.0),
            Self::SpouseBind => Some(160.0),
            Self::Sibling => None,
        }
    }

    /// Edges that carry lineage for bloodline tracing.
    pub fn is_lineage(self) -> bool {
        matches!(self, Self::Descent | Self::Partner)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub color: Color32,
    pub width: f32,
    pub dashed: bool,
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u64);

#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub style: EdgeStyle,
}

impl Edge {
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_labels_follow_pending_and_toggle() {
        let mut trigger = Trigger {
            kind: TriggerKind::Siblings,
            person_id: "P".into(),
            pending: 3,
            toggled: false,
        };
        assert_eq!(trigger.label(), "3\n⇄");
        trigger.pending = 0;
        assert_eq!(trigger.label(), "⇄");
        trigger.toggled = true;
        assert_eq!(trigger.label(), "✕");

        let parents = Trigger {
            kind: TriggerKind::Parents,
            person_id: "P".into(),
            pending: 2,
            toggled: false,
        };
        assert_eq!(parents.label(), "▲");
    }

    #[test]
    fn union_state_labels_and_restyle() {
        assert_eq!(UnionState::from_count(0), UnionState::Empty);
        assert_eq!(UnionState::from_count(4).label(), "4 ▼");

        let union = Union {
            spouses: ["a".into(), "b".into()],
            children: Vec::new(),
            state: UnionState::Empty,
        };
        let mut node = GraphNode::union("union_a_b", union, Vec2::ZERO);
        assert_eq!(node.style.fill, UNION_FILL);

        node.style.fill_opacity = 0.25;
        node.set_union_state(UnionState::Expanded);
        assert_eq!(node.label(), "✕");
        assert_eq!(node.style.fill, Color32::WHITE);
        assert_eq!(node.style.fill_opacity, 0.25);
        assert_eq!(node.as_union().and_then(|u| u.other_spouse("b")), Some("a"));
    }
}
