use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use arvore::family::JsonFamilySource;
use arvore::tree::trigger::trigger_id;
use arvore::tree::union::union_id;
use arvore::tree::{
    EdgeKind, ExpansionController, LayoutConfig, TreeState, TriggerKind, UnionState, trace,
};
use futures::executor::LocalPool;

const FAMILY: &str = r#"{
    "people": [
        {"id": "Q1", "label": "Elizabeth", "gender": "female", "spouses": ["Q2"]},
        {"id": "Q2", "label": "Philip", "gender": "male"},
        {"id": "Q3", "label": "Charles", "gender": "male", "parents": ["Q1", "Q2"],
         "spouses": ["Q5"]},
        {"id": "Q4", "label": "Anne", "gender": "female", "parents": ["Q1", "Q2"]},
        {"id": "Q5", "label": "Diana", "gender": "female"},
        {"id": "Q6", "label": "William", "gender": "male", "parents": ["Q3", "Q5"]}
    ]
}"#;

struct Session {
    pool: LocalPool,
    controller: ExpansionController,
}

impl Session {
    fn new() -> Self {
        let source = JsonFamilySource::from_json_str(FAMILY).expect("valid dataset");
        let pool = LocalPool::new();
        let state = Rc::new(RefCell::new(TreeState::new(LayoutConfig::default())));
        let controller = ExpansionController::new(state, Rc::new(source), pool.spawner());
        Self { pool, controller }
    }

    /// Runs spawned work until every lookup thread has answered.
    fn settle(&mut self) {
        for _ in 0..400 {
            self.pool.run_until_stalled();
            if self.controller.state().borrow().loading_count() == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("family lookups did not finish");
    }

    fn contains(&self, id: &str) -> bool {
        self.controller.state().borrow().store().contains(id)
    }

    fn union_state(&self, id: &str) -> Option<UnionState> {
        self.controller
            .state()
            .borrow()
            .store()
            .node(id)
            .and_then(|node| node.as_union())
            .map(|union| union.state)
    }

    fn edge_kind(&self, from: &str, to: &str) -> Option<EdgeKind> {
        self.controller
            .state()
            .borrow()
            .store()
            .edge(from, to)
            .map(|edge| edge.kind)
    }
}

#[test]
fn seeding_by_name_resolves_the_placeholder() {
    let mut session = Session::new();

    let placeholder = session.controller.seed("Charles").expect("non-empty term");
    session.settle();

    assert!(!session.contains(&placeholder));
    assert!(session.contains("Q3"));
    assert!(session.contains(&trigger_id(TriggerKind::Parents, "Q3")));
    assert!(session.contains(&trigger_id(TriggerKind::Siblings, "Q3")));
    assert!(session.contains(&trigger_id(TriggerKind::Spouses, "Q3")));

    let state = session.controller.state().borrow();
    assert!(!state.is_busy());
    let person = state
        .store()
        .node("Q3")
        .and_then(|node| node.as_person())
        .expect("resolved person");
    assert!(person.resolved);
    assert_eq!(person.label, "Charles");
}

#[test]
fn parents_then_union_click_reveals_the_whole_family() {
    let mut session = Session::new();
    session.controller.seed("Charles");
    session.settle();

    session
        .controller
        .activate(&trigger_id(TriggerKind::Parents, "Q3"));
    session.settle();

    let couple = union_id("Q1", "Q2");
    assert!(session.contains("Q1"));
    assert!(session.contains("Q2"));
    assert_eq!(session.edge_kind(&couple, "Q3"), Some(EdgeKind::Descent));
    assert_eq!(session.edge_kind("Q1", &couple), Some(EdgeKind::Partner));
    assert_eq!(session.union_state(&couple), Some(UnionState::Collapsed(2)));
    assert!(!session.contains(&trigger_id(TriggerKind::Parents, "Q3")));

    session.controller.activate(&couple);
    session.settle();

    assert!(session.contains("Q4"));
    assert_eq!(session.edge_kind(&couple, "Q4"), Some(EdgeKind::Descent));
    assert_eq!(session.union_state(&couple), Some(UnionState::Expanded));

    session.controller.activate(&couple);
    session.settle();

    assert!(!session.contains("Q4"));
    assert!(!session.contains("Q3"));
    assert!(!session.contains(&trigger_id(TriggerKind::Siblings, "Q3")));
    assert_eq!(session.union_state(&couple), Some(UnionState::Collapsed(2)));
    assert!(!session.controller.state().borrow().is_busy());
}

#[test]
fn bloodline_follows_ancestors_and_skips_siblings() {
    let mut session = Session::new();
    session.controller.seed("Charles");
    session.settle();
    session
        .controller
        .activate(&trigger_id(TriggerKind::Parents, "Q3"));
    session.settle();
    session.controller.activate(&union_id("Q1", "Q2"));
    session.settle();

    {
        let state = session.controller.state().borrow();
        let line = trace(state.store(), "Q3");
        assert!(line.nodes.contains("Q1"));
        assert!(line.nodes.contains("Q2"));
        assert!(line.nodes.contains(&union_id("Q1", "Q2")));
        assert!(!line.nodes.contains("Q4"));
    }

    session.controller.select("Q3");
    let state = session.controller.state().borrow();
    assert_eq!(state.selected(), Some("Q3"));
    let opacity = |id: &str| {
        state
            .store()
            .node(id)
            .map(|node| node.style.fill_opacity)
            .expect("node on the tree")
    };
    assert_eq!(opacity("Q1"), 1.0);
    assert!(opacity("Q4") < 1.0);
}

#[test]
fn spouse_trigger_adds_the_couple_with_its_children_count() {
    let mut session = Session::new();
    session.controller.seed("Q3");
    session.settle();

    session
        .controller
        .activate(&trigger_id(TriggerKind::Spouses, "Q3"));
    session.settle();

    let couple = union_id("Q3", "Q5");
    assert!(session.contains("Q5"));
    assert_eq!(session.union_state(&couple), Some(UnionState::Collapsed(1)));
    assert!(!session.contains(&trigger_id(TriggerKind::Spouses, "Q3")));
}

#[test]
fn unknown_terms_leave_a_lone_placeholder() {
    let mut session = Session::new();

    let placeholder = session.controller.seed("xqxq").expect("non-empty term");
    session.settle();

    let state = session.controller.state().borrow();
    assert_eq!(state.store().len(), 1);
    assert!(state.store().contains(&placeholder));
    assert!(state.session().record(&placeholder).is_none());
    assert!(!state.is_busy());
}
