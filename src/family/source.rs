use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use super::parse::{RawPerson, parse_people};
use super::provider::{FamilyProvider, Lookup, LookupError};
use super::record::{Child, Family, FamilyRecord, Gender, Relative};

#[derive(Clone, Debug)]
struct PersonEntry {
    id: String,
    label: String,
    gender: Gender,
    life_span: Option<String>,
    parents: Vec<String>,
    spouses: Vec<String>,
    siblings: Vec<String>,
    children: Vec<String>,
}

/// An in-memory people graph with every relation made symmetric.
#[derive(Clone, Debug)]
pub struct Dataset {
    people: HashMap<String, PersonEntry>,
    by_label: HashMap<String, String>,
    by_alias: HashMap<String, String>,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_owned());
    }
}

impl Dataset {
    fn from_raw(raw_people: Vec<RawPerson>) -> Self {
        let known_ids = raw_people
            .iter()
            .map(|person| person.id.clone())
            .collect::<HashSet<_>>();

        let mut people = HashMap::with_capacity(raw_people.len());
        let mut by_label = HashMap::new();
        let mut by_alias = HashMap::new();

        for raw in raw_people {
            let clean = |ids: Vec<String>| {
                let mut ids = ids
                    .into_iter()
                    .filter(|id| id != &raw.id && known_ids.contains(id))
                    .collect::<Vec<_>>();
                let mut seen = HashSet::new();
                ids.retain(|id| seen.insert(id.clone()));
                ids
            };

            let parents = clean(raw.parents.clone());
            let spouses = clean(raw.spouses.clone());
            let siblings = clean(raw.siblings.clone());
            let children = clean(raw.children.clone());

            by_label
                .entry(raw.label.to_lowercase())
                .or_insert_with(|| raw.id.clone());
            for alias in &raw.aliases {
                by_alias
                    .entry(alias.to_lowercase())
                    .or_insert_with(|| raw.id.clone());
            }

            people.insert(
                raw.id.clone(),
                PersonEntry {
                    id: raw.id,
                    label: raw.label,
                    gender: raw
                        .gender
                        .as_deref()
                        .map(Gender::from_label)
                        .unwrap_or_default(),
                    life_span: raw.life_span,
                    parents,
                    spouses,
                    siblings,
                    children,
                },
            );
        }

        let mut dataset = Self {
            people,
            by_label,
            by_alias,
        };
        dataset.link_reverse_relations();
        dataset
    }

    fn link_reverse_relations(&mut self) {
        let mut reverse_children: Vec<(String, String)> = Vec::new();
        let mut reverse_parents: Vec<(String, String)> = Vec::new();
        let mut reverse_spouses: Vec<(String, String)> = Vec::new();
        let mut reverse_siblings: Vec<(String, String)> = Vec::new();

        for (id, person) in &self.people {
            for parent in &person.parents {
                reverse_children.push((parent.clone(), id.clone()));
            }
            for child in &person.children {
                reverse_parents.push((child.clone(), id.clone()));
            }
            for spouse in &person.spouses {
                reverse_spouses.push((spouse.clone(), id.clone()));
            }
            for sibling in &person.siblings {
                reverse_siblings.push((sibling.clone(), id.clone()));
            }
        }

        reverse_children.sort();
        reverse_parents.sort();
        reverse_spouses.sort();
        reverse_siblings.sort();

        for (parent, child) in reverse_children {
            if let Some(entry) = self.people.get_mut(&parent) {
                push_unique(&mut entry.children, &child);
            }
        }
        for (child, parent) in reverse_parents {
            if let Some(entry) = self.people.get_mut(&child) {
                push_unique(&mut entry.parents, &parent);
            }
        }
        for (spouse, id) in reverse_spouses {
            if let Some(entry) = self.people.get_mut(&spouse) {
                push_unique(&mut entry.spouses, &id);
            }
        }
        for (sibling, id) in reverse_siblings {
            if let Some(entry) = self.people.get_mut(&sibling) {
                push_unique(&mut entry.siblings, &id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    fn relative(&self, id: &str) -> Option<Relative> {
        self.people.get(id).map(|entry| Relative {
            id: entry.id.clone(),
            label: entry.label.clone(),
            gender: entry.gender,
            life_span: entry.life_span.clone(),
        })
    }

    pub fn resolve_term(&self, term: &str) -> Option<&str> {
        let key = term.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        if let Some(id) = self.by_label.get(&key).or_else(|| self.by_alias.get(&key)) {
            return Some(id.as_str());
        }

        if let Some(entry) = self.people.get(term.trim()) {
            return Some(entry.id.as_str());
        }

        let matcher = SkimMatcherV2::default();
        self.people
            .values()
            .filter_map(|entry| {
                fuzzy_match_score(&matcher, &entry.label, term.trim())
                    .map(|score| (score, entry.label.len(), entry.id.as_str()))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)).then_with(|| b.2.cmp(a.2)))
            .map(|(_, _, id)| id)
    }

    pub fn record(&self, id: &str) -> Option<FamilyRecord> {
        let entry = self.people.get(id)?;

        let parents = entry
            .parents
            .iter()
            .filter_map(|parent| self.relative(parent))
            .collect::<Vec<_>>();

        let mut co_parents = Vec::new();
        let children = entry
            .children
            .iter()
            .filter_map(|child_id| {
                let child = self.people.get(child_id)?;
                let other_parents = child
                    .parents
                    .iter()
                    .filter(|parent| parent.as_str() != id)
                    .cloned()
                    .collect::<Vec<_>>();
                for other in &other_parents {
                    push_unique(&mut co_parents, other);
                }
                Some(Child {
                    person: self.relative(child_id)?,
                    other_parents,
                })
            })
            .collect::<Vec<_>>();

        let mut spouse_ids = entry.spouses.clone();
        for co_parent in &co_parents {
            push_unique(&mut spouse_ids, co_parent);
        }

        let mut sibling_ids = entry.siblings.clone();
        for parent in &entry.parents {
            if let Some(parent_entry) = self.people.get(parent) {
                for sibling in &parent_entry.children {
                    if sibling != id {
                        push_unique(&mut sibling_ids, sibling);
                    }
                }
            }
        }

        Some(FamilyRecord {
            id: entry.id.clone(),
            label: entry.label.clone(),
            gender: entry.gender,
            life_span: entry.life_span.clone(),
            family: Family {
                parents,
                children,
                siblings: sibling_ids
                    .iter()
                    .filter_map(|sibling| self.relative(sibling))
                    .collect(),
                spouses: spouse_ids
                    .iter()
                    .filter_map(|spouse| self.relative(spouse))
                    .collect(),
            },
        })
    }

    pub fn resolve(&self, query: &Lookup) -> Result<FamilyRecord, LookupError> {
        let id = match query {
            Lookup::Identity(id) => id.as_str(),
            Lookup::Term(term) => self
                .resolve_term(term)
                .ok_or_else(|| LookupError::NotFound(term.clone()))?,
        };

        self.record(id)
            .ok_or_else(|| LookupError::NotFound(query.describe().to_owned()))
    }
}

/// Family data backed by a JSON people file. Lookups run on a background thread, the
/// same way a remote knowledge base would answer asynchronously.
#[derive(Clone, Debug)]
pub struct JsonFamilySource {
    dataset: Arc<Dataset>,
    latency: Option<Duration>,
}

impl JsonFamilySource {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read family dataset {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse family dataset {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let people = parse_people(raw)?;
        Ok(Self {
            dataset: Arc::new(Dataset::from_raw(people)),
            latency: None,
        })
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl FamilyProvider for JsonFamilySource {
    fn lookup(&self, query: Lookup) -> LocalBoxFuture<'static, Result<FamilyRecord, LookupError>> {
        let dataset = Arc::clone(&self.dataset);
        let latency = self.latency;
        let key = query.describe().to_owned();
        let (tx, rx) = oneshot::channel();

        debug!(query = %key, "family lookup dispatched");
        let worker = thread::Builder::new()
            .name("family-lookup".to_owned())
            .spawn(move || {
                if let Some(latency) = latency {
                    thread::sleep(latency);
                }
                let _ = tx.send(dataset.resolve(&query));
            });
        if let Err(err) = worker {
            return async move { Err(LookupError::Unavailable(format!("{key}: {err}"))) }
                .boxed_local();
        }

        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(LookupError::Disconnected(key)),
            }
        }
        .boxed_local()
    }
}
