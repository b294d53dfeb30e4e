use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawPerson {
    pub(super) id: String,
    pub(super) label: String,
    #[serde(default)]
    pub(super) gender: Option<String>,
    #[serde(default)]
    pub(super) life_span: Option<String>,
    #[serde(default)]
    pub(super) aliases: Vec<String>,
    #[serde(default)]
    pub(super) parents: Vec<String>,
    #[serde(default)]
    pub(super) spouses: Vec<String>,
    #[serde(default)]
    pub(super) siblings: Vec<String>,
    #[serde(default)]
    pub(super) children: Vec<String>,
}

/// Accepts either `{"people": [...]}` or a bare array of people.
pub(super) fn parse_people(raw: &str) -> Result<Vec<RawPerson>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in family dataset")?;

    let people = match &parsed {
        Value::Array(_) => &parsed,
        Value::Object(object) => object
            .get("people")
            .ok_or_else(|| anyhow!("family dataset object has no \"people\" array"))?,
        _ => return Err(anyhow!("unexpected JSON type for family dataset")),
    };

    let entries = people
        .as_array()
        .ok_or_else(|| anyhow!("\"people\" is not an array"))?;

    let mut parsed_people = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let person = RawPerson::deserialize(entry)
            .with_context(|| format!("invalid person entry at index {index}"))?;
        if person.id.trim().is_empty() {
            continue;
        }
        parsed_people.push(person);
    }

    if parsed_people.is_empty() {
        Err(anyhow!("family dataset contains no people"))
    } else {
        Ok(parsed_people)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_object_and_bare_array() {
        let object = parse_people(r#"{"people": [{"id": "a", "label": "A"}]}"#).expect("object");
        let array = parse_people(r#"[{"id": "a", "label": "A", "parents": ["b"]}]"#).expect("array");

        assert_eq!(object.len(), 1);
        assert_eq!(array[0].parents, vec!["b"]);
    }

    #[test]
    fn rejects_empty_and_malformed_datasets() {
        assert!(parse_people(r#"{"people": []}"#).is_err());
        assert!(parse_people(r#"{"folk": []}"#).is_err());
        assert!(parse_people(r#"[{"label": "missing id"}]"#).is_err());
        assert!(parse_people("42").is_err());
    }

    #[test]
    fn skips_blank_ids() {
        let people =
            parse_people(r#"[{"id": " ", "label": "blank"}, {"id": "x", "label": "X"}]"#)
                .expect("valid");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].id, "x");
    }
}
