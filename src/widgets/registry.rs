use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{json, Value};

use crate::{Error, Result};

use super::schema::Schema;
use super::{ArgSpec, HandlerSpec, WidgetDefinition, WidgetKind};

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Every known widget, keyed by kind and id. Built on first use and never
/// modified afterwards.
#[derive(Debug)]
pub struct Registry {
    interactive: BTreeMap<&'static str, WidgetDefinition>,
    noninteractive: BTreeMap<&'static str, WidgetDefinition>,
}

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::builtin)
}

impl Registry {
    fn builtin() -> Self {
        let index = |defs: Vec<WidgetDefinition>| -> BTreeMap<&'static str, WidgetDefinition> {
            defs.into_iter().map(|d| (d.id, d)).collect()
        };

        Self {
            interactive: index(interactive_widgets()),
            noninteractive: index(noninteractive_widgets()),
        }
    }

    fn table(&self, kind: WidgetKind) -> &BTreeMap<&'static str, WidgetDefinition> {
        match kind {
            WidgetKind::Interactive => &self.interactive,
            WidgetKind::Noninteractive => &self.noninteractive,
        }
    }

    /// Widgets of `kind`, ordered by id.
    pub fn widgets_of_kind(&self, kind: WidgetKind) -> impl Iterator<Item = &WidgetDefinition> {
        self.table(kind).values()
    }

    pub fn get(&self, kind: WidgetKind, id: &str) -> Result<&WidgetDefinition> {
        self.table(kind)
            .get(id)
            .ok_or_else(|| Error::not_found(format!("{} widget", kind), id))
    }
}

fn arg(name: &'static str, description: &'static str, schema: Schema, default: Value) -> ArgSpec {
    ArgSpec {
        name,
        description,
        schema,
        default_value: default,
    }
}

fn submit(obj_type: &'static str) -> Vec<HandlerSpec> {
    vec![HandlerSpec {
        name: "submit",
        obj_type,
    }]
}

fn interactive_widgets() -> Vec<WidgetDefinition> {
    vec![
        WidgetDefinition {
            id: "TextInput",
            kind: WidgetKind::Interactive,
            name: "Text input",
            category: "Basic Input",
            description: "Allows learners to enter arbitrary text strings.",
            handler_specs: submit("NormalizedString"),
            customization_args: vec![
                arg(
                    "placeholder",
                    "The placeholder for the text input field.",
                    Schema::Unicode,
                    json!("Type your answer here."),
                ),
                arg(
                    "rows",
                    "The number of rows for the text input field.",
                    Schema::Int {
                        min: Some(1),
                        max: Some(200),
                    },
                    json!(1),
                ),
            ],
        },
        WidgetDefinition {
            id: "NumericInput",
            kind: WidgetKind::Interactive,
            name: "Number",
            category: "Basic Input",
            description: "Allows learners to enter integers and floating point numbers.",
            handler_specs: submit("Real"),
            customization_args: Vec::new(),
        },
        WidgetDefinition {
            id: "MultipleChoiceInput",
            kind: WidgetKind::Interactive,
            name: "Multiple choice",
            category: "Basic Input",
            description: "Allows learners to select one of a list of multiple-choice options.",
            handler_specs: submit("NonnegativeInt"),
            customization_args: vec![arg(
                "choices",
                "The options that the learner can select from.",
                Schema::List(Box::new(Schema::Html)),
                json!(["Sample choice"]),
            )],
        },
    ]
}

fn noninteractive_widgets() -> Vec<WidgetDefinition> {
    vec![
        WidgetDefinition {
            id: "Image",
            kind: WidgetKind::Noninteractive,
            name: "Image",
            category: "Basic Input",
            description: "An image.",
            handler_specs: Vec::new(),
            customization_args: vec![
                arg("filepath", "The name of the image file.", Schema::Unicode, json!("")),
                arg(
                    "alt",
                    "Alternative text for screen readers.",
                    Schema::Unicode,
                    json!(""),
                ),
            ],
        },
        WidgetDefinition {
            id: "Link",
            kind: WidgetKind::Noninteractive,
            name: "Link",
            category: "Basic Input",
            description: "A link to a URL.",
            handler_specs: Vec::new(),
            customization_args: vec![arg(
                "url",
                "The URL for this link. It must start with http:// or https://",
                Schema::Unicode,
                json!("https://www.example.com"),
            )],
        },
        WidgetDefinition {
            id: "Math",
            kind: WidgetKind::Noninteractive,
            name: "Math",
            category: "Basic Input",
            description: "A math formula.",
            handler_specs: Vec::new(),
            customization_args: vec![arg(
                "raw_latex",
                "The raw string to be displayed as LaTeX.",
                Schema::Unicode,
                json!(""),
            )],
        },
        WidgetDefinition {
            id: "Video",
            kind: WidgetKind::Noninteractive,
            name: "Video",
            category: "Basic Input",
            description: "A YouTube video.",
            handler_specs: Vec::new(),
            customization_args: vec![
                arg(
                    "video_id",
                    "The YouTube id for this video.",
                    Schema::Unicode,
                    json!(""),
                ),
                arg(
                    "start",
                    "Video start time in seconds.",
                    Schema::Int {
                        min: Some(0),
                        max: None,
                    },
                    json!(0),
                ),
                arg(
                    "autoplay",
                    "Autoplay this video once the question has loaded?",
                    Schema::Bool,
                    json!(false),
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_counts() {
        assert_eq!(registry().widgets_of_kind(WidgetKind::Interactive).count(), 3);
        assert_eq!(registry().widgets_of_kind(WidgetKind::Noninteractive).count(), 4);
    }

    #[test]
    fn test_ids_are_camel_cased_and_sorted() {
        for kind in [WidgetKind::Interactive, WidgetKind::Noninteractive] {
            let ids: Vec<&str> = registry().widgets_of_kind(kind).map(|w| w.id).collect();
            let mut sorted = ids.clone();
            sorted.sort();

            assert_eq!(ids, sorted);
            assert!(ids
                .iter()
                .all(|id| id.starts_with(|c: char| c.is_ascii_uppercase())));
        }
    }

    #[test]
    fn test_defaults_satisfy_their_schema() {
        for kind in [WidgetKind::Interactive, WidgetKind::Noninteractive] {
            for widget in registry().widgets_of_kind(kind) {
                for spec in &widget.customization_args {
                    assert_eq!(
                        spec.schema.normalize(&spec.default_value).unwrap(),
                        spec.default_value,
                        "{}.{}",
                        widget.id,
                        spec.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_get_unknown_widget() {
        let err = registry().get(WidgetKind::Interactive, "Image").unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "interactive widget Image not found");
    }
}
