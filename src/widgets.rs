//! Widget lookup and instance rendering.
//!
//! Widgets come in two closed kinds. Each definition declares its
//! customization args; an instance merges caller-supplied values over the
//! declared defaults and renders the markup tag the front end expands.

mod registry;
mod schema;

pub use registry::{registry, Registry};
pub use schema::Schema;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use askama::Template;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::ValidationError;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Interactive,
    Noninteractive,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Interactive => "interactive",
            WidgetKind::Noninteractive => "noninteractive",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interactive" => Ok(WidgetKind::Interactive),
            "noninteractive" => Ok(WidgetKind::Noninteractive),
            other => Err(Error::not_found("Widget kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerSpec {
    pub name: &'static str,
    pub obj_type: &'static str,
}

/// A declared customization arg.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Schema,
    pub default_value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDefinition {
    pub id: &'static str,
    pub kind: WidgetKind,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub handler_specs: Vec<HandlerSpec>,
    pub customization_args: Vec<ArgSpec>,
}

/// One customization arg as published in an instance dict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomizationArgDict {
    pub name: &'static str,
    pub value: Value,
    pub description: &'static str,
    pub schema: Value,
    pub custom_editor: Option<String>,
    pub default_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetInstance {
    pub widget_id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub handler_specs: Vec<HandlerSpec>,
    pub customization_args: Vec<CustomizationArgDict>,
    pub tag: String,
}

#[derive(Template)]
#[template(
    source = r#"<{{ element }}{% for (attr, value) in attrs %} {{ attr }}-with-value="{{ value }}"{% endfor %}></{{ element }}>"#,
    ext = "html"
)]
struct WidgetTag<'a> {
    element: &'a str,
    attrs: Vec<(String, String)>,
}

impl WidgetDefinition {
    /// Validates `args` against the declared schemas and merges them over the
    /// defaults. Unknown arg names are rejected.
    pub fn customize(&self, args: &Map<String, Value>) -> Result<Vec<(&ArgSpec, Value)>> {
        if let Some(unknown) = args
            .keys()
            .find(|name| !self.customization_args.iter().any(|a| a.name == name.as_str()))
        {
            return Err(ValidationError::CustomizationArg(format!(
                "Unknown customization arg for widget {}: {}",
                self.id, unknown
            ))
            .into());
        }

        self.customization_args
            .iter()
            .map(|spec| -> Result<(&ArgSpec, Value)> {
                let value = match args.get(spec.name) {
                    Some(supplied) => spec.schema.normalize(supplied).map_err(|e| {
                        ValidationError::CustomizationArg(format!("{}: {}", spec.name, e))
                    })?,
                    None => spec.default_value.clone(),
                };
                Ok((spec, value))
            })
            .collect()
    }

    /// The markup tag for an instance with the given, already merged, values.
    pub fn tag(&self, values: &[(&ArgSpec, Value)]) -> Result<String> {
        let element = format!("quill-{}-{}", self.kind, kebab_case(self.id));
        let attrs = values
            .iter()
            .map(|(spec, value)| -> Result<(String, String)> {
                Ok((spec.name.replace('_', "-"), serde_json::to_string(value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WidgetTag {
            element: &element,
            attrs,
        }
        .render()?)
    }

    pub fn instance_dict(&self, args: &Map<String, Value>) -> Result<WidgetInstance> {
        let values = self.customize(args)?;
        let tag = self.tag(&values)?;

        let customization_args = values
            .into_iter()
            .map(|(spec, value)| CustomizationArgDict {
                name: spec.name,
                value,
                description: spec.description,
                schema: spec.schema.to_value(),
                custom_editor: None,
                default_value: spec.default_value.clone(),
            })
            .collect();

        Ok(WidgetInstance {
            widget_id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            handler_specs: self.handler_specs.clone(),
            customization_args,
            tag,
        })
    }
}

pub fn get_widget(kind: WidgetKind, id: &str) -> Result<&'static WidgetDefinition> {
    registry().get(kind, id)
}

/// Default instances of every widget of `kind`, grouped by category and
/// ordered by widget id within each category.
pub fn repository(kind: WidgetKind) -> Result<BTreeMap<&'static str, Vec<WidgetInstance>>> {
    let mut categories: BTreeMap<&'static str, Vec<WidgetInstance>> = BTreeMap::new();
    for widget in registry().widgets_of_kind(kind) {
        categories
            .entry(widget.category)
            .or_default()
            .push(widget.instance_dict(&Map::new())?);
    }

    for instances in categories.values_mut() {
        instances.sort_by(|a, b| a.widget_id.cmp(b.widget_id));
    }
    Ok(categories)
}

fn kebab_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 4);
    for (i, c) in id.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
