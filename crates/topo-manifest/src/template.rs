//! Placeholders in manifest values.
//!
//! Any string inside a manifest parameter or condition may reference the
//! objects it is evaluated against:
//!
//! | Placeholder    | Sheet | Condition | Projection |
//! |----------------|-------|-----------|------------|
//! | `{props.KEY}`  | yes   |           |            |
//! | `{dest}`       |       | yes       | yes        |
//! | `{dest.KEY}`   |       | yes       | yes        |
//! | `{src}`        |       |           | yes        |
//! | `{src.KEY}`    |       |           | yes        |
//! | `{param.KEY}`  | yes   | yes       | yes        |
//!
//! A string that is exactly one placeholder takes the referenced value with
//! its type (`"{props.SF}"` → `2`). Anything else is rendered as text.
//! `{{` and `}}` escape literal braces.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use topo_kernel::{Parameters, Properties, ValueMap, value_text};

/// Where a template is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Sheet,
    Condition,
    Projection,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Sheet => "sheet parameters",
            Scope::Condition => "match conditions",
            Scope::Projection => "projection parameters",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed `{{` in `{0}`")]
    Unclosed(String),

    #[error("unmatched `}}` in `{0}`")]
    Unmatched(String),

    #[error("placeholder `{{{reference}}}` is not available in {scope}")]
    Unavailable { reference: String, scope: Scope },
}

#[derive(Debug, Clone, PartialEq)]
enum Reference {
    Src,
    Dest,
    SrcKey(String),
    DestKey(String),
    Props(String),
    Param(String),
}

impl Reference {
    fn parse(text: &str, scope: Scope) -> Result<Self, TemplateError> {
        let reference = match text.split_once('.') {
            None if text == "src" => Reference::Src,
            None if text == "dest" => Reference::Dest,
            Some(("src", key)) if !key.is_empty() => Reference::SrcKey(key.to_string()),
            Some(("dest", key)) if !key.is_empty() => Reference::DestKey(key.to_string()),
            Some(("props", key)) if !key.is_empty() => Reference::Props(key.to_string()),
            Some(("param", key)) if !key.is_empty() => Reference::Param(key.to_string()),
            _ => return Err(unavailable(text, scope)),
        };
        let allowed = match (&reference, scope) {
            (Reference::Param(_), _) => true,
            (Reference::Props(_), Scope::Sheet) => true,
            (Reference::Dest | Reference::DestKey(_), Scope::Condition | Scope::Projection) => true,
            (Reference::Src | Reference::SrcKey(_), Scope::Projection) => true,
            _ => false,
        };
        if allowed {
            Ok(reference)
        } else {
            Err(unavailable(text, scope))
        }
    }

    fn lookup(&self, bindings: &Bindings<'_>) -> Option<Value> {
        match self {
            Reference::Src => bindings.src.map(|p| Value::String(p.identity())),
            Reference::Dest => bindings.dest.map(|p| Value::String(p.identity())),
            Reference::SrcKey(key) => bindings.src.and_then(|p| p.get(key)).cloned(),
            Reference::DestKey(key) => bindings.dest.and_then(|p| p.get(key)).cloned(),
            Reference::Props(key) => bindings.props.and_then(|p| p.get(key)).cloned(),
            Reference::Param(key) => bindings.params.get(key).cloned(),
        }
    }
}

fn unavailable(text: &str, scope: Scope) -> TemplateError {
    TemplateError::Unavailable {
        reference: text.to_string(),
        scope,
    }
}

/// What a template can see while it is rendered.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    pub props: Option<&'a Properties>,
    pub src: Option<&'a Properties>,
    pub dest: Option<&'a Properties>,
    pub params: &'a Parameters,
}

impl<'a> Bindings<'a> {
    pub fn sheet(props: &'a Properties, params: &'a Parameters) -> Self {
        Self {
            props: Some(props),
            src: None,
            dest: None,
            params,
        }
    }

    pub fn condition(dest: &'a Properties, params: &'a Parameters) -> Self {
        Self {
            props: None,
            src: None,
            dest: Some(dest),
            params,
        }
    }

    pub fn projection(src: &'a Properties, dest: &'a Properties, params: &'a Parameters) -> Self {
        Self {
            props: None,
            src: Some(src),
            dest: Some(dest),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Ref(Reference),
}

/// A parsed string with placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str, scope: Scope) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => inner.push(c),
                            None => return Err(TemplateError::Unclosed(text.to_string())),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Ref(Reference::parse(inner.trim(), scope)?));
                }
                '}' => return Err(TemplateError::Unmatched(text.to_string())),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn has_placeholders(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Ref(_)))
    }

    /// `None` when a referenced value is missing.
    pub fn render(&self, bindings: &Bindings<'_>) -> Option<Value> {
        if let [Segment::Ref(reference)] = self.segments.as_slice() {
            return reference.lookup(bindings);
        }
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Ref(reference) => out.push_str(&value_text(&reference.lookup(bindings)?)),
            }
        }
        Some(Value::String(out))
    }

    fn render_literal(&self) -> Value {
        let text: String = self
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Ref(_) => None,
            })
            .collect();
        Value::String(text)
    }
}

/// A manifest value with templates compiled in place.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(Value),
    Text(Template),
    Array(Vec<TemplateValue>),
    Object(IndexMap<String, TemplateValue>),
}

impl TemplateValue {
    pub fn compile(value: &Value, scope: Scope) -> Result<Self, TemplateError> {
        Ok(match value {
            Value::String(text) => {
                let template = Template::parse(text, scope)?;
                if template.has_placeholders() {
                    TemplateValue::Text(template)
                } else {
                    TemplateValue::Literal(template.render_literal())
                }
            }
            Value::Array(items) => TemplateValue::Array(
                items
                    .iter()
                    .map(|item| TemplateValue::compile(item, scope))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => TemplateValue::Object(
                map.iter()
                    .map(|(k, v)| -> Result<_, TemplateError> {
                        Ok((k.clone(), TemplateValue::compile(v, scope)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            other => TemplateValue::Literal(other.clone()),
        })
    }

    pub fn render(&self, bindings: &Bindings<'_>) -> Option<Value> {
        match self {
            TemplateValue::Literal(value) => Some(value.clone()),
            TemplateValue::Text(template) => template.render(bindings),
            TemplateValue::Array(items) => items
                .iter()
                .map(|item| item.render(bindings))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            TemplateValue::Object(map) => map
                .iter()
                .map(|(k, v)| v.render(bindings).map(|v| (k.clone(), v)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(Value::Object),
        }
    }
}

/// Name → compiled value, in manifest order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateMap(IndexMap<String, TemplateValue>);

impl TemplateMap {
    pub fn compile(map: &ValueMap, scope: Scope) -> Result<Self, (String, TemplateError)> {
        map.iter()
            .map(|(key, value)| {
                TemplateValue::compile(value, scope)
                    .map(|compiled| (key.clone(), compiled))
                    .map_err(|err| (key.clone(), err))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    /// Render every entry; entries whose placeholders cannot be resolved are
    /// left out, so the object keeps its default for them.
    pub fn render_lenient(&self, bindings: &Bindings<'_>) -> Parameters {
        self.0
            .iter()
            .filter_map(|(key, value)| match value.render(bindings) {
                Some(rendered) => Some((key.clone(), rendered)),
                None => {
                    tracing::debug!(parameter = %key, "placeholder unresolved, keeping default");
                    None
                }
            })
            .collect()
    }

    /// Render every entry, or nothing if any placeholder is unresolved.
    pub fn render_strict(&self, bindings: &Bindings<'_>) -> Option<ValueMap> {
        self.0
            .iter()
            .map(|(key, value)| value.render(bindings).map(|v| (key.clone(), v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Parameters {
        [("density".to_string(), json!(47))].into_iter().collect()
    }

    #[test]
    fn whole_placeholder_keeps_type() {
        let props = Properties::new().with("level", "V1").with("SF", 2);
        let params = params();
        let bindings = Bindings::sheet(&props, &params);

        let sf = TemplateValue::compile(&json!("{props.SF}"), Scope::Sheet).expect("valid");
        assert_eq!(sf.render(&bindings), Some(json!(2)));

        let density =
            TemplateValue::compile(&json!("{param.density}"), Scope::Sheet).expect("valid");
        assert_eq!(density.render(&bindings), Some(json!(47)));

        let text = TemplateValue::compile(&json!("{props.level}_{props.SF}"), Scope::Sheet)
            .expect("valid");
        assert_eq!(text.render(&bindings), Some(json!("V1_2")));
    }

    #[test]
    fn projection_scope_sees_both_endpoints() {
        let src = Properties::new().with("level", "Retina");
        let dest = Properties::new().with("level", "V1").with("SF", 1);
        let params = params();
        let bindings = Bindings::projection(&src, &dest, &params);
        let name = TemplateValue::compile(&json!("{src}To{dest}"), Scope::Projection)
            .expect("valid");
        assert_eq!(name.render(&bindings), Some(json!("RetinaToV11")));

        let nested = TemplateValue::compile(&json!({"sf": ["{dest.SF}", 3]}), Scope::Projection)
            .expect("valid");
        assert_eq!(nested.render(&bindings), Some(json!({"sf": [1, 3]})));
    }

    #[test]
    fn escapes_and_literals() {
        let value = TemplateValue::compile(&json!("{{literal}}"), Scope::Sheet).expect("valid");
        assert_eq!(value, TemplateValue::Literal(json!("{literal}")));
    }

    #[test]
    fn malformed_and_out_of_scope_placeholders_fail() {
        assert_eq!(
            Template::parse("{props.SF", Scope::Sheet),
            Err(TemplateError::Unclosed("{props.SF".to_string()))
        );
        assert!(matches!(
            Template::parse("a}b", Scope::Sheet),
            Err(TemplateError::Unmatched(_))
        ));
        assert!(matches!(
            Template::parse("{src.SF}", Scope::Condition),
            Err(TemplateError::Unavailable { scope: Scope::Condition, .. })
        ));
        assert!(matches!(
            Template::parse("{props.}", Scope::Sheet),
            Err(TemplateError::Unavailable { .. })
        ));
    }

    #[test]
    fn missing_values_drop_entries_or_whole_maps() {
        let dest = Properties::new().with("level", "V1");
        let params = params();
        let bindings = Bindings::condition(&dest, &params);
        let map: ValueMap = [
            ("level".to_string(), json!("Retina")),
            ("SF".to_string(), json!("{dest.SF}")),
        ]
        .into_iter()
        .collect();
        let compiled = TemplateMap::compile(&map, Scope::Condition).expect("valid");
        assert_eq!(compiled.render_strict(&bindings), None);
        let lenient = compiled.render_lenient(&bindings);
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient["level"], json!("Retina"));
    }
}
