//! Manifest → [`ModelDefinition`].

use crate::ManifestError;
use crate::schema::{LevelManifest, ModelManifest};
use crate::template::{Bindings, Scope, TemplateMap};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use topo_kernel::{
    MatchCondition, MatchConditions, Parameters, PathTree, ProjectionKind, RuleRegistry,
    SheetKind, TopoError, TreePath, ValueMap,
};
use topo_model::{Model, ModelDefinition, PropertyArgs, SheetDeclaration};

struct SheetRule {
    level: String,
    kind: SheetKind,
    parameters: Arc<TemplateMap>,
}

struct ConditionRule {
    level: String,
    matchname: String,
    conditions: Arc<TemplateMap>,
}

/// All entries sharing a match name. The rule picks parameter sets by the
/// destination's level.
struct ProjectionRule {
    matchname: String,
    kind: ProjectionKind,
    by_level: Arc<IndexMap<String, Vec<TemplateMap>>>,
}

/// A validated manifest, ready to drive a [`Model`].
pub struct ManifestModel {
    manifest: ModelManifest,
    declarations: IndexMap<String, SheetDeclaration>,
    sheet_rules: Vec<SheetRule>,
    conditions: Vec<ConditionRule>,
    projection_rules: Vec<ProjectionRule>,
}

impl ManifestModel {
    pub fn compile(manifest: ModelManifest) -> Result<Self, ManifestError> {
        let mut declarations = IndexMap::new();
        let mut sheet_rules = Vec::with_capacity(manifest.levels.len());
        for (level, entry) in &manifest.levels {
            declarations.insert(level.clone(), declaration(level, entry)?);
            sheet_rules.push(SheetRule {
                level: level.clone(),
                kind: entry.sheet_type.parse()?,
                parameters: Arc::new(compile_map(
                    &entry.parameters,
                    Scope::Sheet,
                    &format!("levels.{level}.parameters"),
                )?),
            });
        }

        let mut conditions: Vec<ConditionRule> = Vec::new();
        let mut grouped: IndexMap<String, (ProjectionKind, IndexMap<String, Vec<TemplateMap>>)> =
            IndexMap::new();
        for (idx, entry) in manifest.projections.iter().enumerate() {
            let at = format!("projections[{idx}]");
            if !manifest.levels.contains_key(&entry.level) {
                return Err(ManifestError::Invalid(format!(
                    "{at}: `{}` targets undeclared level `{}`",
                    entry.matchname, entry.level
                )));
            }
            if conditions
                .iter()
                .any(|c| c.level == entry.level && c.matchname == entry.matchname)
            {
                return Err(ManifestError::Invalid(format!(
                    "{at}: `{}` is declared twice for level `{}`",
                    entry.matchname, entry.level
                )));
            }
            let kind: ProjectionKind = entry.projection_type.parse()?;
            conditions.push(ConditionRule {
                level: entry.level.clone(),
                matchname: entry.matchname.clone(),
                conditions: Arc::new(compile_map(
                    &entry.conditions,
                    Scope::Condition,
                    &format!("{at}.conditions"),
                )?),
            });
            let sets = entry
                .parameters
                .as_slice()
                .iter()
                .map(|set| compile_map(set, Scope::Projection, &format!("{at}.parameters")))
                .collect::<Result<Vec<_>, _>>()?;

            let (group_kind, by_level) = grouped
                .entry(entry.matchname.clone())
                .or_insert_with(|| (kind, IndexMap::new()));
            if *group_kind != kind {
                return Err(ManifestError::Invalid(format!(
                    "{at}: `{}` is built as {group_kind} elsewhere, not {kind}",
                    entry.matchname
                )));
            }
            by_level.insert(entry.level.clone(), sets);
        }

        let projection_rules = grouped
            .into_iter()
            .map(|(matchname, (kind, by_level))| ProjectionRule {
                matchname,
                kind,
                by_level: Arc::new(by_level),
            })
            .collect();

        tracing::debug!(
            model = %manifest.name,
            levels = manifest.levels.len(),
            projections = manifest.projections.len(),
            "manifest compiled"
        );
        Ok(Self {
            manifest,
            declarations,
            sheet_rules,
            conditions,
            projection_rules,
        })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }
}

fn compile_map(map: &ValueMap, scope: Scope, at: &str) -> Result<TemplateMap, ManifestError> {
    TemplateMap::compile(map, scope).map_err(|(key, source)| ManifestError::Template {
        at: format!("{at}.{key}"),
        source,
    })
}

fn declaration(level: &str, entry: &LevelManifest) -> Result<SheetDeclaration, ManifestError> {
    if entry.identity {
        if entry.sheets.is_some() || !entry.args.is_empty() {
            return Err(ManifestError::Invalid(format!(
                "levels.{level}: `identity` excludes `sheets` and `args`"
            )));
        }
        return Ok(SheetDeclaration::Identity);
    }
    let args = entry
        .args
        .iter()
        .map(|arg| PropertyArgs::list(&arg.key, arg.values.iter().cloned()))
        .reduce(PropertyArgs::product);
    Ok(match (&entry.sheets, args) {
        (None, None) => SheetDeclaration::Identity,
        (Some(sheets), None) => SheetDeclaration::Sheets(sheets.clone()),
        (None, Some(args)) => SheetDeclaration::Args(args),
        (Some(sheets), Some(args)) => {
            SheetDeclaration::Args(PropertyArgs::from_specs(sheets.clone()).concat(args))
        }
    })
}

impl ModelDefinition for ManifestModel {
    type Pattern = Value;

    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn declared_parameters(&self) -> Parameters {
        self.manifest.parameters.clone()
    }

    fn rules(&self) -> RuleRegistry<Model<Self>> {
        let mut rules: RuleRegistry<Model<Self>> = RuleRegistry::new();
        for rule in &self.sheet_rules {
            let parameters = Arc::clone(&rule.parameters);
            rules.register_sheet_rule(&rule.level, rule.kind, move |model, props| {
                parameters.render_lenient(&Bindings::sheet(props, model.params()))
            });
        }
        for rule in &self.projection_rules {
            let by_level = Arc::clone(&rule.by_level);
            rules.register_projection_rule(&rule.matchname, rule.kind, move |model, src, dest| {
                let bindings = Bindings::projection(src, dest, model.params());
                dest.level()
                    .and_then(|level| by_level.get(&level))
                    .map(|sets| {
                        sets.iter()
                            .map(|set| set.render_lenient(&bindings))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            });
        }
        rules
    }

    fn match_conditions(&self) -> MatchConditions<Model<Self>> {
        let mut registry: MatchConditions<Model<Self>> = MatchConditions::new();
        for rule in &self.conditions {
            let conditions = Arc::clone(&rule.conditions);
            registry.register(&rule.level, &rule.matchname, move |model, dest| {
                conditions
                    .render_strict(&Bindings::condition(dest, model.params()))
                    .map(MatchCondition::from)
            });
        }
        registry
    }

    fn setup_attributes(
        &self,
        _model: &Model<Self>,
        mut attrs: PathTree<Value>,
    ) -> Result<PathTree<Value>, TopoError> {
        for (path, value) in &self.manifest.attributes {
            attrs.set_path(TreePath::dotted(path), value.clone());
        }
        Ok(attrs)
    }

    fn setup_training_patterns(
        &self,
        _model: &Model<Self>,
    ) -> Result<IndexMap<String, Value>, TopoError> {
        Ok(self.manifest.training_patterns.clone())
    }

    fn setup_sheets(
        &self,
        _model: &Model<Self>,
    ) -> Result<IndexMap<String, SheetDeclaration>, TopoError> {
        Ok(self.declarations.clone())
    }
}
