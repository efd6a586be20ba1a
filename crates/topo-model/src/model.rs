//! The model orchestrator.
//!
//! A [`Model`] wraps a user-supplied [`ModelDefinition`] and drives it
//! through two phases:
//!
//! 1. **Setup** builds specifications: attributes, training patterns,
//!    sheet specs (one per declared property map, parameterised by the
//!    level's sheet rule) and projection specs (one per matching
//!    source/destination pair and parameter set).
//! 2. **Instantiation** hands the specs to a [`Runtime`]: every sheet in
//!    tree order, then every projection in connection order.
//!
//! Instantiation never rolls back. If one registration fails, the call
//! aborts and whatever was registered before stays registered.

use crate::declare::SheetDeclaration;
use crate::globals::GlobalParams;
use crate::stage::{InstantiateStage, SetupStage, Stages};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use topo_kernel::{
    Conditions, Handle, MatchConditions, Parameters, PathTree, ProjectionSpec, Properties,
    RuleRegistry, Runtime, SheetSpec, Specification, TopoError, TreePath, order_projections,
};

/// The hooks a modeller implements.
pub trait ModelDefinition: Sized + 'static {
    /// Opaque training-pattern value (a pattern generator description).
    type Pattern: Clone + fmt::Debug + 'static;

    fn name(&self) -> &str;

    /// Model-level parameters and their defaults.
    fn declared_parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// Sheet rules (by level) and projection rules (by match name).
    fn rules(&self) -> RuleRegistry<Model<Self>>;

    /// Match condition generators per destination level.
    fn match_conditions(&self) -> MatchConditions<Model<Self>>;

    /// Precompute derived values into the attribute tree.
    fn setup_attributes(
        &self,
        model: &Model<Self>,
        attrs: PathTree<Value>,
    ) -> Result<PathTree<Value>, TopoError> {
        let _ = model;
        Ok(attrs)
    }

    /// Target sheet name → training pattern.
    fn setup_training_patterns(
        &self,
        model: &Model<Self>,
    ) -> Result<IndexMap<String, Self::Pattern>, TopoError> {
        let _ = model;
        Err(TopoError::UnimplementedHook("setup_training_patterns"))
    }

    /// Level → sheets declared at that level.
    fn setup_sheets(
        &self,
        model: &Model<Self>,
    ) -> Result<IndexMap<String, SheetDeclaration>, TopoError> {
        let _ = model;
        Err(TopoError::UnimplementedHook("setup_sheets"))
    }

    fn setup_analysis(&self, model: &Model<Self>) -> Result<(), TopoError> {
        let _ = model;
        Ok(())
    }
}

/// What to do when two specs land on the same tree path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail with a construction error.
    #[default]
    Reject,
    /// Keep the later spec and log a warning.
    Overwrite,
}

#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Stages run at construction.
    pub setup: Stages<SetupStage>,
    /// Caller parameter values, over the declared defaults.
    pub params: Parameters,
    pub collisions: CollisionPolicy,
}

impl ModelOptions {
    /// Construct without running any setup stage.
    pub fn deferred() -> Self {
        Self {
            setup: Stages::Only(Vec::new()),
            ..Self::default()
        }
    }
}

/// What an instantiation call registered, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstantiationReport {
    pub sheets: Vec<Handle>,
    pub projections: Vec<Handle>,
}

pub struct Model<D: ModelDefinition> {
    definition: D,
    params: Parameters,
    rules: RuleRegistry<Model<D>>,
    match_conditions: MatchConditions<Model<D>>,
    collisions: CollisionPolicy,
    attrs: PathTree<Value>,
    training_patterns: PathTree<D::Pattern>,
    sheets: PathTree<SheetSpec>,
    projections: PathTree<ProjectionSpec>,
}

impl<D: ModelDefinition> Model<D> {
    /// Build the model from declared defaults overlaid with `options.params`,
    /// then run `options.setup`.
    pub fn new(definition: D, options: ModelOptions) -> Result<Self, TopoError> {
        let mut params = definition.declared_parameters();
        params.extend(options.params.clone());
        Self::assemble(definition, params, options)
    }

    /// Like [`Model::new`], but parameters are registered with `globals`
    /// first, so external overrides win.
    pub fn registered(
        definition: D,
        options: ModelOptions,
        globals: &mut GlobalParams,
    ) -> Result<Self, TopoError> {
        let params = globals.register(&definition.declared_parameters(), &options.params);
        Self::assemble(definition, params, options)
    }

    fn assemble(
        definition: D,
        mut params: Parameters,
        options: ModelOptions,
    ) -> Result<Self, TopoError> {
        params.insert("name".into(), Value::String(definition.name().to_string()));
        let rules = definition.rules();
        let match_conditions = definition.match_conditions();
        let mut model = Self {
            definition,
            params,
            rules,
            match_conditions,
            collisions: options.collisions,
            attrs: PathTree::new("attrs"),
            training_patterns: PathTree::new("training_patterns"),
            sheets: PathTree::new("sheets"),
            projections: PathTree::new("projections"),
        };
        model.setup(&options.setup)?;
        Ok(model)
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn rules(&self) -> &RuleRegistry<Model<D>> {
        &self.rules
    }

    pub fn match_conditions(&self) -> &MatchConditions<Model<D>> {
        &self.match_conditions
    }

    pub fn attrs(&self) -> &PathTree<Value> {
        &self.attrs
    }

    pub fn training_patterns(&self) -> &PathTree<D::Pattern> {
        &self.training_patterns
    }

    pub fn sheets(&self) -> &PathTree<SheetSpec> {
        &self.sheets
    }

    pub fn projections(&self) -> &PathTree<ProjectionSpec> {
        &self.projections
    }

    pub fn sheet(&self, identity: &str) -> Option<&SheetSpec> {
        self.sheets.get_path(&TreePath::from(identity))
    }

    /// Run the selected setup stages in their fixed order.
    pub fn setup(&mut self, stages: &Stages<SetupStage>) -> Result<(), TopoError> {
        for stage in SetupStage::ALL {
            if !stages.contains(&stage) {
                continue;
            }
            tracing::debug!(model = self.name(), %stage, "setup stage");
            match stage {
                SetupStage::Attributes => {
                    let attrs = std::mem::replace(&mut self.attrs, PathTree::new("attrs"));
                    self.attrs = self.definition.setup_attributes(self, attrs)?;
                }
                SetupStage::TrainingPatterns => {
                    let patterns = self.definition.setup_training_patterns(self)?;
                    for (name, pattern) in patterns {
                        self.training_patterns.set_path(name, pattern);
                    }
                }
                SetupStage::Sheets => self.setup_sheets()?,
                SetupStage::Projections => self.compute_projection_specs()?,
                SetupStage::Analysis => self.definition.setup_analysis(self)?,
            }
        }
        Ok(())
    }

    fn setup_sheets(&mut self) -> Result<(), TopoError> {
        let declarations = self.definition.setup_sheets(self)?;
        let sheet_types = self.rules.sheet_types();
        for (level, declaration) in declarations {
            let sheet_type = *sheet_types
                .get(&level)
                .ok_or_else(|| TopoError::UnknownSheetLevel(level.clone()))?;
            for declared in declaration.expand() {
                if declared.contains_key("level") {
                    return Err(TopoError::InvalidConfiguration(format!(
                        "sheets declared at level `{level}` must not set `level` themselves"
                    )));
                }
                let properties: Properties =
                    std::iter::once(("level".to_string(), Value::String(level.clone())))
                        .chain(declared)
                        .collect();
                let spec = SheetSpec::new(sheet_type, properties)?;
                let path = TreePath::from(spec.identity());
                store(&mut self.sheets, self.collisions, path, spec)?;
            }
        }
        self.update_sheet_spec_parameters()
    }

    /// Merge each sheet's level rule output into its parameters.
    pub fn update_sheet_spec_parameters(&mut self) -> Result<(), TopoError> {
        let labels = self.rules.sheet_labels();
        let mut patches = Vec::with_capacity(self.sheets.len());
        for (path, spec) in self.sheets.items() {
            let rule = labels
                .get(spec.level())
                .ok_or_else(|| TopoError::UnknownSheetLevel(spec.level().to_string()))?;
            patches.push((path.clone(), rule(self, spec.properties())));
        }
        for (path, patch) in patches {
            if let Some(spec) = self.sheets.get_path_mut(&path) {
                spec.update_parameters(patch);
            }
        }
        Ok(())
    }

    /// Test every (source, destination) sheet pair, self-pairs included,
    /// against the destination's match conditions and store one projection
    /// spec per matching parameter set.
    pub fn compute_projection_specs(&mut self) -> Result<(), TopoError> {
        for proj in self.matched_projections()? {
            let path =
                TreePath::new([proj.dest().to_string(), proj.src().to_string(), proj.name()]);
            store(&mut self.projections, self.collisions, path, proj)?;
        }
        Ok(())
    }

    fn matched_projections(&self) -> Result<Vec<ProjectionSpec>, TopoError> {
        let projection_types = self.rules.projection_types();
        let projection_labels = self.rules.projection_labels();

        let mut destinations: Vec<(&SheetSpec, Conditions)> =
            Vec::with_capacity(self.sheets.len());
        for dest in self.sheets.values() {
            let conditions = if self.match_conditions.contains(dest.level()) {
                self.match_conditions
                    .compute_conditions(dest.level(), self, dest.properties())?
            } else {
                Conditions::new()
            };
            destinations.push((dest, conditions));
        }

        let mut staged = Vec::new();
        for src in self.sheets.values() {
            for (dest, conditions) in &destinations {
                for (matchname, condition) in conditions {
                    let Some(condition) = condition else {
                        continue;
                    };
                    if !condition.holds(src.properties()) {
                        continue;
                    }
                    let unknown = || TopoError::UnknownProjectionRule(matchname.clone());
                    let kind = *projection_types.get(matchname).ok_or_else(unknown)?;
                    let rule = projection_labels.get(matchname).ok_or_else(unknown)?;
                    tracing::debug!(%matchname, %src, %dest, "match condition holds");

                    for paramset in rule(self, src.properties(), dest.properties()).into_vec() {
                        let mut proj = ProjectionSpec::new(kind, src, dest);
                        proj.update_parameters(paramset);
                        proj.tag(matchname.clone());
                        staged.push(proj);
                    }
                }
            }
        }
        Ok(staged)
    }

    /// Stored projections in connection order.
    pub fn order_projections(&self) -> Result<Vec<&ProjectionSpec>, TopoError> {
        order_projections(self.projections.values())
    }

    /// Register the selected stages with `runtime`: sheets first, then
    /// projections in connection order.
    ///
    /// Projection ordering is resolved before the first connection, so an
    /// unranked match name leaves the runtime's projections untouched.
    pub fn instantiate<R: Runtime + ?Sized>(
        &self,
        stages: &Stages<InstantiateStage>,
        runtime: &mut R,
    ) -> Result<InstantiationReport, TopoError> {
        let mut report = InstantiationReport::default();

        if stages.contains(&InstantiateStage::Sheets) {
            for spec in self.sheets.values() {
                tracing::info!(
                    sheet_level = spec.level(),
                    sheet = %spec,
                    "Level {}: Sheet {}",
                    spec.level(),
                    spec
                );
                report.sheets.push(spec.instantiate(runtime)?);
            }
        }

        if stages.contains(&InstantiateStage::Projections) {
            for proj in self.order_projections()? {
                let matchname = proj.matchname().unwrap_or_default();
                tracing::info!(
                    matchname,
                    projection = %proj,
                    "Match: {}: Connection {}->{} {}",
                    matchname,
                    proj.src(),
                    proj.dest(),
                    proj.name()
                );
                report.projections.push(proj.instantiate(runtime)?);
            }
        }

        Ok(report)
    }
}

impl<D: ModelDefinition> fmt::Debug for Model<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("sheets", &self.sheets.len())
            .field("projections", &self.projections.len())
            .finish()
    }
}

fn store<V>(
    tree: &mut PathTree<V>,
    policy: CollisionPolicy,
    path: TreePath,
    value: V,
) -> Result<(), TopoError> {
    match policy {
        CollisionPolicy::Reject => tree.insert_new(path, value),
        CollisionPolicy::Overwrite => {
            let label = tree.label();
            if tree.set_path(path.clone(), value).is_some() {
                tracing::warn!(tree = label, %path, "overwrote existing specification");
            }
            Ok(())
        }
    }
}
