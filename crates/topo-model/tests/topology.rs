//! Integration tests: build small visual-pathway models end to end and
//! instantiate them into the in-memory simulation.

use indexmap::IndexMap;
use serde_json::{Value, json};
use topo_kernel::{
    ErrorClass, Handle, MatchCondition, MatchConditions, Parameters, PathTree, ProjectionKind,
    Properties, RuleRegistry, Runtime, RuntimeError, SheetKind, SheetObject, Specification,
    TopoError, TreePath,
};
use topo_model::{
    CollisionPolicy, GlobalParams, InstantiateStage, Model, ModelDefinition, ModelOptions,
    PropertyArgs, SetupStage, SheetDeclaration, Stages,
};
use topo_sim::Simulation;

struct Toy {
    sheets: Vec<(&'static str, SheetDeclaration)>,
    rules: RuleRegistry<Model<Toy>>,
    conditions: MatchConditions<Model<Toy>>,
}

impl ModelDefinition for Toy {
    type Pattern = String;

    fn name(&self) -> &str {
        "toy"
    }

    fn declared_parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("cortex_density".into(), json!(47));
        params
    }

    fn rules(&self) -> RuleRegistry<Model<Self>> {
        self.rules.clone()
    }

    fn match_conditions(&self) -> MatchConditions<Model<Self>> {
        self.conditions.clone()
    }

    fn setup_attributes(
        &self,
        _model: &Model<Self>,
        mut attrs: PathTree<Value>,
    ) -> Result<PathTree<Value>, TopoError> {
        attrs.set_path(TreePath::dotted("SF.max"), json!(2));
        Ok(attrs)
    }

    fn setup_training_patterns(
        &self,
        _model: &Model<Self>,
    ) -> Result<IndexMap<String, String>, TopoError> {
        Ok(IndexMap::from([("Retina".to_string(), "Gaussian".to_string())]))
    }

    fn setup_sheets(
        &self,
        _model: &Model<Self>,
    ) -> Result<IndexMap<String, SheetDeclaration>, TopoError> {
        Ok(self
            .sheets
            .iter()
            .map(|(level, decl)| (level.to_string(), decl.clone()))
            .collect())
    }
}

/// Only the mandatory hooks; everything else falls back to the defaults.
struct Bare;

impl ModelDefinition for Bare {
    type Pattern = ();

    fn name(&self) -> &str {
        "bare"
    }

    fn rules(&self) -> RuleRegistry<Model<Self>> {
        RuleRegistry::new()
    }

    fn match_conditions(&self) -> MatchConditions<Model<Self>> {
        MatchConditions::new()
    }
}

fn named(name: &str) -> Parameters {
    let mut params = Parameters::new();
    params.insert("name".into(), json!(name));
    params
}

fn sf(values: &[i64]) -> SheetDeclaration {
    SheetDeclaration::Args(PropertyArgs::list("SF", values.iter().copied()))
}

/// Retina feeding V1 sheets, one per spatial frequency.
fn retina_v1(sheets: Vec<(&'static str, SheetDeclaration)>) -> Toy {
    let mut rules: RuleRegistry<Model<Toy>> = RuleRegistry::new();
    rules.register_sheet_rule("Retina", SheetKind::GeneratorSheet, |_, _| {
        let mut params = Parameters::new();
        params.insert("period".into(), json!(0.5));
        params
    });
    rules.register_sheet_rule("V1", SheetKind::SettlingCFSheet, |model, props| {
        let mut params = Parameters::new();
        params.insert(
            "nominal_density".into(),
            model.param("cortex_density").cloned().unwrap_or(Value::Null),
        );
        params.insert("tsettle".into(), props.get("SF").cloned().unwrap_or(json!(0)));
        params
    });
    rules.register_projection_rule(
        "afferent_projections",
        ProjectionKind::CFProjection,
        |_, _, _| named("Afferent"),
    );

    let mut conditions: MatchConditions<Model<Toy>> = MatchConditions::new();
    conditions.register("V1", "afferent_projections", |_, _| {
        Some(MatchCondition::new().require("level", "Retina"))
    });

    Toy {
        sheets,
        rules,
        conditions,
    }
}

fn with_lateral(mut toy: Toy) -> Toy {
    toy.rules.register_projection_rule(
        "lateral_excitatory_projections",
        ProjectionKind::OneToOneProjection,
        |_, _, _| named("LateralExcitatory"),
    );
    toy.conditions
        .register("V1", "lateral_excitatory_projections", |_, dest| {
            let sf = dest.get("SF").cloned().unwrap_or(Value::Null);
            Some(MatchCondition::new().require("level", "V1").require("SF", sf))
        });
    toy
}

fn standard() -> Toy {
    retina_v1(vec![
        ("Retina", SheetDeclaration::Identity),
        ("V1", sf(&[1, 2])),
    ])
}

fn identities<'a>(it: impl Iterator<Item = &'a topo_kernel::SheetSpec>) -> Vec<String> {
    it.map(|spec| spec.identity()).collect()
}

#[test]
fn end_to_end_scenario_builds_three_sheets_and_two_projections() {
    let toy = retina_v1(vec![
        ("Retina", SheetDeclaration::Sheets(vec![IndexMap::new()])),
        (
            "V1",
            SheetDeclaration::Sheets(vec![
                IndexMap::from([("SF".to_string(), json!(1))]),
                IndexMap::from([("SF".to_string(), json!(2))]),
            ]),
        ),
    ]);
    let model = Model::new(toy, ModelOptions::default()).expect("model builds");

    assert_eq!(identities(model.sheets().values()), ["Retina", "V11", "V12"]);
    let projections: Vec<_> = model.projections().values().collect();
    assert_eq!(projections.len(), 2);
    for proj in &projections {
        assert_eq!(proj.src(), "Retina");
        assert_eq!(proj.matchname(), Some("afferent_projections"));
    }
    assert_eq!(projections[0].identity(), "V11.Afferent");
    assert_eq!(projections[1].identity(), "V12.Afferent");
}

#[test]
fn match_is_asymmetric() {
    let model = Model::new(standard(), ModelOptions::default()).expect("model builds");
    assert!(
        model
            .projections()
            .values()
            .all(|proj| proj.src() == "Retina" && proj.dest() != "Retina")
    );
    assert!(
        model
            .projections()
            .get_path(&TreePath::new(["V11", "Retina", "Afferent"]))
            .is_some()
    );
}

#[test]
fn sheet_rules_and_attributes_feed_setup() {
    let model = Model::new(standard(), ModelOptions::default()).expect("model builds");

    assert_eq!(model.param("name"), Some(&json!("toy")));
    assert_eq!(
        model.attrs().get_path(&TreePath::dotted("SF.max")),
        Some(&json!(2))
    );
    assert_eq!(
        model
            .training_patterns()
            .get_path(&TreePath::from("Retina"))
            .map(String::as_str),
        Some("Gaussian")
    );

    let retina = model.sheet("Retina").expect("retina");
    assert_eq!(retina.sheet_type, SheetKind::GeneratorSheet);
    assert_eq!(retina.parameters()["period"], json!(0.5));

    let v12 = model.sheet("V12").expect("V12");
    assert_eq!(v12.parameters()["nominal_density"], json!(47));
    assert_eq!(v12.parameters()["tsettle"], json!(2));
    assert_eq!(v12.parameters()["name"], json!("SettlingCFSheet"));
}

#[test]
fn self_connection_is_matched() {
    let model = Model::new(with_lateral(standard()), ModelOptions::default()).expect("builds");
    let laterals: Vec<(String, String)> = model
        .projections()
        .values()
        .filter(|proj| proj.matchname() == Some("lateral_excitatory_projections"))
        .map(|proj| (proj.src().to_string(), proj.dest().to_string()))
        .collect();
    assert_eq!(
        laterals,
        [
            ("V11".to_string(), "V11".to_string()),
            ("V12".to_string(), "V12".to_string()),
        ]
    );
}

#[test]
fn absent_condition_never_matches() {
    let mut toy = standard();
    toy.conditions.register("V1", "afferent_projections", |_, dest| {
        (dest.get("SF") == Some(&json!(1)))
            .then(|| MatchCondition::new().require("level", "Retina"))
    });
    let model = Model::new(toy, ModelOptions::default()).expect("builds");
    let dests: Vec<&str> = model.projections().values().map(|p| p.dest()).collect();
    assert_eq!(dests, ["V11"]);
}

#[test]
fn projection_rules_fan_out_over_parameter_sets() {
    let mut toy = standard();
    toy.rules.register_projection_rule(
        "afferent_projections",
        ProjectionKind::SharedWeightCFProjection,
        |_, _, _| vec![named("AfferentOn"), named("AfferentOff")],
    );
    let model = Model::new(toy, ModelOptions::default()).expect("builds");
    let names: Vec<String> = model.projections().values().map(|p| p.identity()).collect();
    assert_eq!(
        names,
        [
            "V11.AfferentOn",
            "V11.AfferentOff",
            "V12.AfferentOn",
            "V12.AfferentOff"
        ]
    );
    assert!(
        model
            .projections()
            .values()
            .all(|p| p.projection_type == ProjectionKind::SharedWeightCFProjection)
    );
}

#[test]
fn connection_order_puts_afferent_before_lateral() {
    // V1 declared first, so laterals land in the tree before afferents.
    let toy = with_lateral(retina_v1(vec![
        ("V1", sf(&[1, 2])),
        ("Retina", SheetDeclaration::Identity),
    ]));
    let model = Model::new(toy, ModelOptions::default()).expect("builds");

    let stored: Vec<String> = model.projections().values().map(|p| p.identity()).collect();
    assert_eq!(
        stored,
        [
            "V11.LateralExcitatory",
            "V12.LateralExcitatory",
            "V11.Afferent",
            "V12.Afferent"
        ]
    );

    let plan = model.plan().expect("plan");
    insta::assert_json_snapshot!(plan.render_lines(), @r#"
    [
      "V11",
      "V12",
      "Retina",
      "Retina->V11.Afferent",
      "Retina->V12.Afferent",
      "V11->V11.LateralExcitatory",
      "V12->V12.LateralExcitatory"
    ]
    "#);
}

#[test]
fn plan_digest_tracks_content() {
    let a = Model::new(standard(), ModelOptions::default())
        .expect("builds")
        .plan()
        .expect("plan");
    let b = Model::new(standard(), ModelOptions::default())
        .expect("builds")
        .plan()
        .expect("plan");
    assert_eq!(a.digest, b.digest);
    assert_eq!(a.digest.len(), 64);
    assert_eq!(a.plan_kind, topo_model::TOPOLOGY_PLAN_KIND);

    let options = ModelOptions {
        params: [("cortex_density".to_string(), json!(12))].into_iter().collect(),
        ..ModelOptions::default()
    };
    let c = Model::new(standard(), options)
        .expect("builds")
        .plan()
        .expect("plan");
    assert_ne!(a.digest, c.digest);

    let plan_json = serde_json::to_value(&a).expect("serialise");
    assert_eq!(plan_json["sheets"][0]["sheetType"], json!("GeneratorSheet"));
    assert_eq!(plan_json["projections"][0]["matchname"], json!("afferent_projections"));
}

#[test]
fn instantiating_sheets_twice_registers_each_once_per_call() {
    let model = Model::new(standard(), ModelOptions::default()).expect("builds");
    let mut sim = Simulation::new();
    let sheets_only = Stages::only([InstantiateStage::Sheets]);

    for _ in 0..2 {
        let report = model.instantiate(&sheets_only, &mut sim).expect("sheets");
        let names: Vec<&str> = report.sheets.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Retina", "V11", "V12"]);
        assert!(report.projections.is_empty());
    }
    for identity in ["Retina", "V11", "V12"] {
        assert_eq!(sim.registration_count(identity), 2);
    }
    assert_eq!(sim.sheets().count(), 3);
    assert_eq!(sim.projections().count(), 0);
}

#[test]
fn full_instantiation_makes_specs_resolvable() {
    let model = Model::new(with_lateral(standard()), ModelOptions::default()).expect("builds");
    let mut sim = Simulation::new();

    let unresolved = model.sheet("V11").expect("V11").resolve(&sim);
    assert!(matches!(unresolved, Err(TopoError::NotRegistered(ref name)) if name == "V11"));

    let report = model.instantiate(&Stages::All, &mut sim).expect("instantiate");
    assert_eq!(report.sheets.len(), 3);
    let connected: Vec<&str> = report.projections.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(
        connected,
        [
            "V11.Afferent",
            "V12.Afferent",
            "V11.LateralExcitatory",
            "V12.LateralExcitatory"
        ]
    );

    for proj in model.projections().values() {
        let handle = proj.resolve(&sim).expect("projection registered");
        assert_eq!(handle.name, proj.identity());
    }
    assert_eq!(sim.projections_into("V11").count(), 2);
    assert!(sim.lookup("V12").is_some());
}

#[test]
fn projections_without_sheets_fail_in_the_runtime() {
    let model = Model::new(standard(), ModelOptions::default()).expect("builds");
    let mut sim = Simulation::new();
    let err = model
        .instantiate(&Stages::only([InstantiateStage::Projections]), &mut sim)
        .expect_err("no sheets registered");
    assert_eq!(err.class(), ErrorClass::Runtime);
    assert!(sim.is_empty());
}

#[test]
fn unranked_match_fails_before_any_connection() {
    let mut toy = standard();
    toy.rules
        .register_projection_rule("feedback_projections", ProjectionKind::CFProjection, |_, _, _| {
            named("Feedback")
        });
    toy.conditions.register("V1", "feedback_projections", |_, _| {
        Some(MatchCondition::new().require("level", "V1"))
    });
    let model = Model::new(toy, ModelOptions::default()).expect("builds");

    let err = model.plan().expect_err("unranked");
    assert!(matches!(
        err,
        TopoError::UnrankedMatch { ref matchname, .. } if matchname == "feedback_projections"
    ));
    assert_eq!(err.class(), ErrorClass::Configuration);

    let mut sim = Simulation::new();
    let err = model
        .instantiate(&Stages::All, &mut sim)
        .expect_err("unranked");
    assert!(matches!(err, TopoError::UnrankedMatch { .. }));
    // Sheets stay registered; no projection was connected.
    assert_eq!(sim.sheets().count(), 3);
    assert_eq!(sim.projections().count(), 0);
}

/// Simulation that refuses to register one sheet.
struct Refusing {
    sim: Simulation,
    refuse: &'static str,
}

impl Runtime for Refusing {
    fn register(&mut self, name: &str, object: SheetObject) -> Result<Handle, RuntimeError> {
        if name == self.refuse {
            return Err(RuntimeError::Rejected {
                name: name.to_string(),
                reason: "out of memory".to_string(),
            });
        }
        self.sim.register(name, object)
    }

    fn lookup(&self, name: &str) -> Option<Handle> {
        self.sim.lookup(name)
    }

    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        kind: ProjectionKind,
        parameters: &Parameters,
    ) -> Result<Handle, RuntimeError> {
        self.sim.connect(src, dest, kind, parameters)
    }
}

#[test]
fn sheet_failure_aborts_and_keeps_earlier_sheets() {
    let model = Model::new(standard(), ModelOptions::default()).expect("builds");
    let mut runtime = Refusing {
        sim: Simulation::new(),
        refuse: "V11",
    };

    let err = model
        .instantiate(&Stages::All, &mut runtime)
        .expect_err("V11 refused");
    assert!(matches!(
        err,
        TopoError::Runtime(RuntimeError::Rejected { ref name, .. }) if name == "V11"
    ));
    assert_eq!(err.class(), ErrorClass::Runtime);

    let retina = model.sheet("Retina").expect("Retina spec");
    assert_eq!(retina.resolve(&runtime).map(|h| h.name), Ok("Retina".to_string()));
    assert!(runtime.lookup("V12").is_none());
    assert_eq!(runtime.sim.sheets().count(), 1);
    assert_eq!(runtime.sim.projections().count(), 0);
}

#[test]
fn duplicate_sheet_paths_are_rejected_by_default() {
    let toy = || {
        retina_v1(vec![
            ("Retina", SheetDeclaration::Identity),
            ("V1", sf(&[1, 1])),
        ])
    };
    let err = Model::new(toy(), ModelOptions::default()).expect_err("duplicate");
    assert!(matches!(err, TopoError::DuplicatePath { tree: "sheets", .. }));
    assert_eq!(err.class(), ErrorClass::Construction);

    let options = ModelOptions {
        collisions: CollisionPolicy::Overwrite,
        ..ModelOptions::default()
    };
    let model = Model::new(toy(), options).expect("overwrite allowed");
    assert_eq!(identities(model.sheets().values()), ["Retina", "V11"]);
    assert_eq!(model.projections().len(), 1);
}

#[test]
fn unimplemented_hooks_are_configuration_errors() {
    let err = Model::new(Bare, ModelOptions::default()).expect_err("no patterns hook");
    assert_eq!(err, TopoError::UnimplementedHook("setup_training_patterns"));
    assert_eq!(err.class(), ErrorClass::Configuration);

    let options = ModelOptions {
        setup: Stages::only([SetupStage::Sheets]),
        ..ModelOptions::default()
    };
    let err = Model::new(Bare, options).expect_err("no sheets hook");
    assert_eq!(err, TopoError::UnimplementedHook("setup_sheets"));

    let model = Model::new(Bare, ModelOptions::deferred()).expect("nothing runs");
    assert!(model.sheets().is_empty());
}

#[test]
fn level_without_sheet_rule_fails_even_when_empty() {
    let toy = retina_v1(vec![
        ("Retina", SheetDeclaration::Identity),
        ("LGN", SheetDeclaration::Sheets(Vec::new())),
    ]);
    let err = Model::new(toy, ModelOptions::default()).expect_err("no LGN rule");
    assert_eq!(err, TopoError::UnknownSheetLevel("LGN".to_string()));
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn empty_declaration_skips_a_level() {
    let toy = retina_v1(vec![
        ("Retina", SheetDeclaration::Identity),
        ("V1", SheetDeclaration::Args(PropertyArgs::empty())),
    ]);
    let model = Model::new(toy, ModelOptions::default()).expect("builds");
    assert_eq!(identities(model.sheets().values()), ["Retina"]);
    assert!(model.projections().is_empty());
}

#[test]
fn missing_projection_rule_is_reported() {
    let mut toy = standard();
    toy.conditions.register("V1", "afferent_center_projections", |_, _| {
        Some(MatchCondition::new().require("level", "Retina"))
    });
    let err = Model::new(toy, ModelOptions::default()).expect_err("no rule");
    assert_eq!(
        err,
        TopoError::UnknownProjectionRule("afferent_center_projections".to_string())
    );
}

#[test]
fn global_overrides_win_over_caller_parameters() {
    let mut globals = GlobalParams::new();
    globals.set("cortex_density", json!(98));
    let options = ModelOptions {
        params: [("cortex_density".to_string(), json!(12))].into_iter().collect(),
        ..ModelOptions::default()
    };
    let model = Model::registered(standard(), options, &mut globals).expect("builds");
    assert_eq!(model.param("cortex_density"), Some(&json!(98)));
    assert_eq!(
        model.sheet("V11").expect("V11").parameters()["nominal_density"],
        json!(98)
    );
    assert_eq!(globals.get_param_values()["cortex_density"], json!(98));
}

#[test]
fn deferred_setup_can_run_stage_by_stage() {
    let mut model = Model::new(standard(), ModelOptions::deferred()).expect("builds");
    assert!(model.sheets().is_empty());

    model
        .setup(&Stages::only([SetupStage::Sheets]))
        .expect("sheets");
    assert_eq!(model.sheets().len(), 3);
    assert!(model.projections().is_empty());

    model
        .setup(&Stages::only([SetupStage::Projections]))
        .expect("projections");
    assert_eq!(model.projections().len(), 2);
}

#[test]
fn declared_level_key_is_rejected() {
    let toy = retina_v1(vec![(
        "Retina",
        SheetDeclaration::Sheets(vec![IndexMap::from([(
            "level".to_string(),
            json!("V1"),
        )])]),
    )]);
    let err = Model::new(toy, ModelOptions::default()).expect_err("level override");
    assert_eq!(err.class(), ErrorClass::Configuration);
}

#[test]
fn sheet_properties_are_canonical() {
    let toy = retina_v1(vec![(
        "V1",
        SheetDeclaration::Sheets(vec![IndexMap::from([
            ("SF".to_string(), json!(2)),
            ("eye".to_string(), json!("Left")),
            ("colour".to_string(), json!("red")),
        ])]),
    )]);
    let model = Model::new(toy, ModelOptions::default()).expect("builds");
    let spec = model.sheet("LeftV12").expect("canonical identity");
    let keys: Vec<&String> = spec.properties().iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["eye", "level", "SF"]);
    assert_eq!(
        spec.properties(),
        &Properties::new().with("eye", "Left").with("level", "V1").with("SF", 2)
    );
}
