//! Integration tests: drive the kernel pieces by hand against a recording
//! runtime, the way a model orchestrator would.

use indexmap::IndexMap;
use serde_json::json;
use topo_kernel::{
    Handle, MatchCondition, MatchConditions, ObjectKind, Parameters, ProjectionKind,
    ProjectionSpec, Properties, RuleRegistry, Runtime, RuntimeError, SheetKind, SheetObject,
    SheetSpec, Specification, TopoError, order_projections,
};

#[derive(Default)]
struct Recorder {
    registered: IndexMap<String, Handle>,
    log: Vec<String>,
}

impl Runtime for Recorder {
    fn register(&mut self, name: &str, object: SheetObject) -> Result<Handle, RuntimeError> {
        let handle = Handle::new(name, object.kind);
        self.registered.insert(name.to_string(), handle.clone());
        self.log.push(format!("register {name}"));
        Ok(handle)
    }

    fn lookup(&self, name: &str) -> Option<Handle> {
        self.registered.get(name).cloned()
    }

    fn connect(
        &mut self,
        src: &str,
        dest: &str,
        kind: ProjectionKind,
        parameters: &Parameters,
    ) -> Result<Handle, RuntimeError> {
        if !self.registered.contains_key(src) {
            return Err(RuntimeError::UnknownSheet(src.to_string()));
        }
        let name = format!("{dest}.{}", parameters["name"].as_str().unwrap_or_default());
        let handle = Handle::new(name.clone(), kind);
        self.registered.insert(name.clone(), handle.clone());
        self.log.push(format!("connect {src}->{name}"));
        Ok(handle)
    }
}

fn sheet(kind: SheetKind, props: Properties) -> SheetSpec {
    SheetSpec::new(kind, props).expect("level present")
}

#[test]
fn hand_assembled_topology_registers_in_connection_order() {
    let mut rules: RuleRegistry<()> = RuleRegistry::with_catalogue();
    rules.register_sheet_rule("V1", SheetKind::CFSheet, |_, props| {
        let mut params = Parameters::new();
        params.insert("tsettle".into(), props.get("SF").cloned().unwrap_or(json!(0)));
        params
    });
    rules.register_projection_rule(
        "afferent_projections",
        ProjectionKind::CFProjection,
        |_, _, _| {
            let mut params = Parameters::new();
            params.insert("name".into(), json!("Afferent"));
            params
        },
    );
    rules.register_projection_rule(
        "lateral_inhibitory_projections",
        ProjectionKind::CFProjection,
        |_, _, _| {
            let mut params = Parameters::new();
            params.insert("name".into(), json!("LateralInhibitory"));
            params
        },
    );

    let mut conditions: MatchConditions<()> = MatchConditions::new();
    conditions.register("V1", "lateral_inhibitory_projections", |_, _| {
        Some(MatchCondition::new().require("level", "V1"))
    });
    conditions.register("V1", "afferent_projections", |_, _| {
        Some(MatchCondition::new().require("level", "Retina"))
    });

    let retina = sheet(SheetKind::GeneratorSheet, Properties::new().with("level", "Retina"));
    let mut v1 = sheet(
        SheetKind::CFSheet,
        Properties::new().with("SF", 2).with("level", "V1"),
    );
    let sheet_rules = rules.sheet_labels();
    let patch = sheet_rules["V1"](&(), v1.properties());
    v1.update_parameters(patch);
    assert_eq!(v1.identity(), "V12");
    assert_eq!(v1.parameters()["tsettle"], json!(2));

    let labels = rules.projection_labels();
    let types = rules.projection_types();
    let computed = conditions
        .compute_conditions("V1", &(), v1.properties())
        .expect("V1 registered");
    let mut projections: Vec<ProjectionSpec> = Vec::new();
    for src in [&v1, &retina] {
        for (matchname, condition) in &computed {
            if !condition.as_ref().is_some_and(|c| c.holds(src.properties())) {
                continue;
            }
            for set in labels[matchname](&(), src.properties(), v1.properties()).into_vec() {
                let mut proj = ProjectionSpec::new(types[matchname], src, &v1);
                proj.update_parameters(set);
                proj.tag(matchname.clone());
                projections.push(proj);
            }
        }
    }
    assert_eq!(projections.len(), 2);

    let mut runtime = Recorder::default();
    for spec in [&retina, &v1] {
        spec.instantiate(&mut runtime).expect("register");
    }
    for proj in order_projections(&projections).expect("ranked") {
        proj.instantiate(&mut runtime).expect("connect");
    }
    assert_eq!(
        runtime.log,
        [
            "register Retina",
            "register V12",
            "connect Retina->V12.Afferent",
            "connect V12->V12.LateralInhibitory",
        ]
    );

    let handle = projections[0].resolve(&runtime).expect("connected");
    assert_eq!(handle.kind, ObjectKind::Projection(ProjectionKind::CFProjection));
    assert_eq!(projections[0].describe(), "ProjectionSpec(CFProjection, V12, V12)");
}

#[test]
fn runtime_failures_surface_as_runtime_errors() {
    let retina = sheet(SheetKind::GeneratorSheet, Properties::new().with("level", "Retina"));
    let v1 = sheet(SheetKind::CFSheet, Properties::new().with("level", "V1"));
    let proj = ProjectionSpec::new(ProjectionKind::OneToOneProjection, &retina, &v1);

    let mut runtime = Recorder::default();
    let err = proj.instantiate(&mut runtime).expect_err("retina not registered");
    assert_eq!(
        err,
        TopoError::Runtime(RuntimeError::UnknownSheet("Retina".to_string()))
    );
    assert_eq!(err.to_string(), "sheet `Retina` is not registered");
}
