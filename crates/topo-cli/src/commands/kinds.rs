use crate::support::print_json_or_exit;
use serde_json::{Value, json};
use topo_kernel::{ObjectKind, ObjectType, value_text};

pub fn run(json_output: bool) {
    if json_output {
        let kinds: Vec<Value> = ObjectKind::all()
            .map(|kind| {
                json!({
                    "capability": if kind.is_sheet() { "sheet" } else { "projection" },
                    "kind": kind.type_name(),
                    "defaults": kind.default_parameters(),
                })
            })
            .collect();
        print_json_or_exit(&kinds);
        return;
    }

    for kind in ObjectKind::all() {
        let capability = if kind.is_sheet() { "sheet" } else { "projection" };
        println!("{} ({capability})", kind.type_name());
        for (name, default) in kind.default_parameters() {
            println!("  {name} = {}", value_text(&default));
        }
    }
}
