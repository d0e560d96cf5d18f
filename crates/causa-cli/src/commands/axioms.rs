use crate::support::print_json;
use causa_kernel::AxiomRegistry;
use serde_json::json;

pub fn run(json_output: bool) {
    let registry = AxiomRegistry::new();
    if json_output {
        let axioms: Vec<_> = registry
            .axioms()
            .iter()
            .map(|axiom| {
                json!({
                    "name": axiom.name(),
                    "statement": axiom.explain(),
                })
            })
            .collect();
        print_json(&json!({ "axioms": axioms }));
    } else {
        println!("{}", registry.explain_all());
    }
}
