//! Components command implementation

use covenant_contracts::ComponentRegistry;

pub fn list() {
    let registry = ComponentRegistry::global();
    let sections = [
        ("Reporters", registry.reporter_names()),
        ("Expression interpreters", registry.interpreter_names()),
        ("Contract enforcers", registry.enforcer_names()),
    ];
    for (title, names) in sections {
        println!("{}:", title);
        for name in names {
            println!("  {}", name);
        }
    }
}
