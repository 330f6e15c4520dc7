//! List commands implementation

use crate::programmers::available_programmers;

/// List all programmers compiled into this binary
pub fn list_programmers() {
    let programmers = available_programmers();
    if programmers.is_empty() {
        println!("No programmers available (recompile with programmer features enabled)");
        return;
    }

    println!("Supported programmers:");
    println!();
    for p in &programmers {
        let aliases = if p.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", p.aliases.join(", "))
        };
        println!("  {:10} - {}{}", p.name, p.description, aliases);
    }
}
