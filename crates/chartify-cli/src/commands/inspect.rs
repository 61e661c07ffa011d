//! Inspect command - show which processor would claim each object

use console::style;
use std::path::PathBuf;

use crate::error::Result;
use crate::input;

pub fn run(files: &[PathBuf], generic: bool) -> Result<()> {
    let objects = input::read_manifests(files)?;
    let registry = super::registry(generic);

    println!(
        "{} {} object(s)",
        style("Inspecting").cyan().bold(),
        objects.len()
    );
    println!();

    let mut unhandled = 0;
    for obj in &objects {
        let object = obj.object_ref().to_string();
        match registry.find(obj) {
            Some(processor) => {
                println!("  {:50} {}", object, style(processor.name()).green());
            }
            None => {
                unhandled += 1;
                println!("  {:50} {}", object, style("unhandled").yellow());
            }
        }
    }

    println!();
    println!(
        "{} handled, {} unhandled",
        objects.len() - unhandled,
        unhandled
    );

    Ok(())
}
