//! Debug tool: compile a node tree from JSON and print the resulting
//! operation graph.
//!
//! Usage: graph_dump <tree.json> [--render] [--plan]
//!
//! Prints Graphviz DOT by default; `--plan` prints the sorted order and
//! execution groups instead. `--render` compiles for a render build
//! rather than the viewport.

use compositor::graph::dump;
use compositor::{BuildContext, CompositorError, NodeTree, compile};

fn main() -> Result<(), CompositorError> {
    env_logger::init();

    let mut path = None;
    let mut render = false;
    let mut plan = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--render" => render = true,
            "--plan" => plan = true,
            other => path = Some(other.to_string()),
        }
    }
    let Some(path) = path else {
        eprintln!("usage: graph_dump <tree.json> [--render] [--plan]");
        std::process::exit(2);
    };

    let json = std::fs::read_to_string(&path)?;
    let tree: NodeTree = serde_json::from_str(&json)?;
    let context = if render {
        BuildContext::render(1920, 1080)
    } else {
        BuildContext::viewport()
    };

    let result = compile(&tree, &context)?;
    if plan {
        print_plan(&result);
    } else {
        print!("{}", dump::as_dot(result.graph()));
    }
    Ok(())
}

fn print_plan(plan: &compositor::ExecutionPlan) {
    println!("sorted:");
    for id in plan.sorted() {
        println!("  {} {}", id, plan.graph().operation(*id).kind().name());
    }
    println!("groups:");
    for group in plan.groups() {
        let members: Vec<String> = group
            .operations()
            .iter()
            .map(|id| id.to_string())
            .collect();
        let deps: Vec<String> = group.depends_on().iter().map(|d| d.to_string()).collect();
        println!(
            "  {} -> {} [{}] depends on [{}]",
            group.id(),
            group.output_operation(),
            members.join(", "),
            deps.join(", ")
        );
    }
}
