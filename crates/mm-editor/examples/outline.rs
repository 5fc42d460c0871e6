//! Build a small mind map, print it as an indented outline with positions,
//! then undo part of it.
//!
//! Run with `RUST_LOG=debug` to see rejected edits and layout warnings.

use mm_core::id::NodeId;
use mm_core::model::{LayoutKind, Sheet};
use mm_editor::{Editor, EditorConfig};
use std::error::Error;

fn print_outline(sheet: &Sheet) {
    println!("{} [{:?}, theme {}]", sheet.title, sheet.layout, sheet.theme);
    let mut stack = vec![(sheet.root_id, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = sheet.nodes.get(id) else {
            continue;
        };
        println!(
            "{:indent$}- {} @ ({:.0}, {:.0}) {:.0}x{:.0}",
            "",
            node.text,
            node.x,
            node.y,
            node.width,
            node.height,
            indent = depth * 2
        );
        stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut editor = Editor::new(EditorConfig::default());
    let sheet = editor.document().active_sheet_id;
    let root = editor.document().sheet(sheet)?.root_id;
    editor.rename_node(root, "Product launch")?;

    let mut branches: Vec<NodeId> = Vec::new();
    let mut placed: Vec<(NodeId, NodeId)> = Vec::new();
    for title in ["Research", "Design", "Marketing"] {
        if let Some(id) = editor.insert_child(root)? {
            editor.rename_node(id, title)?;
            branches.push(id);
        }
    }
    for (branch, leaves) in branches.iter().zip([
        &["Interviews", "Competitors"][..],
        &["Wireframes"][..],
        &["Press kit", "Launch post", "Newsletter"][..],
    ]) {
        for leaf in leaves {
            if let Some(id) = editor.insert_child(*branch)? {
                editor.rename_node(id, leaf)?;
                placed.push((*branch, id));
            }
        }
    }

    // Illegal: a branch cannot move under its own leaf. Logged and ignored.
    if let Some((branch, leaf)) = placed.first() {
        let moved = editor.move_node(*branch, *leaf)?;
        println!("moving a branch under its leaf accepted: {moved}");
    }

    print_outline(editor.document().sheet(sheet)?);

    editor.set_layout_algorithm(sheet, LayoutKind::Mindmap)?;
    editor.retheme(sheet, "fresh")?;
    println!();
    print_outline(editor.document().sheet(sheet)?);

    while let Some(step) = editor.undo() {
        if step == "rename topic" {
            break;
        }
        println!("undid: {step}");
    }
    println!();
    print_outline(editor.document().sheet(sheet)?);

    println!("\n{} bytes of JSON", editor.to_json()?.len());
    Ok(())
}
