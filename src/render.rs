/*!
 * Box-drawing rendering of a scanned tree
 */

use crate::types::{Node, Tree};

const MID_CHILD: &str = "├── ";
const LAST_CHILD: &str = "└── ";
const MID_INDENT: &str = "│   ";
const LAST_INDENT: &str = "    ";

/// Flatten a tree into connector-prefixed lines, depth-first, keeping each
/// level's order
pub fn render(tree: &Tree) -> Vec<String> {
    let mut lines = Vec::new();
    render_into(tree, "", &mut lines);
    lines
}

fn render_into(tree: &Tree, prefix: &str, lines: &mut Vec<String>) {
    let count = tree.len();
    for (index, (name, node)) in tree.iter().enumerate() {
        let is_last = index + 1 == count;
        let connector = if is_last { LAST_CHILD } else { MID_CHILD };
        lines.push(format!("{}{}{}", prefix, connector, name));

        if let Node::Directory(subtree) = node {
            let indent = if is_last { LAST_INDENT } else { MID_INDENT };
            render_into(subtree, &format!("{}{}", prefix, indent), lines);
        }
    }
}
