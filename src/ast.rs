/// A node in the intermediate stylesheet tree.
///
/// Utilities produce declarations, variants wrap them in rules whose selector
/// may reference the parent through `&`, and at-rules are rules whose selector
/// starts with `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Declaration {
        property: String,
        value: String,
        important: bool,
    },
    Rule {
        selector: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn decl(property: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Declaration {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn rule(selector: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Rule {
            selector: selector.into(),
            children,
        }
    }
}

/// Marks every declaration in the tree as `!important`.
pub fn mark_important(nodes: &mut [Node]) {
    for node in nodes {
        match node {
            Node::Declaration { important, .. } => *important = true,
            Node::Rule { children, .. } => mark_important(children),
        }
    }
}

pub fn walk_declarations<'a>(nodes: &'a [Node], visit: &mut dyn FnMut(&'a str, &'a str)) {
    for node in nodes {
        match node {
            Node::Declaration {
                property, value, ..
            } => visit(property, value),
            Node::Rule { children, .. } => walk_declarations(children, visit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, mark_important, walk_declarations};

    #[test]
    fn marks_nested_declarations_important() {
        let mut nodes = vec![
            Node::decl("color", "red"),
            Node::rule("&:hover", vec![Node::decl("color", "blue")]),
        ];
        mark_important(&mut nodes);

        let mut seen = Vec::new();
        fn collect(nodes: &[Node], seen: &mut Vec<bool>) {
            for node in nodes {
                match node {
                    Node::Declaration { important, .. } => seen.push(*important),
                    Node::Rule { children, .. } => collect(children, seen),
                }
            }
        }
        collect(&nodes, &mut seen);
        assert_eq!(seen, vec![true, true]);
    }

    #[test]
    fn walks_declarations_depth_first() {
        let nodes = vec![
            Node::decl("a", "1"),
            Node::rule("@media print", vec![Node::decl("b", "2")]),
        ];
        let mut props = Vec::new();
        walk_declarations(&nodes, &mut |property, _| props.push(property));
        assert_eq!(props, vec!["a", "b"]);
    }
}
