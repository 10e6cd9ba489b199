use askbot_common::CommentNode;

/// Render a discussion tree as one `author:text` line per comment,
/// depth-first in source order, indented with one tab per level.
///
/// The root is the post itself and produces no line; its direct replies sit
/// at depth 0. A reply without an author produces no line either, and its
/// own replies take its place at the same depth.
pub fn flatten(root: &CommentNode) -> Vec<String> {
    let mut lines = Vec::new();
    for child in &root.children {
        flatten_into(child, 0, &mut lines);
    }
    lines
}

fn flatten_into(node: &CommentNode, depth: usize, lines: &mut Vec<String>) {
    let child_depth = match node.author.as_deref() {
        Some(author) => {
            let text = node.text.as_deref().unwrap_or_default().replace('\n', " ");
            lines.push(format!("{}{}:{}", "\t".repeat(depth), author, text));
            depth + 1
        }
        None => depth,
    };

    for child in &node.children {
        flatten_into(child, child_depth, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(author: Option<&str>, text: &str, children: Vec<CommentNode>) -> CommentNode {
        CommentNode::new(author, Some(text), children)
    }

    #[test]
    fn deleted_reply_is_skipped_but_its_replies_are_kept() {
        let post = node(
            Some("op"),
            "question",
            vec![node(
                Some("A"),
                "hi",
                vec![node(None, "x", vec![node(Some("B"), "yo\nthere", vec![])])],
            )],
        );

        assert_eq!(flatten(&post), vec!["A:hi", "\tB:yo there"]);
    }

    #[test]
    fn root_contributes_no_line() {
        let post = node(Some("op"), "question", vec![]);
        assert!(flatten(&post).is_empty());
    }

    #[test]
    fn siblings_keep_source_order_in_preorder() {
        let post = node(
            None,
            "",
            vec![
                node(Some("a"), "1", vec![node(Some("a1"), "1.1", vec![])]),
                node(Some("b"), "2", vec![]),
            ],
        );
        assert_eq!(flatten(&post), vec!["a:1", "\ta1:1.1", "b:2"]);
    }

    #[test]
    fn missing_text_renders_empty() {
        let post = node(None, "", vec![CommentNode::new(Some("a"), None, vec![])]);
        assert_eq!(flatten(&post), vec!["a:"]);
    }

    #[test]
    fn deleted_top_level_reply_promotes_children_to_depth_zero() {
        let post = node(
            None,
            "",
            vec![node(None, "", vec![node(Some("c"), "kept", vec![])])],
        );
        assert_eq!(flatten(&post), vec!["c:kept"]);
    }

    fn arb_tree() -> impl Strategy<Value = CommentNode> {
        let leaf = (proptest::option::of("[a-z]{1,6}"), "[a-z \n]{0,12}")
            .prop_map(|(author, text)| {
                CommentNode::new(author.as_deref(), Some(text.as_str()), vec![])
            });
        leaf.prop_recursive(4, 48, 5, |inner| {
            (
                proptest::option::of("[a-z]{1,6}"),
                "[a-z \n]{0,12}",
                prop::collection::vec(inner, 0..5),
            )
                .prop_map(|(author, text, children)| {
                    CommentNode::new(author.as_deref(), Some(text.as_str()), children)
                })
        })
    }

    fn authored_descendants(node: &CommentNode) -> usize {
        node.children
            .iter()
            .map(|c| usize::from(c.author.is_some()) + authored_descendants(c))
            .sum()
    }

    proptest! {
        #[test]
        fn line_count_equals_authored_replies(root in arb_tree()) {
            prop_assert_eq!(flatten(&root).len(), authored_descendants(&root));
        }

        #[test]
        fn lines_never_contain_newlines(root in arb_tree()) {
            for line in flatten(&root) {
                prop_assert!(!line.contains('\n'));
            }
        }

        #[test]
        fn indentation_grows_at_most_one_level(root in arb_tree()) {
            let mut previous: Option<usize> = None;
            for line in flatten(&root) {
                let depth = line.chars().take_while(|c| *c == '\t').count();
                match previous {
                    None => prop_assert_eq!(depth, 0),
                    Some(prev) => prop_assert!(depth <= prev + 1),
                }
                previous = Some(depth);
            }
        }
    }
}
