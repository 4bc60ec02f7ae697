#[cfg(test)]
pub(crate) use test_utils::*;

#[cfg(test)]
mod test_utils {
    /// `text_node!("abc")`: a text leaf whose raw equals its value.
    macro_rules! text_node {
        ($value:literal) => {
            crate::md_ast::AstNode::new(crate::md_ast::NodeKind::Text {
                value: $value.to_string(),
            })
        };
    }
    pub(crate) use text_node;

    /// `fmt_node!(Bold, closed: true, [child, ...])`
    macro_rules! fmt_node {
        ($style:ident, closed: $closed:expr, [$($child:expr),* $(,)?]) => {
            crate::md_ast::AstNode::new(crate::md_ast::NodeKind::Formatting {
                style: crate::md_ast::FormattingStyle::$style,
                children: vec![$($child),*],
                closed: $closed,
            })
        };
    }
    pub(crate) use fmt_node;

    /// `paragraph!(child, ...)`
    macro_rules! paragraph {
        ($($child:expr),* $(,)?) => {
            crate::md_ast::AstNode::new(crate::md_ast::NodeKind::Paragraph {
                children: vec![$($child),*],
            })
        };
    }
    pub(crate) use paragraph;

    /// `root!(block, ...)`
    macro_rules! root {
        ($($block:expr),* $(,)?) => {
            crate::md_ast::AstNode::new(crate::md_ast::NodeKind::Root {
                children: vec![$($block),*],
            })
        };
    }
    pub(crate) use root;
}
