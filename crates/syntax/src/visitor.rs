//! Kind-based dispatch to per-node visitor methods.

use crate::syntax_kind::{SyntaxKind, node_kinds};
use crate::tree::NodeRef;

macro_rules! define_visitor {
    ($($kind:ident => $visit:ident,)*) => {
        /// One method per node kind. Every method defaults to [`Visitor::visit_element`].
        ///
        /// Dispatch happens at a single node; implementations decide whether and in which
        /// order to descend into `node.children()`.
        pub trait Visitor<'t> {
            /// Fallback for every kind without an overridden method, and the only method
            /// reached by extension kinds.
            fn visit_element(&mut self, node: NodeRef<'t>) {
                let _ = node;
            }

            fn visit_token(&mut self, node: NodeRef<'t>) {
                self.visit_element(node);
            }

            fn visit_error(&mut self, node: NodeRef<'t>) {
                self.visit_element(node);
            }

            $(
                fn $visit(&mut self, node: NodeRef<'t>) {
                    self.visit_element(node);
                }
            )*
        }

        pub(crate) fn dispatch<'t, V: Visitor<'t> + ?Sized>(node: NodeRef<'t>, visitor: &mut V) {
            match node.kind() {
                SyntaxKind::Token(_) => visitor.visit_token(node),
                SyntaxKind::Error => visitor.visit_error(node),
                $(SyntaxKind::$kind => visitor.$visit(node),)*
                SyntaxKind::Extension(_) => visitor.visit_element(node),
            }
        }
    };
}

node_kinds!(define_visitor);
