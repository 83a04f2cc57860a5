use std::fmt;

use crate::token_kind::TokenKind;

/// Invokes `$callback!` with every non-terminal paired with its visitor method.
///
/// `SyntaxKind`, the `Visitor` trait and its dispatch are all generated from this list.
macro_rules! node_kinds {
    ($callback:ident) => {
        $callback! {
            Module => visit_module,
            ModuleDeclaration => visit_module_declaration,
            ExportList => visit_export_list,
            Export => visit_export,
            Body => visit_body,
            ImportDeclaration => visit_import_declaration,
            ImportQualifiedAs => visit_import_qualified_as,
            ImportSpec => visit_import_spec,
            ImportEmptySpec => visit_import_empty_spec,
            ImportIdsSpec => visit_import_ids_spec,
            ImportHidingSpec => visit_import_hiding_spec,
            ImportId => visit_import_id,
            ImportCnames => visit_import_cnames,
            ClassDeclaration => visit_class_declaration,
            InstanceDeclaration => visit_instance_declaration,
            Cdecls => visit_cdecls,
            DataDeclaration => visit_data_declaration,
            CdeclDataDeclaration => visit_cdecl_data_declaration,
            NewtypeDeclaration => visit_newtype_declaration,
            TypeDeclaration => visit_type_declaration,
            TypeFamilyDeclaration => visit_type_family_declaration,
            DefaultDeclaration => visit_default_declaration,
            FixityDeclaration => visit_fixity_declaration,
            TypeSignature => visit_type_signature,
            SimpleType => visit_simple_type,
            KindSignature => visit_kind_signature,
            Constructors => visit_constructors,
            Constructor => visit_constructor,
            RecordFields => visit_record_fields,
            FieldDeclaration => visit_field_declaration,
            Deriving => visit_deriving,
            Ttype => visit_ttype,
            ParenType => visit_paren_type,
            ListType => visit_list_type,
            DoNotation => visit_do_notation,
            LetAbstraction => visit_let_abstraction,
            ParenExpression => visit_paren_expression,
            ListExpression => visit_list_expression,
            Operator => visit_operator,
            ParenOperator => visit_paren_operator,
            QName => visit_q_name,
            ReservedId => visit_reserved_id,
            TextLiteral => visit_text_literal,
            DotDot => visit_dot_dot,
            Pragma => visit_pragma,
        }
    };
}

pub(crate) use node_kinds;

macro_rules! define_syntax_kind {
    ($($kind:ident => $visit:ident,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum SyntaxKind {
            /// A terminal.
            Token(TokenKind),
            /// A run of unexpected tokens, or the zero-width marker of a missing one.
            Error,
            $($kind,)*
            /// A kind owned by downstream tooling. The Haskell grammar never produces one.
            Extension(u16),
        }

        impl SyntaxKind {
            /// Every non-terminal, in declaration order.
            pub const NODES: &'static [SyntaxKind] = &[$(SyntaxKind::$kind,)*];

            /// Name of a non-terminal, `None` for tokens, errors and extensions.
            pub fn node_name(self) -> Option<&'static str> {
                match self {
                    $(SyntaxKind::$kind => Some(stringify!($kind)),)*
                    _ => None,
                }
            }
        }
    };
}

node_kinds!(define_syntax_kind);

impl SyntaxKind {
    pub fn is_token(self) -> bool {
        matches!(self, SyntaxKind::Token(_))
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Token(kind) if kind.is_trivia())
    }

    pub fn is_error(self) -> bool {
        self == SyntaxKind::Error
    }

    /// True for kinds that can own children: non-terminals, errors and extensions.
    pub fn is_composite(self) -> bool {
        !self.is_token()
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        SyntaxKind::Token(kind)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxKind::Token(kind) => write!(f, "{kind:?}"),
            SyntaxKind::Error => f.write_str("Error"),
            SyntaxKind::Extension(raw) => write!(f, "Extension({raw})"),
            kind => f.write_str(kind.node_name().unwrap_or("?")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(SyntaxKind::Cdecls.to_string(), "Cdecls");
        assert_eq!(SyntaxKind::Token(TokenKind::VarId).to_string(), "VarId");
        assert_eq!(SyntaxKind::Extension(7).to_string(), "Extension(7)");
        assert_eq!(SyntaxKind::Error.to_string(), "Error");
    }

    #[test]
    fn nodes_are_unique() {
        let mut nodes = SyntaxKind::NODES.to_vec();
        nodes.sort();
        nodes.dedup();
        assert_eq!(nodes.len(), SyntaxKind::NODES.len());
        assert!(nodes.iter().all(|kind| kind.node_name().is_some()));
    }
}
