use crate::error::Error;
use crate::grammar::Cardinality;
use crate::syntax_kind::{SyntaxKind, node_kinds};
use crate::token_kind::TokenKind;
use crate::tree::NodeRef;

pub trait AstNode<'t>: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(node: NodeRef<'t>) -> Option<Self>;

    fn syntax(&self) -> NodeRef<'t>;

    fn text(&self) -> String {
        self.syntax().text()
    }
}

macro_rules! asts {
    () => {};
    ($name:ident $body:tt; $($rest:tt)*) => {
        ast!($name $body);
        asts!($($rest)*);
    };
}

macro_rules! ast {
    ($name:ident { $($field:tt)* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name<'t>(NodeRef<'t>);

        impl<'t> AstNode<'t> for $name<'t> {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$name
            }

            fn cast(node: NodeRef<'t>) -> Option<Self> {
                match node.kind() {
                    SyntaxKind::$name => Some(Self(node)),
                    _ => None,
                }
            }

            fn syntax(&self) -> NodeRef<'t> {
                self.0
            }
        }

        impl<'t> $name<'t> {
            pub const KIND: SyntaxKind = SyntaxKind::$name;

            /// Child kinds this wrapper gives access to, with their cardinality.
            pub const ACCESSORS: &'static [(SyntaxKind, Cardinality)] =
                ast_accessors!([] $($field)*);

            ast_field!($($field)*);
        }
    };
    ($name:ident [ $($item:ident,)* ]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name<'t> {
            $($item($item<'t>),)*
        }

        impl<'t> AstNode<'t> for $name<'t> {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$item)|*)
            }

            fn cast(node: NodeRef<'t>) -> Option<Self> {
                match node.kind() {
                    $(SyntaxKind::$item => $item::cast(node).map(Self::$item),)*
                    _ => None,
                }
            }

            fn syntax(&self) -> NodeRef<'t> {
                match self {
                    $(Self::$item(v) => v.syntax(),)*
                }
            }
        }
    };
}

macro_rules! ast_field {
    () => {};
    ($field:ident: [$ast:ident], $($rest:tt)*) => {
        pub fn $field(&self) -> impl Iterator<Item = $ast<'t>> + use<'t> {
            children(self.0)
        }
        ast_field!($($rest)*);
    };
    ($field:ident: $ast:ident?, $($rest:tt)*) => {
        pub fn $field(&self) -> Option<$ast<'t>> {
            children(self.0).next()
        }
        ast_field!($($rest)*);
    };
    ($field:ident: $ast:ident, $($rest:tt)*) => {
        pub fn $field(&self) -> Result<$ast<'t>, Error> {
            exactly_one(self.0, SyntaxKind::$ast)
        }
        ast_field!($($rest)*);
    };
    ($($item:item)*) => {
        $($item)*
    }
}

macro_rules! ast_accessors {
    ([$($acc:tt)*]) => {
        &[$($acc)*]
    };
    ([$($acc:tt)*] $field:ident: [$ast:ident], $($rest:tt)*) => {
        ast_accessors!([$($acc)* (SyntaxKind::$ast, Cardinality::ZeroOrMore),] $($rest)*)
    };
    ([$($acc:tt)*] $field:ident: $ast:ident?, $($rest:tt)*) => {
        ast_accessors!([$($acc)* (SyntaxKind::$ast, Cardinality::ZeroOrOne),] $($rest)*)
    };
    ([$($acc:tt)*] $field:ident: $ast:ident, $($rest:tt)*) => {
        ast_accessors!([$($acc)* (SyntaxKind::$ast, Cardinality::ExactlyOne),] $($rest)*)
    };
    ([$($acc:tt)*] $($item:item)*) => {
        &[$($acc)*]
    };
}

fn children<'t, N: AstNode<'t>>(node: NodeRef<'t>) -> impl Iterator<Item = N> + use<'t, N> {
    node.children().filter_map(N::cast)
}

fn exactly_one<'t, N: AstNode<'t>>(node: NodeRef<'t>, child: SyntaxKind) -> Result<N, Error> {
    let mut found = children::<N>(node);
    match (found.next(), found.count()) {
        (Some(first), 0) => Ok(first),
        (first, rest) => Err(Error::StructuralViolation {
            kind: node.kind(),
            child,
            range: node.range(),
            found: usize::from(first.is_some()) + rest,
        }),
    }
}

macro_rules! define_accessor_tables {
    ($($kind:ident => $visit:ident,)*) => {
        /// Accessor table of the wrapper for `kind`, `None` for kinds without one.
        pub fn accessors_of(kind: SyntaxKind) -> Option<&'static [(SyntaxKind, Cardinality)]> {
            match kind {
                $(SyntaxKind::$kind => Some(<$kind<'static>>::ACCESSORS),)*
                _ => None,
            }
        }
    };
}

node_kinds!(define_accessor_tables);

asts! {
    Module {
        pragma_list: [Pragma],
        module_declaration: ModuleDeclaration?,
        body: Body,
    };
    ModuleDeclaration {
        q_name: QName,
        export_list: ExportList?,
    };
    ExportList {
        export_list: [Export],
    };
    Export {
        q_name: QName,
        import_cnames: ImportCnames?,
    };
    Body {
        pragma_list: [Pragma],
        import_declaration_list: [ImportDeclaration],
        class_declaration_list: [ClassDeclaration],
        instance_declaration_list: [InstanceDeclaration],
        data_declaration_list: [DataDeclaration],
        newtype_declaration_list: [NewtypeDeclaration],
        type_declaration_list: [TypeDeclaration],
        type_family_declaration_list: [TypeFamilyDeclaration],
        default_declaration_list: [DefaultDeclaration],
        fixity_declaration_list: [FixityDeclaration],
        type_signature_list: [TypeSignature],
        q_name_list: [QName],
        reserved_id_list: [ReservedId],
        text_literal_list: [TextLiteral],
        dot_dot_list: [DotDot],
        do_notation_list: [DoNotation],
        let_abstraction_list: [LetAbstraction],
        paren_expression_list: [ParenExpression],
        list_expression_list: [ListExpression],
        cdecls_list: [Cdecls],

        /// Every declaration in source order, whatever its kind.
        pub fn declarations(&self) -> impl Iterator<Item = Declaration<'t>> + use<'t> {
            children(self.0)
        }
    };
    ImportDeclaration {
        q_name: QName,
        import_qualified_as: ImportQualifiedAs?,
        import_spec: ImportSpec?,

        pub fn is_qualified(&self) -> bool {
            self.0.children().any(|child| {
                child.token_kind() == Some(TokenKind::VarId)
                    && child.token_text() == Some("qualified")
            })
        }
    };
    ImportQualifiedAs {
        q_name: QName,
    };
    ImportSpec {
        import_empty_spec: ImportEmptySpec?,
        import_ids_spec: ImportIdsSpec?,
        import_hiding_spec: ImportHidingSpec?,
    };
    ImportEmptySpec {};
    ImportIdsSpec {
        import_id_list: [ImportId],
    };
    ImportHidingSpec {
        import_empty_spec: ImportEmptySpec?,
        import_ids_spec: ImportIdsSpec?,
    };
    ImportId {
        q_name: QName,
        import_cnames: ImportCnames?,
    };
    ImportCnames {
        dot_dot_list: [DotDot],
        q_name_list: [QName],
    };
    ClassDeclaration {
        ttype: Ttype,
        cdecls: Cdecls?,
    };
    InstanceDeclaration {
        ttype: Ttype,
        cdecls: Cdecls?,
    };
    Cdecls {
        pragma_list: [Pragma],
        type_signature_list: [TypeSignature],
        fixity_declaration_list: [FixityDeclaration],
        cdecl_data_declaration_list: [CdeclDataDeclaration],
        data_declaration_list: [DataDeclaration],
        default_declaration_list: [DefaultDeclaration],
        instance_declaration_list: [InstanceDeclaration],
        newtype_declaration_list: [NewtypeDeclaration],
        type_declaration_list: [TypeDeclaration],
        type_family_declaration_list: [TypeFamilyDeclaration],
        q_name_list: [QName],
        reserved_id_list: [ReservedId],
        text_literal_list: [TextLiteral],
        dot_dot_list: [DotDot],
        do_notation_list: [DoNotation],
        let_abstraction_list: [LetAbstraction],
        paren_expression_list: [ParenExpression],
        list_expression_list: [ListExpression],
        cdecls_list: [Cdecls],

        pub fn declarations(&self) -> impl Iterator<Item = Declaration<'t>> + use<'t> {
            children(self.0)
        }
    };
    DataDeclaration {
        simple_type: SimpleType,
        kind_signature: KindSignature?,
        constructors: Constructors?,
        deriving_list: [Deriving],
    };
    CdeclDataDeclaration {
        simple_type: SimpleType,
        kind_signature: KindSignature?,

        pub fn is_family(&self) -> bool {
            self.0.children().any(|child| child.token_text() == Some("family"))
        }
    };
    NewtypeDeclaration {
        simple_type: SimpleType,
        constructor: Constructor,
        deriving_list: [Deriving],
    };
    TypeDeclaration {
        simple_type: SimpleType,
        ttype: Ttype,
    };
    TypeFamilyDeclaration {
        simple_type: SimpleType,
        kind_signature: KindSignature?,
    };
    DefaultDeclaration {
        paren_type: ParenType,
    };
    FixityDeclaration {
        operator_list: [Operator],

        /// `infix`, `infixl` or `infixr`.
        pub fn fixity(&self) -> Option<TokenKind> {
            self.0.first_token()?.token_kind()
        }

        pub fn precedence(&self) -> Option<u8> {
            self.0
                .children()
                .find(|child| child.token_kind() == Some(TokenKind::Integer))?
                .token_text()?
                .parse()
                .ok()
        }
    };
    TypeSignature {
        q_name_list: [QName],
        ttype: Ttype,
    };
    SimpleType {
        q_name_list: [QName],
        paren_type_list: [ParenType],
    };
    KindSignature {
        ttype: Ttype,
    };
    Constructors {
        constructor_list: [Constructor],
    };
    Constructor {
        q_name_list: [QName],
        paren_type_list: [ParenType],
        list_type_list: [ListType],
        record_fields_list: [RecordFields],
    };
    RecordFields {
        field_declaration_list: [FieldDeclaration],
    };
    FieldDeclaration {
        q_name_list: [QName],
        ttype: Ttype,
    };
    Deriving {
        q_name: QName?,
        paren_type: ParenType?,
    };
    Ttype {
        q_name_list: [QName],
        paren_type_list: [ParenType],
        list_type_list: [ListType],
        text_literal_list: [TextLiteral],
    };
    ParenType {
        ttype_list: [Ttype],
    };
    ListType {
        ttype_list: [Ttype],
    };
    DoNotation {
        q_name_list: [QName],
        reserved_id_list: [ReservedId],
        text_literal_list: [TextLiteral],
        dot_dot_list: [DotDot],
        do_notation_list: [DoNotation],
        let_abstraction_list: [LetAbstraction],
        paren_expression_list: [ParenExpression],
        list_expression_list: [ListExpression],
        cdecls_list: [Cdecls],
    };
    LetAbstraction {
        cdecls: Cdecls,
    };
    ParenExpression {
        q_name_list: [QName],
        reserved_id_list: [ReservedId],
        text_literal_list: [TextLiteral],
        dot_dot_list: [DotDot],
        do_notation_list: [DoNotation],
        let_abstraction_list: [LetAbstraction],
        paren_expression_list: [ParenExpression],
        list_expression_list: [ListExpression],
        cdecls_list: [Cdecls],
    };
    ListExpression {
        q_name_list: [QName],
        reserved_id_list: [ReservedId],
        text_literal_list: [TextLiteral],
        dot_dot_list: [DotDot],
        do_notation_list: [DoNotation],
        let_abstraction_list: [LetAbstraction],
        paren_expression_list: [ParenExpression],
        list_expression_list: [ListExpression],
        cdecls_list: [Cdecls],
    };
    Operator {
        pub fn symbol(&self) -> Option<&'t str> {
            self.0.first_token()?.token_text()
        }
    };
    ParenOperator {
        pub fn symbol(&self) -> Option<&'t str> {
            self.0
                .children()
                .find(|child| {
                    matches!(child.token_kind(), Some(TokenKind::VarSym | TokenKind::ConSym))
                })?
                .token_text()
        }
    };
    QName {
        paren_operator: ParenOperator?,

        /// The identifier, or the operator symbol of a parenthesised operator.
        pub fn name(&self) -> Option<&'t str> {
            self.name_token()?.token_text()
        }

        pub fn is_qualified(&self) -> bool {
            let Some(token) = self.name_token() else {
                return false;
            };
            match token.token_kind() {
                Some(TokenKind::QVarId | TokenKind::QConId) => true,
                Some(TokenKind::VarSym | TokenKind::ConSym) => token
                    .token_text()
                    .is_some_and(|text| text.starts_with(char::is_uppercase) && text.contains('.')),
                _ => false,
            }
        }

        fn name_token(&self) -> Option<NodeRef<'t>> {
            self.0.descendants().find(|node| {
                matches!(
                    node.token_kind(),
                    Some(
                        TokenKind::VarId
                            | TokenKind::ConId
                            | TokenKind::QVarId
                            | TokenKind::QConId
                            | TokenKind::VarSym
                            | TokenKind::ConSym
                    )
                )
            })
        }
    };
    ReservedId {
        pub fn keyword(&self) -> Option<TokenKind> {
            self.0.first_token()?.token_kind()
        }
    };
    TextLiteral {
        /// The literal with its quotes removed and escapes decoded. `None` for
        /// malformed escapes.
        pub fn value(&self) -> Option<String> {
            let text = self.0.first_token()?.token_text()?;
            let inner = text
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .or_else(|| text.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))?;
            unescape(inner)
        }
    };
    DotDot {};
    Pragma {
        /// Text between `{-#` and `#-}`, trimmed.
        pub fn content(&self) -> Option<&'t str> {
            let text = self.0.first_token()?.token_text()?;
            Some(text.strip_prefix("{-#")?.strip_suffix("#-}")?.trim())
        }
    };
    Declaration [
        ImportDeclaration,
        ClassDeclaration,
        InstanceDeclaration,
        DataDeclaration,
        CdeclDataDeclaration,
        NewtypeDeclaration,
        TypeDeclaration,
        TypeFamilyDeclaration,
        DefaultDeclaration,
        FixityDeclaration,
        TypeSignature,
    ];
}

const ASCII_ESCAPES: [(&str, u8); 34] = [
    ("NUL", 0),
    ("SOH", 1),
    ("STX", 2),
    ("ETX", 3),
    ("EOT", 4),
    ("ENQ", 5),
    ("ACK", 6),
    ("BEL", 7),
    ("BS", 8),
    ("HT", 9),
    ("LF", 10),
    ("VT", 11),
    ("FF", 12),
    ("CR", 13),
    ("SO", 14),
    ("SI", 15),
    ("DLE", 16),
    ("DC1", 17),
    ("DC2", 18),
    ("DC3", 19),
    ("DC4", 20),
    ("NAK", 21),
    ("SYN", 22),
    ("ETB", 23),
    ("CAN", 24),
    ("EM", 25),
    ("SUB", 26),
    ("ESC", 27),
    ("FS", 28),
    ("GS", 29),
    ("RS", 30),
    ("US", 31),
    ("SP", 32),
    ("DEL", 127),
];

fn unescape(text: &str) -> Option<String> {
    let mut value = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(backslash) = rest.find('\\') {
        value.push_str(&rest[..backslash]);
        let (decoded, len) = escape(&rest[backslash + 1..])?;
        value.extend(decoded);
        rest = &rest[backslash + 1 + len..];
    }
    value.push_str(rest);
    Some(value)
}

/// Decodes the escape at the start of `rest` (just after the backslash). Returns the character,
/// if any, and the number of bytes consumed.
fn escape(rest: &str) -> Option<(Option<char>, usize)> {
    let c = rest.chars().next()?;
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '\\' | '"' | '\'' => c,
        // Empty escape, used to separate a numeric escape from a following digit.
        '&' => return Some((None, 1)),
        '^' => {
            let control = rest[1..].chars().next().filter(|c| ('@'..='_').contains(c))?;
            return Some((char::from_u32(control as u32 - '@' as u32), 2));
        }
        'x' | 'o' => {
            let radix = if c == 'x' { 16 } else { 8 };
            let (decoded, len) = numeric(&rest[1..], radix)?;
            return Some((Some(decoded), len + 1));
        }
        '0'..='9' => {
            let (decoded, len) = numeric(rest, 10)?;
            return Some((Some(decoded), len));
        }
        c if c.is_whitespace() => {
            let gap = rest.find(|c: char| !c.is_whitespace())?;
            return rest[gap..].starts_with('\\').then_some((None, gap + 1));
        }
        _ => {
            let (name, code) = ASCII_ESCAPES.iter().find(|(name, _)| rest.starts_with(name))?;
            return Some((Some(char::from(*code)), name.len()));
        }
    };
    Some((Some(decoded), c.len_utf8()))
}

fn numeric(digits: &str, radix: u32) -> Option<(char, usize)> {
    let len = digits.find(|d: char| !d.is_digit(radix)).unwrap_or(digits.len());
    let code = u32::from_str_radix(&digits[..len], radix).ok()?;
    Some((char::from_u32(code)?, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::T;
    use crate::config::ParseConfig;
    use crate::grammar::Grammar;
    use crate::layout::LayoutMode;
    use crate::{parse, parse_with};

    fn block(text: &str) -> crate::Parse {
        let config = ParseConfig {
            layout: LayoutMode::None,
            ..ParseConfig::default()
        };
        parse_with(text, SyntaxKind::Cdecls, &config).unwrap()
    }

    #[test]
    fn accessor_tables_follow_grammar() {
        for rule in Grammar::haskell().rules() {
            let expected: Vec<(SyntaxKind, Cardinality)> = rule
                .accessors()
                .iter()
                .map(|(kind, cardinality)| (*kind, *cardinality))
                .collect();
            let declared = accessors_of(rule.kind()).unwrap();
            assert_eq!(declared, expected.as_slice(), "{}", rule.kind());
        }
    }

    #[test]
    fn module() {
        let parse = parse(
            "{-# LANGUAGE GADTs #-}\n\
             module Data.Stack (Stack(..), push) where\n\
             \n\
             import qualified Data.List as L\n\
             import Data.Maybe hiding (fromJust)\n\
             \n\
             data Stack a = Empty | Push a (Stack a) deriving Show\n\
             \n\
             push :: a -> Stack a -> Stack a\n\
             push = Push\n",
        );
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let module = Module::cast(parse.tree().root()).unwrap();
        assert_eq!(module.pragma_list().count(), 1);

        let declaration = module.module_declaration().unwrap();
        assert_eq!(declaration.q_name().unwrap().name(), Some("Data.Stack"));
        let exports: Vec<Export> = declaration.export_list().unwrap().export_list().collect();
        assert_eq!(exports.len(), 2);
        let cnames = exports[0].import_cnames().unwrap();
        assert_eq!(cnames.dot_dot_list().count(), 1);

        let body = module.body().unwrap();
        let imports: Vec<ImportDeclaration> = body.import_declaration_list().collect();
        assert_eq!(imports.len(), 2);
        assert!(imports[0].is_qualified());
        let alias = imports[0].import_qualified_as().unwrap();
        assert_eq!(alias.q_name().unwrap().name(), Some("L"));
        let spec = imports[1].import_spec().unwrap();
        let hiding = spec.import_hiding_spec().unwrap();
        let ids: Vec<ImportId> = hiding.import_ids_spec().unwrap().import_id_list().collect();
        assert_eq!(ids[0].q_name().unwrap().name(), Some("fromJust"));

        let data = body.data_declaration_list().next().unwrap();
        let constructors = data.constructors().unwrap().constructor_list().count();
        assert_eq!(constructors, 2);
        assert_eq!(data.deriving_list().count(), 1);

        let signature = body.type_signature_list().next().unwrap();
        let names: Vec<&str> = signature.q_name_list().filter_map(|q| q.name()).collect();
        assert_eq!(names, ["push"]);
        assert_eq!(signature.ttype().unwrap().text().trim(), "a -> Stack a -> Stack a");

        let declarations: Vec<SyntaxKind> = body
            .declarations()
            .map(|declaration| declaration.syntax().kind())
            .collect();
        assert_eq!(
            declarations,
            [
                SyntaxKind::ImportDeclaration,
                SyntaxKind::ImportDeclaration,
                SyntaxKind::DataDeclaration,
                SyntaxKind::TypeSignature,
            ]
        );
    }

    #[test]
    fn class_body() {
        let parse = parse(
            "class Container f where\n  \
               {-# MINIMAL empty #-}\n  \
               data Elem f\n  \
               type Key f :: *\n  \
               empty :: f\n  \
               insert, delete :: Elem f -> f -> f\n  \
               infixr 5 <+>\n",
        );
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let module = Module::cast(parse.tree().root()).unwrap();
        let class = module
            .body()
            .unwrap()
            .class_declaration_list()
            .next()
            .unwrap();
        let cdecls = class.cdecls().unwrap();

        assert_eq!(cdecls.pragma_list().next().unwrap().content(), Some("MINIMAL empty"));
        assert_eq!(cdecls.cdecl_data_declaration_list().count(), 1);
        assert_eq!(cdecls.data_declaration_list().count(), 0);
        assert_eq!(cdecls.type_family_declaration_list().count(), 1);
        let signatures: Vec<TypeSignature> = cdecls.type_signature_list().collect();
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[1].q_name_list().count(), 2);

        let fixity = cdecls.fixity_declaration_list().next().unwrap();
        assert_eq!(fixity.fixity(), Some(T![infixr]));
        assert_eq!(fixity.precedence(), Some(5));
        assert_eq!(fixity.operator_list().next().unwrap().symbol(), Some("<+>"));
    }

    #[test]
    fn exactly_one_on_placeholder() {
        let parse = block("{ type T = }");
        assert_eq!(parse.errors().len(), 1);
        let cdecls = Cdecls::cast(parse.tree().root()).unwrap();
        let declaration = cdecls.type_declaration_list().next().unwrap();
        let ttype = declaration.ttype().unwrap();
        assert!(ttype.syntax().range().is_empty());
        assert_eq!(ttype.q_name_list().count(), 0);
    }

    #[test]
    fn leaves() {
        let parse = block(r#"{ M.lookup (+) (M.!) x "a\tb\65\&1" 'c' _ .. }"#);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        let cdecls = Cdecls::cast(parse.tree().root()).unwrap();

        let names: Vec<(Option<&str>, bool)> = cdecls
            .q_name_list()
            .map(|q| (q.name(), q.is_qualified()))
            .collect();
        assert_eq!(
            names,
            [
                (Some("M.lookup"), true),
                (Some("+"), false),
                (Some("M.!"), true),
                (Some("x"), false),
            ]
        );
        let paren = cdecls.q_name_list().nth(1).unwrap().paren_operator().unwrap();
        assert_eq!(paren.symbol(), Some("+"));

        let literals: Vec<Option<String>> = cdecls.text_literal_list().map(|t| t.value()).collect();
        assert_eq!(literals, [Some("a\tbA1".to_string()), Some("c".to_string())]);

        let keywords: Vec<Option<TokenKind>> =
            cdecls.reserved_id_list().map(|r| r.keyword()).collect();
        assert_eq!(keywords, [Some(T![_])]);
        assert_eq!(cdecls.dot_dot_list().count(), 1);
    }

    #[test]
    fn unescape_rejects_unknown_escapes() {
        assert_eq!(unescape(r"\x41\o101\&"), Some("AA".to_string()));
        assert_eq!(unescape(r"\q"), None);
        assert_eq!(unescape("\\"), None);
        assert_eq!(unescape(r"\x"), None);
    }

    #[test]
    fn unescape_ascii_and_gaps() {
        assert_eq!(unescape(r"\SOH\SO\DEL\NUL"), Some("\u{1}\u{e}\u{7f}\0".to_string()));
        assert_eq!(unescape(r"\^A\^@\^["), Some("\u{1}\0\u{1b}".to_string()));
        assert_eq!(unescape(r"\^a"), None);
        assert_eq!(unescape("ab\\\n   \\cd"), Some("abcd".to_string()));
        assert_eq!(unescape("ab\\  cd"), None);
    }
}
