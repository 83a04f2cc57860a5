use crate::T;
use crate::grammar::{Element, GrammarBuilder, GrammarRule, kw, node, tok};
use crate::syntax_kind::SyntaxKind::*;
use crate::token_kind::TokenKind;

// Expr-atom ::= QName | ReservedId | TextLiteral | DotDot | DoNotation | LetAbstraction
//             | ParenExpression | ListExpression | Cdecls | INTEGER | FLOAT | VARSYM | CONSYM
//             | '=' | '|' | '->' | '<-' | '\' | '@' | '~' | '`' | '::' | '=>' | ','
fn expr_atoms() -> Vec<Element> {
    vec![
        node(QName),
        node(ReservedId),
        node(TextLiteral),
        node(DotDot),
        node(DoNotation),
        node(LetAbstraction),
        node(ParenExpression),
        node(ListExpression),
        node(Cdecls),
        tok(TokenKind::Integer),
        tok(TokenKind::Float),
        tok(TokenKind::VarSym),
        tok(TokenKind::ConSym),
        tok(T![=]),
        tok(T![|]),
        tok(T![->]),
        tok(T![<-]),
        tok(T!['\\']),
        tok(T![@]),
        tok(T![~]),
        tok(T!['`']),
        tok(T![::]),
        tok(T![=>]),
        tok(T![,]),
    ]
}

fn with_expr_atoms(elements: impl IntoIterator<Item = Element>) -> Vec<Element> {
    let mut elements: Vec<Element> = elements.into_iter().collect();
    elements.extend(expr_atoms());
    elements
}

pub(crate) fn builder() -> GrammarBuilder {
    let mut g = GrammarBuilder::new();
    module(&mut g);
    imports(&mut g);
    declarations(&mut g);
    types(&mut g);
    expressions(&mut g);
    g
}

fn module(g: &mut GrammarBuilder) {
    // Module ::= Pragma* ModuleDeclaration? Body
    g.register(
        Module,
        GrammarRule::new()
            .many([node(Pragma)])
            .opt([node(ModuleDeclaration)])
            .seq([node(Body)]),
    );
    // ModuleDeclaration ::= 'module' QName ExportList? 'where'
    g.register(
        ModuleDeclaration,
        GrammarRule::new()
            .seq([tok(T![module]), node(QName)])
            .opt([node(ExportList)])
            .seq([tok(T![where])]),
    );
    // ExportList ::= '(' Export (',' Export)* ')'
    g.register(
        ExportList,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .many_sep(node(Export), T![,])
            .seq([tok(T![')'])]),
    );
    // Export ::= 'module'? QName ImportCnames?
    g.register(
        Export,
        GrammarRule::new()
            .opt([tok(T![module])])
            .seq([node(QName)])
            .opt([node(ImportCnames)]),
    );
    // Body ::= '{' (ImportDeclaration | ClassDeclaration | TopDecl | Expr-atom | ';')* '}'
    g.register(
        Body,
        GrammarRule::new()
            .seq([tok(T!['{'])])
            .many(with_expr_atoms([
                node(Pragma),
                node(ImportDeclaration),
                node(ClassDeclaration),
                node(InstanceDeclaration),
                node(DataDeclaration),
                node(NewtypeDeclaration),
                node(TypeDeclaration),
                node(TypeFamilyDeclaration),
                node(DefaultDeclaration),
                node(FixityDeclaration),
                node(TypeSignature),
                tok(T![;]),
            ]))
            .seq([tok(T!['}'])]),
    );
}

fn imports(g: &mut GrammarBuilder) {
    // ImportDeclaration ::= 'import' «qualified»? QName ImportQualifiedAs? ImportSpec?
    g.register(
        ImportDeclaration,
        GrammarRule::new()
            .seq([tok(T![import])])
            .opt([kw("qualified")])
            .seq([node(QName)])
            .opt([node(ImportQualifiedAs)])
            .opt([node(ImportSpec)]),
    );
    // ImportQualifiedAs ::= «as» QName
    g.register(
        ImportQualifiedAs,
        GrammarRule::new().seq([kw("as"), node(QName)]),
    );
    // ImportSpec ::= ImportEmptySpec | ImportIdsSpec | ImportHidingSpec
    g.register(
        ImportSpec,
        GrammarRule::new().choice([
            node(ImportEmptySpec),
            node(ImportIdsSpec),
            node(ImportHidingSpec),
        ]),
    );
    // ImportEmptySpec ::= '(' ')'
    g.register(
        ImportEmptySpec,
        GrammarRule::new().seq([tok(T!['(']), tok(T![')'])]),
    );
    // ImportIdsSpec ::= '(' ImportId (',' ImportId)* ')'
    g.register(
        ImportIdsSpec,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .many1_sep(node(ImportId), T![,])
            .seq([tok(T![')'])]),
    );
    // ImportHidingSpec ::= «hiding» (ImportEmptySpec | ImportIdsSpec)
    g.register(
        ImportHidingSpec,
        GrammarRule::new()
            .seq([kw("hiding")])
            .choice([node(ImportEmptySpec), node(ImportIdsSpec)]),
    );
    // ImportId ::= 'type'? QName ImportCnames?
    g.register(
        ImportId,
        GrammarRule::new()
            .opt([tok(T![type])])
            .seq([node(QName)])
            .opt([node(ImportCnames)]),
    );
    // ImportCnames ::= '(' (DotDot | QName | ',')* ')'
    g.register(
        ImportCnames,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .many([node(DotDot), node(QName), tok(T![,])])
            .seq([tok(T![')'])]),
    );
}

fn declarations(g: &mut GrammarBuilder) {
    // ClassDeclaration ::= 'class' Ttype ('where' Cdecls)?
    g.register(
        ClassDeclaration,
        GrammarRule::new()
            .seq([tok(T![class]), node(Ttype)])
            .opt([tok(T![where]), node(Cdecls)]),
    );
    // InstanceDeclaration ::= 'instance' Ttype ('where' Cdecls)?
    g.register(
        InstanceDeclaration,
        GrammarRule::new()
            .seq([tok(T![instance]), node(Ttype)])
            .opt([tok(T![where]), node(Cdecls)]),
    );
    // Cdecls ::= '{' (Pragma | TypeSignature | ... | Expr-atom | ';')* '}'
    //
    // Associated data declarations come before plain ones so that `data family T a`
    // stays a CdeclDataDeclaration when both match the same tokens.
    g.register(
        Cdecls,
        GrammarRule::new()
            .seq([tok(T!['{'])])
            .many(with_expr_atoms([
                node(Pragma),
                node(TypeSignature),
                node(FixityDeclaration),
                node(CdeclDataDeclaration),
                node(DataDeclaration),
                node(DefaultDeclaration),
                node(InstanceDeclaration),
                node(NewtypeDeclaration),
                node(TypeDeclaration),
                node(TypeFamilyDeclaration),
                tok(T![;]),
            ]))
            .seq([tok(T!['}'])]),
    );
    // DataDeclaration ::= 'data' SimpleType KindSignature? Constructors? Deriving*
    g.register(
        DataDeclaration,
        GrammarRule::new()
            .seq([tok(T![data]), node(SimpleType)])
            .opt([node(KindSignature)])
            .opt([node(Constructors)])
            .many([node(Deriving)]),
    );
    // CdeclDataDeclaration ::= 'data' «family»? SimpleType KindSignature?
    g.register(
        CdeclDataDeclaration,
        GrammarRule::new()
            .seq([tok(T![data])])
            .opt([kw("family")])
            .seq([node(SimpleType)])
            .opt([node(KindSignature)]),
    );
    // NewtypeDeclaration ::= 'newtype' SimpleType '=' Constructor Deriving*
    g.register(
        NewtypeDeclaration,
        GrammarRule::new()
            .seq([
                tok(T![newtype]),
                node(SimpleType),
                tok(T![=]),
                node(Constructor),
            ])
            .many([node(Deriving)]),
    );
    // TypeDeclaration ::= 'type' SimpleType '=' Ttype
    g.register(
        TypeDeclaration,
        GrammarRule::new().seq([tok(T![type]), node(SimpleType), tok(T![=]), node(Ttype)]),
    );
    // TypeFamilyDeclaration ::= 'type' «family»? SimpleType KindSignature?
    g.register(
        TypeFamilyDeclaration,
        GrammarRule::new()
            .seq([tok(T![type])])
            .opt([kw("family")])
            .seq([node(SimpleType)])
            .opt([node(KindSignature)]),
    );
    // DefaultDeclaration ::= 'default' ParenType
    g.register(
        DefaultDeclaration,
        GrammarRule::new().seq([tok(T![default]), node(ParenType)]),
    );
    // FixityDeclaration ::= ('infix' | 'infixl' | 'infixr') INTEGER? Operator (',' Operator)*
    g.register(
        FixityDeclaration,
        GrammarRule::new()
            .choice([tok(T![infix]), tok(T![infixl]), tok(T![infixr])])
            .opt([tok(TokenKind::Integer)])
            .many1_sep(node(Operator), T![,]),
    );
    // TypeSignature ::= QName (',' QName)* '::' Ttype
    g.register(
        TypeSignature,
        GrammarRule::new()
            .many1_sep(node(QName), T![,])
            .seq([tok(T![::]), node(Ttype)]),
    );
    // Constructors ::= '=' Constructor ('|' Constructor)*
    g.register(
        Constructors,
        GrammarRule::new()
            .seq([tok(T![=])])
            .many1_sep(node(Constructor), T![|]),
    );
    // Constructor ::= (QName | ParenType | ListType | RecordFields | VARSYM | CONSYM)+
    g.register(
        Constructor,
        GrammarRule::new().many1([
            node(QName),
            node(ParenType),
            node(ListType),
            node(RecordFields),
            tok(TokenKind::VarSym),
            tok(TokenKind::ConSym),
        ]),
    );
    // RecordFields ::= '{' FieldDeclaration (',' FieldDeclaration)* '}'
    g.register(
        RecordFields,
        GrammarRule::new()
            .seq([tok(T!['{'])])
            .many_sep(node(FieldDeclaration), T![,])
            .seq([tok(T!['}'])]),
    );
    // FieldDeclaration ::= QName (',' QName)* '::' Ttype
    g.register(
        FieldDeclaration,
        GrammarRule::new()
            .many1_sep(node(QName), T![,])
            .seq([tok(T![::]), node(Ttype)]),
    );
    // Deriving ::= 'deriving' (QName | ParenType)
    g.register(
        Deriving,
        GrammarRule::new()
            .seq([tok(T![deriving])])
            .choice([node(QName), node(ParenType)]),
    );
}

fn types(g: &mut GrammarBuilder) {
    // SimpleType ::= QName (QName | ParenType)*
    g.register(
        SimpleType,
        GrammarRule::new()
            .seq([node(QName)])
            .many([node(QName), node(ParenType)]),
    );
    // KindSignature ::= '::' Ttype
    g.register(
        KindSignature,
        GrammarRule::new().seq([tok(T![::]), node(Ttype)]),
    );
    // Ttype ::= (QName | ParenType | ListType | TextLiteral
    //           | '->' | '=>' | '~' | VARSYM | CONSYM | INTEGER)+
    g.register(
        Ttype,
        GrammarRule::new().many1([
            node(QName),
            node(ParenType),
            node(ListType),
            node(TextLiteral),
            tok(T![->]),
            tok(T![=>]),
            tok(T![~]),
            tok(TokenKind::VarSym),
            tok(TokenKind::ConSym),
            tok(TokenKind::Integer),
        ]),
    );
    // ParenType ::= '(' (Ttype | ',' | '::')* ')'
    g.register(
        ParenType,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .many([node(Ttype), tok(T![,]), tok(T![::])])
            .seq([tok(T![')'])]),
    );
    // ListType ::= '[' (Ttype | ',')* ']'
    g.register(
        ListType,
        GrammarRule::new()
            .seq([tok(T!['['])])
            .many([node(Ttype), tok(T![,])])
            .seq([tok(T![']'])]),
    );
}

fn expressions(g: &mut GrammarBuilder) {
    // DoNotation ::= 'do' '{' (Expr-atom | ';')* '}'
    g.register(
        DoNotation,
        GrammarRule::new()
            .seq([tok(T![do]), tok(T!['{'])])
            .many(with_expr_atoms([tok(T![;])]))
            .seq([tok(T!['}'])]),
    );
    // LetAbstraction ::= 'let' Cdecls
    g.register(
        LetAbstraction,
        GrammarRule::new().seq([tok(T![let]), node(Cdecls)]),
    );
    // ParenExpression ::= '(' Expr-atom* ')'
    g.register(
        ParenExpression,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .many(expr_atoms())
            .seq([tok(T![')'])]),
    );
    // ListExpression ::= '[' Expr-atom* ']'
    g.register(
        ListExpression,
        GrammarRule::new()
            .seq([tok(T!['['])])
            .many(expr_atoms())
            .seq([tok(T![']'])]),
    );
    // Operator ::= VARSYM | CONSYM
    g.register(
        Operator,
        GrammarRule::new().choice([tok(TokenKind::VarSym), tok(TokenKind::ConSym)]),
    );
    // ParenOperator ::= '(' (VARSYM | CONSYM) ')'
    g.register(
        ParenOperator,
        GrammarRule::new()
            .seq([tok(T!['('])])
            .choice([tok(TokenKind::VarSym), tok(TokenKind::ConSym)])
            .seq([tok(T![')'])]),
    );
    // QName ::= VARID | CONID | QVARID | QCONID | ParenOperator
    g.register(
        QName,
        GrammarRule::new().choice([
            tok(TokenKind::VarId),
            tok(TokenKind::ConId),
            tok(TokenKind::QVarId),
            tok(TokenKind::QConId),
            node(ParenOperator),
        ]),
    );
    // ReservedId ::= any reserved word or '_'
    g.register(
        ReservedId,
        GrammarRule::new().choice(
            TokenKind::ALL
                .into_iter()
                .filter(|kind| kind.is_reserved_id())
                .map(tok),
        ),
    );
    // TextLiteral ::= STRING | CHAR
    g.register(
        TextLiteral,
        GrammarRule::new().choice([tok(TokenKind::String), tok(TokenKind::Char)]),
    );
    // DotDot ::= '..'
    g.register(DotDot, GrammarRule::new().seq([tok(T![..])]));
    // Pragma ::= PRAGMA
    g.register(Pragma, GrammarRule::new().seq([tok(TokenKind::Pragma)]));
}
