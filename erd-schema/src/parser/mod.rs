//! Recursive-descent parser producing an untyped block tree.
//!
//! The parser consumes the token stream from [`crate::scanner`] and builds a
//! [`SchemaTree`] of blocks, fields, properties, and attributes without
//! interpreting any of them; typing happens in [`crate::builder`]. Syntax
//! errors are reported into the shared [`ErrorCollection`] and recovery
//! resumes at the next member or block boundary, so one malformed line never
//! hides the rest of the schema.

use smol_str::SmolStr;

use crate::ast::{Ident, TypeModifier};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};
use crate::scanner::{Token, TokenKind};
use crate::span::SourceLocation;

/// The untyped parse result: every top-level block in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTree {
    pub blocks: Vec<Block>,
}

/// Which keyword introduced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Model,
    Enum,
    Datasource,
    Generator,
}

impl BlockKind {
    /// The keyword as written in schema text.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Enum => "enum",
            Self::Datasource => "datasource",
            Self::Generator => "generator",
        }
    }
}

/// One top-level block (`model X { ... }`, `datasource db { ... }`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub name: Ident,
    pub members: Vec<Member>,
    pub documentation: Option<String>,
    pub location: SourceLocation,
}

/// A single entry inside a block body.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// `key = value` (datasource/generator bodies).
    Property {
        key: Ident,
        value: ValueNode,
        location: SourceLocation,
    },
    /// `name Type? @attr(...)` (model bodies).
    Field {
        name: Ident,
        type_name: Ident,
        modifier: TypeModifier,
        attributes: Vec<AttributeNode>,
        documentation: Option<String>,
        location: SourceLocation,
    },
    /// `VALUE @map("...")` (enum bodies).
    EnumValue {
        name: Ident,
        attributes: Vec<AttributeNode>,
        documentation: Option<String>,
        location: SourceLocation,
    },
    /// `@@id([...])`, `@@map("...")`, ...
    BlockAttribute(AttributeNode),
}

/// An attribute occurrence, field-level (`@x`) or block-level (`@@x`).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNode {
    /// Attribute name, dotted for namespaced attributes (`db.VarChar`).
    pub name: Ident,
    pub args: Vec<ArgNode>,
    pub location: SourceLocation,
}

impl AttributeNode {
    /// The first positional (unnamed) argument, if any.
    pub fn first_positional(&self) -> Option<&ValueNode> {
        self.args
            .iter()
            .find(|a| a.name.is_none())
            .map(|a| &a.value)
    }

    /// A named argument by key.
    pub fn named(&self, key: &str) -> Option<&ValueNode> {
        self.args
            .iter()
            .find(|a| a.name.as_ref().is_some_and(|n| n.as_str() == key))
            .map(|a| &a.value)
    }
}

/// One attribute argument, optionally named (`fields: [authorId]`).
#[derive(Debug, Clone, PartialEq)]
pub struct ArgNode {
    pub name: Option<Ident>,
    pub value: ValueNode,
    pub location: SourceLocation,
}

/// An uninterpreted attribute or property value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Str(String),
    Int(i64),
    Float(f64),
    /// A bare identifier (enum value, `asc`, `Cascade`, ...).
    Constant(SmolStr),
    /// A call such as `now()`, `env("URL")`, or `authorId(sort: Desc)`.
    Function { name: Ident, args: Vec<ArgNode> },
    Array(Vec<ValueNode>),
}

impl ValueNode {
    /// The string payload, for `Str` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The constant name, for `Constant` values.
    pub fn as_constant(&self) -> Option<&str> {
        match self {
            Self::Constant(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Parse a token stream into a [`SchemaTree`].
pub fn parse_tree(tokens: Vec<Token>, diagnostics: &mut ErrorCollection) -> SchemaTree {
    Parser::new(tokens, diagnostics).parse()
}

struct Parser<'d> {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: &'d mut ErrorCollection,
}

impl<'d> Parser<'d> {
    fn new(tokens: Vec<Token>, diagnostics: &'d mut ErrorCollection) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream ends with Eof"))
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&mut self, expected: &str) {
        let token = self.peek().clone();
        let code = if token.kind == TokenKind::Eof {
            ErrorCode::E1002
        } else {
            ErrorCode::E1001
        };
        let found = token.kind.describe();
        self.diagnostics.push(Diagnostic::new(
            code,
            format!("Expected {expected}, found {found}"),
            token.location,
        ));
    }

    fn parse(mut self) -> SchemaTree {
        let mut tree = SchemaTree::default();
        let mut pending_doc: Option<String> = None;

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::DocComment(text) => {
                    append_doc(&mut pending_doc, text);
                    self.advance();
                }
                kind if kind.is_block_keyword() => {
                    let kind = match kind {
                        TokenKind::Model => BlockKind::Model,
                        TokenKind::Enum => BlockKind::Enum,
                        TokenKind::Datasource => BlockKind::Datasource,
                        _ => BlockKind::Generator,
                    };
                    self.advance();
                    if let Some(block) = self.parse_block(kind, token.location, pending_doc.take())
                    {
                        tree.blocks.push(block);
                    }
                }
                _ => {
                    self.unexpected("`model`, `enum`, `datasource`, or `generator`");
                    self.advance();
                    self.skip_to_block_keyword();
                    pending_doc = None;
                }
            }
        }
        tree
    }

    /// Skip forward to the next top-level block keyword (or end of input).
    fn skip_to_block_keyword(&mut self) {
        while !self.at_eof() && !self.peek().kind.is_block_keyword() {
            self.advance();
        }
    }

    fn parse_block(
        &mut self,
        kind: BlockKind,
        keyword_location: SourceLocation,
        documentation: Option<String>,
    ) -> Option<Block> {
        let name = match &self.peek().kind {
            TokenKind::Identifier(n) => {
                let ident = Ident::new(n.clone(), self.peek().location);
                self.advance();
                ident
            }
            _ => {
                self.unexpected(&format!("a name after `{}`", kind.keyword()));
                self.skip_to_block_keyword();
                return None;
            }
        };

        if !self.eat(&TokenKind::LeftBrace) {
            self.unexpected("`{`");
            self.skip_to_block_keyword();
            return None;
        }

        let mut members = vec![];
        let mut pending_doc: Option<String> = None;
        let mut closed = false;

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::RightBrace => {
                    self.advance();
                    closed = true;
                    break;
                }
                // A new block keyword before `}` means this block was never
                // closed. Leave the keyword for the caller so the next block
                // still parses.
                TokenKind::Eof => break,
                kind if kind.is_block_keyword() => break,
                TokenKind::DocComment(text) => {
                    append_doc(&mut pending_doc, text);
                    self.advance();
                }
                TokenKind::AtAt => {
                    self.advance();
                    if let Some(attr) = self.parse_attribute(token.location) {
                        members.push(Member::BlockAttribute(attr));
                    }
                    pending_doc = None;
                }
                TokenKind::Identifier(_) => {
                    if let Some(member) = self.parse_member(kind, pending_doc.take()) {
                        members.push(member);
                    }
                }
                _ => {
                    self.unexpected("a field, property, or `}`");
                    self.advance();
                    self.recover_member();
                    pending_doc = None;
                }
            }
        }

        if !closed {
            self.diagnostics.push(
                Diagnostic::new(
                    ErrorCode::E1005,
                    format!("Unclosed `{}` block `{}`", kind.keyword(), name.as_str()),
                    name.location,
                )
                .with_suggestion(format!("Add a closing `}}` to `{}`", name.as_str())),
            );
        }

        let end = members
            .last()
            .map(member_location)
            .unwrap_or(name.location);
        Some(Block {
            kind,
            name,
            members,
            documentation,
            location: keyword_location.merge(end),
        })
    }

    /// Skip forward to the next plausible member boundary inside a block.
    fn recover_member(&mut self) {
        loop {
            match &self.peek().kind {
                TokenKind::Eof
                | TokenKind::RightBrace
                | TokenKind::AtAt
                | TokenKind::Identifier(_)
                | TokenKind::DocComment(_) => break,
                kind if kind.is_block_keyword() => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_member(&mut self, kind: BlockKind, documentation: Option<String>) -> Option<Member> {
        let name_token = self.advance();
        let TokenKind::Identifier(name) = &name_token.kind else {
            unreachable!("caller checked for an identifier");
        };
        let name = Ident::new(name.clone(), name_token.location);

        match kind {
            BlockKind::Datasource | BlockKind::Generator => self.parse_property(name),
            BlockKind::Enum => self.parse_enum_value(name, documentation),
            BlockKind::Model => self.parse_field(name, documentation),
        }
    }

    fn parse_property(&mut self, key: Ident) -> Option<Member> {
        if !self.eat(&TokenKind::Equals) {
            self.unexpected(&format!("`=` after `{}`", key.as_str()));
            self.recover_member();
            return None;
        }
        let value = self.parse_value()?;
        let location = key.location;
        Some(Member::Property {
            key,
            value,
            location,
        })
    }

    fn parse_enum_value(&mut self, name: Ident, documentation: Option<String>) -> Option<Member> {
        let mut attributes = vec![];
        while self.peek().kind == TokenKind::At {
            let at = self.advance();
            if let Some(attr) = self.parse_attribute(at.location) {
                attributes.push(attr);
            }
        }
        let location = name.location;
        Some(Member::EnumValue {
            name,
            attributes,
            documentation,
            location,
        })
    }

    fn parse_field(&mut self, name: Ident, documentation: Option<String>) -> Option<Member> {
        let type_name = match &self.peek().kind {
            TokenKind::Identifier(t) => {
                let ident = Ident::new(t.clone(), self.peek().location);
                self.advance();
                ident
            }
            _ => {
                self.unexpected(&format!("a type for field `{}`", name.as_str()));
                self.recover_member();
                return None;
            }
        };

        let modifier = self.parse_modifier();

        let mut attributes = vec![];
        while self.peek().kind == TokenKind::At {
            let at = self.advance();
            if let Some(attr) = self.parse_attribute(at.location) {
                attributes.push(attr);
            }
        }

        let location = name.location.merge(
            attributes
                .last()
                .map(|a| a.location)
                .unwrap_or(type_name.location),
        );
        Some(Member::Field {
            name,
            type_name,
            modifier,
            attributes,
            documentation,
            location,
        })
    }

    fn parse_modifier(&mut self) -> TypeModifier {
        if self.eat(&TokenKind::LeftBracket) {
            if !self.eat(&TokenKind::RightBracket) {
                self.unexpected("`]`");
            }
            if self.eat(&TokenKind::Question) {
                TypeModifier::OptionalList
            } else {
                TypeModifier::List
            }
        } else if self.eat(&TokenKind::Question) {
            TypeModifier::Optional
        } else {
            TypeModifier::Required
        }
    }

    fn parse_attribute(&mut self, marker_location: SourceLocation) -> Option<AttributeNode> {
        let mut name = match &self.peek().kind {
            TokenKind::Identifier(n) => {
                let ident = Ident::new(n.clone(), self.peek().location);
                self.advance();
                ident
            }
            _ => {
                self.unexpected("an attribute name");
                return None;
            }
        };

        // Namespaced attributes: `@db.VarChar(255)`.
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            match &self.peek().kind {
                TokenKind::Identifier(part) => {
                    let part_loc = self.peek().location;
                    name = Ident::new(
                        SmolStr::new(format!("{}.{}", name.as_str(), part)),
                        name.location.merge(part_loc),
                    );
                    self.advance();
                }
                _ => {
                    self.unexpected("an identifier after `.`");
                    return None;
                }
            }
        }

        let mut args = vec![];
        let mut end = name.location;
        if self.eat(&TokenKind::LeftParen) {
            loop {
                match &self.peek().kind {
                    TokenKind::RightParen => {
                        end = self.peek().location;
                        self.advance();
                        break;
                    }
                    TokenKind::Eof => {
                        self.unexpected("`)`");
                        break;
                    }
                    _ => {
                        let Some(arg) = self.parse_arg() else {
                            self.recover_member();
                            break;
                        };
                        args.push(arg);
                        if !self.eat(&TokenKind::Comma)
                            && self.peek().kind != TokenKind::RightParen
                        {
                            self.unexpected("`,` or `)`");
                            self.recover_member();
                            break;
                        }
                    }
                }
            }
        }

        Some(AttributeNode {
            location: marker_location.merge(end),
            name,
            args,
        })
    }

    fn parse_arg(&mut self) -> Option<ArgNode> {
        let start = self.peek().location;

        // `key: value` when an identifier is followed by a colon.
        let name = match (&self.peek().kind, self.tokens.get(self.pos + 1)) {
            (TokenKind::Identifier(key), Some(next)) if next.kind == TokenKind::Colon => {
                let ident = Ident::new(key.clone(), self.peek().location);
                self.advance();
                self.advance();
                Some(ident)
            }
            _ => None,
        };

        let value = self.parse_value()?;
        Some(ArgNode {
            name,
            value,
            location: start,
        })
    }

    fn parse_value(&mut self) -> Option<ValueNode> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Some(ValueNode::Str(s.clone()))
            }
            TokenKind::IntLiteral(i) => {
                self.advance();
                Some(ValueNode::Int(*i))
            }
            TokenKind::FloatLiteral(f) => {
                self.advance();
                Some(ValueNode::Float(*f))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut items = vec![];
                loop {
                    match &self.peek().kind {
                        TokenKind::RightBracket => {
                            self.advance();
                            break;
                        }
                        TokenKind::Eof => {
                            self.unexpected("`]`");
                            return None;
                        }
                        _ => {
                            items.push(self.parse_value()?);
                            if !self.eat(&TokenKind::Comma)
                                && self.peek().kind != TokenKind::RightBracket
                            {
                                self.unexpected("`,` or `]`");
                                return None;
                            }
                        }
                    }
                }
                Some(ValueNode::Array(items))
            }
            TokenKind::Identifier(name) => {
                let ident = Ident::new(name.clone(), token.location);
                self.advance();
                if self.eat(&TokenKind::LeftParen) {
                    let mut args = vec![];
                    loop {
                        match &self.peek().kind {
                            TokenKind::RightParen => {
                                self.advance();
                                break;
                            }
                            TokenKind::Eof => {
                                self.unexpected("`)`");
                                return None;
                            }
                            _ => {
                                args.push(self.parse_arg()?);
                                if !self.eat(&TokenKind::Comma)
                                    && self.peek().kind != TokenKind::RightParen
                                {
                                    self.unexpected("`,` or `)`");
                                    return None;
                                }
                            }
                        }
                    }
                    Some(ValueNode::Function { name: ident, args })
                } else {
                    Some(ValueNode::Constant(ident.name.clone()))
                }
            }
            _ => {
                self.unexpected("a value");
                if !self.at_eof() {
                    self.advance();
                }
                None
            }
        }
    }
}

fn member_location(member: &Member) -> SourceLocation {
    match member {
        Member::Property { location, .. }
        | Member::Field { location, .. }
        | Member::EnumValue { location, .. } => *location,
        Member::BlockAttribute(attr) => attr.location,
    }
}

fn append_doc(pending: &mut Option<String>, text: &str) {
    match pending {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *pending = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (SchemaTree, ErrorCollection) {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        let tree = parse_tree(tokens, &mut diagnostics);
        (tree, diagnostics)
    }

    // ==================== Block Parsing ====================

    #[test]
    fn test_parse_empty_model() {
        let (tree, diagnostics) = parse("model User {}");
        assert!(diagnostics.is_empty());
        assert_eq!(tree.blocks.len(), 1);
        assert_eq!(tree.blocks[0].kind, BlockKind::Model);
        assert_eq!(tree.blocks[0].name.as_str(), "User");
    }

    #[test]
    fn test_parse_field_with_modifier_and_attributes() {
        let (tree, diagnostics) = parse("model User {\n  id Int @id @default(autoincrement())\n  tags String[]\n  bio String?\n}");
        assert!(diagnostics.is_empty());
        let Member::Field {
            name,
            type_name,
            modifier,
            attributes,
            ..
        } = &tree.blocks[0].members[0]
        else {
            panic!("expected a field");
        };
        assert_eq!(name.as_str(), "id");
        assert_eq!(type_name.as_str(), "Int");
        assert_eq!(*modifier, TypeModifier::Required);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].name.as_str(), "id");
        assert_eq!(attributes[1].name.as_str(), "default");
        assert!(matches!(
            attributes[1].args[0].value,
            ValueNode::Function { .. }
        ));

        let Member::Field { modifier, .. } = &tree.blocks[0].members[1] else {
            panic!("expected a field");
        };
        assert_eq!(*modifier, TypeModifier::List);
        let Member::Field { modifier, .. } = &tree.blocks[0].members[2] else {
            panic!("expected a field");
        };
        assert_eq!(*modifier, TypeModifier::Optional);
    }

    #[test]
    fn test_parse_block_attribute_with_named_args() {
        let (tree, diagnostics) =
            parse("model Post {\n  @@index([title], name: \"title_idx\")\n}");
        assert!(diagnostics.is_empty());
        let Member::BlockAttribute(attr) = &tree.blocks[0].members[0] else {
            panic!("expected a block attribute");
        };
        assert_eq!(attr.name.as_str(), "index");
        assert!(matches!(attr.args[0].value, ValueNode::Array(_)));
        assert_eq!(attr.named("name").and_then(ValueNode::as_str), Some("title_idx"));
    }

    #[test]
    fn test_parse_datasource_properties() {
        let (tree, diagnostics) = parse(
            "datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}",
        );
        assert!(diagnostics.is_empty());
        let block = &tree.blocks[0];
        assert_eq!(block.kind, BlockKind::Datasource);
        let Member::Property { key, value, .. } = &block.members[1] else {
            panic!("expected a property");
        };
        assert_eq!(key.as_str(), "url");
        let ValueNode::Function { name, args } = value else {
            panic!("expected env() call");
        };
        assert_eq!(name.as_str(), "env");
        assert_eq!(args[0].value.as_str(), Some("DATABASE_URL"));
    }

    #[test]
    fn test_parse_enum_values() {
        let (tree, diagnostics) =
            parse("enum Role {\n  USER\n  ADMIN @map(\"administrator\")\n}");
        assert!(diagnostics.is_empty());
        let Member::EnumValue { name, attributes, .. } = &tree.blocks[0].members[1] else {
            panic!("expected an enum value");
        };
        assert_eq!(name.as_str(), "ADMIN");
        assert_eq!(attributes[0].name.as_str(), "map");
    }

    #[test]
    fn test_parse_doc_comments_attach() {
        let (tree, _) = parse("/// A user.\n/// Second line.\nmodel User {\n  /// Primary key.\n  id Int @id\n}");
        let block = &tree.blocks[0];
        assert_eq!(block.documentation.as_deref(), Some("A user.\nSecond line."));
        let Member::Field { documentation, .. } = &block.members[0] else {
            panic!("expected a field");
        };
        assert_eq!(documentation.as_deref(), Some("Primary key."));
    }

    #[test]
    fn test_parse_namespaced_attribute() {
        let (tree, diagnostics) = parse("model User {\n  name String @db.VarChar(255)\n}");
        assert!(diagnostics.is_empty());
        let Member::Field { attributes, .. } = &tree.blocks[0].members[0] else {
            panic!("expected a field");
        };
        assert_eq!(attributes[0].name.as_str(), "db.VarChar");
        assert_eq!(attributes[0].args[0].value, ValueNode::Int(255));
    }

    // ==================== Error Recovery ====================

    #[test]
    fn test_parse_unclosed_block_recovers_sibling() {
        let (tree, diagnostics) = parse("model User {\n  id Int\nmodel Post {\n  id Int\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E1005), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.location.line, 1);
        assert_eq!(d.location.column, 7);
        // Both blocks survive.
        assert_eq!(tree.blocks.len(), 2);
        assert_eq!(tree.blocks[1].name.as_str(), "Post");
        assert_eq!(tree.blocks[1].members.len(), 1);
    }

    #[test]
    fn test_parse_garbage_between_blocks() {
        let (tree, diagnostics) = parse("model User { id Int }\n= = =\nmodel Post { id Int }");
        assert!(diagnostics.count_of(ErrorCode::E1001) >= 1);
        assert_eq!(tree.blocks.len(), 2);
    }

    #[test]
    fn test_parse_field_missing_type_recovers() {
        let (tree, diagnostics) = parse("model User {\n  id ?\n  email String\n}");
        assert!(diagnostics.has_errors());
        // The well-formed field still parses.
        let fields: Vec<_> = tree.blocks[0]
            .members
            .iter()
            .filter(|m| matches!(m, Member::Field { .. }))
            .collect();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_parse_eof_in_attribute_args() {
        let (_, diagnostics) = parse("model User {\n  id Int @default(");
        assert!(diagnostics.count_of(ErrorCode::E1002) >= 1);
    }

    #[test]
    fn test_parse_empty_source() {
        let (tree, diagnostics) = parse("");
        assert!(diagnostics.is_empty());
        assert!(tree.blocks.is_empty());
    }
}
