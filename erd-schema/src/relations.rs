//! Relation resolution.
//!
//! Pairs up relation fields across models, classifies each relation as
//! one-to-one, one-to-many, or many-to-many, and extracts foreign-key facts
//! for the one-sided cases. Metadata holds model and field names only, never
//! references into the AST, so it can outlive schema mutation.
//!
//! Resolution assumes a structurally valid schema: the pipeline only invokes
//! it when no errors were reported by earlier stages.

use serde::{Serialize, Serializer};
use smol_str::SmolStr;

use crate::ast::{Field, Model, ReferentialAction, Schema};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

/// Cardinality of a resolved relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationType {
    /// The compact form used in rendered output and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "M:N",
        }
    }
}

impl Serialize for RelationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One endpoint of a relation: a relation field on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEnd {
    pub model: SmolStr,
    pub field: SmolStr,
}

impl RelationEnd {
    fn new(model: impl Into<SmolStr>, field: impl Into<SmolStr>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for RelationEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.model, self.field)
    }
}

/// Foreign-key facts extracted from the owning side's `@relation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// Scalar columns on the owning model.
    pub fields: Vec<SmolStr>,
    /// Referenced columns on the target model.
    pub references: Vec<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

/// A fully resolved relation between two models.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationMetadata {
    /// Stable identifier, identical across reparses of the same source.
    pub id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// The owning side (holds the foreign key for 1:1 and 1:N).
    pub from: RelationEnd,
    pub to: RelationEnd,
    /// Explicit relation name, for disambiguated relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    pub is_self_relation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

impl RelationMetadata {
    /// The implicit join-table name for a many-to-many relation.
    pub fn join_table_name(&self) -> Option<String> {
        match self.relation_type {
            RelationType::ManyToMany => Some(join_table_name(&self.from.model, &self.to.model)),
            _ => None,
        }
    }
}

/// The implicit join-table name for a pair of models.
pub fn join_table_name(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("_{first}_to_{second}")
}

/// A deterministic relation id built from both endpoints.
fn relation_id(a: &RelationEnd, b: &RelationEnd) -> String {
    let (a, b) = (a.to_string(), b.to_string());
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{first}:{second}")
}

/// Resolve all relations in `schema`, reporting problems into `diagnostics`.
///
/// Relations are returned in the declaration order of their owning field, so
/// output is reproducible across runs.
pub fn resolve_relations(schema: &Schema, diagnostics: &mut ErrorCollection) -> Vec<RelationMetadata> {
    Resolver {
        schema,
        diagnostics,
    }
    .resolve()
}

/// A relation field, located by names rather than references.
#[derive(Debug, Clone)]
struct EndRef<'a> {
    model: &'a Model,
    field: &'a Field,
    target: &'a str,
}

impl EndRef<'_> {
    fn key(&self) -> (SmolStr, SmolStr) {
        (self.model.name.name.clone(), self.field.name.name.clone())
    }

    fn relation_name(&self) -> Option<&str> {
        self.field.relation().and_then(|r| r.name.as_deref())
    }

    fn end(&self) -> RelationEnd {
        RelationEnd::new(self.model.name.name.clone(), self.field.name.name.clone())
    }
}

struct Resolver<'a, 'd> {
    schema: &'a Schema,
    diagnostics: &'d mut ErrorCollection,
}

impl Resolver<'_, '_> {
    fn resolve(mut self) -> Vec<RelationMetadata> {
        let ends: Vec<EndRef<'_>> = self
            .schema
            .models
            .iter()
            .flat_map(|model| {
                model.relation_fields().map(move |field| EndRef {
                    model,
                    field,
                    target: field.field_type.type_name(),
                })
            })
            .collect();

        let mut paired: Vec<(SmolStr, SmolStr)> = vec![];
        let mut unnamed_pairs_seen: Vec<(SmolStr, SmolStr)> = vec![];
        let mut relations = vec![];

        for (i, end) in ends.iter().enumerate() {
            if paired.contains(&end.key()) {
                continue;
            }

            let Some(partner) = self.find_partner(&ends, i, &paired) else {
                self.diagnostics.push(
                    Diagnostic::new(
                        ErrorCode::E5004,
                        format!(
                            "Relation field `{}` has no back-relation field on `{}`",
                            end.end(),
                            end.target
                        ),
                        end.field.location,
                    )
                    .with_suggestion(format!(
                        "Add a field of type `{}` to model `{}`",
                        end.model.name(),
                        end.target
                    )),
                );
                paired.push(end.key());
                continue;
            };

            paired.push(end.key());
            paired.push(partner.key());

            // Multiple unnamed relations between the same model pair are
            // ambiguous; the first one resolves, the rest are reported.
            if end.relation_name().is_none() {
                let mut pair_key = (end.model.name.name.clone(), partner.model.name.name.clone());
                if pair_key.1 < pair_key.0 {
                    pair_key = (pair_key.1, pair_key.0);
                }
                if unnamed_pairs_seen.contains(&pair_key) {
                    self.diagnostics.push(
                        Diagnostic::new(
                            ErrorCode::E5003,
                            format!(
                                "Ambiguous relation between `{}` and `{}`",
                                pair_key.0, pair_key.1
                            ),
                            end.field.location,
                        )
                        .with_suggestion(
                            "Name each relation: @relation(\"RelationName\", ...)",
                        ),
                    );
                    continue;
                }
                unnamed_pairs_seen.push(pair_key);
            }

            if let Some(relation) = self.classify(end, &partner) {
                relations.push(relation);
            }
        }

        relations
    }

    /// The back-relation field for `ends[i]`: an unpaired field on the target
    /// model pointing back, with a matching relation name.
    fn find_partner<'a>(
        &self,
        ends: &[EndRef<'a>],
        i: usize,
        paired: &[(SmolStr, SmolStr)],
    ) -> Option<EndRef<'a>> {
        let end = &ends[i];
        ends.iter()
            .enumerate()
            .filter(|&(j, candidate)| {
                j != i
                    && !paired.contains(&candidate.key())
                    && candidate.model.name() == end.target
                    && candidate.target == end.model.name()
                    && candidate.relation_name() == end.relation_name()
            })
            .map(|(_, candidate)| candidate.clone())
            .next()
    }

    fn classify(&mut self, a: &EndRef<'_>, b: &EndRef<'_>) -> Option<RelationMetadata> {
        let is_self = a.model.name() == b.model.name();
        let name = a
            .relation_name()
            .or_else(|| b.relation_name())
            .map(SmolStr::new);

        match (a.field.is_list(), b.field.is_list()) {
            (true, true) => self.many_to_many(a, b, name, is_self),
            (false, true) => self.one_to_many(a, b, name, is_self),
            (true, false) => self.one_to_many(b, a, name, is_self),
            (false, false) => self.one_to_one(a, b, name, is_self),
        }
    }

    fn many_to_many(
        &mut self,
        a: &EndRef<'_>,
        b: &EndRef<'_>,
        name: Option<SmolStr>,
        is_self: bool,
    ) -> Option<RelationMetadata> {
        for end in [a, b] {
            if end.field.relation().is_some_and(|r| !r.fields.is_empty()) {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::E5008,
                    format!(
                        "Many-to-many relation field `{}` cannot declare foreign-key fields",
                        end.end()
                    ),
                    end.field.location,
                ));
                return None;
            }
        }

        // Deterministic endpoint order for implicit M:N relations.
        let (from, to) = if a.end().to_string() <= b.end().to_string() {
            (a.end(), b.end())
        } else {
            (b.end(), a.end())
        };
        Some(RelationMetadata {
            id: relation_id(&from, &to),
            relation_type: RelationType::ManyToMany,
            from,
            to,
            name,
            is_self_relation: is_self,
            foreign_key: None,
        })
    }

    /// `owner` is the non-list side holding the foreign key.
    fn one_to_many(
        &mut self,
        owner: &EndRef<'_>,
        other: &EndRef<'_>,
        name: Option<SmolStr>,
        is_self: bool,
    ) -> Option<RelationMetadata> {
        let foreign_key = self.foreign_key(owner)?;
        self.check_self_owner(owner, is_self);

        let (from, to) = (owner.end(), other.end());
        Some(RelationMetadata {
            id: relation_id(&from, &to),
            relation_type: RelationType::OneToMany,
            from,
            to,
            name,
            is_self_relation: is_self,
            foreign_key: Some(foreign_key),
        })
    }

    fn one_to_one(
        &mut self,
        a: &EndRef<'_>,
        b: &EndRef<'_>,
        name: Option<SmolStr>,
        is_self: bool,
    ) -> Option<RelationMetadata> {
        let a_specified = a.field.relation().is_some_and(|r| r.is_fully_specified());
        let b_specified = b.field.relation().is_some_and(|r| r.is_fully_specified());

        if a_specified && b_specified {
            self.diagnostics.push(Diagnostic::new(
                ErrorCode::E4006,
                format!(
                    "Only one side of the one-to-one relation between `{}` and `{}` may declare `fields` and `references`",
                    a.model.name(),
                    b.model.name()
                ),
                b.field.location,
            ));
            return None;
        }

        let (owner, other) = if b_specified { (b, a) } else { (a, b) };
        let foreign_key = self.foreign_key(owner)?;
        self.check_self_owner(owner, is_self);

        let (from, to) = (owner.end(), other.end());
        Some(RelationMetadata {
            id: relation_id(&from, &to),
            relation_type: RelationType::OneToOne,
            from,
            to,
            name,
            is_self_relation: is_self,
            foreign_key: Some(foreign_key),
        })
    }

    /// The owning side of a self-relation must be optional, otherwise a row
    /// could never be inserted.
    fn check_self_owner(&mut self, owner: &EndRef<'_>, is_self: bool) {
        if is_self && !owner.field.is_optional() && !owner.field.is_list() {
            self.diagnostics.push(Diagnostic::new(
                ErrorCode::E5007,
                format!(
                    "Self-relation field `{}` must be optional or a list",
                    owner.end()
                ),
                owner.field.location,
            ));
        }
    }

    /// Extract and check the foreign key from the owning side.
    fn foreign_key(&mut self, owner: &EndRef<'_>) -> Option<ForeignKey> {
        let Some(relation) = owner.field.relation().filter(|r| r.is_fully_specified()) else {
            self.diagnostics.push(
                Diagnostic::new(
                    ErrorCode::E4003,
                    format!(
                        "Relation field `{}` must declare `fields` and `references` in `@relation`",
                        owner.end()
                    ),
                    owner.field.location,
                )
                .with_suggestion(format!(
                    "Example: @relation(fields: [{}Id], references: [id])",
                    owner.field.name()
                )),
            );
            return None;
        };

        let mut valid = true;
        for field_name in &relation.fields {
            match owner.model.get_field(field_name) {
                Some(f) if f.field_type.is_scalar() || f.field_type.is_enum() => {}
                Some(_) => {
                    self.diagnostics.push(Diagnostic::new(
                        ErrorCode::E5005,
                        format!(
                            "`@relation` fields entry `{}` on `{}` must be a scalar field",
                            field_name,
                            owner.model.name()
                        ),
                        owner.field.location,
                    ));
                    valid = false;
                }
                None => {
                    self.diagnostics.push(Diagnostic::new(
                        ErrorCode::E5005,
                        format!(
                            "`@relation` fields entry `{}` does not exist on `{}`",
                            field_name,
                            owner.model.name()
                        ),
                        owner.field.location,
                    ));
                    valid = false;
                }
            }
        }

        let target = self.schema.get_model(owner.target);
        for reference in &relation.references {
            if target.is_some_and(|t| t.get_field(reference).is_none()) {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::E5006,
                    format!(
                        "`@relation` references entry `{}` does not exist on `{}`",
                        reference, owner.target
                    ),
                    owner.field.location,
                ));
                valid = false;
            }
        }

        if !valid {
            return None;
        }
        Some(ForeignKey {
            fields: relation.fields.clone(),
            references: relation.references.clone(),
            on_delete: relation.on_delete,
            on_update: relation.on_update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_schema;
    use crate::parser;
    use crate::scanner::Lexer;
    use pretty_assertions::assert_eq;

    fn resolve(source: &str) -> (Vec<RelationMetadata>, ErrorCollection) {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        let tree = parser::parse_tree(tokens, &mut diagnostics);
        let mut schema = build_schema(&tree, &mut diagnostics);
        crate::validator::run(&mut schema, None, &mut diagnostics);
        let relations = resolve_relations(&schema, &mut diagnostics);
        (relations, diagnostics)
    }

    const BLOG: &str = "model User {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n}";

    // ==================== Classification ====================

    #[test]
    fn test_resolve_one_to_many() {
        let (relations, diagnostics) = resolve(BLOG);
        assert!(!diagnostics.has_errors());
        assert_eq!(relations.len(), 1);
        let r = &relations[0];
        assert_eq!(r.relation_type, RelationType::OneToMany);
        assert_eq!(r.from.to_string(), "Post.author");
        assert_eq!(r.to.to_string(), "User.posts");
        assert!(!r.is_self_relation);
        let fk = r.foreign_key.as_ref().unwrap();
        assert_eq!(fk.fields, vec![SmolStr::new("authorId")]);
        assert_eq!(fk.references, vec![SmolStr::new("id")]);
    }

    #[test]
    fn test_resolve_one_to_one() {
        let (relations, diagnostics) = resolve(
            "model User {\n  id Int @id\n  profile Profile?\n}\nmodel Profile {\n  id Int @id\n  user User @relation(fields: [userId], references: [id])\n  userId Int @unique\n}",
        );
        assert!(!diagnostics.has_errors());
        assert_eq!(relations[0].relation_type, RelationType::OneToOne);
        assert_eq!(relations[0].from.to_string(), "Profile.user");
    }

    #[test]
    fn test_resolve_many_to_many() {
        let (relations, diagnostics) = resolve(
            "model Post {\n  id Int @id\n  tags Tag[]\n}\nmodel Tag {\n  id Int @id\n  posts Post[]\n}",
        );
        assert!(!diagnostics.has_errors());
        let r = &relations[0];
        assert_eq!(r.relation_type, RelationType::ManyToMany);
        assert!(r.foreign_key.is_none());
        assert_eq!(r.join_table_name().unwrap(), "_Post_to_Tag");
    }

    #[test]
    fn test_resolve_self_relation() {
        let (relations, diagnostics) = resolve(
            "model Category {\n  id Int @id\n  parent Category? @relation(\"Tree\", fields: [parentId], references: [id])\n  parentId Int?\n  children Category[] @relation(\"Tree\")\n}",
        );
        assert!(!diagnostics.has_errors());
        let r = &relations[0];
        assert!(r.is_self_relation);
        assert_eq!(r.relation_type, RelationType::OneToMany);
        assert_eq!(r.name.as_deref(), Some("Tree"));
    }

    #[test]
    fn test_resolve_ids_are_stable() {
        let (first, _) = resolve(BLOG);
        let (second, _) = resolve(BLOG);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].id, "Post.author:User.posts");
    }

    // ==================== Relation Errors ====================

    #[test]
    fn test_resolve_missing_back_relation() {
        let (relations, diagnostics) = resolve(
            "model User {\n  id Int @id\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5004), 1);
        assert!(relations.is_empty());
    }

    #[test]
    fn test_resolve_ambiguous_unnamed_relations() {
        let (relations, diagnostics) = resolve(
            "model User {\n  id Int @id\n  written Post[]\n  reviewed Post[]\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n  reviewer User @relation(fields: [reviewerId], references: [id])\n  reviewerId Int\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5003), 1);
        assert_eq!(relations.len(), 1);
    }

    #[test]
    fn test_resolve_named_relations_disambiguate() {
        let (relations, diagnostics) = resolve(
            "model User {\n  id Int @id\n  written Post[] @relation(\"Wrote\")\n  reviewed Post[] @relation(\"Reviewed\")\n}\nmodel Post {\n  id Int @id\n  author User @relation(\"Wrote\", fields: [authorId], references: [id])\n  authorId Int\n  reviewer User @relation(\"Reviewed\", fields: [reviewerId], references: [id])\n  reviewerId Int\n}",
        );
        assert!(!diagnostics.has_errors());
        assert_eq!(relations.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_fk_field() {
        let (_, diagnostics) = resolve(
            "model User {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [nope], references: [id])\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5005), 1);
    }

    #[test]
    fn test_resolve_unknown_reference() {
        let (_, diagnostics) = resolve(
            "model User {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [authorId], references: [missing])\n  authorId Int\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5006), 1);
    }

    #[test]
    fn test_resolve_missing_fk_specification() {
        let (relations, diagnostics) = resolve(
            "model User {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author User\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E4003), 1);
        assert!(relations.is_empty());
    }

    #[test]
    fn test_resolve_required_self_relation_rejected() {
        let (_, diagnostics) = resolve(
            "model Node {\n  id Int @id\n  next Node @relation(\"Chain\", fields: [nextId], references: [id])\n  nextId Int\n  prev Node? @relation(\"Chain\")\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5007), 1);
    }

    #[test]
    fn test_resolve_m2m_with_fk_fields_rejected() {
        let (relations, diagnostics) = resolve(
            "model Post {\n  id Int @id\n  tags Tag[] @relation(fields: [tagIds], references: [id])\n  tagIds Int\n}\nmodel Tag {\n  id Int @id\n  posts Post[]\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E5008), 1);
        assert!(relations.is_empty());
    }

    // ==================== Helpers ====================

    #[test]
    fn test_join_table_name_sorted() {
        assert_eq!(join_table_name("Tag", "Post"), "_Post_to_Tag");
        assert_eq!(join_table_name("Post", "Tag"), "_Post_to_Tag");
    }

    #[test]
    fn test_relation_type_json() {
        assert_eq!(
            serde_json::to_value(RelationType::ManyToMany).unwrap(),
            serde_json::json!("M:N")
        );
    }
}
