//! Structured diagnostics for schema parsing and validation.
//!
//! Every pipeline stage reports into a shared [`ErrorCollection`] instead of
//! aborting, so a single run can surface many problems at once. Each
//! [`Diagnostic`] carries a stable [`ErrorCode`], a severity, a message, and
//! an exact [`SourceLocation`]; two rendered views are provided, a terminal
//! string with a code frame and a JSON object for UI consumption.
//!
//! The code namespace is part of the public contract and is never renumbered:
//! `E1xxx` syntax, `E2xxx` model, `E3xxx` field, `E4xxx` attribute, `E5xxx`
//! relation, `E6xxx` enum, `E7xxx` version/provider, `Wxxx` warnings.

use serde::{Serialize, Serializer};

use crate::span::SourceLocation;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks downstream consumption of the schema graph.
    Error,
    /// Advisory; never blocks success.
    Warning,
    /// Informational note (e.g., a skipped stage).
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Category a diagnostic code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Model,
    Field,
    Attribute,
    Relation,
    Enum,
    Version,
    Warning,
}

macro_rules! error_codes {
    ($( $code:ident => ($category:ident, $severity:ident, $message:literal $(, $doc_url:literal)? ); )*) => {
        /// Stable diagnostic codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(clippy::upper_case_acronyms)]
        pub enum ErrorCode {
            $(
                #[doc = $message]
                $code,
            )*
        }

        impl ErrorCode {
            /// The code as it appears in rendered output (e.g., `"E2002"`).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$code => stringify!($code), )*
                }
            }

            /// The default human-readable message for this code.
            pub fn default_message(&self) -> &'static str {
                match self {
                    $( Self::$code => $message, )*
                }
            }

            /// The category this code belongs to.
            pub fn category(&self) -> Category {
                match self {
                    $( Self::$code => Category::$category, )*
                }
            }

            /// The intrinsic severity of this code.
            pub fn severity(&self) -> Severity {
                match self {
                    $( Self::$code => Severity::$severity, )*
                }
            }

            /// Link to reference documentation, when one exists.
            pub fn doc_url(&self) -> Option<&'static str> {
                match self {
                    $( Self::$code => error_codes!(@doc $($doc_url)?), )*
                }
            }
        }
    };
    (@doc $doc_url:literal) => { Some($doc_url) };
    (@doc) => { None };
}

error_codes! {
    // Syntax (E1xxx)
    E1001 => (Syntax, Error, "Unexpected token");
    E1002 => (Syntax, Error, "Unexpected end of file");
    E1003 => (Syntax, Error, "Invalid identifier");
    E1004 => (Syntax, Error, "Missing semicolon");
    E1005 => (Syntax, Error, "Unclosed block");
    E1006 => (Syntax, Error, "Invalid character");
    E1007 => (Syntax, Error, "Invalid string literal");
    E1008 => (Syntax, Error, "Invalid number literal");

    // Model (E2xxx)
    E2001 => (Model, Error, "Model name must be PascalCase",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#naming-conventions");
    E2002 => (Model, Error, "Duplicate model name");
    E2003 => (Model, Error, "Empty model");
    E2004 => (Model, Error, "Invalid model name");
    E2005 => (Model, Error, "Reserved model name");

    // Field (E3xxx)
    E3001 => (Field, Error, "Field name must be camelCase",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#naming-conventions");
    E3002 => (Field, Error, "Duplicate field name");
    E3003 => (Field, Error, "Invalid field type");
    E3004 => (Field, Error, "Unknown scalar type",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#model-field-scalar-types");
    E3005 => (Field, Error, "Unknown enum type");
    E3006 => (Field, Error, "Unknown model type");
    E3007 => (Field, Error, "Invalid type modifier");
    E3008 => (Field, Error, "Reserved field name");

    // Attribute (E4xxx)
    E4001 => (Attribute, Error, "Unknown attribute",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#attributes");
    E4002 => (Attribute, Error, "Invalid attribute argument");
    E4003 => (Attribute, Error, "Missing required attribute argument");
    E4004 => (Attribute, Error, "Duplicate attribute");
    E4005 => (Attribute, Error, "Invalid @default value",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#default");
    E4006 => (Attribute, Error, "Invalid @relation configuration",
        "https://www.prisma.io/docs/reference/api-reference/prisma-schema-reference#relation");
    E4007 => (Attribute, Error, "@id cannot be used on optional fields");
    E4008 => (Attribute, Error, "Multiple @id attributes on the same field");
    E4009 => (Attribute, Error, "Invalid @@id fields");
    E4010 => (Attribute, Error, "Invalid @@unique fields");
    E4011 => (Attribute, Error, "Invalid @@index fields");

    // Relation (E5xxx)
    E5001 => (Relation, Error, "Missing relation field",
        "https://www.prisma.io/docs/concepts/components/prisma-schema/relations");
    E5002 => (Relation, Error, "Invalid relation field type");
    E5003 => (Relation, Error, "Ambiguous relation",
        "https://www.prisma.io/docs/concepts/components/prisma-schema/relations#disambiguating-relations");
    E5004 => (Relation, Error, "Missing back-relation field");
    E5005 => (Relation, Error, "Invalid @relation fields");
    E5006 => (Relation, Error, "Invalid @relation references");
    E5007 => (Relation, Error, "Self-relation must be optional or list");
    E5008 => (Relation, Error, "Many-to-many relation cannot have scalar foreign-key fields");

    // Enum (E6xxx)
    E6001 => (Enum, Error, "Enum name must be PascalCase");
    E6002 => (Enum, Error, "Duplicate enum name");
    E6003 => (Enum, Error, "Empty enum");
    E6004 => (Enum, Error, "Duplicate enum value");
    E6005 => (Enum, Error, "Invalid enum value name");
    E6006 => (Enum, Error, "Reserved enum name");

    // Version / provider compatibility (E7xxx)
    E7001 => (Version, Error, "Unsupported schema format version");
    E7002 => (Version, Error, "Feature requires a newer format version");
    E7003 => (Version, Warning, "Feature deprecated in this version");
    E7004 => (Version, Error, "Provider not supported");
    E7005 => (Version, Error, "relationMode not supported by this provider");

    // Warnings (Wxxx)
    W1001 => (Warning, Warning, "Unused model");
    W2001 => (Warning, Warning, "Consider using @updatedAt on timestamp fields");
    W3001 => (Warning, Warning, "Consider adding @@index for better query performance");
    W4001 => (Warning, Warning, "Model has a large number of fields");
    W5001 => (Warning, Warning, "relationMode \"prisma\" may impact performance");
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structured error, warning, or note.
///
/// Diagnostics are append-only during a parse run and never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_frame: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's intrinsic severity and doc link.
    pub fn new(code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            code,
            severity: code.severity(),
            location,
            code_frame: None,
            suggestions: vec![],
            doc_url: code.doc_url().map(String::from),
        }
    }

    /// Create a diagnostic using the code's default message.
    pub fn from_code(code: ErrorCode, location: SourceLocation) -> Self {
        Self::new(code, code.default_message(), location)
    }

    /// Override the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach an actionable suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Attach a pre-rendered code frame.
    pub fn with_code_frame(mut self, frame: impl Into<String>) -> Self {
        self.code_frame = Some(frame.into());
        self
    }

    /// Render for terminal output, generating a code frame from `source`.
    pub fn render_terminal(&self, source: &str) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!(
            "{}: {}\n",
            self.severity.to_string().to_uppercase(),
            self.message
        ));
        out.push_str(&format!("  --> {} at {}\n", self.code, self.location));

        match &self.code_frame {
            Some(frame) => {
                out.push('\n');
                out.push_str(frame);
                out.push('\n');
            }
            None => {
                out.push('\n');
                out.push_str(&code_frame(source, &self.location, DEFAULT_CONTEXT_LINES));
            }
        }

        if !self.suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for (i, s) in self.suggestions.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, s));
            }
        }

        if let Some(url) = &self.doc_url {
            out.push_str(&format!("\nLearn more: {url}\n"));
        }

        out
    }
}

/// Context lines rendered above and below the offending line.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Render a numbered code frame with a caret under the offending column.
pub fn code_frame(source: &str, location: &SourceLocation, context: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let line = location.line.max(1) as usize;
    let start = line.saturating_sub(context + 1);
    let end = (line + context).min(lines.len());

    let mut out = String::new();
    for (i, text) in lines.iter().enumerate().take(end).skip(start) {
        let line_num = i + 1;
        let prefix = if line_num == line { '>' } else { ' ' };
        out.push_str(&format!("{prefix} {line_num:>4} | {text}\n"));
        if line_num == line {
            let caret_pad = " ".repeat((location.column.max(1) as usize) - 1);
            out.push_str(&format!("  {:>4} | {caret_pad}^\n", ""));
        }
    }
    out
}

/// Append-only collection of diagnostics for one parse run.
///
/// Ordering within a severity class follows source order, giving reproducible
/// output across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollection {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// True if any error-severity diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// True if any warning-severity diagnostic was reported.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    /// All error-severity diagnostics, in source order.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// All warning-severity diagnostics, in source order.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// All diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Number of diagnostics of any severity.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// True if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count of diagnostics with a specific code.
    pub fn count_of(&self, code: ErrorCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    /// Render all diagnostics for terminal output.
    pub fn render_terminal(&self, source: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render_terminal(source))
            .collect()
    }

    /// JSON view: `{errors: [...], warnings: [...]}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.errors().collect::<Vec<_>>(),
            "warnings": self.warnings().collect::<Vec<_>>(),
        })
    }
}

impl IntoIterator for ErrorCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
