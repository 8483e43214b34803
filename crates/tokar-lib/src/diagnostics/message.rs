use rowan::TextRange;

/// Diagnostic kinds ordered by priority (highest first).
///
/// When two diagnostics share a span, the higher-priority one suppresses the
/// lower-priority one, which keeps cascading parse noise out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Structural parse errors that cascade through the rest of the file
    UnclosedGroup,

    // User omitted something required
    ExpectedRuleName,
    ExpectedRuleBody,
    ExpectedAtom,
    ExpectedRangeBound,
    ExpectedSemicolon,

    // User wrote something that doesn't belong
    UnexpectedToken,

    // Valid syntax, invalid declarations
    DuplicateRule,
    UndefinedReference,
    FragmentOnParserRule,
    UnsupportedNegation,

    // Malformed matchable content; construction patches these locally
    EmptyStringOrSet,
    MultiCharacterLiteralInRange,
    ReversedInterval,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::FragmentOnParserRule => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this kind suppresses `other` on overlapping spans.
    ///
    /// Lower discriminant = higher priority.
    pub fn suppresses(&self, other: &DiagnosticKind) -> bool {
        self < other
    }

    /// Base message used when no custom detail is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnclosedGroup => "missing closing `)`",

            Self::ExpectedRuleName => "expected rule name",
            Self::ExpectedRuleBody => "expected rule body",
            Self::ExpectedAtom => "expected a literal, set, reference, `.` or group",
            Self::ExpectedRangeBound => "expected range end literal",
            Self::ExpectedSemicolon => "expected `;`",

            Self::UnexpectedToken => "unexpected token",

            Self::DuplicateRule => "duplicate rule",
            Self::UndefinedReference => "undefined reference",
            Self::FragmentOnParserRule => "`fragment` has no effect on a parser rule",
            Self::UnsupportedNegation => "cannot negate a rule reference",

            Self::EmptyStringOrSet => "empty literal or set matches nothing",
            Self::MultiCharacterLiteralInRange => "range bound must be a single character",
            Self::ReversedInterval => "range start exceeds range end",
        }
    }

    /// Template for custom messages; `{}` is replaced by caller detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::DuplicateRule => "`{}` is already defined".to_string(),
            Self::UndefinedReference => "`{}` is not defined".to_string(),
            Self::UnsupportedNegation => "cannot negate a reference to `{}`".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Resolve the final message: fallback when no detail, template otherwise.
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    /// The range underlined in rendered output.
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub(crate) fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        Ok(())
    }
}
