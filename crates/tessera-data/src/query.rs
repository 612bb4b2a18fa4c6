//! Query terms
//!
//! The tagged-variant AST behind collection queries. Callers express
//! predicates through the typed [`Field`] builder, which exposes only the
//! supported operation set; anything the remote API cannot evaluate is
//! simply not constructible, and the few shape rules that remain (one
//! temporal term per field, sub-ranges only on collection links) are
//! validated when the term is added — before any I/O.

use chrono::{DateTime, Utc};

use tessera_core::{Error, Result};
use tessera_http::QueryString;

use crate::kind::{link_shape, LinkShape, ResourceKind};

/// A named attribute to build criteria against.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
}

impl Field {
    /// Start building a criterion for the named attribute.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Attribute equality: compiles to `field=value`.
    #[must_use]
    pub fn eq(self, value: impl Into<String>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Eq(value.into()),
        }
    }

    /// Prefix match: compiles to `field=value*`.
    #[must_use]
    pub fn starts_with(self, value: impl Into<String>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::StartsWith(value.into()),
        }
    }

    /// Suffix match: compiles to `field=*value`.
    #[must_use]
    pub fn ends_with(self, value: impl Into<String>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::EndsWith(value.into()),
        }
    }

    /// Substring match: compiles to `field=*value*`.
    #[must_use]
    pub fn contains(self, value: impl Into<String>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Contains(value.into()),
        }
    }

    /// Strictly-after comparison on a datetime attribute.
    #[must_use]
    pub fn gt(self, value: DateTime<Utc>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Gt(value),
        }
    }

    /// At-or-after comparison on a datetime attribute.
    #[must_use]
    pub fn gte(self, value: DateTime<Utc>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Gte(value),
        }
    }

    /// Strictly-before comparison on a datetime attribute.
    #[must_use]
    pub fn lt(self, value: DateTime<Utc>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Lt(value),
        }
    }

    /// At-or-before comparison on a datetime attribute.
    #[must_use]
    pub fn lte(self, value: DateTime<Utc>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Lte(value),
        }
    }

    /// Half-open range `[start, end)` on a datetime attribute.
    #[must_use]
    pub fn between(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Between(start, end),
        }
    }

    /// Truncated-precision shorthand on a datetime attribute: matches the
    /// whole named period. `within(2015)` compiles to `field=2015`,
    /// `within((2015, 1))` to `field=2015-01`, and so on down to seconds.
    #[must_use]
    pub fn within(self, spec: impl Into<WithinSpec>) -> Criterion {
        Criterion {
            field: self.name,
            term: Term::Within(spec.into()),
        }
    }
}

/// Truncated-precision date literal for [`Field::within`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithinSpec {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl WithinSpec {
    fn render(&self) -> String {
        let mut out = format!("{:04}", self.year);
        if let Some(month) = self.month {
            out.push_str(&format!("-{month:02}"));
            if let Some(day) = self.day {
                out.push_str(&format!("-{day:02}"));
                if let Some(hour) = self.hour {
                    out.push_str(&format!("T{hour:02}"));
                    if let Some(minute) = self.minute {
                        out.push_str(&format!(":{minute:02}"));
                        if let Some(second) = self.second {
                            out.push_str(&format!(":{second:02}"));
                        }
                    }
                }
            }
        }
        out
    }
}

impl From<i32> for WithinSpec {
    fn from(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
        }
    }
}

impl From<(i32, u32)> for WithinSpec {
    fn from((year, month): (i32, u32)) -> Self {
        Self {
            month: Some(month),
            ..Self::from(year)
        }
    }
}

impl From<(i32, u32, u32)> for WithinSpec {
    fn from((year, month, day): (i32, u32, u32)) -> Self {
        Self {
            day: Some(day),
            ..Self::from((year, month))
        }
    }
}

impl From<(i32, u32, u32, u32)> for WithinSpec {
    fn from((year, month, day, hour): (i32, u32, u32, u32)) -> Self {
        Self {
            hour: Some(hour),
            ..Self::from((year, month, day))
        }
    }
}

impl From<(i32, u32, u32, u32, u32)> for WithinSpec {
    fn from((year, month, day, hour, minute): (i32, u32, u32, u32, u32)) -> Self {
        Self {
            minute: Some(minute),
            ..Self::from((year, month, day, hour))
        }
    }
}

impl From<(i32, u32, u32, u32, u32, u32)> for WithinSpec {
    fn from(
        (year, month, day, hour, minute, second): (i32, u32, u32, u32, u32, u32),
    ) -> Self {
        Self {
            second: Some(second),
            ..Self::from((year, month, day, hour, minute))
        }
    }
}

#[derive(Debug, Clone)]
enum Term {
    Eq(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Gt(DateTime<Utc>),
    Gte(DateTime<Utc>),
    Lt(DateTime<Utc>),
    Lte(DateTime<Utc>),
    Between(DateTime<Utc>, DateTime<Utc>),
    Within(WithinSpec),
}

/// One attribute predicate. Criteria on a query AND together; OR is not
/// expressible.
#[derive(Debug, Clone)]
pub struct Criterion {
    field: String,
    term: Term,
}

fn render_datetime(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl Criterion {
    /// The attribute this criterion constrains.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether this is a temporal term (comparison, range, or shorthand).
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(
            self.term,
            Term::Gt(_)
                | Term::Gte(_)
                | Term::Lt(_)
                | Term::Lte(_)
                | Term::Between(_, _)
                | Term::Within(_)
        )
    }

    /// Compile to the query-string value for `field=<value>`.
    #[must_use]
    pub fn compile(&self) -> String {
        match &self.term {
            Term::Eq(v) => v.clone(),
            Term::StartsWith(v) => format!("{v}*"),
            Term::EndsWith(v) => format!("*{v}"),
            Term::Contains(v) => format!("*{v}*"),
            Term::Gt(v) => format!("({},]", render_datetime(v)),
            Term::Gte(v) => format!("[{},]", render_datetime(v)),
            Term::Lt(v) => format!("[,{})", render_datetime(v)),
            Term::Lte(v) => format!("[,{}]", render_datetime(v)),
            Term::Between(start, end) => {
                format!("[{},{})", render_datetime(start), render_datetime(end))
            }
            Term::Within(spec) => spec.render(),
        }
    }
}

/// One `orderBy` term.
#[derive(Debug, Clone)]
pub struct OrderTerm {
    pub field: String,
    pub descending: bool,
}

impl OrderTerm {
    fn compile(&self) -> String {
        if self.descending {
            format!("{} desc", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// An `expand` term: a link name, optionally with a collection sub-range.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub name: String,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl Expansion {
    /// Expand a link with no sub-range.
    #[must_use]
    pub fn link(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: None,
            limit: None,
        }
    }

    /// Expand a collection link with a sub-range.
    #[must_use]
    pub fn collection(name: impl Into<String>, offset: u32, limit: u32) -> Self {
        Self {
            name: name.into(),
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    /// Validate this expansion against a kind's link table.
    pub fn validate(&self, kind: ResourceKind) -> Result<()> {
        match link_shape(kind, &self.name) {
            None => Err(Error::unsupported(format!(
                "'{}' is not an expandable link on {kind}",
                self.name
            ))),
            Some(LinkShape::Single) if self.offset.is_some() || self.limit.is_some() => {
                Err(Error::unsupported(format!(
                    "link '{}' on {kind} is not a collection and cannot take offset/limit",
                    self.name
                )))
            }
            Some(_) => Ok(()),
        }
    }

    /// Render as one `expand` term.
    #[must_use]
    pub fn compile_term(&self) -> String {
        match (self.offset, self.limit) {
            (Some(offset), Some(limit)) => {
                format!("{}(offset:{offset},limit:{limit})", self.name)
            }
            (Some(offset), None) => format!("{}(offset:{offset})", self.name),
            (None, Some(limit)) => format!("{}(limit:{limit})", self.name),
            (None, None) => self.name.clone(),
        }
    }
}

/// Accumulated query state for one collection request.
#[derive(Debug, Clone, Default)]
pub struct QueryAst {
    filter: Option<String>,
    criteria: Vec<Criterion>,
    order: Vec<OrderTerm>,
    expansions: Vec<Expansion>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl QueryAst {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text filter (`q`). Last write wins.
    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = Some(term.into());
    }

    /// Add an attribute criterion. At most one temporal term per field;
    /// a second fails with an unsupported-operation error before any I/O.
    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<()> {
        if criterion.is_temporal()
            && self
                .criteria
                .iter()
                .any(|existing| existing.is_temporal() && existing.field() == criterion.field())
        {
            return Err(Error::unsupported(format!(
                "field '{}' already has a temporal term; at most one \
                 date comparison or shorthand is supported per field",
                criterion.field()
            )));
        }
        self.criteria.push(criterion);
        Ok(())
    }

    /// Append an order term.
    pub fn add_order(&mut self, field: impl Into<String>, descending: bool) {
        self.order.push(OrderTerm {
            field: field.into(),
            descending,
        });
    }

    /// Add a validated expansion.
    pub fn add_expansion(&mut self, expansion: Expansion, kind: ResourceKind) -> Result<()> {
        expansion.validate(kind)?;
        self.expansions.push(expansion);
        Ok(())
    }

    /// Set the page limit. Last write wins.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    /// Set the page offset. Last write wins.
    pub fn set_offset(&mut self, offset: u32) {
        self.offset = Some(offset);
    }

    /// Caller-specified limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Caller-specified offset, if any.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Compile to a query string. No pagination defaults are injected:
    /// `limit`/`offset` appear only when the caller set them.
    #[must_use]
    pub fn to_query_string(&self) -> QueryString {
        let mut query = QueryString::new();
        if let Some(filter) = &self.filter {
            query.set("q", filter.clone());
        }
        for criterion in &self.criteria {
            query.append(criterion.field(), criterion.compile());
        }
        if !self.order.is_empty() {
            let rendered = self
                .order
                .iter()
                .map(OrderTerm::compile)
                .collect::<Vec<_>>()
                .join(",");
            query.set("orderBy", rendered);
        }
        if !self.expansions.is_empty() {
            let rendered = self
                .expansions
                .iter()
                .map(Expansion::compile_term)
                .collect::<Vec<_>>()
                .join(",");
            query.set("expand", rendered);
        }
        if let Some(limit) = self.limit {
            query.set("limit", limit.to_string());
        }
        if let Some(offset) = self.offset {
            query.set("offset", offset.to_string());
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_operators_compile() {
        assert_eq!(Field::named("email").eq("tk421@empire.gov").compile(), "tk421@empire.gov");
        assert_eq!(Field::named("email").starts_with("tk421").compile(), "tk421*");
        assert_eq!(Field::named("email").ends_with("empire.gov").compile(), "*empire.gov");
        assert_eq!(Field::named("email").contains("421").compile(), "*421*");
    }

    #[test]
    fn test_datetime_comparisons_compile_to_intervals() {
        let instant = Utc.with_ymd_and_hms(2015, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            Field::named("createdAt").gt(instant).compile(),
            "(2015-01-01T12:00:00Z,]"
        );
        assert_eq!(
            Field::named("createdAt").gte(instant).compile(),
            "[2015-01-01T12:00:00Z,]"
        );
        assert_eq!(
            Field::named("createdAt").lt(instant).compile(),
            "[,2015-01-01T12:00:00Z)"
        );
        assert_eq!(
            Field::named("createdAt").lte(instant).compile(),
            "[,2015-01-01T12:00:00Z]"
        );
    }

    #[test]
    fn test_between_compiles_half_open() {
        let start = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2015, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Field::named("createdAt").between(start, end).compile(),
            "[2015-01-01T00:00:00Z,2015-02-01T00:00:00Z)"
        );
    }

    #[test]
    fn test_within_truncated_precision() {
        assert_eq!(Field::named("createdAt").within(2015).compile(), "2015");
        assert_eq!(Field::named("createdAt").within((2015, 1)).compile(), "2015-01");
        assert_eq!(
            Field::named("createdAt").within((2015, 1, 1)).compile(),
            "2015-01-01"
        );
        assert_eq!(
            Field::named("createdAt").within((2015, 1, 1, 12, 30)).compile(),
            "2015-01-01T12:30"
        );
        assert_eq!(
            Field::named("createdAt")
                .within((2015, 1, 1, 12, 30, 45))
                .compile(),
            "2015-01-01T12:30:45"
        );
    }

    #[test]
    fn test_second_temporal_term_on_same_field_rejected() {
        let mut ast = QueryAst::new();
        ast.add_criterion(Field::named("createdAt").within(2015)).unwrap();
        let instant = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
        let result = ast.add_criterion(Field::named("createdAt").gt(instant));
        assert!(matches!(result, Err(Error::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_temporal_terms_on_different_fields_combine() {
        let mut ast = QueryAst::new();
        ast.add_criterion(Field::named("createdAt").within(2015)).unwrap();
        let instant = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        ast.add_criterion(Field::named("modifiedAt").lt(instant)).unwrap();
        let query = ast.to_query_string();
        assert_eq!(query.get("createdAt"), Some("2015"));
        assert_eq!(query.get("modifiedAt"), Some("[,2016-01-01T00:00:00Z)"));
    }

    #[test]
    fn test_order_terms_preserve_call_order() {
        let mut ast = QueryAst::new();
        ast.add_order("givenName", false);
        ast.add_order("username", true);
        assert_eq!(
            ast.to_query_string().get("orderBy"),
            Some("givenName,username desc")
        );
    }

    #[test]
    fn test_expansion_compilation() {
        assert_eq!(Expansion::link("directory").compile_term(), "directory");
        assert_eq!(
            Expansion::collection("groups", 10, 10).compile_term(),
            "groups(offset:10,limit:10)"
        );
    }

    #[test]
    fn test_expansion_subrange_on_single_link_rejected() {
        let expansion = Expansion::collection("directory", 0, 10);
        let result = expansion.validate(ResourceKind::Account);
        assert!(matches!(result, Err(Error::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_expansion_of_plain_attribute_rejected() {
        let result = Expansion::link("email").validate(ResourceKind::Account);
        assert!(matches!(result, Err(Error::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_pagination_last_write_wins() {
        let mut ast = QueryAst::new();
        ast.set_limit(10);
        ast.set_limit(5);
        let query = ast.to_query_string();
        assert_eq!(query.get("limit"), Some("5"));
        assert!(query.get("offset").is_none());
    }

    #[test]
    fn test_empty_query_compiles_to_nothing() {
        assert!(QueryAst::new().to_query_string().is_empty());
    }

    #[test]
    fn test_filter_last_write_wins() {
        let mut ast = QueryAst::new();
        ast.set_filter("luke");
        ast.set_filter("vader");
        assert_eq!(ast.to_query_string().get("q"), Some("vader"));
    }
}
