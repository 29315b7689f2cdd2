//! Parsed query representation.
//!
//! The wire shape is a JSON map: keys are field names, values are either a
//! bare value (implicit equality) or a map of `$`-operators. All top-level
//! selectors AND together; logical operators like `$or` are rejected rather
//! than reinterpreted.

use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// A single operator applied to a field
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Equality: field = value
    Eq(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Less than: field < value
    Lt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Set membership: field IN (values)
    In(Vec<Value>),
    /// Existence: true = field present, false = field absent
    Exists(bool),
}

impl Constraint {
    /// Returns the operator name for error and log output
    pub fn op_name(&self) -> &'static str {
        match self {
            Constraint::Eq(_) => "$eq",
            Constraint::Gt(_) => "$gt",
            Constraint::Gte(_) => "$gte",
            Constraint::Lt(_) => "$lt",
            Constraint::Lte(_) => "$lte",
            Constraint::In(_) => "$in",
            Constraint::Exists(_) => "$exists",
        }
    }
}

/// All constraints on one field (ANDed together)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    /// Field name (possibly a dotted path)
    pub field: String,
    /// Constraints in wire order
    pub constraints: Vec<Constraint>,
}

/// A parsed conjunctive query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// One clause per constrained field
    pub clauses: Vec<FieldClause>,
}

impl ParsedQuery {
    /// Parses a query document.
    ///
    /// An empty map is a valid query matching every document. `$`-prefixed
    /// top-level keys and unrecognized operators are errors, never no-ops.
    pub fn parse(query: &Value) -> QueryResult<Self> {
        let map = query
            .as_object()
            .ok_or_else(|| QueryError::InvalidQuery(format!("not a map: {query}")))?;

        let mut clauses = Vec::with_capacity(map.len());
        for (field, selector) in map {
            if field.starts_with('$') {
                return Err(QueryError::InvalidQuery(format!(
                    "logical operators are not supported: '{field}'"
                )));
            }
            clauses.push(FieldClause {
                field: field.clone(),
                constraints: parse_selector(field, selector)?,
            });
        }
        Ok(Self { clauses })
    }

    /// Returns the constrained field names in clause order.
    pub fn constrained_fields(&self) -> Vec<&str> {
        self.clauses.iter().map(|c| c.field.as_str()).collect()
    }

    /// Returns true when the query matches every document
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Parses one field's selector: a bare value or an operator map.
fn parse_selector(field: &str, selector: &Value) -> QueryResult<Vec<Constraint>> {
    let Some(map) = selector.as_object() else {
        return Ok(vec![Constraint::Eq(selector.clone())]);
    };

    let operator_keys = map.keys().filter(|k| k.starts_with('$')).count();
    if operator_keys == 0 {
        // A plain sub-document is an equality value.
        return Ok(vec![Constraint::Eq(selector.clone())]);
    }
    if operator_keys != map.len() {
        return Err(QueryError::InvalidQuery(format!(
            "selector for '{field}' mixes operators and fields"
        )));
    }

    let mut constraints = Vec::with_capacity(map.len());
    for (operator, operand) in map {
        constraints.push(parse_operator(field, operator, operand)?);
    }
    Ok(constraints)
}

fn parse_operator(field: &str, operator: &str, operand: &Value) -> QueryResult<Constraint> {
    match operator {
        "$eq" => Ok(Constraint::Eq(operand.clone())),
        "$gt" => Ok(Constraint::Gt(operand.clone())),
        "$gte" => Ok(Constraint::Gte(operand.clone())),
        "$lt" => Ok(Constraint::Lt(operand.clone())),
        "$lte" => Ok(Constraint::Lte(operand.clone())),
        "$in" => match operand {
            Value::Array(values) => Ok(Constraint::In(values.clone())),
            other => Err(QueryError::InvalidQuery(format!(
                "$in for '{field}' requires an array, got {other}"
            ))),
        },
        "$exists" => match operand {
            Value::Bool(present) => Ok(Constraint::Exists(*present)),
            other => Err(QueryError::InvalidQuery(format!(
                "$exists for '{field}' requires a boolean, got {other}"
            ))),
        },
        "$not" => parse_negation(field, operand),
        unknown => Err(QueryError::UnknownOperator(unknown.to_string())),
    }
}

/// `$not` inverts an existence check; nothing else is negatable because the
/// compiled form is `IS [NOT] NULL`.
fn parse_negation(field: &str, operand: &Value) -> QueryResult<Constraint> {
    let inner = operand.as_object().ok_or_else(|| {
        QueryError::InvalidQuery(format!("$not for '{field}' requires an operator map"))
    })?;
    if inner.len() != 1 {
        return Err(QueryError::InvalidQuery(format!(
            "$not for '{field}' requires exactly one operator"
        )));
    }
    let (operator, operand) = inner.iter().next().expect("len checked");
    match parse_operator(field, operator, operand)? {
        Constraint::Exists(present) => Ok(Constraint::Exists(!present)),
        other => Err(QueryError::InvalidQuery(format!(
            "$not cannot negate {} for '{field}'",
            other.op_name()
        ))),
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One field/direction pair from a sort document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parses a sort document: an ordered sequence of `{field: "asc"|"desc"}`
/// maps. Bare field-name strings sort ascending.
pub fn parse_sort_document(sort: &Value) -> QueryResult<Vec<SortField>> {
    let entries = sort
        .as_array()
        .ok_or_else(|| QueryError::InvalidSort(format!("not a sequence: {sort}")))?;

    let mut fields = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(field) => fields.push(SortField::asc(field.clone())),
            Value::Object(map) if map.len() == 1 => {
                let (field, direction) = map.iter().next().expect("len checked");
                let direction = match direction.as_str() {
                    Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                    Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                    _ => {
                        return Err(QueryError::InvalidSort(format!(
                            "direction for '{field}' must be \"asc\" or \"desc\""
                        )));
                    }
                };
                fields.push(SortField {
                    field: field.clone(),
                    direction,
                });
            }
            other => {
                return Err(QueryError::InvalidSort(format!(
                    "entry must be a field name or single-key map: {other}"
                )));
            }
        }
    }
    Ok(fields)
}

/// Options for a `find` call: skip/limit window, projection, sort.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Rows to skip from the start of the sorted result
    pub skip: u64,
    /// Maximum rows to return; `None` means unbounded
    pub limit: Option<u64>,
    /// Projection field paths; `None` returns full documents
    pub fields: Option<Vec<String>>,
    /// Sort document; `None` leaves index-table order
    pub sort: Option<Vec<SortField>>,
}

impl FindOptions {
    /// Creates default options: no skip, no limit, full documents
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of rows to skip
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of rows to return
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the projection field paths
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Sets the sort order
    pub fn with_sort(mut self, sort: Vec<SortField>) -> Self {
        self.sort = Some(sort);
        self
    }
}
