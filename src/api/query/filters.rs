//! OData filter trees
//!
//! A [`Filter`] is a tree of conditions joined by a single combinator per
//! node. Compiling it yields a fully parenthesized `$filter` expression.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean join between the children and conditions of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single comparison, or a raw expression when `operator` is empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Pre-formed expression such as `startswith(fullname,'K')`
    pub fn raw(expression: impl Into<String>) -> Self {
        Self {
            key: expression.into(),
            ..Default::default()
        }
    }

    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "eq", value)
    }

    pub fn ne(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "ne", value)
    }

    pub fn gt(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "gt", value)
    }

    pub fn ge(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "ge", value)
    }

    pub fn lt(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "lt", value)
    }

    pub fn le(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, "le", value)
    }

    pub fn to_odata_string(&self) -> String {
        if self.operator.is_empty() {
            self.key.clone()
        } else {
            format!("{} {} {}", self.key, self.operator, self.value)
        }
    }
}

/// Filter tree node.
///
/// Children are rendered before the node's own conditions, and the node's
/// combinator is used at every join point, including between the last child
/// and the first condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub combinator: Option<Combinator>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Filter {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator: Some(combinator),
            ..Default::default()
        }
    }

    pub fn and() -> Self {
        Self::new(Combinator::And)
    }

    pub fn or() -> Self {
        Self::new(Combinator::Or)
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// A node is usable only once a combinator has been chosen
    pub fn is_set(&self) -> bool {
        self.combinator.is_some()
    }

    /// Compile the tree into an OData boolean expression
    pub fn to_odata_string(&self) -> String {
        let mut out = String::new();
        self.write_odata(&mut out);
        out
    }

    fn write_odata(&self, out: &mut String) {
        // Unset combinator still yields a (blank) separator
        let separator = format!(" {} ", self.combinator.map(|c| c.as_str()).unwrap_or_default());

        out.push('(');
        for (i, child) in self.filters.iter().enumerate() {
            if i != 0 {
                out.push_str(&separator);
            }
            child.write_odata(out);
        }

        if !self.conditions.is_empty() {
            if !self.filters.is_empty() {
                out.push_str(&separator);
            }
            for (i, condition) in self.conditions.iter().enumerate() {
                if i != 0 {
                    out.push_str(&separator);
                }
                out.push_str(&condition.to_odata_string());
            }
        }
        out.push(')');
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata_string())
    }
}
