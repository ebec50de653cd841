//! Retrieve query URLs
//!
//! Represents the `$select` / `$filter` part of a retrieve call and turns it
//! into a request URL.

use super::filters::Filter;
use crate::api::constants;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub id: Option<String>,
    /// Comma separated column list
    pub select: String,
    /// Compiled `$filter` expression
    pub filter: String,
}

impl Query {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Column list wins over the preformatted string when non-empty
    pub fn with_select(mut self, columns: &[String], columns_string: &str) -> Self {
        self.select = select_statement(columns, columns_string);
        self
    }

    /// A set filter tree wins over the preformatted string
    pub fn with_filter(mut self, filter: &Filter, filter_string: &str) -> Self {
        self.filter = if filter.is_set() {
            filter.to_odata_string()
        } else {
            filter_string.to_string()
        };
        self
    }

    /// Generate the full request URL
    pub fn to_url(&self, base_url: &str) -> String {
        let mut url = match &self.id {
            Some(id) => constants::entity_record_endpoint(base_url, &self.table, id),
            None => constants::entity_endpoint(base_url, &self.table),
        };

        let mut params = Vec::new();
        if !self.select.is_empty() {
            params.push(format!("$select={}", urlencoding::encode(&self.select)));
        }
        if !self.filter.is_empty() {
            params.push(format!("$filter={}", urlencoding::encode(&self.filter)));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        url
    }
}

pub fn select_statement(columns: &[String], columns_string: &str) -> String {
    if columns.is_empty() {
        columns_string.to_string()
    } else {
        columns.join(",")
    }
}
