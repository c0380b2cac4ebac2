//! Filter language: `select`, `sort`, `limit`
//!
//! Filters run left to right in the order they appeared in the query:
//!
//! - `select=field:value` keeps tiddlers whose field equals value,
//!   `select=field:!value` keeps those whose field does not
//! - `sort=field` sorts ascending, `sort=-field` descending
//! - `limit=n` keeps the first n

use gateway::{FilterKind, FilterSpec};

use crate::error::{BagError, Result};
use crate::model::Tiddler;

/// Apply `filters` in order
pub fn apply(mut tiddlers: Vec<Tiddler>, filters: &[FilterSpec]) -> Result<Vec<Tiddler>> {
    for filter in filters {
        tiddlers = match filter.kind {
            FilterKind::Select => select(tiddlers, &filter.argument)?,
            FilterKind::Sort => sort(tiddlers, &filter.argument),
            FilterKind::Limit => limit(tiddlers, &filter.argument)?,
        };
    }
    Ok(tiddlers)
}

fn select(tiddlers: Vec<Tiddler>, argument: &str) -> Result<Vec<Tiddler>> {
    let (field, value) = argument
        .split_once(':')
        .ok_or_else(|| BagError::BadFilter(format!("select needs field:value, got '{}'", argument)))?;
    let (negate, value) = match value.strip_prefix('!') {
        Some(value) => (true, value),
        None => (false, value),
    };

    Ok(tiddlers
        .into_iter()
        .filter(|tiddler| (tiddler.field(field) == Some(value)) != negate)
        .collect())
}

fn sort(mut tiddlers: Vec<Tiddler>, argument: &str) -> Vec<Tiddler> {
    let (field, descending) = match argument.strip_prefix('-') {
        Some(field) => (field, true),
        None => (argument, false),
    };

    tiddlers.sort_by(|a, b| {
        let ordering = a
            .field(field)
            .unwrap_or("")
            .cmp(b.field(field).unwrap_or(""));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    tiddlers
}

fn limit(mut tiddlers: Vec<Tiddler>, argument: &str) -> Result<Vec<Tiddler>> {
    let count: usize = argument
        .trim()
        .parse()
        .map_err(|_| BagError::BadFilter(format!("limit needs a count, got '{}'", argument)))?;
    tiddlers.truncate(count);
    Ok(tiddlers)
}
