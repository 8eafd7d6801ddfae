//! Seek pagination: turns a [`PageQuery`] into the WHERE predicate and
//! ORDER BY clause that select "rows strictly after the cursor" under the
//! active sort order.
//!
//! Offsets are deliberately not used: an OFFSET scan degrades to O(n) skips
//! and drifts under concurrent writes, while a seek predicate over an indexed
//! key is O(log n) and stable. Ties on the sort field are broken by `id` so
//! the composite order is total and pages never skip or repeat rows.

use anyhow::anyhow;
use sqlx::{Postgres, QueryBuilder};

use crate::catalog::error::Error;
use crate::catalog::options::{PageQuery, SortField, SortKey};

/// Predicate selecting the rows after a query's cursor.
#[derive(Debug, PartialEq)]
pub(crate) enum SeekFilter<'a> {
    /// First page: every row is a candidate.
    All,
    /// No explicit sort field; the catalog's implicit order is by identity,
    /// so the predicate is simply `id > cursor.id`.
    AfterId { id: i64 },
    /// Explicit sort field: admit rows with a strictly-better field value, or
    /// rows tied on the field with a strictly-better identity.
    AfterKey {
        key: SortKey<'a>,
        id: i64,
        ascending: bool,
    },
}

impl<'a> SeekFilter<'a> {
    /// Derive the seek strategy for `query`.
    ///
    /// A cursor whose identity was never assigned by the store (ids start
    /// at 1) cannot anchor a seek and is rejected as invalid input.
    pub(crate) fn resolve(query: &'a PageQuery) -> Result<SeekFilter<'a>, Error> {
        let Some(last) = query.cursor() else {
            return Ok(SeekFilter::All);
        };

        if last.id <= 0 {
            return Err(Error::invalid_input(anyhow!(
                "cursor product carries no valid identity (id={})",
                last.id
            )));
        }

        let filter = match query.sorting() {
            None => SeekFilter::AfterId { id: last.id },
            Some(sorting) => SeekFilter::AfterKey {
                key: sorting.field.key_of(last),
                id: last.id,
                ascending: sorting.ascending,
            },
        };
        Ok(filter)
    }

    /// Append this filter's `WHERE` clause to `builder`. `All` appends
    /// nothing.
    pub(crate) fn push_where(&self, builder: &mut QueryBuilder<'a, Postgres>) {
        match self {
            SeekFilter::All => {}
            SeekFilter::AfterId { id } => {
                builder.push(" WHERE id > ");
                builder.push_bind(*id);
            }
            SeekFilter::AfterKey { key, id, ascending } => {
                let column = key.field().column();
                let (field_cmp, id_cmp) = if *ascending { (">=", ">") } else { ("<=", "<") };

                // Composite seek predicate:
                //   (field AFTER-OR-EQUAL cursor.field)
                //   AND (field != cursor.field OR id AFTER cursor.id)
                builder.push(format!(" WHERE ({column} {field_cmp} "));
                key.push_bind(builder);
                builder.push(format!(") AND ({column} <> "));
                key.push_bind(builder);
                builder.push(format!(" OR id {id_cmp} "));
                builder.push_bind(*id);
                builder.push(")");
            }
        }
    }
}

impl<'a> SortKey<'a> {
    pub(crate) fn field(&self) -> SortField {
        match self {
            SortKey::Name(_) => SortField::Name,
            SortKey::Price(_) => SortField::Price,
            SortKey::PriceUpdateCount(_) => SortField::PriceUpdateCount,
            SortKey::LastModified(_) => SortField::LastModified,
        }
    }

    pub(crate) fn push_bind(&self, builder: &mut QueryBuilder<'a, Postgres>) {
        match *self {
            SortKey::Name(value) => {
                builder.push_bind(value);
            }
            SortKey::Price(value) => {
                builder.push_bind(value);
            }
            SortKey::PriceUpdateCount(value) => {
                builder.push_bind(value);
            }
            SortKey::LastModified(value) => {
                builder.push_bind(value);
            }
        }
    }
}

/// Composite ORDER BY: the requested field first, `id` as tie-break, both in
/// the same direction. Without an explicit sort the catalog's implicit order
/// is by `id` ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SeekOrder {
    field: Option<SortField>,
    ascending: bool,
}

impl SeekOrder {
    pub(crate) fn for_query(query: &PageQuery) -> Self {
        match query.sorting() {
            Some(sorting) => Self {
                field: Some(sorting.field),
                ascending: sorting.ascending,
            },
            None => Self {
                field: None,
                ascending: true,
            },
        }
    }

    pub(crate) fn push_order_by(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let direction = if self.ascending { "ASC" } else { "DESC" };
        match self.field {
            Some(field) => {
                builder.push(format!(
                    " ORDER BY {} {direction}, id {direction}",
                    field.column()
                ));
            }
            None => {
                builder.push(format!(" ORDER BY id {direction}"));
            }
        }
    }
}
