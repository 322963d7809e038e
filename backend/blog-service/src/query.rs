//! Post listing queries.
//!
//! `PostQuery` is a plain description of which posts to return and in what
//! order. Filter selections from the UI map onto it without touching the
//! database; `build` renders it into SQL.

use crate::error::AppError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use content_blocks::Category;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

pub(crate) const POST_SELECT: &str = "SELECT p.id, p.uploaded_by, u.email AS author_email, \
     p.block_type, p.content, p.likes, p.dislikes, p.created_at, p.updated_at \
     FROM posts p JOIN users u ON u.id = p.uploaded_by";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Creation order as stored
    #[default]
    Unspecified,
    TopLikes,
    Newest,
    Oldest,
}

impl SortOrder {
    /// Unrecognised values fall back to `Unspecified`
    pub fn parse(value: &str) -> Self {
        match value {
            "topLikes" => SortOrder::TopLikes,
            "newest" => SortOrder::Newest,
            "oldest" => SortOrder::Oldest,
            _ => SortOrder::Unspecified,
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            SortOrder::TopLikes => {
                " ORDER BY cardinality(p.likes) DESC, p.created_at DESC, p.id DESC"
            }
            SortOrder::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            SortOrder::Oldest | SortOrder::Unspecified => " ORDER BY p.created_at ASC, p.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    Any,
    /// Since local midnight
    Today,
    Last7Days,
    Last30Days,
}

impl TimeWindow {
    pub fn parse(value: &str) -> Self {
        match value {
            "today" => TimeWindow::Today,
            "last7" => TimeWindow::Last7Days,
            "month" => TimeWindow::Last30Days,
            _ => TimeWindow::Any,
        }
    }

    /// Earliest creation time admitted by the window, relative to `now`
    pub fn lower_bound<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        let now_utc = now.with_timezone(&Utc);
        match self {
            TimeWindow::Any => None,
            TimeWindow::Today => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0)?;
                let local = now.timezone().from_local_datetime(&midnight).earliest();
                Some(local.map_or(now_utc - Duration::hours(24), |m| m.with_timezone(&Utc)))
            }
            TimeWindow::Last7Days => Some(now_utc - Duration::days(7)),
            TimeWindow::Last30Days => Some(now_utc - Duration::days(30)),
        }
    }
}

/// Query string of the filter endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sort: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub category: Option<Category>,
    pub owner: Option<Uuid>,
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub sort: SortOrder,
}

impl PostQuery {
    /// Every post, newest first
    pub fn newest() -> Self {
        Self {
            sort: SortOrder::Newest,
            ..Self::default()
        }
    }

    /// Case-insensitive substring search over block values and category, newest first
    pub fn search(term: &str) -> Self {
        Self {
            search: Some(term.to_string()),
            sort: SortOrder::Newest,
            ..Self::default()
        }
    }

    /// Map UI filter selections. `type` is either `all` or a category;
    /// unknown `sort`/`time` values are ignored.
    pub fn from_filter<Tz: TimeZone>(
        params: &FilterParams,
        now: &DateTime<Tz>,
    ) -> Result<Self, AppError> {
        let category = match params.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(kind) => Some(
                kind.parse::<Category>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
        };

        let created_after = params
            .time
            .as_deref()
            .map(TimeWindow::parse)
            .unwrap_or_default()
            .lower_bound(now);

        Ok(Self {
            category,
            created_after,
            sort: params.sort.as_deref().map(SortOrder::parse).unwrap_or_default(),
            ..Self::default()
        })
    }

    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn build(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(POST_SELECT);
        let mut has_where = false;
        let mut clause = |qb: &mut QueryBuilder<'static, Postgres>| {
            qb.push(if has_where { " AND " } else { " WHERE " });
            has_where = true;
        };

        if let Some(category) = self.category {
            clause(&mut qb);
            qb.push("p.block_type = ").push_bind(category.as_str());
        }
        if let Some(owner) = self.owner {
            clause(&mut qb);
            qb.push("p.uploaded_by = ").push_bind(owner);
        }
        if let Some(after) = self.created_after {
            clause(&mut qb);
            qb.push("p.created_at >= ").push_bind(after);
        }
        if let Some(term) = &self.search {
            let pattern = format!("%{}%", escape_like(term));
            clause(&mut qb);
            qb.push("(p.block_type ILIKE ")
                .push_bind(pattern.clone())
                .push(
                    " OR EXISTS (SELECT 1 FROM jsonb_array_elements(p.content) AS block \
                     WHERE block->>'value' ILIKE ",
                )
                .push_bind(pattern)
                .push("))");
        }

        qb.push(self.sort.order_by());
        qb
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
