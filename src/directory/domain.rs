// Query planning for the directory listing - pure, no database access
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

impl ListQuery {
    /// Build from raw key/value pairs; the first occurrence of a key wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                "sort" => &mut query.sort,
                "dir" => &mut query.dir,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Country,
    City,
}

impl SortColumn {
    /// Anything outside the allow-list sorts by id.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("name") => SortColumn::Name,
            Some("country") => SortColumn::Country,
            Some("city") => SortColumn::City,
            _ => SortColumn::Id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::Country => "country",
            SortColumn::City => "city",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        if raw == Some("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Which filter a listing runs with. Count and page queries are both built
/// from the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPredicate {
    /// FTS5 MATCH expression over the name+story index.
    FullText(String),
    /// Lowercased needle matched with LIKE against id, name, country, city.
    /// An empty needle matches every record.
    Substring(String),
}

impl SearchPredicate {
    pub fn plan(search: &str) -> Self {
        let trimmed = search.trim();
        match build_fts_query(trimmed) {
            Some(query) => SearchPredicate::FullText(query),
            None => SearchPredicate::Substring(trimmed.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub predicate: SearchPredicate,
    pub page: i64,
    pub limit: i64,
    pub sort: SortColumn,
    pub dir: SortDirection,
}

impl ListParams {
    pub fn from_query(query: &ListQuery) -> Self {
        let page = parse_int(query.page.as_deref())
            .unwrap_or(DEFAULT_PAGE)
            .max(1);
        let limit = parse_int(query.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        Self {
            predicate: SearchPredicate::plan(query.search.as_deref().unwrap_or("")),
            page,
            limit,
            sort: SortColumn::parse(query.sort.as_deref()),
            dir: SortDirection::parse(query.dir.as_deref()),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// ORDER BY body with `qualifier` prefixed to each column. Ties on the sort
    /// column are broken by id so that pages never overlap.
    pub fn order_by(&self, qualifier: &str) -> String {
        let primary = format!("{}{} {}", qualifier, self.sort.column(), self.dir.keyword());
        if self.sort == SortColumn::Id {
            primary
        } else {
            format!("{}, {}id ASC", primary, qualifier)
        }
    }
}

/// Lowercase and split on whitespace. Tokens without a single alphanumeric
/// character are dropped: the FTS tokenizer would reduce them to nothing.
pub fn tokenize(search: &str) -> Vec<String> {
    search
        .trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(str::to_string)
        .collect()
}

/// Every token must match as a prefix: `"ada"* AND "love"*`.
pub fn build_fts_query(search: &str) -> Option<String> {
    let terms = tokenize(search);
    if terms.is_empty() {
        return None;
    }
    let query = terms
        .iter()
        .map(|t| format!("\"{}\"*", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" AND ");
    Some(query)
}

/// Escape LIKE wildcards so a needle only ever matches literally.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Leading-integer parse: "3", " 7 ", "12abc" and "-2" are accepted, "abc" is not.
fn parse_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
