//! `$`-option parsing into a normalized [`ODataQuery`].

use std::collections::HashSet;

use configs::ODataConfig;

use super::ast::{self, Expr};
use super::{EntitySet, ODataError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// A parsed and clamped list query.
///
/// Field names are lower-cased; `select == None` means every field.
#[derive(Clone, Debug, PartialEq)]
pub struct ODataQuery {
    pub filter: Option<Expr>,
    filter_text: Option<String>,
    pub orderby: Vec<OrderKey>,
    pub top: u64,
    pub skip: u64,
    pub select: Option<Vec<String>>,
    pub expand: Vec<String>,
    pub count: bool,
}

impl ODataQuery {
    /// Query with no options: default page size, default ordering.
    pub fn with_defaults(limits: &ODataConfig) -> Self {
        Self {
            filter: None,
            filter_text: None,
            orderby: Vec::new(),
            top: limits.default_top,
            skip: 0,
            select: None,
            expand: Vec::new(),
            count: false,
        }
    }

    /// Parse decoded query-string pairs. Parameters not starting with `$` are ignored.
    pub fn parse<I, K, V>(pairs: I, limits: &ODataConfig) -> Result<Self, ODataError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut q = Self::with_defaults(limits);
        let mut seen = HashSet::new();
        for (k, v) in pairs {
            let key = k.as_ref().trim().to_ascii_lowercase();
            if !key.starts_with('$') {
                continue;
            }
            if !seen.insert(key.clone()) {
                return Err(ODataError::InvalidOption(format!("{key} given more than once")));
            }
            let value = v.as_ref().trim();
            match key.as_str() {
                "$filter" => {
                    if !value.is_empty() {
                        q.filter = Some(ast::parse_filter(value, limits.max_filter_len, limits.max_filter_nodes)?);
                        q.filter_text = Some(value.to_string());
                    }
                }
                "$orderby" => q.orderby = parse_orderby(value, limits.max_orderby_keys)?,
                "$top" => {
                    let top = parse_number("$top", value)?;
                    q.top = top.clamp(1, limits.max_top);
                }
                "$skip" => q.skip = parse_skip(value)?,
                "$select" => q.select = parse_select(value)?,
                "$expand" => q.expand = parse_list("$expand", value)?,
                "$count" => {
                    q.count = match value.to_ascii_lowercase().as_str() {
                        "true" => true,
                        "false" => false,
                        _ => return Err(ODataError::InvalidOption(format!("$count must be true or false, got {value:?}"))),
                    }
                }
                _ => return Err(ODataError::InvalidOption(format!("unsupported option {key}"))),
            }
        }
        Ok(q)
    }

    /// Check `$select`, `$orderby` and `$expand` names against an entity's fields.
    /// `$filter` identifiers are checked during SQL translation.
    pub fn validate_for(&self, set: EntitySet, is_field: impl Fn(&str) -> bool) -> Result<(), ODataError> {
        for nav in &self.expand {
            if !set.navigations().contains(&nav.as_str()) {
                return Err(ODataError::UnknownNavigation(format!("{} has no navigation {nav}", set.name())));
            }
        }
        for key in &self.orderby {
            if !is_field(&key.field) {
                return Err(ODataError::UnknownField(key.field.clone()));
            }
        }
        if let Some(select) = &self.select {
            for f in select {
                if !is_field(f) && !self.expand.contains(f) {
                    return Err(ODataError::UnknownField(f.clone()));
                }
            }
        }
        Ok(())
    }

    /// Stable text for cache keys: equivalent queries render identically.
    /// `$count` is left out since it does not change the page contents.
    pub fn canonical(&self) -> String {
        let mut parts = Vec::new();
        if !self.expand.is_empty() {
            let mut e = self.expand.clone();
            e.sort();
            parts.push(format!("$expand={}", e.join(",")));
        }
        if let Some(f) = &self.filter {
            parts.push(format!("$filter={f}"));
        }
        if !self.orderby.is_empty() {
            parts.push(format!("$orderby={}", self.orderby_text()));
        }
        if let Some(select) = &self.select {
            let mut s = select.clone();
            s.sort();
            parts.push(format!("$select={}", s.join(",")));
        }
        parts.push(format!("$skip={}", self.skip));
        parts.push(format!("$top={}", self.top));
        parts.join("&")
    }

    /// `<EntitySet>?...` link to the page starting at `next_skip`, preserving every other option.
    pub fn next_link(&self, set: EntitySet, next_skip: u64) -> String {
        let mut parts = Vec::new();
        if let Some(f) = &self.filter_text {
            parts.push(format!("$filter={}", urlencoding::encode(f)));
        }
        if !self.orderby.is_empty() {
            parts.push(format!("$orderby={}", urlencoding::encode(&self.orderby_text())));
        }
        if let Some(select) = &self.select {
            parts.push(format!("$select={}", urlencoding::encode(&select.join(","))));
        }
        if !self.expand.is_empty() {
            parts.push(format!("$expand={}", urlencoding::encode(&self.expand.join(","))));
        }
        if self.count {
            parts.push("$count=true".to_string());
        }
        parts.push(format!("$top={}", self.top));
        parts.push(format!("$skip={next_skip}"));
        format!("{}?{}", set.name(), parts.join("&"))
    }

    fn orderby_text(&self) -> String {
        self.orderby
            .iter()
            .map(|k| format!("{} {}", k.field, k.dir.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn parse_number(option: &str, raw: &str) -> Result<u64, ODataError> {
    raw.parse::<u64>()
        .map_err(|_| ODataError::InvalidOption(format!("{option} must be a non-negative integer, got {raw:?}")))
}

/// `$skip` is bound as a signed 64-bit SQL parameter.
fn parse_skip(raw: &str) -> Result<u64, ODataError> {
    let skip = parse_number("$skip", raw)?;
    if i64::try_from(skip).is_err() {
        return Err(ODataError::InvalidOption(format!("$skip must be at most {}, got {raw:?}", i64::MAX)));
    }
    Ok(skip)
}

fn parse_list(option: &str, raw: &str) -> Result<Vec<String>, ODataError> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let name = part.trim().to_lowercase();
        if name.is_empty() {
            return Err(ODataError::InvalidOption(format!("{option} contains an empty entry")));
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    Ok(out)
}

/// `*` selects everything; otherwise `id` is always kept.
fn parse_select(raw: &str) -> Result<Option<Vec<String>>, ODataError> {
    let mut fields = parse_list("$select", raw)?;
    if fields.iter().any(|f| f == "*") {
        return Ok(None);
    }
    if !fields.iter().any(|f| f == "id") {
        fields.insert(0, "id".to_string());
    }
    Ok(Some(fields))
}

fn parse_orderby(raw: &str, max_keys: usize) -> Result<Vec<OrderKey>, ODataError> {
    let mut keys: Vec<OrderKey> = Vec::new();
    if raw.is_empty() {
        return Ok(keys);
    }
    for part in raw.split(',') {
        let tokens: Vec<&str> = part.split_whitespace().collect();
        let (field, dir) = match tokens.as_slice() {
            [field] => (*field, SortDir::Asc),
            [field, dir] if dir.eq_ignore_ascii_case("asc") => (*field, SortDir::Asc),
            [field, dir] if dir.eq_ignore_ascii_case("desc") => (*field, SortDir::Desc),
            _ => return Err(ODataError::InvalidOrderBy(format!("invalid clause {:?}", part.trim()))),
        };
        let field = field.to_lowercase();
        if keys.iter().any(|k| k.field == field) {
            return Err(ODataError::InvalidOrderBy(format!("{field} ordered more than once")));
        }
        keys.push(OrderKey { field, dir });
    }
    if keys.len() > max_keys {
        return Err(ODataError::LimitExceeded(format!("$orderby allows at most {max_keys} keys")));
    }
    Ok(keys)
}
