//! Filter state persisted in the query string (`?prefix=...&reversed=true|false`).

use reqwest::Url;

use crate::pagination::PageFilter;

const QUERY_BASE: &str = "http://localhost/";

/// Listing view state that survives a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Index prefix; empty means "use the account address".
    pub prefix: String,
    /// Descending order.
    pub reversed: bool,
}

impl ViewState {
    /// Read from a query string, with or without the leading `?`. Unknown keys are ignored;
    /// `reversed` is true only for the literal `true`.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut state = Self::default();
        let Ok(mut url) = Url::parse(QUERY_BASE) else {
            return state;
        };
        url.set_query(Some(query.trim_start_matches('?')));
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "prefix" => state.prefix = value.into_owned(),
                "reversed" => state.reversed = value == "true",
                _ => {}
            }
        }
        state
    }

    /// Encode as `prefix=...&reversed=...` (no leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        let Ok(mut url) = Url::parse(QUERY_BASE) else {
            return String::new();
        };
        url.query_pairs_mut()
            .append_pair("prefix", &self.prefix)
            .append_pair("reversed", if self.reversed { "true" } else { "false" });
        url.query().unwrap_or_default().to_string()
    }

    #[must_use]
    pub fn filter(&self) -> PageFilter {
        PageFilter::new(self.prefix.clone(), self.reversed)
    }
}

impl From<&PageFilter> for ViewState {
    fn from(filter: &PageFilter) -> Self {
        Self {
            prefix: filter.prefix.clone(),
            reversed: filter.reversed,
        }
    }
}
