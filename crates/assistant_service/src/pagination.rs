use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Cursor parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub order: Option<Order>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl Pagination {
    #[must_use]
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn newest_first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            order: Some(Order::Desc),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    #[must_use]
    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    /// Query pairs for the parameters that are set, in a stable key order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(after) = self.after.as_deref().filter(|value| !value.is_empty()) {
            pairs.push(("after", after.to_string()));
        }
        if let Some(before) = self.before.as_deref().filter(|value| !value.is_empty()) {
            pairs.push(("before", before.to_string()));
        }
        if let Some(limit) = self.limit.filter(|value| *value > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::{Order, Pagination};

    #[test]
    fn empty_pagination_encodes_no_pairs() {
        assert!(Pagination::default().query_pairs().is_empty());
        assert!(Pagination::limit(0).query_pairs().is_empty());
    }

    #[test]
    fn set_parameters_are_encoded_in_key_order() {
        let pagination = Pagination::newest_first(20)
            .with_after("msg_9")
            .with_before("msg_1");

        assert_eq!(
            pagination.query_pairs(),
            vec![
                ("after", "msg_9".to_string()),
                ("before", "msg_1".to_string()),
                ("limit", "20".to_string()),
                ("order", "desc".to_string()),
            ]
        );
        assert_eq!(Order::Asc.as_str(), "asc");
    }
}
