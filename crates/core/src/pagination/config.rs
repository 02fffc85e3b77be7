use serde::{Deserialize, Serialize};

/// Pagination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// Rows per page when the request does not say otherwise.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard cap on rows per page, bounding result-set size and memory.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PageConfig {
    /// Preset for the ticket-list views, which show 20 rows per page.
    pub fn ticket_list() -> Self {
        Self {
            page_size: 20,
            ..Self::default()
        }
    }
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(PageConfig::default().page_size, 50);
        assert_eq!(PageConfig::ticket_list().page_size, 20);
        assert_eq!(PageConfig::ticket_list().max_page_size, 200);
    }
}
