//! Built-in registry of harvest sources.
//!
//! Each entry describes one government/utility site: where to start, which
//! anchor-text keywords mark a link as relevant, and the logical storage
//! folder its documents land under.

use energydocs_shared::{EnergyDocsError, Result};
use url::Url;

/// One configured harvest source.
#[derive(Debug, Clone)]
pub struct SourceSite {
    /// Closed-set site identifier, e.g. `EGAT`.
    pub organization: String,
    /// Base URL that `/`-prefixed hrefs resolve against.
    pub base_url: String,
    /// The Thai-language landing page the crawl starts from.
    pub start_url: String,
    /// Anchor text must contain at least one of these to be admitted.
    pub keywords: Vec<String>,
    /// Logical storage path hint for admitted documents.
    pub folder_path: String,
}

impl SourceSite {
    pub fn new(
        organization: impl Into<String>,
        base_url: impl Into<String>,
        start_url: impl Into<String>,
        keywords: &[&str],
        folder_path: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            base_url: base_url.into(),
            start_url: start_url.into(),
            keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
            folder_path: folder_path.into(),
        }
    }

    /// Parsed base URL.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            EnergyDocsError::config(format!(
                "source {}: invalid base_url '{}': {e}",
                self.organization, self.base_url
            ))
        })
    }

    /// Case-insensitive substring match against the source keywords.
    pub fn is_relevant(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(&kw.to_lowercase()))
    }
}

/// The fixed set of Thai energy-sector sources.
pub fn default_sources() -> Vec<SourceSite> {
    vec![
        SourceSite::new(
            "EGAT",
            "https://www.egat.co.th",
            "https://www.egat.co.th/th/",
            &["กฎระเบียบ", "มาตรฐาน", "เทคนิค", "ระบบไฟฟ้า", "โครงข่าย"],
            "State_Enterprises/EGAT/",
        ),
        SourceSite::new(
            "PEA",
            "https://www.pea.co.th",
            "https://www.pea.co.th/th/",
            &["บริการ", "มาตรฐาน", "ระเบียบ", "จำหน่าย", "ไฟฟ้า"],
            "State_Enterprises/PEA/",
        ),
        SourceSite::new(
            "MEA",
            "https://www.mea.or.th",
            "https://www.mea.or.th/th/",
            &["กฎหมาย", "ระเบียบ", "กรุงเทพ", "มหานคร", "ไฟฟ้า"],
            "State_Enterprises/MEA/",
        ),
        SourceSite::new(
            "Ministry_of_Energy",
            "https://www.energy.go.th",
            "https://www.energy.go.th/th/",
            &["นโยบาย", "แผน", "ยุทธศาสตร์", "พลังงาน", "กระทรวง"],
            "Government_Agencies/Ministry_of_Energy/",
        ),
        SourceSite::new(
            "ERC",
            "https://www.erc.or.th",
            "https://www.erc.or.th/th/",
            &["กฎระเบียบ", "ใบอนุญาต", "พลังงาน", "กำกับ", "คณะกรรมการ"],
            "Government_Agencies/ERC_Energy_Regulatory_Commission/",
        ),
        SourceSite::new(
            "EPPO",
            "https://www.eppo.go.th",
            "https://www.eppo.go.th/index.php/th/",
            &["นโยบาย", "แผน", "พลังงาน", "สถิติ", "รายงาน"],
            "Government_Agencies/NEPC_National_Energy_Policy_Council/",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_urls_parse() {
        let sources = default_sources();
        assert_eq!(sources.len(), 6);
        for source in &sources {
            assert_eq!(source.base().expect("base url").scheme(), "https");
            assert!(Url::parse(&source.start_url).is_ok(), "{}", source.organization);
            assert!(!source.keywords.is_empty());
            assert!(source.folder_path.ends_with('/'));
        }
    }

    #[test]
    fn relevance_is_substring_based() {
        let sources = default_sources();
        let egat = &sources[0];
        assert!(egat.is_relevant("มาตรฐานการเชื่อมต่อระบบโครงข่ายไฟฟ้า"));
        assert!(!egat.is_relevant("ข่าวประชาสัมพันธ์"));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let source = SourceSite::new("X", "not a url", "not a url", &["ไฟฟ้า"], "X/");
        assert!(source.base().is_err());
    }
}
