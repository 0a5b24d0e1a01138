use crate::config::WikiConfig;
use crate::crawler::BodyCleaner;
use crate::ids::{Batch, SourceRecord};
use crate::output::WikiRecord;
use crate::provider::{Identified, Page, PageMeta, ProviderResponse};
use url::Url;

/// Paragraph classes the wiki uses for the package header block
const DETAIL_SELECTORS: [&str; 2] = ["#content > p.line867", "#content > p.line862"];

/// Request builder and page reader for ROS wiki package pages
#[derive(Debug, Clone)]
pub struct RosWiki {
    base: String,
    versions: Vec<String>,
}

/// What a package page says about the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    pub package: String,
    /// Summary paragraphs of the first version tab that has any
    pub summary: Vec<String>,
    pub details: Vec<String>,
}

impl Identified for WikiPage {
    fn identifier(&self) -> String {
        self.package.clone()
    }
}

impl RosWiki {
    pub fn from_config(config: &WikiConfig) -> Self {
        Self {
            base: config.base.trim_end_matches('/').to_string(),
            versions: config.versions.clone(),
        }
    }

    /// Candidate for the page of `package`
    pub fn seed(&self, package: &str) -> SourceRecord {
        SourceRecord::new(package, format!("{}/{}", self.base, package))
    }

    /// Page request for a single-member batch
    pub fn page_url(&self, batch: &Batch) -> Result<Url, url::ParseError> {
        let source = batch
            .members()
            .first()
            .map(|member| member.source_url.as_str())
            .unwrap_or_default();
        Url::parse(source)
    }

    /// Reads the summary and detail paragraphs of a package page
    pub fn read_page(&self, package: &str, html: &str, cleaner: &dyn BodyCleaner) -> WikiPage {
        let summary = self
            .versions
            .iter()
            .map(|version| {
                cleaner.select_text(
                    html,
                    &format!(
                        "#content div.version.{} p[id^=\"package-info-\"]",
                        version
                    ),
                )
            })
            .find(|paragraphs| !paragraphs.is_empty())
            .unwrap_or_default();

        let details = DETAIL_SELECTORS
            .iter()
            .flat_map(|selector| cleaner.select_text(html, selector))
            .collect();

        WikiPage {
            package: package.to_string(),
            summary,
            details,
        }
    }

    /// Any page the server returns is a result, even one without package content
    pub fn parse_page(
        &self,
        package: &str,
        html: &str,
        cleaner: &dyn BodyCleaner,
    ) -> ProviderResponse<WikiPage> {
        ProviderResponse::Success(Page {
            items: vec![self.read_page(package, html, cleaner)],
            meta: PageMeta::default(),
        })
    }

    pub fn record(&self, source: SourceRecord, page: WikiPage) -> WikiRecord {
        WikiRecord {
            url: source.source_url,
            package: page.package,
            package_summary: page.summary,
            package_details: page.details,
        }
    }
}
