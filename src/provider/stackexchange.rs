use crate::config::ProviderConfig;
use crate::ids::{Batch, SourceRecord};
use crate::provider::Identified;
use serde::Deserialize;
use url::Url;

/// Answers are always requested at the provider's maximum page size
const ANSWERS_PAGE_SIZE: usize = 100;

/// Request builder for the Stack Exchange API
#[derive(Debug, Clone)]
pub struct StackExchange {
    api_base: String,
    site: String,
    tagged: Option<String>,
    page_size: u32,
    listing_filter: String,
    detail_filter: String,
    key: Option<String>,
}

impl StackExchange {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            site: config.site.clone(),
            tagged: config.tagged.clone(),
            page_size: config.page_size,
            listing_filter: config.listing_filter.clone(),
            detail_filter: config.detail_filter.clone(),
            key: config.key.clone(),
        }
    }

    /// Newest-first listing of questions
    pub fn listing_url(&self, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/questions", self.api_base))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("order", "desc")
                .append_pair("sort", "creation")
                .append_pair("site", &self.site)
                .append_pair("pagesize", &self.page_size.to_string())
                .append_pair("page", &page.to_string())
                .append_pair("filter", &self.listing_filter);
            if let Some(tag) = &self.tagged {
                query.append_pair("tagged", tag);
            }
        }
        self.with_key(url)
    }

    /// Vectorized detail request for every member of `batch`
    pub fn details_url(&self, batch: &Batch) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/questions/{}",
            self.api_base,
            batch.joined_ids()
        ))?;
        url.query_pairs_mut()
            .append_pair("site", &self.site)
            .append_pair("pagesize", &batch.len().to_string())
            .append_pair("filter", &self.detail_filter);
        self.with_key(url)
    }

    /// One page of answers for a single question
    pub fn answers_url(&self, question_id: &str, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/questions/{}/answers",
            self.api_base, question_id
        ))?;
        url.query_pairs_mut()
            .append_pair("order", "desc")
            .append_pair("sort", "creation")
            .append_pair("site", &self.site)
            .append_pair("page", &page.to_string())
            .append_pair("pagesize", &ANSWERS_PAGE_SIZE.to_string())
            .append_pair("filter", &self.detail_filter);
        self.with_key(url)
    }

    /// Turns a listing item into a candidate for deduplication
    pub fn source_record(&self, question: &ApiQuestion) -> SourceRecord {
        let url = if question.link.is_empty() {
            format!("{}/questions/{}", self.api_base, question.question_id)
        } else {
            question.link.clone()
        };
        SourceRecord::new(question.identifier(), url)
    }

    fn with_key(&self, mut url: Url) -> Result<Url, url::ParseError> {
        if let Some(key) = &self.key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

/// A question as returned by `/questions` and `/questions/{ids}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuestion {
    pub question_id: u64,
    #[serde(default)]
    pub title: String,
    /// Only present with a body-carrying filter
    #[serde(default)]
    pub body: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub creation_date: i64,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub answer_count: u32,
    #[serde(default)]
    pub owner: Option<ApiOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOwner {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// An answer as returned by `/questions/{id}/answers`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAnswer {
    pub answer_id: u64,
    pub question_id: u64,
    #[serde(default)]
    pub body: String,
}

impl Identified for ApiQuestion {
    fn identifier(&self) -> String {
        self.question_id.to_string()
    }
}

impl Identified for ApiAnswer {
    fn identifier(&self) -> String {
        self.answer_id.to_string()
    }
}
