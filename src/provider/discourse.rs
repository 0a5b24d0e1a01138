use crate::config::ForumConfig;
use crate::crawler::{BlockKind, BodyCleaner};
use crate::ids::{Batch, SourceRecord};
use crate::output::TopicRecord;
use crate::provider::{Identified, Page, PageMeta, ProviderErrorKind, ProviderResponse};
use serde::Deserialize;
use url::Url;

/// Request builder and record mapper for a Discourse forum
#[derive(Debug, Clone)]
pub struct Discourse {
    base: String,
    category: String,
}

impl Discourse {
    pub fn from_config(config: &ForumConfig) -> Self {
        Self {
            base: config.base.trim_end_matches('/').to_string(),
            category: config.category.trim().to_string(),
        }
    }

    /// Configured category slug; empty for the site-wide list
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn categories_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}/categories.json", self.base))
    }

    /// Finds the configured category by slug, or by its name written as a slug
    pub fn resolve<'a>(&self, categories: &'a [ForumCategory]) -> Option<&'a ForumCategory> {
        if self.category.is_empty() {
            return None;
        }
        categories.iter().find(|c| {
            c.slug == self.category || c.name.to_lowercase().replace(' ', "-") == self.category
        })
    }

    /// One page of the category's topics, or of the latest topics without a category
    ///
    /// `page` counts from 1; the forum counts from 0.
    pub fn topics_url(
        &self,
        category: Option<&ForumCategory>,
        page: u32,
    ) -> Result<Url, url::ParseError> {
        let mut url = match category {
            Some(category) => Url::parse(&format!(
                "{}/c/{}/{}.json",
                self.base, category.slug, category.id
            ))?,
            None => Url::parse(&format!("{}/latest.json", self.base))?,
        };
        url.query_pairs_mut()
            .append_pair("page", &page.saturating_sub(1).to_string());
        Ok(url)
    }

    /// Turns a listed topic into a candidate
    pub fn source_record(&self, topic: &TopicSummary) -> SourceRecord {
        let url = if topic.slug.is_empty() {
            format!("{}/t/{}", self.base, topic.id)
        } else {
            format!("{}/t/{}/{}", self.base, topic.slug, topic.id)
        };
        SourceRecord::new(topic.identifier(), url)
    }

    /// Topic request for a single-member batch
    pub fn topic_url(&self, batch: &Batch) -> Result<Url, url::ParseError> {
        let id = batch
            .members()
            .first()
            .map(|member| member.identifier.as_str())
            .unwrap_or_default();
        Url::parse(&format!("{}/t/{}.json", self.base, id))
    }

    pub fn record(
        &self,
        source: SourceRecord,
        topic: &ForumTopic,
        cleaner: &dyn BodyCleaner,
    ) -> TopicRecord {
        let posts = &topic.post_stream.posts;
        TopicRecord {
            title: cleaner.clean_text(&topic.title),
            url: source.source_url,
            thread_contents: posts
                .iter()
                .flat_map(|post| cleaner.extract_blocks(&post.cooked, BlockKind::Paragraph))
                .collect(),
            thread_details: posts
                .iter()
                .flat_map(|post| cleaner.extract_blocks(&post.cooked, BlockKind::ListItem))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumCategory {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// A topic as it appears in a listing
#[derive(Debug, Clone, Deserialize)]
pub struct TopicSummary {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category_id: Option<u64>,
}

/// A topic with its posts, as returned by `/t/{id}.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ForumTopic {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub post_stream: PostStream,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostStream {
    #[serde(default)]
    pub posts: Vec<ForumPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumPost {
    /// Rendered HTML of the post
    #[serde(default)]
    pub cooked: String,
}

impl Identified for TopicSummary {
    fn identifier(&self) -> String {
        self.id.to_string()
    }
}

impl Identified for ForumTopic {
    fn identifier(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CategoriesBody {
    category_list: CategoryList,
}

#[derive(Debug, Deserialize)]
struct CategoryList {
    #[serde(default)]
    categories: Vec<ForumCategory>,
}

#[derive(Debug, Deserialize)]
struct TopicsBody {
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<TopicSummary>,
    #[serde(default)]
    more_topics_url: Option<String>,
}

/// Parses `/categories.json`
pub fn parse_categories(body: &str) -> ProviderResponse<ForumCategory> {
    match serde_json::from_str::<CategoriesBody>(body) {
        Ok(body) => page(body.category_list.categories, false),
        Err(e) => ProviderResponse::ProviderError(ProviderErrorKind::Malformed(e.to_string())),
    }
}

/// Parses a topic listing; more pages exist while the forum links to one
pub fn parse_topic_list(body: &str) -> ProviderResponse<TopicSummary> {
    match serde_json::from_str::<TopicsBody>(body) {
        Ok(body) => page(
            body.topic_list.topics,
            body.topic_list.more_topics_url.is_some(),
        ),
        Err(e) => ProviderResponse::ProviderError(ProviderErrorKind::Malformed(e.to_string())),
    }
}

fn page<T>(items: Vec<T>, has_more: bool) -> ProviderResponse<T> {
    let meta = PageMeta {
        has_more,
        ..PageMeta::default()
    };
    if items.is_empty() {
        ProviderResponse::EmptyPage(meta)
    } else {
        ProviderResponse::Success(Page { items, meta })
    }
}
