//! Request-scoped context
//!
//! Every outbound request carries a `RequestContext` naming what it was sent
//! for. The scheduler hands it back untouched with the response, so the
//! coordinator never has to work out from a URL which batch or question a
//! response belongs to.

use crate::crawler::parser::{BlockKind, BodyCleaner};
use crate::ids::{Batch, SourceRecord};
use crate::output::{format_timestamp, OutputRecord, QuestionRecord};
use crate::provider::ApiQuestion;

/// What an in-flight request was sent for
#[derive(Debug, Clone)]
pub enum RequestContext {
    /// A page of the newest-questions listing
    Listing { page: u32 },

    /// Detail lookup for every member of the batch
    Batch(Batch),

    /// A page of answers completing `partial`
    Answers { partial: PartialRecord, page: u32 },

    /// The package list of the index
    Packages,

    /// The forum's category list, fetched to resolve the configured slug
    Categories,

    /// A page of forum topics
    Topics { page: u32 },

    /// One wiki package page
    WikiPage(Batch),

    /// One forum topic with its posts
    Topic(Batch),
}

impl RequestContext {
    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            Self::Listing { page } => format!("listing page {}", page),
            Self::Batch(batch) => format!("batch of {}", batch.len()),
            Self::Answers { partial, page } => {
                format!("answers page {} for {}", page, partial.source().identifier)
            }
            Self::Packages => "package list".to_string(),
            Self::Categories => "category list".to_string(),
            Self::Topics { page } => format!("topics page {}", page),
            Self::WikiPage(batch) => format!("wiki page {}", batch.joined_ids()),
            Self::Topic(batch) => format!("topic {}", batch.joined_ids()),
        }
    }
}

/// A question record waiting for its answers
#[derive(Debug, Clone)]
pub struct PartialRecord {
    source: SourceRecord,
    record: QuestionRecord,
}

impl PartialRecord {
    /// Builds the question fields; the answer lists start empty
    pub fn from_question(
        source: SourceRecord,
        question: &ApiQuestion,
        cleaner: &dyn BodyCleaner,
    ) -> Self {
        let body = question.body.as_deref().unwrap_or_default();
        let record = QuestionRecord {
            title: cleaner.clean_text(&question.title),
            time: format_timestamp(question.creation_date),
            post_content: vec![cleaner.clean_text(body)],
            question_code: cleaner.extract_blocks(body, BlockKind::Code),
            quote: cleaner.extract_blocks(body, BlockKind::Quote),
            question_details: cleaner.extract_blocks(body, BlockKind::ListItem),
            url: source.source_url.clone(),
            answer: Vec::new(),
            answer_code: Vec::new(),
        };
        Self { source, record }
    }

    pub fn source(&self) -> &SourceRecord {
        &self.source
    }

    /// Appends one answer body
    pub fn attach_answer(&mut self, body: &str, cleaner: &dyn BodyCleaner) {
        self.record.answer.push(cleaner.clean_text(body));
        self.record
            .answer_code
            .extend(cleaner.extract_blocks(body, BlockKind::Code));
    }

    pub fn answer_count(&self) -> usize {
        self.record.answer.len()
    }

    /// Completes the record for emission
    pub fn finalize(self) -> OutputRecord {
        OutputRecord::Question(self.record)
    }

    /// Gives up on the record, keeping its source for missing-id accounting
    pub fn into_source(self) -> SourceRecord {
        self.source
    }
}
