use crate::ids::SourceRecord;
use crate::{ExtractError, ExtractResult};
use url::Url;

/// Derives provider identifiers from source URLs
///
/// Each pattern is a path keyword; the identifier is the segment right after
/// it. Patterns are tried in order and the first match wins, so
/// `["questions", "question"]` maps both
/// `https://stackoverflow.com/questions/123/title` and
/// `https://answers.ros.org/question/123/title/` to `123`.
///
/// With no patterns the identifier is the last non-empty path segment.
#[derive(Debug, Clone)]
pub struct IdExtractor {
    patterns: Vec<String>,
    kind: IdKind,
}

/// What an identifier segment looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// ASCII digits, canonicalized so `0123` and `123` are the same identifier
    Numeric,
    /// Any non-empty segment, kept as written
    Name,
}

impl IdKind {
    fn canonical(self, segment: &str) -> Option<String> {
        match self {
            Self::Numeric => {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                segment.parse::<u64>().ok().map(|id| id.to_string())
            }
            Self::Name => Some(segment.to_string()).filter(|s| !s.is_empty()),
        }
    }
}

/// Outcome of extracting identifiers from a list of URLs
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    /// Records in input order
    pub records: Vec<SourceRecord>,
    /// URLs no identifier could be derived from
    pub rejected: Vec<String>,
}

impl IdExtractor {
    /// Numeric identifiers following any of `patterns`
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(patterns, IdKind::Numeric)
    }

    pub fn with_kind<I, S>(patterns: I, kind: IdKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    /// Identifier is the last non-empty path segment
    pub fn last_segment(kind: IdKind) -> Self {
        Self::with_kind(Vec::<String>::new(), kind)
    }

    /// Extracts the identifier from one URL
    ///
    /// # Examples
    ///
    /// ```
    /// use qa_harvest::IdExtractor;
    ///
    /// let extractor = IdExtractor::new(["questions", "question"]);
    /// let id = extractor
    ///     .extract("https://stackoverflow.com/questions/7/how-do-i")
    ///     .unwrap();
    /// assert_eq!(id, "7");
    /// ```
    pub fn extract(&self, raw: &str) -> ExtractResult<String> {
        let url = Url::parse(raw.trim()).map_err(|e| ExtractError::Parse(e.to_string()))?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        if self.patterns.is_empty() {
            return segments
                .iter()
                .rev()
                .find(|segment| !segment.is_empty())
                .and_then(|segment| self.kind.canonical(segment))
                .ok_or_else(|| ExtractError::NoMatch(raw.to_string()));
        }

        for pattern in &self.patterns {
            let candidate = segments
                .windows(2)
                .find(|pair| pair[0] == pattern.as_str())
                .and_then(|pair| self.kind.canonical(pair[1]));

            if let Some(id) = candidate {
                return Ok(id);
            }
        }

        Err(ExtractError::NoMatch(raw.to_string()))
    }

    /// Extracts identifiers from every URL, skipping the ones that fail
    pub fn extract_all<I, S>(&self, urls: I) -> Extracted
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extracted = Extracted::default();

        for raw in urls {
            let raw = raw.as_ref();
            match self.extract(raw) {
                Ok(identifier) => extracted
                    .records
                    .push(SourceRecord::new(identifier, raw.trim())),
                Err(e) => {
                    tracing::warn!("Skipping source URL: {}", e);
                    extracted.rejected.push(raw.to_string());
                }
            }
        }

        extracted
    }
}
