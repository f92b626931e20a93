//! In-memory document corpus and the query state searched over it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeloopError, Result};
use crate::probe::{ENTROPY, HITS, ProbeMetrics};

/// Number of query terms, exposed as a probe metric.
pub const TERMS: &str = "terms";

const STOPWORDS: &[&str] = &[
    "and", "are", "because", "for", "from", "its", "the", "this", "that", "why", "with", "without",
];

/// Lowercased alphanumeric words of three or more letters, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= 3)
        .map(str::to_lowercase)
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub id: String,
    pub topic: String,
    pub text: String,
    #[serde(skip)]
    tokens: BTreeSet<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, topic: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            topic: topic.into(),
            tokens: tokenize(&text).into_iter().collect(),
            text,
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.tokens.contains(term)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

/// Serialized form of a [`Document`]; tokens are rebuilt from the text.
#[derive(Deserialize)]
struct DocumentRecord {
    id: String,
    topic: String,
    text: String,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Self::new(record.id, record.topic, record.text)
    }
}

/// A conjunctive query and what it currently matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub terms: Vec<String>,
    pub hits: usize,
    /// Shannon entropy (bits) of the matched documents' topics
    pub entropy: f64,
    pub matches: Vec<String>,
}

impl Query {
    pub fn text(&self) -> String {
        self.terms.join(" ")
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }
}

impl ProbeMetrics for Query {
    fn metric(&self, name: &str) -> Option<f64> {
        match name {
            HITS => Some(self.hits as f64),
            ENTROPY => Some(self.entropy),
            TERMS => Some(self.terms.len() as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Parse `topic | text` lines. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut documents = Vec::new();
        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (topic, text) = line
                .split_once('|')
                .ok_or_else(|| ProbeloopError::Config(format!("corpus line {}: expected `topic | text`", n + 1)))?;
            documents.push(Document::new(
                format!("doc-{}", documents.len() + 1),
                topic.trim(),
                text.trim(),
            ));
        }
        Ok(Self::new(documents))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let corpus = Self::parse(&content)?;
        log::info!(
            "Loaded {} documents from {}",
            corpus.len(),
            path.as_ref().display()
        );
        Ok(corpus)
    }

    /// A small mixed-topic corpus with a few deliberately ambiguous words.
    pub fn sample() -> Self {
        let docs = [
            ("rust", "Rust ownership and borrowing explained for systems programmers"),
            ("rust", "Async Rust with tokio runtime and futures"),
            ("rust", "Rust error handling with thiserror and eyre"),
            ("rust", "Writing a parser in Rust with nom combinators"),
            ("cooking", "Slow cooking beef stew with red wine"),
            ("cooking", "Baking sourdough bread with a rust colored crust"),
            ("cooking", "Quick pasta sauce with garlic and tomatoes"),
            ("cooking", "Cast iron pan care to prevent rust"),
            ("astronomy", "Mars appears red because of iron oxide rust on its surface"),
            ("astronomy", "Observing the moons of Jupiter with a small telescope"),
            ("astronomy", "Why the night sky is dark: Olbers paradox"),
            ("gardening", "Treating rust fungus on roses and beans"),
            ("gardening", "Growing tomatoes in containers on a balcony"),
            ("gardening", "Composting kitchen scraps for garden soil"),
            ("systems", "Memory safety without garbage collection in systems programming"),
            ("systems", "Concurrency patterns with channels and async runtime"),
        ];
        Self::new(
            docs.iter()
                .enumerate()
                .map(|(i, (topic, text))| Document::new(format!("doc-{}", i + 1), *topic, *text))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents containing every term. No terms matches everything.
    pub fn search(&self, terms: &[String]) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|doc| terms.iter().all(|term| doc.contains(term)))
            .collect()
    }

    pub fn query(&self, terms: Vec<String>) -> Query {
        let matched = self.search(&terms);
        Query {
            hits: matched.len(),
            entropy: topic_entropy(&matched),
            matches: matched.iter().map(|doc| doc.id.clone()).collect(),
            terms,
        }
    }

    /// Query from free text, keeping the first occurrence of each term.
    pub fn query_text(&self, text: &str) -> Query {
        let mut seen = BTreeSet::new();
        let terms = tokenize(text).into_iter().filter(|term| seen.insert(term.clone())).collect();
        self.query(terms)
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.documents.iter().filter(|doc| doc.contains(term)).count()
    }

    /// Terms that would narrow `query`, most common first, ties alphabetical.
    ///
    /// A candidate appears in at least one but not all current matches.
    pub fn narrowing_terms(&self, query: &Query) -> Vec<String> {
        let matched = self.search(&query.terms);
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &matched {
            for token in doc.tokens() {
                if !query.has_term(token) {
                    *counts.entry(token).or_default() += 1;
                }
            }
        }
        let mut candidates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n < matched.len()).collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.into_iter().map(|(term, _)| term.to_string()).collect()
    }
}

fn topic_entropy(documents: &[&Document]) -> f64 {
    if documents.is_empty() {
        return 0.0;
    }
    let mut topics: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in documents {
        *topics.entry(doc.topic.as_str()).or_default() += 1;
    }
    let total = documents.len() as f64;
    topics
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}
