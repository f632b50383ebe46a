// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Wikidata query client.
//!
//! The remote authoritative source for observance days, implementing
//! [`ReadableSource`] over the Wikidata SPARQL query service. Each query
//! selects the entity, its localized label and its annual recurrence;
//! detailed queries additionally project the Wikipedia article URL, the
//! inception date and the founder label.
//!
//! Results are requested as `application/sparql-results+json` and parsed
//! from the standard `results.bindings` layout. A non-2xx answer is a
//! source failure; an empty binding list is simply an empty result.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ReadableSource, SourceError};
use crate::config::EngineConfig;
use crate::event::{Event, EventDetails, MonthDay};

/// Basic projection: entity, label, month, day of month.
const SELECT_BASIC: &str = "?day ?dayLabel ?month ?dayOfMonth";

/// Detailed projection: article URL, inception date, founder label.
const SELECT_DETAILED: &str = "?article ?inception ?founderLabel";

/// Core pattern: ?day is an observance day recurring on the
/// ?dayOfMonth-th day of the ?month-th Gregorian month.
const WHERE_BASIC: &str = "?day wdt:P31/wdt:P279* wd:Q2558684. \
     ?day wdt:P837 ?dayOfYear. \
     ?dayOfYear p:P361 [ps:P361 ?calMonth; pq:P1545 ?dayOfMonth]. \
     ?calMonth p:P279 [ps:P279 wd:Q18602249; pq:P1545 ?month]. ";

/// List ordering: (month, day) ascending.
const ORDER_BY_DATE: &str = "xsd:integer(?month) xsd:integer(?dayOfMonth)";

fn label_clause(language: &str) -> String {
    format!("?day rdfs:label ?dayLabel filter (lang(?dayLabel) = \"{language}\"). ")
}

fn detail_clauses(language: &str) -> String {
    format!(
        "OPTIONAL {{ ?day wdt:P571 ?inception. }} \
         OPTIONAL {{ ?day wdt:P112 ?founder. \
         ?founder rdfs:label ?founderLabel filter (lang(?founderLabel) = \"{language}\"). }} "
    )
}

fn article_clause(language: &str) -> String {
    format!(
        "OPTIONAL {{ \
         ?article schema:about ?day. \
         ?article schema:inLanguage \"{language}\". }}"
    )
}

fn title_filter(language: &str, needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "?day rdfs:label ?dayLabel \
         filter (lang(?dayLabel) = \"{language}\" && \
         CONTAINS(LCASE(?dayLabel), LCASE(\"{escaped}\")))."
    )
}

/// SPARQL SELECT assembly.
#[derive(Default)]
struct SparqlQuery {
    select: Vec<String>,
    patterns: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u32>,
}

impl SparqlQuery {
    fn new() -> Self {
        Self::default()
    }

    fn select(mut self, columns: impl Into<String>) -> Self {
        self.select.push(columns.into());
        self
    }

    fn pattern(mut self, clause: impl Into<String>) -> Self {
        self.patterns.push(clause.into());
        self
    }

    fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by.push(clause.into());
        self
    }

    fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn build(self) -> String {
        let mut query = format!(
            "SELECT {} WHERE {{{}}}",
            self.select.join(" "),
            self.patterns.join(" ")
        );
        if !self.order_by.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(&self.order_by.join(" "));
        }
        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }
        query
    }
}

/// Read-only client for the Wikidata SPARQL endpoint.
pub struct WikidataSource {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl WikidataSource {
    /// Build a client from config (endpoint, query language, user agent,
    /// timeout).
    pub fn new(config: &EngineConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self::with_client(
            client,
            config.query_endpoint.clone(),
            config.language.clone(),
        ))
    }

    /// Build from an existing [`reqwest::Client`], sharing its connection
    /// pool with other sources.
    pub fn with_client(client: reqwest::Client, endpoint: String, language: String) -> Self {
        Self {
            client,
            endpoint,
            language,
        }
    }

    fn event_query(&self, id: &str, with_details: bool) -> String {
        let mut query = SparqlQuery::new()
            .select(SELECT_BASIC)
            .pattern(format!("BIND (wd:{id} AS ?day)."))
            .pattern(label_clause(&self.language))
            .pattern(WHERE_BASIC)
            .limit(1);
        if with_details {
            query = query
                .select(SELECT_DETAILED)
                .pattern(detail_clauses(&self.language))
                .pattern(article_clause(&self.language))
                .order_by("?inception");
        }
        query.build()
    }

    fn all_query(&self) -> String {
        SparqlQuery::new()
            .select(SELECT_BASIC)
            .pattern(label_clause(&self.language))
            .pattern(WHERE_BASIC)
            .order_by(ORDER_BY_DATE)
            .build()
    }

    fn title_query(&self, needle: &str) -> String {
        SparqlQuery::new()
            .select(SELECT_BASIC)
            .pattern(WHERE_BASIC)
            .pattern(title_filter(&self.language, needle))
            .order_by(ORDER_BY_DATE)
            .build()
    }

    fn month_query(&self, month: u8) -> String {
        SparqlQuery::new()
            .select(SELECT_BASIC)
            .pattern(label_clause(&self.language))
            .pattern(format!("BIND (\"{month}\" AS ?month)."))
            .pattern(WHERE_BASIC)
            .order_by(ORDER_BY_DATE)
            .build()
    }

    async fn execute(&self, query: String) -> Result<Value, SourceError> {
        debug!(endpoint = %self.endpoint, "executing sparql query");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query.as_str())])
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))
    }

    fn parse_events(body: &Value, with_details: bool) -> Result<Vec<Event>, SourceError> {
        let bindings = body
            .pointer("/results/bindings")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Malformed("missing results.bindings".into()))?;
        bindings
            .iter()
            .map(|binding| Self::parse_binding(binding, with_details))
            .collect()
    }

    fn parse_binding(binding: &Value, with_details: bool) -> Result<Event, SourceError> {
        let entity = required_value(binding, "day")?;
        // http://www.wikidata.org/entity/Q5305947 → Q5305947
        let id = entity
            .rsplit('/')
            .next()
            .unwrap_or(entity.as_str())
            .to_string();

        let title = required_value(binding, "dayLabel")?;
        let month = parse_number(&required_value(binding, "month")?)?;
        let day = parse_number(&required_value(binding, "dayOfMonth")?)?;
        let month_day =
            MonthDay::new(month, day).map_err(|e| SourceError::Malformed(e.to_string()))?;

        if !with_details {
            return Ok(Event::basic(id, title, month_day));
        }

        let inception = binding_value(binding, "inception")
            .map(|s| parse_inception(&s))
            .transpose()?;
        Ok(Event::detailed(
            id,
            title,
            month_day,
            EventDetails {
                article_url: binding_value(binding, "article"),
                article_intro: None,
                inception,
                founder: binding_value(binding, "founderLabel"),
            },
        ))
    }
}

fn binding_value(binding: &Value, name: &str) -> Option<String> {
    binding
        .get(name)?
        .get("value")?
        .as_str()
        .map(String::from)
}

fn required_value(binding: &Value, name: &str) -> Result<String, SourceError> {
    binding_value(binding, name)
        .ok_or_else(|| SourceError::Malformed(format!("missing binding '{name}'")))
}

fn parse_number(text: &str) -> Result<u8, SourceError> {
    text.parse()
        .map_err(|_| SourceError::Malformed(format!("expected a number, got '{text}'")))
}

/// Inception values arrive as full timestamps
/// (`1993-01-01T00:00:00Z`); only the date part is kept.
fn parse_inception(text: &str) -> Result<chrono::NaiveDate, SourceError> {
    let date_part = match text.split_once('T') {
        Some((date, _)) => date,
        None => text,
    };
    chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| SourceError::Malformed(format!("bad inception '{text}': {e}")))
}

#[async_trait]
impl ReadableSource for WikidataSource {
    async fn get_by_id(
        &self,
        id: &str,
        with_details: bool,
    ) -> Result<Option<Event>, SourceError> {
        let body = self.execute(self.event_query(id, with_details)).await?;
        Ok(Self::parse_events(&body, with_details)?.into_iter().next())
    }

    async fn get_all(&self) -> Result<Vec<Event>, SourceError> {
        let body = self.execute(self.all_query()).await?;
        Self::parse_events(&body, false)
    }

    async fn get_by_title(&self, needle: &str) -> Result<Vec<Event>, SourceError> {
        let body = self.execute(self.title_query(needle)).await?;
        Self::parse_events(&body, false)
    }

    async fn get_by_month(&self, month: u8) -> Result<Vec<Event>, SourceError> {
        let body = self.execute(self.month_query(month)).await?;
        Self::parse_events(&body, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> WikidataSource {
        WikidataSource::with_client(
            reqwest::Client::new(),
            "https://query.wikidata.org/sparql".into(),
            "en".into(),
        )
    }

    #[test]
    fn test_event_query_binds_id_and_limits() {
        let query = source().event_query("Q5305947", false);
        assert!(query.starts_with("SELECT ?day ?dayLabel ?month ?dayOfMonth WHERE {"));
        assert!(query.contains("BIND (wd:Q5305947 AS ?day)."));
        assert!(query.ends_with("LIMIT 1"));
        assert!(!query.contains("?article"));
    }

    #[test]
    fn test_event_query_detailed_projects_details() {
        let query = source().event_query("Q5305947", true);
        assert!(query.contains("?article ?inception ?founderLabel"));
        assert!(query.contains("wdt:P571"));
        assert!(query.contains("schema:about"));
        assert!(query.contains("ORDER BY ?inception"));
    }

    #[test]
    fn test_title_query_escapes_quotes() {
        let query = source().title_query("say \"day\"");
        assert!(query.contains("LCASE(\"say \\\"day\\\"\")"));
        assert!(query.contains("ORDER BY xsd:integer(?month) xsd:integer(?dayOfMonth)"));
    }

    #[test]
    fn test_month_query_binds_month() {
        let query = source().month_query(3);
        assert!(query.contains("BIND (\"3\" AS ?month)."));
    }

    #[test]
    fn test_queries_filter_by_language() {
        let source = WikidataSource::with_client(
            reqwest::Client::new(),
            "https://query.wikidata.org/sparql".into(),
            "fr".into(),
        );
        assert!(source.all_query().contains("lang(?dayLabel) = \"fr\""));
    }

    fn binding(id: &str, title: &str, month: &str, day: &str) -> Value {
        json!({
            "day": {"type": "uri", "value": format!("http://www.wikidata.org/entity/{id}")},
            "dayLabel": {"type": "literal", "value": title},
            "month": {"type": "literal", "value": month},
            "dayOfMonth": {"type": "literal", "value": day},
        })
    }

    #[test]
    fn test_parse_basic_results() {
        let body = json!({
            "results": {
                "bindings": [
                    binding("Q5305947", "International Day of Happiness", "3", "20"),
                    binding("Q1318119", "World Water Day", "3", "22"),
                ]
            }
        });
        let events = WikidataSource::parse_events(&body, false).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id(), "Q5305947");
        assert_eq!(events[0].title(), "International Day of Happiness");
        assert_eq!(events[0].month_day().month(), 3);
        assert_eq!(events[0].month_day().day(), 20);
        assert!(!events[0].is_detailed());
    }

    #[test]
    fn test_parse_empty_results_is_not_an_error() {
        let body = json!({"results": {"bindings": []}});
        assert!(WikidataSource::parse_events(&body, false).unwrap().is_empty());
    }

    #[test]
    fn test_parse_detailed_result() {
        let mut b = binding("Q5305947", "International Day of Happiness", "3", "20");
        b["article"] = json!({"type": "uri",
            "value": "https://en.wikipedia.org/wiki/International_Day_of_Happiness"});
        b["inception"] = json!({"type": "literal", "value": "2012-06-28T00:00:00Z"});
        b["founderLabel"] = json!({"type": "literal", "value": "United Nations"});
        let body = json!({"results": {"bindings": [b]}});

        let events = WikidataSource::parse_events(&body, true).unwrap();
        let details = events[0].details().unwrap();
        assert_eq!(
            details.article_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/International_Day_of_Happiness")
        );
        assert_eq!(
            details.inception,
            chrono::NaiveDate::from_ymd_opt(2012, 6, 28)
        );
        assert_eq!(details.founder.as_deref(), Some("United Nations"));
        assert!(details.article_intro.is_none());
    }

    #[test]
    fn test_parse_detailed_result_with_missing_optionals_is_still_detailed() {
        let body = json!({"results": {"bindings": [
            binding("Q1", "Some Day", "1", "5"),
        ]}});
        let events = WikidataSource::parse_events(&body, true).unwrap();
        assert!(events[0].is_detailed());
        assert!(events[0].details().unwrap().article_url.is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert!(WikidataSource::parse_events(&json!({}), false).is_err());

        let body = json!({"results": {"bindings": [
            binding("Q1", "Bad Month", "13", "5"),
        ]}});
        assert!(WikidataSource::parse_events(&body, false).is_err());

        let body = json!({"results": {"bindings": [
            {"dayLabel": {"value": "No entity"}}
        ]}});
        assert!(WikidataSource::parse_events(&body, false).is_err());
    }
}
