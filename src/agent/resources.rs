//! Resource Search
//!
//! Seam to the external resource-search collaborator plus the curated
//! fallback catalog used when no search backend is configured. Search never
//! fails outward: total failure degrades to an empty, reportable result.

use chrono::Utc;

use super::types::{ResourceLink, ResourceSearchResult};

/// Search input with the result cap clamped into range
#[derive(Debug, Clone)]
pub struct ResourceQuery {
    pub query: String,
    pub max_results: usize,
}

impl ResourceQuery {
    pub fn new(query: &str, max_results: usize) -> Self {
        Self {
            query: query.to_string(),
            max_results: max_results.clamp(1, 10),
        }
    }
}

/// Seam for the external resource-search collaborator. The HTTP-backed
/// integration lives outside this core; the curated catalog below is the
/// always-available implementation.
pub trait ResourceSearch: Send + Sync {
    fn search(&self, query: &ResourceQuery) -> ResourceSearchResult;
}

/// Static curated tables keyed by keyword match on the query
pub struct CuratedResourceCatalog;

impl CuratedResourceCatalog {
    fn python_resources() -> Vec<ResourceLink> {
        vec![
            link(
                "Official Python Tutorial",
                "https://docs.python.org/3/tutorial/",
                "Comprehensive guide to Python from python.org",
                0.95,
            ),
            link(
                "Real Python Tutorials",
                "https://realpython.com/",
                "In-depth Python tutorials and articles",
                0.9,
            ),
            link(
                "Python on W3Schools",
                "https://www.w3schools.com/python/",
                "Interactive Python tutorial with examples",
                0.85,
            ),
        ]
    }

    fn machine_learning_resources() -> Vec<ResourceLink> {
        vec![
            link(
                "Machine Learning Crash Course",
                "https://developers.google.com/machine-learning/crash-course",
                "Google's fast-paced, practical introduction to ML",
                0.95,
            ),
            link(
                "Scikit-learn Documentation",
                "https://scikit-learn.org/stable/",
                "Official scikit-learn user guide and tutorials",
                0.9,
            ),
            link(
                "Towards Data Science",
                "https://towardsdatascience.com/",
                "Publication with ML articles and tutorials",
                0.85,
            ),
        ]
    }

    fn javascript_resources() -> Vec<ResourceLink> {
        vec![
            link(
                "MDN JavaScript Guide",
                "https://developer.mozilla.org/en-US/docs/Web/JavaScript/Guide",
                "Comprehensive JavaScript documentation",
                0.95,
            ),
            link(
                "JavaScript.info",
                "https://javascript.info/",
                "Modern JavaScript tutorial from basics to advanced",
                0.9,
            ),
            link(
                "freeCodeCamp JavaScript",
                "https://www.freecodecamp.org/learn/javascript-algorithms-and-data-structures/",
                "Interactive JavaScript curriculum",
                0.85,
            ),
        ]
    }

    fn generic_resources(query: &str) -> Vec<ResourceLink> {
        let plus = query.replace(' ', "+");
        let percent = query.replace(' ', "%20");
        vec![
            link(
                &format!("{} - Khan Academy", query),
                &format!("https://www.khanacademy.org/search?page_search_query={}", plus),
                "Free online courses and lessons",
                0.8,
            ),
            link(
                &format!("{} - Coursera", query),
                &format!("https://www.coursera.org/search?query={}", percent),
                "Online courses from top universities",
                0.75,
            ),
            link(
                &format!("{} - YouTube", query),
                &format!(
                    "https://www.youtube.com/results?search_query={}+tutorial",
                    plus
                ),
                "Video tutorials and explanations",
                0.7,
            ),
        ]
    }
}

fn link(title: &str, url: &str, description: &str, relevance: f64) -> ResourceLink {
    ResourceLink {
        title: title.to_string(),
        url: url.to_string(),
        description: Some(description.to_string()),
        relevance_score: relevance,
    }
}

// "ml" must match as its own token, not inside words like "html"
fn has_token(haystack: &str, token: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == token)
}

impl ResourceSearch for CuratedResourceCatalog {
    fn search(&self, query: &ResourceQuery) -> ResourceSearchResult {
        let lower = query.query.to_lowercase();

        let mut resources = if has_token(&lower, "python") {
            Self::python_resources()
        } else if lower.contains("machine learning") || has_token(&lower, "ml") {
            Self::machine_learning_resources()
        } else if lower.contains("javascript") || has_token(&lower, "js") {
            Self::javascript_resources()
        } else {
            Self::generic_resources(&query.query)
        };
        resources.truncate(query.max_results);

        ResourceSearchResult {
            query: query.query.clone(),
            resources,
            search_timestamp: Utc::now(),
        }
    }
}

/// Render a result set for the conversational layer.
pub fn format_results(result: &ResourceSearchResult) -> String {
    if result.resources.is_empty() {
        return format!("No resources found for query: '{}'", result.query);
    }

    let mut output = vec![
        format!(
            "Found {} learning resources for: '{}'",
            result.resources.len(),
            result.query
        ),
        format!(
            "Search performed at: {}",
            result.search_timestamp.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("\n{}\n", "=".repeat(60)),
    ];

    for (idx, resource) in result.resources.iter().enumerate() {
        output.push(format!("{}. {}", idx + 1, resource.title));
        output.push(format!("   URL: {}", resource.url));
        if let Some(description) = &resource.description {
            output.push(format!("   Description: {}", description));
        }
        let stars = (resource.relevance_score * 5.0) as usize;
        output.push(format!("   Relevance: {}", "*".repeat(stars)));
        output.push(String::new());
    }

    output.push("=".repeat(60));
    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_routing_selects_the_right_table() {
        let catalog = CuratedResourceCatalog;

        let python = catalog.search(&ResourceQuery::new("python decorators", 5));
        assert!(python.resources[0].url.contains("python.org"));

        let ml = catalog.search(&ResourceQuery::new("intro to machine learning", 5));
        assert!(ml.resources[0].url.contains("developers.google.com"));

        let js = catalog.search(&ResourceQuery::new("javascript closures", 5));
        assert!(js.resources[0].url.contains("mozilla.org"));
    }

    #[test]
    fn ml_token_does_not_match_inside_html() {
        let catalog = CuratedResourceCatalog;
        let result = catalog.search(&ResourceQuery::new("html forms", 5));
        assert!(result.resources[0].title.contains("Khan Academy"));
    }

    #[test]
    fn generic_fallback_templates_over_the_query() {
        let catalog = CuratedResourceCatalog;
        let result = catalog.search(&ResourceQuery::new("linear algebra", 5));
        assert_eq!(result.resources.len(), 3);
        assert!(result.resources[0].title.starts_with("linear algebra"));
        assert!(result.resources[0].url.contains("linear+algebra"));
        assert!(result.resources[1].url.contains("linear%20algebra"));
    }

    #[test]
    fn results_respect_max_results_and_ranking() {
        let catalog = CuratedResourceCatalog;
        let result = catalog.search(&ResourceQuery::new("python basics", 2));
        assert_eq!(result.resources.len(), 2);
        assert!(result.resources[0].relevance_score >= result.resources[1].relevance_score);
        for resource in &result.resources {
            resource.validate().unwrap();
        }
    }

    #[test]
    fn max_results_is_clamped_into_range() {
        assert_eq!(ResourceQuery::new("x", 0).max_results, 1);
        assert_eq!(ResourceQuery::new("x", 25).max_results, 10);
        assert_eq!(ResourceQuery::new("x", 5).max_results, 5);
    }

    #[test]
    fn formatting_renders_ranked_list_and_empty_message() {
        let catalog = CuratedResourceCatalog;
        let result = catalog.search(&ResourceQuery::new("python", 3));
        let text = format_results(&result);
        assert!(text.contains("Found 3 learning resources"));
        assert!(text.contains("1. Official Python Tutorial"));
        assert!(text.contains("Relevance: ****"));

        let empty = ResourceSearchResult {
            query: "nothing".to_string(),
            resources: vec![],
            search_timestamp: Utc::now(),
        };
        assert!(format_results(&empty).contains("No resources found"));
    }
}
