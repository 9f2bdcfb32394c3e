//! Skill vocabulary shared by the resume parser, the job description parser and the fit scorer.
//!
//! Matching is whole-term and case-insensitive: a hit must not touch an alphanumeric
//! character on either side, so `java` never matches inside `javascript`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Language,
    Framework,
    Database,
    Cloud,
    Tooling,
    Data,
    Practice,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Skill {
    pub canonical: &'static str,
    /// Lower-case spellings, canonical form included.
    pub aliases: &'static [&'static str],
    pub category: SkillCategory,
}

macro_rules! skill {
    ($canonical:expr, $category:ident, [$($alias:expr),* $(,)?]) => {
        Skill {
            canonical: $canonical,
            aliases: &[$($alias),*],
            category: SkillCategory::$category,
        }
    };
}

pub static SKILLS: &[Skill] = &[
    // Languages
    skill!("Rust", Language, ["rust"]),
    skill!("Python", Language, ["python"]),
    skill!("Java", Language, ["java"]),
    skill!("JavaScript", Language, ["javascript", "ecmascript"]),
    skill!("TypeScript", Language, ["typescript"]),
    skill!("Go", Language, ["golang"]),
    skill!("C++", Language, ["c++", "cpp"]),
    skill!("C#", Language, ["c#", "csharp"]),
    skill!("Kotlin", Language, ["kotlin"]),
    skill!("Swift", Language, ["swift"]),
    skill!("Ruby", Language, ["ruby"]),
    skill!("PHP", Language, ["php"]),
    skill!("Scala", Language, ["scala"]),
    skill!("SQL", Language, ["sql"]),
    skill!("Bash", Language, ["bash", "shell scripting"]),
    skill!("HTML", Language, ["html", "html5"]),
    skill!("CSS", Language, ["css", "css3"]),
    // Frameworks and libraries
    skill!("React", Framework, ["react", "react.js", "reactjs"]),
    skill!("Angular", Framework, ["angular"]),
    skill!("Vue", Framework, ["vue", "vue.js", "vuejs"]),
    skill!("Node.js", Framework, ["node.js", "nodejs"]),
    skill!("Django", Framework, ["django"]),
    skill!("Flask", Framework, ["flask"]),
    skill!("FastAPI", Framework, ["fastapi"]),
    skill!("Spring Boot", Framework, ["spring boot"]),
    skill!(".NET", Framework, [".net", "dotnet"]),
    skill!("Ruby on Rails", Framework, ["ruby on rails", "rails"]),
    skill!("Tokio", Framework, ["tokio"]),
    skill!("GraphQL", Framework, ["graphql"]),
    skill!("REST APIs", Framework, ["rest api", "rest apis", "restful"]),
    skill!("gRPC", Framework, ["grpc"]),
    // Databases
    skill!("PostgreSQL", Database, ["postgresql", "postgres"]),
    skill!("MySQL", Database, ["mysql"]),
    skill!("MongoDB", Database, ["mongodb", "mongo"]),
    skill!("Redis", Database, ["redis"]),
    skill!("Elasticsearch", Database, ["elasticsearch"]),
    skill!("DynamoDB", Database, ["dynamodb"]),
    skill!("Cassandra", Database, ["cassandra"]),
    skill!("SQLite", Database, ["sqlite"]),
    // Cloud and infrastructure
    skill!("AWS", Cloud, ["aws", "amazon web services"]),
    skill!("GCP", Cloud, ["gcp", "google cloud"]),
    skill!("Azure", Cloud, ["azure"]),
    skill!("Kubernetes", Cloud, ["kubernetes", "k8s"]),
    skill!("Docker", Cloud, ["docker"]),
    skill!("Terraform", Cloud, ["terraform"]),
    skill!("Linux", Cloud, ["linux"]),
    skill!("Serverless", Cloud, ["serverless", "lambda"]),
    // Tooling
    skill!("Git", Tooling, ["git"]),
    skill!("CI/CD", Tooling, ["ci/cd", "continuous integration", "continuous delivery"]),
    skill!("Jenkins", Tooling, ["jenkins"]),
    skill!("GitHub Actions", Tooling, ["github actions"]),
    skill!("Kafka", Tooling, ["kafka"]),
    skill!("RabbitMQ", Tooling, ["rabbitmq"]),
    skill!("Prometheus", Tooling, ["prometheus"]),
    skill!("Grafana", Tooling, ["grafana"]),
    skill!("Jira", Tooling, ["jira"]),
    // Data and ML
    skill!("Machine Learning", Data, ["machine learning"]),
    skill!("Deep Learning", Data, ["deep learning"]),
    skill!("NLP", Data, ["nlp", "natural language processing"]),
    skill!("PyTorch", Data, ["pytorch"]),
    skill!("TensorFlow", Data, ["tensorflow"]),
    skill!("scikit-learn", Data, ["scikit-learn", "sklearn"]),
    skill!("Pandas", Data, ["pandas"]),
    skill!("NumPy", Data, ["numpy"]),
    skill!("Spark", Data, ["spark", "pyspark"]),
    skill!("Data Analysis", Data, ["data analysis", "data analytics"]),
    skill!("Tableau", Data, ["tableau"]),
    skill!("Excel", Data, ["microsoft excel", "ms excel"]),
    // Practices
    skill!("Distributed Systems", Practice, ["distributed systems"]),
    skill!("Microservices", Practice, ["microservices", "microservice"]),
    skill!("Systems Programming", Practice, ["systems programming"]),
    skill!("Agile", Practice, ["agile", "scrum"]),
    skill!("Test Automation", Practice, ["test automation", "unit testing", "tdd"]),
    skill!("System Design", Practice, ["system design"]),
    skill!("Security", Practice, ["security", "cybersecurity"]),
    skill!("Performance Optimization", Practice, ["performance optimization", "performance tuning"]),
];

/// Looks up a skill by canonical name or alias, case-insensitively.
pub fn canonicalize(term: &str) -> Option<&'static Skill> {
    let needle = term.trim().to_lowercase();
    SKILLS.iter().find(|s| {
        s.canonical.to_lowercase() == needle || s.aliases.iter().any(|a| *a == needle)
    })
}

/// Every skill present in `text`, ordered by first occurrence.
pub fn find_skills(text: &str) -> Vec<&'static Skill> {
    let haystack = text.to_lowercase();
    let mut hits: Vec<(usize, &'static Skill)> = SKILLS
        .iter()
        .filter_map(|skill| {
            skill
                .aliases
                .iter()
                .filter_map(|alias| first_term_position(&haystack, alias))
                .min()
                .map(|pos| (pos, skill))
        })
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, skill)| skill).collect()
}

/// Whole-term occurrences of the skill in `text` across all aliases.
pub fn count_occurrences(text: &str, skill: &Skill) -> u32 {
    let haystack = text.to_lowercase();
    skill
        .aliases
        .iter()
        .map(|alias| term_positions(&haystack, alias).count() as u32)
        .sum()
}

/// True when `term` appears in `text` as a whole term.
pub fn contains_term(text: &str, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    first_term_position(&text.to_lowercase(), &needle).is_some()
}

fn first_term_position(haystack: &str, needle: &str) -> Option<usize> {
    term_positions(haystack, needle).next()
}

/// Both arguments must already be lower-case.
fn term_positions<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).filter_map(move |(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let mut after = haystack[end..].chars();
        let after_ok = match after.next() {
            None => true,
            // "vue.js" must not count as a bare "vue"
            Some('.') => after.next().map_or(true, |c| !c.is_alphanumeric()),
            Some(c) => !c.is_alphanumeric() && c != '+' && c != '#',
        };
        (before_ok && after_ok).then_some(start)
    })
}
