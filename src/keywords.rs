//! Versioned keyword tables and the whole-word matcher built from them.
//!
//! Classification in the analyzer, detector and scheduler never uses
//! inline literals. Each consumer receives a [`KeywordTable`], so tests can
//! inject fixture tables in place of the built-in ones.
//!
//! Matching is case-insensitive and whole-word: `test` matches
//! "Write unit test" but not "latest". Multi-word keywords tolerate any
//! run of whitespace between words.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// One named family of keywords.
#[derive(Debug, Clone, Copy)]
pub struct KeywordFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// A named, versioned list of keyword families.
///
/// Family order matters: matchers report families in table order, and the
/// intent classifier picks the first matching family.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    pub name: &'static str,
    pub version: u32,
    pub families: &'static [KeywordFamily],
}

/// Development phases, in phase order, plus post-release maintenance.
pub const PHASE_KEYWORDS: KeywordTable = KeywordTable {
    name: "phases",
    version: 1,
    families: &[
        KeywordFamily {
            name: "setup",
            keywords: &[
                "setup", "set up", "initialize", "initialise", "scaffold", "bootstrap", "install",
                "installation", "provision",
            ],
        },
        KeywordFamily {
            name: "design",
            keywords: &[
                "design", "designs", "architecture", "wireframe", "wireframes", "mockup",
                "mockups", "blueprint", "ux",
            ],
        },
        KeywordFamily {
            name: "development",
            keywords: &[
                "implement", "implementation", "develop", "development", "build", "coding",
                "feature", "features",
            ],
        },
        KeywordFamily {
            name: "testing",
            keywords: &["test", "tests", "testing", "qa", "e2e", "verify", "verification"],
        },
        KeywordFamily {
            name: "deployment",
            keywords: &[
                "deploy", "deployment", "release", "launch", "production", "rollout", "ship",
            ],
        },
        KeywordFamily {
            name: "maintenance",
            keywords: &[
                "maintenance", "maintain", "monitor", "monitoring", "hotfix", "bugfix", "refactor",
                "upgrade", "patch",
            ],
        },
    ],
};

/// Technical components a board touches.
pub const COMPONENT_KEYWORDS: KeywordTable = KeywordTable {
    name: "components",
    version: 1,
    families: &[
        KeywordFamily {
            name: "frontend",
            keywords: &[
                "frontend", "front-end", "ui", "react", "vue", "angular", "css", "html", "page",
                "pages",
            ],
        },
        KeywordFamily {
            name: "backend",
            keywords: &[
                "backend", "back-end", "api", "server", "endpoint", "endpoints", "service",
                "services", "rest", "graphql",
            ],
        },
        KeywordFamily {
            name: "database",
            keywords: &[
                "database", "db", "sql", "postgres", "postgresql", "mysql", "mongodb", "schema",
                "migration", "migrations",
            ],
        },
        KeywordFamily {
            name: "infrastructure",
            keywords: &[
                "infrastructure", "infra", "docker", "kubernetes", "k8s", "ci", "pipeline",
                "terraform", "cloud", "aws",
            ],
        },
        KeywordFamily {
            name: "mobile",
            keywords: &[
                "mobile", "ios", "android", "app store", "react native", "swift", "kotlin",
                "flutter",
            ],
        },
        KeywordFamily {
            name: "testing",
            keywords: &["test", "tests", "testing", "qa", "e2e"],
        },
        KeywordFamily {
            name: "documentation",
            keywords: &["documentation", "docs", "readme", "guide", "manual"],
        },
    ],
};

/// User intent families, checked in order: create, organize, coordinate.
pub const INTENT_KEYWORDS: KeywordTable = KeywordTable {
    name: "intents",
    version: 1,
    families: &[
        KeywordFamily {
            name: "create",
            keywords: &[
                "create", "new project", "start a", "start new", "generate", "scaffold",
                "from scratch", "set up a", "kick off", "build a", "plan a",
            ],
        },
        KeywordFamily {
            name: "organize",
            keywords: &[
                "organize", "organise", "clean up", "cleanup", "restructure", "sort out", "messy",
                "chaotic", "enrich", "categorize", "tidy",
            ],
        },
        KeywordFamily {
            name: "coordinate",
            keywords: &[
                "coordinate", "assign", "delegate", "next task", "dispatch", "schedule",
                "who should", "distribute", "workload",
            ],
        },
    ],
};

/// Families the scheduler's content-based safety net reasons about.
pub const SCHEDULING_KEYWORDS: KeywordTable = KeywordTable {
    name: "scheduling",
    version: 1,
    families: &[
        KeywordFamily {
            name: "implementation",
            keywords: &[
                "implement", "implementation", "build", "develop", "development", "coding", "code",
                "feature", "integrate",
            ],
        },
        KeywordFamily {
            name: "testing",
            keywords: &["test", "tests", "testing", "qa", "e2e", "verify", "verification"],
        },
        KeywordFamily {
            name: "deployment",
            keywords: &[
                "deploy", "deployment", "release", "launch", "production", "rollout", "go live",
            ],
        },
    ],
};

/// Compiled form of a [`KeywordTable`].
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    table: &'static str,
    version: u32,
    families: Vec<(&'static str, Regex)>,
}

impl KeywordMatcher {
    /// Compile one whole-word regex per family.
    ///
    /// # Errors
    /// Returns `Error::Validation` for a family with no keywords or a
    /// keyword that fails to compile.
    pub fn new(table: &KeywordTable) -> Result<Self> {
        let mut families = Vec::with_capacity(table.families.len());
        for family in table.families {
            if family.keywords.is_empty() {
                return Err(Error::Validation(format!(
                    "keyword family '{}' in table '{}' is empty",
                    family.name, table.name
                )));
            }
            let alternation = family
                .keywords
                .iter()
                .map(|kw| {
                    kw.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{})\b", alternation);
            let regex = Regex::new(&pattern).map_err(|e| {
                Error::Validation(format!(
                    "keyword family '{}' does not compile: {}",
                    family.name, e
                ))
            })?;
            families.push((family.name, regex));
        }
        Ok(Self {
            table: table.name,
            version: table.version,
            families,
        })
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Family names, in table order.
    pub fn family_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.families.iter().map(|(name, _)| *name)
    }

    /// Names of every family matching `text`, in table order.
    pub fn matches(&self, text: &str) -> Vec<&'static str> {
        self.families
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(name, _)| *name)
            .collect()
    }

    /// First family matching `text`, in table order.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.families
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| *name)
    }

    /// Whether `text` matches the named family. Unknown names never match.
    pub fn is_match(&self, family: &str, text: &str) -> bool {
        self.families
            .iter()
            .any(|(name, re)| *name == family && re.is_match(text))
    }
}

/// Built-in phase matcher.
pub static PHASES: LazyLock<KeywordMatcher> =
    LazyLock::new(|| KeywordMatcher::new(&PHASE_KEYWORDS).unwrap());

/// Built-in component matcher.
pub static COMPONENTS: LazyLock<KeywordMatcher> =
    LazyLock::new(|| KeywordMatcher::new(&COMPONENT_KEYWORDS).unwrap());

/// Built-in intent matcher.
pub static INTENTS: LazyLock<KeywordMatcher> =
    LazyLock::new(|| KeywordMatcher::new(&INTENT_KEYWORDS).unwrap());

/// Built-in scheduling matcher.
pub static SCHEDULING: LazyLock<KeywordMatcher> =
    LazyLock::new(|| KeywordMatcher::new(&SCHEDULING_KEYWORDS).unwrap());

/// Words ignored when comparing task texts for relatedness.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "that", "the", "this", "to", "with", "all", "new", "our", "we", "via",
];

/// Lowercased alphanumeric words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}
