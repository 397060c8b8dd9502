//! Built-in prompt suites
//!
//! Four themed suites of five prompts each, plus `all`, which concatenates
//! them in registry order. Built once on first access and never mutated.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{BenchError, Result};

pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// A single benchmark prompt with optional reference answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub category: String,
    /// Empty means no ground truth
    pub reference: String,
    pub max_tokens: u32,
}

impl Prompt {
    pub fn new(text: &str, category: &str) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            reference: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A named, ordered collection of prompts
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSuite {
    pub name: String,
    pub description: String,
    pub prompts: Vec<Prompt>,
}

impl PromptSuite {
    pub fn new(name: &str, description: &str, prompts: Vec<Prompt>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompts,
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

fn registry() -> &'static [PromptSuite] {
    static SUITES: OnceLock<Vec<PromptSuite>> = OnceLock::new();
    SUITES.get_or_init(|| {
        let mut suites = vec![reasoning(), coding(), creative(), factual()];
        let all = suites
            .iter()
            .flat_map(|s| s.prompts.iter().cloned())
            .collect();
        suites.push(PromptSuite::new(
            "all",
            "All built-in prompts combined",
            all,
        ));
        suites
    })
}

/// Every suite in registry order, `all` last
pub fn suites() -> &'static [PromptSuite] {
    registry()
}

pub fn suite_names() -> Vec<String> {
    registry().iter().map(|s| s.name.clone()).collect()
}

/// Look up a suite by name
pub fn get_suite(name: &str) -> Result<&'static PromptSuite> {
    registry()
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| BenchError::UnknownSuite {
            name: name.to_string(),
            available: suite_names(),
        })
}

// ═══════════════════════════════════════════════════════════════
// SUITES
// ═══════════════════════════════════════════════════════════════

fn reasoning() -> PromptSuite {
    const CAT: &str = "reasoning";
    PromptSuite::new(
        CAT,
        "Logic, math, and step-by-step reasoning tasks",
        vec![
            Prompt::new(
                "A farmer has 17 sheep. All but 9 run away. How many sheep does the farmer have left? Explain your reasoning step by step.",
                CAT,
            )
            .with_reference("9 sheep. 'All but 9' means 9 remain."),
            Prompt::new(
                "If it takes 5 machines 5 minutes to make 5 widgets, how long would it take 100 machines to make 100 widgets? Think carefully.",
                CAT,
            )
            .with_reference("5 minutes. Each machine makes 1 widget in 5 minutes."),
            Prompt::new(
                "I have a 3-gallon jug and a 5-gallon jug. How do I measure exactly 4 gallons of water? Show your steps.",
                CAT,
            )
            .with_reference("Fill 5-gallon, pour into 3-gallon (leaves 2 in 5-gallon), empty 3-gallon, pour 2 into 3-gallon, fill 5-gallon, pour from 5 into 3-gallon (1 gallon fits), 5-gallon now has 4."),
            Prompt::new(
                "Three friends split a $30 dinner bill equally. They each pay $10 to the waiter. The waiter realizes the bill is only $25 and returns $5. They each take $1 back, tipping $2 total. They each paid $9 (totaling $27) plus $2 tip = $29. Where is the missing dollar? Explain.",
                CAT,
            )
            .with_reference("There is no missing dollar. The $27 paid includes the $25 bill plus $2 tip. Adding the $2 tip to $27 is double-counting."),
            Prompt::new(
                "What is the next number in the sequence: 1, 1, 2, 3, 5, 8, 13, ...? Explain the pattern.",
                CAT,
            )
            .with_reference("21. This is the Fibonacci sequence where each number is the sum of the two preceding numbers."),
        ],
    )
}

fn coding() -> PromptSuite {
    const CAT: &str = "coding";
    PromptSuite::new(
        CAT,
        "Code generation and explanation tasks",
        vec![
            Prompt::new(
                "Write a Python function that checks if a string is a palindrome. Include type hints and handle edge cases.",
                CAT,
            )
            .with_reference("def is_palindrome(s: str) -> bool: cleaned = ''.join(c.lower() for c in s if c.isalnum()); return cleaned == cleaned[::-1]"),
            Prompt::new(
                "Implement binary search in Python. The function should return the index of the target or -1 if not found. Include type hints.",
                CAT,
            )
            .with_reference("def binary_search(arr: list[int], target: int) -> int"),
            Prompt::new(
                "Write a Python function to flatten a nested list of arbitrary depth. For example, [1, [2, [3, 4], 5]] becomes [1, 2, 3, 4, 5].",
                CAT,
            )
            .with_reference("def flatten(lst): result = []; for item in lst: result.extend(flatten(item) if isinstance(item, list) else [item]); return result"),
            Prompt::new(
                "Write a Python decorator that retries a function up to N times with exponential backoff if it raises an exception.",
                CAT,
            )
            .with_reference("A decorator using functools.wraps with a loop, try/except, and time.sleep(2**attempt) logic."),
            Prompt::new(
                "Explain the difference between a list and a tuple in Python. When should you use each? Give code examples.",
                CAT,
            )
            .with_reference("Lists are mutable (append, remove), tuples are immutable. Use tuples for fixed collections, dict keys, and function returns."),
        ],
    )
}

fn creative() -> PromptSuite {
    const CAT: &str = "creative";
    PromptSuite::new(
        CAT,
        "Creative writing and storytelling tasks",
        vec![
            Prompt::new("Write a haiku about debugging code at 3 AM.", CAT).with_max_tokens(128),
            Prompt::new(
                "In exactly 50 words, tell a complete story with a beginning, middle, and end about a robot learning to paint.",
                CAT,
            )
            .with_max_tokens(256),
            Prompt::new(
                "Write a product description for a time machine that fits in your pocket. Make it sound like an Apple product launch.",
                CAT,
            ),
            Prompt::new(
                "Create a short dialogue between a semicolon and an em dash arguing about which punctuation mark is more useful.",
                CAT,
            ),
            Prompt::new(
                "Write 3 metaphors that explain how a neural network learns, aimed at a 10-year-old audience.",
                CAT,
            )
            .with_max_tokens(256),
        ],
    )
}

fn factual() -> PromptSuite {
    const CAT: &str = "factual";
    PromptSuite::new(
        CAT,
        "Factual recall and knowledge tasks",
        vec![
            Prompt::new(
                "What are the three laws of thermodynamics? Explain each in one sentence.",
                CAT,
            )
            .with_reference("1st: Energy cannot be created or destroyed. 2nd: Entropy of an isolated system always increases. 3rd: Entropy approaches zero as temperature approaches absolute zero."),
            Prompt::new(
                "List the planets in our solar system in order from the Sun, and state which ones are gas giants.",
                CAT,
            )
            .with_reference("Mercury, Venus, Earth, Mars, Jupiter, Saturn, Uranus, Neptune. Gas giants: Jupiter, Saturn. Ice giants: Uranus, Neptune."),
            Prompt::new(
                "Who invented the World Wide Web, in what year, and at which institution?",
                CAT,
            )
            .with_reference("Tim Berners-Lee, 1989, CERN."),
            Prompt::new(
                "What is the Big O time complexity of quicksort in the average case and the worst case? Explain why.",
                CAT,
            )
            .with_reference("Average: O(n log n) with good pivot selection. Worst: O(n^2) when pivot is always the smallest or largest element."),
            Prompt::new(
                "Explain what DNS is and describe what happens when you type a URL into a browser, in 5 steps or fewer.",
                CAT,
            )
            .with_reference("DNS translates domain names to IP addresses. Steps: browser checks cache, queries DNS resolver, resolver queries root/TLD/authoritative servers, IP returned, browser connects via HTTP/HTTPS."),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_suite_reasoning() {
        let suite = get_suite("reasoning").unwrap();
        assert_eq!(suite.name, "reasoning");
        assert_eq!(suite.len(), 5);
    }

    #[test]
    fn test_get_suite_all_concatenates_in_order() {
        let all = get_suite("all").unwrap();
        assert_eq!(all.len(), 20);

        let expected: Vec<&Prompt> = ["reasoning", "coding", "creative", "factual"]
            .iter()
            .flat_map(|n| get_suite(n).unwrap().prompts.iter())
            .collect();
        let actual: Vec<&Prompt> = all.prompts.iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_get_suite_unknown() {
        match get_suite("nonexistent") {
            Err(BenchError::UnknownSuite { name, available }) => {
                assert_eq!(name, "nonexistent");
                assert_eq!(
                    available,
                    vec!["reasoning", "coding", "creative", "factual", "all"]
                );
            }
            other => panic!("expected UnknownSuite, got {:?}", other),
        }
    }

    #[test]
    fn test_all_suites_have_prompts() {
        for suite in suites() {
            assert!(suite.len() >= 5, "Suite {} has fewer than 5 prompts", suite.name);
            assert!(suite.prompts.iter().all(|p| p.max_tokens > 0));
        }
    }

    #[test]
    fn test_creative_prompts_have_no_reference() {
        let suite = get_suite("creative").unwrap();
        assert!(suite.prompts.iter().all(|p| p.reference.is_empty()));
        assert_eq!(suite.prompts[0].max_tokens, 128);
        assert_eq!(suite.prompts[2].max_tokens, DEFAULT_MAX_TOKENS);
    }
}
