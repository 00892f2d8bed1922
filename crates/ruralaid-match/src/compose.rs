//! Reply composition.
//!
//! Three outcomes, checked in order: off-topic redirect, on-topic with no
//! matches, and a listing of matched programs grouped by category. Output is
//! plain multi-line text meant to be shown preformatted.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::Arc;

use ruralaid_store::Program;

use crate::extract::is_on_topic;
use crate::vocabulary::Vocabulary;

/// Character cap for descriptions.
pub const DESCRIPTION_CAP: usize = 120;

/// Character cap for benefits and eligibility.
pub const DETAIL_CAP: usize = 100;

const ELLIPSIS: &str = "...";

/// Fallback subject when no keyword is available.
const GENERIC_TOPIC: &str = "that topic";

pub const OFF_TOPIC_MESSAGE: &str = "I can only help with questions about rural development \
assistance programs. Try asking about housing, business development, broadband, energy, \
water systems, or community facilities.";

const NO_MATCH_BODY: &str = "\
Here are the kinds of assistance I can help you explore:
• Housing: home purchase loans, repair grants, rental assistance
• Business development: business loans, grants, and cooperative support
• Broadband: funding for high-speed internet service
• Energy: renewable energy systems and efficiency upgrades
• Water systems: drinking water, wastewater, and storm drainage projects
• Community facilities: clinics, fire stations, schools, and other essential services

Try asking about one of these areas, or describe what you need in a bit more detail.";

const MATCHES_INTRO: &str = "Here are some programs that may help:";

const MATCHES_OUTRO: &str =
    "Would you like more details about any of these programs, such as how to apply or who to contact?";

/// Builds the assistant's reply for one turn.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    vocabulary: Arc<Vocabulary>,
}

impl ResponseComposer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Compose the reply for `query`.
    ///
    /// `keywords` should be the extraction result for `query`; the first one
    /// names the topic in the no-match reply.
    pub fn compose_reply(&self, query: &str, keywords: &[String], programs: &[Program]) -> String {
        if !is_on_topic(&self.vocabulary, query) {
            return OFF_TOPIC_MESSAGE.to_string();
        }
        if programs.is_empty() {
            let topic = keywords.first().map(String::as_str).unwrap_or(GENERIC_TOPIC);
            return no_match_message(topic);
        }
        render_matches(programs)
    }
}

/// Guidance reply for an on-topic question with no catalog hits.
pub fn no_match_message(topic: &str) -> String {
    format!(
        "I see you're asking about {}, but I couldn't find specific matching programs in our catalog right now.\n\n{}",
        topic, NO_MATCH_BODY
    )
}

fn render_matches(programs: &[Program]) -> String {
    let mut out = String::new();
    out.push_str(MATCHES_INTRO);
    out.push('\n');

    for (category, members) in group_by_category(programs) {
        let _ = write!(out, "\n{}:\n", category);
        for program in members {
            render_program(&mut out, program);
        }
    }

    out.push('\n');
    out.push_str(MATCHES_OUTRO);
    out
}

fn render_program(out: &mut String, program: &Program) {
    out.push_str("• ");
    out.push_str(&program.title);
    if let Some(code) = present(&program.program_code) {
        let _ = write!(out, " ({})", code);
    }
    out.push('\n');

    if let Some(description) = present(&program.description) {
        let _ = writeln!(out, "  {}", truncate(description, DESCRIPTION_CAP));
    }
    if let Some(benefits) = present(&program.benefits) {
        let _ = writeln!(out, "  Benefits: {}", truncate(benefits, DETAIL_CAP));
    }
    if let Some(eligibility) = present(&program.eligibility) {
        let _ = writeln!(out, "  Eligibility: {}", truncate(eligibility, DETAIL_CAP));
    }
    if let Some(funding) = present(&program.funding_range) {
        let _ = writeln!(out, "  Funding: {}", funding);
    }
    if let Some(url) = present(&program.url) {
        let _ = writeln!(out, "  More info: {}", url);
    }
}

/// Trimmed field value, `None` when unset or blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Group programs by category, keeping first-seen category order and input
/// order within each group.
pub fn group_by_category(programs: &[Program]) -> Vec<(&str, Vec<&Program>)> {
    let mut groups: Vec<(&str, Vec<&Program>)> = Vec::new();
    for program in programs {
        let category = program.category.as_str();
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(program),
            None => groups.push((category, vec![program])),
        }
    }
    groups
}

/// Cut `text` to `cap` characters and append `...` when it is longer.
pub fn truncate(text: &str, cap: usize) -> Cow<'_, str> {
    match text.char_indices().nth(cap) {
        None => Cow::Borrowed(text),
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], ELLIPSIS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> ResponseComposer {
        ResponseComposer::new(Arc::new(Vocabulary::default()))
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_off_topic_ignores_programs() {
        let programs = vec![Program::new("Direct Home Loan", "Housing")];
        let reply = composer().compose_reply("what's the weather today", &[], &programs);
        assert_eq!(reply, OFF_TOPIC_MESSAGE);
    }

    #[test]
    fn test_off_topic_uses_query_not_keywords() {
        let reply = composer().compose_reply("banana bread", &keywords(&["housing"]), &[]);
        assert_eq!(reply, OFF_TOPIC_MESSAGE);
    }

    #[test]
    fn test_no_match_names_first_keyword() {
        let reply = composer().compose_reply(
            "tell me about llama farming subsidies for rural broadband",
            &keywords(&["rural", "broadband", "farm", "farming"]),
            &[],
        );
        assert_eq!(reply, no_match_message("rural"));
        assert!(reply.starts_with("I see you're asking about rural,"));
        assert!(reply.contains("couldn't find specific matching programs"));
    }

    #[test]
    fn test_no_match_without_keywords_uses_placeholder() {
        let reply = composer().compose_reply("rural housing", &[], &[]);
        assert!(reply.starts_with("I see you're asking about that topic,"));
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let programs = vec![
            Program::new("b1", "B"),
            Program::new("a1", "A"),
            Program::new("b2", "B"),
        ];
        let groups = group_by_category(&programs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "B");
        let b_titles: Vec<&str> = groups[0].1.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(b_titles, vec!["b1", "b2"]);
        assert_eq!(groups[1].0, "A");
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_grouping_in_rendered_reply() {
        let programs = vec![
            Program::new("Water Loan", "Water"),
            Program::new("Home Repair", "Housing"),
            Program::new("Water Grant", "Water"),
        ];
        let reply = composer().compose_reply("rural help", &keywords(&["rural"]), &programs);
        let water = reply.find("Water:\n").unwrap();
        let loan = reply.find("• Water Loan").unwrap();
        let grant = reply.find("• Water Grant").unwrap();
        let housing = reply.find("Housing:\n").unwrap();
        assert!(water < loan && loan < grant && grant < housing);
    }

    #[test]
    fn test_truncation_boundary() {
        let exact: String = "a".repeat(DESCRIPTION_CAP);
        let over: String = "a".repeat(DESCRIPTION_CAP + 1);
        assert_eq!(truncate(&exact, DESCRIPTION_CAP), exact.as_str());
        assert_eq!(
            truncate(&over, DESCRIPTION_CAP),
            format!("{}...", "a".repeat(DESCRIPTION_CAP))
        );
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(truncate(&text, 3), "ééé...");
        assert_eq!(truncate(&text, 5), text.as_str());
    }

    #[test]
    fn test_description_cap_in_reply() {
        let program = Program {
            description: Some("d".repeat(121)),
            ..Program::new("Long One", "Housing")
        };
        let reply = composer().compose_reply("housing", &keywords(&["housing"]), &[program]);
        assert!(reply.contains(&format!("  {}...\n", "d".repeat(120))));
        assert!(!reply.contains(&"d".repeat(121)));

        let program = Program {
            description: Some("d".repeat(120)),
            ..Program::new("Exact One", "Housing")
        };
        let reply = composer().compose_reply("housing", &keywords(&["housing"]), &[program]);
        assert!(reply.contains(&format!("  {}\n", "d".repeat(120))));
        assert!(!reply.contains("..."));
    }

    #[test]
    fn test_full_program_rendering() {
        let program = Program {
            description: Some("Helps low-income applicants buy homes.".into()),
            benefits: Some("b".repeat(101)),
            eligibility: Some("Adjusted income at or below the low-income limit".into()),
            funding_range: Some("Up to 100% financing".into()),
            url: Some("https://www.rd.usda.gov/sfh-direct".into()),
            program_code: Some("SFH-502".into()),
            contact_info: Some("Local office".into()),
            ..Program::new("Direct Home Loan", "Housing")
        };
        let reply = composer().compose_reply("housing", &keywords(&["housing"]), &[program]);

        let expected = format!(
            "{}\n\nHousing:\n• Direct Home Loan (SFH-502)\n  Helps low-income applicants buy homes.\n  Benefits: {}...\n  Eligibility: Adjusted income at or below the low-income limit\n  Funding: Up to 100% financing\n  More info: https://www.rd.usda.gov/sfh-direct\n\n{}",
            MATCHES_INTRO,
            "b".repeat(100),
            MATCHES_OUTRO
        );
        assert_eq!(reply, expected);
        assert!(!reply.contains("Local office"));
    }

    #[test]
    fn test_blank_fields_are_omitted() {
        let program = Program {
            description: Some("   ".into()),
            program_code: Some(String::new()),
            ..Program::new("Bare", "Energy")
        };
        let reply = composer().compose_reply("energy", &keywords(&["energy"]), &[program]);
        assert!(reply.contains("Energy:\n• Bare\n\nWould you like"));
    }
}
