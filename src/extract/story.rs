//! User-story block assembly.
//!
//! Story blocks are located by `### User Story <N>` headings; the written N
//! is informational only, the story id is 1-based assignment order. Inside
//! a block, `####` sub-blocks route to the field sub-parsers. A block with
//! no recognized sub-block degrades to `{raw: <block text>}`.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::blocks::split_blocks;
use crate::extract::heading::normalize_heading;
use crate::extract::lists::{parse_bullets, parse_numbered};
use crate::model::{RawStory, Story, StoryRecord};

static STORY_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^user\s+story\s+\d+").unwrap());

/// The recognized story sub-blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoryField {
    Description,
    Actors,
    PreConditions,
    Flow,
    ExceptionHandling,
    AcceptanceCriteria,
    DefinitionOfDone,
}

/// Normalized hint -> story field, matched the same way as section
/// headings (exact or word-bounded prefix).
const FIELD_HINTS: &[(&str, StoryField)] = &[
    ("description", StoryField::Description),
    ("actors persona", StoryField::Actors),
    ("actors", StoryField::Actors),
    ("persona", StoryField::Actors),
    ("pre condition", StoryField::PreConditions),
    ("pre conditions", StoryField::PreConditions),
    ("done when flow", StoryField::Flow),
    ("done when", StoryField::Flow),
    ("flow", StoryField::Flow),
    ("exception handling", StoryField::ExceptionHandling),
    ("acceptance criteria", StoryField::AcceptanceCriteria),
    ("definition of done", StoryField::DefinitionOfDone),
];

fn classify_field(raw: &str) -> Option<StoryField> {
    let normalized = normalize_heading(raw);
    if normalized.is_empty() {
        return None;
    }
    for (hint, field) in FIELD_HINTS {
        if normalized == *hint
            || normalized
                .strip_prefix(hint)
                .is_some_and(|rest| rest.starts_with(' '))
        {
            return Some(*field);
        }
    }
    None
}

/// Assemble one story from its block text.
fn assemble_story(id: u32, block: &str) -> Story {
    let sub_blocks = split_blocks(block, 4, classify_field);
    if sub_blocks.is_empty() {
        return Story::Raw(RawStory {
            raw: block.trim().to_string(),
        });
    }

    let mut record = StoryRecord::new(id);
    for (field, span) in sub_blocks {
        match field {
            StoryField::Description => record.description = Some(span.trim().to_string()),
            StoryField::Actors => record.actors = parse_bullets(&span),
            StoryField::PreConditions => record.pre_conditions = parse_bullets(&span),
            StoryField::Flow => record.flow = parse_numbered(&span),
            StoryField::ExceptionHandling => record.exception_handling = parse_bullets(&span),
            StoryField::AcceptanceCriteria => record.acceptance_criteria = parse_bullets(&span),
            StoryField::DefinitionOfDone => record.definition_of_done = parse_bullets(&span),
        }
    }

    if record.is_blank() {
        return Story::Raw(RawStory {
            raw: block.trim().to_string(),
        });
    }
    Story::Structured(record)
}

/// Parse the user-stories section body into ordered stories.
pub fn parse_stories(text: &str) -> Vec<Story> {
    let blocks = split_blocks(text, 3, |title| {
        STORY_HEADING_RE.is_match(&normalize_heading(title)).then_some(())
    });
    blocks
        .into_iter()
        .enumerate()
        .map(|(i, ((), block))| assemble_story(i as u32 + 1, &block))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY_BLOCK: &str = "\
### User Story 1

#### Description
As a **shopper**, I want **one-click checkout** so that **I buy faster**.

#### Actors / Persona
- Shopper - returning customer with a saved card
- Support agent - handles failed payments

#### Pre-Condition
- Customer has a verified payment method

#### Done When (Flow)
1. Submit form
2. Receive confirmation

#### Exception Handling
- Card declined - prompt for another method

#### Acceptance Criteria
- Order appears in history within 5 seconds

#### Definition of Done
- Unit and integration tests pass
";

    #[test]
    fn test_full_story_decomposition() {
        let stories = parse_stories(STORY_BLOCK);
        assert_eq!(stories.len(), 1);
        let record = match &stories[0] {
            Story::Structured(r) => r,
            Story::Raw(_) => panic!("story should decompose"),
        };
        assert_eq!(record.id, 1);
        assert!(record.description.as_deref().unwrap().contains("shopper"));
        assert_eq!(record.actors.len(), 2);
        assert_eq!(record.pre_conditions.len(), 1);
        assert_eq!(record.flow, vec!["Submit form", "Receive confirmation"]);
        assert_eq!(record.exception_handling.len(), 1);
        assert_eq!(record.acceptance_criteria.len(), 1);
        assert_eq!(record.definition_of_done.len(), 1);
    }

    #[test]
    fn test_story_ids_are_assignment_order() {
        // Written numbers diverge from order; assignment order wins.
        let text = "\
### User Story 7
#### Description
First in the document.
### User Story 2
#### Description
Second in the document.
";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 2);
        match (&stories[0], &stories[1]) {
            (Story::Structured(a), Story::Structured(b)) => {
                assert_eq!(a.id, 1);
                assert!(a.description.as_deref().unwrap().contains("First"));
                assert_eq!(b.id, 2);
            }
            _ => panic!("both stories should decompose"),
        }
    }

    #[test]
    fn test_unrecognized_story_degrades_to_raw() {
        let text = "### User Story 1\nJust a paragraph without any sub-blocks.\n";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 1);
        match &stories[0] {
            Story::Raw(r) => assert_eq!(r.raw, "Just a paragraph without any sub-blocks."),
            Story::Structured(_) => panic!("expected raw fallback"),
        }
    }

    #[test]
    fn test_partial_story_keeps_recognized_fields() {
        let text = "\
### User Story 1
#### Acceptance Criteria
- Must render in under 100ms
";
        let stories = parse_stories(text);
        match &stories[0] {
            Story::Structured(r) => {
                assert!(r.description.is_none());
                assert_eq!(r.acceptance_criteria, vec!["Must render in under 100ms"]);
            }
            Story::Raw(_) => panic!("recognized sub-block should decompose"),
        }
    }

    #[test]
    fn test_non_story_depth3_headings_skipped() {
        let text = "### Overview\nskipped\n### User Story 1\n#### Description\nKept.\n";
        let stories = parse_stories(text);
        assert_eq!(stories.len(), 1);
    }

    #[test]
    fn test_classify_field_variants() {
        assert_eq!(classify_field("Actors / Persona"), Some(StoryField::Actors));
        assert_eq!(classify_field("Pre-Condition"), Some(StoryField::PreConditions));
        assert_eq!(classify_field("Done When (Flow)"), Some(StoryField::Flow));
        assert_eq!(classify_field("Budget"), None);
    }
}
