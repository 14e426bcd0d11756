//! Unit tests for the Markdown block classifier.

use proptest::prelude::*;
use rstest::rstest;

use super::{BlockState, Classifier, CodeFence, HtmlSubstate, LineKind};

/// Classify every line of `text`, returning the frames and rewritten lines.
fn classify_all(text: &str) -> (Vec<BlockState>, Vec<String>) {
    let mut classifier = Classifier::new();
    text.split('\n')
        .map(|line| {
            let mut line = line.to_string();
            let state = *classifier.classify(&mut line);
            (state, line)
        })
        .unzip()
}

fn kinds(text: &str) -> Vec<LineKind> {
    classify_all(text).0.into_iter().map(|s| s.kind).collect()
}

#[rstest]
#[case("# Hello\n\ntext", &[LineKind::HeaderAtx, LineKind::Text, LineKind::Text])]
#[case("Title\n---", &[LineKind::Text, LineKind::HeaderSetext])]
#[case("Title\n===\nbody", &[LineKind::Text, LineKind::HeaderSetext, LineKind::Text])]
#[case("\n---", &[LineKind::Text, LineKind::Rule])]
#[case("para\n\n    code\n\nafter", &[
    LineKind::Text,
    LineKind::Text,
    LineKind::Code,
    LineKind::Code,
    LineKind::Text,
])]
#[case("para\n    lazy", &[LineKind::Text, LineKind::Text])]
#[case("| a | b |\n| - | - |\nafter", &[LineKind::Table, LineKind::Table, LineKind::Text])]
#[case("text\n| a | b |", &[LineKind::Text, LineKind::Text])]
#[case("[id]: http://example.com\n  \"Title\"\ntext", &[
    LineKind::LinkLabel,
    LineKind::LinkLabel,
    LineKind::Text,
])]
#[case("*[HTML]: Hyper Text\ntext", &[LineKind::HtmlAbbreviation, LineKind::Text])]
#[case("<!-- note -->\ntext", &[LineKind::HtmlBlock, LineKind::Text])]
#[case("<div>\n*a*\n\ntext", &[
    LineKind::HtmlBlock,
    LineKind::HtmlBlock,
    LineKind::HtmlBlock,
    LineKind::Text,
])]
#[case("text\n2. not a list", &[LineKind::Text, LineKind::Text])]
#[case("text\n1. a list", &[LineKind::Text, LineKind::OrderedList])]
fn classifies_lines(#[case] text: &str, #[case] expected: &[LineKind]) {
    assert_eq!(kinds(text), expected, "kinds for {text:?}");
}

#[test]
fn fenced_code_is_verbatim() {
    let (states, lines) = classify_all("```\n  foo *x*\n```\nafter");
    let kinds: Vec<_> = states.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        [LineKind::Code, LineKind::Code, LineKind::Code, LineKind::Text]
    );
    assert_eq!(lines[1], "  foo *x*");
}

#[test]
fn open_fence_is_reported() {
    let mut classifier = Classifier::new();
    classifier.classify(&mut "~~~~ text".to_string());
    assert_eq!(classifier.code_fence(), Some(CodeFence { ch: '~', len: 4 }));
    classifier.classify(&mut "~~~".to_string());
    assert!(classifier.code_fence().is_some());
    classifier.classify(&mut "~~~~~".to_string());
    classifier.classify(&mut "after".to_string());
    assert_eq!(classifier.code_fence(), None);
}

#[test]
fn fence_close_needs_matching_run() {
    let text = "````\n```\n~~~~\n````\nafter";
    let kinds = kinds(text);
    assert_eq!(&kinds[..4], [LineKind::Code; 4]);
    assert_eq!(kinds[4], LineKind::Text);
}

#[test]
fn ordered_items_are_renumbered() {
    let (states, lines) = classify_all("3. a\n5. b");
    assert_eq!(lines, ["1. a", "2. b"]);
    assert!(states.iter().all(|s| s.kind == LineKind::OrderedList && s.depth == 1));
    assert_eq!(states[1].ol_num, 2);
    assert_ne!(states[0].seq, states[1].seq);
}

#[test]
fn tenth_item_widens_hang() {
    let text = vec!["1. item"; 10].join("\n");
    let (states, lines) = classify_all(&text);
    assert_eq!(lines[9], "10. item");
    assert_eq!(states[8].indent_hang, 3);
    assert_eq!(states[9].indent_hang, 4);
}

#[test]
fn renumbered_start_adjusts_hang() {
    let (states, lines) = classify_all("12. twelve");
    assert_eq!(lines[0], "1. twelve");
    assert_eq!(states[0].indent_hang, 3);
}

#[test]
fn pre_block_runs_to_closing_tag() {
    let kinds = kinds("<pre>\nfoo\n</pre>\nafter");
    assert_eq!(
        kinds,
        [
            LineKind::HtmlBlock,
            LineKind::HtmlBlock,
            LineKind::HtmlBlock,
            LineKind::Text,
        ]
    );
}

#[test]
fn nested_pre_tags_balance() {
    let kinds = kinds("<pre>\n<pre>\n</pre>\nstill\n</pre>\nafter");
    assert_eq!(&kinds[..5], [LineKind::HtmlBlock; 5]);
    assert_eq!(kinds[5], LineKind::Text);
}

#[test]
fn html_substate_tracks_terminator() {
    let mut classifier = Classifier::new();
    classifier.classify(&mut "<!-- open".to_string());
    assert_eq!(classifier.html_state(), HtmlSubstate::Comment);
    classifier.classify(&mut "still -->".to_string());
    assert_eq!(classifier.html_state(), HtmlSubstate::End);
    classifier.classify(&mut "text".to_string());
    assert_eq!(classifier.html_state(), HtmlSubstate::None);
}

#[test]
fn nested_lists_track_depth() {
    let (states, _) = classify_all("- a\n  - b\n- c");
    let depths: Vec<_> = states.iter().map(|s| s.depth).collect();
    assert_eq!(depths, [1, 2, 1]);
    assert!(states.iter().all(|s| s.kind == LineKind::UnorderedList));
    assert_ne!(states[0].seq, states[2].seq);
}

#[test]
fn lazy_line_continues_item() {
    let mut classifier = Classifier::new();
    let first = *classifier.classify(&mut "- item".to_string());
    assert!(classifier.opened());
    let second = *classifier.classify(&mut "continued".to_string());
    assert!(!classifier.opened());
    assert_eq!(first, second);
}

#[test]
fn indented_paragraph_stays_in_item() {
    let (states, _) = classify_all("- a\n\n  b\n\nc");
    assert_eq!(states[2].kind, LineKind::UnorderedList);
    assert_eq!(states[2].seq, states[0].seq);
    assert_eq!(states[4].kind, LineKind::Text);
}

#[test]
fn list_kind_change_replaces_frame() {
    let mut classifier = Classifier::new();
    classifier.classify(&mut "- a".to_string());
    let state = *classifier.classify(&mut "1. b".to_string());
    assert_eq!(state.kind, LineKind::OrderedList);
    assert_eq!(state.depth, 1);
    assert_eq!(classifier.stack().len(), 2);
}

#[test]
fn ordered_marker_change_starts_new_list() {
    let (states, lines) = classify_all("1. a\n2) b");
    assert_eq!(lines[1], "1) b");
    assert_eq!(states[1].ol_marker, ')');
    assert_eq!(states[1].ol_num, 1);
}

#[test]
fn footnote_definition_holds_indented_text() {
    let (states, _) = classify_all("[^1]: note\n    more\n\n    second\n\npara");
    let kinds: Vec<_> = states.iter().map(|s| s.kind).collect();
    assert_eq!(&kinds[..5], [LineKind::FootnoteDef; 5]);
    assert_eq!(kinds[5], LineKind::Text);
    assert!(states[0].footnote_has_text);
    assert_eq!(states[0].content_col(), 4);
}

#[test]
fn header_clears_open_lists() {
    let mut classifier = Classifier::new();
    classifier.classify(&mut "- a".to_string());
    classifier.classify(&mut "  - b".to_string());
    let state = *classifier.classify(&mut "## Next".to_string());
    assert_eq!(state.kind, LineKind::HeaderAtx);
    assert_eq!(state.depth, 1);
}

#[test]
fn document_summary() {
    let (states, lines) =
        classify_all("# Notes\n\nIntro text\n- one\n  - two\n3. three");
    let rendered = states
        .iter()
        .zip(&lines)
        .map(|(s, line)| format!("{}@{}: {line:?}", s.kind, s.depth))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(rendered, @r##"
    atx@1: "# Notes"
    text@0: ""
    text@0: "Intro text"
    ul@1: "- one"
    ul@2: "  - two"
    ol@1: "1. three"
    "##);
}

proptest! {
    #[test]
    fn stack_invariants_hold(lines in prop::collection::vec(
        concat!(
            "[ ]{0,6}(- |1\\. |7\\) |: |# |```|<pre>|</pre>|<!-- |-->",
            "|\\[\\^1\\]: |\\| |---)?[a-z |]{0,8}",
        ),
        0..40,
    )) {
        let mut classifier = Classifier::new();
        for line in lines {
            let mut line = line;
            let returned = *classifier.classify(&mut line);
            let stack = classifier.stack();
            prop_assert_eq!(returned, *classifier.top());
            prop_assert_eq!(stack[0].kind, LineKind::Text);
            prop_assert_eq!(stack[0].seq, 0);
            for (idx, frame) in stack.iter().enumerate() {
                prop_assert_eq!(usize::from(frame.depth), idx);
            }
            for pair in stack.windows(2) {
                prop_assert!(pair[0].indent_left <= pair[1].indent_left);
            }
        }
    }
}
