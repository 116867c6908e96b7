use std::collections::HashMap;

use essay_composer::compose::*;
use essay_composer::models::OutlineEntry;
use serde_json::{json, Value};
use speculate2::speculate;

fn entries(headers: &[&str]) -> Vec<OutlineEntry> {
    headers
        .iter()
        .map(|h| OutlineEntry::new(*h, format!("about {}", h)))
        .collect()
}

fn content(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

speculate! {
    describe "normalize" {
        it "parses a JSON string wrapping the outline" {
            let raw = json!(r#"{"outline":[{"header":"A","description":"d"}]}"#);
            assert_eq!(normalize(&raw), vec![OutlineEntry::new("A", "d")]);
        }

        it "parses a JSON string holding the bare sequence" {
            let raw = json!(r#"[{"header":"A","description":"d"},{"header":"B","description":"e"}]"#);
            assert_eq!(normalize(&raw), vec![OutlineEntry::new("A", "d"), OutlineEntry::new("B", "e")]);
        }

        it "unwraps an already-parsed wrapper object" {
            let raw = json!({ "outline": [{ "header": "A", "description": "d" }] });
            assert_eq!(normalize(&raw), vec![OutlineEntry::new("A", "d")]);
        }

        it "returns an empty outline for text that is not JSON" {
            assert!(normalize(&json!("not json")).is_empty());
        }

        it "returns an empty outline for a single entry object" {
            let raw = json!({ "header": "A", "description": "d" });
            assert!(normalize(&raw).is_empty());
        }

        it "returns an empty outline for absent and scalar payloads" {
            assert!(normalize(&Value::Null).is_empty());
            assert!(normalize(&json!(7)).is_empty());
            assert!(normalize(&json!({ "outline": "[]" })).is_empty());
        }

        it "is idempotent on canonical sequences" {
            let outline = entries(&["Intro", "Evidence", "Conclusion"]);
            let raw = serde_json::to_value(&outline).expect("serialize");
            let once = normalize(&raw);
            let twice = normalize(&serde_json::to_value(&once).expect("serialize"));
            assert_eq!(once, outline);
            assert_eq!(twice, outline);
        }

        it "keeps order and duplicate headers" {
            let raw = json!([
                { "header": "B", "description": "" },
                { "header": "A", "description": "" },
                { "header": "B", "description": "again" }
            ]);
            let headers: Vec<_> = normalize(&raw).into_iter().map(|e| e.header).collect();
            assert_eq!(headers, vec!["B", "A", "B"]);
        }

        it "defaults a missing description to empty" {
            let raw = json!([{ "header": "A" }]);
            assert_eq!(normalize(&raw), vec![OutlineEntry::new("A", "")]);
        }
    }

    describe "progress" {
        it "is zero for an empty outline" {
            assert_eq!(progress(&[], &HashMap::new()), 0.0);
        }

        it "counts headers with content" {
            let outline = entries(&["A", "B", "C", "D"]);
            let store = content(&[("B", "x"), ("D", "y")]);
            assert_eq!(progress(&outline, &store), 0.5);
        }

        it "ignores empty text and keys outside the outline" {
            let outline = entries(&["A", "B"]);
            let store = content(&[("A", ""), ("Z", "stray")]);
            let measured = Progress::measure(&outline, &store);
            assert_eq!(measured, Progress { completed: 0, total: 2 });
            assert!(!measured.is_complete());
        }

        it "formats as a section count" {
            let outline = entries(&["A", "B", "C", "D"]);
            let store = content(&[("A", "x")]);
            assert_eq!(Progress::measure(&outline, &store).to_string(), "1/4 sections (25%)");
        }
    }

    describe "assemble" {
        it "follows outline order and keeps empty sections" {
            let outline = entries(&["Intro", "Body"]);
            let store = content(&[("Body", "text")]);
            assert_eq!(assemble(&outline, &store), "## Intro\n\n\n\n## Body\n\ntext");
        }

        it "does not depend on content map order" {
            let outline = entries(&["C", "A", "B"]);
            let mut forward = HashMap::new();
            let mut backward = HashMap::new();
            for (k, v) in [("A", "a"), ("B", "b"), ("C", "c")] {
                forward.insert(k.to_string(), v.to_string());
            }
            for (k, v) in [("C", "c"), ("B", "b"), ("A", "a")] {
                backward.insert(k.to_string(), v.to_string());
            }
            let text = assemble(&outline, &forward);
            assert_eq!(text, assemble(&outline, &backward));
            assert_eq!(text, "## C\n\nc\n\n## A\n\na\n\n## B\n\nb");
        }

        it "is empty for an empty outline" {
            assert_eq!(assemble(&[], &content(&[("A", "x")])), "");
        }
    }

    describe "download" {
        it "names the file after the topic" {
            let artifact = download("Climate Policy", "## A\n\nx");
            assert_eq!(artifact.file_name, "Climate Policy.md");
            assert_eq!(artifact.media_type, "text/markdown");
            assert_eq!(artifact.bytes, b"## A\n\nx".to_vec());
        }

        it "falls back to the default name for an empty topic" {
            assert_eq!(download("", "").file_name, format!("{}.md", DEFAULT_BASE_NAME));
            assert_eq!(export_file_name("   "), "essay.md");
        }

        it "sanitizes reserved characters" {
            assert_eq!(export_file_name("AI: risks? <2030>"), "AI_ risks_ _2030_.md");
            assert_eq!(sanitize_file_stem("  notes.  "), "notes");
        }
    }
}
