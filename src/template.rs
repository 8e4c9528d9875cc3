use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

/// A template invocation, optionally introduced by a definition list marker.
static TEMPLATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^#[ \t]*)?(\{\{[^{}]*\}\})").unwrap());

/// Head templates that introduce inflected forms rather than a lemma.
static VERB_FORM_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"verb[ -]form").unwrap());

/// Returns the templates of one verb section that describe the verb.
///
/// The first template is the head of the section. A lemma head (`{{nl-verb}}`)
/// is all there is to read. A verb-form head (`{{nl-verb form}}`) is followed
/// by one definition per meaning, each carrying its own template, so every
/// later template is returned too. Repeats are dropped, keeping the order of
/// first occurrence.
pub fn extract_templates(verb_section: &str) -> Vec<&str> {
    let mut matches = TEMPLATE_REGEX
        .captures_iter(verb_section)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());

    let head = match matches.next() {
        Some(head) => head,
        None => return Vec::new(),
    };

    let mut templates = vec![head];
    if !is_verb_form_head(head) {
        return templates;
    }

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    seen.insert(head);
    for template in matches {
        if seen.insert(template) {
            templates.push(template);
        }
    }

    templates
}

pub fn is_verb_form_head(template: &str) -> bool {
    VERB_FORM_HEAD.is_match(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemma_head_only() {
        let section = "\n{{nl-verb}}\n# to get, receive\n#: {{ux|nl|Ik krijg een boek.}}\n";
        assert_eq!(extract_templates(section), vec!["{{nl-verb}}"]);
    }

    #[test]
    fn verb_form_head_takes_all() {
        let section = "\n{{nl-verb form}}\n\
# {{nl-verb form of|p=1|n=sg|t=pres|m=ind|krijgen}}\n\
# {{nl-verb form of|n=sg|t=pres|m=imp|krijgen}}\n";
        assert_eq!(
            extract_templates(section),
            vec![
                "{{nl-verb form}}",
                "{{nl-verb form of|p=1|n=sg|t=pres|m=ind|krijgen}}",
                "{{nl-verb form of|n=sg|t=pres|m=imp|krijgen}}",
            ]
        );
    }

    #[test]
    fn hyphenated_verb_form_head() {
        let section = "{{head|nl|verb-form}}\n# {{nl-verb form of|n=pl|t=past|m=ind|lopen}}\n";
        assert_eq!(extract_templates(section).len(), 2);
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let section = "{{nl-verb form}}\n\
# {{nl-verb form of|n=pl|t=past|m=ind|lopen}}\n\
# {{nl-verb form of|p=3|n=sg|t=pres|m=ind|lopen}}\n\
# {{nl-verb form of|n=pl|t=past|m=ind|lopen}}\n\
{{nl-verb form}}\n";
        assert_eq!(
            extract_templates(section),
            vec![
                "{{nl-verb form}}",
                "{{nl-verb form of|n=pl|t=past|m=ind|lopen}}",
                "{{nl-verb form of|p=3|n=sg|t=pres|m=ind|lopen}}",
            ]
        );
    }

    #[test]
    fn list_marker_is_not_captured() {
        let section = "# {{nl-verb form of|n=pl|t=past|m=ind|lopen}}";
        assert_eq!(
            extract_templates(section),
            vec!["{{nl-verb form of|n=pl|t=past|m=ind|lopen}}"]
        );
    }

    #[test]
    fn nested_templates_match_innermost() {
        let section = "{{nl-verb form}}\n# {{gloss|{{m|nl|krijgen}}}}\n";
        assert_eq!(
            extract_templates(section),
            vec!["{{nl-verb form}}", "{{m|nl|krijgen}}"]
        );
    }

    #[test]
    fn no_templates() {
        assert!(extract_templates("\n# to walk\n").is_empty());
        assert!(extract_templates("").is_empty());
    }

    #[test]
    fn verb_form_head_detection() {
        assert!(is_verb_form_head("{{nl-verb form}}"));
        assert!(is_verb_form_head("{{head|nl|verb form}}"));
        assert!(is_verb_form_head("{{head|nl|verb-form}}"));
        assert!(!is_verb_form_head("{{nl-verb}}"));
        assert!(!is_verb_form_head("{{en-verb|lies}}"));
    }
}
