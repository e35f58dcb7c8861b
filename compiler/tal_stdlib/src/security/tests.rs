use super::*;
use pretty_assertions::assert_eq;

#[test]
fn screen_patterns_compile() {
    assert_eq!(screen(&SQL_SET, SQL_INJECTION_PATTERNS).len(), SQL_INJECTION_PATTERNS.len());
    assert_eq!(screen(&XSS_SET, XSS_PATTERNS).len(), XSS_PATTERNS.len());
}

#[test]
fn sql_injection_attempts_are_flagged() {
    for input in [
        "' OR '1'='1",
        "admin'--",
        "1; DROP TABLE users",
        "x' UNION SELECT password FROM users",
        "id=1 or 1=1",
        "'; exec xp_cmdshell 'dir'",
        "1 AND SLEEP(5)",
    ] {
        assert!(contains_sql_injection_patterns(input), "{input}");
    }
}

#[test]
fn ordinary_text_is_not_sql_injection() {
    for input in [
        "John O'Brien",
        "Select your favourite colour",
        "rock and roll",
        "user@example.com",
        "",
    ] {
        assert!(!contains_sql_injection_patterns(input), "{input}");
    }
}

#[test]
fn xss_attempts_are_flagged() {
    for input in [
        "<script>alert('x')</script>",
        "<SCRIPT src=evil.js>",
        "<img src=x onerror=alert(1)>",
        "<a href=\"javascript:alert(1)\">",
        "<iframe src=//evil>",
        "data:text/html;base64,PHNjcmlwdD4=",
    ] {
        assert!(contains_xss_patterns(input), "{input}");
    }
}

#[test]
fn ordinary_markup_free_text_is_not_xss() {
    for input in ["Hello, world!", "a < b and c > d", "online = true", "<b>bold</b>"] {
        assert!(!contains_xss_patterns(input), "{input}");
    }
}

#[test]
fn escape_html_replaces_significant_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
    );
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn nested_quantifiers_are_catastrophic() {
    for pattern in [
        "(a+)+",
        "(a*)*",
        r"(\w+)*$",
        "^(a+)+$",
        "(x+x+)+y",
        "((ab)*)+",
        "(?:a+){2,}",
        "(.*a){10}",
        "([a-z]+)*",
    ] {
        assert!(is_catastrophic_pattern(pattern), "{pattern}");
    }
}

#[test]
fn overlapping_alternations_are_catastrophic() {
    for pattern in ["(a|a)*", "(a|ab)+", "(?:foo|foobar)*"] {
        assert!(is_catastrophic_pattern(pattern), "{pattern}");
    }
}

#[test]
fn safe_patterns_pass() {
    for pattern in [
        r"^\d{3}-\d{4}$",
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
        "(abc)+",
        "(a|b)*",
        "(a+)?",
        r"\(a+\)+",
        "[(a+)]+",
        "(?i)hello",
        "(?P<year>\\d{4})-(?P<month>\\d{2})",
        "",
    ] {
        assert!(!is_catastrophic_pattern(pattern), "{pattern}");
    }
}

#[test]
fn brace_quantifiers() {
    let chars: Vec<char> = "{3}{1}{2,}{0,1}{x}".chars().collect();
    assert_eq!(brace_quantifier(&chars, 0), Some((3, true)));
    assert_eq!(brace_quantifier(&chars, 3), Some((3, false)));
    assert_eq!(brace_quantifier(&chars, 6), Some((4, true)));
    assert_eq!(brace_quantifier(&chars, 10), Some((5, false)));
    assert_eq!(brace_quantifier(&chars, 15), None);
}

mod proptest_screens {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn escaped_html_has_no_markup(input in "\\PC*") {
            let escaped = escape_html(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('"'));
        }

        #[test]
        fn scanner_never_panics(pattern in "[a-z()|*+?{},\\\\\\[\\]0-9^$.]{0,24}") {
            let _ = is_catastrophic_pattern(&pattern);
        }
    }
}
