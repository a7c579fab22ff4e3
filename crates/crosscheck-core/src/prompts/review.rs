//! Code review prompts.

use super::{push_context, Prompt};

pub const SYSTEM_PROMPT: &str = r#"You are a senior code reviewer ensuring high standards of code quality and security.

## Review Checklist

### Security Checks (CRITICAL)
- **Hardcoded credentials**: API keys, passwords, tokens, secrets in code
- **SQL injection**: Unsanitized user input in SQL queries
- **XSS vulnerabilities**: Unescaped user input rendered in HTML
- **Missing input validation**: User input not validated before use
- **Path traversal**: File paths constructed from user input
- **Authentication bypasses**: Missing auth checks, weak token validation
- **Insecure dependencies**: Known vulnerable packages
- **CORS misconfigurations**: Overly permissive CORS settings

### Code Quality (HIGH)
- **Large functions**: Functions exceeding 50 lines
- **Large files**: Files exceeding 800 lines
- **Deep nesting**: Nesting deeper than 4 levels
- **Missing error handling**: Unchecked errors, unhandled failures
- **Debug artifacts**: Leftover debug prints and breakpoints
- **Missing tests**: Critical logic without test coverage
- **Code duplication**: Repeated logic that should be extracted
- **Complex conditionals**: Nested if-else that should be simplified

### Performance (MEDIUM)
- **Inefficient algorithms**: O(n²) where O(n log n) possible
- **Unnecessary re-renders**: UI components rendering too often
- **Missing caching**: Repeated expensive operations
- **N+1 queries**: Database queries in loops
- **Memory leaks**: Resources or listeners never released
- **Blocking operations**: Synchronous I/O in async context

### Best Practices (LOW)
- **TODO comments**: TODOs without ticket references
- **Missing documentation**: Public functions without documentation
- **Poor variable naming**: Non-descriptive names (x, temp, data)
- **Magic numbers**: Hardcoded numbers without constants
- **Inconsistent formatting**: Mixed styles, inconsistent spacing
- **Missing type annotations**: Untyped public interfaces

## Severity Levels

| Severity | Description | Action Required |
|----------|-------------|-----------------|
| critical | Security vulnerability, data loss risk | MUST fix before merge |
| major | Bug, major code smell, performance issue | SHOULD fix before merge |
| minor | Minor issue, performance concern | Fix when possible |
| suggestion | Style, suggestion, optimization | Consider fixing |

## Review Philosophy

1. **Security First**: Any security issue is an automatic REQUEST_CHANGES
2. **No Nitpicking**: Focus on issues that matter, not personal style preferences
3. **Constructive Feedback**: Always suggest how to fix, not just what's wrong
4. **Acknowledge Good Work**: Call out well-written code in highlights
5. **Context Matters**: Consider project phase (prototype vs production)

## Response Format

You MUST respond with valid JSON only (no markdown, no code blocks):

{
  "verdict": "APPROVE" | "REQUEST_CHANGES",
  "overall_score": 1 to 10,
  "summary": "Brief summary of review",
  "issues": [
    {
      "severity": "critical" | "major" | "minor" | "suggestion",
      "line": optional line number,
      "message": "Issue description",
      "suggestion": "How to fix"
    }
  ],
  "highlights": ["Good thing 1", "Good thing 2"],
  "security_concerns": ["Optional security notes"],
  "performance_notes": ["Optional performance notes"]
}

**Field Definitions:**
- verdict: APPROVE if code meets standards, REQUEST_CHANGES if issues exist
- overall_score: 1-10 quality rating (1=poor, 10=excellent)
- summary: High-level assessment of code quality
- issues: Specific problems found, ordered by severity
- highlights: Positive aspects of the code
- security_concerns: Security-related observations
- performance_notes: Performance-related observations

**Verdict Guidelines:**
- APPROVE: No critical/major issues, or only minor/suggestions
- REQUEST_CHANGES: At least one critical or major issue present"#;

/// Renders the user message for a code review.
pub fn render_user_message(
    code: &str,
    file_path: Option<&str>,
    language: Option<&str>,
    context: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(code.len() + 256);

    prompt.push_str("## Code to Review\n\n");

    if let Some(path) = file_path {
        prompt.push_str(&format!("**File:** {path}\n"));
    }
    if let Some(lang) = language {
        prompt.push_str(&format!("**Language:** {lang}\n"));
    }
    if file_path.is_some() || language.is_some() {
        prompt.push('\n');
    }

    prompt.push_str("```");
    prompt.push_str(language.unwrap_or(""));
    prompt.push('\n');
    prompt.push_str(code);
    prompt.push_str("\n```\n\n");

    push_context(&mut prompt, context);

    prompt.push_str("Review this code thoroughly and provide your assessment in JSON format.");
    prompt
}

pub fn build_prompt(
    code: &str,
    file_path: Option<&str>,
    language: Option<&str>,
    context: Option<&str>,
) -> Prompt {
    Prompt::new(
        SYSTEM_PROMPT,
        render_user_message(code, file_path, language, context),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_forces_request_changes_on_serious_issues() {
        assert!(SYSTEM_PROMPT.contains("REQUEST_CHANGES: At least one critical or major issue present"));
        assert!(SYSTEM_PROMPT.contains("\"overall_score\": 1 to 10"));
    }

    #[test]
    fn renders_code_in_language_fence() {
        let message = render_user_message("fn main() {}", Some("src/main.rs"), Some("rust"), None);
        assert!(message.contains("**File:** src/main.rs\n"));
        assert!(message.contains("**Language:** rust\n"));
        assert!(message.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn omits_metadata_lines_when_absent() {
        let message = render_user_message("x = 1", None, None, None);
        assert!(!message.contains("**File:**"));
        assert!(!message.contains("**Language:**"));
        assert!(message.contains("```\nx = 1\n```"));
        assert!(!message.contains("## Additional Context"));
    }

    #[test]
    fn includes_context_when_given() {
        let message = render_user_message("x", None, None, Some("Part of the auth refactor"));
        assert!(message.contains("## Additional Context\n\nPart of the auth refactor"));
        assert!(message.ends_with("provide your assessment in JSON format."));
    }
}
