//! Prompt construction for review requests

use crate::suggestion::SUGGESTION_DELIMITER;

/// Prompt for reviewing a unified diff from a pull request.
pub fn patch_review_prompt(filename: &str, patch: &str) -> String {
    format!(
        "Act as a senior developer reviewing a pull request. Review the \
         following change to the file {filename}. Suggest improvements around \
         best practices, readability and scalability, and add TODO notes \
         where further work is warranted:\n\n{patch}"
    )
}

/// Prompt for reviewing a whole file in repository context.
///
/// Asks for exactly two sections separated by the suggestion delimiter: the
/// revised file, then a summary of further recommendations.
pub fn file_review_prompt(project_name: &str, repo_url: &str, path: &str, content: &str) -> String {
    format!(
        "Act as a senior developer doing a code review for the project \
         {project_name} ({repo_url}).\n\nFile: {path}\n\n{content}\n\n\
         Review the file and suggest improvements around best practices, \
         readability and scalability, adding comments in the code where \
         changes are needed. Respond with exactly two sections separated by \
         {SUGGESTION_DELIMITER}: first the revised file content, then a \
         summary of any further recommendations."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_review_prompt_embeds_file_and_patch() {
        let prompt = patch_review_prompt("src/main.rs", "@@ -1 +1 @@\n-a\n+b");
        assert!(prompt.contains("src/main.rs"));
        assert!(prompt.contains("@@ -1 +1 @@"));
    }

    #[test]
    fn test_file_review_prompt_embeds_context() {
        let prompt = file_review_prompt(
            "demo",
            "https://github.com/acme/demo",
            "src/index.js",
            "console.log('hi');",
        );
        assert!(prompt.contains("demo"));
        assert!(prompt.contains("https://github.com/acme/demo"));
        assert!(prompt.contains("src/index.js"));
        assert!(prompt.contains("console.log('hi');"));
    }

    #[test]
    fn test_file_review_prompt_names_delimiter_once() {
        let prompt = file_review_prompt("p", "u", "f", "c");
        assert_eq!(prompt.matches(SUGGESTION_DELIMITER).count(), 1);
    }
}
