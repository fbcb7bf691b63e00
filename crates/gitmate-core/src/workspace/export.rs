//! Shell-script export of the selected files.

use super::model::FileContext;

use shell_words::quote;

const SCRIPT_HEADER: &str = "#!/bin/bash
# Generated by GitMate - Apply Context Changes
# Run this script to sync the AI context files to your local repository.

echo \"Applying changes from GitMate context...\"
";

/// Picks a heredoc delimiter that no body line equals.
fn heredoc_delimiter(body: &str) -> String {
    let mut delimiter = "EOF".to_string();
    let mut suffix = 0;
    while body.lines().any(|line| line == delimiter) {
        suffix += 1;
        delimiter = format!("EOF_{suffix}");
    }
    delimiter
}

/// Comment text for `path`, kept on one line.
fn comment_text(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

fn file_section(file: &FileContext) -> String {
    let mut section = format!("\n# {}\n", comment_text(&file.path));

    if let Some((dir, _)) = file.path.rsplit_once('/') {
        if !dir.is_empty() {
            section.push_str(&format!("mkdir -p {}\n", quote(dir)));
        }
    }

    let delimiter = heredoc_delimiter(&file.body);
    section.push_str(&format!(
        "cat << '{delimiter}' > {path}\n{body}\n{delimiter}\n",
        path = quote(&file.path),
        body = file.body
    ));
    section
}

/// Renders a bash script that recreates every file with its current body.
///
/// Each file gets a quoted heredoc and a single-quoted target path, so neither
/// the body nor the path goes through shell expansion.
pub fn export_script(files: &[FileContext]) -> String {
    let sections = files.iter().map(file_section).collect::<Vec<_>>().join("\n");
    format!("{SCRIPT_HEADER}{sections}\necho \"Done!\"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_recreates_nested_file() {
        let script = export_script(&[FileContext::new("src/app/main.ts", "console.log('$HOME');")]);

        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("mkdir -p src/app\n"));
        assert!(script.contains("cat << 'EOF' > src/app/main.ts\nconsole.log('$HOME');\nEOF\n"));
        assert!(script.trim_end().ends_with("echo \"Done!\""));
    }

    #[test]
    fn test_root_file_skips_mkdir() {
        let script = export_script(&[FileContext::new("README.md", "# hi")]);
        assert!(!script.contains("mkdir"));
        assert!(script.contains("# README.md\n"));
    }

    #[test]
    fn test_delimiter_avoids_body_collision() {
        let script = export_script(&[FileContext::new("notes.txt", "line\nEOF\nmore")]);
        assert!(script.contains("cat << 'EOF_1' > notes.txt"));
        assert!(script.contains("more\nEOF_1\n"));
    }

    #[test]
    fn test_command_substitution_in_path_is_quoted() {
        let script = export_script(&[FileContext::new("src/$(touch pwned)/a `id`.txt", "hi")]);

        assert!(script.contains("mkdir -p 'src/$(touch pwned)'\n"));
        assert!(script.contains("cat << 'EOF' > 'src/$(touch pwned)/a `id`.txt'\nhi\nEOF\n"));
        assert!(!script.contains("\"src/$("));
    }

    #[test]
    fn test_single_quote_in_path_is_escaped() {
        let script = export_script(&[FileContext::new("it's.txt", "x")]);
        assert!(script.contains("cat << 'EOF' > 'it'\\''s.txt'\n"));
    }

    #[test]
    fn test_control_characters_stay_in_comment_line() {
        let script = export_script(&[FileContext::new("a\nrm -rf x.txt", "x")]);
        assert!(script.contains("\n# a?rm -rf x.txt\n"));
        assert!(!script.lines().any(|line| line == "rm -rf x.txt"));
    }

    #[test]
    fn test_empty_selection_still_valid_script() {
        let script = export_script(&[]);
        assert!(script.contains("Applying changes"));
        assert!(script.contains("Done!"));
    }
}
