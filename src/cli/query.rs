//! CLI `top` and `repositories` commands.

use anyhow::Result;
use std::fmt::Write as _;

use super::open_store;
use scuttlebutt::aggregate::TopRepositories;
use scuttlebutt::config::ScuttlebuttConfig;
use scuttlebutt::repository::Repository;

/// Print the current top repository per language.
pub fn top(config: &ScuttlebuttConfig) -> Result<()> {
    let store = open_store(config)?;
    let top = store.top_repositories_by_language()?;
    if top.is_empty() {
        println!("No eligible repositories.");
        return Ok(());
    }
    print!("{}", render_top(&top));
    Ok(())
}

/// Print every stored repository, sorted by ID.
pub fn repositories(config: &ScuttlebuttConfig) -> Result<()> {
    let store = open_store(config)?;
    let repos = store.repositories()?;
    print!("{}", render_repositories(&repos));
    println!("{} repositories", repos.len());
    Ok(())
}

fn render_top(top: &TopRepositories) -> String {
    let mut out = String::new();
    for (language, repo) in top {
        let language = if language.is_empty() { "(none)" } else { language };
        let _ = writeln!(
            out,
            "{language:<14} {:<40} {:>5}  {}",
            repo.name(),
            repo.message_count(),
            repo.description
        );
    }
    out
}

fn render_repositories(repos: &[Repository]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<48} {:<14} {:>8} {:>8}", "ID", "LANGUAGE", "MESSAGES", "NOTIFIED");
    for repo in repos {
        let _ = writeln!(
            out,
            "{:<48} {:<14} {:>8} {:>8}",
            repo.id.as_str(),
            repo.language,
            repo.message_count(),
            if repo.notified { "yes" } else { "no" }
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::repository::RepositoryId;

    #[test]
    fn top_rows_are_sorted_and_label_empty_language() {
        let mut top = TopRepositories::new();
        top.insert(
            "go".into(),
            Repository::new(RepositoryId::parse("github.com/a/go").unwrap(), "", "gophers", "go"),
        );
        top.insert(
            String::new(),
            Repository::new(RepositoryId::parse("github.com/a/plain").unwrap(), "", "text", ""),
        );

        let out = render_top(&top);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("(none)"));
        assert!(lines[0].contains("a/plain"));
        assert!(lines[1].starts_with("go"));
        assert!(lines[1].ends_with("gophers"));
    }

    #[test]
    fn repository_table_has_header_and_rows() {
        let id = RepositoryId::parse("github.com/a/x").unwrap();
        let mut repo = Repository::new(id, "", "", "rust");
        repo.notified = true;
        let out = render_repositories(&[repo]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("github.com/a/x"));
        assert!(lines[1].ends_with("yes"));
    }
}
