//! Log path resolution: template substitution, `~` and `$VAR` expansion,
//! and user id validation.

use std::path::PathBuf;

/// Reject user ids that would escape the history directory or produce an
/// unusable file name.
pub fn validate_user_id(user_id: &str) -> Result<(), String> {
    if user_id.trim().is_empty() {
        return Err("user id is empty".into());
    }
    if user_id.contains(['/', '\\', '\0']) || user_id.contains("..") {
        return Err(format!("user id {user_id:?} contains a path separator or '..'"));
    }
    Ok(())
}

/// Expand a leading `~` and any `$VAR` / `${VAR}` references.
///
/// Unset variables are left in place, matching shell `expandvars` behaviour.
pub fn expand(raw: &str) -> String {
    expand_with(raw, |key| std::env::var(key).ok())
}

pub(crate) fn expand_with<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let with_home = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match lookup("HOME") {
            Some(home) => format!("{home}{rest}"),
            None => raw.to_string(),
        },
        _ => raw.to_string(),
    };
    expand_vars(&with_home, &lookup)
}

fn expand_vars<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), lookup(name)) {
            (false, Some(value)) => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

/// Resolve the log file for `user_id` from a template containing `{user_id}`.
///
/// The template is expanded before substitution so a user id can never
/// inject a variable reference.
pub fn resolve_log_path(template: &str, user_id: &str) -> Result<PathBuf, String> {
    validate_user_id(user_id)?;
    Ok(PathBuf::from(expand(template).replace("{user_id}", user_id)))
}
